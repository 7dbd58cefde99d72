//! Asset Analyzer Common Library
//!
//! 推論モデルに依存しない型とヒューリスティック

pub mod report;
pub mod sprite;
pub mod types;

pub use report::{sort_by_path, to_pretty_json};
pub use sprite::detect_sprite_sheet;
pub use types::{AnalysisResult, FileMetadata};
