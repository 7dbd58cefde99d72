//! 画像アセット解析
//!
//! ディレクトリ以下の画像を分類・キャプション生成し、
//! スプライトシートらしさを判定してJSONに出力する。

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod scanner;

pub use asset_analyzer_common as common;
