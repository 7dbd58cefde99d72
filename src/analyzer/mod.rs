//! 画像1枚の解析
//!
//! 読み込み → 分類 → キャプション → スプライト判定 → メタデータ。
//! 失敗は結果レコードの `error` に記録し、呼び出し側には返さない。

pub mod runner;

pub use asset_analyzer_common::AnalysisResult;
pub use runner::{run_batch, write_results, BatchOptions};

use crate::error::Result;
use crate::models::ModelServices;
use crate::scanner::read_metadata;
use asset_analyzer_common::detect_sprite_sheet;
use image::{ImageReader, RgbImage};
use std::path::Path;
use tracing::{debug, warn};

/// 1ファイルを解析する。常に結果を返す
pub fn analyze_image(path: &Path, services: &ModelServices) -> AnalysisResult {
    let mut result = AnalysisResult::new(path.display().to_string());

    match analyze_into(path, services, &mut result) {
        Ok(()) => debug!("解析完了: {}", path.display()),
        Err(e) => {
            warn!("解析失敗: {}: {}", path.display(), e);
            result.error = Some(e.descriptor());
        }
    }

    result
}

fn analyze_into(path: &Path, services: &ModelServices, result: &mut AnalysisResult) -> Result<()> {
    let image = load_rgb(path)?;
    let (width, height) = image.dimensions();
    result.width = Some(width);
    result.height = Some(height);

    let classification = services.classifier().classify(&image)?;
    result.classification_label = Some(classification.label);
    result.classification_confidence = Some(f64::from(classification.confidence));

    result.caption = Some(services.captioner().caption(&image)?);
    result.sprite_sheet_heuristics = detect_sprite_sheet(width, height);

    result.metadata = read_metadata(path)?;
    Ok(())
}

/// 内容から形式を判定してデコードし、RGB 3チャンネルに揃える
pub fn load_rgb(path: &Path) -> Result<RgbImage> {
    let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    Ok(image.to_rgb8())
}
