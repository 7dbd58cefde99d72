mod metadata;

pub use metadata::{format_timestamp, read_metadata};

use crate::error::{AnalyzerError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// 対象拡張子（小文字で比較）
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tiff", "webp"];

/// フォルダ以下を再帰的にスキャンし、画像拡張子のファイルを返す
///
/// 順序はファイルシステム依存。整列は出力時に行う。
pub fn scan_folder(folder: &Path) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(AnalyzerError::DirectoryNotFound(folder.display().to_string()));
    }

    let mut images = Vec::new();

    for entry in WalkDir::new(folder) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("スキャン中にスキップ: {}", e);
                continue;
            }
        };

        // ディレクトリへのリンクは辿らないが、ファイルへのリンクは含める
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        if path
            .extension()
            .map(|ext| is_image_extension(&ext.to_string_lossy()))
            .unwrap_or(false)
        {
            images.push(path.to_path_buf());
        }
    }

    debug!("{}: {}件の画像候補", folder.display(), images.len());
    Ok(images)
}

/// Check if a file extension is a supported image format
pub fn is_image_extension(ext: &str) -> bool {
    let lower = ext.to_lowercase();
    IMAGE_EXTENSIONS.contains(&lower.as_str())
}
