use asset_analyzer_common::FileMetadata;
use chrono::{DateTime, Local};
use std::path::Path;
use std::time::SystemTime;

use crate::error::Result;

/// ファイルサイズと作成・更新日時を取得
///
/// 作成日時を返さないファイルシステムでは更新日時で代用する。
pub fn read_metadata(path: &Path) -> Result<FileMetadata> {
    let meta = std::fs::metadata(path)?;
    let modified = meta.modified()?;
    let created = meta.created().unwrap_or(modified);

    Ok(FileMetadata {
        file_size_bytes: Some(meta.len()),
        created: Some(format_timestamp(created)),
        modified: Some(format_timestamp(modified)),
    })
}

/// ISO-8601（ローカル時刻、タイムゾーンなし）
pub fn format_timestamp(time: SystemTime) -> String {
    let local: DateTime<Local> = time.into();
    local.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}
