//! 解析結果の型定義
//!
//! CLIとテストで共有される型:
//! - FileMetadata: ファイルシステム由来の情報
//! - AnalysisResult: 1ファイルあたりの最終出力

use serde::{Deserialize, Serialize};

/// ファイルメタデータ
///
/// 画像として読めなかったファイルでは収集しないため、全項目が省略可能。
/// その場合は `"metadata": {}` として出力される。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size_bytes: Option<u64>,

    /// 作成日時（ISO-8601, ローカル時刻）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,

    /// 更新日時（ISO-8601, ローカル時刻）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
}

impl FileMetadata {
    pub fn is_empty(&self) -> bool {
        self.file_size_bytes.is_none() && self.created.is_none() && self.modified.is_none()
    }
}

/// 画像1枚分の解析結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub file_path: String,

    #[serde(default)]
    pub classification_label: Option<String>,

    #[serde(default)]
    pub classification_confidence: Option<f64>,

    #[serde(default)]
    pub caption: Option<String>,

    #[serde(default)]
    pub width: Option<u32>,

    #[serde(default)]
    pub height: Option<u32>,

    #[serde(default)]
    pub sprite_sheet_heuristics: Vec<String>,

    #[serde(default)]
    pub metadata: FileMetadata,

    /// "種別: メッセージ" 形式のエラー記述
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResult {
    /// 解析前の空レコード
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            ..Default::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
