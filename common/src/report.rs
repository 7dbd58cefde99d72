//! 結果セットの整列とJSON出力

use crate::types::AnalysisResult;

/// ファイルパスの昇順（辞書順）に並べる
pub fn sort_by_path(results: &mut [AnalysisResult]) {
    results.sort_by(|a, b| a.file_path.cmp(&b.file_path));
}

/// インデント2のJSON配列に変換
pub fn to_pretty_json(results: &[AnalysisResult]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(results)
}
