//! 並列実行と結果出力
//!
//! 固定サイズのrayonプールに1ファイル1タスクで投入し、
//! チャネルで完了順に回収する。スコープ終了が全タスクの合流点。

use super::analyze_image;
use crate::error::{AnalyzerError, Result};
use crate::models::ModelServices;
use asset_analyzer_common::{sort_by_path, to_pretty_json, AnalysisResult};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tracing::info;

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// ワーカースレッド数（0は1として扱う）
    pub max_workers: usize,
    /// 標準エラーに進捗バーを表示
    pub show_progress: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            max_workers: 4,
            show_progress: false,
        }
    }
}

/// 全画像を並列解析し、ファイルパス順に整列して返す
pub fn run_batch(
    paths: &[PathBuf],
    services: &ModelServices,
    options: &BatchOptions,
) -> Result<Vec<AnalysisResult>> {
    if paths.is_empty() {
        return Ok(Vec::new());
    }

    let workers = options.max_workers.max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("analyzer-{}", i))
        .build()
        .map_err(|e| AnalyzerError::Config(format!("failed to build thread pool: {}", e)))?;

    let progress = progress_bar(paths.len(), options.show_progress);
    let (tx, rx) = mpsc::channel::<AnalysisResult>();
    let mut results = Vec::with_capacity(paths.len());

    pool.in_place_scope(|scope| {
        for path in paths {
            let tx = tx.clone();
            scope.spawn(move |_| {
                let result = analyze_image(path, services);
                // 受信側は送信側が全て閉じるまで待つので失敗しない
                let _ = tx.send(result);
            });
        }
        drop(tx);

        for result in rx {
            if let Some(name) = Path::new(&result.file_path).file_name() {
                progress.set_message(name.to_string_lossy().to_string());
            }
            progress.inc(1);
            results.push(result);
        }
    });
    progress.finish_and_clear();

    let failed = results.iter().filter(|r| r.is_error()).count();
    info!(
        "解析完了: {}件 (失敗 {}件, ワーカー {})",
        results.len(),
        failed,
        workers
    );

    sort_by_path(&mut results);
    Ok(results)
}

/// JSONを書き出す。出力先がなければ標準出力
pub fn write_results(results: &[AnalysisResult], output: Option<&Path>) -> Result<()> {
    let json = to_pretty_json(results)?;

    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            println!("Analysis complete. Results written to: {}", path.display());
        }
        None => println!("{}", json),
    }

    Ok(())
}

fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let bar = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} {msg}") {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}
