//! 一括解析の統合テスト
//!
//! 実際のPNGを一時ディレクトリに書き出し、差し替え用モデルで並列実行する

use asset_analyzer::analyzer::{run_batch, write_results, AnalysisResult, BatchOptions};
use asset_analyzer::error::Result;
use asset_analyzer::models::{Captioner, Classification, Classifier, ModelServices};
use asset_analyzer::scanner;
use image::{Rgb, RgbImage};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

/// 左上画素の色で分類する
struct ColorClassifier {
    calls: Arc<AtomicUsize>,
}

impl Classifier for ColorClassifier {
    fn classify(&self, image: &RgbImage) -> Result<Classification> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let Rgb([r, g, b]) = *image.get_pixel(0, 0);
        let label = if r >= g && r >= b {
            "red thing"
        } else if g >= b {
            "green thing"
        } else {
            "blue thing"
        };
        Ok(Classification {
            label: label.into(),
            confidence: 0.9,
        })
    }
}

struct SizeCaptioner;

impl Captioner for SizeCaptioner {
    fn caption(&self, image: &RgbImage) -> Result<String> {
        Ok(format!("an image of {} by {} pixels", image.width(), image.height()))
    }
}

/// 同時実行数の最大値を記録する
#[derive(Default)]
struct ConcurrencyGauge {
    active: AtomicUsize,
    peak: AtomicUsize,
}

struct SlowCaptioner {
    gauge: Arc<ConcurrencyGauge>,
}

impl Captioner for SlowCaptioner {
    fn caption(&self, _image: &RgbImage) -> Result<String> {
        let now = self.gauge.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.gauge.peak.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(50));
        self.gauge.active.fetch_sub(1, Ordering::SeqCst);
        Ok("a slow caption".into())
    }
}

fn services() -> (ModelServices, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let services = ModelServices::new(
        ColorClassifier {
            calls: Arc::clone(&calls),
        },
        SizeCaptioner,
    );
    (services, calls)
}

fn write_png(path: &Path, width: u32, height: u32, color: [u8; 3]) {
    RgbImage::from_pixel(width, height, Rgb(color)).save(path).unwrap();
}

fn options(workers: usize) -> BatchOptions {
    BatchOptions {
        max_workers: workers,
        show_progress: false,
    }
}

/// 正常画像1枚 + 拡張子だけ画像のテキスト1枚
#[test]
fn test_valid_and_unreadable_image() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_png(&dir.path().join("good.png"), 128, 256, [200, 10, 10]);
    std::fs::write(dir.path().join("renamed.jpg"), "plain text, not a jpeg").unwrap();

    let paths = scanner::scan_folder(dir.path()).unwrap();
    assert_eq!(paths.len(), 2);

    let (services, _) = services();
    let results = run_batch(&paths, &services, &options(4)).unwrap();
    assert_eq!(results.len(), 2);

    let good = &results[0];
    assert!(good.file_path.ends_with("good.png"));
    assert!(good.error.is_none());
    assert_eq!(good.classification_label.as_deref(), Some("red thing"));
    assert_eq!(good.caption.as_deref(), Some("an image of 128 by 256 pixels"));
    assert_eq!((good.width, good.height), (Some(128), Some(256)));
    assert_eq!(good.sprite_sheet_heuristics, vec!["sprite-sheet-like-dimensions"]);
    assert!(good.metadata.file_size_bytes.is_some());
    assert!(good.metadata.modified.is_some());

    let bad = &results[1];
    assert!(bad.file_path.ends_with("renamed.jpg"));
    assert!(bad.error.as_deref().unwrap().starts_with("UnreadableImage"));
    assert!(bad.classification_label.is_none());
    assert!(bad.caption.is_none());
    assert!(bad.width.is_none() && bad.height.is_none());
    assert!(bad.metadata.is_empty());

    let value = serde_json::to_value(bad).unwrap();
    assert_eq!(value["metadata"], serde_json::json!({}));
}

/// N枚・Wワーカーで欠落も重複もなく、パス順に並ぶ
#[test]
fn test_all_results_present_once_and_sorted() {
    let dir = tempdir().expect("Failed to create temp dir");
    let nested = dir.path().join("level1").join("level2");
    std::fs::create_dir_all(&nested).unwrap();

    for i in 0..12 {
        let folder = match i % 3 {
            0 => dir.path().to_path_buf(),
            1 => dir.path().join("level1"),
            _ => nested.clone(),
        };
        write_png(&folder.join(format!("frame_{:02}.png", i)), 16 + i, 16, [0, 0, 255]);
    }

    let paths = scanner::scan_folder(dir.path()).unwrap();
    assert_eq!(paths.len(), 12);

    for workers in [1, 3, 8] {
        let (services, calls) = services();
        let results = run_batch(&paths, &services, &options(workers)).unwrap();

        assert_eq!(results.len(), 12);
        assert_eq!(calls.load(Ordering::SeqCst), 12);

        let result_paths: Vec<&str> = results.iter().map(|r| r.file_path.as_str()).collect();
        let mut expected: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
        expected.sort();
        assert_eq!(result_paths, expected);
        assert!(results.iter().all(|r| r.error.is_none()));
    }
}

/// 同じ入力なら分類・キャプション・判定は同一
#[test]
fn test_repeat_runs_are_identical() {
    let dir = tempdir().expect("Failed to create temp dir");
    write_png(&dir.path().join("strip.png"), 1024, 128, [10, 200, 10]);
    write_png(&dir.path().join("photo.bmp"), 300, 200, [10, 10, 200]);

    let paths = scanner::scan_folder(dir.path()).unwrap();
    let (services, _) = services();

    let first = run_batch(&paths, &services, &options(2)).unwrap();
    let second = run_batch(&paths, &services, &options(2)).unwrap();

    let key = |r: &AnalysisResult| {
        (
            r.file_path.clone(),
            r.classification_label.clone(),
            r.caption.clone(),
            r.sprite_sheet_heuristics.clone(),
        )
    };
    assert_eq!(
        first.iter().map(key).collect::<Vec<_>>(),
        second.iter().map(key).collect::<Vec<_>>()
    );

    let strip = first.iter().find(|r| r.file_path.ends_with("strip.png")).unwrap();
    assert_eq!(
        strip.sprite_sheet_heuristics,
        vec!["sprite-sheet-like-dimensions", "possible-sprite-strip"]
    );
    let photo = first.iter().find(|r| r.file_path.ends_with("photo.bmp")).unwrap();
    assert!(photo.sprite_sheet_heuristics.is_empty());
    assert_eq!(photo.classification_label.as_deref(), Some("blue thing"));
}

/// 出力ファイルにソート済みJSONが書かれる
#[test]
fn test_results_written_to_file() {
    let dir = tempdir().expect("Failed to create temp dir");
    let assets = dir.path().join("assets");
    std::fs::create_dir_all(&assets).unwrap();
    write_png(&assets.join("b.png"), 64, 64, [1, 2, 3]);
    write_png(&assets.join("a.png"), 64, 64, [1, 2, 3]);

    let paths = scanner::scan_folder(&assets).unwrap();
    let (services, _) = services();
    let results = run_batch(&paths, &services, &options(4)).unwrap();

    let output = dir.path().join("result.json");
    write_results(&results, Some(&output)).unwrap();

    let content = std::fs::read_to_string(&output).unwrap();
    let parsed: Vec<AnalysisResult> = serde_json::from_str(&content).unwrap();
    assert_eq!(parsed.len(), 2);
    assert!(parsed[0].file_path.ends_with("a.png"));
    assert!(parsed[1].file_path.ends_with("b.png"));
    assert!(content.starts_with("[\n  {\n    \"file_path\": "));
}

/// ワーカー間で推論が重なって実行され、上限はワーカー数
#[test]
fn test_workers_run_inference_concurrently() {
    let dir = tempdir().expect("Failed to create temp dir");
    for i in 0..8 {
        write_png(&dir.path().join(format!("tile_{}.png", i)), 32, 32, [9, 9, 9]);
    }
    let paths = scanner::scan_folder(dir.path()).unwrap();

    let gauge = Arc::new(ConcurrencyGauge::default());
    let services = ModelServices::new(
        ColorClassifier {
            calls: Arc::new(AtomicUsize::new(0)),
        },
        SlowCaptioner {
            gauge: Arc::clone(&gauge),
        },
    );

    let results = run_batch(&paths, &services, &options(4)).unwrap();
    assert_eq!(results.len(), 8);
    assert!(results.iter().all(|r| r.caption.as_deref() == Some("a slow caption")));

    let peak = gauge.peak.load(Ordering::SeqCst);
    assert!(peak > 1, "captioning never overlapped (peak {})", peak);
    assert!(peak <= 4, "more concurrent calls than workers (peak {})", peak);
}
