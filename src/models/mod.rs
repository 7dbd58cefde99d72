//! 推論モデルのサービス層
//!
//! 解析処理は `Classifier` / `Captioner` トレイトだけに依存する。
//! 本番ではONNX Runtime実装、テストでは差し替え用の実装を渡す。

pub mod beam;
pub mod captioner;
pub mod classifier;
pub mod gpt2;
pub mod ops;
pub mod preprocess;

pub use captioner::OnnxCaptioner;
pub use classifier::OnnxClassifier;

use crate::config::Config;
use crate::error::{AnalyzerError, Result};
use image::RgbImage;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

/// 分類結果（最上位ラベルとsoftmax確信度）
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub label: String,
    pub confidence: f32,
}

/// 画像 → (ラベル, 確信度)
pub trait Classifier: Send + Sync {
    fn classify(&self, image: &RgbImage) -> Result<Classification>;
}

/// 画像 → キャプション
pub trait Captioner: Send + Sync {
    fn caption(&self, image: &RgbImage) -> Result<String>;
}

/// 起動時に一度だけ構築し、全ワーカーで共有する読み取り専用ハンドル
pub struct ModelServices {
    classifier: Box<dyn Classifier>,
    captioner: Box<dyn Captioner>,
}

impl ModelServices {
    pub fn new(
        classifier: impl Classifier + 'static,
        captioner: impl Captioner + 'static,
    ) -> Self {
        Self {
            classifier: Box::new(classifier),
            captioner: Box::new(captioner),
        }
    }

    /// 設定に従いONNXモデルを読み込む
    pub fn load(config: &Config) -> Result<Self> {
        let options = SessionOptions {
            intra_threads: config.inference_threads.max(1),
            copies: config.max_workers.max(1),
        };

        let classifier = OnnxClassifier::load(&config.classification_dir(), options)?;
        let captioner = OnnxCaptioner::load(
            &config.captioning_dir(),
            options,
            config.num_beams,
            config.max_caption_length,
        )?;
        info!(
            "モデル読み込み完了: {} (セッション{}組)",
            config.model_dir.display(),
            options.copies
        );

        Ok(Self::new(classifier, captioner))
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn captioner(&self) -> &dyn Captioner {
        self.captioner.as_ref()
    }
}

/// セッション生成時の設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// セッションあたりのスレッド数
    pub intra_threads: usize,
    /// 同じモデルのセッションを何個持つか（ワーカー数に合わせる）
    pub copies: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            intra_threads: 1,
            copies: 1,
        }
    }
}

/// ワーカーごとに1つずつ割り当てるセッション群
///
/// rayonワーカーのスレッド番号でスロットを選ぶので、
/// ワーカー数と同数あれば互いにロックを待たない。
pub(crate) struct SessionPool<T> {
    slots: Vec<Mutex<T>>,
}

impl<T> SessionPool<T> {
    /// `make` を `copies` 回（最低1回）呼んでスロットを作る
    pub(crate) fn build(copies: usize, mut make: impl FnMut() -> Result<T>) -> Result<Self> {
        let slots = (0..copies.max(1))
            .map(|_| make().map(Mutex::new))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { slots })
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    /// 現在のスレッドに対応するスロットをロック（プール外ではスロット0）
    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, T>> {
        let index = rayon::current_thread_index().unwrap_or(0) % self.slots.len();
        self.slots[index]
            .lock()
            .map_err(|_| AnalyzerError::Inference("session lock poisoned".into()))
    }
}

/// ONNXセッションを開く
pub(crate) fn open_session(path: &Path, threads: usize) -> Result<Session> {
    if !path.is_file() {
        return Err(AnalyzerError::ModelLoad(format!(
            "model file not found: {}",
            path.display()
        )));
    }

    let load_err = |e: &dyn std::fmt::Display| {
        AnalyzerError::ModelLoad(format!("{}: {}", path.display(), e))
    };

    Session::builder()
        .map_err(|e| load_err(&e))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| load_err(&e))?
        .with_intra_threads(threads.max(1))
        .map_err(|e| load_err(&e))?
        .commit_from_file(path)
        .map_err(|e| load_err(&e))
}

pub(crate) fn inference_err(e: impl std::fmt::Display) -> AnalyzerError {
    AnalyzerError::Inference(e.to_string())
}
