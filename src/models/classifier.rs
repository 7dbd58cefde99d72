//! ViT画像分類（ONNX）

use super::ops::{argmax, softmax};
use super::preprocess::vit_pixel_values;
use super::{inference_err, open_session, Classification, Classifier, SessionOptions, SessionPool};
use crate::error::{AnalyzerError, Result};
use image::RgbImage;
use ort::session::Session;
use ort::value::Tensor;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

const MODEL_FILE: &str = "model.onnx";
const CONFIG_FILE: &str = "config.json";

/// `id2label` のindex上限（ImageNet-21kでも2万強）
const MAX_LABELS: usize = 100_000;

#[derive(Debug, Deserialize)]
struct LabelConfig {
    #[serde(default)]
    id2label: HashMap<String, String>,
}

pub struct OnnxClassifier {
    sessions: SessionPool<Session>,
    input_name: String,
    labels: Vec<String>,
}

impl OnnxClassifier {
    /// `model.onnx` と `config.json`（id2label）を読み込む
    pub fn load(dir: &Path, options: SessionOptions) -> Result<Self> {
        let model = dir.join(MODEL_FILE);
        let sessions = SessionPool::build(options.copies, || {
            open_session(&model, options.intra_threads)
        })?;
        let input_name = sessions
            .lock()?
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "pixel_values".into());

        let content = std::fs::read_to_string(dir.join(CONFIG_FILE))?;
        let labels = parse_labels(&content)?;
        debug!(
            "分類モデル読み込み: {} ({}クラス, セッション{})",
            dir.display(),
            labels.len(),
            sessions.len()
        );

        Ok(Self {
            sessions,
            input_name,
            labels,
        })
    }

    fn label_for(&self, index: usize) -> String {
        self.labels
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("LABEL_{}", index))
    }
}

impl Classifier for OnnxClassifier {
    fn classify(&self, image: &RgbImage) -> Result<Classification> {
        let input = Tensor::from_array(vit_pixel_values(image)).map_err(inference_err)?;

        let logits: Vec<f32> = {
            let mut session = self.sessions.lock()?;
            let outputs = session
                .run(ort::inputs![self.input_name.as_str() => input])
                .map_err(inference_err)?;
            let logits = outputs[0].try_extract_array::<f32>().map_err(inference_err)?;
            let values: Vec<f32> = logits.iter().copied().collect();
            values
        };

        let probs = softmax(&logits);
        let (index, confidence) =
            argmax(&probs).ok_or_else(|| AnalyzerError::Inference("empty logits".into()))?;

        Ok(Classification {
            label: self.label_for(index),
            confidence,
        })
    }
}

/// `id2label` を index順のラベル列に変換（欠番は `LABEL_n`）
pub fn parse_labels(config_json: &str) -> Result<Vec<String>> {
    let config: LabelConfig = serde_json::from_str(config_json)?;

    let mut indexed: Vec<(usize, String)> = Vec::with_capacity(config.id2label.len());
    for (id, label) in config.id2label {
        let index = id
            .parse::<usize>()
            .ok()
            .filter(|&i| i < MAX_LABELS)
            .ok_or_else(|| AnalyzerError::ModelLoad(format!("invalid id2label key: {}", id)))?;
        indexed.push((index, label));
    }

    let size = indexed.iter().map(|(i, _)| i + 1).max().unwrap_or(0);
    let mut labels: Vec<String> = (0..size).map(|i| format!("LABEL_{}", i)).collect();
    for (index, label) in indexed {
        labels[index] = label;
    }
    Ok(labels)
}
