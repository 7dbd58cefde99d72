use crate::error::{AnalyzerError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// モデル配置先を上書きする環境変数
pub const MODEL_DIR_ENV: &str = "ASSET_ANALYZER_MODEL_DIR";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// モデルのルートディレクトリ
    pub model_dir: PathBuf,
    /// 分類モデルのサブディレクトリ名
    pub classification_model: String,
    /// キャプションモデルのサブディレクトリ名
    pub captioning_model: String,
    pub num_beams: usize,
    pub max_caption_length: usize,
    pub max_workers: usize,
    /// ONNX Runtime のセッションあたりスレッド数（ワーカー並列と重ならないよう既定1）
    pub inference_threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_dir: default_model_dir(),
            classification_model: "vit-base-patch16-224".into(),
            captioning_model: "vit-gpt2-image-captioning".into(),
            num_beams: 4,
            max_caption_length: 16,
            max_workers: 4,
            inference_threads: 1,
        }
    }
}

impl Config {
    /// 設定ファイルを読み込み、環境変数を反映
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.override_model_dir(std::env::var(MODEL_DIR_ENV).ok().as_deref());
        Ok(config)
    }

    /// 環境変数の値でモデル配置先を上書き（未設定・空文字は無視）
    pub fn override_model_dir(&mut self, dir: Option<&str>) {
        if let Some(dir) = dir.filter(|d| !d.is_empty()) {
            self.model_dir = PathBuf::from(dir);
        }
    }

    /// 指定パスから読み込み（存在しなければ既定値）
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| AnalyzerError::Config("home directory not found".into()))?;
        Ok(home.join(".config").join("asset-analyzer").join("config.json"))
    }

    pub fn classification_dir(&self) -> PathBuf {
        self.model_dir.join(&self.classification_model)
    }

    pub fn captioning_dir(&self) -> PathBuf {
        self.model_dir.join(&self.captioning_model)
    }
}

fn default_model_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|d| d.join("asset-analyzer").join("models"))
        .unwrap_or_else(|| PathBuf::from("models"))
}
