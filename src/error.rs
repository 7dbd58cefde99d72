use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("Directory not found: {0}")]
    DirectoryNotFound(String),

    #[error("cannot identify image file ({0})")]
    UnreadableImage(String),

    #[error("image load error: {0}")]
    ImageLoad(String),

    #[error("model load error: {0}")]
    ModelLoad(String),

    #[error("inference error: {0}")]
    Inference(String),

    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AnalyzerError {
    /// 結果JSONに記録するエラー種別名
    pub fn kind(&self) -> &'static str {
        match self {
            AnalyzerError::Config(_) => "Config",
            AnalyzerError::DirectoryNotFound(_) => "DirectoryNotFound",
            AnalyzerError::UnreadableImage(_) => "UnreadableImage",
            AnalyzerError::ImageLoad(_) => "ImageLoad",
            AnalyzerError::ModelLoad(_) => "ModelLoad",
            AnalyzerError::Inference(_) => "Inference",
            AnalyzerError::JsonParse(_) => "JsonParse",
            AnalyzerError::Io(_) => "Io",
        }
    }

    /// "種別: メッセージ" 形式
    pub fn descriptor(&self) -> String {
        format!("{}: {}", self.kind(), self)
    }
}

impl From<image::ImageError> for AnalyzerError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => AnalyzerError::Io(e),
            image::ImageError::Decoding(_) | image::ImageError::Unsupported(_) => {
                AnalyzerError::UnreadableImage(err.to_string())
            }
            other => AnalyzerError::ImageLoad(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
