use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Date parsing error: {0}")]
    DateError(#[from] chrono::ParseError),

    #[error("Catalog source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Download failed for symbol {symbol}: {reason}")]
    SymbolDownloadFailed { symbol: String, reason: String },

    #[error("Processing failed for file {path}: {reason}")]
    FileProcessingFailed { path: String, reason: String },

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

// 用于从字符串创建错误
impl From<String> for PipelineError {
    fn from(s: String) -> Self {
        PipelineError::Unknown(s)
    }
}

// 用于从&str创建错误
impl From<&str> for PipelineError {
    fn from(s: &str) -> Self {
        PipelineError::Unknown(s.to_string())
    }
}
