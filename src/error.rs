use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExporterError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid measure value: {0}")]
    InvalidValue(String),

    #[error("Metrics server failed: {0}")]
    Server(#[from] hyper::Error),
}

pub type Result<T> = std::result::Result<T, ExporterError>;
