use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailLensError {
    #[error("Upstream API error ({status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MailLensError>;
