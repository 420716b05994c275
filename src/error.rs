use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Auth(String),

    /// Input values the platform workflow cannot proceed with.
    #[error("{0}")]
    InvalidValue(String),

    /// A platform response did not have the expected shape.
    #[error("{0}")]
    UnexpectedResponse(String),

    #[error("{0}")]
    FiniteStateApi(String),

    #[error("Azure DevOps API error: {0}")]
    AzureDevOpsApi(String),

    #[error("Output error: {0}")]
    Output(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// How an upload failure is reported in the step's `error` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadErrorKind {
    Value,
    Type,
    Other,
}

impl UploadErrorKind {
    pub fn describe(&self) -> &'static str {
        match self {
            UploadErrorKind::Value => "a ValueError",
            UploadErrorKind::Type => "a TypeError",
            UploadErrorKind::Other => "an exception",
        }
    }
}

impl AppError {
    pub fn upload_kind(&self) -> UploadErrorKind {
        match self {
            AppError::InvalidValue(_) => UploadErrorKind::Value,
            AppError::UnexpectedResponse(_) | AppError::Serialization(_) => UploadErrorKind::Type,
            _ => UploadErrorKind::Other,
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(e: config::ConfigError) -> Self {
        AppError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
