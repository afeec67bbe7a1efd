use thiserror::Error;

/// 导致本次运行中止的错误
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("record store error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to export csv: {0}")]
    Csv(#[from] csv::Error),
}

impl From<config::ConfigError> for AuditError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

/// 消息服务错误，只降级不中止
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider not configured (EVOLUTION_API_URL, EVOLUTION_API_KEY, EVOLUTION_INSTANCE_NAME)")]
    NotConfigured,

    #[error("invalid provider url: {0}")]
    InvalidUrl(String),

    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider responded HTTP {status}")]
    Status { status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, AuditError>;
