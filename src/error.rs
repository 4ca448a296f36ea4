use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Invalid catalog entry for '{key}': {details}")]
    InvalidCatalogEntry { key: String, details: String },

    #[error("Duplicate concept key in catalog: {0}")]
    DuplicateConceptKey(String),

    #[error("Invalid alert threshold {name}={value}")]
    InvalidThreshold { name: String, value: f64 },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
