//! Domain error types.
//!
//! Only conditions that leave nothing meaningful to compute are errors.
//! Partial insufficiency is reported through [`crate::domain::diagnostic`].

use chrono::NaiveDateTime;

/// Top-level error type for marketlens.
#[derive(Debug, thiserror::Error)]
pub enum MarketlensError {
    #[error("no usable rows in {context}")]
    EmptyInput { context: String },

    #[error("insufficient data for {subject}: have {available} rows, need {required}")]
    InsufficientData {
        subject: String,
        available: usize,
        required: usize,
    },

    #[error("duplicate timestamp {timestamp} in series {symbol}")]
    DuplicateTimestamp {
        symbol: String,
        timestamp: NaiveDateTime,
    },

    #[error("price source error: {reason}")]
    DataSource { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&MarketlensError> for std::process::ExitCode {
    fn from(err: &MarketlensError) -> Self {
        let code: u8 = match err {
            MarketlensError::Io(_) => 1,
            MarketlensError::ConfigParse { .. }
            | MarketlensError::ConfigMissing { .. }
            | MarketlensError::ConfigInvalid { .. } => 2,
            MarketlensError::DataSource { .. } | MarketlensError::DuplicateTimestamp { .. } => 3,
            MarketlensError::EmptyInput { .. } | MarketlensError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
