//! Domain error types.

/// Top-level error type for barlytics.
///
/// Numeric degeneracies (zero average loss, too little history) are not
/// errors; they surface as `None` values inside indicator columns.
#[derive(Debug, thiserror::Error)]
pub enum BarlyticsError {
    #[error("missing required column '{column}'")]
    MissingColumn { column: String },

    #[error("invalid value in row {row}, column '{column}': {reason}")]
    InvalidValue {
        row: usize,
        column: String,
        reason: String,
    },

    #[error("series is not in ascending time order at bar {index}")]
    UnorderedSeries { index: usize },

    #[error("column '{column}' has {actual} values, series has {expected} bars")]
    MisalignedColumn {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("duplicate bar timestamp {timestamp}")]
    DuplicateTimestamp { timestamp: String },

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

    #[error("kline fetch failed: {reason}")]
    Fetch { reason: String },

    #[error("unexpected kline response: {reason}")]
    UnexpectedResponse { reason: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BarlyticsError {
    pub fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        BarlyticsError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid_value(row: usize, column: &str, reason: impl Into<String>) -> Self {
        BarlyticsError::InvalidValue {
            row,
            column: column.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&BarlyticsError> for std::process::ExitCode {
    fn from(err: &BarlyticsError) -> Self {
        let code: u8 = match err {
            BarlyticsError::Io(_) | BarlyticsError::Csv(_) | BarlyticsError::Json(_) => 1,
            BarlyticsError::ConfigParse { .. }
            | BarlyticsError::ConfigMissing { .. }
            | BarlyticsError::ConfigInvalid { .. } => 2,
            BarlyticsError::MissingColumn { .. }
            | BarlyticsError::InvalidValue { .. }
            | BarlyticsError::UnorderedSeries { .. }
            | BarlyticsError::MisalignedColumn { .. }
            | BarlyticsError::DuplicateTimestamp { .. } => 3,
            BarlyticsError::Fetch { .. } | BarlyticsError::UnexpectedResponse { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
