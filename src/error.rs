use thiserror::Error as ThisError;

/// Error types
#[derive(ThisError, Debug)]
pub enum Error {
    #[error("could not query host resources: {0}")]
    ResourceQuery(String),

    #[error("unknown scale function '{0}'")]
    UnknownScaleFunction(String),

    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("no datasets have been requested")]
    NoDataRequested,

    #[error("memory fraction should be in (0, 1], found {0}")]
    InvalidMemoryFraction(f64),

    #[error("size of dataset '{path}' is unavailable")]
    DataSizeUnavailable { path: String },

    #[error("dataset '{path}' has {found} configurations, expected {expected}")]
    InconsistentConfigurations {
        path: String,
        expected: usize,
        found: usize,
    },

    #[error(
        "data range {data_range} of '{path}' exceeds the {available} configurations available"
    )]
    RangeExceeded {
        path: String,
        data_range: usize,
        available: usize,
    },

    #[error("offset {offset} of '{path}' leaves none of the {available} configurations")]
    OffsetExceeded {
        path: String,
        offset: usize,
        available: usize,
    },

    #[error(
        "'{name}' cannot split '{path}' into atom mini-batches; \
         increase the memory fraction or reduce the data range"
    )]
    MinibatchUnsupported { name: String, path: String },

    #[error(
        "'{path}' cannot hold a window of {data_range} configurations \
         (correlation time {correlation_time}), even with single-atom mini-batches; \
         increase the memory fraction or reduce the data range"
    )]
    InsufficientData {
        path: String,
        data_range: usize,
        correlation_time: usize,
    },

    #[error("shape mismatch for '{path}': expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        path: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("dataset '{0}' already exists")]
    DatasetExists(String),

    #[error("property '{0}' is missing")]
    MissingProperty(String),

    #[error("analysis '{0}' was cancelled")]
    Cancelled(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name: String::from(name),
            reason: reason.into(),
        }
    }
}
