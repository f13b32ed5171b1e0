//! Error types for the floodwatch map viewer.

use thiserror::Error;

/// Result type alias using FloodwatchError.
pub type FloodwatchResult<T> = Result<T, FloodwatchError>;

/// Primary error type for catalog, request and data-source operations.
#[derive(Debug, Error)]
pub enum FloodwatchError {
    // === Catalog Errors ===
    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    #[error("Duplicate layer in catalog: {0}")]
    DuplicateLayer(String),

    #[error("Invalid layer '{layer}': {message}")]
    InvalidLayer { layer: String, message: String },

    // === Parameter Errors ===
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid BBOX: {0}")]
    InvalidBbox(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    // === Upstream Errors ===
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("WMS service exception: {0}")]
    ServiceException(String),

    #[error("Data not available: {0}")]
    DataNotAvailable(String),

    #[error("Malformed data: {0}")]
    MalformedData(String),

    // === Infrastructure Errors ===
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Request timeout")]
    Timeout,
}

impl FloodwatchError {
    /// Whether the failure belongs to a single data source and should render
    /// as an empty state instead of aborting the view.
    pub fn is_data_failure(&self) -> bool {
        matches!(
            self,
            FloodwatchError::RequestFailed(_)
                | FloodwatchError::ServiceException(_)
                | FloodwatchError::DataNotAvailable(_)
                | FloodwatchError::MalformedData(_)
                | FloodwatchError::Timeout
        )
    }

    /// Text shown to the user in place of the missing content.
    pub fn user_message(&self) -> String {
        if self.is_data_failure() {
            "No data available".to_string()
        } else {
            self.to_string()
        }
    }
}

impl From<std::io::Error> for FloodwatchError {
    fn from(err: std::io::Error) -> Self {
        FloodwatchError::DataNotAvailable(err.to_string())
    }
}

impl From<serde_json::Error> for FloodwatchError {
    fn from(err: serde_json::Error) -> Self {
        FloodwatchError::MalformedData(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for FloodwatchError {
    fn from(err: serde_yaml::Error) -> Self {
        FloodwatchError::ConfigError(format!("YAML error: {}", err))
    }
}
