//! Error types for tangent_bug

use thiserror::Error;

/// Main error type for the planner and its vehicle boundary
#[derive(Debug, Error)]
pub enum NavigationError {
    /// Geometry that has no defined result (zero-length vectors, empty segments)
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),
    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// Vehicle query or command failed
    #[error("Vehicle error: {0}")]
    Vehicle(String),
    /// Plot rendering failed
    #[error("Visualization error: {0}")]
    Visualization(String),
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Configuration could not be parsed
    #[error("Config error: {0}")]
    Config(#[from] serde_yaml::Error),
}

/// Result type alias for navigation operations
pub type NavigationResult<T> = Result<T, NavigationError>;
