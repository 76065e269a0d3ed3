//! Error types for the segmentation pipeline

use thiserror::Error;

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during encoding, reduction, or clustering
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid input parameters
    #[error("Invalid parameter: {message}")]
    InvalidParameter {
        /// Error message
        message: String,
    },

    /// Malformed or non-numeric feature data
    #[error("Invalid feature: {message}")]
    InvalidFeature {
        /// Error message
        message: String,
    },

    /// Too few records for the requested embedding dimension or cluster count
    #[error("Insufficient samples: {message}")]
    InsufficientSamples {
        /// Error message
        message: String,
    },

    /// A parameter sweep produced zero comparable configurations
    #[error("No valid configuration: {message}")]
    NoValidConfiguration {
        /// Error message
        message: String,
    },

    /// Mathematical computation error
    #[error("Computation error: {message}")]
    ComputationError {
        /// Error message
        message: String,
    },
}

impl Error {
    /// Create a new InvalidParameter error
    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }

    /// Create a new InvalidFeature error
    pub fn invalid_feature(message: impl Into<String>) -> Self {
        Self::InvalidFeature {
            message: message.into(),
        }
    }

    /// Create a new InsufficientSamples error
    pub fn insufficient_samples(message: impl Into<String>) -> Self {
        Self::InsufficientSamples {
            message: message.into(),
        }
    }

    /// Create a new NoValidConfiguration error
    pub fn no_valid_configuration(message: impl Into<String>) -> Self {
        Self::NoValidConfiguration {
            message: message.into(),
        }
    }

    /// Create a new ComputationError
    pub fn computation_error(message: impl Into<String>) -> Self {
        Self::ComputationError {
            message: message.into(),
        }
    }
}
