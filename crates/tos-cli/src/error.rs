//! Error types for the command-line tool.

use thiserror::Error;

/// Invalid command-line configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Value outside its accepted range
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue {
        /// Option name
        name: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// A required value was neither given nor found in the metadata sidecar
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
