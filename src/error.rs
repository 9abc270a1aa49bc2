//! Error types for kubelab.
//!
//! This module defines the error types used throughout kubelab. The variants
//! follow the failure taxonomy of a provisioning run: configuration problems
//! that stop a run before any resource is declared, provider failures while
//! realizing resources, and the distinct ways fetching stack outputs from the
//! provisioning tool can go wrong.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Result type alias for kubelab operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for kubelab.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// A required configuration key has no value.
    #[error("Missing required configuration value '{0}'")]
    MissingConfig(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidConfig {
        /// Configuration key
        key: String,
        /// Error message
        message: String,
    },

    /// Error reading or parsing a stack configuration file.
    #[error("Failed to load configuration from '{path}': {message}")]
    ConfigLoad {
        /// Path to the configuration file
        path: PathBuf,
        /// Error message
        message: String,
    },

    // ========================================================================
    // Provider Errors
    // ========================================================================
    /// The cloud provider rejected or failed a request.
    #[error("Provider error while {action}: {message}")]
    Provider {
        /// What was being attempted
        action: String,
        /// Error message
        message: String,
    },

    /// The provider API answered with a non-success status.
    #[error("API request to '{endpoint}' failed with status {status}: {message}")]
    Api {
        /// Request path
        endpoint: String,
        /// HTTP status code
        status: u16,
        /// Error body or message
        message: String,
    },

    /// A droplet never reported a public address.
    #[error("Droplet '{name}' did not report a public IPv4 address within {timeout_secs} seconds")]
    AddressTimeout {
        /// Droplet name
        name: String,
        /// Timeout in seconds
        timeout_secs: u64,
    },

    /// A deferred output failed because one of its inputs failed.
    #[error(transparent)]
    Dependency(Arc<Error>),

    // ========================================================================
    // Stack Output Errors
    // ========================================================================
    /// The provisioning tool could not be run or exited unsuccessfully.
    #[error("Error getting stack outputs from '{program}': {message}")]
    ToolFailed {
        /// Program that was invoked
        program: String,
        /// Error message (usually the tool's stderr)
        message: String,
    },

    /// The provisioning tool's response could not be understood.
    #[error("Error parsing stack outputs: {0}")]
    MalformedOutputs(String),

    /// The provisioning tool succeeded but returned nothing usable.
    #[error("Failed to get stack outputs")]
    EmptyOutputs,

    /// No persisted state exists for the stack.
    #[error("Stack '{0}' has no recorded outputs")]
    StackNotFound(String),

    /// A named output is not present on the stack.
    #[error("Output '{output}' not found on stack '{stack}'")]
    OutputNotFound {
        /// Stack name
        stack: String,
        /// Output name
        output: String,
    },

    // ========================================================================
    // IO and Serialization Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Creates a new invalid configuration error.
    pub fn invalid_config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Creates a new provider error.
    pub fn provider(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            action: action.into(),
            message: message.into(),
        }
    }

    /// Creates a new tool failure error.
    pub fn tool_failed(program: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolFailed {
            program: program.into(),
            message: message.into(),
        }
    }

    /// Returns true if this error was raised before any resource was declared.
    pub fn is_config_error(&self) -> bool {
        match self {
            Error::MissingConfig(_) | Error::InvalidConfig { .. } | Error::ConfigLoad { .. } => {
                true
            }
            Error::Dependency(inner) => inner.is_config_error(),
            _ => false,
        }
    }

    /// Returns the error code for CLI exit status.
    ///
    /// Every failure maps to 1; the Ansible wrapper scripts only check for zero.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_failed_message() {
        let err = Error::tool_failed("pulumi", "no stack selected");
        assert_eq!(
            err.to_string(),
            "Error getting stack outputs from 'pulumi': no stack selected"
        );
    }

    #[test]
    fn test_dependency_is_transparent() {
        let inner = Arc::new(Error::MissingConfig("ssh_public_key".to_string()));
        let err = Error::Dependency(inner);
        assert_eq!(
            err.to_string(),
            "Missing required configuration value 'ssh_public_key'"
        );
        assert!(err.is_config_error());
    }

    #[test]
    fn test_exit_code() {
        assert_eq!(Error::EmptyOutputs.exit_code(), 1);
        assert_eq!(Error::MalformedOutputs("x".into()).exit_code(), 1);
    }
}
