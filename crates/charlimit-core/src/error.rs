//! Error types for charlimit-core.

use thiserror::Error;

use crate::host::NodeId;

/// Errors that can occur when working with configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),

    /// A configuration value was syntactically valid but out of range.
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The limit keyword produced a pattern the regex engine rejected.
    #[error("limit pattern failed to compile: {0}")]
    Pattern(#[from] regex::Error),
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Failures reported by the host document through the capability traits.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The node does not exist (or no longer exists) in the document.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    /// The node exists but does not support the requested operation.
    #[error("node {node} does not support `{operation}`")]
    Unsupported {
        /// The node the operation targeted.
        node: NodeId,
        /// Name of the rejected operation.
        operation: &'static str,
    },

    /// The host refused the call for its own reasons.
    #[error("host rejected `{operation}` on node {node}: {reason}")]
    Rejected {
        /// The node the operation targeted.
        node: NodeId,
        /// Name of the rejected operation.
        operation: &'static str,
        /// Host-provided explanation.
        reason: String,
    },
}

/// Result type alias using [`HostError`].
pub type HostResult<T> = Result<T, HostError>;

/// Errors that abort a check run.
#[derive(Error, Debug)]
pub enum CheckError {
    /// A host-interface call failed.
    #[error(transparent)]
    Host(#[from] HostError),

    /// The run was started with an unusable configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type alias using [`CheckError`].
pub type CheckResult<T> = Result<T, CheckError>;
