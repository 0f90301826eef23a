//! Error types for chanweave-core

use thiserror::Error;

/// Result type alias for chanweave-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Status code carried by every error returned from the graph store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// A referenced graph, node, channel or pin does not exist
    NotFound,
    /// The request conflicts with the current state of the graph
    FailedPrecondition,
    /// The request itself is malformed (e.g. uses a reserved name)
    InvalidArgument,
    /// Unexpected failure (I/O, serialization, timeouts)
    Internal,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCode::NotFound => "NotFound",
            ErrorCode::FailedPrecondition => "FailedPrecondition",
            ErrorCode::InvalidArgument => "InvalidArgument",
            ErrorCode::Internal => "Internal",
        };
        f.write_str(s)
    }
}

/// Errors that can occur in chanweave-core
#[derive(Error, Debug)]
pub enum Error {
    /// No graph is loaded under the given key
    #[error("graph not found: {0}")]
    GraphNotFound(String),

    /// A graph is already loaded under the given key
    #[error("graph '{0}' is already loaded")]
    GraphExists(String),

    /// Node does not exist
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// Channel does not exist
    #[error("channel not found: {0}")]
    ChannelNotFound(String),

    /// Node exists but has no pin with this name
    #[error("node '{node}' has no pin '{pin}'")]
    PinNotFound {
        /// Node name
        node: String,
        /// Pin name
        pin: String,
    },

    /// A node with this name already exists
    #[error("node '{0}' already exists")]
    NodeExists(String),

    /// A channel with this name already exists
    #[error("channel '{0}' already exists")]
    ChannelExists(String),

    /// The pin is already attached to a channel
    #[error("pin '{node}.{pin}' is already connected to channel '{channel}'")]
    PinAlreadyBound {
        /// Node name
        node: String,
        /// Pin name
        pin: String,
        /// Channel the pin is bound to
        channel: String,
    },

    /// Pin and channel element types differ
    #[error("type mismatch: pin '{node}.{pin}' has type '{pin_type}', channel '{channel}' has type '{channel_type}'")]
    TypeMismatch {
        /// Node name
        node: String,
        /// Pin name
        pin: String,
        /// Pin element type
        pin_type: String,
        /// Channel name
        channel: String,
        /// Channel element type
        channel_type: String,
    },

    /// Channel would not connect at least one input and one output
    #[error("channel '{channel}' needs at least one input and one output pin")]
    DirectionConflict {
        /// Channel name
        channel: String,
    },

    /// A node may not attach two of its own pins to one channel
    #[error("node '{node}' is already attached to channel '{channel}'")]
    SelfLoop {
        /// Node name
        node: String,
        /// Channel name
        channel: String,
    },

    /// Part type key is not in the registry
    #[error("unknown part type: {0}")]
    UnknownPartType(String),

    /// Part configuration could not be deserialized or is invalid
    #[error("invalid configuration for part '{part_type}': {message}")]
    PartConfig {
        /// Part type key
        part_type: String,
        /// Description of the error
        message: String,
    },

    /// Reconfiguring a node would orphan or retype a connected pin
    #[error("pin '{node}.{pin}' is connected; disconnect it before changing the part's pins")]
    BoundPinChanged {
        /// Node name
        node: String,
        /// Pin name
        pin: String,
    },

    /// Reserved or empty identifier
    #[error("invalid name '{name}': {reason}")]
    InvalidName {
        /// Offending name
        name: String,
        /// Why it is rejected
        reason: String,
    },

    /// Out-of-range numeric argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Persisted graph violates the graph invariants
    #[error("graph '{graph}' is inconsistent: {}", .problems.join("; "))]
    Inconsistent {
        /// Graph name
        graph: String,
        /// Individual problems found by the checker
        problems: Vec<String>,
    },

    /// Save did not finish within the configured timeout
    #[error("saving '{key}' timed out after {millis}ms")]
    SaveTimeout {
        /// Persistence key
        key: String,
        /// Timeout in milliseconds
        millis: u64,
    },

    /// Failed to parse YAML configuration
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// Configuration file could not be found
    #[error("configuration file not found: {path}")]
    ConfigNotFound {
        /// Path that was searched
        path: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// The status code reported to callers of the graph store.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::GraphNotFound(_)
            | Error::NodeNotFound(_)
            | Error::ChannelNotFound(_)
            | Error::PinNotFound { .. }
            | Error::ConfigNotFound { .. } => ErrorCode::NotFound,

            Error::GraphExists(_)
            | Error::NodeExists(_)
            | Error::ChannelExists(_)
            | Error::PinAlreadyBound { .. }
            | Error::TypeMismatch { .. }
            | Error::DirectionConflict { .. }
            | Error::SelfLoop { .. }
            | Error::UnknownPartType(_)
            | Error::PartConfig { .. }
            | Error::BoundPinChanged { .. }
            | Error::Inconsistent { .. } => ErrorCode::FailedPrecondition,

            Error::InvalidName { .. } | Error::InvalidArgument(_) => ErrorCode::InvalidArgument,

            Error::SaveTimeout { .. }
            | Error::ConfigParse(_)
            | Error::Io(_)
            | Error::Json(_) => ErrorCode::Internal,
        }
    }
}
