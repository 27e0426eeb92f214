//! Typed errors for the synchronization engine and its collaborators.

use thiserror::Error;

/// Failures talking to the decision runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("request to decision runtime failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("decision runtime returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The runtime answered 200 with an incident object instead of a result.
    #[error("decision runtime incident {id} ({category}): {message}")]
    Incident {
        id: String,
        category: String,
        message: String,
    },

    #[error("invalid decision runtime URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("decision runtime URL '{0}' cannot carry a path")]
    UnsupportedUrl(String),

    #[error("unexpected response from decision runtime: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Why one declared operation was left out of a service's tool set.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TranslateError {
    #[error("operation has no operationId")]
    MissingOperationId,

    #[error("operation {0} has no application/json request body schema")]
    MissingRequestBody(String),

    #[error("unresolvable schema reference {0}")]
    UnresolvedReference(String),

    #[error("input schema of {0} is not an object with properties")]
    NotAnObject(String),

    #[error("malformed operation: {0}")]
    Malformed(String),
}

/// Errors raised by the live tool registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("a tool named '{0}' is already registered")]
    DuplicateName(String),

    /// The handle no longer refers to a live entry.
    #[error("tool '{0}' is not registered")]
    UnknownHandle(String),
}

/// Errors that abort a discovery or reconciliation pass.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("tool name conflict: '{name}' is already used by another operation")]
    NamingConflict { name: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Configuration values rejected at startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("decision runtime URL is required")]
    MissingUrl,

    #[error("poll interval must be at least {min} ms, got {actual} ms")]
    PollIntervalTooShort { min: u64, actual: u64 },

    #[error("at least one deployment space is required")]
    NoDeploymentSpaces,

    #[error("credentials are required: set an API key or a password, together with a username")]
    MissingCredentials,
}
