//! Outbound credentials for the decision runtime.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// How requests to the decision runtime authenticate.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// `Authorization: ZenApiKey base64(username:apikey)`.
    ApiKey { username: String, apikey: String },
    /// HTTP basic authentication.
    Basic { username: String, password: String },
}

impl Credentials {
    /// Value of the `Authorization` header.
    pub fn authorization_header(&self) -> String {
        match self {
            Self::ApiKey { username, apikey } => {
                format!("ZenApiKey {}", STANDARD.encode(format!("{username}:{apikey}")))
            }
            Self::Basic { username, password } => {
                format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
            }
        }
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKey { username, .. } => f
                .debug_struct("ApiKey")
                .field("username", username)
                .finish_non_exhaustive(),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
        }
    }
}
