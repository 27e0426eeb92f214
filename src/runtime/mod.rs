pub mod client;
pub mod credentials;
pub mod types;

pub use client::{DecisionRuntime, HttpDecisionRuntime};
pub use types::tool_name_override_key;
pub use credentials::Credentials;
