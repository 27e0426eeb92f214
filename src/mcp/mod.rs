//! Model Context Protocol server surface.

pub mod protocol;
pub mod server;
pub mod transport;

pub use server::McpServer;
pub use transport::{serve, serve_stdio};
