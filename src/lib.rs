//! Decision MCP server: exposes deployed decision services as MCP tools.
//!
//! Decision services are discovered from a decision runtime, their OpenAPI
//! operations are translated into tool definitions, and a background poller
//! keeps the live tool registry in sync as services are deployed, updated
//! or removed.

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod mcp;
pub mod openapi;
pub mod poll;
pub mod registry;
pub mod runtime;
pub mod tools;
