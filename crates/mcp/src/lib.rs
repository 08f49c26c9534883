//! MCP (Model Context Protocol) implementation for querygate.
//!
//! Speaks JSON-RPC 2.0 over two front ends that share one `ToolRegistry`.
//!
//! # Architecture
//!
//! - **types**: JSON-RPC 2.0 and MCP-specific protocol types
//! - **envelope**: request envelope validation
//! - **transport**: transport trait and the in-memory channel transport
//! - **server**: per-session MCP server (tool errors as `isError` content)
//! - **http**: stateless handler (tool errors as JSON-RPC error objects)
//! - **error**: unified error type and JSON-RPC code mapping

pub mod envelope;
pub mod error;
pub mod http;
pub mod server;
pub mod transport;
pub mod types;

pub use error::McpError;
pub use http::{RpcHandler, RpcReply};
pub use server::McpServer;
pub use transport::{ChannelTransport, McpTransport};
pub use types::*;
