pub mod args;
pub mod registry;
pub mod tool;
pub mod tools;

pub use args::{ToolArgs, ToolName};
pub use registry::ToolRegistry;
pub use tool::{Backend, ToolDefinition, ToolError, ToolResult};
