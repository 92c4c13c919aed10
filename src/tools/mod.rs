//! Tool schemas and argument handling for function calling.

pub mod arguments;
pub mod catalog;
pub mod validation;

pub use arguments::ToolArguments;
pub use catalog::{tool_definitions, EdaTool, ToolInvocation};
