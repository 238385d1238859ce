//! Tool abstractions for function-calling agents.
//!
//! Every agent capability (listing cluster objects, running a health check,
//! asking another agent) is a [`Tool`] trait implementor. Tools are
//! collected into a [`ToolSet`] which handles dispatch, validation, and
//! timeouts.
//!
//! # Submodules
//!
//! - [`core`]: [`Tool`] trait, [`ToolContext`], [`ToolSet`].
//! - [`spec`]: [`ToolSpec`](spec::ToolSpec) builder for structured tool
//!   descriptions with explicitly declared parameters.
//! - [`reflection`]: structured error formatting for engine self-correction.

pub mod core;
pub mod reflection;
pub mod spec;

pub use core::{
    Tool, ToolContext, ToolFuture, ToolOutput, ToolSet, log_tool_call, parse_tool_args,
    validate_tool_arguments,
};
pub use spec::{ParamType, ToolSpec};
