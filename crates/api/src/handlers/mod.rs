#![forbid(unsafe_code)]

mod definitions;
mod dispatch;
mod hierarchy;
mod links;
mod registry;
mod render;

pub(crate) use definitions::handler_definitions;
pub(crate) use dispatch::{dispatch_tool, tool_mutates};
