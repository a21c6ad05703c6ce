#![forbid(unsafe_code)]

mod ai;
mod args;
mod identity;
mod jsonrpc;

pub(crate) use ai::*;
pub(crate) use args::*;
pub(crate) use identity::*;
pub(crate) use jsonrpc::*;
