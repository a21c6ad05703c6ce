#![forbid(unsafe_code)]

pub mod ids;
pub mod model;
pub mod period;
pub mod structure;
