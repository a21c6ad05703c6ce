#![forbid(unsafe_code)]

mod frameworks;
mod indicators;
mod levels;
