#![forbid(unsafe_code)]

mod stdio;

#[cfg(test)]
pub(crate) use stdio::handle_line;
pub(crate) use stdio::run_stdio;
