//! Command-line front end: argument parsing, one-shot commands and the
//! interactive chat prompt.

mod args;
mod chat;
mod commands;
mod prompt;

pub use args::Cli;
pub use commands::execute;
