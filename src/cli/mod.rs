//! Command-line interface module.

mod args;
pub mod process;
pub mod run;

pub use args::{Cli, Commands, ProcessArgs, RunArgs, ScopeArgs};
