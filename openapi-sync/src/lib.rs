pub mod cli;
pub mod git;
pub mod load_config;

pub use cli::{run, Cli, Commands};
