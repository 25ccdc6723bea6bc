pub mod args;
mod types;

pub use args::{Cli, Commands, InitArgs, LaunchArgs, LiteArgs, NodeArgs, WaitFor};
