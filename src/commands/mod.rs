pub mod run;
pub mod tools;

// Re-export command functions
pub use run::{cmd_lite, cmd_node};
pub use tools::{cmd_gen_validator, cmd_init, cmd_version};
