//! Subcommand handlers.

pub mod config_cmd;
pub mod submit;
pub mod watch;
