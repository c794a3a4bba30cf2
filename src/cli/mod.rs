//! Command-line interface

pub mod commands;

pub use commands::{
    cmd_owner, cmd_propose, cmd_transfer_from_safe, cmd_transfer_to_safe, AppContext, CliResult,
};
