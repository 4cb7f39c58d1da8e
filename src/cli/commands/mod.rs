//! Subcommands of the `smartcab` binary

pub mod compare;
pub mod train;
