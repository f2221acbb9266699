//! Services of the command-line host.

pub mod config_manager;
pub mod sample_host;
