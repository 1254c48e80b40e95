//! Interactive surfaces other than the web UI.

pub mod cli;

pub use cli::CliChannel;
