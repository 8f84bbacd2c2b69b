//! Core application functionality
//!
//! This module contains the core application logic, including:
//! - Error types shared by the positioning engine
//! - Settings file and CLI handling
//! - The command runner

pub mod cli;
pub mod config_file;
pub mod errors;
pub mod platform;
pub mod runner;

// Re-export commonly used items
pub use cli::CliArgs;
pub use config_file::ConfigFile;
pub use errors::{GeometryError, PersistError, PositioningError};
pub use runner::run_app;
