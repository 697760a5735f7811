//! chatlink CLI library
//!
//! This library provides the components behind the `chatlink` command:
//! argument parsing, configuration, state persistence and command handlers.

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod state;

pub use app::ChatlinkApp;
pub use cli::{Cli, Commands};
pub use config::AppConfig;
pub use error::{CliError, Result};
