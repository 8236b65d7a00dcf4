//! Healprobe CLI Library
//!
//! Command-line front end for the Healprobe locator and resolver library.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::format_push_string)] // String building is clear and correct
#![allow(clippy::missing_errors_doc)] // Error types are self-documenting

mod commands;
mod config;
mod error;
pub mod handlers;
pub mod logging;
mod output;

pub use commands::{
    Cli, ColorArg, Commands, GenerateArgs, GenerateLayout, LocateArgs, LocateFormat, ResolveArgs, RunArgs,
};
pub use config::{CliConfig, ColorChoice, Verbosity, LOG_ENV};
pub use error::{CliError, CliResult};
pub use logging::init_logging;
pub use output::{OutputFormat, Reporter};
