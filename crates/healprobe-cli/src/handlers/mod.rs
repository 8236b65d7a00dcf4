//! Command handlers - extracted from main.rs for testability
//!
//! Each handler module contains:
//! - The execution logic for a CLI command
//! - Pure helper functions
//! - Tests

pub mod generate;
pub mod locate;
pub mod resolve;
pub mod run;

// Re-export handlers for convenient access
pub use generate::{execute_generate, generate_page};
pub use locate::{boundary_for, execute_locate, locate, render_report, LocateReport};
pub use resolve::{describe_event, execute_resolve, options_from_args, resolve};
pub use run::{execute_run, run_scenarios, RunSummary, ScenarioLine};
