//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use healprobe::CandidateContainer;
use std::path::PathBuf;

/// Healprobe: synthesize locators and replay resilient resolution on DOM fixtures
#[derive(Parser, Debug)]
#[command(name = "healprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Synthesize a positioned locator for a fixture node
    Locate(LocateArgs),

    /// Resolve an identifier with retries and container fallbacks
    Resolve(ResolveArgs),

    /// Run every configured scenario and print the status panel
    Run(RunArgs),

    /// Print a pathological fixture as YAML
    Generate(GenerateArgs),
}

/// Arguments for the locate command
#[derive(Parser, Debug)]
pub struct LocateArgs {
    /// Fixture file (.yaml, .yml or .json)
    pub fixture: PathBuf,

    /// Key of the node to locate
    #[arg(short, long)]
    pub key: String,

    /// Selector for the innermost boundary host (e.g. "#host-1")
    #[arg(short, long)]
    pub boundary: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: LocateFormat,
}

/// Locate output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LocateFormat {
    /// The rendered locator string
    #[default]
    Text,
    /// Locator details as JSON
    Json,
}

impl From<LocateFormat> for crate::output::OutputFormat {
    fn from(format: LocateFormat) -> Self {
        match format {
            LocateFormat::Text => Self::Text,
            LocateFormat::Json => Self::Json,
        }
    }
}

/// Arguments for the resolve command
#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// Fixture file (.yaml, .yml or .json)
    pub fixture: PathBuf,

    /// Identifier to find
    #[arg(short, long)]
    pub id: String,

    /// Candidate container as kind:id (shadow, frame or subtree); repeatable
    #[arg(short, long = "container")]
    pub containers: Vec<CandidateContainer>,

    /// Maximum search passes (at least 1)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: Option<u32>,

    /// Delay between passes in milliseconds
    #[arg(long)]
    pub retry_interval: Option<u64>,

    /// Print the resolution trace
    #[arg(long)]
    pub trace: bool,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Fixture file (.yaml, .yml or .json)
    pub fixture: PathBuf,

    /// Run configuration (.yaml, .yml or .json)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Exit with an error if any scenario fails
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the generate command
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Layout to generate
    #[command(subcommand)]
    pub layout: GenerateLayout,
}

/// Pathological layouts
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum GenerateLayout {
    /// A file input nested under many anonymous divs
    Deep {
        /// Nesting depth
        #[arg(long, default_value = "50")]
        depth: usize,
        /// Id for the input; anonymous when absent
        #[arg(long)]
        id: Option<String>,
    },
    /// Many identical siblings, one of them keyed `target`
    Wide {
        /// Number of siblings
        #[arg(long, default_value = "200")]
        width: usize,
        /// 0-based index of the target
        #[arg(long, default_value = "137")]
        target: usize,
    },
    /// A file input inside a shadow root
    Shadow {
        /// Host id
        #[arg(long, default_value = "host-1")]
        host: String,
    },
    /// A file input inside an iframe document
    Iframe {
        /// Frame id
        #[arg(long, default_value = "frame-1")]
        frame: String,
        /// Make the frame cross-origin
        #[arg(long)]
        cross_origin: bool,
    },
}

/// Color argument
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
