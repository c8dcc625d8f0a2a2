//! CLI argument definitions.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::BackendKind;

/// Snapshelf - capture the primary display and keep a short history of shots.
///
/// Robot Mode: Use --robot or --format=json for machine-parseable output.
#[derive(Parser, Debug)]
#[command(name = "snap", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (text for humans, json for agents/scripts)
    #[arg(
        long,
        short = 'f',
        default_value = "text",
        global = true,
        env = "SNAPSHELF_FORMAT"
    )]
    pub format: OutputFormat,

    /// Robot mode: equivalent to --format=json
    #[arg(long, global = true)]
    pub robot: bool,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Settings file (default: <config dir>/snapshelf/config.toml)
    #[arg(long, global = true, env = "SNAPSHELF_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Capture backend, overriding the settings file
    #[arg(long, short = 'b', global = true, env = "SNAPSHELF_BACKEND")]
    pub backend: Option<BackendKind>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output format selection.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with optional color
    #[default]
    Text,
    /// JSON output for scripts and agents
    Json,
    /// Compact JSON (single line)
    JsonCompact,
}

impl Cli {
    /// Returns true if output should be JSON (robot mode or explicit --format=json).
    pub const fn use_json(&self) -> bool {
        self.robot || matches!(self.format, OutputFormat::Json | OutputFormat::JsonCompact)
    }

    /// Returns true if output should be compact JSON.
    pub const fn use_compact_json(&self) -> bool {
        matches!(self.format, OutputFormat::JsonCompact)
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    // === Capture ===
    /// Capture the primary display and save it
    Capture(CaptureArgs),

    /// Interactive session with a screenshot history
    Shell(ShellArgs),

    // === System ===
    /// Check or request screen recording permission
    Permission(PermissionArgs),

    /// Show effective settings
    Config(ConfigArgs),

    // === Utilities ===
    /// Show version information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// === Argument Structs ===

#[derive(Parser, Debug)]
pub struct CaptureArgs {
    /// Write the screenshot to this file (".png" added when missing)
    #[arg(long, short = 'o', value_name = "PATH", conflicts_with = "dir")]
    pub out: Option<PathBuf>,

    /// Save under the default file name in this directory
    #[arg(long, short = 'd', value_name = "DIR")]
    pub dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct ShellArgs {
    /// History size (default 10)
    #[arg(long, value_name = "N", hide = true)]
    pub history: Option<usize>,
}

#[derive(Parser, Debug)]
pub struct PermissionArgs {
    #[arg(value_enum, default_value = "status")]
    pub action: PermissionAction,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum PermissionAction {
    /// Report whether capture is permitted
    #[default]
    Status,
    /// Ask the OS to prompt for permission
    Request,
    /// Open the system privacy settings
    Open,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Show configuration file path only
    #[arg(long)]
    pub path: bool,
}

#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
