//! Snapshelf CLI - capture the primary display and keep a short history.
//!
//! Provides both human-friendly and agent-friendly (robot mode) interfaces.
#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use console::style;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use snapshelf::app::{App, CaptureOutcome, REMEDIAL_PANEL_DELAY};
use snapshelf::cli::{self, Cli, Commands, PermissionAction};
use snapshelf::config::{self, Settings};
use snapshelf::error::{Result, SnapError};
use snapshelf::history::HistoryStore;
use snapshelf::logging::init_logging;
use snapshelf::output::{Output, OutputMode, SettingsReport};
use snapshelf::permission::{PermissionGate, SystemPermissions};

/// Build information embedded at compile time.
mod build_info {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    pub fn target() -> String {
        format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS)
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.use_json(), cli.verbose, cli.quiet);

    let out = OutputMode::from_cli(&cli).into_output();

    if let Err(e) = run(&cli, &out).await {
        out.error(&e);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli, out: &Arc<dyn Output>) -> Result<()> {
    match &cli.command {
        None => {
            print_quick_start(cli);
            Ok(())
        }
        Some(Commands::Capture(args)) => cmd_capture(cli, out.as_ref(), args).await,
        Some(Commands::Shell(args)) => cmd_shell(cli, out, args).await,
        Some(Commands::Permission(args)) => {
            cmd_permission(out.as_ref(), args.action);
            Ok(())
        }
        Some(Commands::Config(args)) => cmd_config(cli, out.as_ref(), args),
        Some(Commands::Version) => {
            out.version_info(build_info::VERSION, &build_info::target());
            Ok(())
        }
        Some(Commands::Completions(args)) => {
            cmd_completions(args);
            Ok(())
        }
    }
}

// === Quick Start (Robot Mode Optimized) ===

fn print_quick_start(cli: &Cli) {
    if cli.use_json() {
        print_robot_quick_start(cli);
    } else {
        print_human_quick_start();
    }
}

#[derive(Serialize)]
struct RobotQuickStart {
    tool: &'static str,
    version: &'static str,
    description: &'static str,
    capture: RobotCapture,
    shell: RobotShell,
    output_modes: OutputModes,
}

#[derive(Serialize)]
struct RobotCapture {
    quick_save: &'static str,
    to_file: &'static str,
    to_directory: &'static str,
    without_hardware: &'static str,
}

#[derive(Serialize)]
struct RobotShell {
    start: &'static str,
    commands: &'static [&'static str],
}

#[derive(Serialize)]
struct OutputModes {
    human: &'static str,
    robot: &'static str,
    compact: &'static str,
}

const SHELL_COMMANDS: &[&str] = &[
    "capture",
    "list",
    "save <N> <PATH>",
    "quick-save [N]",
    "folder <DIR>",
    "clear",
    "permission",
    "help",
    "quit",
];

fn print_robot_quick_start(cli: &Cli) {
    let help = RobotQuickStart {
        tool: "snap",
        version: build_info::VERSION,
        description: "Screenshot utility with a short in-memory history",
        capture: RobotCapture {
            quick_save: "snap capture --robot",
            to_file: "snap capture --out <PATH> --robot",
            to_directory: "snap capture --dir <DIR> --robot",
            without_hardware: "snap --backend mock capture --robot",
        },
        shell: RobotShell {
            start: "snap shell --robot",
            commands: SHELL_COMMANDS,
        },
        output_modes: OutputModes {
            human: "--format=text (default)",
            robot: "--robot or --format=json",
            compact: "--format=json-compact",
        },
    };

    let json = if cli.use_compact_json() {
        serde_json::to_string(&help)
    } else {
        serde_json::to_string_pretty(&help)
    };
    if let Ok(json) = json {
        println!("{json}");
    }
}

fn print_human_quick_start() {
    println!(
        "{} {} - screenshot utility\n",
        style("snap").bold().cyan(),
        build_info::VERSION
    );

    println!("{}", style("QUICK START").bold().underlined());
    println!();
    println!("  {}  Capture and quick-save", style("snap capture").green());
    println!("  {}  Capture to a file", style("snap capture -o shot.png").green());
    println!("  {}  Interactive history", style("snap shell").green());
    println!("  {}  Permission status", style("snap permission").green());
    println!();

    println!("{}", style("ROBOT MODE").bold().underlined());
    println!();
    println!("  {}  JSON output", style("snap --robot <command>").cyan());
    println!("  {}  No capture hardware", style("snap --backend mock <command>").cyan());
    println!();

    println!("Run {} for full help", style("snap --help").yellow());
}

// === Command Implementations ===

fn load_settings(cli: &Cli) -> Result<Settings> {
    config::load_settings(cli.config.as_deref())
}

fn build_app(cli: &Cli, settings: &Settings) -> Result<App<SystemPermissions>> {
    App::from_settings(SystemPermissions, settings, cli.backend)
}

async fn wait_for_remedial_flow() {
    // The privacy panel opens from a background task; let it run before exit.
    tokio::time::sleep(REMEDIAL_PANEL_DELAY * 2).await;
}

async fn cmd_capture(cli: &Cli, out: &dyn Output, args: &cli::CaptureArgs) -> Result<()> {
    let settings = load_settings(cli)?;
    let mut app = build_app(cli, &settings)?;

    let outcome = app.capture().await?;
    let CaptureOutcome::Captured(summary) = &outcome else {
        out.capture_outcome(&outcome);
        wait_for_remedial_flow().await;
        return Ok(());
    };

    let path = match (&args.out, &args.dir) {
        (Some(path), _) => app.save(0usize, path)?,
        (None, Some(dir)) => {
            app.choose_save_folder(dir.clone())?;
            app.quick_save(0usize)?
        }
        (None, None) => app.quick_save(0usize)?,
    };
    out.saved(summary, &path);
    Ok(())
}

fn cmd_permission(out: &dyn Output, action: PermissionAction) {
    let gate = PermissionGate::new(SystemPermissions);
    match action {
        PermissionAction::Status => out.permission_status(gate.is_permitted()),
        PermissionAction::Request => {
            gate.request_permission();
            out.success("Screen recording permission requested");
        }
        PermissionAction::Open => {
            gate.open_system_privacy_panel();
            out.success("Opening system privacy settings");
        }
    }
}

fn settings_source(cli: &Cli) -> Option<PathBuf> {
    cli.config
        .clone()
        .or_else(|| config::default_config_file().filter(|p| p.exists()))
}

fn cmd_config(cli: &Cli, out: &dyn Output, args: &cli::ConfigArgs) -> Result<()> {
    if args.path {
        let path = cli.config.clone().or_else(config::default_config_file);
        match path {
            Some(path) => out.info(&path.display().to_string()),
            None => out.warning("No configuration directory on this platform"),
        }
        return Ok(());
    }

    let settings = load_settings(cli)?;
    let save_directory = settings
        .save
        .directory
        .clone()
        .unwrap_or_else(config::default_save_directory);
    out.settings(&SettingsReport {
        source: settings_source(cli).map(|p| p.display().to_string()),
        settings: &settings,
        save_directory: save_directory.display().to_string(),
    });
    Ok(())
}

fn cmd_completions(args: &cli::CompletionsArgs) {
    use clap::CommandFactory;
    clap_complete::generate(args.shell, &mut Cli::command(), "snap", &mut std::io::stdout());
}

// === Shell ===

async fn cmd_shell(cli: &Cli, out: &Arc<dyn Output>, args: &cli::ShellArgs) -> Result<()> {
    let settings = load_settings(cli)?;
    let mut app = build_app(cli, &settings)?;
    if let Some(n) = args.history {
        app = app.with_history(HistoryStore::with_capacity(n));
    }

    // Renders every history change, independent of which command caused it.
    let mut rx = app.subscribe();
    let watcher_out = Arc::clone(out);
    let watcher = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let snapshot = rx.borrow_and_update().clone();
            debug!(revision = snapshot.revision, "History changed");
            watcher_out.history(&snapshot);
        }
    });

    if !cli.use_json() && !cli.quiet {
        println!(
            "snap shell ({}). Type {} for commands.",
            app.capturer_name(),
            style("help").green()
        );
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending_remedial = false;
    while let Some(line) = lines.next_line().await? {
        match shell_command(&mut app, out.as_ref(), &line).await {
            Ok(ShellStep::Continue) => {}
            Ok(ShellStep::PermissionRequested) => pending_remedial = true,
            Ok(ShellStep::Quit) => break,
            Err(e) => out.error(&e),
        }
    }

    if pending_remedial {
        wait_for_remedial_flow().await;
    }

    // Dropping the app closes the history channel and ends the watcher.
    drop(app);
    let _ = watcher.await;
    Ok(())
}

enum ShellStep {
    Continue,
    PermissionRequested,
    Quit,
}

fn parse_index(arg: Option<&str>) -> Result<usize> {
    match arg {
        None => Ok(0),
        Some(s) => s
            .parse()
            .map_err(|_| SnapError::Other(format!("'{s}' is not a history index"))),
    }
}

async fn shell_command(
    app: &mut App<SystemPermissions>,
    out: &dyn Output,
    line: &str,
) -> Result<ShellStep> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(ShellStep::Continue);
    };

    match command {
        "capture" | "c" => {
            let outcome = app.capture().await?;
            out.capture_outcome(&outcome);
            if matches!(outcome, CaptureOutcome::PermissionRequested) {
                return Ok(ShellStep::PermissionRequested);
            }
        }
        "list" | "ls" => out.history(&app.history().snapshot()),
        "save" => {
            let index = parse_index(words.next())?;
            let dest = words
                .next()
                .ok_or_else(|| SnapError::Other("usage: save <N> <PATH>".to_string()))?;
            let path = app.save(index, Path::new(dest))?;
            out.saved(&app.item(index)?.summary(), &path);
        }
        "quick-save" | "qs" => {
            let index = parse_index(words.next())?;
            let path = app.quick_save(index)?;
            out.saved(&app.item(index)?.summary(), &path);
        }
        "folder" => {
            let dir = words
                .next()
                .ok_or_else(|| SnapError::Other("usage: folder <DIR>".to_string()))?;
            let dir = config::expand_home(Path::new(dir))?.unwrap_or_else(|| PathBuf::from(dir));
            app.choose_save_folder(dir.clone())?;
            out.success(&format!("Save folder set to {}", dir.display()));
        }
        "clear" => {
            app.clear_history();
            out.success("History cleared");
        }
        "permission" => out.permission_status(app.gate().is_permitted()),
        "help" | "?" => out.info(&format!("Commands: {}", SHELL_COMMANDS.join(", "))),
        "quit" | "exit" | "q" => return Ok(ShellStep::Quit),
        other => {
            return Err(SnapError::Other(format!(
                "Unknown command '{other}' (type help)"
            )));
        }
    }
    Ok(ShellStep::Continue)
}
