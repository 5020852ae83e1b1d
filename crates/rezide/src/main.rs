//! rezide command line entry point.
//!
//! Parses arguments, initialises logging, locates the layout file, and hands
//! off to the matching use case.
//!
//! ```text
//! main()
//!  └─ Cli::parse()
//!  └─ init_tracing(-v count)
//!  └─ run()
//!       ├─ open <LAYOUT>   -> build_and_spawn against SwayClient
//!       │   └─ --dry-run   -> build_and_spawn against RecordingWindowManager
//!       ├─ list [--all]    -> list_layouts
//!       ├─ check           -> check_layouts
//!       └─ windows         -> SwayClient::workspace_windows
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use rezide::application::list_layouts::{check_layouts, list_layouts};
use rezide::application::spawn_layout::build_and_spawn;
use rezide::infrastructure::storage::config::{ConfigLocations, ConfigSource, TomlConfigFile};
use rezide::infrastructure::window_manager::recording::RecordingWindowManager;
use rezide::infrastructure::window_manager::sway::{SwayClient, SwayConfig};
use rezide_core::LayoutSet;

#[derive(Debug, Parser)]
#[command(name = "rezide", version, about = "Open declarative window layouts on sway or i3")]
struct Cli {
    /// Increase log output (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Layout file to read instead of the default locations.
    #[arg(short, long, env = "REZIDE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Base directory for user config files.
    #[arg(long, env = "XDG_CONFIG_HOME", global = true, hide_env_values = true)]
    xdg_config_home_dir: Option<PathBuf>,

    /// Home directory, used for the fallback config locations.
    #[arg(long, env = "HOME", global = true, hide_env_values = true)]
    user_home_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Open a layout on the focused workspace.
    Open {
        /// Name of the layout entry.
        layout: String,
        /// Print the operations instead of applying them.
        #[arg(long)]
        dry_run: bool,
        #[command(flatten)]
        window_manager: WindowManagerArgs,
    },
    /// List the layouts that can be opened.
    List {
        /// Include every section, not only entries marked `is_layout`.
        #[arg(long)]
        all: bool,
        /// Also print the windows of each layout.
        #[arg(short, long)]
        long: bool,
    },
    /// Validate the layout file.
    Check,
    /// Show the windows of the focused workspace with their marks and sizes.
    Windows {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        window_manager: WindowManagerArgs,
    },
}

#[derive(Debug, Args)]
struct WindowManagerArgs {
    /// IPC socket of the window manager (falls back to I3SOCK).
    #[arg(long, env = "SWAYSOCK")]
    socket: Option<PathBuf>,

    /// Milliseconds to wait for each new window to appear.
    #[arg(long, env = "REZIDE_WINDOW_TIMEOUT_MS", default_value_t = 10_000)]
    window_timeout_ms: u64,
}

impl WindowManagerArgs {
    fn connect(self) -> anyhow::Result<SwayClient> {
        let config = SwayConfig::resolve(self.socket, Duration::from_millis(self.window_timeout_ms))?;
        SwayClient::connect(config).context("could not reach the window manager")
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Maps the `-v` count to a default filter directive.
fn default_log_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

fn init_tracing(verbosity: u8) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_log_level(verbosity))),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let locations = ConfigLocations {
        explicit: cli.config,
        xdg_config_home: cli.xdg_config_home_dir,
        home: cli.user_home_dir,
    };

    match cli.command {
        Commands::Open {
            layout,
            dry_run,
            window_manager,
        } => {
            let set = load_layouts(&locations)?;
            if dry_run {
                let mut recorder = RecordingWindowManager::new();
                build_and_spawn(&set, &layout, &mut recorder)
                    .with_context(|| format!("could not plan layout \"{layout}\""))?;
                for call in recorder.mutating_calls() {
                    println!("{call}");
                }
            } else {
                let mut client = window_manager.connect()?;
                let report = build_and_spawn(&set, &layout, &mut client)
                    .with_context(|| format!("could not open layout \"{layout}\""))?;
                info!("opened {} windows", report.windows_created);
            }
        }
        Commands::List { all, long } => {
            let set = load_layouts(&locations)?;
            for layout in list_layouts(&set, all).context("layout file is invalid")? {
                if long {
                    println!("{}\t{}", layout.name, layout.marks.join(", "));
                } else {
                    println!("{}", layout.name);
                }
            }
        }
        Commands::Check => {
            let set = load_layouts(&locations)?;
            let summary = check_layouts(&set).context("layout file is invalid")?;
            println!(
                "ok: {} entries, {} layouts",
                summary.entries, summary.layouts
            );
        }
        Commands::Windows {
            json,
            window_manager,
        } => {
            let mut client = window_manager.connect()?;
            let windows = client
                .workspace_windows()
                .context("could not list workspace windows")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&windows)?);
            } else {
                for w in windows {
                    println!(
                        "{}\t{}x{}\t{}%x{}%\t[{}]\t{}",
                        w.id,
                        w.rect.width,
                        w.rect.height,
                        w.width_percent,
                        w.height_percent,
                        w.marks.join(", "),
                        w.name.as_deref().unwrap_or("")
                    );
                }
            }
        }
    }
    Ok(())
}

fn load_layouts(locations: &ConfigLocations) -> anyhow::Result<LayoutSet> {
    let file = TomlConfigFile::locate(locations)?;
    info!("using layouts from {}", file.path().display());
    file.read()
        .with_context(|| format!("could not load {}", file.path().display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_log_level_follows_verbosity() {
        assert_eq!(default_log_level(0), "warn");
        assert_eq!(default_log_level(1), "info");
        assert_eq!(default_log_level(2), "debug");
        assert_eq!(default_log_level(7), "debug");
    }

    #[test]
    fn test_cli_parses_open_with_dry_run() {
        let cli = Cli::try_parse_from(["rezide", "-vv", "open", "ide", "--dry-run"]).unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Open {
                layout, dry_run, ..
            } => {
                assert_eq!(layout, "ide");
                assert!(dry_run);
            }
            other => panic!("expected open, got {other:?}"),
        }
    }
}
