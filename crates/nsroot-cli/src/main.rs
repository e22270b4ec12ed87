//! nsroot CLI - run an executable inside a private root with fresh namespaces

use clap::Parser;
use nsroot_core::{SandboxConfig, SandboxPlan, Supervisor};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nsroot")]
#[command(
    author,
    version,
    about = "chroot into a directory with new IPC, PID, UTS and mount namespaces"
)]
struct Cli {
    /// Directory that becomes the new root
    root: OsString,

    /// Executable to start inside the root, run without arguments
    executable: PathBuf,

    /// Mount table scanned for mounts to remove
    #[arg(
        long,
        env = "NSROOT_MOUNT_TABLE",
        default_value = nsroot_core::config::DEFAULT_MOUNT_TABLE
    )]
    mount_table: PathBuf,

    /// Print the plan as JSON instead of running anything
    #[arg(long)]
    dry_run: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match SandboxConfig::builder()
        .root(cli.root)
        .target(cli.executable)
        .mount_table(cli.mount_table)
        .build()
    {
        Ok(config) => config,
        Err(e) => {
            eprintln!("nsroot: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.dry_run {
        return print_plan(&config);
    }

    tracing::debug!(root = ?config.root.as_path(), target = ?config.target, "starting sandbox");
    match Supervisor::new(config).run() {
        Ok(termination) => termination.reflect(),
        Err(failure) => {
            eprintln!("{failure}");
            ExitCode::FAILURE
        }
    }
}

fn print_plan(config: &SandboxConfig) -> ExitCode {
    let rendered = SandboxPlan::build(config)
        .map_err(|e| e.to_string())
        .and_then(|plan| serde_json::to_string_pretty(&plan).map_err(|e| e.to_string()));

    match rendered {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("nsroot: {e}");
            ExitCode::FAILURE
        }
    }
}
