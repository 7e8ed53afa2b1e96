//! keepalived — the keepalive daemon.
//!
//! Single binary that assembles the pinger:
//! - Status ledger (in memory)
//! - Monitor (one job per target + self-ping)
//! - HTTP surface (`/healthz`, `/status`, dashboard)
//!
//! # Usage
//!
//! ```text
//! keepalived serve --config keepalive.toml --port 7860
//! keepalived check --config keepalive.toml
//! ```

mod serve;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use keepalive_config::KeepaliveConfig;

#[derive(Parser)]
#[command(name = "keepalived", about = "Keep-alive pinger with automatic restart")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the scheduler and serve the status endpoints.
    Serve {
        /// Path to the roster and settings file.
        #[arg(long, short, default_value = "keepalive.toml")]
        config: PathBuf,

        /// Port to listen on (overrides `[server].port`).
        #[arg(long, env = "PORT")]
        port: Option<u16>,
    },
    /// Validate the config file and print the roster.
    Check {
        #[arg(long, short, default_value = "keepalive.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match cli.command {
        Command::Serve { config, port } => serve::run_serve(&config, port).await,
        Command::Check { config } => check(&config),
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn check(path: &Path) -> anyhow::Result<()> {
    let settings = KeepaliveConfig::from_file(path)?.resolve()?;

    println!("config ok: {}", path.display());
    println!("port: {}", settings.port);
    println!(
        "restart: {}",
        if settings.restart.token.is_some() {
            "enabled"
        } else {
            "disabled (no token)"
        }
    );
    for target in &settings.targets {
        println!(
            "  {:<60} every {:>6}s{}",
            target.url,
            target.interval.as_secs(),
            target
                .restartable_id
                .as_deref()
                .map(|id| format!("  auto-restart: {id}"))
                .unwrap_or_default()
        );
    }
    Ok(())
}
