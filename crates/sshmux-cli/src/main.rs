use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use sshmux_core::Config;
use sshmux_engine::{
    ConnectionOrchestrator, ConnectionResult, Multiplexer, SessionInventory, TmuxGateway,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sshmux")]
#[command(about = "Persistent SSH sessions in tmux", long_about = None)]
struct Cli {
    /// Config file path (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to a configured server in its own session
    Connect { server: String },
    /// Open one session with a window per server in a profile
    Group { profile: String },
    /// List live sessions
    List,
    /// Kill a session by name
    Kill { session: String },
    /// Show configured servers
    Servers,
}

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load config")?;

    let gateway = TmuxGateway::new();

    match cli.command {
        Commands::Connect { server } => {
            let record = config.server(&server)?.clone();
            let result = ConnectionOrchestrator::new(&gateway)
                .connect_to_server(&record)
                .with_context(|| format!("Failed to connect to '{server}'"))?;
            report(&result);
            attach_or_hint(&gateway, &result.session_name);
        }
        Commands::Group { profile } => {
            let servers = config.resolve_profile(&profile)?;
            let result = ConnectionOrchestrator::new(&gateway)
                .connect_to_profile(&profile, &servers)
                .with_context(|| format!("Failed to open profile '{profile}'"))?;
            report(&result);
            attach_or_hint(&gateway, &result.session_name);
        }
        Commands::List => {
            let sessions = SessionInventory::new(&gateway)
                .detailed()
                .context("Failed to list sessions")?;
            if sessions.is_empty() {
                println!("No live sessions");
            }
            for info in sessions {
                let state = if info.attached { "attached" } else { "detached" };
                let activity = info
                    .last_activity
                    .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
                    .map(|dt| format!("  last activity {}", dt.format("%Y-%m-%d %H:%M")))
                    .unwrap_or_default();
                println!(
                    "{}  {} window{}  {}{}",
                    info.name,
                    info.windows,
                    if info.windows == 1 { "" } else { "s" },
                    state,
                    activity
                );
            }
        }
        Commands::Kill { session } => {
            gateway
                .kill_session(&session)
                .with_context(|| format!("Failed to kill session '{session}'"))?;
            println!("Killed session '{session}'");
        }
        Commands::Servers => {
            if config.servers.is_empty() {
                println!("No servers configured");
            }
            for s in &config.servers {
                println!("{}  {}@{}:{}  auth:{}", s.name, s.username, s.hostname, s.port, s.auth);
            }
        }
    }

    Ok(())
}

fn report(result: &ConnectionResult) {
    if result.was_existing {
        println!("Reattaching to existing session '{}'", result.session_name);
    } else {
        println!("Created session '{}'", result.session_name);
    }
}

/// Attach failure is benign: with no controlling terminal (scripts, CI)
/// the session is still up and populated, so print the manual command
/// and exit zero.
fn attach_or_hint<M: Multiplexer>(mux: &M, session: &str) {
    if let Err(err) = mux.attach(session) {
        tracing::debug!(%err, "attach failed, falling back to hint");
        println!("Could not attach automatically; run: tmux attach -t {session}");
    }
}
