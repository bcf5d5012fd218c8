//! twoot-sync - sync Mastodon to Twitter and then forget about it forever

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::debug;

use libtwoot::lock::RunLock;
use libtwoot::{Profile, Result, Syncer};

#[derive(Parser, Debug)]
#[command(name = "twoot-sync")]
#[command(version)]
#[command(about = "Sync Mastodon to Twitter and then forget about it forever", long_about = None)]
struct Cli {
    /// Show debug messages
    #[arg(short, long)]
    debug: bool,

    /// Show less messages
    #[arg(short, long)]
    quiet: bool,

    /// Output messages to FILE instead of stderr
    #[arg(short, long, value_name = "FILE")]
    log: Option<PathBuf>,

    /// Show what would have been transferred
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Use profile NAME
    #[arg(short, long, value_name = "NAME", default_value = "default")]
    profile: String,

    /// Execute setup mode (verify accounts and seed markers only)
    #[arg(short, long)]
    setup: bool,

    /// Update markers (only effective with --dry-run)
    #[arg(short, long)]
    update: bool,
}

fn init_logging(cli: &Cli) {
    let level = if cli.debug {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    match &cli.log {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .unwrap_or_else(|e| {
                    eprintln!("Error: cannot open log file {}: {}", path.display(), e);
                    std::process::exit(1);
                });

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    // make sure to be a singleton; an overlapping scheduler tick is a no-op
    let lock_path = libtwoot::config::resolve_data_dir()?.join("lockfile.lock");
    let _lock = match RunLock::acquire(&lock_path)? {
        Some(lock) => lock,
        None => {
            debug!("process already exists");
            return Ok(());
        }
    };

    let profile = Profile::load(&cli.profile)?;
    let mut syncer = Syncer::new(&cli.profile, profile)?;
    syncer.run(cli.dry_run, cli.update, cli.setup).await?;

    Ok(())
}
