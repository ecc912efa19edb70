// clientbook entry point.
//
// Startup sequence:
// 1. Parse arguments
// 2. Load config (seeding config/ from defaults/ when needed)
// 3. Initialize tracing (log to file, stdout is for command output)
// 4. Open the database and run one registry command

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use clientbook_core::{config, db};
use tracing::{error, info};

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "clientbook",
    version,
    about = "Keep client records (name, email, phone numbers) in a SQLite database"
)]
struct Cli {
    /// Directory containing config/ and defaults/
    #[arg(long, global = true, default_value = ".")]
    config: PathBuf,

    /// Database file, overriding database.path from the config
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the personal_information and phone_number tables if absent
    Init,
    /// Drop both tables (fails if they do not exist)
    Drop,
    /// Add a client, optionally with phone numbers
    Add(AddArgs),
    /// Attach a phone number to an existing client
    AddPhone { client_id: i64, phone: i64 },
    /// Change a client's name, email or one of their phone numbers
    Update(UpdateArgs),
    /// Remove one phone number from a client
    DeletePhone { client_id: i64, phone: i64 },
    /// Remove a client together with all their phone numbers
    Delete { client_id: i64 },
    /// Show one client and their phone numbers
    Show {
        client_id: i64,
        #[arg(long)]
        json: bool,
    },
    /// Find clients matching ANY of the given fields
    Find(FindArgs),
    /// List every client
    List {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct AddArgs {
    first_name: String,
    last_name: String,
    email: String,
    /// Comma-separated phone numbers, e.g. "89148479011, 89140097011"
    #[arg(long)]
    phones: Option<String>,
}

#[derive(Args, Debug)]
struct UpdateArgs {
    client_id: i64,
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    /// Phone number to replace; required together with --new-phone
    #[arg(long)]
    previous_phone: Option<i64>,
    #[arg(long)]
    new_phone: Option<i64>,
}

#[derive(Args, Debug)]
struct FindArgs {
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<i64>,
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = config::load_config(&cli.config).context("failed to load configuration")?;
    if let Some(path) = &cli.db {
        config.database.path = path.clone();
    }

    init_tracing(&cli.config, &config.logging.filter)?;
    info!("clientbook starting: {:?}", cli.command);

    if let Some(parent) = config.database.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    let mut conn = db::open(&config.database.path)
        .with_context(|| format!("failed to open database at {}", config.database.path.display()))?;
    info!("Database opened at {}", config.database.path.display());

    let result = commands::run(&mut conn, cli.command);
    if let Err(e) = &result {
        error!("command failed: {e:#}");
    }
    result
}

/// Initialize tracing to log to `logs/clientbook.log` under `base_dir`.
/// `RUST_LOG` wins over the configured filter.
fn init_tracing(base_dir: &std::path::Path, filter: &str) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = base_dir.join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("clientbook.log"))
        .context("failed to open log file")?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
