use clap::{Parser, Subcommand};
use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

mod config;
mod init;
mod output;
mod source;
mod status;
mod store;
mod sync;
mod telemetry;
mod update;

#[derive(Parser)]
#[command(name = "bfeeds", about = "Content-blocking feed updater")]
struct Cli {
    #[arg(global = true, short, long)]
    dsn: Option<String>,
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or migrate the database schema
    Init,
    /// Check every feed for a new revision and optionally apply it
    Update(update::UpdateCmd),
    /// Show stored revision tags and local store health
    Status(status::StatusCmd),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);

    // initialize logging/tracing (stderr). Respect RUST_LOG and BFEEDS_LOG_FORMAT
    telemetry::config::init_tracing();
    let dsn = cli
        .dsn
        .or_else(|| env::var("DATABASE_URL").ok())
        .context("Please provide --dsn or set DATABASE_URL in .env")?;

    match cli.command {
        Commands::Init => init::run(&dsn).await?,
        Commands::Update(args) => {
            let pool = init::connect(&dsn).await?;
            update::run(&pool, args).await?
        }
        Commands::Status(args) => {
            let pool = init::connect(&dsn).await?;
            status::run(&pool, args).await?
        }
    }

    Ok(())
}
