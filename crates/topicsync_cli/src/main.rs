//! Topicsync CLI - drives question/topic sync from the command line.

mod commands;
mod config;
mod progress;
mod shutdown;

use clap::{Parser, Subcommand};
use console::Term;
use tracing_subscriber::EnvFilter;

use crate::commands::sync::SyncArgs;

#[derive(Parser)]
#[command(name = "topicsync")]
#[command(version)]
#[command(about = "Keep exam questions and their Discourse topics in step")]
#[command(
    long_about = "Topicsync creates one Discourse topic per exam question, in small \
resumable batches, and records each topic URL back on the question. It can also \
serve the sync action over HTTP and accept Discourse webhooks that copy edited \
explanations back into the question bank."
)]
#[command(after_long_help = r#"EXAMPLES
    Preview what a sync would do:
        $ topicsync dry-run

    Create topics for the next 50 technician questions:
        $ topicsync sync --license technician

    Keep calling until every question has a topic:
        $ topicsync sync --until-complete --batch-size 100

    Serve the sync endpoint and webhook:
        $ topicsync serve --bind 0.0.0.0:8787

CONFIGURATION
    Topicsync reads configuration from:
      1. ~/.config/topicsync/config.toml (or $XDG_CONFIG_HOME/topicsync/config.toml)
      2. ./topicsync.toml
      3. Environment variables (TOPICSYNC_* prefix, `__` between section and key)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    TOPICSYNC_DATABASE__URL            Database connection string (default: ~/.local/state/topicsync/topicsync.db)
    DISCOURSE_URL                      Forum base URL
    DISCOURSE_API_KEY                  Forum API key
    DISCOURSE_API_USERNAME             User the API key acts as (default: system)
    DISCOURSE_WEBHOOK_SECRET           Secret shared with the Discourse webhook
    TOPICSYNC_SERVER__SERVICE_TOKEN    Bearer token required by POST /sync
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
    /// Create topics for the next batch of questions
    Sync {
        #[command(flatten)]
        args: SyncArgs,

        /// Keep running batches until nothing is left (Ctrl+C stops after the current batch)
        #[arg(short = 'u', long)]
        until_complete: bool,
    },
    /// Show what a sync would do without changing anything
    DryRun {
        #[command(flatten)]
        args: SyncArgs,
    },
    /// Serve POST /sync and POST /webhook
    Serve {
        /// Address to listen on (default from config or 127.0.0.1:8787)
        #[arg(short = 'B', long)]
        bind: Option<String>,
    },
}

#[derive(Subcommand)]
enum MigrateAction {
    /// Apply all pending migrations
    Up,
    /// Rollback the last migration
    Down,
    /// Show migration status
    Status,
    /// Fresh install - drop all tables and reapply migrations
    Fresh,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Progress bars own the terminal for sync runs; everything else logs.
    let draws_bars = Term::stdout().is_term()
        && matches!(
            &cli.command,
            Commands::Sync { args, .. } | Commands::DryRun { args } if !args.json
        );
    if !draws_bars {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("topicsync=info,topicsync_cli=info,tower_http=info"),
        };

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    // Load configuration (config files -> env vars -> defaults)
    let config = config::Config::load();

    let database_url = config
        .database_url()
        .ok_or("Could not determine a database URL. Set TOPICSYNC_DATABASE__URL")?;

    // Ensure the database directory exists for SQLite
    if database_url.starts_with("sqlite://") {
        let db_path = database_url.trim_start_matches("sqlite://");
        // Strip query parameters (e.g., ?mode=rwc) before path operations
        let db_path = db_path.split('?').next().unwrap_or(db_path);
        let db_path = std::path::Path::new(db_path);

        if db_path.is_relative() && !db_path.as_os_str().is_empty() {
            tracing::warn!(
                "Database path '{}' is relative - behavior depends on current directory. \
                 Consider using an absolute path.",
                db_path.display()
            );
        }

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
    }

    match cli.command {
        Commands::Migrate { action } => {
            commands::migrate::handle_migrate(action, &database_url).await?;
        }
        Commands::Sync {
            args,
            until_complete,
        } => {
            shutdown::setup_shutdown_handler();
            commands::sync::handle_sync(args, until_complete, &config, &database_url).await?;
        }
        Commands::DryRun { args } => {
            commands::sync::handle_dry_run(args, &config, &database_url).await?;
        }
        Commands::Serve { bind } => {
            commands::serve::handle_serve(bind, &config, &database_url).await?;
        }
    }

    Ok(())
}
