//! Reel CLI - Headless watch client
//!
//! Features:
//! - Full watch sessions against the playback API with a simulated player clock
//! - Quality catalog lookup
//! - Resume position lookup

use clap::{Args, Parser, Subcommand};
use reel_core::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

/// Reel CLI - Playback API client
#[derive(Parser)]
#[command(name = "reel")]
#[command(author = "Purple Squirrel Media")]
#[command(version)]
#[command(about = "Headless watch client for the Reel playback API", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text", global = true)]
    format: String,

    #[command(flatten)]
    api: ApiArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Connection settings; flags and environment override the config file
#[derive(Args)]
struct ApiArgs {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Base URL of the playback API
    #[arg(long, env = "REEL_API_URL", global = true)]
    api: Option<String>,

    /// Account access token
    #[arg(long, env = "REEL_ACCESS_TOKEN", hide_env_values = true, global = true)]
    access_token: Option<String>,

    /// Progress report period in milliseconds
    #[arg(long, global = true)]
    interval_ms: Option<u64>,

    /// Deadline for token and manifest calls in milliseconds (0 = none)
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,
}

impl ApiArgs {
    fn load(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)?,
            None => Config::default(),
        };

        if let Some(api) = &self.api {
            config.api.base_url = api.clone();
        }
        if let Some(token) = &self.access_token {
            config.api.access_token = Some(token.clone());
        }
        if let Some(interval) = self.interval_ms {
            config.playback.progress_interval_ms = interval;
        }
        if let Some(timeout) = self.timeout_ms {
            config.playback.request_timeout_ms = timeout;
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Watch a content item with a simulated player
    Watch {
        /// Content identifier
        #[arg(long)]
        content: String,

        /// Viewer profile identifier
        #[arg(long)]
        profile: Option<String>,

        /// Stop after this many seconds of playback (0 = until the end)
        #[arg(long, default_value = "0")]
        play_seconds: u64,

        /// Simulated playback speed (content seconds per wall-clock second)
        #[arg(long, default_value = "1.0")]
        speed: f64,

        /// Switch to this quality once the catalog is loaded
        #[arg(long)]
        quality: Option<String>,
    },

    /// List available qualities for a content item
    Qualities {
        /// Content identifier
        #[arg(long)]
        content: String,
    },

    /// Show the stored resume position
    Resume {
        /// Content identifier
        #[arg(long)]
        content: String,

        /// Viewer profile identifier
        #[arg(long)]
        profile: String,
    },
}

// Reporter teardown is exact only on a current-thread runtime
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    reel_core::init();
    let config = cli.api.load()?;

    match cli.command {
        Commands::Watch {
            content,
            profile,
            play_seconds,
            speed,
            quality,
        } => {
            let options = commands::WatchOptions {
                content,
                profile,
                play_seconds,
                speed,
                quality,
            };
            commands::watch(&config, options, &cli.format).await?;
        }
        Commands::Qualities { content } => {
            commands::qualities(&config, &content, &cli.format).await?;
        }
        Commands::Resume { content, profile } => {
            commands::resume(&config, &content, &profile, &cli.format).await?;
        }
    }

    Ok(())
}
