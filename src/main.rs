//! CLI entry point for gitpost-rs

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gitpost_rs::config::SiteConfig;
use gitpost_rs::Site;

#[derive(Parser)]
#[command(name = "gitpost-rs")]
#[command(author = "Yukang Chen")]
#[command(version = "0.1.0")]
#[command(about = "Serve Markdown posts from a GitHub repository", long_about = None)]
struct Cli {
    /// Configuration file (optional; environment variables fill the gaps)
    #[arg(short, long, global = true, default_value = "gitpost.yml")]
    config: PathBuf,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    #[command(alias = "s")]
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// IP address to bind to
        #[arg(short, long)]
        ip: Option<String>,
    },

    /// Fetch the repository and list its content
    List {
        /// Type of content to list (post, tag)
        #[arg(default_value = "post")]
        r#type: String,
    },

    /// Fetch the repository and search its posts
    Search {
        /// Search terms; every term must match
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Display version information
    Version,
}

fn load_config(path: &Path) -> Result<SiteConfig> {
    let mut config = if path.exists() {
        SiteConfig::load(path)?
    } else {
        tracing::debug!("No config file at {:?}, using defaults", path);
        SiteConfig::default()
    };
    config.apply_env();
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "gitpost_rs=debug,info"
    } else {
        "gitpost_rs=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Serve { port, ip } => {
            let site = Site::new(load_config(&cli.config)?)?;
            let ip = ip.unwrap_or_else(|| site.config.server.ip.clone());
            let port = port.unwrap_or(site.config.server.port);

            // Serve an empty cache rather than refusing to start
            tracing::info!("Loading posts...");
            if let Err(e) = site.refresh().await {
                tracing::error!("Initial refresh failed: {}", e);
            }

            tracing::info!("Starting server at http://{}:{}", ip, port);
            gitpost_rs::server::start(site, &ip, port).await?;
        }

        Commands::List { r#type } => {
            let site = Site::new(load_config(&cli.config)?)?;
            site.refresh().await?;
            gitpost_rs::commands::list::run(&site, &r#type)?;
        }

        Commands::Search { query } => {
            let site = Site::new(load_config(&cli.config)?)?;
            site.refresh().await?;
            gitpost_rs::commands::search::run(&site, &query.join(" "))?;
        }

        Commands::Version => {
            println!("gitpost-rs version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
