use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use axum::body::Body;
use axum::http::Request;
use clap::{Parser, Subcommand};
use tower::ServiceExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tubelens::api::ApiServer;
use tubelens::config::Config;

#[derive(Parser)]
#[command(
    name = "tubelens",
    version,
    about = "YouTube channel, video and trending analytics with comment sentiment and toxicity",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file (defaults to environment variables)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json)
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Address to bind, e.g. 0.0.0.0:8000
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },

    /// Analyze a channel and print the result
    Channel {
        /// Channel ID, @handle or username
        id: String,

        /// Number of recent videos to analyze
        #[arg(short, long, default_value = "50")]
        max_videos: u32,
    },

    /// Analyze a video and its comments and print the result
    Video {
        /// Video ID
        id: String,

        /// Number of comments to analyze
        #[arg(short, long, default_value = "500")]
        max_comments: u32,
    },

    /// Fetch and analyze trending videos for a region
    Trending {
        /// Two-letter country code
        #[arg(long, default_value = "US")]
        country: String,

        /// Category ID filter
        #[arg(long)]
        category: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(&cli.log_format, cli.verbose)?;

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { bind } => {
            tracing::info!(bind = ?bind, "Starting serve command");
            serve(config, bind).await?;
        }

        Commands::Channel { id, max_videos } => {
            tracing::info!(channel_id = %id, max_videos, "Starting channel command");
            let uri = format!("/api/channel/{id}?max_videos={max_videos}");
            print_analysis(config, &uri).await?;
        }

        Commands::Video { id, max_comments } => {
            tracing::info!(video_id = %id, max_comments, "Starting video command");
            let uri = format!("/api/video/{id}?max_comments={max_comments}");
            print_analysis(config, &uri).await?;
        }

        Commands::Trending { country, category } => {
            tracing::info!(country = %country, category = ?category, "Starting trending command");
            let mut uri = format!("/api/trending?country={country}");
            if let Some(category) = category {
                uri.push_str(&format!("&category_id={category}"));
            }
            print_analysis(config, &uri).await?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn setup_tracing(format: &str, verbose: bool) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            tracing_subscriber::EnvFilter::new("tubelens=debug,tower_http=debug,info")
        } else {
            tracing_subscriber::EnvFilter::new("tubelens=info,warn")
        }
    });

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()?;
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()?;
        }
    }

    Ok(())
}

async fn serve(mut config: Config, bind: Option<SocketAddr>) -> Result<()> {
    if let Some(addr) = bind {
        config.server.bind_address = addr;
    }

    let server = ApiServer::new(config)?;
    server
        .start_with_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Shutdown signal received");
                }
                Err(e) => {
                    tracing::error!("Failed to wait for Ctrl+C: {}", e);
                }
            }
        })
        .await?;

    Ok(())
}

/// Run one request through the router in-process and print the JSON body
async fn print_analysis(config: Config, uri: &str) -> Result<()> {
    let server = ApiServer::new(config)?;
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .context("Failed to build request")?;

    let response = server.build_router().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .context("Failed to read response body")?;
    let body: serde_json::Value =
        serde_json::from_slice(&bytes).context("Response was not JSON")?;

    if !status.is_success() {
        let message = body
            .get("error")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("request failed");
        bail!("{} ({})", message, status);
    }

    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
