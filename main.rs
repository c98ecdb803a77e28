// Share-node command line client

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use sharenode_client::prelude::*;
use sharenode_client::{APP_NAME, VERSION};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use url::Url;

#[derive(Parser)]
#[command(name = "sharenode")]
#[command(about = "Client for a directory-backed P2P file-sharing node")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Peer API base URL
    #[arg(long)]
    api_url: Option<String>,

    /// Directory service base URL
    #[arg(long)]
    directory_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Print snapshots as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show peer identity and statistics
    Status,

    /// List files shared by this peer
    Files,

    /// Search the directory
    Search {
        /// Text to match; empty matches everything
        #[arg(default_value = "")]
        query: String,

        /// Category filter (document, image, video, audio, archive, other, all)
        #[arg(short, long, default_value = "all")]
        category: String,

        #[arg(short, long, value_enum)]
        sort: Option<SortOrder>,

        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Share a local file
    Share {
        path: PathBuf,
    },

    /// Stop sharing a file
    Unshare {
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Open the download redirect for a file
    Download {
        id: String,
    },

    /// Print a shareable download link
    Link {
        id: String,
    },

    /// Show everything known about a file
    Info {
        id: String,

        /// Look the id up in directory search results instead of local files
        #[arg(long)]
        network: bool,
    },

    /// Keep refreshing and print changes until Ctrl-C
    Watch,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Prints download URLs instead of launching a browser
struct StdoutNavigator;

impl Navigator for StdoutNavigator {
    fn open(&self, url: &Url) -> sharenode_client::Result<()> {
        println!("{}", url);
        Ok(())
    }
}

struct StdinConfirmation {
    assume_yes: bool,
}

impl Confirmation for StdinConfirmation {
    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        print!("{} [y/N] ", prompt);
        if std::io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match std::io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}

fn setup_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn load_config(args: &Args) -> Result<ClientConfig> {
    let mut config = match &args.config {
        Some(path) => ClientConfig::load_from_file(path)
            .await
            .with_context(|| format!("loading {}", path.display()))?,
        None => ClientConfig::default(),
    };
    if let Some(api_url) = &args.api_url {
        config.service.api_url = api_url.clone();
    }
    if let Some(directory_url) = &args.directory_url {
        config.service.directory_url = directory_url.clone();
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { args.log_level.as_str() };
    setup_logging(level);
    info!("{} v{}", APP_NAME, VERSION);

    let config = load_config(&args).await?;
    let assume_yes = matches!(args.command, Commands::Unshare { yes: true, .. });

    let transport = Arc::new(HttpTransport::new(&config).context("building HTTP transport")?);
    let node = NodeClient::new(
        transport,
        Arc::new(StdoutNavigator),
        Arc::new(StdinConfirmation { assume_yes }),
        &config,
    )?;

    match args.command {
        Commands::Status => {
            node.refresh().await;
            print_identity(&node, args.json)?;
        }

        Commands::Files => {
            node.refresh().await;
            print_cards(&node.local_cards(), args.json)?;
        }

        Commands::Search { query, category, sort, limit } => {
            let mut query = SearchQuery::new(query, &category);
            query.sort = sort;
            query.limit = limit;
            node.dispatch(Intent::SearchSubmitted(query))
                .await
                .context("search failed")?;
            print_cards(&node.network_cards(), args.json)?;
        }

        Commands::Share { path } => share(&node, &path).await?,

        Commands::Unshare { id, .. } => {
            let outcome = node
                .dispatch(Intent::UnshareClicked { file_id: id.clone() })
                .await
                .with_context(|| format!("failed to unshare {}", id))?;
            if let IntentOutcome::Unshared(UnshareOutcome::Removed) = outcome {
                println!("File unshared successfully");
                print_cards(&node.local_cards(), args.json)?;
            }
        }

        Commands::Download { id } => {
            node.dispatch(Intent::DownloadClicked { file_id: id }).await?;
        }

        Commands::Link { id } => {
            if let IntentOutcome::ShareLink(url) =
                node.dispatch(Intent::ShareLinkRequested { file_id: id }).await?
            {
                println!("{}", url);
            }
        }

        Commands::Info { id, network } => {
            node.start().await;
            let origin = if network { ListOrigin::Network } else { ListOrigin::Local };
            let details = node
                .file_details(&id, origin)
                .with_context(|| format!("file {} not found", id))?;
            print_details(&details, args.json)?;
        }

        Commands::Watch => watch(&node, &config, args.json).await?,
    }

    Ok(())
}

/// Upload with a progress bar fed from the session channel
async fn share(node: &NodeClient<HttpTransport>, path: &Path) -> Result<()> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("{} has no file name", path.display()))?
        .to_string();
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let total = bytes.len() as u64;

    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {bytes}/{total_bytes} {msg}")?
            .progress_chars("##-"),
    );
    bar.set_message(filename.clone());

    let mut sessions = node.transfer().subscribe();
    let tracker = bar.clone();
    let follower = tokio::spawn(async move {
        while sessions.changed().await.is_ok() {
            let session = sessions.borrow_and_update().clone();
            if let Some(session) = session {
                tracker.set_length(session.bytes_total);
                tracker.set_position(session.bytes_sent);
                if session.is_terminal() {
                    break;
                }
            }
        }
    });

    let result = node
        .dispatch(Intent::UploadDropped(UploadPayload::new(filename, bytes)))
        .await;
    follower.abort();

    match result {
        Ok(IntentOutcome::Uploaded(session)) => {
            bar.set_position(session.bytes_sent);
            bar.finish_with_message(session.status_string());
            Ok(())
        }
        Ok(_) => {
            bar.finish();
            Ok(())
        }
        Err(e) => {
            bar.abandon_with_message(format!("Upload Failed: {}", e));
            Err(e.into())
        }
    }
}

async fn watch(node: &NodeClient<HttpTransport>, config: &ClientConfig, json: bool) -> Result<()> {
    let mut updates = node.cache().subscribe();
    node.start().await;
    print_identity(node, json)?;

    let mut ticker = tokio::time::interval(config.refresh_interval());
    // the first tick fires immediately; start() already covered it
    ticker.tick().await;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutting down watch loop");
                break;
            }
            _ = ticker.tick() => {
                let report = node.refresh().await;
                debug!("Periodic refresh: {:?}", report);
            }
            update = updates.recv() => match update {
                Ok(CacheUpdate::Identity) => print_identity(node, json)?,
                Ok(CacheUpdate::LocalFiles) => {
                    println!("-- shared files --");
                    print_cards(&node.local_cards(), json)?;
                }
                Ok(CacheUpdate::SearchResults) => {
                    println!("-- network files --");
                    print_cards(&node.network_cards(), json)?;
                }
                Err(RecvError::Lagged(skipped)) => warn!("Skipped {} cache updates", skipped),
                Err(RecvError::Closed) => break,
            },
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_identity(node: &NodeClient<HttpTransport>, json: bool) -> Result<()> {
    let panel = node.identity_panel();
    if json {
        return print_json(&panel);
    }
    println!("Peer:         {}", panel.peer_id);
    println!("Endpoint:     {}", panel.endpoint);
    println!("Status:       {}", panel.status.label());
    println!("Shared files: {}", panel.shared_files);
    println!("Downloads:    {}", panel.downloads);
    println!("Uploads:      {}", panel.uploads);
    Ok(())
}

fn print_cards(cards: &[FileCard], json: bool) -> Result<()> {
    if json {
        return print_json(&cards);
    }
    if cards.is_empty() {
        println!("No files found");
        return Ok(());
    }
    for card in cards {
        println!(
            "{:<24} {:<32} {:>10} {:<9} {:<12} {:>4} downloads",
            card.id, card.filename, card.size, card.category, card.owner, card.downloads
        );
    }
    Ok(())
}

fn print_details(details: &FileDetails, json: bool) -> Result<()> {
    if json {
        return print_json(details);
    }
    println!("Filename:    {}", details.filename);
    println!("Size:        {}", details.size);
    println!("Category:    {}", details.category);
    println!("Hash:        {}", details.hash);
    println!("Owner:       {}", details.owner);
    println!("Peer:        {}", details.peer_address);
    println!("Uploaded:    {}", details.upload_time);
    println!("Downloads:   {}", details.downloads);
    println!("Local:       {}", if details.is_local { "yes" } else { "no" });
    Ok(())
}
