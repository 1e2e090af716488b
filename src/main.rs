//! assetstore CLI - Command line interface for asset_store
//!
//! Stores files as assets and reads them back by ID or by access token.

use anyhow::Context;
use asset_store::{AssetMeta, AssetStorage, AssetToken, Clock, Config, SystemClock};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "assetstore")]
#[command(about = "Store binary assets and fetch them by ID or expiring token")]
#[command(version)]
struct Cli {
    /// Path to a JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data directory (overrides config and ASSETSTORE_DATA_DIR)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Output format (json or text)
    #[arg(short, long, default_value = "json")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory, table file and content directory
    Init,

    /// Store a file as a new asset
    Put {
        /// File to store, or "-" for stdin
        file: PathBuf,
        /// Asset name (defaults to the file name)
        #[arg(short, long)]
        name: Option<String>,
        /// Issue an access token for the asset
        #[arg(short, long)]
        token: bool,
        /// Token lifetime in minutes; 0 means no token
        #[arg(short, long, default_value = "0")]
        expiry: u64,
    },

    /// Fetch an asset by ID
    Get {
        /// The asset ID
        id: String,
        /// Write content to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fetch an asset by access token
    GetToken {
        /// The access token
        token: String,
        /// Write content to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show an asset's metadata
    Meta {
        /// The asset ID
        id: String,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        output(
            &cli.format,
            &serde_json::json!({
                "status": "error",
                "message": format!("{:#}", e)
            }),
        );
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    asset_store::logging::init_logging(&config.log_filter);

    match &cli.command {
        Commands::Init => {
            open_storage(&config)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "table": config.table_path().display().to_string(),
                    "content": config.content_path().display().to_string()
                }),
            );
        }

        Commands::Put {
            file,
            name,
            token,
            expiry,
        } => {
            let storage = open_storage(&config)?;
            let (name, content) = open_input(file, name.as_deref())?;

            let meta = AssetMeta::new(name);
            let asset_token = if *token && *expiry != 0 {
                AssetToken::issue(
                    meta.id.clone(),
                    Duration::from_secs(expiry.saturating_mul(60)),
                    SystemClock.now(),
                )
            } else {
                AssetToken::default()
            };

            let stored = storage.store(meta, &asset_token, content)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "asset": stored,
                    "token": asset_token
                }),
            );
        }

        Commands::Get { id, output: path } => {
            let storage = open_storage(&config)?;
            let (meta, content) = storage.get_by_id(id)?;
            send_asset(&cli.format, meta, content, path.as_deref())?;
        }

        Commands::GetToken { token, output: path } => {
            let storage = open_storage(&config)?;
            let (meta, content) = storage.get_by_token(token)?;
            send_asset(&cli.format, meta, content, path.as_deref())?;
        }

        Commands::Meta { id } => {
            let storage = open_storage(&config)?;
            let meta = storage.get_meta(id)?;
            output(&cli.format, &serde_json::json!({ "asset": meta }));
        }
    }

    Ok(())
}

fn open_storage(config: &Config) -> anyhow::Result<AssetStorage> {
    config.ensure_dirs()?;
    let storage = AssetStorage::open(config.table_path(), config.content_path())
        .with_context(|| format!("opening storage in {}", config.data_dir.display()))?;
    Ok(storage)
}

/// Resolve the asset name and open the content stream for `put`
fn open_input(
    file: &Path,
    name: Option<&str>,
) -> anyhow::Result<(String, asset_store::ContentStream)> {
    if file == Path::new("-") {
        let name = name
            .filter(|n| !n.is_empty())
            .ok_or_else(|| anyhow::anyhow!("asset name not specified"))?;
        return Ok((name.to_string(), Box::new(io::stdin())));
    }

    let name = match name {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow::anyhow!("asset name not specified"))?,
    };
    let reader = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    Ok((name, Box::new(reader)))
}

/// Copy content to `path` and report its metadata, or stream it raw to stdout
fn send_asset(
    format: &OutputFormat,
    meta: AssetMeta,
    mut content: asset_store::ContentStream,
    path: Option<&Path>,
) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            let mut file =
                File::create(path).with_context(|| format!("creating {}", path.display()))?;
            let written = io::copy(&mut content, &mut file)?;
            file.sync_all()?;
            output(
                format,
                &serde_json::json!({
                    "asset": meta,
                    "path": path.display().to_string(),
                    "bytes": written
                }),
            );
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            io::copy(&mut content, &mut out)?;
            out.flush()?;
        }
    }
    Ok(())
}

fn output(format: &OutputFormat, value: &serde_json::Value) {
    match format {
        OutputFormat::Json => println!("{}", value),
        OutputFormat::Text => println!("{:#}", value),
    }
}
