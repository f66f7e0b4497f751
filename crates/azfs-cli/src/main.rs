//! azfs-cli - Command-line interface for Azure Blob and Data Lake storage
//!
//! Every command takes full storage URLs such as
//! `https://<account>.blob.core.windows.net/<container>/<path>`. Credentials are
//! read from the `AZURE_STORAGE_*` environment variables.

use anyhow::{Context, Result};
use azfs_core::{AzFileClient, Config, ObjectInfo};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// azfs - path-based access to Azure storage
#[derive(Parser)]
#[command(name = "azfs")]
#[command(author, version, about = "Path-based access to Azure Blob and Data Lake storage", long_about = None)]
struct Cli {
    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Configuration file (defaults to $AZFS_CONFIG, then the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the entries directly below a path
    Ls {
        /// Directory URL
        url: String,

        /// Print full URLs instead of names
        #[arg(long)]
        full: bool,
    },

    /// List objects matching a `*` pattern
    Glob {
        /// Pattern URL, e.g. https://acct.blob.core.windows.net/c/root/*/*.csv
        pattern: String,
    },

    /// Write an object to stdout
    Cat {
        /// Object URL
        url: String,

        /// First byte to read
        #[arg(long)]
        offset: Option<usize>,

        /// Number of bytes to read
        #[arg(long)]
        length: Option<usize>,
    },

    /// Download an object to a local file
    Download {
        /// Object URL
        url: String,

        /// Local destination
        local: PathBuf,
    },

    /// Upload a local file
    Upload {
        /// Local source
        local: PathBuf,

        /// Object URL
        url: String,
    },

    /// Copy an object
    Cp {
        /// Source URL
        src: String,

        /// Destination URL
        dst: String,

        /// Replace an existing destination
        #[arg(long)]
        overwrite: bool,
    },

    /// Delete an object
    Rm {
        /// Object URL
        url: String,
    },

    /// Show object metadata
    Stat {
        /// Object URL
        url: String,

        /// Output format as JSON
        #[arg(long)]
        json: bool,
    },

    /// Exit with 0 when the object exists, 1 otherwise
    Exists {
        /// Object URL
        url: String,
    },

    /// Create a directory (Data Lake only)
    Mkdir {
        /// Directory URL
        url: String,
    },

    /// Show or initialize configuration
    Config {
        /// Show current configuration
        #[arg(long, conflicts_with_all = ["path", "init"])]
        show: bool,

        /// Show configuration file path
        #[arg(long, conflicts_with_all = ["show", "init"])]
        path: bool,

        /// Write a commented default configuration file
        #[arg(long, conflicts_with_all = ["show", "path"])]
        init: bool,
    },
}

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    match run() {
        Ok(code) => process::exit(code),
        Err(e) => {
            error!("Error: {:#}", e);
            process::exit(map_error_to_exit_code(&e));
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    // Config commands must work even when the configuration cannot be loaded.
    let client = || -> Result<AzFileClient> {
        Ok(AzFileClient::new(Config::load(cli.config.as_deref())?))
    };

    match cli.command {
        Commands::Ls { url, full } => {
            for name in client()?.ls(&url, full)? {
                println!("{}", name);
            }
        }

        Commands::Glob { pattern } => {
            for url in client()?.glob(&pattern)? {
                println!("{}", url);
            }
        }

        Commands::Cat {
            url,
            offset,
            length,
        } => {
            let client = client()?;
            let data = if offset.is_none() && length.is_none() {
                client.get(&url)?
            } else {
                client.get_range(&url, offset, length)?
            };
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&data)?;
            stdout.flush()?;
        }

        Commands::Download { url, local } => {
            let data = client()?.get_range(&url, None, None)?;
            std::fs::write(&local, &data)
                .with_context(|| format!("Failed to write {}", local.display()))?;
            info!("Downloaded {} bytes to {}", data.len(), local.display());
        }

        Commands::Upload { local, url } => {
            let data = std::fs::read(&local)
                .with_context(|| format!("Failed to read {}", local.display()))?;
            let len = data.len();
            client()?.put(&url, data)?;
            info!("Uploaded {} bytes to {}", len, url);
        }

        Commands::Cp {
            src,
            dst,
            overwrite,
        } => {
            client()?.copy(&src, &dst, overwrite)?;
            info!("Copied {} to {}", src, dst);
        }

        Commands::Rm { url } => {
            client()?.remove(&url)?;
            info!("Removed {}", url);
        }

        Commands::Stat { url, json } => {
            let info = client()?.stat(&url)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                print_info(&info);
            }
        }

        Commands::Exists { url } => {
            let exists = client()?.exists(&url)?;
            println!("{}", exists);
            return Ok(if exists { 0 } else { 1 });
        }

        Commands::Mkdir { url } => {
            client()?.mkdir(&url)?;
            info!("Created directory {}", url);
        }

        Commands::Config { show, path, init } => {
            config_command(cli.config.as_deref(), show, path, init)?;
        }
    }

    Ok(0)
}

fn config_command(explicit: Option<&Path>, show: bool, path: bool, init: bool) -> Result<()> {
    let config_path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match std::env::var(azfs_core::config::CONFIG_ENV_VAR) {
            Ok(path) => PathBuf::from(path),
            Err(_) => Config::config_path()?,
        },
    };

    if show {
        let config = Config::load(explicit)?;
        println!("{}", toml::to_string_pretty(&config)?);
    } else if path {
        println!("{}", config_path.display());
    } else if init {
        if config_path.exists() {
            anyhow::bail!("{} already exists", config_path.display());
        }
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&config_path, Config::default_config_content())?;
        info!("Wrote default configuration to {}", config_path.display());
    } else {
        eprintln!("Please specify --show, --path, or --init");
    }
    Ok(())
}

fn print_info(info: &ObjectInfo) {
    println!("name:          {}", info.name);
    println!("size:          {}", info.size);
    if let Some(created) = info.creation_time {
        println!("created:       {}", created.to_rfc3339());
    }
    println!("last_modified: {}", info.last_modified.to_rfc3339());
    println!("etag:          {}", info.etag.as_deref().unwrap_or("-"));
    println!(
        "content_type:  {}",
        info.content_type.as_deref().unwrap_or("-")
    );
    println!("kind:          {}", info.kind);
}

/// Map errors to exit codes:
/// - 0: Success
/// - 1: General or configuration error
/// - 2: Object not found or local I/O error
/// - 3: Invalid input, unsupported backend, or existing destination
/// - 4: Storage service failure
fn map_error_to_exit_code(err: &anyhow::Error) -> i32 {
    if let Some(azfs_err) = err.downcast_ref::<azfs_core::Error>() {
        match azfs_err {
            azfs_core::Error::NotFound(_) => 2,
            azfs_core::Error::Io(_) => 2,
            azfs_core::Error::InvalidPath(_) => 3,
            azfs_core::Error::InvalidArgument(_) => 3,
            azfs_core::Error::UnsupportedBackend(_) => 3,
            azfs_core::Error::AlreadyExists(_) => 3,
            azfs_core::Error::ObjectStore(_) => 4,
            azfs_core::Error::IncompleteWrite { .. } => 4,
            azfs_core::Error::Config(_) => 1,
            azfs_core::Error::Runtime(_) => 1,
            azfs_core::Error::Json(_) => 1,
            azfs_core::Error::Csv(_) => 1,
        }
    } else if err.is::<std::io::Error>() {
        2
    } else {
        1
    }
}
