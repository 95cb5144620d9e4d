//! Sandbox CLI
//!
//! Diagnostic front-end for the sandboxed file operations.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sandbox::config::Config;
use sandbox::{logging, FileSystem};

/// Sandboxed file access - list, preview, stream and rewrite files under one root.
#[derive(Parser, Debug)]
#[command(name = "sandboxctl")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Sandbox root (overrides config and environment)
    #[arg(short, long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print the canonical absolute path for a relative path
    Resolve {
        /// Path relative to the sandbox root
        path: String,
    },

    /// List a directory as JSON
    List {
        /// Directory relative to the sandbox root
        #[arg(default_value = ".")]
        path: String,
    },

    /// Print a file preview as JSON
    Read {
        /// File relative to the sandbox root
        path: String,
    },

    /// Copy raw file bytes to stdout, MIME type to stderr
    Raw {
        /// File relative to the sandbox root
        path: String,
    },

    /// Replace a file's contents with stdin (or --from)
    Write {
        /// Existing file relative to the sandbox root
        path: String,

        /// Read the payload from this file instead of stdin
        #[arg(long, value_name = "FILE")]
        from: Option<PathBuf>,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let bootstrap = logging::filter_directive(cli.verbose, logging::BOOTSTRAP_LEVEL);
    let config = logging::scoped(&bootstrap, std::io::stderr, || load_config(&cli))?;

    let directive = logging::filter_directive(cli.verbose, &config.daemon.log_level);
    let _log_guard = logging::init(&directive, config.daemon.log_file.as_deref())?;

    tracing::debug!(root = ?config.files.root, "Using sandbox root");

    let root = config.files.root.clone();
    let open = || {
        FileSystem::new(&root)
            .with_context(|| format!("Invalid sandbox root: {}", root.display()))
    };

    match cli.command {
        Commands::Resolve { path } => {
            let resolved = open()?.resolve(&path)?;
            println!("{}", resolved);
        }
        Commands::List { path } => {
            let listing = open()?.list(&path)?;
            println!("{}", protocol::to_json_pretty(&listing)?);
        }
        Commands::Read { path } => {
            let content = open()?.read(&path)?;
            println!("{}", protocol::to_json_pretty(&content)?);
        }
        Commands::Raw { path } => {
            let mut raw = open()?.open_raw(&path)?;
            eprintln!("{}", raw.mime_type());
            let mut stdout = io::stdout().lock();
            io::copy(&mut raw, &mut stdout).context("Failed to copy file to stdout")?;
            stdout.flush()?;
        }
        Commands::Write { path, from } => {
            let payload = match from {
                Some(source) => fs::read(&source)
                    .with_context(|| format!("Failed to read payload: {}", source.display()))?,
                None => {
                    let mut buf = Vec::new();
                    io::stdin()
                        .read_to_end(&mut buf)
                        .context("Failed to read payload from stdin")?;
                    buf
                }
            };
            open()?.write(&path, &payload)?;
            tracing::info!(path = %path, bytes = payload.len(), "File written");
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

/// Config file, then environment, then command-line flags.
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(config_path) => {
            tracing::info!("Using config file: {:?}", config_path);
            Config::load(config_path)?
        }
        None => Config::load_default()?,
    };
    config.apply_env_overrides();
    if let Some(root) = &cli.root {
        tracing::info!("Overriding files.root from command line: {}", root.display());
        config.files.root = root.clone();
    }
    config.validate()?;
    Ok(config)
}
