//! cask CLI - Command line interface for cask_db
//!
//! Provides commands for storing and reading objects and moving branch refs.
//! Output is JSON on stdout so the tool can be driven from scripts; logs go
//! to stderr.

use anyhow::Context;
use cask_db::{Frame, Hash, ObjectKind, Repository, StoreConfig};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "cask")]
#[command(about = "A content-addressed object store")]
#[command(version)]
struct Cli {
    /// Path to the repository directory
    #[arg(short, long, default_value = cask_db::REPO_DIR)]
    repo: PathBuf,

    /// Output format (json or text)
    #[arg(short, long, default_value = "json")]
    format: OutputFormat,

    /// zstd compression level for new objects
    #[arg(long, default_value_t = cask_db::config::DEFAULT_COMPRESSION_LEVEL)]
    level: i32,

    /// Skip fsync before objects are renamed into place
    #[arg(long)]
    no_fsync: bool,

    /// Re-verify objects that already exist when writing them again
    #[arg(long)]
    verify_existing: bool,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,

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
    /// Initialize a new repository
    Init,

    // === Object Commands ===
    /// Store a file as a blob
    Add {
        /// File to store
        file: PathBuf,
    },

    /// Compute an object's hash, optionally storing it
    HashObject {
        /// File whose contents form the payload
        file: PathBuf,
        /// Object kind
        #[arg(short = 't', long = "type", default_value = "blob")]
        kind: String,
        /// Actually write the object into the store
        #[arg(short, long)]
        write: bool,
    },

    /// Show an object's kind and content
    CatFile {
        /// The object hash
        hash: String,
        /// Write the raw payload bytes to stdout instead of JSON
        #[arg(long)]
        raw: bool,
    },

    /// Check whether an object exists
    Exists {
        /// The object hash
        hash: String,
    },

    // === Version Control Commands ===
    /// Commit on the current branch
    Commit {
        /// Commit message
        #[arg(short, long)]
        message: String,
        /// Author identity
        #[arg(short, long, default_value = "cask <cask@localhost>")]
        author: String,
    },

    /// Show the commit at the tip of the current branch
    Log,

    /// Create a new branch at HEAD
    Branch {
        /// Branch name
        name: String,
    },

    /// Switch to a branch
    Checkout {
        /// Branch name
        name: String,
    },

    /// List all branches
    Branches,

    /// Verify every object in the store
    Fsck,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(&cli) {
        let kind = match err.downcast_ref::<cask_db::Error>() {
            Some(e) if e.is_not_found() => "not_found",
            Some(e) if e.is_corrupt() => "corrupt",
            _ => "error",
        };
        output(
            &cli.format,
            &serde_json::json!({
                "status": "error",
                "kind": kind,
                "message": format!("{err:#}")
            }),
        );
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Init => {
            let repo = Repository::init(&cli.repo, store_config(cli))?;
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "message": format!("Initialized empty cask repository in {}", repo.root().display())
                }),
            );
        }

        Commands::Add { file } => {
            let repo = open_repo(cli)?;
            let hash = repo.add_file(file)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "hash": hash,
                    "path": file.display().to_string()
                }),
            );
        }

        Commands::HashObject { file, kind, write } => {
            let kind: ObjectKind = kind.parse()?;
            let content =
                std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
            let hash = if *write {
                open_repo(cli)?.store().put(&content, kind)?
            } else {
                Frame::new(kind, &content).hash()
            };
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "hash": hash,
                    "kind": kind,
                    "written": write
                }),
            );
        }

        Commands::CatFile { hash, raw } => {
            let repo = open_repo(cli)?;
            let hash: Hash = hash.parse()?;
            let (kind, payload) = repo.store().get(&hash)?;
            if *raw {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(&payload)?;
                stdout.flush()?;
            } else {
                output(
                    &cli.format,
                    &serde_json::json!({
                        "hash": hash,
                        "kind": kind,
                        "size": payload.len(),
                        "content": String::from_utf8_lossy(&payload)
                    }),
                );
            }
        }

        Commands::Exists { hash } => {
            let repo = open_repo(cli)?;
            let hash: Hash = hash.parse()?;
            output(
                &cli.format,
                &serde_json::json!({
                    "hash": hash,
                    "exists": repo.store().has(&hash)
                }),
            );
        }

        Commands::Commit { message, author } => {
            let repo = open_repo(cli)?;
            let hash = repo.commit(message, author)?;
            let branch = repo.refs().current_branch()?;
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "hash": hash,
                    "short": hash.short(),
                    "branch": branch,
                    "message": message
                }),
            );
        }

        Commands::Log => {
            let repo = open_repo(cli)?;
            let branch = repo.refs().current_branch()?;
            let (hash, commit) = repo
                .head()?
                .ok_or_else(|| anyhow::anyhow!("No commits yet on branch {branch}"))?;
            output(
                &cli.format,
                &serde_json::json!({
                    "branch": branch,
                    "hash": hash,
                    "summary": commit.summary(),
                    "commit": commit
                }),
            );
        }

        Commands::Branch { name } => {
            let repo = open_repo(cli)?;
            let at = repo.create_branch(name)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "branch": name,
                    "at": at
                }),
            );
        }

        Commands::Checkout { name } => {
            let repo = open_repo(cli)?;
            let tip = repo.checkout(name)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "branch": name,
                    "at": tip
                }),
            );
        }

        Commands::Branches => {
            let repo = open_repo(cli)?;
            let current = repo.refs().current_branch()?;
            let branches: Vec<_> = repo
                .refs()
                .list()?
                .into_iter()
                .map(|(name, hash)| {
                    let is_current = name == current;
                    serde_json::json!({
                        "name": name,
                        "hash": hash,
                        "current": is_current
                    })
                })
                .collect();
            output(
                &cli.format,
                &serde_json::json!({
                    "current": current,
                    "branches": branches
                }),
            );
        }

        Commands::Fsck => {
            let repo = open_repo(cli)?;
            let report = repo.fsck()?;
            output(
                &cli.format,
                &serde_json::json!({
                    "status": if report.is_clean() { "ok" } else { "corrupt" },
                    "checked": report.checked,
                    "corrupt": report.corrupt
                }),
            );
            if !report.is_clean() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn store_config(cli: &Cli) -> StoreConfig {
    StoreConfig::builder()
        .compression_level(cli.level)
        .fsync(!cli.no_fsync)
        .verify_existing(cli.verify_existing)
        .build()
}

fn open_repo(cli: &Cli) -> anyhow::Result<Repository> {
    let repo = Repository::open(&cli.repo, store_config(cli))?;
    Ok(repo)
}

fn output(format: &OutputFormat, value: &serde_json::Value) {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string(value),
        OutputFormat::Text => serde_json::to_string_pretty(value),
    };
    match rendered {
        Ok(text) => println!("{text}"),
        Err(e) => eprintln!("failed to render output: {e}"),
    }
}
