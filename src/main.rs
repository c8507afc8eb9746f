use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;

use lebook::{
    command::{Command, Reply},
    config::{ConfigError, LibraryConfig},
    core::library::Library,
    error::LibraryError,
    persist::{BookStore, PersistError, flat_file::FlatFileStore, sqlite::SqliteStore},
    runtime::handle::{LibraryHandle, RuntimeConfig, RuntimeError, spawn_library},
    ui,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StoreKind {
    Flat,
    Sqlite,
}

#[derive(Debug, Parser)]
#[command(name = "lebook", about = "Personal library catalogue with shelving and undo", version)]
struct Cli {
    /// Catalogue file.
    #[arg(long, default_value = "data/lebook.txt")]
    data: PathBuf,

    /// Storage backend for the catalogue file.
    #[arg(long, value_enum, default_value_t = StoreKind::Flat)]
    store: StoreKind,

    /// JSON file with shelving, lending, and undo settings.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error(transparent)]
    Library(#[from] LibraryError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error("console io failed: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .ok();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => LibraryConfig::from_json_file(path)?,
        None => LibraryConfig::default(),
    };

    let store: Box<dyn BookStore> = match cli.store {
        StoreKind::Flat => Box::new(FlatFileStore::open(&cli.data)),
        StoreKind::Sqlite => Box::new(SqliteStore::open(&cli.data)?),
    };
    let books = store.read()?;
    tracing::info!(path = %cli.data.display(), count = books.len(), "catalogue loaded");

    let library = Library::builder().config(config).seed(books).build()?;
    let handle = spawn_library(library, Some(store), RuntimeConfig::default());

    let result = run_session(&handle).await;
    handle.shutdown().await?;
    result
}

async fn run_session(handle: &LibraryHandle) -> Result<(), AppError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{}", ui::welcome());

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(err) => {
                println!("{}", ui::error(&err));
                continue;
            }
        };
        if let Command::Undo { count } = &command {
            if !confirm_undo(&mut lines, *count).await? {
                continue;
            }
        }

        match handle.execute(command).await {
            Ok(Reply::Exit) => {
                println!("{}", ui::goodbye());
                return Ok(());
            }
            Ok(reply) => println!("{}", ui::render(&reply)),
            Err(RuntimeError::Library(err)) => println!("{}", ui::error(&err)),
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

async fn confirm_undo(lines: &mut Lines<BufReader<Stdin>>, count: usize) -> Result<bool, AppError> {
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(ui::undo_prompt(count).as_bytes()).await?;
        stdout.flush().await?;
        let Some(answer) = lines.next_line().await? else {
            return Ok(false);
        };
        match answer.trim().to_lowercase().as_str() {
            "y" => return Ok(true),
            "n" => return Ok(false),
            _ => println!(
                "{}",
                ui::error(&LibraryError::InvalidArgument(
                    "Please respond with 'y' or 'n'.".to_string()
                ))
            ),
        }
    }
}
