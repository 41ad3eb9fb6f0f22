//! DriveSweep CLI — enumerate, upload and clean up Google Drive files
//!
//! Usage:
//!   drivesweep folders                          List folders
//!   drivesweep files -t txt -n 100              Gather info on files of a kind
//!   drivesweep cleanup -z 2024-01-01 -p <id>    Delete old files (dry run)
//!   drivesweep meta -i <file-id>                Print one file's metadata
//!   drivesweep send <path> -p <id>              Upload a file or folder

use std::path::PathBuf;
use std::process;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};

use drivesweep::drive::{DriveError, DriveItem, DriveSession, FileKind, HttpConnect, MatchMode};
use drivesweep::{report, CredentialSource, StaticToken, TokenFile};

const TOKEN_ENV_VAR: &str = "DRIVESWEEP_TOKEN";

#[derive(Parser)]
#[command(
    name = "drivesweep",
    about = "DriveSweep — Google Drive enumeration, upload and cleanup tool",
    version,
    long_about = "Send data to or request information from a Google Drive, and \
delete old files from it.\nCredentials: pass --token-file, set DRIVESWEEP_TOKEN, \
or store a token at <config dir>/drivesweep/token.json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a stored access-token file (JSON with an `access_token` or
    /// `token` field, or a bare token)
    #[arg(short = 'T', long, global = true)]
    token_file: Option<PathBuf>,

    /// Write the results to a timestamped JSON file
    #[arg(short = 'j', long, global = true)]
    json: bool,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// List folders on the drive
    Folders {
        /// Maximum number of folders to list
        #[arg(short, long)]
        num: Option<usize>,
    },
    /// Gather info on files of one kind
    Files {
        /// Kind of file (txt, csv, pdf, jpg, png, mp3, gdoc, gsht, folder)
        #[arg(short = 't', long = "type", default_value = "txt")]
        kind: String,
        /// Number of files to gather info on
        #[arg(short, long)]
        num: Option<usize>,
        /// Search by content type instead of filename extension
        #[arg(short = 'y', long)]
        mimetype: bool,
    },
    /// Delete old files from a drive folder (dry run unless --live)
    Cleanup {
        /// Delete all files modified before this date [YYYY-MM-DD]
        #[arg(short = 'z', long)]
        before: String,
        /// Id of the drive folder containing the files to delete
        #[arg(short, long, default_value = "root")]
        parent: String,
        /// Kind of file to delete, matched on filename suffix
        #[arg(short = 't', long = "type", default_value = "txt")]
        kind: String,
        /// Actually delete; without this the run only reports what it would do
        #[arg(long)]
        live: bool,
    },
    /// Print the metadata for one drive file
    Meta {
        /// Id of the drive file to query
        #[arg(short, long)]
        id: String,
    },
    /// Upload a local file or folder to the drive
    Send {
        /// Path of the local file or folder to send
        path: PathBuf,
        /// Id of the drive folder to send to
        #[arg(short, long, default_value = "root")]
        parent: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let start = Instant::now();
    let code = match run(cli).await {
        Ok(()) => 0,
        Err(err) => {
            error!("{err:#}");
            exit_code(&err)
        }
    };
    info!("running time = {:.2?}", start.elapsed());
    process::exit(code);
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}

/// Exit codes follow the tool's long-standing table: 27 for usage and value
/// errors, 39 for remote faults, 66 for anything else.
fn exit_code(err: &anyhow::Error) -> i32 {
    match err.chain().find_map(|e| e.downcast_ref::<DriveError>()) {
        Some(e) if e.is_usage() => 27,
        Some(DriveError::Api { .. })
        | Some(DriveError::Network(_))
        | Some(DriveError::Credentials(_)) => 39,
        _ => 66,
    }
}

fn credentials(token_file: Option<PathBuf>) -> anyhow::Result<Arc<dyn CredentialSource>> {
    if let Some(path) = token_file {
        return Ok(Arc::new(TokenFile::new(path)));
    }
    if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
        return Ok(Arc::new(StaticToken::new(token)));
    }
    let path = TokenFile::default_path()
        .ok_or_else(|| DriveError::Credentials("no user config directory".to_string()))?;
    Ok(Arc::new(TokenFile::new(path)))
}

fn parse_kind(raw: &str) -> anyhow::Result<FileKind> {
    FileKind::from_str(raw).with_context(|| format!("cannot use file kind '{raw}'"))
}

fn parse_date(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| DriveError::InvalidInput(format!("date '{raw}' not in YYYY-MM-DD format")))
        .context("bad --before date")
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .expect("static spinner template"),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn print_items(items: &[DriveItem]) {
    println!(" Name\t\t\t\t<type>\t\t\t\t%Timestamp%\t\t\t\t(Id)\t\t\t\t[parent id]");
    for item in items {
        println!(
            "{} <{}> %{}% ({}) {}",
            item.name,
            item.mime_type,
            item.modified_time.as_deref().unwrap_or("-"),
            item.id,
            item.parents_label()
        );
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let credentials = credentials(cli.token_file.clone())?;
    let connector = Arc::new(HttpConnect::new(credentials));
    let mut session = DriveSession::new(connector);
    session.begin().await?;

    let result = dispatch(&session, &cli).await;
    session.end();
    result
}

async fn dispatch(session: &DriveSession, cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Folders { num } => {
            let folders = session.find_all_folders(*num).await?;
            print_items(&folders);
            println!(">> found {} folders", folders.len());
            if cli.json && !folders.is_empty() {
                report::save_json("drivesweep_folders", &folders)?;
            }
        }
        Commands::Files { kind, num, mimetype } => {
            let kind = parse_kind(kind)?;
            let mode = if *mimetype { MatchMode::Mime } else { MatchMode::Extension };
            let files = session.find_files_of_kind(kind, *num, mode).await?;
            print_items(&files);
            println!(">> found {} '{kind}' files", files.len());
            if cli.json && !files.is_empty() {
                report::save_json("drivesweep_files", &files)?;
            }
        }
        Commands::Cleanup { before, parent, kind, live } => {
            let before = parse_date(before)?;
            let kind = parse_kind(kind)?;
            if *live {
                info!("deleting '{kind}' files older than {before} in folder '{parent}'");
            } else {
                info!("dry run: no deletions will be performed");
            }
            let outcomes = session.sweep(before, parent, kind, !*live).await?;
            if outcomes.len() == 1 && outcomes[0].is_nothing_found() {
                println!("no files found?!");
            } else {
                println!(">> {} files {}", outcomes.len(), if *live { "deleted" } else { "would be deleted" });
            }
            if cli.json {
                report::save_json("drivesweep_cleanup", &outcomes)?;
            }
        }
        Commands::Meta { id } => {
            let metadata = session.get_metadata(id).await?;
            println!("file '{id}' metadata:");
            if let Some(map) = metadata.as_object() {
                for (key, value) in map {
                    println!("\t{key}: {value}");
                }
            } else {
                println!("\t{metadata}");
            }
        }
        Commands::Send { path, parent } => {
            if path.is_dir() {
                let pb = spinner("uploading folder...");
                let outcomes = session.send_folder(path, parent).await;
                pb.finish_and_clear();
                let outcomes = outcomes?;
                println!(">> sent {} files to drive folder '{parent}'", outcomes.len());
                if cli.json && !outcomes.is_empty() {
                    report::save_json("drivesweep_send", &outcomes)?;
                }
            } else if path.is_file() {
                let pb = spinner("uploading file...");
                let id = session.send_file(path, parent).await;
                pb.finish_and_clear();
                println!(">> uploaded, drive id = {}", id?);
            } else {
                return Err(DriveError::InvalidPath(format!(
                    "'{}' is neither a file nor a folder",
                    path.display()
                ))
                .into());
            }
        }
    }
    Ok(())
}
