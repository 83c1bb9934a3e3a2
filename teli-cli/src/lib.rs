//! Command-line interface for ranking a personal movie collection with Teli.
#![forbid(unsafe_code)]

use std::io::{BufRead, Write};

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use teli_core::SqliteCollectionStore;

mod collection;
mod error;
mod rank;
mod transfer;
mod verdict;

pub use error::CliError;

use collection::{CuratedArgs, ListArgs, NoteArgs, ProfileArgs, RemoveArgs, WatchArgs};
use rank::{AddArgs, RecompareArgs};
use transfer::{ExportArgs, ImportArgs};

const ARG_ID: &str = "id";
const ARG_DB: &str = "db";
const ARG_TITLE: &str = "title";
const ARG_YEAR: &str = "year";
const ARG_GENRE: &str = "genre";
const ARG_PREFERENCE: &str = "preference";
const ARG_VERDICTS: &str = "verdicts";
const ARG_MAX_COMPARISONS: &str = "max-comparisons";
const ARG_JSON: &str = "json";
const ARG_SNAPSHOT: &str = "path";
const ARG_NOTES: &str = "notes";
const ARG_TAG: &str = "tag";
const ARG_CLEAR_TAGS: &str = "clear-tags";
const ENV_ADD_ID: &str = "TELI_CMDS_ADD_ID";
const ENV_RECOMPARE_ID: &str = "TELI_CMDS_RECOMPARE_ID";
const ENV_REMOVE_ID: &str = "TELI_CMDS_REMOVE_ID";
const ENV_NOTE_ID: &str = "TELI_CMDS_NOTE_ID";
const ENV_IMPORT_PATH: &str = "TELI_CMDS_IMPORT_PATH";

/// Collection database used when neither `--db` nor configuration names one.
pub const DEFAULT_DATABASE: &str = "teli.db";

/// Run the Teli CLI with the current process arguments, standard input and
/// standard output.
///
/// # Errors
///
/// Returns [`CliError`] when argument parsing, configuration or the selected
/// command fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut stdout = std::io::stdout().lock();
    dispatch(cli.command, &mut input, &mut stdout)
}

fn dispatch(
    command: Command,
    input: &mut dyn BufRead,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    match command {
        Command::Add(args) => rank::run_add(args, input, out),
        Command::Recompare(args) => rank::run_recompare(args, input, out),
        Command::List(args) => collection::run_list(args, out),
        Command::Remove(args) => collection::run_remove(args, out),
        Command::Watch(args) => collection::run_watch(args, out),
        Command::Note(args) => collection::run_note(args, out),
        Command::Profile(args) => collection::run_profile(args, out),
        Command::Curated(args) => collection::run_curated(args, out),
        Command::Export(args) => transfer::run_export(args, out),
        Command::Import(args) => transfer::run_import(args, out),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "teli",
    about = "Rank movies by comparing them two at a time",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rank a new item against the collection.
    Add(AddArgs),
    /// Take an item out of the collection and rank it again.
    Recompare(RecompareArgs),
    /// Show the collection with derived scores.
    List(ListArgs),
    /// Delete an item from the collection.
    Remove(RemoveArgs),
    /// Add to or show the watchlist.
    Watch(WatchArgs),
    /// Set or show an item's notes and tags.
    Note(NoteArgs),
    /// Summarise taste from the ranked collection.
    Profile(ProfileArgs),
    /// Show themed lists drawn from the collection.
    Curated(CuratedArgs),
    /// Write the collection as a JSON snapshot.
    Export(ExportArgs),
    /// Replace the collection with a JSON snapshot.
    Import(ImportArgs),
}

/// Resolve the collection database path, falling back to
/// [`DEFAULT_DATABASE`].
fn database_path(db: Option<Utf8PathBuf>) -> Utf8PathBuf {
    db.unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE))
}

/// Open the collection database, creating its directory when needed.
fn open_store(path: &Utf8Path) -> Result<SqliteCollectionStore, CliError> {
    teli_fs::ensure_parent_dir(path).map_err(|source| CliError::PrepareDatabase {
        path: path.to_path_buf(),
        source,
    })?;
    let store = SqliteCollectionStore::open(path.as_std_path())?;
    log::debug!("opened collection at {path}");
    Ok(store)
}

fn write_line(out: &mut dyn Write, line: &str) -> Result<(), CliError> {
    writeln!(out, "{line}").map_err(CliError::WriteOutput)
}

fn write_json<T: serde::Serialize>(out: &mut dyn Write, value: &T) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::Serialise)?;
    write_line(out, &payload)
}

#[cfg(test)]
mod tests;
