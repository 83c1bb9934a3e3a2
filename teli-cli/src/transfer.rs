//! `export` and `import` commands backed by JSON snapshots.

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use teli_core::{CollectionSnapshot, SqliteCollectionStore};

use crate::{
    ARG_DB, ARG_SNAPSHOT, CliError, ENV_IMPORT_PATH, database_path, open_store, write_line,
};

/// CLI arguments for the `export` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Write every item and the comparison log as a JSON \
                 snapshot. The snapshot goes to standard output unless a \
                 path is given.",
    about = "Write the collection as a JSON snapshot"
)]
#[ortho_config(prefix = "TELI")]
pub(crate) struct ExportArgs {
    /// Destination file.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) path: Option<Utf8PathBuf>,
    /// Path to the collection database.
    #[arg(long = ARG_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) db: Option<Utf8PathBuf>,
}

pub(super) fn run_export(args: ExportArgs, out: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let store = open_store(&database_path(merged.db))?;
    export_with(&store, merged.path.as_deref(), out)
}

pub(crate) fn export_with(
    store: &SqliteCollectionStore,
    path: Option<&Utf8Path>,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let snapshot = CollectionSnapshot::capture(store)?;
    let json = snapshot.to_json().map_err(CliError::Serialise)?;
    let Some(path) = path else {
        return write_line(out, &json);
    };
    teli_fs::write_string(path, &json).map_err(|source| CliError::WriteSnapshot {
        path: path.to_path_buf(),
        source,
    })?;
    write_line(
        out,
        &format!(
            "Exported {} item(s) and {} comparison(s) to {path}",
            snapshot.items.len(),
            snapshot.comparisons.len()
        ),
    )
}

/// CLI arguments for the `import` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Replace every item and the comparison log with the \
                 contents of a JSON snapshot written by `teli export`. A \
                 snapshot that cannot be restored leaves the collection \
                 untouched.",
    about = "Replace the collection with a JSON snapshot"
)]
#[ortho_config(prefix = "TELI")]
pub(crate) struct ImportArgs {
    /// Snapshot file to read.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) path: Option<Utf8PathBuf>,
    /// Path to the collection database.
    #[arg(long = ARG_DB, value_name = "path")]
    #[serde(default)]
    pub(crate) db: Option<Utf8PathBuf>,
}

pub(super) fn run_import(args: ImportArgs, out: &mut dyn Write) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let path = merged.path.ok_or(CliError::MissingArgument {
        field: ARG_SNAPSHOT,
        env: ENV_IMPORT_PATH,
    })?;
    let mut store = open_store(&database_path(merged.db))?;
    import_with(&mut store, &path, out)
}

pub(crate) fn import_with(
    store: &mut SqliteCollectionStore,
    path: &Utf8Path,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let found = teli_fs::is_file(path).map_err(|source| CliError::ReadSnapshot {
        path: path.to_path_buf(),
        source,
    })?;
    if !found {
        return Err(CliError::SnapshotNotFound {
            path: path.to_path_buf(),
        });
    }
    let json = teli_fs::read_to_string(path).map_err(|source| CliError::ReadSnapshot {
        path: path.to_path_buf(),
        source,
    })?;
    let snapshot =
        CollectionSnapshot::from_json(&json).map_err(|source| CliError::ParseSnapshot {
            path: path.to_path_buf(),
            source,
        })?;
    let report = snapshot.restore(store)?;
    write_line(
        out,
        &format!(
            "Imported {} item(s) and {} comparison(s), replacing {} item(s)",
            report.items, report.comparisons, report.replaced
        ),
    )
}
