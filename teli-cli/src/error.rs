//! Error types emitted by the Teli CLI.
//!
//! Keep this error type reasonably small, as every command helper returns
//! `Result<_, CliError>`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use teli_core::{ItemId, RankingError, SnapshotError, SqliteStoreError};
use thiserror::Error;

/// Errors emitted by the Teli CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// The directory holding the collection database could not be created.
    #[error("failed to prepare database directory for {path:?}: {source}")]
    PrepareDatabase {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The collection store failed.
    #[error(transparent)]
    Store(#[from] SqliteStoreError),
    /// A ranking session rejected an operation.
    #[error(transparent)]
    Ranking(#[from] Box<RankingError<SqliteStoreError>>),
    /// A verdict token was not one of `1`, `=`, `2` or a spelled-out outcome.
    #[error("unrecognised verdict '{token}' (expected 1, = or 2)")]
    InvalidVerdict { token: String },
    /// Scripted verdicts ran out before every comparison was answered.
    #[error("ran out of verdicts after {supplied} comparison(s)")]
    VerdictsExhausted { supplied: usize },
    /// Interactive input closed before every comparison was answered.
    #[error("input closed while waiting for a verdict")]
    InputClosed,
    /// Reading interactive input failed.
    #[error("failed to read verdict: {0}")]
    ReadInput(#[source] std::io::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
    /// The requested item is not in the collection.
    #[error("item {id} is not in the collection")]
    UnknownItem { id: ItemId },
    /// Serialising command output failed.
    #[error("failed to serialise output: {0}")]
    Serialise(#[source] serde_json::Error),
    /// The import path does not name a file.
    #[error("snapshot {path:?} does not exist or is not a file")]
    SnapshotNotFound { path: Utf8PathBuf },
    /// Reading an import file failed.
    #[error("failed to read snapshot {path:?}: {source}")]
    ReadSnapshot {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// An import file did not hold a usable snapshot.
    #[error("invalid snapshot {path:?}: {source}")]
    ParseSnapshot {
        path: Utf8PathBuf,
        #[source]
        source: SnapshotError,
    },
    /// Writing an export file failed.
    #[error("failed to write snapshot {path:?}: {source}")]
    WriteSnapshot {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<RankingError<SqliteStoreError>> for CliError {
    fn from(err: RankingError<SqliteStoreError>) -> Self {
        Self::Ranking(Box::new(err))
    }
}
