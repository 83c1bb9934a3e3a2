//! Facade crate for the Teli ranking engine.
//!
//! This crate re-exports the core domain types and exposes the SQLite store
//! and snapshot support behind feature flags.

#![forbid(unsafe_code)]

pub use teli_core::{
    Candidate, CollectionStore, CommitReport, ComparisonOutcome, ComparisonRecord, CuratedList,
    CuratedTheme, DEFAULT_MAX_COMPARISONS, ItemId, ItemMetadata, Preference, RankedItem,
    RankingError, RankingSession, Rating, RatingModel, ScoreClass, ScoredItem, SessionConfig,
    SessionState, TasteProfile, confidence, curated_lists, expected_outcome, project_scores,
    rating_to_score, select_opponents,
};

#[cfg(feature = "serde")]
pub use teli_core::{CollectionSnapshot, RestoreReport, SnapshotError};

#[cfg(feature = "store-sqlite")]
pub use teli_core::{SqliteCollectionStore, SqliteStoreError};

#[cfg(feature = "test-support")]
pub use teli_core::test_support;
