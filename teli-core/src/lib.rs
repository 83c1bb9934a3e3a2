//! Core ranking engine for Teli.
//!
//! Items enter a collection through a [`RankingSession`]: a seed rating is
//! derived from the user's first impression, a handful of opponents is chosen
//! by bisecting the current ranking, and each pairwise verdict moves both
//! ratings. Scores on the 1–10 display scale are projected from ratings on
//! every read and never stored.
//!
//! Persistence is abstracted behind [`CollectionStore`]; the `store-sqlite`
//! feature provides a SQLite implementation.

#![forbid(unsafe_code)]

mod curated;
mod item;
mod outcome;
mod preference;
mod profile;
mod rating;
mod score;
mod selector;
mod session;
#[cfg(feature = "serde")]
mod snapshot;
mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use curated::{
    CURATED_LIST_LIMIT, CURATED_MIN_ITEMS, CuratedList, CuratedTheme, REWATCHABLE_TAG,
    TOP_RATED_MIN_ITEMS, curated_lists,
};
pub use item::{Candidate, ItemId, ItemMetadata, RankedItem};
pub use outcome::{ComparisonOutcome, ComparisonRecord, ParseOutcomeError};
pub use preference::{ParsePreferenceError, Preference};
pub use profile::{
    DecadePreference, FAVOURITE_GENRE_LIMIT, GENRE_PREFERENCE_LIMIT, GenreCount, GenrePreference,
    RECENTLY_ADDED_LIMIT, ScoreDistribution, TOP_GENRE_LIMIT, TOP_RATED_LIMIT, TasteProfile,
    top_genres,
};
pub use rating::{Rating, RatingModel, expected_outcome};
pub use score::{
    MAX_SCORE, MIN_SCORE, SINGLE_ITEM_SCORE, ScoreClass, ScoredItem, confidence, project_scores,
    rating_bounds, rating_to_score,
};
pub use selector::{DEFAULT_MAX_COMPARISONS, bisection_indices, select_opponents};
pub use session::{CommitReport, RankingError, RankingSession, SessionConfig, SessionState};
#[cfg(feature = "serde")]
pub use snapshot::{CollectionSnapshot, RestoreReport, SNAPSHOT_VERSION, SnapshotError};
pub use store::CollectionStore;
#[cfg(feature = "store-sqlite")]
pub use store::{SqliteCollectionStore, SqliteStoreError};
