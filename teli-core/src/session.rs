//! Sequence one item through its comparisons and into the collection.
//!
//! A [`RankingSession`] is a plain value. It borrows the store only for the
//! duration of each step, so callers are free to suspend between verdicts
//! while the user makes up their mind. Each processed verdict writes the
//! opponent's new rating straight to the store; nothing is rolled back if the
//! session is later abandoned.

use thiserror::Error;

use crate::item::unix_timestamp;
use crate::{
    Candidate, CollectionStore, ComparisonOutcome, ComparisonRecord, DEFAULT_MAX_COMPARISONS,
    ItemId, Preference, RankedItem, Rating, RatingModel, select_opponents,
};

/// Errors raised while driving a [`RankingSession`].
#[derive(Debug, Error)]
pub enum RankingError<E>
where
    E: std::error::Error + 'static,
{
    /// The candidate already has a rating in the collection.
    #[error("item {id} is already in the collection")]
    AlreadyRanked {
        /// Identifier of the duplicate item.
        id: ItemId,
    },
    /// The item to re-compare is not in the collection.
    #[error("item {id} is not in the collection")]
    UnknownItem {
        /// Identifier that was looked up.
        id: ItemId,
    },
    /// A verdict was submitted but every opponent has been compared.
    #[error("no comparison is pending")]
    NoPendingComparison,
    /// Commit was requested before every opponent was compared.
    #[error("{remaining} comparison(s) still pending")]
    ComparisonsPending {
        /// Number of opponents not yet compared.
        remaining: usize,
    },
    /// The session has already committed its item.
    #[error("session has already been committed")]
    AlreadyCommitted,
    /// The collection store rejected an operation.
    #[error("failed to {operation}: {source}")]
    Storage {
        /// Store operation that failed.
        operation: &'static str,
        /// Error reported by the store.
        #[source]
        source: E,
    },
}

impl<E> RankingError<E>
where
    E: std::error::Error + 'static,
{
    fn storage(operation: &'static str) -> impl FnOnce(E) -> Self {
        move |source| Self::Storage { operation, source }
    }
}

/// Tunables shared by every session over a collection.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionConfig {
    /// Rating constants.
    pub model: RatingModel,
    /// Upper bound on opponents per session.
    pub max_comparisons: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model: RatingModel::default(),
            max_comparisons: DEFAULT_MAX_COMPARISONS,
        }
    }
}

/// Where a session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the verdict on opponent `index` of `total`.
    Comparing {
        /// Zero-based position of the pending opponent.
        index: usize,
        /// Number of selected opponents.
        total: usize,
    },
    /// Every verdict is in; the item can be committed.
    Committing,
    /// The item has been written to the collection.
    Done,
}

/// Outcome of a successful commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReport {
    /// The item as written to the collection.
    pub item: RankedItem,
    /// Number of comparisons the item went through.
    pub comparisons: usize,
    /// Whether the item was taken off the watchlist.
    pub removed_from_watchlist: bool,
}

/// State machine for adding or re-comparing one item.
///
/// # Examples
///
/// ```
/// use teli_core::{
///     Candidate, ComparisonOutcome, Preference, RankedItem, Rating, RankingSession,
///     SessionConfig, SessionState,
/// };
///
/// let collection = [RankedItem::new(1, Rating::new(1600))];
/// let mut session = RankingSession::seed(
///     &SessionConfig::default(),
///     Candidate::new(2),
///     Preference::Disliked,
///     &collection,
/// );
/// assert_eq!(session.seed_rating().get(), 1500);
/// assert_eq!(session.state(), SessionState::Comparing { index: 0, total: 1 });
///
/// let (new, opponent) = session.apply(ComparisonOutcome::PreferNew).unwrap();
/// assert_eq!((new.get(), opponent.get()), (1551, 1549));
/// assert_eq!(session.state(), SessionState::Committing);
/// ```
#[derive(Debug, Clone)]
pub struct RankingSession {
    model: RatingModel,
    candidate: Candidate,
    preference: Preference,
    seed: Rating,
    rating: Rating,
    opponents: Vec<RankedItem>,
    next: usize,
    committed: bool,
    added_at: Option<u64>,
}

impl RankingSession {
    /// Start ranking `candidate` against the collection held by `store`.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::AlreadyRanked`] when the candidate is already
    /// in the collection, or [`RankingError::Storage`] when the collection
    /// cannot be read.
    pub fn begin<S>(
        store: &S,
        config: &SessionConfig,
        candidate: Candidate,
        preference: Preference,
    ) -> Result<Self, RankingError<S::Error>>
    where
        S: CollectionStore + ?Sized,
    {
        let collection = store
            .load_all()
            .map_err(RankingError::storage("load collection"))?;
        if collection.iter().any(|item| item.id == candidate.id) {
            return Err(RankingError::AlreadyRanked { id: candidate.id });
        }
        Ok(Self::seed(config, candidate, preference, &collection))
    }

    /// Remove `id` from the collection and start ranking it afresh.
    ///
    /// The item keeps its metadata and original `added_at`, and is seeded
    /// from its last-known preference, or [`Preference::Fine`] when none was
    /// recorded. Dropping
    /// the returned session without committing leaves the item out of the
    /// collection.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::UnknownItem`] when `id` is not in the
    /// collection, or [`RankingError::Storage`] when reading or removing
    /// fails.
    pub fn recompare<S>(
        store: &mut S,
        config: &SessionConfig,
        id: ItemId,
    ) -> Result<Self, RankingError<S::Error>>
    where
        S: CollectionStore + ?Sized,
    {
        let mut collection = store
            .load_all()
            .map_err(RankingError::storage("load collection"))?;
        let position = collection
            .iter()
            .position(|item| item.id == id)
            .ok_or(RankingError::UnknownItem { id })?;
        store
            .remove(id)
            .map_err(RankingError::storage("remove item"))?;
        let item = collection.remove(position);
        let preference = item.preference.unwrap_or_default();
        let added_at = item.added_at;
        log::debug!("re-comparing item {id} (was {})", item.rating);
        let mut session = Self::seed(config, Candidate::from(item), preference, &collection);
        session.added_at = added_at;
        Ok(session)
    }

    /// Build a session from an already loaded collection without touching
    /// any store.
    #[must_use]
    pub fn seed(
        config: &SessionConfig,
        candidate: Candidate,
        preference: Preference,
        collection: &[RankedItem],
    ) -> Self {
        let seed = config
            .model
            .initial_rating(preference, collection.iter().map(|item| item.rating));
        let opponents = select_opponents(collection, config.max_comparisons);
        log::debug!(
            "seeded item {} at {seed} ({preference}); {} opponent(s)",
            candidate.id,
            opponents.len()
        );
        Self {
            model: config.model,
            candidate,
            preference,
            seed,
            rating: seed,
            opponents,
            next: 0,
            committed: false,
            added_at: None,
        }
    }

    /// Current position in the state machine.
    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.committed {
            SessionState::Done
        } else if self.next < self.opponents.len() {
            SessionState::Comparing {
                index: self.next,
                total: self.opponents.len(),
            }
        } else {
            SessionState::Committing
        }
    }

    /// The opponent awaiting a verdict, if any.
    #[must_use]
    pub fn current_opponent(&self) -> Option<&RankedItem> {
        if self.committed {
            return None;
        }
        self.opponents.get(self.next)
    }

    /// Selected opponents with their latest ratings, in rank order.
    #[must_use]
    pub fn opponents(&self) -> &[RankedItem] {
        &self.opponents
    }

    /// Number of verdicts still required before committing.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.opponents.len().saturating_sub(self.next)
    }

    /// Working rating of the item being ranked.
    #[must_use]
    pub const fn rating(&self) -> Rating {
        self.rating
    }

    /// Rating the item started from.
    #[must_use]
    pub const fn seed_rating(&self) -> Rating {
        self.seed
    }

    /// Preference used for seeding.
    #[must_use]
    pub const fn preference(&self) -> Preference {
        self.preference
    }

    /// The item being ranked.
    #[must_use]
    pub const fn candidate(&self) -> &Candidate {
        &self.candidate
    }

    /// Apply a verdict to the pending pair without persisting anything.
    ///
    /// Returns the new ratings of the candidate and the opponent, or `None`
    /// when no opponent is waiting.
    pub fn apply(&mut self, outcome: ComparisonOutcome) -> Option<(Rating, Rating)> {
        let (_, new_rating, opponent_rating) = self.pending_update(outcome)?;
        self.advance(new_rating, opponent_rating);
        Some((new_rating, opponent_rating))
    }

    /// Apply a verdict and write the opponent's new rating to `store`.
    ///
    /// The comparison is also offered to the store's comparison log; a
    /// failure there is logged and otherwise ignored. When the rating write
    /// fails the session stays on the same opponent.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::NoPendingComparison`] when no opponent is
    /// waiting, or [`RankingError::Storage`] when the rating write fails.
    pub fn submit<S>(
        &mut self,
        store: &mut S,
        outcome: ComparisonOutcome,
    ) -> Result<SessionState, RankingError<S::Error>>
    where
        S: CollectionStore + ?Sized,
    {
        let (opponent_id, new_rating, opponent_rating) = self
            .pending_update(outcome)
            .ok_or(RankingError::NoPendingComparison)?;
        store
            .upsert_rating(opponent_id, opponent_rating)
            .map_err(RankingError::storage("update opponent rating"))?;

        let record = ComparisonRecord {
            new_item: self.candidate.id,
            existing_item: opponent_id,
            outcome,
        };
        if let Err(err) = store.record_comparison(&record) {
            log::warn!("failed to log comparison {} vs {opponent_id}: {err}", self.candidate.id);
        }

        self.advance(new_rating, opponent_rating);
        Ok(self.state())
    }

    /// Write the ranked item to `store`.
    ///
    /// A new item is stamped with the current time as its `added_at`. The
    /// item is also taken off the watchlist; failing to do so is logged
    /// and reported as not removed.
    ///
    /// # Errors
    ///
    /// Returns [`RankingError::ComparisonsPending`] when verdicts are still
    /// outstanding, [`RankingError::AlreadyCommitted`] on a second commit, or
    /// [`RankingError::Storage`] when the append fails.
    pub fn commit<S>(&mut self, store: &mut S) -> Result<CommitReport, RankingError<S::Error>>
    where
        S: CollectionStore + ?Sized,
    {
        match self.state() {
            SessionState::Done => return Err(RankingError::AlreadyCommitted),
            SessionState::Comparing { .. } => {
                return Err(RankingError::ComparisonsPending {
                    remaining: self.remaining(),
                });
            }
            SessionState::Committing => {}
        }

        let item = RankedItem {
            id: self.candidate.id,
            rating: self.rating,
            preference: Some(self.preference),
            metadata: self.candidate.metadata.clone(),
            added_at: self.added_at.or_else(unix_timestamp),
        };
        store
            .append(item.clone())
            .map_err(RankingError::storage("append item"))?;
        self.committed = true;

        let removed_from_watchlist = store.remove_from_watchlist(item.id).unwrap_or_else(|err| {
            log::warn!("failed to clear item {} from the watchlist: {err}", item.id);
            false
        });
        log::debug!(
            "committed item {} at {} after {} comparison(s)",
            item.id,
            item.rating,
            self.next
        );

        Ok(CommitReport {
            item,
            comparisons: self.next,
            removed_from_watchlist,
        })
    }

    fn pending_update(&self, outcome: ComparisonOutcome) -> Option<(ItemId, Rating, Rating)> {
        let opponent = self.current_opponent()?;
        let (new_rating, opponent_rating) =
            self.model
                .update_ratings(self.rating, opponent.rating, outcome);
        log::debug!(
            "{outcome}: item {} {} -> {new_rating}, item {} {} -> {opponent_rating}",
            self.candidate.id,
            self.rating,
            opponent.id,
            opponent.rating
        );
        Some((opponent.id, new_rating, opponent_rating))
    }

    fn advance(&mut self, new_rating: Rating, opponent_rating: Rating) {
        if let Some(opponent) = self.opponents.get_mut(self.next) {
            opponent.rating = opponent_rating;
        }
        self.rating = new_rating;
        self.next = self.next.saturating_add(1);
    }
}
