//! Choose which collection items a newcomer is compared against.
//!
//! Rather than sampling at random, the selector visits the extremes of the
//! ranking first and then bisects towards the middle, so a handful of
//! verdicts is enough to place a new item.

use crate::RankedItem;

/// Number of opponents selected when the caller does not override it.
pub const DEFAULT_MAX_COMPARISONS: usize = 5;

/// Pick at most `max_count` opponents from `existing`.
///
/// The collection is first ordered by rating, highest first, with equal
/// ratings keeping their relative order. Small collections are returned in
/// full. Larger ones contribute the top, bottom, median and both quartile
/// positions, in rank order.
///
/// # Examples
/// ```
/// use teli_core::{Rating, RankedItem, select_opponents};
///
/// let items: Vec<_> = (0..20)
///     .map(|i| RankedItem::new(i, Rating::new(1200 + 40 * i as i64)))
///     .collect();
/// let picked = select_opponents(&items, 5);
/// let ratings: Vec<_> = picked.iter().map(|item| item.rating.get()).collect();
/// assert_eq!(ratings, vec![1960, 1760, 1560, 1360, 1200]);
/// ```
#[must_use]
pub fn select_opponents(existing: &[RankedItem], max_count: usize) -> Vec<RankedItem> {
    let mut ranked = existing.to_vec();
    ranked.sort_by(|a, b| b.rating.cmp(&a.rating));

    if ranked.len() <= max_count {
        log::debug!("comparing against all {} items", ranked.len());
        return ranked;
    }

    let indices = bisection_indices(ranked.len(), max_count);
    log::debug!(
        "selected opponent ranks {indices:?} from {} items",
        ranked.len()
    );
    indices
        .into_iter()
        .filter_map(|index| ranked.get(index).cloned())
        .collect()
}

/// Rank positions visited for a collection of `total` items, ascending and
/// without duplicates.
///
/// # Examples
/// ```
/// use teli_core::bisection_indices;
///
/// assert_eq!(bisection_indices(20, 5), vec![0, 5, 10, 15, 19]);
/// assert_eq!(bisection_indices(20, 2), vec![0, 19]);
/// assert!(bisection_indices(0, 5).is_empty());
/// ```
#[must_use]
pub fn bisection_indices(total: usize, max_count: usize) -> Vec<usize> {
    let Some(last) = total.checked_sub(1) else {
        return Vec::new();
    };
    let positions = [
        0,
        last,
        total.div_euclid(2),
        total.div_euclid(4),
        total.saturating_mul(3).div_euclid(4),
    ];

    let mut indices: Vec<usize> = positions.into_iter().take(max_count).collect();
    indices.sort_unstable();
    indices.dedup();
    indices.truncate(max_count);
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rating;
    use rstest::{fixture, rstest};

    fn items(ratings: &[i64]) -> Vec<RankedItem> {
        ratings
            .iter()
            .zip(1..)
            .map(|(rating, id)| RankedItem::new(id, Rating::new(*rating)))
            .collect()
    }

    #[fixture]
    fn twenty() -> Vec<RankedItem> {
        items(&(0..20).map(|i| 1200 + 40 * i).collect::<Vec<i64>>())
    }

    #[rstest]
    fn empty_collection_yields_no_opponents() {
        assert!(select_opponents(&[], DEFAULT_MAX_COMPARISONS).is_empty());
    }

    #[rstest]
    fn small_collection_is_returned_whole_in_rank_order() {
        let picked = select_opponents(&items(&[1400, 1600, 1500]), 5);
        let ratings: Vec<_> = picked.iter().map(|item| item.rating.get()).collect();
        assert_eq!(ratings, vec![1600, 1500, 1400]);
    }

    #[rstest]
    fn large_collection_includes_both_extremes(twenty: Vec<RankedItem>) {
        let picked = select_opponents(&twenty, 5);
        assert_eq!(picked.len(), 5);
        let ratings: Vec<_> = picked.iter().map(|item| item.rating.get()).collect();
        assert!(ratings.contains(&1960));
        assert!(ratings.contains(&1200));
    }

    #[rstest]
    #[case(1, vec![1960])]
    #[case(2, vec![1960, 1200])]
    #[case(3, vec![1960, 1560, 1200])]
    #[case(4, vec![1960, 1760, 1560, 1200])]
    fn max_count_gates_positions(
        twenty: Vec<RankedItem>,
        #[case] max_count: usize,
        #[case] expected: Vec<i64>,
    ) {
        let picked = select_opponents(&twenty, max_count);
        let ratings: Vec<_> = picked.iter().map(|item| item.rating.get()).collect();
        assert_eq!(ratings, expected);
    }

    #[rstest]
    fn zero_max_count_selects_nothing(twenty: Vec<RankedItem>) {
        assert!(select_opponents(&twenty, 0).is_empty());
    }

    #[rstest]
    #[case(6, vec![0, 1, 3, 4, 5])]
    #[case(7, vec![0, 1, 3, 5, 6])]
    fn colliding_positions_are_deduplicated(#[case] total: usize, #[case] expected: Vec<usize>) {
        assert_eq!(bisection_indices(total, 5), expected);
    }

    #[rstest]
    fn equal_ratings_keep_input_order() {
        let picked = select_opponents(&items(&[1500, 1500, 1500]), 5);
        let ids: Vec<_> = picked.iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
