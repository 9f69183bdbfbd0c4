//! Stateless sequence helpers.
//!
//! Each helper takes the sequence first and its extra argument second, so it
//! can be passed straight to `map_with`/`next_with`:
//!
//! ```
//! use stepchain::helpers::map_items;
//! use stepchain::SyncPipeline;
//!
//! let doubled = SyncPipeline::create(vec![1, 2, 3])
//!     .map_with(map_items, |x: i32| x * 2)
//!     .result()
//!     .unwrap();
//! assert_eq!(doubled, vec![2, 4, 6]);
//! ```

use std::iter::Sum;

/// Applies `f` to every item.
pub fn map_items<T, U, F>(items: Vec<T>, f: F) -> Vec<U>
where
    F: FnMut(T) -> U,
{
    items.into_iter().map(f).collect()
}

/// Applies a fallible `f` to every item, stopping at the first error.
///
/// # Errors
///
/// Returns the first error produced by `f`.
pub fn try_map_items<T, U, E, F>(items: Vec<T>, f: F) -> Result<Vec<U>, E>
where
    F: FnMut(T) -> Result<U, E>,
{
    items.into_iter().map(f).collect()
}

/// Keeps the items matching `predicate`.
pub fn filter_items<T, P>(items: Vec<T>, mut predicate: P) -> Vec<T>
where
    P: FnMut(&T) -> bool,
{
    items.into_iter().filter(|item| predicate(item)).collect()
}

/// Returns the first item matching `predicate`.
pub fn find_item<T, P>(items: Vec<T>, mut predicate: P) -> Option<T>
where
    P: FnMut(&T) -> bool,
{
    items.into_iter().find(|item| predicate(item))
}

/// Maps every item to a sequence and flattens the results.
pub fn flat_map_items<T, U, I, F>(items: Vec<T>, f: F) -> Vec<U>
where
    F: FnMut(T) -> I,
    I: IntoIterator<Item = U>,
{
    items.into_iter().flat_map(f).collect()
}

/// Folds the items into one value, starting from `init`.
pub fn fold_items<T, A, F>(items: Vec<T>, (init, f): (A, F)) -> A
where
    F: FnMut(A, T) -> A,
{
    items.into_iter().fold(init, f)
}

/// Sums the items.
pub fn sum_items<T: Sum<T>>(items: Vec<T>) -> T {
    items.into_iter().sum()
}

/// Keeps at most `count` leading items.
pub fn take_items<T>(mut items: Vec<T>, count: usize) -> Vec<T> {
    items.truncate(count);
    items
}

/// Sorts the items.
pub fn sort_items<T: Ord>(mut items: Vec<T>) -> Vec<T> {
    items.sort();
    items
}

/// Removes consecutive duplicates.
pub fn dedup_items<T: PartialEq>(mut items: Vec<T>) -> Vec<T> {
    items.dedup();
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SyncPipeline;

    #[test]
    fn test_map_items() {
        assert_eq!(map_items(vec![1, 2, 3], |x| x * 2), vec![2, 4, 6]);
    }

    #[test]
    fn test_try_map_items_stops_at_error() {
        let parsed: Result<Vec<i32>, _> = try_map_items(vec!["1", "x", "3"], str::parse::<i32>);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_filter_and_find() {
        assert_eq!(filter_items(vec![1, 2, 3, 4], |x| x % 2 == 0), vec![2, 4]);
        assert_eq!(find_item(vec![1, 2, 3], |x| *x > 1), Some(2));
        assert_eq!(find_item(vec![1, 2, 3], |x| *x > 5), None);
    }

    #[test]
    fn test_flat_map_and_fold() {
        assert_eq!(flat_map_items(vec![1, 2], |x| vec![x; 2]), vec![1, 1, 2, 2]);
        assert_eq!(fold_items(vec![1, 2, 3], (10, |acc: i32, x: i32| acc + x)), 16);
    }

    #[test]
    fn test_sum_take_sort_dedup() {
        assert_eq!(sum_items(vec![1, 2, 3]), 6);
        assert_eq!(take_items(vec![1, 2, 3], 2), vec![1, 2]);
        assert_eq!(take_items(vec![1], 5), vec![1]);
        assert_eq!(sort_items(vec![3, 1, 2]), vec![1, 2, 3]);
        assert_eq!(dedup_items(vec![1, 1, 2, 1]), vec![1, 2, 1]);
    }

    #[test]
    fn test_helpers_record_their_names() {
        let pipeline = SyncPipeline::create(vec![3, 1, 2, 2])
            .map(sort_items)
            .map(dedup_items)
            .map_with(take_items, 2)
            .map(sum_items);

        assert_eq!(
            pipeline.history().to_vec(),
            vec!["sort_items", "dedup_items", "take_items", "sum_items"]
        );
        assert_eq!(pipeline.result().unwrap(), 3);
    }

    #[test]
    fn test_try_map_items_as_fallible_step() {
        let error = SyncPipeline::create(vec!["1", "two"])
            .next_with(try_map_items, str::parse::<i32>)
            .result()
            .unwrap_err();

        assert_eq!(error.failed_step(), Some("try_map_items"));
        assert!(error.is::<std::num::ParseIntError>());
    }
}
