// ============================================================
// Layer 4 — Train/Test Splitter
// ============================================================
// Shuffles tagged records and holds a fixed fraction back for
// evaluation:
//   - Training set: fitted by the classifier / regressors
//   - Test set:     used only for the quality report
//
// The shuffle is seeded, so the same corpus and seed always give
// the same split and the same reported metrics.
//
// The test size is rounded up (20% of 6 records → 2 records), so
// any non-zero fraction on a non-trivial corpus holds out at least
// one record.
//
// Uses Fisher-Yates shuffle via rand::seq::SliceRandom.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffle `samples` with `seed` and split into (train, test).
///
/// # Arguments
/// * `samples`       - All available samples (consumed by this function)
/// * `test_fraction` - Proportion held back, e.g. 0.2 = 20%
/// * `seed`          - Shuffle seed
///
/// # Example
/// ```
/// use precedent_predictor::data::splitter::split_train_test;
/// let (train, test) = split_train_test((0..10).collect::<Vec<u32>>(), 0.2, 42);
/// assert_eq!((train.len(), test.len()), (8, 2));
/// ```
pub fn split_train_test<T>(mut samples: Vec<T>, test_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total     = samples.len();
    let fraction  = test_fraction.clamp(0.0, 1.0);
    let test_size = ((total as f64) * fraction).ceil() as usize;
    let split_at  = total - test_size.min(total);

    // split_off(n) leaves [0..n) in `samples` and returns [n..total)
    let test = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} train, {} test (seed {})",
        samples.len(),
        test.len(),
        seed,
    );

    (samples, test)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let (train, test)     = split_train_test(items, 0.2, 42);
        assert_eq!(train.len(), 80);
        assert_eq!(test.len(),  20);
    }

    #[test]
    fn test_test_size_rounds_up() {
        let items: Vec<usize> = (0..6).collect();
        let (train, test)     = split_train_test(items, 0.2, 42);
        assert_eq!(train.len(), 4);
        assert_eq!(test.len(),  2);
    }

    #[test]
    fn test_same_seed_same_split() {
        let a = split_train_test((0..50).collect::<Vec<usize>>(), 0.3, 7);
        let b = split_train_test((0..50).collect::<Vec<usize>>(), 0.3, 7);
        assert_eq!(a, b);
    }

    #[test]
    fn test_all_items_preserved() {
        let items: Vec<usize> = (0..50).collect();
        let (train, test)     = split_train_test(items, 0.3, 1);
        let mut all: Vec<usize> = train.into_iter().chain(test).collect();
        all.sort();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_dataset() {
        let (train, test) = split_train_test(Vec::<usize>::new(), 0.2, 42);
        assert!(train.is_empty());
        assert!(test.is_empty());
    }

    #[test]
    fn test_zero_fraction_keeps_everything_for_training() {
        let (train, test) = split_train_test((0..10).collect::<Vec<usize>>(), 0.0, 42);
        assert_eq!(train.len(), 10);
        assert!(test.is_empty());
    }
}
