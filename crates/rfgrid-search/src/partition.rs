//! Stratified train/test partitioning.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::error::SearchError;

/// Disjoint, exhaustive train/test index sets, each in ascending order.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Partition {
    train: Vec<usize>,
    test: Vec<usize>,
}

impl Partition {
    /// Indices of the training records.
    #[must_use]
    pub fn train(&self) -> &[usize] {
        &self.train
    }

    /// Indices of the held-out test records.
    #[must_use]
    pub fn test(&self) -> &[usize] {
        &self.test
    }

    /// Gather the rows of `items` selected by the train indices.
    #[must_use]
    pub fn select_train<T: Clone>(&self, items: &[T]) -> Vec<T> {
        self.train.iter().map(|&i| items[i].clone()).collect()
    }

    /// Gather the rows of `items` selected by the test indices.
    #[must_use]
    pub fn select_test<T: Clone>(&self, items: &[T]) -> Vec<T> {
        self.test.iter().map(|&i| items[i].clone()).collect()
    }
}

/// Number of train slots per class for a train fraction.
///
/// Each class gets `floor(n_c * f)`; the slots left up to `ceil(n * f)` go to
/// the largest fractional remainders, ties to the lower class index.
fn allocate(class_sizes: &[usize], fraction: f64) -> Vec<usize> {
    let n: usize = class_sizes.iter().sum();
    // Absorbs products like 10 * 0.7 = 7.000000000000001.
    let target = ((n as f64) * fraction - 1e-9).ceil() as usize;

    let mut quotas: Vec<usize> = class_sizes
        .iter()
        .map(|&size| ((size as f64) * fraction).floor() as usize)
        .collect();
    let assigned: usize = quotas.iter().sum();

    let mut by_remainder: Vec<(usize, f64)> = class_sizes
        .iter()
        .enumerate()
        .map(|(class, &size)| (class, (size as f64) * fraction - quotas[class] as f64))
        .collect();
    by_remainder.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

    for &(class, _) in by_remainder.iter().take(target.saturating_sub(assigned)) {
        if quotas[class] < class_sizes[class] {
            quotas[class] += 1;
        }
    }
    quotas
}

/// Partition record indices into train and test sets, stratified by label.
///
/// Labels are class indices; classes absent from `labels` are skipped. The
/// same labels, fraction and seed always yield the same partition.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`SearchError::EmptyDataset`] | `labels` is empty |
/// | [`SearchError::InvalidSplitFraction`] | `fraction` not in (0, 1) |
/// | [`SearchError::EmptyPartition`] | Either side ends up with no records |
#[instrument(skip(labels), fields(n_records = labels.len()))]
pub fn stratified_split(labels: &[usize], fraction: f64, seed: u64) -> Result<Partition, SearchError> {
    if labels.is_empty() {
        return Err(SearchError::EmptyDataset);
    }
    if !(fraction > 0.0 && fraction < 1.0) {
        return Err(SearchError::InvalidSplitFraction { fraction });
    }

    let n_classes = labels.iter().max().copied().unwrap_or(0) + 1;
    let mut class_indices: Vec<Vec<usize>> = vec![vec![]; n_classes];
    for (i, &label) in labels.iter().enumerate() {
        class_indices[label].push(i);
    }

    let sizes: Vec<usize> = class_indices.iter().map(Vec::len).collect();
    let quotas = allocate(&sizes, fraction);

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();
    for (indices, quota) in class_indices.iter_mut().zip(quotas) {
        indices.shuffle(&mut rng);
        let (in_train, in_test) = indices.split_at(quota);
        train.extend_from_slice(in_train);
        test.extend_from_slice(in_test);
    }
    train.sort_unstable();
    test.sort_unstable();

    for (side, set) in [("train", &train), ("test", &test)] {
        if set.is_empty() {
            return Err(SearchError::EmptyPartition {
                side,
                n_records: labels.len(),
                fraction,
            });
        }
    }

    debug!(n_train = train.len(), n_test = test.len(), ?sizes, "stratified split");
    Ok(Partition { train, test })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passenger_labels() -> Vec<usize> {
        // 809 died and 500 survived, not sorted by label.
        let mut labels = vec![0; 809];
        labels.extend(vec![1; 500]);
        labels.rotate_left(300);
        labels
    }

    #[test]
    fn allocation_fills_ceiling() {
        // 809 * 0.7 = 566.3, 500 * 0.7 = 350, ceil(1309 * 0.7) = 917
        assert_eq!(allocate(&[809, 500], 0.7), vec![567, 350]);
    }

    #[test]
    fn allocation_ignores_float_rounding_in_target() {
        assert_eq!(allocate(&[5, 5], 0.7), vec![4, 3]);
        let labels = [0, 0, 0, 0, 0, 1, 1, 1, 1, 1];
        let p = stratified_split(&labels, 0.7, 42).unwrap();
        assert_eq!(p.train().len(), 7);
        assert_eq!(p.test().len(), 3);
    }

    #[test]
    fn allocation_ties_go_to_lower_class() {
        // 5 * 0.5 = 2.5 each, ceil(10 * 0.5) = 5 leaves one slot.
        assert_eq!(allocate(&[5, 5], 0.5), vec![3, 2]);
    }

    #[test]
    fn passenger_split_has_917_train_records() {
        let labels = passenger_labels();
        let split = stratified_split(&labels, 0.7, 42).unwrap();
        assert_eq!(split.train().len(), 917);
        assert_eq!(split.test().len(), 392);
        let train_died = split.train().iter().filter(|&&i| labels[i] == 0).count();
        assert_eq!(train_died, 567);
    }

    #[test]
    fn same_seed_same_split() {
        let labels = passenger_labels();
        let a = stratified_split(&labels, 0.7, 42).unwrap();
        let b = stratified_split(&labels, 0.7, 42).unwrap();
        assert_eq!(a, b);
        let c = stratified_split(&labels, 0.7, 43).unwrap();
        assert_ne!(a.train(), c.train());
    }

    #[test]
    fn select_gathers_rows() {
        let labels = vec![0, 1, 0, 1];
        let split = stratified_split(&labels, 0.5, 1).unwrap();
        let rows = ["a", "b", "c", "d"];
        let train = split.select_train(&rows);
        assert_eq!(train.len(), 2);
        assert_eq!(split.select_test(&rows).len(), 2);
    }

    #[test]
    fn rejects_bad_inputs() {
        assert!(matches!(
            stratified_split(&[], 0.7, 0),
            Err(SearchError::EmptyDataset)
        ));
        for fraction in [0.0, 1.0, -0.5, f64::NAN] {
            assert!(matches!(
                stratified_split(&[0, 1], fraction, 0),
                Err(SearchError::InvalidSplitFraction { .. })
            ));
        }
        assert!(matches!(
            stratified_split(&[0], 0.5, 0),
            Err(SearchError::EmptyPartition { side: "test", .. })
        ));
    }
}
