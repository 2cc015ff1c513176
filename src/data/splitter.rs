// ============================================================
// Layer 4 - Train/Test Splitter
// ============================================================
// Randomly shuffles samples and splits them into two sets:
//   - Training set: used to fit every classifier
//   - Test set:     held out, used only for scoring
//
// The shuffle is seeded (ChaCha8) so every classifier in a run,
// and every run with the same config, sees the same split.
// The test side gets ceil(n * test_fraction) items, the rest
// goes to training.
//
// Stacking also needs k-fold cross validation on the training
// set. `stratified_folds` keeps the spam/ham ratio roughly equal
// in every fold: each class is cut into k contiguous blocks in
// input order and block i goes to fold i. No shuffling.
//
// Reference: rand / rand_chacha crate documentation

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Seeded shuffle of `0..n`, then (train_indices, test_indices).
pub fn split_indices(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut idx: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    idx.shuffle(&mut rng);

    let n_test = ((n as f64) * test_fraction.clamp(0.0, 1.0)).ceil() as usize;
    let n_test = n_test.min(n);
    let test   = idx.split_off(n - n_test);

    tracing::debug!(
        "Dataset split: {} training, {} test (seed {})",
        idx.len(),
        test.len(),
        seed
    );

    (idx, test)
}

/// Shuffle `samples` with `seed` and split into (train, test).
pub fn split_train_test<T>(samples: Vec<T>, test_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let (train_idx, test_idx) = split_indices(samples.len(), test_fraction, seed);

    let mut slots: Vec<Option<T>> = samples.into_iter().map(Some).collect();
    let train = train_idx.iter().filter_map(|&i| slots[i].take()).collect();
    let test  = test_idx.iter().filter_map(|&i| slots[i].take()).collect();
    (train, test)
}

/// One cross-validation fold: rows to fit on and rows to predict.
#[derive(Debug, Clone)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test:  Vec<usize>,
}

/// k stratified folds over `labels` (0/1). k is clamped to [2, n].
pub fn stratified_folds(labels: &[u8], k: usize) -> Vec<Fold> {
    let n = labels.len();
    let k = k.clamp(2, n.max(2));
    let mut fold_of = vec![0usize; n];

    for class in [0u8, 1u8] {
        let members: Vec<usize> = (0..n).filter(|&i| labels[i] == class).collect();
        let m = members.len();
        // first (m % k) folds get one extra member
        let base  = m / k;
        let extra = m % k;
        let mut pos = 0;
        for fold in 0..k {
            let size = base + usize::from(fold < extra);
            for &i in &members[pos..pos + size] {
                fold_of[i] = fold;
            }
            pos += size;
        }
    }

    (0..k)
        .map(|fold| Fold {
            train: (0..n).filter(|&i| fold_of[i] != fold).collect(),
            test:  (0..n).filter(|&i| fold_of[i] == fold).collect(),
        })
        .collect()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let (train, test)     = split_train_test(items, 0.2, 2);
        assert_eq!(train.len(), 80);
        assert_eq!(test.len(),  20);
    }

    #[test]
    fn test_test_side_rounds_up() {
        let (train, test) = split_indices(11, 0.2, 7);
        assert_eq!(test.len(), 3);
        assert_eq!(train.len(), 8);
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
    fn test_same_seed_same_split() {
        let a = split_indices(40, 0.2, 2);
        let b = split_indices(40, 0.2, 2);
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_dataset() {
        let items: Vec<usize> = Vec::new();
        let (train, test)     = split_train_test(items, 0.2, 2);
        assert!(train.is_empty());
        assert!(test.is_empty());
    }

    #[test]
    fn test_stratified_folds_cover_everything_once() {
        let labels = [0, 0, 0, 0, 0, 0, 1, 1, 1, 1];
        let folds  = stratified_folds(&labels, 2);
        assert_eq!(folds.len(), 2);

        let mut seen: Vec<usize> = folds.iter().flat_map(|f| f.test.clone()).collect();
        seen.sort();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());

        for f in &folds {
            let spam = f.test.iter().filter(|&&i| labels[i] == 1).count();
            assert_eq!(spam, 2);
            assert_eq!(f.train.len() + f.test.len(), 10);
        }
    }
}
