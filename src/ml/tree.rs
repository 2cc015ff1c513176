// ============================================================
// Layer 5 - Decision Trees
// ============================================================
// One CART grower shared by every tree model in the zoo. Each
// training row carries a NodeStat; a node's statistic is the
// sum over its rows, and a criterion turns statistics into a
// split score and a leaf value:
//
//   Criterion      NodeStat per row          score(node)
//   ─────────      ────────────────          ───────────
//   Gini           sum = w·y,  count = w     (S₁² + S₀²) / W
//   LeastSquares   sum = r,    count = 1     (Σr)² / n
//   Newton         sum = y−p,  hess = p(1−p) (Σg)² / (Σh + λ)
//
// A split is worth taking when score(left) + score(right) −
// score(parent) is positive. For Gini that difference is the
// drop in weighted Gini impurity.
//
// Sparse-aware split search: a node only looks at the nonzero
// entries of its rows. For each feature those entries are
// sorted by value and every row without an entry joins one
// implicit zero block, so features that are zero everywhere in
// the node are never touched.
//
// Thresholds sit half way between consecutive distinct values
// (rows with x ≤ threshold go left). With `random_thresholds`
// one threshold per feature is drawn uniformly between the
// node's min and max instead (extra trees).
//
// Reference: Breiman et al. (1984), "Classification and
//            Regression Trees"
//            Geurts, Ernst & Wehenkel (2006), "Extremely
//            Randomized Trees"

use ndarray::{Array1, ArrayView2};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::classifier::{check_training, check_width, Classifier};
use super::sparse::{SparseRow, SparseRows};
use super::ModelError;

const MIN_GAIN_PER_WEIGHT: f64 = 1e-12;

// ─── Node statistics and criteria ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NodeStat {
    pub sum:   f64,
    pub hess:  f64,
    pub count: f64,
}

impl NodeStat {
    fn add(&mut self, other: &NodeStat) {
        self.sum   += other.sum;
        self.hess  += other.hess;
        self.count += other.count;
    }

    fn minus(&self, other: &NodeStat) -> NodeStat {
        NodeStat {
            sum:   self.sum - other.sum,
            hess:  self.hess - other.hess,
            count: self.count - other.count,
        }
    }
}

/// Per-row statistics for a weighted classification tree
pub fn class_stats(y: &[u8], weights: &[f64]) -> Vec<NodeStat> {
    y.iter()
        .zip(weights)
        .map(|(&label, &w)| NodeStat { sum: w * f64::from(label), hess: 0.0, count: w })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Criterion {
    Gini,
    LeastSquares,
    Newton { lambda: f64, min_child_weight: f64 },
}

impl Criterion {
    fn score(&self, s: &NodeStat) -> f64 {
        match *self {
            Criterion::Gini => {
                if s.count <= 0.0 {
                    0.0
                } else {
                    let neg = s.count - s.sum;
                    (s.sum * s.sum + neg * neg) / s.count
                }
            }
            Criterion::LeastSquares => {
                if s.count <= 0.0 { 0.0 } else { s.sum * s.sum / s.count }
            }
            Criterion::Newton { lambda, .. } => s.sum * s.sum / (s.hess + lambda),
        }
    }

    fn child_ok(&self, s: &NodeStat) -> bool {
        match *self {
            Criterion::Newton { min_child_weight, .. } => s.hess >= min_child_weight,
            _ => s.count > 0.0,
        }
    }

    fn leaf_value(&self, s: &NodeStat) -> f64 {
        match *self {
            Criterion::Gini => {
                if s.count <= 0.0 { 0.0 } else { s.sum / s.count }
            }
            // one Newton step for the log-loss
            Criterion::LeastSquares => {
                if s.hess.abs() < 1e-150 { 0.0 } else { s.sum / s.hess }
            }
            Criterion::Newton { lambda, .. } => s.sum / (s.hess + lambda),
        }
    }

    fn is_pure(&self, s: &NodeStat) -> bool {
        match *self {
            Criterion::Gini => s.sum <= 1e-12 * s.count || s.sum >= (1.0 - 1e-12) * s.count,
            _ => false,
        }
    }
}

// ─── Tree growth ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowParams {
    pub criterion:         Criterion,
    pub max_depth:         Option<usize>,
    /// features examined per split; None = all
    pub max_features:      Option<usize>,
    pub random_thresholds: bool,
    pub min_samples_split: usize,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf { value: f64 },
    Split { feature: usize, threshold: f64, left: usize, right: usize },
}

#[derive(Debug, Clone, Copy)]
struct SplitChoice {
    feature:   usize,
    threshold: f64,
    gain:      f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
}

struct Grower<'a> {
    data:   &'a SparseRows,
    stats:  &'a [NodeStat],
    params: &'a GrowParams,
    /// (feature, value, row) for the node being split
    entries: Vec<(usize, f64, usize)>,
    points:  Vec<(f64, NodeStat)>,
}

impl Tree {
    /// Grow a tree on the rows listed in `sample`.
    pub fn grow(
        data:   &SparseRows,
        stats:  &[NodeStat],
        sample: Vec<usize>,
        params: &GrowParams,
        rng:    &mut ChaCha8Rng,
    ) -> Tree {
        let mut grower = Grower {
            data,
            stats,
            params,
            entries: Vec::new(),
            points:  Vec::new(),
        };

        let mut nodes = vec![Node::Leaf { value: 0.0 }];
        let mut stack = vec![(0usize, sample, 0usize)];

        while let Some((slot, rows, depth)) = stack.pop() {
            let total = rows.iter().fold(NodeStat::default(), |mut acc, &r| {
                acc.add(&stats[r]);
                acc
            });
            let leaf = Node::Leaf { value: params.criterion.leaf_value(&total) };

            let can_split = rows.len() >= params.min_samples_split.max(2)
                && params.max_depth.map_or(true, |d| depth < d)
                && !params.criterion.is_pure(&total);

            let choice = if can_split { grower.find_split(&rows, &total, rng) } else { None };

            let Some(choice) = choice else {
                nodes[slot] = leaf;
                continue;
            };

            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
                .iter()
                .partition(|&&r| data.row(r).get(choice.feature) <= choice.threshold);

            let left  = nodes.len();
            let right = left + 1;
            nodes.push(Node::Leaf { value: 0.0 });
            nodes.push(Node::Leaf { value: 0.0 });
            nodes[slot] = Node::Split {
                feature:   choice.feature,
                threshold: choice.threshold,
                left,
                right,
            };

            stack.push((right, right_rows, depth + 1));
            stack.push((left, left_rows, depth + 1));
        }

        Tree { nodes }
    }

    pub fn predict_row(&self, row: SparseRow<'_>) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return *value,
                Node::Split { feature, threshold, left, right } => {
                    idx = if row.get(*feature) <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn predict(&self, rows: &SparseRows) -> Vec<f64> {
        (0..rows.n_rows()).map(|i| self.predict_row(rows.row(i))).collect()
    }

    /// Multiply every leaf value by `factor`
    pub fn scale(&mut self, factor: f64) {
        for node in &mut self.nodes {
            if let Node::Leaf { value } = node {
                *value *= factor;
            }
        }
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| matches!(n, Node::Leaf { .. })).count()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

impl<'a> Grower<'a> {
    fn find_split(
        &mut self,
        rows:  &[usize],
        total: &NodeStat,
        rng:   &mut ChaCha8Rng,
    ) -> Option<SplitChoice> {
        self.entries.clear();
        for &r in rows {
            for (f, v) in self.data.row(r).iter() {
                self.entries.push((f, v, r));
            }
        }
        self.entries
            .sort_unstable_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)).then(a.2.cmp(&b.2)));

        // (feature, start, end) ranges into `entries`
        let mut groups = Vec::new();
        let mut start = 0;
        for k in 1..=self.entries.len() {
            if k == self.entries.len() || self.entries[k].0 != self.entries[start].0 {
                groups.push((self.entries[start].0, start, k));
                start = k;
            }
        }

        if self.params.max_features.is_some() || self.params.random_thresholds {
            groups.shuffle(rng);
        }
        let limit = self.params.max_features.unwrap_or(usize::MAX);

        let mut best: Option<SplitChoice> = None;
        let mut visited = 0;

        for &(feature, start, end) in &groups {
            if visited >= limit {
                break;
            }
            let n_zero = rows.len() - (end - start);
            let first  = self.entries[start].1;
            let last   = self.entries[end - 1].1;
            if n_zero == 0 && first == last {
                // constant in this node
                continue;
            }
            visited += 1;

            self.collect_points(start, end, n_zero, total);
            let found = if self.params.random_thresholds {
                self.random_split(feature, total, rng)
            } else {
                self.best_split(feature, total)
            };

            if let Some(candidate) = found {
                if best.map_or(true, |b| candidate.gain > b.gain) {
                    best = Some(candidate);
                }
            }
        }

        let min_gain = MIN_GAIN_PER_WEIGHT * total.count.abs().max(1.0);
        best.filter(|b| b.gain > min_gain)
    }

    /// Sorted (value, stat) points of one feature, zero block included
    fn collect_points(&mut self, start: usize, end: usize, n_zero: usize, total: &NodeStat) {
        let slice = &self.entries[start..end];
        self.points.clear();

        let mut nonzero = NodeStat::default();
        for &(_, _, r) in slice {
            nonzero.add(&self.stats[r]);
        }

        let split_at = slice.partition_point(|e| e.1 < 0.0);
        for &(_, v, r) in &slice[..split_at] {
            self.points.push((v, self.stats[r]));
        }
        if n_zero > 0 {
            self.points.push((0.0, total.minus(&nonzero)));
        }
        for &(_, v, r) in &slice[split_at..] {
            self.points.push((v, self.stats[r]));
        }
    }

    fn best_split(&self, feature: usize, total: &NodeStat) -> Option<SplitChoice> {
        let criterion    = &self.params.criterion;
        let parent_score = criterion.score(total);
        let mut left     = NodeStat::default();
        let mut best: Option<SplitChoice> = None;

        for k in 0..self.points.len() - 1 {
            left.add(&self.points[k].1);
            let (v, next) = (self.points[k].0, self.points[k + 1].0);
            if v == next {
                continue;
            }
            let right = total.minus(&left);
            if !criterion.child_ok(&left) || !criterion.child_ok(&right) {
                continue;
            }

            let gain = criterion.score(&left) + criterion.score(&right) - parent_score;
            if best.map_or(true, |b| gain > b.gain) {
                let mut threshold = v + (next - v) / 2.0;
                if threshold >= next {
                    threshold = v;
                }
                best = Some(SplitChoice { feature, threshold, gain });
            }
        }
        best
    }

    fn random_split(&self, feature: usize, total: &NodeStat, rng: &mut ChaCha8Rng) -> Option<SplitChoice> {
        let criterion = &self.params.criterion;
        let min = self.points.first()?.0;
        let max = self.points.last()?.0;
        if min >= max {
            return None;
        }
        let threshold = rng.gen_range(min..max);

        let mut left = NodeStat::default();
        for (v, s) in &self.points {
            if *v > threshold {
                break;
            }
            left.add(s);
        }
        let right = total.minus(&left);
        if !criterion.child_ok(&left) || !criterion.child_ok(&right) {
            return None;
        }

        let gain = criterion.score(&left) + criterion.score(&right) - criterion.score(total);
        Some(SplitChoice { feature, threshold, gain })
    }
}

// ─── Single-tree classifier ───────────────────────────────────────────────────

/// How many features a split may look at
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MaxFeatures {
    All,
    Sqrt,
}

impl MaxFeatures {
    pub fn resolve(&self, n_features: usize) -> Option<usize> {
        match self {
            MaxFeatures::All  => None,
            MaxFeatures::Sqrt => Some(((n_features as f64).sqrt() as usize).max(1)),
        }
    }
}

/// Decision tree configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// None grows until leaves are pure
    pub max_depth:         Option<usize>,
    pub max_features:      MaxFeatures,
    pub random_thresholds: bool,
    pub min_samples_split: usize,
    pub seed:              u64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth:         None,
            max_features:      MaxFeatures::All,
            random_thresholds: false,
            min_samples_split: 2,
            seed:              42,
        }
    }
}

impl TreeConfig {
    pub fn grow_params(&self, n_features: usize) -> GrowParams {
        GrowParams {
            criterion:         Criterion::Gini,
            max_depth:         self.max_depth,
            max_features:      self.max_features.resolve(n_features),
            random_thresholds: self.random_thresholds,
            min_samples_split: self.min_samples_split,
        }
    }
}

/// CART classifier; leaves hold the fraction of spam
pub struct DecisionTree {
    config: TreeConfig,
    tree:   Option<Tree>,
    n_cols: usize,
}

impl DecisionTree {
    pub fn new(config: TreeConfig) -> Self {
        Self { config, tree: None, n_cols: 0 }
    }

    pub fn tree(&self) -> Option<&Tree> {
        self.tree.as_ref()
    }
}

impl Classifier for DecisionTree {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[u8]) -> Result<(), ModelError> {
        check_training(x, y)?;

        let rows   = SparseRows::from_dense(x);
        let stats  = class_stats(y, &vec![1.0; y.len()]);
        let params = self.config.grow_params(x.ncols());
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);

        let tree = Tree::grow(&rows, &stats, (0..y.len()).collect(), &params, &mut rng);
        tracing::debug!("Decision tree: depth {}, {} leaves", tree.depth(), tree.n_leaves());

        self.tree   = Some(tree);
        self.n_cols = x.ncols();
        Ok(())
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        let tree = self.tree.as_ref().ok_or(ModelError::NotFitted)?;
        check_width(self.n_cols, x)?;
        Ok(Array1::from(tree.predict(&SparseRows::from_dense(x))))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn gini_params(max_depth: Option<usize>) -> GrowParams {
        GrowParams {
            criterion: Criterion::Gini,
            max_depth,
            max_features: None,
            random_thresholds: false,
            min_samples_split: 2,
        }
    }

    #[test]
    fn test_single_split_threshold() {
        let x = array![[0.0], [0.0], [0.4], [0.6]];
        let y = [0, 0, 1, 1];
        let rows  = SparseRows::from_dense(x.view());
        let stats = class_stats(&y, &[1.0; 4]);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let tree = Tree::grow(&rows, &stats, vec![0, 1, 2, 3], &gini_params(None), &mut rng);

        assert_eq!(tree.depth(), 1);
        // zero block vs 0.4 → midpoint 0.2
        match &tree.nodes[0] {
            Node::Split { feature, threshold, .. } => {
                assert_eq!(*feature, 0);
                assert!((threshold - 0.2).abs() < 1e-12);
            }
            other => panic!("expected a split, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_values_sort_before_zero_block() {
        let x = array![[-1.0], [0.0], [0.0], [2.0]];
        let y = [1, 0, 0, 0];
        let rows  = SparseRows::from_dense(x.view());
        let stats = class_stats(&y, &[1.0; 4]);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let tree = Tree::grow(&rows, &stats, vec![0, 1, 2, 3], &gini_params(None), &mut rng);

        let preds = tree.predict(&rows);
        assert_eq!(preds, vec![1.0, 0.0, 0.0, 0.0]);
        assert_eq!(tree.n_leaves(), 2);
    }

    #[test]
    fn test_max_depth_limits_growth() {
        // needs one split per feature to be fitted exactly
        let x = array![[0.0, 0.0], [1.0, 1.0], [1.0, 0.0], [0.0, 1.0], [1.0, 0.0]];
        let y = [0, 0, 1, 1, 1];
        let mut shallow = DecisionTree::new(TreeConfig { max_depth: Some(1), ..TreeConfig::default() });
        shallow.fit(x.view(), &y).unwrap();
        assert!(shallow.tree().unwrap().depth() <= 1);

        let mut full = DecisionTree::new(TreeConfig::default());
        full.fit(x.view(), &y).unwrap();
        assert_eq!(full.predict(x.view()).unwrap(), y.to_vec());
    }

    #[test]
    fn test_weighted_leaf_probability() {
        let x = array![[0.0], [0.0], [1.0]];
        let y = [0, 1, 1];
        let rows  = SparseRows::from_dense(x.view());
        let stats = class_stats(&y, &[3.0, 1.0, 1.0]);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let tree = Tree::grow(&rows, &stats, vec![0, 1, 2], &gini_params(Some(1)), &mut rng);
        let p = tree.predict(&rows);
        assert!((p[0] - 0.25).abs() < 1e-12);
        assert_eq!(p[2], 1.0);
    }

    #[test]
    fn test_newton_leaf_and_min_child_weight() {
        let x = array![[0.0], [1.0]];
        let rows  = SparseRows::from_dense(x.view());
        let stats = vec![
            NodeStat { sum: -0.5, hess: 0.25, count: 1.0 },
            NodeStat { sum: 0.5, hess: 0.25, count: 1.0 },
        ];
        let params = GrowParams {
            criterion: Criterion::Newton { lambda: 1.0, min_child_weight: 1.0 },
            ..gini_params(Some(3))
        };
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        // each child would hold hess 0.25 < 1 → stays a single leaf
        let tree = Tree::grow(&rows, &stats, vec![0, 1], &params, &mut rng);
        assert_eq!(tree.n_leaves(), 1);
        assert_eq!(tree.predict(&rows), vec![0.0, 0.0]);
    }

    #[test]
    fn test_random_thresholds_still_separate() {
        let x = Array2::from_shape_fn((20, 1), |(i, _)| i as f64);
        let y: Vec<u8> = (0..20).map(|i| u8::from(i >= 10)).collect();
        let mut et = DecisionTree::new(TreeConfig {
            random_thresholds: true,
            seed: 7,
            ..TreeConfig::default()
        });
        et.fit(x.view(), &y).unwrap();
        assert_eq!(et.predict(x.view()).unwrap(), y);
    }

    #[test]
    fn test_sqrt_features() {
        assert_eq!(MaxFeatures::Sqrt.resolve(3000), Some(54));
        assert_eq!(MaxFeatures::Sqrt.resolve(1), Some(1));
        assert_eq!(MaxFeatures::All.resolve(10), None);
    }
}
