// ============================================================
// Layer 5 - k-Nearest Neighbours
// ============================================================
// Euclidean distance and a uniform vote.
//
// The training rows are kept as a transposed sparse matrix so the
// dot products of one query against every stored row cost only as
// much as the nonzeros they share:
//
//   ‖a − b‖² = ‖a‖² + ‖b‖² − 2⟨a, b⟩
//
// Ties in distance go to the lower training index.

use ndarray::{Array1, ArrayView2};

use super::classifier::{check_training, check_width, Classifier};
use super::sparse::SparseRows;
use super::ModelError;

struct Fitted {
    /// transpose of the training matrix
    columns:  SparseRows,
    sq_norms: Vec<f64>,
    labels:   Vec<u8>,
    n_cols:   usize,
}

pub struct KNeighbors {
    k:      usize,
    fitted: Option<Fitted>,
}

impl KNeighbors {
    pub fn new(k: usize) -> Self {
        Self { k, fitted: None }
    }
}

impl Classifier for KNeighbors {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[u8]) -> Result<(), ModelError> {
        check_training(x, y)?;
        if self.k == 0 {
            return Err(ModelError::InvalidParameter("k must be at least 1".to_string()));
        }
        if self.k > x.nrows() {
            return Err(ModelError::InvalidParameter(format!(
                "k = {} exceeds the {} training rows",
                self.k,
                x.nrows()
            )));
        }

        let rows = SparseRows::from_dense(x);
        self.fitted = Some(Fitted {
            sq_norms: rows.sq_norms(),
            columns:  rows.transpose(),
            labels:   y.to_vec(),
            n_cols:   x.ncols(),
        });
        Ok(())
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        let fit = self.fitted.as_ref().ok_or(ModelError::NotFitted)?;
        check_width(fit.n_cols, x)?;

        let queries = SparseRows::from_dense(x);
        let n_train = fit.labels.len();
        let mut dots  = vec![0.0; n_train];
        let mut order: Vec<(f64, usize)> = Vec::with_capacity(n_train);
        let mut out   = Array1::<f64>::zeros(x.nrows());

        for q in 0..queries.n_rows() {
            let row = queries.row(q);
            let q_norm = row.sq_norm();
            fit.columns.transposed_dots(row, &mut dots);

            order.clear();
            order.extend(
                dots.iter()
                    .zip(&fit.sq_norms)
                    .enumerate()
                    .map(|(i, (&d, &n))| (q_norm + n - 2.0 * d, i)),
            );
            let by_distance = |a: &(f64, usize), b: &(f64, usize)| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1));
            order.select_nth_unstable_by(self.k - 1, by_distance);

            let spam_votes = order[..self.k]
                .iter()
                .filter(|&&(_, i)| fit.labels[i] == 1)
                .count();
            out[q] = spam_votes as f64 / self.k as f64;
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_nearest_neighbour_vote() {
        let x = array![
            [0.0, 0.0],
            [0.1, 0.0],
            [0.0, 0.1],
            [5.0, 5.0],
            [5.1, 5.0],
            [5.0, 5.1],
        ];
        let y = [0, 0, 0, 1, 1, 1];
        let mut knn = KNeighbors::new(3);
        knn.fit(x.view(), &y).unwrap();

        let q = array![[0.05, 0.05], [4.9, 5.2]];
        assert_eq!(knn.predict(q.view()).unwrap(), vec![0, 1]);
        assert_eq!(knn.predict_proba(q.view()).unwrap().to_vec(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_mixed_neighbourhood() {
        let x = array![[0.0], [1.0], [2.0], [10.0]];
        let mut knn = KNeighbors::new(3);
        knn.fit(x.view(), &[0, 1, 1, 0]).unwrap();
        let p = knn.predict_proba(array![[1.0]].view()).unwrap();
        assert!((p[0] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_k_larger_than_training_set() {
        let mut knn = KNeighbors::new(5);
        let x = array![[0.0], [1.0]];
        assert!(matches!(knn.fit(x.view(), &[0, 1]), Err(ModelError::InvalidParameter(_))));
    }
}
