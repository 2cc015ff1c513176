// ============================================================
// Layer 5 - Compressed Sparse Rows
// ============================================================
// TF-IDF matrices are almost entirely zeros (a message has a
// dozen terms out of 3000), so the distance, kernel and tree
// code walks only the stored entries. Column indices inside a
// row are strictly increasing.

use ndarray::ArrayView2;

#[derive(Debug, Clone, Copy)]
pub struct SparseRow<'a> {
    pub indices: &'a [usize],
    pub values:  &'a [f64],
}

impl<'a> SparseRow<'a> {
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn iter(self) -> impl Iterator<Item = (usize, f64)> + 'a {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Value at `col`, zero when not stored.
    pub fn get(&self, col: usize) -> f64 {
        match self.indices.binary_search(&col) {
            Ok(k)  => self.values[k],
            Err(_) => 0.0,
        }
    }

    pub fn dot(&self, other: SparseRow<'_>) -> f64 {
        let (mut a, mut b) = (0, 0);
        let mut sum = 0.0;
        while a < self.indices.len() && b < other.indices.len() {
            match self.indices[a].cmp(&other.indices[b]) {
                std::cmp::Ordering::Less    => a += 1,
                std::cmp::Ordering::Greater => b += 1,
                std::cmp::Ordering::Equal   => {
                    sum += self.values[a] * other.values[b];
                    a += 1;
                    b += 1;
                }
            }
        }
        sum
    }

    pub fn sq_norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SparseRows {
    n_cols:  usize,
    indptr:  Vec<usize>,
    indices: Vec<usize>,
    values:  Vec<f64>,
}

impl SparseRows {
    pub fn from_dense(x: ArrayView2<'_, f64>) -> Self {
        let mut indptr  = Vec::with_capacity(x.nrows() + 1);
        let mut indices = Vec::new();
        let mut values  = Vec::new();
        indptr.push(0);

        for row in x.rows() {
            for (j, &v) in row.iter().enumerate() {
                if v != 0.0 {
                    indices.push(j);
                    values.push(v);
                }
            }
            indptr.push(indices.len());
        }

        Self { n_cols: x.ncols(), indptr, indices, values }
    }

    pub fn n_rows(&self) -> usize {
        self.indptr.len() - 1
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn row(&self, i: usize) -> SparseRow<'_> {
        let (start, end) = (self.indptr[i], self.indptr[i + 1]);
        SparseRow {
            indices: &self.indices[start..end],
            values:  &self.values[start..end],
        }
    }

    /// New matrix holding only `rows`, in the given order.
    pub fn select(&self, rows: &[usize]) -> Self {
        let mut indptr  = Vec::with_capacity(rows.len() + 1);
        let mut indices = Vec::new();
        let mut values  = Vec::new();
        indptr.push(0);

        for &r in rows {
            let row = self.row(r);
            indices.extend_from_slice(row.indices);
            values.extend_from_slice(row.values);
            indptr.push(indices.len());
        }

        Self { n_cols: self.n_cols, indptr, indices, values }
    }

    pub fn transpose(&self) -> Self {
        let n_rows = self.n_rows();
        let mut counts = vec![0usize; self.n_cols + 1];
        for &j in &self.indices {
            counts[j + 1] += 1;
        }
        for j in 0..self.n_cols {
            counts[j + 1] += counts[j];
        }

        let indptr      = counts.clone();
        let mut next    = counts;
        let mut indices = vec![0usize; self.nnz()];
        let mut values  = vec![0.0; self.nnz()];

        // rows are visited in order, so every column comes out sorted
        for i in 0..n_rows {
            for (j, v) in self.row(i).iter() {
                let slot = next[j];
                indices[slot] = i;
                values[slot]  = v;
                next[j] += 1;
            }
        }

        Self { n_cols: n_rows, indptr, indices, values }
    }

    /// `self` must be the transpose of some matrix A. Writes
    /// ⟨A[r], row⟩ into `out[r]` for every row r of A.
    pub fn transposed_dots(&self, row: SparseRow<'_>, out: &mut [f64]) {
        out.iter_mut().for_each(|v| *v = 0.0);
        for (f, v) in row.iter() {
            if f >= self.n_rows() {
                continue;
            }
            for (r, u) in self.row(f).iter() {
                out[r] += v * u;
            }
        }
    }

    pub fn sq_norms(&self) -> Vec<f64> {
        (0..self.n_rows()).map(|i| self.row(i).sq_norm()).collect()
    }

    /// Largest absolute stored value per column, 1 for empty columns
    pub fn column_max_abs(&self) -> Vec<f64> {
        let mut max = vec![0.0f64; self.n_cols];
        for (&j, &v) in self.indices.iter().zip(&self.values) {
            max[j] = max[j].max(v.abs());
        }
        max.into_iter().map(|m| if m > 0.0 { m } else { 1.0 }).collect()
    }

    /// Divides every stored value by the scale of its column.
    pub fn scale_columns(&mut self, scales: &[f64]) {
        for (&j, v) in self.indices.iter().zip(self.values.iter_mut()) {
            *v /= scales[j];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample() -> SparseRows {
        let x = array![[0.0, 2.0, 0.0], [1.0, 0.0, 3.0], [0.0, 0.0, 0.0]];
        SparseRows::from_dense(x.view())
    }

    #[test]
    fn test_from_dense() {
        let m = sample();
        assert_eq!(m.n_rows(), 3);
        assert_eq!(m.n_cols(), 3);
        assert_eq!(m.nnz(), 3);
        assert_eq!(m.row(1).indices, &[0, 2]);
        assert_eq!(m.row(1).get(2), 3.0);
        assert_eq!(m.row(1).get(1), 0.0);
        assert_eq!(m.row(2).nnz(), 0);
    }

    #[test]
    fn test_dot_and_norm() {
        let m = sample();
        assert_eq!(m.row(0).dot(m.row(1)), 0.0);
        assert_eq!(m.row(1).dot(m.row(1)), 10.0);
        assert_eq!(m.sq_norms(), vec![4.0, 10.0, 0.0]);
    }

    #[test]
    fn test_transpose_and_dots() {
        let m = sample();
        let t = m.transpose();
        assert_eq!(t.n_rows(), 3);
        assert_eq!(t.row(0).indices, &[1]);
        assert_eq!(t.row(2).values, &[3.0]);

        let q = array![[1.0, 1.0, 1.0]];
        let q = SparseRows::from_dense(q.view());
        let mut out = vec![0.0; 3];
        t.transposed_dots(q.row(0), &mut out);
        assert_eq!(out, vec![2.0, 4.0, 0.0]);
    }

    #[test]
    fn test_column_scaling() {
        let mut m = sample();
        let scales = m.column_max_abs();
        assert_eq!(scales, vec![1.0, 2.0, 3.0]);

        m.scale_columns(&scales);
        assert_eq!(m.row(0).get(1), 1.0);
        assert_eq!(m.row(1).get(2), 1.0);
    }

    #[test]
    fn test_select() {
        let m = sample().select(&[1, 1, 0]);
        assert_eq!(m.n_rows(), 3);
        assert_eq!(m.row(0).get(0), 1.0);
        assert_eq!(m.row(2).get(1), 2.0);
    }
}
