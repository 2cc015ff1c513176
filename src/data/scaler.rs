// ============================================================
// Layer 4 - Feature Scaling
// ============================================================
// Min-max scaling and column helpers used by the feature
// experiments ("scaling" and "num_chars" variants).

use anyhow::{bail, Result};
use ndarray::{concatenate, Array1, Array2, ArrayView1, Axis};

/// Rescales every column to [0, 1] using the min and max seen in `fit`.
/// Constant columns map to 0.
#[derive(Debug, Clone, Default)]
pub struct MinMaxScaler {
    min:   Option<Array1<f64>>,
    range: Option<Array1<f64>>,
}

impl MinMaxScaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fit(&mut self, x: &Array2<f64>) -> Result<()> {
        if x.nrows() == 0 {
            bail!("cannot fit a scaler on an empty matrix");
        }
        let min = x.fold_axis(Axis(0), f64::INFINITY, |&a, &b| a.min(b));
        let max = x.fold_axis(Axis(0), f64::NEG_INFINITY, |&a, &b| a.max(b));
        self.range = Some(&max - &min);
        self.min   = Some(min);
        Ok(())
    }

    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (Some(min), Some(range)) = (&self.min, &self.range) else {
            bail!("MinMaxScaler must be fitted before transform");
        };
        if x.ncols() != min.len() {
            bail!("scaler fitted on {} columns, got {}", min.len(), x.ncols());
        }

        let mut out = x.clone();
        for mut row in out.rows_mut() {
            for ((v, &lo), &r) in row.iter_mut().zip(min).zip(range) {
                *v = if r > 0.0 { (*v - lo) / r } else { 0.0 };
            }
        }
        Ok(out)
    }

    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }
}

/// Append one column on the right of `x`.
pub fn append_column(x: &Array2<f64>, column: ArrayView1<f64>) -> Result<Array2<f64>> {
    if column.len() != x.nrows() {
        bail!("column has {} values for {} rows", column.len(), x.nrows());
    }
    let col = column.to_owned().insert_axis(Axis(1));
    Ok(concatenate(Axis(1), &[x.view(), col.view()])?)
}
