//! Per-feature standardisation.
//!
//! `StandardScaler` matches `sklearn.preprocessing.StandardScaler`:
//!   μ_j = mean(x[:, j]),  σ_j = std(x[:, j]) (ddof=0)
//!   x[:, j] = (x[:, j] − μ_j) / σ_j
//! Features with σ_j = 0 are centred but not scaled.
use anyhow::{ensure, Result};
use ndarray::{Array1, Array2, ArrayView2, Axis};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StandardScaler {
    mean:  Option<Array1<f64>>,
    scale: Option<Array1<f64>>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn per-column mean and standard deviation of `x` (`[n, d]`).
    pub fn fit(&mut self, x: ArrayView2<'_, f64>) -> Result<()> {
        ensure!(x.nrows() > 0, "cannot fit a scaler on zero samples");
        let mean = x.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(x.ncols()));
        let std = x.std_axis(Axis(0), 0.0);
        let scale = std.mapv(|s| if s > 0.0 { s } else { 1.0 });
        self.mean = Some(mean);
        self.scale = Some(scale);
        Ok(())
    }

    /// Standardise `x` with the fitted statistics.
    pub fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        let (Some(mean), Some(scale)) = (&self.mean, &self.scale) else {
            anyhow::bail!("scaler used before fit");
        };
        ensure!(
            x.ncols() == mean.len(),
            "scaler fitted on {} features, got {}",
            mean.len(),
            x.ncols()
        );
        Ok((&x - mean) / scale)
    }

    pub fn fit_transform(&mut self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    pub fn mean(&self) -> Option<&Array1<f64>> {
        self.mean.as_ref()
    }
}
