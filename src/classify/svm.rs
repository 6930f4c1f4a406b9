//! Linear support-vector classifier.
//!
//! Features are standardised, a constant `1` column is appended for the
//! bias, and one binary hinge-loss model per class is trained by
//! deterministic full-batch Pegasos:
//!
//! ```text
//! λ   = 1 / (C · n)
//! η_t = 1 / (λ · t)
//! w  ← w − η_t · (λ·w − (1/n) · Σ_{i : y_i·⟨w, z_i⟩ < 1} y_i · z_i)
//! w  ← w · min(1, (1/√λ) / ‖w‖)
//! ```
//!
//! Prediction picks the class with the largest decision value.
use anyhow::{ensure, Result};
use ndarray::{concatenate, Array1, Array2, ArrayView2, Axis};
use tracing::debug;

use super::Classifier;
use crate::error::HarnessError;
use crate::normalize::StandardScaler;

/// One-vs-rest linear SVM on standardised features.
///
/// ```
/// use eegmi::classify::{Classifier, LinearSvm};
/// use ndarray::array;
///
/// let x = array![[0.0, 0.1], [0.2, 0.0], [3.0, 3.1], [3.2, 2.9]];
/// let mut svm = LinearSvm::default();
/// svm.fit(x.view(), &[0, 0, 1, 1]).unwrap();
/// assert_eq!(svm.predict(x.view()).unwrap(), vec![0, 0, 1, 1]);
/// ```
#[derive(Debug, Clone)]
pub struct LinearSvm {
    /// Inverse regularisation strength.
    pub c:        f64,
    /// Full-batch subgradient steps per binary model.
    pub max_iter: usize,
    scaler:       StandardScaler,
    /// `[n_classes, n_features + 1]`, last column is the bias.
    weights:      Option<Array2<f64>>,
}

impl Default for LinearSvm {
    fn default() -> Self {
        Self::new(1.0, 200)
    }
}

impl LinearSvm {
    pub fn new(c: f64, max_iter: usize) -> Self {
        Self { c, max_iter, scaler: StandardScaler::new(), weights: None }
    }

    /// Decision values `[n_samples, n_classes]`.
    pub fn decision_function(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        let w = self
            .weights
            .as_ref()
            .ok_or_else(|| HarnessError::classifier("predict called before fit"))?;
        let z = augment(&self.scaler.transform(x)?)?;
        Ok(z.dot(&w.t()))
    }

    pub fn n_classes(&self) -> usize {
        self.weights.as_ref().map_or(0, |w| w.nrows())
    }
}

impl Classifier for LinearSvm {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[usize]) -> Result<()> {
        // A failed fit leaves no model behind.
        self.weights = None;
        ensure!(
            x.nrows() == y.len(),
            "{} samples but {} labels",
            x.nrows(),
            y.len()
        );
        if !(self.c > 0.0) || self.max_iter == 0 {
            return Err(HarnessError::classifier(format!(
                "C must be positive and max_iter non-zero (C = {}, max_iter = {})",
                self.c, self.max_iter
            ))
            .into());
        }
        let n_classes = y.iter().max().map_or(0, |&m| m + 1);
        let present = (0..n_classes).filter(|k| y.contains(k)).count();
        if present < 2 {
            return Err(HarnessError::classifier(format!(
                "need at least two classes to fit, got {present}"
            ))
            .into());
        }

        let z = augment(&self.scaler.fit_transform(x)?)?;
        let lambda = 1.0 / (self.c * z.nrows() as f64);

        let mut weights = Array2::<f64>::zeros((n_classes, z.ncols()));
        for k in 0..n_classes {
            let target: Array1<f64> = y.iter().map(|&l| if l == k { 1.0 } else { -1.0 }).collect();
            let w = pegasos(&z, &target, lambda, self.max_iter);
            weights.row_mut(k).assign(&w);
        }
        debug!(n_samples = z.nrows(), n_features = z.ncols() - 1, n_classes, "fitted linear svm");
        self.weights = Some(weights);
        Ok(())
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<usize>> {
        let scores = self.decision_function(x)?;
        Ok(scores
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .fold((0, f64::NEG_INFINITY), |best, (k, &s)| if s > best.1 { (k, s) } else { best })
                    .0
            })
            .collect())
    }
}

/// Append the constant bias column.
fn augment(z: &Array2<f64>) -> Result<Array2<f64>> {
    let ones = Array2::<f64>::ones((z.nrows(), 1));
    Ok(concatenate(Axis(1), &[z.view(), ones.view()])?)
}

/// Binary hinge-loss weights for targets in `{-1, +1}`.
fn pegasos(z: &Array2<f64>, target: &Array1<f64>, lambda: f64, max_iter: usize) -> Array1<f64> {
    let n = z.nrows() as f64;
    let radius = 1.0 / lambda.sqrt();
    let mut w = Array1::<f64>::zeros(z.ncols());

    for t in 1..=max_iter {
        let margins = z.dot(&w) * target;
        let mut grad = &w * lambda;
        for (i, &m) in margins.iter().enumerate() {
            if m < 1.0 {
                grad.scaled_add(-target[i] / n, &z.row(i));
            }
        }
        let eta = 1.0 / (lambda * t as f64);
        w.scaled_add(-eta, &grad);

        let norm = w.dot(&w).sqrt();
        if norm > radius {
            w *= radius / norm;
        }
    }
    w
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blobs() -> (Array2<f64>, Vec<usize>) {
        // Three well-separated clusters in 2-D, 10 points each.
        let centres = [(0.0, 0.0), (6.0, 0.0), (0.0, 6.0)];
        let mut rows = Vec::new();
        let mut y = Vec::new();
        for (k, &(cx, cy)) in centres.iter().enumerate() {
            for i in 0..10 {
                let a = i as f64 * 0.6;
                rows.push([cx + 0.5 * a.cos(), cy + 0.5 * a.sin()]);
                y.push(k);
            }
        }
        let x = Array2::from_shape_fn((rows.len(), 2), |(i, j)| rows[i][j]);
        (x, y)
    }

    #[test]
    fn separates_three_clusters() {
        let (x, y) = blobs();
        let mut svm = LinearSvm::default();
        svm.fit(x.view(), &y).unwrap();
        assert_eq!(svm.n_classes(), 3);
        assert_eq!(svm.score(x.view(), &y).unwrap(), 1.0);
    }

    #[test]
    fn refit_discards_previous_model() {
        let (x, y) = blobs();
        let mut svm = LinearSvm::default();
        svm.fit(x.view(), &y).unwrap();
        let two: Vec<usize> = y.iter().map(|&k| usize::from(k > 0)).collect();
        svm.fit(x.view(), &two).unwrap();
        assert_eq!(svm.n_classes(), 2);
        assert_eq!(svm.predict(x.view()).unwrap(), two);
    }

    #[test]
    fn failed_refit_clears_model() {
        let (x, y) = blobs();
        let mut svm = LinearSvm::default();
        svm.fit(x.view(), &y).unwrap();
        assert!(svm.fit(x.view(), &vec![1; x.nrows()]).is_err());
        assert_eq!(svm.n_classes(), 0);
        assert!(svm.predict(x.view()).is_err());

        svm.fit(x.view(), &y).unwrap();
        svm.c = -1.0;
        assert!(svm.fit(x.view(), &y).is_err());
        assert!(svm.predict(x.view()).is_err());
    }

    #[test]
    fn single_class_rejected() {
        let (x, _) = blobs();
        let err = LinearSvm::default().fit(x.view(), &vec![0; x.nrows()]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HarnessError>(),
            Some(HarnessError::Classifier { .. })
        ));
    }

    #[test]
    fn predict_before_fit_rejected() {
        let (x, _) = blobs();
        let err = LinearSvm::default().predict(x.view()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HarnessError>(),
            Some(HarnessError::Classifier { .. })
        ));
    }
}
