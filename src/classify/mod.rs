//! Trial classification.
//!
//! - [`LabelEncoder`]: string labels ↔ dense class indices `0..k`.
//! - [`Classifier`]: the fit/predict contract the cross-validation driver
//!   relies on.
//! - [`svm::LinearSvm`]: standardised one-vs-rest linear SVM.

pub mod svm;

use std::collections::BTreeMap;

use anyhow::Result;
use ndarray::ArrayView2;

use crate::error::HarnessError;

pub use svm::LinearSvm;

/// A supervised classifier over `[n_samples, n_features]` matrices.
///
/// `fit` is not incremental: each call discards the previous model.
pub trait Classifier {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[usize]) -> Result<()>;

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<usize>>;

    /// Fraction of rows of `x` whose prediction equals `y`.
    fn score(&self, x: ArrayView2<'_, f64>, y: &[usize]) -> Result<f64> {
        let pred = self.predict(x)?;
        Ok(accuracy(&pred, y))
    }
}

/// Fraction of matching positions; `0.0` for empty input.
pub fn accuracy(predicted: &[usize], expected: &[usize]) -> f64 {
    if expected.is_empty() {
        return 0.0;
    }
    let hits = predicted.iter().zip(expected).filter(|(p, e)| p == e).count();
    hits as f64 / expected.len() as f64
}

/// Maps labels to indices of the sorted distinct label set
/// (`sklearn.preprocessing.LabelEncoder`).
///
/// ```
/// use eegmi::LabelEncoder;
/// let mut enc = LabelEncoder::default();
/// let y = enc.fit_transform(&["open", "closed", "open"]).unwrap();
/// assert_eq!(enc.classes(), ["closed", "open"]);
/// assert_eq!(y, vec![1, 0, 1]);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelEncoder {
    classes: Vec<String>,
    index:   BTreeMap<String, usize>,
}

impl LabelEncoder {
    pub fn fit<S: AsRef<str>>(&mut self, labels: &[S]) -> &mut Self {
        let index: BTreeMap<String, usize> = labels
            .iter()
            .map(|l| (l.as_ref().to_string(), 0))
            .collect();
        self.classes = index.keys().cloned().collect();
        self.index = self
            .classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        self
    }

    pub fn transform<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<usize>> {
        labels
            .iter()
            .map(|l| {
                self.index.get(l.as_ref()).copied().ok_or_else(|| {
                    anyhow::Error::from(HarnessError::classifier(format!(
                        "label '{}' not seen during fit",
                        l.as_ref()
                    )))
                })
            })
            .collect()
    }

    pub fn fit_transform<S: AsRef<str>>(&mut self, labels: &[S]) -> Result<Vec<usize>> {
        self.fit(labels).transform(labels)
    }

    pub fn inverse_transform(&self, codes: &[usize]) -> Result<Vec<String>> {
        codes
            .iter()
            .map(|&c| {
                self.classes.get(c).cloned().ok_or_else(|| {
                    anyhow::Error::from(HarnessError::classifier(format!(
                        "class index {c} out of range for {} classes",
                        self.classes.len()
                    )))
                })
            })
            .collect()
    }

    /// Sorted distinct labels; position is the encoded value.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}
