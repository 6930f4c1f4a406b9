//! Leave-one-group-out cross-validation.
//!
//! With trials grouped by session this is leave-one-session-out: for each
//! session, train on every other session and score on the held-out one.
use std::fmt::Display;

use anyhow::{ensure, Result};
use ndarray::{ArrayView2, Axis};
use tracing::info;

use crate::classify::{accuracy, Classifier};
use crate::error::HarnessError;

/// Train/test indices for one held-out group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold<G> {
    pub group: G,
    pub train: Vec<usize>,
    pub test:  Vec<usize>,
}

/// Splitter yielding one fold per distinct group
/// (`sklearn.model_selection.LeaveOneGroupOut`).
#[derive(Debug, Clone, Copy, Default)]
pub struct LeaveOneGroupOut;

impl LeaveOneGroupOut {
    /// Folds in ascending group order (`G`'s `Ord`).  Fails with fewer than
    /// two groups, since the training side of the only fold would be empty.
    pub fn split<G: Ord + Clone>(&self, groups: &[G]) -> Result<Vec<Fold<G>>> {
        let mut distinct: Vec<G> = groups.to_vec();
        distinct.sort();
        distinct.dedup();
        if distinct.len() < 2 {
            return Err(HarnessError::classifier(format!(
                "leave-one-group-out needs at least two groups, got {}",
                distinct.len()
            ))
            .into());
        }

        Ok(distinct
            .into_iter()
            .map(|g| {
                let (test, train): (Vec<usize>, Vec<usize>) =
                    (0..groups.len()).partition(|&i| groups[i] == g);
                Fold { group: g, train, test }
            })
            .collect())
    }
}

/// Outcome of one held-out group.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldResult {
    /// Display form of the held-out group, e.g. `session_3`.
    pub group:     String,
    pub predicted: Vec<usize>,
    pub expected:  Vec<usize>,
    pub accuracy:  f64,
}

/// Leave-one-session-out evaluation of `x` (`[n_trials, n_features]`).
///
/// Folds run in group order.  `make_classifier` is called once per fold so
/// no state leaks between folds.
pub fn cross_validate_by_session<G, C, F>(
    x: ArrayView2<'_, f64>,
    y: &[usize],
    groups: &[G],
    mut make_classifier: F,
) -> Result<Vec<FoldResult>>
where
    G: Ord + Clone + Display,
    C: Classifier,
    F: FnMut() -> C,
{
    ensure!(
        x.nrows() == y.len() && y.len() == groups.len(),
        "length mismatch: {} rows, {} labels, {} groups",
        x.nrows(),
        y.len(),
        groups.len()
    );

    let folds = LeaveOneGroupOut.split(groups)?;
    let mut results = Vec::with_capacity(folds.len());
    for fold in folds {
        let x_train = x.select(Axis(0), &fold.train);
        let y_train: Vec<usize> = fold.train.iter().map(|&i| y[i]).collect();
        let x_test = x.select(Axis(0), &fold.test);
        let expected: Vec<usize> = fold.test.iter().map(|&i| y[i]).collect();

        let mut clf = make_classifier();
        clf.fit(x_train.view(), &y_train)?;
        let predicted = clf.predict(x_test.view())?;
        let score = accuracy(&predicted, &expected);
        info!(
            session = %fold.group,
            "predicted: {predicted:?}, expected {expected:?}, score: {score}"
        );

        results.push(FoldResult { group: fold.group.to_string(), predicted, expected, accuracy: score });
    }
    Ok(results)
}

/// Mean fold accuracy; `0.0` when there are no folds.
pub fn mean_accuracy(folds: &[FoldResult]) -> f64 {
    if folds.is_empty() {
        return 0.0;
    }
    folds.iter().map(|f| f.accuracy).sum::<f64>() / folds.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::LinearSvm;
    use ndarray::Array2;

    #[test]
    fn one_fold_per_sorted_group() {
        let groups = ["session_1", "session_0", "session_1", "session_0", "session_2"];
        let folds = LeaveOneGroupOut.split(&groups).unwrap();
        assert_eq!(folds.len(), 3);
        assert_eq!(folds[0].group, "session_0");
        assert_eq!(folds[0].test, vec![1, 3]);
        assert_eq!(folds[0].train, vec![0, 2, 4]);
        assert_eq!(folds[2].test, vec![4]);
    }

    #[test]
    fn single_group_rejected() {
        let err = LeaveOneGroupOut.split(&["session_0"; 4]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HarnessError>(),
            Some(HarnessError::Classifier { .. })
        ));
    }

    #[test]
    fn separable_sessions_score_perfectly() {
        // Two sessions of six trials, label k sits near (3k, 3k).
        let y: Vec<usize> = (0..12).map(|i| i % 2).collect();
        let groups: Vec<String> = (0..12).map(|i| format!("session_{}", i / 6)).collect();
        let x = Array2::from_shape_fn((12, 2), |(i, j)| {
            3.0 * y[i] as f64 + 0.1 * ((i * 7 + j * 3) % 5) as f64
        });

        let folds = cross_validate_by_session(x.view(), &y, &groups, LinearSvm::default).unwrap();
        assert_eq!(folds.len(), 2);
        for f in &folds {
            assert_eq!(f.expected.len(), 6);
            assert_eq!(f.accuracy, 1.0);
        }
        assert_eq!(mean_accuracy(&folds), 1.0);
    }

    #[test]
    fn session_ten_follows_session_nine() {
        use crate::dataset::SessionKey;
        let groups: Vec<SessionKey> = (0..24).map(|i| SessionKey(i / 2)).collect();
        let y: Vec<usize> = (0..24).map(|i| i % 2).collect();
        let x = Array2::from_shape_fn((24, 1), |(i, _)| if y[i] == 1 { 3.0 } else { -3.0 });

        let folds = cross_validate_by_session(x.view(), &y, &groups, LinearSvm::default).unwrap();
        let order: Vec<&str> = folds.iter().map(|f| f.group.as_str()).collect();
        assert_eq!(order[9..], ["session_9", "session_10", "session_11"]);
        assert_eq!(folds[10].expected, vec![0, 1]);
    }

    #[test]
    fn mismatched_lengths_rejected() {
        let x = Array2::<f64>::zeros((3, 2));
        let groups = vec!["a".to_string(), "b".to_string()];
        assert!(cross_validate_by_session(x.view(), &[0, 1, 0], &groups, LinearSvm::default).is_err());
    }
}
