mod common;

use eegmi::{
    cross_validate_by_session, mean_accuracy, package_subject, Dataset, EpochsData,
    HarnessConfig, HarnessError, LabelEncoder, LinearSvm, MotorImagery, SubjectArchiveDataset,
    SyntheticCapture,
};

/// Synthetic captures → archive → dataset, with `n_sessions` sessions.
fn synthetic_dataset(tag: &str, n_sessions: usize) -> SubjectArchiveDataset {
    let dir = common::scratch_dir(tag);
    let cfg = HarnessConfig { n_sessions, ..common::config_in(&dir) };
    SyntheticCapture { tail_secs: 5.0, ..SyntheticCapture::default() }
        .write_subject(0, &cfg)
        .unwrap();
    package_subject(0, &cfg).unwrap();
    SubjectArchiveDataset::new(cfg).unwrap()
}

fn evaluate(epochs: &EpochsData) -> Vec<eegmi::FoldResult> {
    let x = epochs.flatten().unwrap();
    let y = LabelEncoder::default().fit_transform(&epochs.labels).unwrap();
    cross_validate_by_session(x.view(), &y, &epochs.sessions(), LinearSvm::default).unwrap()
}

#[test]
fn leave_one_session_out_unfiltered() {
    let ds = synthetic_dataset("cv-raw", 3);
    let epochs = MotorImagery::unfiltered().get_data(&ds, None).unwrap();
    assert_eq!(epochs.x.shape(), &[36, 8, 189]);

    let folds = evaluate(&epochs);
    assert_eq!(folds.len(), 3);
    let groups: Vec<&str> = folds.iter().map(|f| f.group.as_str()).collect();
    assert_eq!(groups, ["session_0", "session_1", "session_2"]);
    for f in &folds {
        assert_eq!(f.expected.len(), 12);
        // closed = 0, open = 1; blocks start with open.
        assert_eq!(f.expected[..2], [1, 0]);
        assert_eq!(f.accuracy, 1.0, "fold {}", f.group);
    }
    assert_eq!(mean_accuracy(&folds), 1.0);
}

#[test]
fn leave_one_session_out_band_passed() {
    let ds = synthetic_dataset("cv-bp", 3);
    let dataset: &dyn Dataset = &ds;
    let epochs = MotorImagery::default().get_data(dataset, None).unwrap();
    let folds = evaluate(&epochs);
    assert_eq!(folds.len(), 3);
    assert!(mean_accuracy(&folds) >= 0.9, "{folds:?}");
}

#[test]
fn single_session_cannot_be_split() {
    let ds = synthetic_dataset("cv-one", 1);
    let epochs = MotorImagery::unfiltered().get_data(&ds, None).unwrap();
    let x = epochs.flatten().unwrap();
    let y = LabelEncoder::default().fit_transform(&epochs.labels).unwrap();
    let err = cross_validate_by_session(x.view(), &y, &epochs.sessions(), LinearSvm::default)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<HarnessError>(),
        Some(HarnessError::Classifier { .. })
    ));
}
