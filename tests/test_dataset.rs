mod common;

use eegmi::mat::MatWriter;
use eegmi::{
    package_subject, Dataset, HarnessConfig, HarnessError, MotorImagery, SessionKey,
    SubjectArchiveDataset,
};
use ndarray::Array2;

#[test]
fn loads_packaged_subject() {
    let dir = common::scratch_dir("ds");
    let cfg = common::config_in(&dir);
    common::write_constant_subject(&cfg, 80);
    package_subject(0, &cfg).unwrap();

    let ds = SubjectArchiveDataset::new(cfg).unwrap();
    let data = ds.load_subject(1).unwrap();
    assert_eq!(data.len(), 10);
    let keys: Vec<String> = data.keys().map(|k| k.to_string()).collect();
    assert_eq!(keys.first().map(String::as_str), Some("session_0"));
    assert_eq!(keys.last().map(String::as_str), Some("session_9"));

    for (k, expected) in [(0, 0.0), (5, 5.0)] {
        let runs = &data[&SessionKey(k)];
        assert_eq!(runs.len(), 1);
        let raw = &runs["run_1"];
        assert_eq!(raw.n_chan(), 8);
        assert_eq!(raw.n_times(), 15_000);
        assert_eq!(raw.sfreq(), 250.0);
        assert!(raw.data().iter().all(|&v| v == expected));
        assert_eq!(raw.ch_names()[0], "ch0");
    }

    let ann = data[&SessionKey(3)]["run_1"].annotations();
    assert_eq!(ann.len(), 12);
    let first = ann.get(0).unwrap();
    assert_eq!((first.onset, first.duration, first.label.as_str()), (0.0, 5.0, "open"));
    let last = ann.get(11).unwrap();
    assert_eq!((last.onset, last.label.as_str()), (55.0, "closed"));
}

#[test]
fn epochs_twelve_trials_per_session() {
    let dir = common::scratch_dir("ds-epochs");
    let cfg = HarnessConfig { n_sessions: 2, ..common::config_in(&dir) };
    common::write_constant_subject(&cfg, 70);
    package_subject(0, &cfg).unwrap();

    let ds = SubjectArchiveDataset::new(cfg).unwrap();
    let ep = MotorImagery::unfiltered().get_data(&ds, None).unwrap();
    assert_eq!(ep.x.shape(), &[24, 8, 189]);
    assert_eq!(ep.labels[..3], ["open", "closed", "open"]);
    assert_eq!(ep.sessions()[12], SessionKey(1));
    assert!(ep.x.index_axis(ndarray::Axis(0), 13).iter().all(|&v| v == 1.0));
}

#[test]
fn unknown_subject_rejected_before_io() {
    let dir = common::scratch_dir("ds-unknown");
    let ds = SubjectArchiveDataset::new(common::config_in(&dir)).unwrap();
    let err = ds.load_subject(2).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<HarnessError>(),
        Some(HarnessError::InvalidSubject { subject: 2, .. })
    ));
}

fn write_archive(cfg: &HarnessConfig, with_fs: bool, skip: Option<usize>) {
    write_archive_with(cfg, with_fs, skip, |_| Array2::zeros((8, 15_000)));
}

/// Archive whose session `k` holds `session(k)`.
fn write_archive_with(
    cfg: &HarnessConfig,
    with_fs: bool,
    skip: Option<usize>,
    session: impl Fn(usize) -> Array2<f64>,
) {
    std::fs::create_dir_all(&cfg.archive_dir).unwrap();
    let mut w = MatWriter::new();
    if with_fs {
        w.add_scalar("fs", 250.0);
    }
    for k in 0..cfg.n_sessions {
        if Some(k) != skip {
            w.add_array2(&format!("x{k}"), &session(k));
        }
    }
    w.write(&cfg.archive_path(1)).unwrap();
}

fn assert_corrupt(cfg: HarnessConfig, needle: &str) {
    let ds = SubjectArchiveDataset::new(cfg).unwrap();
    let err = ds.load_subject(1).unwrap_err();
    match err.downcast_ref::<HarnessError>() {
        Some(HarnessError::ArchiveCorrupt { reason, .. }) => {
            assert!(reason.contains(needle), "{reason}");
        }
        other => panic!("expected ArchiveCorrupt, got {other:?}"),
    }
}

#[test]
fn archive_missing_session_is_corrupt() {
    let dir = common::scratch_dir("ds-no-x3");
    let cfg = HarnessConfig { n_sessions: 5, ..common::config_in(&dir) };
    write_archive(&cfg, true, Some(3));
    assert_corrupt(cfg, "x3");
}

#[test]
fn archive_missing_rate_is_corrupt() {
    let dir = common::scratch_dir("ds-no-fs");
    let cfg = HarnessConfig { n_sessions: 2, ..common::config_in(&dir) };
    write_archive(&cfg, false, None);
    assert_corrupt(cfg, "fs");
}

#[test]
fn garbage_archive_is_corrupt() {
    let dir = common::scratch_dir("ds-garbage");
    let cfg = common::config_in(&dir);
    std::fs::create_dir_all(&cfg.archive_dir).unwrap();
    std::fs::write(cfg.archive_path(1), b"not a mat file").unwrap();
    let ds = SubjectArchiveDataset::new(cfg).unwrap();
    assert!(matches!(
        ds.load_subject(1).unwrap_err().downcast_ref::<HarnessError>(),
        Some(HarnessError::ArchiveCorrupt { .. })
    ));
}

#[test]
fn truncated_session_is_corrupt() {
    let dir = common::scratch_dir("ds-short-x0");
    let cfg = HarnessConfig { n_sessions: 2, ..common::config_in(&dir) };
    write_archive_with(&cfg, true, None, |k| {
        if k == 0 { Array2::zeros((8, 100)) } else { Array2::zeros((8, 15_000)) }
    });
    assert_corrupt(cfg, "8x100");
}

#[test]
fn twelve_sessions_stay_in_numeric_order() {
    let dir = common::scratch_dir("ds-twelve");
    let cfg = HarnessConfig { n_sessions: 12, ..common::config_in(&dir) };
    write_archive_with(&cfg, true, None, |k| Array2::from_elem((8, 15_000), k as f64));

    let ds = SubjectArchiveDataset::new(cfg).unwrap();
    let data = ds.load_subject(1).unwrap();
    let keys: Vec<usize> = data.keys().map(|k| k.index()).collect();
    assert_eq!(keys, (0..12).collect::<Vec<_>>());

    let ep = MotorImagery::unfiltered().get_data(&ds, None).unwrap();
    assert_eq!(ep.n_trials(), 144);
    // Trials 108..120 are session 9, then session 10.
    assert_eq!(ep.sessions()[119], SessionKey(9));
    assert_eq!(ep.sessions()[120], SessionKey(10));
    assert!(ep.x.index_axis(ndarray::Axis(0), 120).iter().all(|&v| v == 10.0));
}
