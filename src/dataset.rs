//! Dataset adapter over packaged subject archives.
//!
//! [`Dataset`] is the capability set an experiment runner needs: subject
//! list, path resolution, per-subject loading, and the static metadata
//! (event codes, trial interval, paradigm).  [`SubjectArchiveDataset`]
//! implements it for `subject_NN.mat` archives written by
//! [`package_subject`](crate::package::package_subject).
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, info};

use crate::annotations::Annotations;
use crate::config::HarnessConfig;
use crate::error::HarnessError;
use crate::mat::MatFile;
use crate::recording::{ChannelType, RawRecording};

/// Runs of one session, keyed `run_1`, `run_2`, ….
pub type Runs = BTreeMap<String, RawRecording>;
/// Sessions of one subject in session-index order.
pub type SubjectData = BTreeMap<SessionKey, Runs>;

/// Zero-based session index; displayed as `session_K`.
///
/// Ordering is numeric, so `session_10` follows `session_9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionKey(pub usize);

impl SessionKey {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session_{}", self.0)
    }
}

/// Paradigm name of motor-imagery datasets, as stored in
/// [`DatasetDescriptor::paradigm`].
pub const IMAGERY: &str = "imagery";

/// Static identity of a dataset; fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetDescriptor {
    pub subjects:             Vec<u32>,
    pub sessions_per_subject: usize,
    /// Event label → integer code.
    pub events:               BTreeMap<String, i32>,
    /// Trial window `[tmin, tmax]` in seconds relative to event onset.
    pub interval:             [f64; 2],
    /// Paradigm family, e.g. [`IMAGERY`].
    pub paradigm:             String,
    pub code:                 String,
    /// Reference identifier; may be empty.
    pub doi:                  String,
}

impl DatasetDescriptor {
    /// The open/closed eyes dataset: one subject, `n_sessions` sessions,
    /// `open` = 1, `closed` = 2, trials `[0, 0.75]` s.
    pub fn open_closed(n_sessions: usize) -> Self {
        Self {
            subjects: vec![1],
            sessions_per_subject: n_sessions,
            events: BTreeMap::from([("open".to_string(), 1), ("closed".to_string(), 2)]),
            interval: [0.0, 0.75],
            paradigm: IMAGERY.into(),
            code: "Wen dataset".into(),
            doi: String::new(),
        }
    }
}

/// Dataset capability set consumed by paradigms and evaluation drivers.
pub trait Dataset {
    fn descriptor(&self) -> &DatasetDescriptor;

    /// Valid subject identifiers.
    fn subject_list(&self) -> &[u32] {
        &self.descriptor().subjects
    }

    /// File locations backing `subject`.
    ///
    /// Fails with [`HarnessError::InvalidSubject`] for unknown subjects.
    fn resolve_path(&self, subject: u32) -> Result<Vec<PathBuf>>;

    /// Session → run → recording for one subject.
    fn load_subject(&self, subject: u32) -> Result<SubjectData>;

    /// [`Dataset::load_subject`] for each of `subjects` (all when `None`).
    fn get_data(&self, subjects: Option<&[u32]>) -> Result<BTreeMap<u32, SubjectData>> {
        let subjects = subjects.unwrap_or_else(|| self.subject_list());
        subjects
            .iter()
            .map(|&s| Ok((s, self.load_subject(s)?)))
            .collect()
    }

    /// Fail with [`HarnessError::InvalidSubject`] unless `subject` is listed.
    fn check_subject(&self, subject: u32) -> Result<()> {
        if self.subject_list().contains(&subject) {
            Ok(())
        } else {
            Err(HarnessError::InvalidSubject {
                subject,
                valid: self.subject_list().to_vec(),
            }
            .into())
        }
    }
}

/// Dataset backed by `subject_NN.mat` archives in `cfg.archive_dir`.
#[derive(Debug, Clone)]
pub struct SubjectArchiveDataset {
    cfg:        HarnessConfig,
    descriptor: DatasetDescriptor,
}

impl SubjectArchiveDataset {
    /// Open/closed dataset over the archives described by `cfg`.
    pub fn new(cfg: HarnessConfig) -> Result<Self> {
        cfg.validate()?;
        let descriptor = DatasetDescriptor::open_closed(cfg.n_sessions);
        Ok(Self { cfg, descriptor })
    }

    /// Same archives, different static identity (e.g. more subjects).
    pub fn with_descriptor(cfg: HarnessConfig, descriptor: DatasetDescriptor) -> Result<Self> {
        cfg.validate()?;
        Ok(Self { cfg, descriptor })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.cfg
    }

    /// Block annotations shared by every session.
    pub fn session_annotations(&self) -> Annotations {
        Annotations::periodic(self.cfg.n_blocks(), self.cfg.block_secs, &self.cfg.block_labels)
    }
}

impl Dataset for SubjectArchiveDataset {
    fn descriptor(&self) -> &DatasetDescriptor {
        &self.descriptor
    }

    fn resolve_path(&self, subject: u32) -> Result<Vec<PathBuf>> {
        self.check_subject(subject)?;
        Ok(vec![self.cfg.archive_path(subject)])
    }

    fn load_subject(&self, subject: u32) -> Result<SubjectData> {
        let paths = self.resolve_path(subject)?;
        let path = &paths[0];
        if !path.exists() {
            return Err(HarnessError::ArchiveNotFound { path: path.clone() }.into());
        }

        let mat = MatFile::read(path)
            .map_err(|e| HarnessError::corrupt(path, format!("{e:#}")))?;
        let fs = mat
            .get("fs")
            .ok_or_else(|| HarnessError::corrupt(path, "missing field 'fs'"))?
            .scalar()
            .ok_or_else(|| HarnessError::corrupt(path, "field 'fs' is not a scalar"))?;
        if !(fs > 0.0) {
            return Err(HarnessError::corrupt(path, format!("non-positive sampling rate {fs}")).into());
        }

        let annotations = self.session_annotations();
        let mut sessions = SubjectData::new();
        for sess in 0..self.descriptor.sessions_per_subject {
            let key = format!("x{sess}");
            let x = mat
                .get(&key)
                .ok_or_else(|| HarnessError::corrupt(path, format!("missing session field '{key}'")))?
                .to_array2()
                .map_err(|e| HarnessError::corrupt(path, format!("field '{key}': {e}")))?;
            if x.nrows() != self.cfg.n_channels || x.ncols() != self.cfg.session_samples() {
                return Err(HarnessError::corrupt(
                    path,
                    format!(
                        "field '{key}' is {}x{}, expected {}x{}",
                        x.nrows(),
                        x.ncols(),
                        self.cfg.n_channels,
                        self.cfg.session_samples()
                    ),
                )
                .into());
            }

            let mut raw = RawRecording::with_uniform_channels(x, ChannelType::Eeg, fs)?;
            raw.set_annotations(annotations.clone());
            debug!(subject, session = sess, n_times = raw.n_times(), "loaded session");

            sessions.insert(SessionKey(sess), Runs::from([("run_1".to_string(), raw)]));
        }
        info!(subject, sessions = sessions.len(), archive = %path.display(), "loaded subject");
        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_defaults() {
        let ds = SubjectArchiveDataset::new(HarnessConfig::default()).unwrap();
        let d = ds.descriptor();
        assert_eq!(d.subjects, vec![1]);
        assert_eq!(d.sessions_per_subject, 10);
        assert_eq!(d.events["open"], 1);
        assert_eq!(d.events["closed"], 2);
        assert_eq!(d.interval, [0.0, 0.75]);
        assert_eq!(d.paradigm, IMAGERY);
        assert!(d.doi.is_empty());
    }

    #[test]
    fn session_keys_order_numerically() {
        let mut keys: Vec<SessionKey> = [10, 2, 9, 0, 11].into_iter().map(SessionKey).collect();
        keys.sort();
        let names: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        assert_eq!(names, ["session_0", "session_2", "session_9", "session_10", "session_11"]);
    }

    #[test]
    fn resolve_path_known_subject() {
        let ds = SubjectArchiveDataset::new(HarnessConfig::default()).unwrap();
        let paths = ds.resolve_path(1).unwrap();
        assert_eq!(paths, vec![PathBuf::from("./subject_01.mat")]);
    }

    #[test]
    fn resolve_path_unknown_subject() {
        let ds = SubjectArchiveDataset::new(HarnessConfig::default()).unwrap();
        for bad in [0, 2, 99] {
            let err = ds.resolve_path(bad).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<HarnessError>(),
                Some(HarnessError::InvalidSubject { subject, .. }) if *subject == bad
            ));
        }
    }

    #[test]
    fn missing_archive_reported() {
        let cfg = HarnessConfig {
            archive_dir: std::env::temp_dir().join("eegmi-no-such-dir"),
            ..HarnessConfig::default()
        };
        let ds = SubjectArchiveDataset::new(cfg).unwrap();
        let err = ds.load_subject(1).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<HarnessError>(),
            Some(HarnessError::ArchiveNotFound { .. })
        ));
    }
}
