//! Motor-imagery paradigm: turns dataset recordings into labelled trials.
//!
//! For every subject → session → run:
//!
//! ```text
//! RawRecording ─ band-pass (fmin–fmax, IIR or FIR, optional) ─ events_from_annotations
//!              ─ epoch [tmin, tmax] around each event ─→ EpochsData rows
//! ```
//!
//! Trials are ordered by subject, then session index, run key, and event order.
use anyhow::{bail, Result};
use ndarray::{stack, Array2, Array3, ArrayView3, Axis};
use tracing::{debug, warn};

use crate::dataset::{Dataset, SessionKey, IMAGERY};
use crate::epoch::{epoch_events, events_from_annotations, sample_offset, window_len};
use crate::filter::{
    apply_fir_zero_phase, apply_iir_zero_phase, butter_bandpass, design_bandpass, FilterMethod,
};
use crate::filter::iir::DEFAULT_ORDER;

/// Where one trial came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrialMetadata {
    pub subject: u32,
    pub session: SessionKey,
    pub run:     String,
}

/// Epoched trials with labels and provenance.
#[derive(Debug, Clone)]
pub struct EpochsData {
    /// `[n_trials, n_channels, n_times]`.
    pub x:        Array3<f64>,
    /// Event label per trial.
    pub labels:   Vec<String>,
    pub metadata: Vec<TrialMetadata>,
}

impl EpochsData {
    pub fn n_trials(&self) -> usize {
        self.labels.len()
    }

    /// Feature matrix `[n_trials, n_channels · n_times]`, channel-major
    /// within each row.
    pub fn flatten(&self) -> Result<Array2<f64>> {
        let (n, c, t) = self.x.dim();
        Ok(self.x.to_shape((n, c * t))?.into_owned())
    }

    /// Session per trial, the grouping for leave-one-session-out.
    pub fn sessions(&self) -> Vec<SessionKey> {
        self.metadata.iter().map(|m| m.session).collect()
    }
}

/// Motor-imagery paradigm settings.
///
/// ```
/// use eegmi::paradigm::MotorImagery;
/// let p = MotorImagery::default();
/// assert_eq!((p.fmin, p.fmax), (Some(8.0), Some(32.0)));
/// assert_eq!(p.method, eegmi::filter::FilterMethod::Iir);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MotorImagery {
    /// Lower band edge in Hz; `None` together with `fmax = None` disables
    /// filtering.
    pub fmin: Option<f64>,
    /// Upper band edge in Hz.
    pub fmax: Option<f64>,
    /// Overrides the dataset's trial start (seconds from onset).
    pub tmin: Option<f64>,
    /// Overrides the dataset's trial end (seconds from onset).
    pub tmax: Option<f64>,
    /// Band-pass implementation.
    pub method: FilterMethod,
}

impl Default for MotorImagery {
    fn default() -> Self {
        Self { fmin: Some(8.0), fmax: Some(32.0), tmin: None, tmax: None, method: FilterMethod::Iir }
    }
}

impl MotorImagery {
    /// Paradigm without the band-pass step.
    pub fn unfiltered() -> Self {
        Self { fmin: None, fmax: None, ..Self::default() }
    }

    /// Epoch every recording of `subjects` (all when `None`).
    pub fn get_data<D: Dataset + ?Sized>(
        &self,
        dataset: &D,
        subjects: Option<&[u32]>,
    ) -> Result<EpochsData> {
        let desc = dataset.descriptor();
        if desc.paradigm != IMAGERY {
            bail!("dataset {} is a {} dataset, not imagery", desc.code, desc.paradigm);
        }
        let tmin = self.tmin.unwrap_or(desc.interval[0]);
        let tmax = self.tmax.unwrap_or(desc.interval[1]);
        if tmax <= tmin {
            bail!("empty trial interval [{tmin}, {tmax}]");
        }
        let band = match (self.fmin, self.fmax) {
            (Some(lo), Some(hi)) => Some((lo, hi)),
            (None, None) => None,
            _ => bail!("fmin and fmax must both be set or both be None"),
        };

        let mut trials: Vec<Array3<f64>> = Vec::new();
        let mut labels = Vec::new();
        let mut metadata = Vec::new();

        for (subject, sessions) in dataset.get_data(subjects)? {
            for (session, runs) in sessions {
                for (run, mut raw) in runs {
                    let sfreq = raw.sfreq();
                    if let Some((lo, hi)) = band {
                        self.band_pass(raw.data_mut(), lo, hi, sfreq)?;
                    }

                    let events = events_from_annotations(&raw, &desc.events);
                    let n_times = window_len(tmin, tmax, sfreq);
                    let offset = sample_offset(tmin, sfreq);
                    let (x, kept) = epoch_events(raw.data(), &events, offset, n_times);
                    if kept.len() < events.len() {
                        warn!(
                            subject,
                            session = %session,
                            run = %run,
                            dropped = events.len() - kept.len(),
                            "epochs outside the recording were dropped"
                        );
                    }
                    debug!(subject, session = %session, run = %run, trials = kept.len(), "epoched run");

                    for &i in &kept {
                        labels.push(events[i].label.clone());
                        metadata.push(TrialMetadata {
                            subject,
                            session,
                            run: run.clone(),
                        });
                    }
                    trials.push(x);
                }
            }
        }

        let x = if trials.is_empty() {
            Array3::zeros((0, 0, 0))
        } else {
            let views: Vec<ArrayView3<'_, f64>> = trials.iter().map(|a| a.view()).collect();
            stack_trials(&views)?
        };
        Ok(EpochsData { x, labels, metadata })
    }

    fn band_pass(&self, data: &mut Array2<f64>, lo: f64, hi: f64, sfreq: f64) -> Result<()> {
        match self.method {
            FilterMethod::Iir => apply_iir_zero_phase(data, &butter_bandpass(DEFAULT_ORDER, lo, hi, sfreq)?),
            FilterMethod::Fir => apply_fir_zero_phase(data, &design_bandpass(lo, hi, sfreq)?),
        }
    }
}

/// Concatenate per-run epoch blocks along the trial axis.
fn stack_trials(blocks: &[ArrayView3<'_, f64>]) -> Result<Array3<f64>> {
    let (_, c, t) = blocks[0].dim();
    if blocks.iter().any(|b| b.dim().1 != c || b.dim().2 != t) {
        bail!("runs produce epochs of different shapes; check channel counts and sampling rates");
    }
    let trials: Vec<_> = blocks
        .iter()
        .flat_map(|b| b.outer_iter())
        .collect();
    if trials.is_empty() {
        return Ok(Array3::zeros((0, c, t)));
    }
    Ok(stack(Axis(0), &trials)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn flatten_is_channel_major() {
        let x = Array3::from_shape_fn((2, 3, 4), |(e, c, t)| (e * 100 + c * 10 + t) as f64);
        let ep = EpochsData {
            x,
            labels: vec!["open".into(), "closed".into()],
            metadata: vec![
                TrialMetadata { subject: 1, session: SessionKey(0), run: "run_1".into() };
                2
            ],
        };
        let f = ep.flatten().unwrap();
        assert_eq!(f.dim(), (2, 12));
        assert_eq!(f[[1, 0]], 100.0);
        assert_eq!(f[[1, 5]], 111.0);
        assert_eq!(ep.sessions(), vec![SessionKey(0); 2]);
    }

    #[test]
    fn stack_keeps_order_and_skips_empty_blocks() {
        let a = Array3::from_elem((2, 1, 3), 1.0);
        let b = Array3::<f64>::zeros((0, 1, 3));
        let c = Array3::from_elem((1, 1, 3), 2.0);
        let out = stack_trials(&[a.view(), b.view(), c.view()]).unwrap();
        assert_eq!(out.shape(), &[3, 1, 3]);
        assert_eq!(out[[2, 0, 0]], 2.0);
    }

    #[test]
    fn non_imagery_dataset_rejected() {
        let cfg = crate::HarnessConfig::default();
        let desc = crate::dataset::DatasetDescriptor {
            paradigm: "p300".into(),
            ..crate::dataset::DatasetDescriptor::open_closed(cfg.n_sessions)
        };
        let ds = crate::dataset::SubjectArchiveDataset::with_descriptor(cfg, desc).unwrap();
        let err = MotorImagery::default().get_data(&ds, None).unwrap_err();
        assert!(err.to_string().contains("p300"), "{err}");
    }

    #[test]
    fn both_methods_keep_in_band_tone() {
        let sfreq = 250.0;
        let tone = Array2::from_shape_fn((1, 3000), |(_, t)| {
            (2.0 * std::f64::consts::PI * 15.0 * t as f64 / sfreq).sin()
        });
        for method in [FilterMethod::Iir, FilterMethod::Fir] {
            let p = MotorImagery { method, ..MotorImagery::default() };
            let mut data = tone.clone();
            p.band_pass(&mut data, 8.0, 32.0, sfreq).unwrap();
            for t in 1000..2000 {
                approx::assert_abs_diff_eq!(data[[0, t]], tone[[0, t]], epsilon = 1e-2);
            }
        }
    }

    #[test]
    fn half_open_band_rejected() {
        let p = MotorImagery { fmax: None, ..MotorImagery::default() };
        let ds = crate::dataset::SubjectArchiveDataset::new(crate::HarnessConfig::default()).unwrap();
        assert!(p.get_data(&ds, None).is_err());
    }
}
