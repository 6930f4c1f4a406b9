//! Event-locked epoching.
//!
//! Converts annotations into sample-indexed events and cuts a fixed window
//! `[onset + tmin, onset + tmax]` (both ends inclusive, as `mne.Epochs`)
//! around each event.  Windows that do not fit inside the recording are
//! dropped.
use std::collections::BTreeMap;

use ndarray::{s, Array3, ArrayView2};

use crate::recording::RawRecording;

/// One event on the sample grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Sample index of the onset.
    pub sample: usize,
    pub code:   i32,
    pub label:  String,
}

/// Events for every annotation whose label is in `event_map`
/// (`mne.events_from_annotations`).  Onsets before the first sample are
/// skipped.
pub fn events_from_annotations(raw: &RawRecording, event_map: &BTreeMap<String, i32>) -> Vec<Event> {
    raw.annotations()
        .iter()
        .filter(|a| a.onset >= 0.0)
        .filter_map(|a| {
            event_map.get(&a.label).map(|&code| Event {
                sample: (a.onset * raw.sfreq()).round() as usize,
                code,
                label:  a.label.clone(),
            })
        })
        .collect()
}

/// Samples in an inclusive `[tmin, tmax]` window.
///
/// Both ends are snapped to the sample grid with round-half-to-even, as
/// NumPy does inside MNE, so `[0, 0.75]` s at 250 Hz spans samples
/// `0..=188`.
///
/// ```
/// assert_eq!(eegmi::epoch::window_len(0.0, 0.75, 250.0), 189);
/// ```
pub fn window_len(tmin: f64, tmax: f64, sfreq: f64) -> usize {
    let start = sample_offset(tmin, sfreq);
    let stop = sample_offset(tmax, sfreq);
    (stop - start).max(0) as usize + 1
}

/// Signed sample offset of `t` seconds, rounded half-to-even.
pub fn sample_offset(t: f64, sfreq: f64) -> isize {
    (t * sfreq).round_ties_even() as isize
}

/// Cut `[n_events, C, n_times]` windows starting `offset` samples from each
/// event (negative `offset` = pre-stimulus).
///
/// Returns the epochs and the indices into `events` that were kept.
pub fn epoch_events(
    data: ArrayView2<'_, f64>,
    events: &[Event],
    offset: isize,
    n_times: usize,
) -> (Array3<f64>, Vec<usize>) {
    let (n_ch, n_t) = data.dim();
    let kept: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, ev)| {
            let start = ev.sample as isize + offset;
            start >= 0 && start as usize + n_times <= n_t
        })
        .map(|(i, _)| i)
        .collect();

    let mut out = Array3::<f64>::zeros((kept.len(), n_ch, n_times));
    for (e, &i) in kept.iter().enumerate() {
        let start = (events[i].sample as isize + offset) as usize;
        out.slice_mut(s![e, .., ..])
            .assign(&data.slice(s![.., start..start + n_times]));
    }
    (out, kept)
}
