//! Event annotations attached to a recording.
//!
//! Mirrors `mne.Annotations`: an ordered list of `(onset, duration, label)`
//! triples with times in seconds relative to the start of the recording.

/// One annotated interval.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Seconds from the first sample.
    pub onset:    f64,
    /// Seconds.
    pub duration: f64,
    pub label:    String,
}

/// Ordered annotation list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotations {
    items: Vec<Annotation>,
}

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    /// `n` back-to-back blocks of `period` seconds starting at 0, labels
    /// cycling through `labels`.
    ///
    /// The open/closed protocol is `periodic(12, 5.0, &["open", "closed"])`:
    /// onsets 0, 5, …, 55 alternating open/closed, covering `[0, 60)`.
    ///
    /// ```
    /// use eegmi::Annotations;
    /// let a = Annotations::periodic(12, 5.0, &["open", "closed"]);
    /// assert_eq!(a.len(), 12);
    /// assert_eq!(a.get(11).unwrap().onset, 55.0);
    /// assert_eq!(a.get(11).unwrap().label, "closed");
    /// ```
    pub fn periodic<S: AsRef<str>>(n: usize, period: f64, labels: &[S]) -> Self {
        if labels.is_empty() {
            return Self::default();
        }
        let items = (0..n)
            .map(|i| Annotation {
                onset:    i as f64 * period,
                duration: period,
                label:    labels[i % labels.len()].as_ref().to_string(),
            })
            .collect();
        Self { items }
    }

    /// Append one annotation, keeping onsets sorted (stable for ties).
    pub fn push(&mut self, onset: f64, duration: f64, label: &str) {
        let idx = self.items.partition_point(|a| a.onset <= onset);
        self.items.insert(idx, Annotation { onset, duration, label: label.to_string() });
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&Annotation> {
        self.items.get(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Annotation> {
        self.items.iter()
    }

    /// Distinct labels in order of first appearance.
    pub fn labels(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for a in &self.items {
            if !out.contains(&a.label.as_str()) {
                out.push(&a.label);
            }
        }
        out
    }
}

impl<'a> IntoIterator for &'a Annotations {
    type Item = &'a Annotation;
    type IntoIter = std::slice::Iter<'a, Annotation>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn periodic_covers_session_without_gaps() {
        let a = Annotations::periodic(12, 5.0, &["open", "closed"]);
        let mut end = 0.0;
        for (i, ann) in a.iter().enumerate() {
            assert_eq!(ann.onset, end, "gap or overlap before block {i}");
            assert_eq!(ann.duration, 5.0);
            assert_eq!(ann.label, if i % 2 == 0 { "open" } else { "closed" });
            end = ann.onset + ann.duration;
        }
        assert_eq!(end, 60.0);
    }

    #[test]
    fn push_keeps_onsets_sorted() {
        let mut a = Annotations::new();
        a.push(3.0, 1.0, "b");
        a.push(1.0, 1.0, "a");
        a.push(3.0, 0.5, "c");
        let labels: Vec<&str> = a.iter().map(|x| x.label.as_str()).collect();
        assert_eq!(labels, ["a", "b", "c"]);
        assert_eq!(a.labels(), ["a", "b", "c"]);
    }

    #[test]
    fn empty_label_set_gives_no_blocks() {
        let a = Annotations::periodic::<&str>(4, 1.0, &[]);
        assert!(a.is_empty());
    }
}
