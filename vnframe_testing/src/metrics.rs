//! Reading counters back from a `metrics-util` debugging recorder.
//!
//! `Snapshotter::snapshot` drains counters, so take one [`Counters`] per
//! assertion block and query it as often as needed.

use metrics_util::debugging::{DebugValue, Snapshotter};

/// Counter values captured by a single snapshot.
#[derive(Debug, Default)]
pub struct Counters {
    entries: Vec<(String, Vec<(String, String)>, u64)>,
}

impl Counters {
    /// Capture every counter currently held by `snapshotter`.
    #[must_use]
    pub fn capture(snapshotter: &Snapshotter) -> Self {
        let entries = snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .filter_map(|(key, _, _, value)| match value {
                DebugValue::Counter(count) => {
                    let labels = key
                        .key()
                        .labels()
                        .map(|l| (l.key().to_owned(), l.value().to_owned()))
                        .collect();
                    Some((key.key().name().to_owned(), labels, count))
                }
                _ => None,
            })
            .collect();
        Self { entries }
    }

    /// Sum of every counter named `name` carrying all of `labels`.
    ///
    /// Counters never recorded read as zero.
    #[must_use]
    pub fn value(&self, name: &str, labels: &[(&str, &str)]) -> u64 {
        self.entries
            .iter()
            .filter(|(counter, counter_labels, _)| {
                counter == name
                    && labels.iter().all(|(label, value)| {
                        counter_labels
                            .iter()
                            .any(|(k, v)| k == label && v == value)
                    })
            })
            .map(|(.., count)| count)
            .sum()
    }
}

/// Sum of the counters named `name` carrying all of `labels`, read from a
/// fresh snapshot.
///
/// Reading drains the recorder; use [`Counters::capture`] when more than one
/// counter is checked.
#[must_use]
pub fn counter_value(snapshotter: &Snapshotter, name: &str, labels: &[(&str, &str)]) -> u64 {
    Counters::capture(snapshotter).value(name, labels)
}
