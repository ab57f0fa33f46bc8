use std::collections::VecDeque;

use log::debug;

use super::{LogSink, LogWriteError};
use crate::sample::{Field, Sample};

/// Bounded in-memory history of samples paired with a durable log.
///
/// All fields live in one ring of composite [`Sample`] records, so every
/// field series and the timestamp series always have the same length and
/// advance together. Once `capacity` is reached the oldest sample is evicted
/// on each insert.
pub struct HistoryStore<L: LogSink> {
    samples: VecDeque<Sample>,
    capacity: usize,
    log: L,
}

impl<L: LogSink> HistoryStore<L> {
    /// Create an empty store. A capacity of zero is treated as one.
    pub fn new(capacity: usize, log: L) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            log,
        }
    }

    /// Append `sample` to the ring and write one log row.
    ///
    /// The ring append happens first and is kept even if the log write fails;
    /// the error is handed back to the caller.
    pub fn record(&mut self, sample: Sample) -> Result<(), LogWriteError> {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);

        debug!("{}", sample);

        self.log.append(&sample)
    }

    /// The last `n` values of `field` in chronological order.
    ///
    /// Returns fewer than `n` values when the history is shorter. Samples that
    /// do not carry the field (particulates without a particulate sensor) are
    /// skipped.
    pub fn recent(&self, field: Field, n: usize) -> Vec<f32> {
        let mut values: Vec<f32> = self
            .samples
            .iter()
            .rev()
            .filter_map(|s| field.of(s))
            .take(n)
            .collect();
        values.reverse();
        values
    }

    /// Mean of the last `n` values of `field`, or `None` if there are none.
    pub fn mean_of_recent(&self, field: Field, n: usize) -> Option<f32> {
        let values = self.recent(field, n);
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f32>() / values.len() as f32)
    }

    /// Timestamps of all retained samples, oldest first.
    pub fn timestamps(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.timestamp).collect()
    }

    /// Iterate retained samples, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    /// Most recently recorded sample.
    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::NullLog;
    use crate::testing::{FailingLog, sample_at};
    use proptest::prelude::*;

    fn co2_sample(i: u16) -> Sample {
        let mut sample = sample_at(f64::from(i));
        sample.co2 = i;
        sample
    }

    #[test]
    fn test_evicts_oldest_at_capacity() {
        let mut store = HistoryStore::new(3, NullLog);
        for i in 0..5 {
            store.record(co2_sample(i)).unwrap();
        }

        assert_eq!(store.len(), 3);
        assert_eq!(store.recent(Field::Co2, 10), vec![2.0, 3.0, 4.0]);
        assert_eq!(store.timestamps(), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_recent_returns_suffix() {
        let mut store = HistoryStore::new(10, NullLog);
        for i in 0..6 {
            store.record(co2_sample(i)).unwrap();
        }

        assert_eq!(store.recent(Field::Co2, 2), vec![4.0, 5.0]);
        assert!(store.recent(Field::Co2, 0).is_empty());
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let mut store = HistoryStore::new(0, NullLog);
        store.record(co2_sample(1)).unwrap();
        store.record(co2_sample(2)).unwrap();

        assert_eq!(store.capacity(), 1);
        assert_eq!(store.latest().map(|s| s.co2), Some(2));
    }

    #[test]
    fn test_log_failure_keeps_memory_append() {
        let mut store = HistoryStore::new(4, FailingLog);
        let result = store.record(co2_sample(7));

        assert!(matches!(result, Err(LogWriteError::Write(_))));
        assert_eq!(store.len(), 1);
        assert_eq!(store.latest().map(|s| s.co2), Some(7));
    }

    #[test]
    fn test_mean_of_recent() {
        let mut store = HistoryStore::new(10, NullLog);
        assert_eq!(store.mean_of_recent(Field::Co2, 5), None);

        for i in [400, 410, 420, 430, 440, 450] {
            store.record(co2_sample(i)).unwrap();
        }
        assert_eq!(store.mean_of_recent(Field::Co2, 5), Some(430.0));
    }

    #[test]
    fn test_missing_particulates_are_skipped() {
        let mut store = HistoryStore::new(10, NullLog);
        let mut without = sample_at(1.0);
        without.particulates = None;
        store.record(sample_at(0.0)).unwrap();
        store.record(without).unwrap();

        assert_eq!(store.recent(Field::Pm2_5, 5).len(), 1);
        assert_eq!(store.recent(Field::Temperature, 5).len(), 2);
    }

    proptest! {
        #[test]
        fn prop_ring_holds_most_recent_in_order(
            capacity in 1usize..64,
            values in proptest::collection::vec(any::<u16>(), 0..200),
        ) {
            let mut store = HistoryStore::new(capacity, NullLog);
            for (i, v) in values.iter().enumerate() {
                let mut sample = sample_at(i as f64);
                sample.co2 = *v;
                store.record(sample).unwrap();
            }

            let kept = values.len().min(capacity);
            let expected: Vec<f32> = values[values.len() - kept..]
                .iter()
                .map(|v| f32::from(*v))
                .collect();

            prop_assert!(store.len() <= capacity);
            prop_assert_eq!(store.len(), store.timestamps().len());
            prop_assert_eq!(store.recent(Field::Co2, capacity), expected);
        }

        #[test]
        fn prop_recent_is_bounded_suffix(
            len in 0usize..50,
            k in 0usize..80,
        ) {
            let mut store = HistoryStore::new(64, NullLog);
            for i in 0..len {
                store.record(co2_sample(i as u16)).unwrap();
            }

            let recent = store.recent(Field::Co2, k);
            let expect_len = k.min(len);
            prop_assert_eq!(recent.len(), expect_len);
            let suffix: Vec<f32> = (len - expect_len..len).map(|i| i as f32).collect();
            prop_assert_eq!(recent, suffix);
        }
    }
}
