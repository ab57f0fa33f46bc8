//! State shared between the acquisition and rendering loops.
//!
//! The latest-reading cell and the history store sit behind one mutex, so a
//! sample is published to both in a single critical section and readers take
//! the same lock. A reader sees either the previous complete sample or the
//! new one, never a mix.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::sample::{Field, Sample};
use crate::storage::{HistoryStore, LogSink, LogWriteError};

/// Recorded values a field needs before it gets a trend baseline.
pub const MIN_TREND_SAMPLES: usize = 2;

/// Everything behind the shared lock.
pub struct MonitorState {
    /// Most recently accepted sample, `None` before the first successful read
    pub latest: Option<Sample>,
    pub history: HistoryStore<Box<dyn LogSink + Send>>,
}

/// Consistent snapshot handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderView {
    pub sample: Sample,
    /// Mean of the last few recorded values per field, indexed by [`Field::index`]
    pub baselines: [Option<f32>; Field::COUNT],
}

impl RenderView {
    /// Trend baseline for `field`.
    pub fn baseline(&self, field: Field) -> Option<f32> {
        self.baselines[field.index()]
    }
}

/// Cloneable handle to the shared monitor state.
#[derive(Clone)]
pub struct SharedState(Arc<Mutex<MonitorState>>);

impl SharedState {
    pub fn new(history_capacity: usize, log: Box<dyn LogSink + Send>) -> Self {
        Self(Arc::new(Mutex::new(MonitorState {
            latest: None,
            history: HistoryStore::new(history_capacity, log),
        })))
    }

    /// Lock the state. A poisoned lock is recovered: every update is a plain
    /// copy of a complete sample, so the data is never half-written.
    pub fn lock(&self) -> MutexGuard<'_, MonitorState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the latest reading, then record it in the history store, under
    /// one lock.
    ///
    /// A log write failure is returned, but both in-memory updates stand.
    pub fn publish(&self, sample: Sample) -> Result<(), LogWriteError> {
        let mut state = self.lock();
        state.latest = Some(sample);
        state.history.record(sample)
    }

    /// The latest accepted sample, if any.
    pub fn latest(&self) -> Option<Sample> {
        self.lock().latest
    }

    /// The last `n` recorded values of `field`, oldest first.
    pub fn recent(&self, field: Field, n: usize) -> Vec<f32> {
        self.lock().history.recent(field, n)
    }

    pub fn history_len(&self) -> usize {
        self.lock().history.len()
    }

    /// Latest sample plus trend baselines over `trend_window` samples, read
    /// under a single lock.
    ///
    /// A field has no baseline until it has at least [`MIN_TREND_SAMPLES`]
    /// recorded values; the latest value alone says nothing about a trend.
    pub fn view(&self, trend_window: usize) -> Option<RenderView> {
        let state = self.lock();
        let sample = state.latest?;
        let baselines = Field::ALL.map(|field| {
            if state.history.recent(field, MIN_TREND_SAMPLES).len() < MIN_TREND_SAMPLES {
                return None;
            }
            state.history.mean_of_recent(field, trend_window)
        });
        Some(RenderView { sample, baselines })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::NullLog;
    use crate::testing::{FailingLog, sample_at};
    use std::thread;

    #[test]
    fn test_empty_until_first_publish() {
        let shared = SharedState::new(10, Box::new(NullLog));
        assert_eq!(shared.latest(), None);
        assert!(shared.view(5).is_none());
    }

    #[test]
    fn test_publish_sets_latest_and_history() {
        let shared = SharedState::new(10, Box::new(NullLog));
        shared.publish(sample_at(1.0)).unwrap();
        shared.publish(sample_at(2.0)).unwrap();

        assert_eq!(shared.latest().map(|s| s.timestamp), Some(2.0));
        assert_eq!(shared.history_len(), 2);
    }

    #[test]
    fn test_publish_with_failing_log_still_updates_memory() {
        let shared = SharedState::new(10, Box::new(FailingLog));
        assert!(shared.publish(sample_at(1.0)).is_err());

        assert_eq!(shared.latest().map(|s| s.timestamp), Some(1.0));
        assert_eq!(shared.history_len(), 1);
    }

    #[test]
    fn test_view_baselines_use_trend_window() {
        let shared = SharedState::new(10, Box::new(NullLog));
        for (i, co2) in [100u16, 200, 300, 400].into_iter().enumerate() {
            let mut sample = sample_at(i as f64);
            sample.co2 = co2;
            shared.publish(sample).unwrap();
        }

        let view = shared.view(2).unwrap();
        assert_eq!(view.sample.co2, 400);
        assert_eq!(view.baseline(Field::Co2), Some(350.0));
    }

    #[test]
    fn test_single_sample_has_no_baseline() {
        let shared = SharedState::new(10, Box::new(NullLog));
        shared.publish(sample_at(1.0)).unwrap();
        let first = shared.view(5).unwrap();
        assert!(first.baselines.iter().all(Option::is_none));

        shared.publish(sample_at(2.0)).unwrap();
        let second = shared.view(5).unwrap();
        assert_eq!(second.baseline(Field::Co2), Some(450.0));
    }

    #[test]
    fn test_reader_never_sees_mixed_sample() {
        let shared = SharedState::new(100, Box::new(NullLog));
        let writer = {
            let shared = shared.clone();
            thread::spawn(move || {
                for i in 0..2000u16 {
                    let mut sample = sample_at(f64::from(i));
                    // Every field carries the same marker.
                    sample.co2 = i;
                    sample.tvoc = i;
                    sample.eco2 = i;
                    shared.publish(sample).unwrap();
                }
            })
        };

        for _ in 0..2000 {
            if let Some(view) = shared.view(1) {
                let s = view.sample;
                assert_eq!(s.co2, s.tvoc);
                assert_eq!(s.co2, s.eco2);
                assert_eq!(s.timestamp, f64::from(s.co2));
                assert_eq!(view.baseline(Field::Co2), Some(f32::from(s.co2)));
            }
        }
        writer.join().unwrap();
    }
}
