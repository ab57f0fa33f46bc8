//! Display manager for the rendering loop
//!
//! Owns the output sink and the [`Dashboard`]. Each tick takes one
//! consistent snapshot of the shared state, selects the page for the
//! current time, draws it into a [`MonoFrame`] and pushes the frame.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use embedded_graphics::prelude::Size;
use log::{debug, info, warn};
use thiserror::Error;

use crate::framebuffer::MonoFrame;
use crate::monitor::RunFlag;
use crate::pages::Dashboard;
use crate::state::SharedState;

/// Failure to push a frame to the panel.
#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("display push failed: {0}")]
    Push(String),
    #[error("display I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Anything that can show a finished frame.
pub trait DisplaySink {
    /// Panel size in pixels.
    fn size(&self) -> Size;

    /// Show `frame`. Blocking, no timeout.
    fn display(&mut self, frame: &MonoFrame) -> Result<(), DisplayError>;
}

impl<D: DisplaySink + ?Sized> DisplaySink for Box<D> {
    fn size(&self) -> Size {
        (**self).size()
    }

    fn display(&mut self, frame: &MonoFrame) -> Result<(), DisplayError> {
        (**self).display(frame)
    }
}

/// Result of one render tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing to show yet.
    Skipped,
    /// The given page was pushed.
    Pushed(usize),
    /// The given page was drawn but the push failed.
    PushFailed(usize),
}

pub struct DisplayManager<D> {
    sink: D,
    dashboard: Dashboard,
    trend_window: usize,
    period: Duration,
    failure_backoff: Duration,
}

impl<D: DisplaySink> DisplayManager<D> {
    pub fn new(sink: D, dashboard: Dashboard, trend_window: usize) -> Self {
        Self {
            sink,
            dashboard,
            trend_window,
            period: Duration::from_millis(100),
            failure_backoff: Duration::from_secs(1),
        }
    }

    /// Set the tick period and the pause after a failed push.
    pub fn with_timing(mut self, period: Duration, failure_backoff: Duration) -> Self {
        self.period = period;
        self.failure_backoff = failure_backoff;
        self
    }

    /// Render and push one frame for wall-clock time `now_secs`.
    pub fn tick(&mut self, shared: &SharedState, now_secs: f64) -> TickOutcome {
        let Some(view) = shared.view(self.trend_window) else {
            return TickOutcome::Skipped;
        };

        let page = self.dashboard.page_at(now_secs);
        let frame = self.dashboard.render(&view, page);

        match self.sink.display(&frame) {
            Ok(()) => TickOutcome::Pushed(page),
            Err(e) => {
                warn!("Failed to update display: {}", e);
                TickOutcome::PushFailed(page)
            }
        }
    }

    /// Tick at the render period until `flag` is stopped.
    pub fn run(&mut self, shared: &SharedState, flag: &RunFlag) {
        info!("Render loop started (period {:?})", self.period);

        let mut last_page = None;
        while flag.is_running() {
            let pause = match self.tick(shared, now_secs()) {
                TickOutcome::Pushed(page) => {
                    if last_page != Some(page) {
                        if let Some(kind) = self.dashboard.pages().get(page) {
                            debug!("Showing page {:?}", kind);
                        }
                        last_page = Some(page);
                    }
                    self.period
                }
                TickOutcome::Skipped => self.period,
                TickOutcome::PushFailed(_) => self.failure_backoff,
            };
            if !flag.sleep(pause) {
                break;
            }
        }

        info!("Render loop stopped");
    }

    pub fn sink(&self) -> &D {
        &self.sink
    }
}

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::PageKind;
    use crate::storage::NullLog;
    use crate::testing::{RecordingDisplay, sample_at};

    fn manager(display: RecordingDisplay) -> DisplayManager<RecordingDisplay> {
        let dashboard = Dashboard::new(display.size(), PageKind::for_sensors(false), 6);
        DisplayManager::new(display, dashboard, 5)
    }

    #[test]
    fn test_skips_until_first_sample() {
        let display = RecordingDisplay::new(128, 128);
        let mut manager = manager(display.clone());
        let shared = SharedState::new(10, Box::new(NullLog));

        assert_eq!(manager.tick(&shared, 0.0), TickOutcome::Skipped);
        assert_eq!(display.frame_count(), 0);
    }

    #[test]
    fn test_pushes_page_for_time() {
        let display = RecordingDisplay::new(128, 128);
        let mut manager = manager(display.clone());
        let shared = SharedState::new(10, Box::new(NullLog));
        shared.publish(sample_at(1.0)).unwrap();

        assert_eq!(manager.tick(&shared, 0.0), TickOutcome::Pushed(0));
        assert_eq!(manager.tick(&shared, 6.0), TickOutcome::Pushed(1));
        assert_eq!(manager.tick(&shared, 17.0), TickOutcome::Pushed(2));
        assert_eq!(display.frame_count(), 3);
        assert!(display.last_frame().unwrap().lit_pixels() > 0);
    }

    #[test]
    fn test_push_failure_is_reported() {
        let display = RecordingDisplay::failing(128, 128);
        let mut manager = manager(display);
        let shared = SharedState::new(10, Box::new(NullLog));
        shared.publish(sample_at(1.0)).unwrap();

        assert_eq!(manager.tick(&shared, 6.0), TickOutcome::PushFailed(1));
    }

    #[test]
    fn test_run_returns_once_stopped() {
        let display = RecordingDisplay::new(128, 128);
        let mut manager = manager(display.clone());
        let shared = SharedState::new(10, Box::new(NullLog));
        let flag = RunFlag::new();
        flag.stop();

        manager.run(&shared, &flag);
        assert_eq!(display.frame_count(), 0);
    }
}
