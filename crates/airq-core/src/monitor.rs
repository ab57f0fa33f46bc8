//! Orchestration of the acquisition and rendering loops.
//!
//! [`Monitor`] is the single context object: it owns the configuration,
//! the shared state, the sensors and the display. [`Monitor::start`] moves
//! the two loops onto their own threads; [`RunningMonitor::stop`] clears the
//! run flag, joins both threads and releases the sensors.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::Local;
use log::{error, info};

use crate::config::MonitorConfig;
use crate::display_manager::{DisplayManager, DisplaySink};
use crate::error::MonitorError;
use crate::pages::{Dashboard, PageKind};
use crate::sensors::{
    AcquisitionLoop, ClimateReadings, HumidityCompensated, ParticulateReadings, Sensor,
    SensorManager, VocReadings,
};
use crate::state::SharedState;
use crate::storage::{CsvLog, LogSink, LogWriteError, NullLog};

const ACQUISITION_THREAD: &str = "airq-acquisition";
const RENDER_THREAD: &str = "airq-render";

struct FlagInner {
    running: AtomicBool,
    lock: Mutex<()>,
    wake: Condvar,
}

/// Shared "keep running" flag with an interruptible sleep.
#[derive(Clone)]
pub struct RunFlag(Arc<FlagInner>);

impl Default for RunFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl RunFlag {
    /// A flag in the running state.
    pub fn new() -> Self {
        Self(Arc::new(FlagInner {
            running: AtomicBool::new(true),
            lock: Mutex::new(()),
            wake: Condvar::new(),
        }))
    }

    pub fn is_running(&self) -> bool {
        self.0.running.load(Ordering::Acquire)
    }

    /// Clear the flag and wake every sleeper.
    pub fn stop(&self) {
        self.0.running.store(false, Ordering::Release);
        let _guard = self.0.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.0.wake.notify_all();
    }

    /// Sleep for `duration` or until stopped.
    ///
    /// Returns `true` if the full duration elapsed while still running.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let mut guard = self.0.lock.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if !self.is_running() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            guard = self
                .0
                .wake
                .wait_timeout(guard, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }
}

/// Open the sample log described by `config`.
///
/// A new CSV file named after the current local time is created in
/// `log_dir`; with logging disabled rows are discarded.
pub fn open_log(
    config: &MonitorConfig,
    with_particulates: bool,
) -> Result<Box<dyn LogSink + Send>, LogWriteError> {
    if !config.log_enabled {
        info!("Sample logging disabled");
        return Ok(Box::new(NullLog));
    }
    let log = CsvLog::create_in(&config.log_dir, Local::now(), with_particulates)?;
    Ok(Box::new(log))
}

/// A configured monitor that has not been started.
pub struct Monitor<V, C, P, D> {
    config: MonitorConfig,
    shared: SharedState,
    acquisition: AcquisitionLoop<V, C, P>,
    display: DisplayManager<D>,
}

impl<V, C, P, D> Monitor<V, C, P, D>
where
    V: HumidityCompensated<Readings = VocReadings> + Send + 'static,
    C: Sensor<Readings = ClimateReadings> + Send + 'static,
    P: Sensor<Readings = ParticulateReadings> + Send + 'static,
    D: DisplaySink + Send + 'static,
{
    pub fn new(
        config: MonitorConfig,
        sensors: SensorManager<V, C, P>,
        display: D,
        log: Box<dyn LogSink + Send>,
    ) -> Self {
        let shared = SharedState::new(config.history_capacity, log);

        let pages = PageKind::for_sensors(sensors.has_particulates());
        let dashboard = Dashboard::new(display.size(), pages, config.pages.page_seconds)
            .with_trend_threshold(config.pages.trend_threshold)
            .with_indicators(config.indicators());
        let display = DisplayManager::new(display, dashboard, config.pages.trend_window)
            .with_timing(config.render_period(), config.failure_backoff());

        let acquisition =
            AcquisitionLoop::new(sensors, config.sample_period(), config.failure_backoff());

        Self {
            config,
            shared,
            acquisition,
            display,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn shared(&self) -> &SharedState {
        &self.shared
    }

    /// Start the sensors and spawn both loops.
    pub fn start(self) -> Result<RunningMonitor<V, C, P>, MonitorError> {
        let Self {
            shared,
            mut acquisition,
            mut display,
            ..
        } = self;

        acquisition.manager_mut().init();
        let flag = RunFlag::new();

        let acquisition_handle = {
            let shared = shared.clone();
            let flag = flag.clone();
            thread::Builder::new()
                .name(ACQUISITION_THREAD.into())
                .spawn(move || {
                    acquisition.run(&shared, &flag);
                    acquisition
                })
                .map_err(|source| MonitorError::ThreadSpawn {
                    name: ACQUISITION_THREAD,
                    source,
                })?
        };

        let render_handle = {
            let shared = shared.clone();
            let flag = flag.clone();
            thread::Builder::new()
                .name(RENDER_THREAD.into())
                .spawn(move || display.run(&shared, &flag))
        };

        let render_handle = match render_handle {
            Ok(handle) => handle,
            Err(source) => {
                flag.stop();
                if let Ok(acquisition) = acquisition_handle.join() {
                    acquisition.into_manager().shutdown();
                }
                return Err(MonitorError::ThreadSpawn {
                    name: RENDER_THREAD,
                    source,
                });
            }
        };

        info!("Monitor started");
        Ok(RunningMonitor {
            flag,
            shared,
            acquisition: acquisition_handle,
            render: render_handle,
        })
    }
}

/// Handle to a started monitor.
pub struct RunningMonitor<V, C, P> {
    flag: RunFlag,
    shared: SharedState,
    acquisition: JoinHandle<AcquisitionLoop<V, C, P>>,
    render: JoinHandle<()>,
}

impl<V, C, P> RunningMonitor<V, C, P>
where
    V: HumidityCompensated<Readings = VocReadings>,
    C: Sensor<Readings = ClimateReadings>,
    P: Sensor<Readings = ParticulateReadings>,
{
    /// Read-side access for status output.
    pub fn shared(&self) -> &SharedState {
        &self.shared
    }

    pub fn is_running(&self) -> bool {
        self.flag.is_running()
    }

    /// Stop both loops, wait for them, then stop the sensors.
    pub fn stop(self) -> Result<(), MonitorError> {
        info!("Stopping monitor");
        self.flag.stop();

        let render = self.render.join();
        let acquisition = self.acquisition.join();

        match acquisition {
            Ok(acquisition) => acquisition.into_manager().shutdown(),
            Err(_) => {
                error!("{} thread panicked; sensors were not stopped", ACQUISITION_THREAD);
                return Err(MonitorError::TaskPanicked(ACQUISITION_THREAD));
            }
        }

        if render.is_err() {
            error!("{} thread panicked", RENDER_THREAD);
            return Err(MonitorError::TaskPanicked(RENDER_THREAD));
        }

        info!("Monitor stopped");
        Ok(())
    }
}
