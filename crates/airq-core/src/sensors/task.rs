use std::time::{Duration, Instant};

use log::{info, warn};

use super::{
    ClimateReadings, HumidityCompensated, ParticulateReadings, Sensor, SensorKind,
    SensorManager, VocReadings,
};
use crate::monitor::RunFlag;
use crate::state::SharedState;

/// Result of one acquisition cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A sample was published. `log_error` is set when the durable log
    /// rejected the row.
    Recorded { log_error: bool },
    /// No sample this cycle.
    Failed {
        sensor: SensorKind,
        consecutive_failures: u32,
    },
}

/// Sensor polling loop: read, publish, sleep.
pub struct AcquisitionLoop<V, C, P> {
    manager: SensorManager<V, C, P>,
    period: Duration,
    backoff: Duration,
    consecutive_failures: u32,
}

impl<V, C, P> AcquisitionLoop<V, C, P>
where
    V: HumidityCompensated<Readings = VocReadings>,
    C: Sensor<Readings = ClimateReadings>,
    P: Sensor<Readings = ParticulateReadings>,
{
    pub fn new(manager: SensorManager<V, C, P>, period: Duration, backoff: Duration) -> Self {
        Self {
            manager,
            period,
            backoff,
            consecutive_failures: 0,
        }
    }

    /// Run one cycle without sleeping.
    pub fn cycle(&mut self, shared: &SharedState) -> CycleOutcome {
        match self.manager.read_cycle() {
            Ok(sample) => {
                self.consecutive_failures = 0;
                let log_error = match shared.publish(sample) {
                    Ok(()) => false,
                    Err(e) => {
                        warn!("Sample kept in memory but not logged: {}", e);
                        true
                    }
                };
                CycleOutcome::Recorded { log_error }
            }
            Err(e) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                warn!(
                    "Sensor cycle failed ({} in a row): {}",
                    self.consecutive_failures, e
                );
                self.manager.recover(&e);
                CycleOutcome::Failed {
                    sensor: e.sensor,
                    consecutive_failures: self.consecutive_failures,
                }
            }
        }
    }

    /// Poll until `flag` is stopped.
    ///
    /// After a fully recorded cycle the loop sleeps for what is left of the
    /// sample period. After a sensor failure or a rejected log row it sleeps
    /// the fixed backoff.
    pub fn run(&mut self, shared: &SharedState, flag: &RunFlag) {
        info!(
            "Acquisition loop started (period {:?}, backoff {:?})",
            self.period, self.backoff
        );

        while flag.is_running() {
            let started = Instant::now();
            let outcome = self.cycle(shared);
            if !flag.sleep(self.pause_after(outcome, started.elapsed())) {
                break;
            }
        }

        info!("Acquisition loop stopped");
    }

    /// How long to wait after a cycle that took `elapsed`.
    pub fn pause_after(&self, outcome: CycleOutcome, elapsed: Duration) -> Duration {
        match outcome {
            CycleOutcome::Recorded { log_error: false } => self.period.saturating_sub(elapsed),
            CycleOutcome::Recorded { log_error: true } | CycleOutcome::Failed { .. } => {
                self.backoff
            }
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn manager(&self) -> &SensorManager<V, C, P> {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut SensorManager<V, C, P> {
        &mut self.manager
    }

    /// Give the sensors back, e.g. to shut them down.
    pub fn into_manager(self) -> SensorManager<V, C, P> {
        self.manager
    }
}
