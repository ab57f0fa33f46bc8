//! Hardware-independent core library for the airq air quality monitor
//!
//! This crate contains everything that does not touch hardware: the sample
//! model, sensor port traits and mock sensors, humidity compensation, the
//! bounded history store with its CSV log, the shared state between the
//! acquisition and rendering loops, the rotating dashboard pages and the
//! monitor that runs both loops on their own threads.
//!
//! Real sensor drivers and panels plug in through [`sensors::Sensor`] and
//! [`display_manager::DisplaySink`].

pub mod compensation;
pub mod config;
pub mod display_manager;
pub mod error;
pub mod framebuffer;
pub mod metrics;
pub mod monitor;
pub mod pages;
pub mod sample;
pub mod sensors;
pub mod state;
pub mod storage;

#[cfg(test)]
mod testing;

pub use config::MonitorConfig;
pub use error::MonitorError;
pub use monitor::{Monitor, RunFlag, RunningMonitor};
pub use sample::{Field, Sample};
