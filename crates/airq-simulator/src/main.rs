//! Desktop simulator for the airq air quality monitor.
//!
//! Runs the full acquisition and rendering pipeline against mock sensors.
//! Frames are written as scaled PNG files to `debug_display/` (the most
//! recent few are kept), samples go to the CSV log configured in
//! `MonitorConfig`, and a summary of the latest reading is printed once per
//! second.
//!
//! Set `AIRQ_CONFIG` to a TOML file to override the defaults, and
//! `RUST_LOG=debug` to see every recorded sample. Press Enter to stop.

use std::collections::VecDeque;
use std::fs;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{BinaryColorTheme, OutputSettingsBuilder, SimulatorDisplay};
use log::{debug, error, info};

use airq_core::display_manager::{DisplayError, DisplaySink};
use airq_core::framebuffer::MonoFrame;
use airq_core::monitor::open_log;
use airq_core::sensors::SensorManager;
use airq_core::sensors::mock::{MockClimateSensor, MockParticulateSensor, MockVocSensor};
use airq_core::state::SharedState;
use airq_core::storage::csv_log::format_timestamp;
use airq_core::{Monitor, MonitorConfig, MonitorError, RunFlag};

/// Directory for rendered frames.
const FRAME_DIR: &str = "debug_display";

/// Number of frame files kept on disk.
const FRAMES_KEPT: usize = 10;

/// Pixel scale factor for the PNG output.
const FRAME_SCALE: u32 = 4;

/// Interval between console summaries.
const SUMMARY_INTERVAL: Duration = Duration::from_secs(1);

/// Inject a climate sensor failure this often to exercise recovery.
const CLIMATE_FAIL_EVERY: u32 = 120;

/// Display sink that writes each new frame to a PNG file.
struct PngFrameSink {
    display: SimulatorDisplay<BinaryColor>,
    dir: PathBuf,
    written: VecDeque<PathBuf>,
    frame_count: u64,
    last_frame: Option<MonoFrame>,
}

impl PngFrameSink {
    fn new(size: Size, dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            display: SimulatorDisplay::new(size),
            dir,
            written: VecDeque::with_capacity(FRAMES_KEPT + 1),
            frame_count: 0,
            last_frame: None,
        })
    }
}

impl DisplaySink for PngFrameSink {
    fn size(&self) -> Size {
        self.display.size()
    }

    fn display(&mut self, frame: &MonoFrame) -> Result<(), DisplayError> {
        // Unchanged frames are not rewritten.
        if self.last_frame.as_ref() == Some(frame) {
            return Ok(());
        }

        let Ok(()) = self.display.clear(BinaryColor::Off);
        let Ok(()) = self.display.draw_iter(frame.pixels());

        let settings = OutputSettingsBuilder::new()
            .scale(FRAME_SCALE)
            .theme(BinaryColorTheme::OledWhite)
            .build();
        let path = self
            .dir
            .join(format!("display_frame_{:06}.png", self.frame_count));
        self.display
            .to_rgb_output_image(&settings)
            .save_png(&path)
            .map_err(|e| DisplayError::Push(format!("{}: {}", path.display(), e)))?;

        self.frame_count += 1;
        self.last_frame = Some(frame.clone());
        self.written.push_back(path);

        while self.written.len() > FRAMES_KEPT {
            if let Some(old) = self.written.pop_front()
                && let Err(e) = fs::remove_file(&old)
            {
                debug!("Could not remove {}: {}", old.display(), e);
            }
        }
        Ok(())
    }
}

fn load_config() -> Result<MonitorConfig, MonitorError> {
    match std::env::var_os("AIRQ_CONFIG") {
        Some(path) => {
            info!("Loading configuration from {}", PathBuf::from(&path).display());
            Ok(MonitorConfig::load(path)?)
        }
        None => Ok(MonitorConfig::default()),
    }
}

fn print_summary(shared: &SharedState) {
    let Some(sample) = shared.latest() else {
        println!("Waiting for the first reading...");
        return;
    };

    println!("\x1b[2J\x1b[H");
    println!("Air Quality Monitor - {}", format_timestamp(sample.timestamp));
    println!("{}", "-".repeat(50));
    println!("Temperature: {:.1}°C", sample.temperature);
    println!("Humidity: {:.1}%", sample.humidity);
    println!("CO2: {} ppm", sample.co2);
    println!("TVOC: {} ppb", sample.tvoc);
    println!("eCO2: {} ppm", sample.eco2);
    if let Some(pm) = sample.particulates {
        println!(
            "PM1.0/2.5/10: {:.1} / {:.1} / {:.1} µg/m³",
            pm.pm1, pm.pm2_5, pm.pm10
        );
    }
    println!("History: {} samples", shared.history_len());
    println!();
    println!("Press Enter to stop.");
}

fn run() -> Result<(), MonitorError> {
    let config = load_config()?;
    let with_particulates = config.sensors.particulates;

    let sensors = SensorManager::new(
        MockVocSensor::new(),
        MockClimateSensor::new().with_fail_every(CLIMATE_FAIL_EVERY),
        with_particulates.then(MockParticulateSensor::new),
    );

    let display =
        PngFrameSink::new(config.display_size(), FRAME_DIR).map_err(DisplayError::from)?;
    let log = open_log(&config, with_particulates)?;

    let running = Monitor::new(config, sensors, display, log).start()?;

    let quit = RunFlag::new();
    {
        let quit = quit.clone();
        thread::spawn(move || {
            let mut line = String::new();
            let _ = io::stdin().lock().read_line(&mut line);
            quit.stop();
        });
    }

    while quit.sleep(SUMMARY_INTERVAL) {
        print_summary(running.shared());
    }

    running.stop()
}

fn main() -> ExitCode {
    env_logger::init();

    info!("Starting airq simulator");
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
