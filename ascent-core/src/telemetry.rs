use crate::error::{AscentError, LinkError};
use crate::trace::{CsvRow, TraceSink, trace_rows, write_fixed};
use log::{info, warn};

/// Aerodynamic readings that are only needed for the recorded trace.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AeroReadings {
    /// Drag force vector (N), in the flight reference frame.
    pub drag: [f64; 3],
    /// m/s
    pub true_air_speed: f64,
    pub mach: f64,
    /// kg/m^3
    pub density: f64,
    /// Pa
    pub dynamic_pressure: f64,
    /// K
    pub static_air_temperature: f64,
}

/// Live sensor streams of the vehicle. Every read returns the most recent
/// value published by the link.
pub trait SensorStreams {
    /// Universal time of the game clock (s).
    fn universal_time(&mut self) -> Result<f64, LinkError>;
    /// Altitude above sea level (m).
    fn mean_altitude(&mut self) -> Result<f64, LinkError>;
    /// Apoapsis of the current orbit above sea level (m).
    fn apoapsis_altitude(&mut self) -> Result<f64, LinkError>;
    /// Current total engine thrust (N).
    fn thrust(&mut self) -> Result<f64, LinkError>;
    fn aero(&mut self) -> Result<AeroReadings, LinkError>;
}

/// Immutable view of the vehicle handed to the state machine each tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TelemetrySnapshot {
    /// Seconds since the mission epoch. Only advances while recording.
    pub elapsed: f64,
    pub altitude: f64,
    pub apoapsis: f64,
    pub thrust: f64,
}

/// One row of the ascent trace.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TelemetrySample {
    pub elapsed: f64,
    pub altitude: f64,
    /// Magnitude of the drag vector.
    pub drag: f64,
    pub true_air_speed: f64,
    pub mach: f64,
    pub density: f64,
    pub dynamic_pressure: f64,
    pub static_air_temperature: f64,
}

impl TelemetrySample {
    pub fn new(elapsed: f64, altitude: f64, aero: &AeroReadings) -> Self {
        Self {
            elapsed,
            altitude,
            drag: magnitude(aero.drag),
            true_air_speed: aero.true_air_speed,
            mach: aero.mach,
            density: aero.density,
            dynamic_pressure: aero.dynamic_pressure,
            static_air_temperature: aero.static_air_temperature,
        }
    }
}

impl CsvRow for TelemetrySample {
    const CSV_HEADER: &'static str = "ut,altitude,drag,TAS,mach,density,dynamic_pressure,temperature";

    fn format_payload<W: core::fmt::Write>(&self, cursor: &mut W) -> core::fmt::Result {
        write_fixed(cursor, self.elapsed, 3)?;
        cursor.write_char(',')?;
        write_fixed(cursor, self.altitude, 2)?;
        cursor.write_char(',')?;
        write_fixed(cursor, self.drag, 3)?;
        cursor.write_char(',')?;
        write_fixed(cursor, self.true_air_speed, 3)?;
        // Unrounded, density and pressure span several orders of magnitude.
        write!(
            cursor,
            ",{},{},{},",
            self.mach, self.density, self.dynamic_pressure
        )?;
        write_fixed(cursor, self.static_air_temperature, 2)
    }
}

pub fn magnitude(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

/// Owns the sensor streams, the mission clock and the ascent trace.
pub struct Telemetry<S: SensorStreams, K: TraceSink> {
    streams: S,
    sink: K,
    altitude: f64,
    apoapsis: f64,
    thrust: f64,
    /// Universal time captured by `init_time`.
    mission_start: f64,
    epoch_set: bool,
    elapsed: f64,
    recording: bool,
    exported: bool,
    samples: Vec<TelemetrySample>,
}

impl<S: SensorStreams, K: TraceSink> Telemetry<S, K> {
    pub fn new(streams: S, sink: K) -> Self {
        Self {
            streams,
            sink,
            altitude: 0.0,
            apoapsis: 0.0,
            thrust: 0.0,
            mission_start: 0.0,
            epoch_set: false,
            elapsed: 0.0,
            recording: false,
            exported: false,
            samples: Vec::new(),
        }
    }

    /// Captures the current universal time as the mission epoch.
    ///
    /// Call once, right before the first control loop iteration. A second
    /// call moves the epoch.
    pub fn init_time(&mut self) -> Result<(), AscentError> {
        let now = self.streams.universal_time()?;
        if self.epoch_set {
            warn!(
                "Mission epoch reset from UT {:.2} to UT {:.2}",
                self.mission_start, now
            );
        }
        self.mission_start = now;
        self.epoch_set = true;
        Ok(())
    }

    /// Refreshes the readings the flight logic needs and, while recording,
    /// appends one sample to the trace.
    pub fn update(&mut self) -> Result<TelemetrySnapshot, AscentError> {
        // Required for flying
        self.altitude = self.streams.mean_altitude()?;
        self.apoapsis = self.streams.apoapsis_altitude()?;
        self.thrust = self.streams.thrust()?;

        if self.recording {
            // Only required for the trace
            self.elapsed = self.streams.universal_time()? - self.mission_start;
            let aero = self.streams.aero()?;
            self.samples
                .push(TelemetrySample::new(self.elapsed, self.altitude, &aero));
        }

        Ok(self.snapshot())
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            elapsed: self.elapsed,
            altitude: self.altitude,
            apoapsis: self.apoapsis,
            thrust: self.thrust,
        }
    }

    pub fn start_recording(&mut self) {
        if self.exported {
            warn!("Telemetry trace already exported, recording stays off");
            return;
        }
        self.recording = true;
    }

    /// Stops recording and exports the whole trace. Only the first call
    /// exports; later calls do nothing.
    pub fn stop_recording(&mut self) -> Result<(), AscentError> {
        self.recording = false;
        if self.exported {
            return Ok(());
        }
        // Set before writing: a failed export is not retried.
        self.exported = true;
        info!(
            "Recording stopped at {:.0} m after {} samples",
            self.altitude,
            self.samples.len()
        );
        self.sink.write_rows(&trace_rows(&self.samples))?;
        Ok(())
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn is_exported(&self) -> bool {
        self.exported
    }

    pub fn samples(&self) -> &[TelemetrySample] {
        &self.samples
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn altitude(&self) -> f64 {
        self.altitude
    }

    pub fn apoapsis(&self) -> f64 {
        self.apoapsis
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }
}
