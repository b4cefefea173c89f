//! Scripted stand-ins for the live link and the trace sink.

use crate::control_loop::Actuators;
use crate::error::LinkError;
use crate::telemetry::{AeroReadings, SensorStreams};
use crate::trace::TraceSink;
use crate::types::FlightCommand;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, Default)]
pub struct Readings {
    pub ut: f64,
    pub altitude: f64,
    pub apoapsis: f64,
    pub thrust: f64,
    pub aero: AeroReadings,
    pub fail_altitude: bool,
    pub aero_reads: usize,
}

/// Sensor streams whose values the test sets between ticks. Clones share
/// the same readings.
#[derive(Debug, Clone, Default)]
pub struct ScriptedStreams {
    readings: Rc<RefCell<Readings>>,
}

impl ScriptedStreams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, f: impl FnOnce(&mut Readings)) {
        f(&mut self.readings.borrow_mut());
    }

    pub fn aero_reads(&self) -> usize {
        self.readings.borrow().aero_reads
    }
}

impl SensorStreams for ScriptedStreams {
    fn universal_time(&mut self) -> Result<f64, LinkError> {
        Ok(self.readings.borrow().ut)
    }

    fn mean_altitude(&mut self) -> Result<f64, LinkError> {
        let r = self.readings.borrow();
        if r.fail_altitude {
            return Err(LinkError::new("mean altitude", "stream closed"));
        }
        Ok(r.altitude)
    }

    fn apoapsis_altitude(&mut self) -> Result<f64, LinkError> {
        Ok(self.readings.borrow().apoapsis)
    }

    fn thrust(&mut self) -> Result<f64, LinkError> {
        Ok(self.readings.borrow().thrust)
    }

    fn aero(&mut self) -> Result<AeroReadings, LinkError> {
        let mut r = self.readings.borrow_mut();
        r.aero_reads += 1;
        Ok(r.aero)
    }
}

/// Trace sink that keeps every export in memory.
#[derive(Debug, Clone, Default)]
pub struct ExportLog {
    exports: Rc<RefCell<Vec<Vec<String>>>>,
}

impl ExportLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exports(&self) -> Vec<Vec<String>> {
        self.exports.borrow().clone()
    }
}

impl TraceSink for ExportLog {
    fn write_rows(&mut self, rows: &[String]) -> std::io::Result<()> {
        self.exports.borrow_mut().push(rows.to_vec());
        Ok(())
    }
}

/// Actuators that only remember what they were told.
#[derive(Debug, Clone, Default)]
pub struct CommandLog {
    commands: Rc<RefCell<Vec<FlightCommand>>>,
}

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<FlightCommand> {
        self.commands.borrow().clone()
    }
}

impl Actuators for CommandLog {
    fn execute(&mut self, command: FlightCommand) -> Result<(), LinkError> {
        self.commands.borrow_mut().push(command);
        Ok(())
    }
}
