use crate::error::{AscentError, LinkError};
use crate::state_machine::{ATMOSPHERE_EXIT_ALTITUDE_M, AscentController, Transition};
use crate::telemetry::{SensorStreams, Telemetry};
use crate::trace::TraceSink;
use crate::types::{FlightCommand, SpeedMode};
use log::{debug, info};
use std::thread::sleep;
use std::time::{Duration, Instant};

/// Target period of one control loop iteration (10 Hz).
pub const CONTROL_PERIOD: Duration = Duration::from_millis(100);

/// Command side of the live control link.
pub trait Actuators {
    fn execute(&mut self, command: FlightCommand) -> Result<(), LinkError>;
}

/// Sends `commands` in order. `Settle` blocks the caller instead of being sent.
pub fn dispatch<A: Actuators>(
    actuators: &mut A,
    commands: &[FlightCommand],
) -> Result<(), LinkError> {
    for &command in commands {
        match command {
            FlightCommand::Settle(delay) => sleep(delay),
            other => actuators.execute(other)?,
        }
    }
    Ok(())
}

/// Time left in the current period, or `None` when the iteration overran.
pub fn idle_time(period: Duration, spent: Duration) -> Option<Duration> {
    period.checked_sub(spent).filter(|idle| !idle.is_zero())
}

/// Fixed-cadence loop that flies the ascent: reads telemetry, advances the
/// state machine, sends the resulting commands and ends the trace recording
/// on leaving the atmosphere.
pub struct FlightLoop<S: SensorStreams, K: TraceSink, A: Actuators> {
    telemetry: Telemetry<S, K>,
    controller: AscentController,
    actuators: A,
    period: Duration,
}

impl<S: SensorStreams, K: TraceSink, A: Actuators> FlightLoop<S, K, A> {
    pub fn new(telemetry: Telemetry<S, K>, actuators: A) -> Self {
        Self {
            telemetry,
            controller: AscentController::new(),
            actuators,
            period: CONTROL_PERIOD,
        }
    }

    pub fn with_controller(mut self, controller: AscentController) -> Self {
        self.controller = controller;
        self
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Puts the vehicle in the safe state of the current phase.
    pub fn arm(&mut self) -> Result<(), AscentError> {
        info!("{}", self.controller.phase().announcement());
        dispatch(&mut self.actuators, self.controller.arm())?;
        Ok(())
    }

    /// Runs until the link or the trace export fails.
    pub fn run(&mut self) -> Result<(), AscentError> {
        self.telemetry.init_time()?;
        loop {
            let started = Instant::now();
            self.tick(started)?;

            let spent = started.elapsed();
            match idle_time(self.period, spent) {
                Some(idle) => sleep(idle),
                None => debug!(
                    "Control loop overran: {}ms spent of {}ms",
                    spent.as_millis(),
                    self.period.as_millis()
                ),
            }
        }
    }

    /// One control loop iteration, evaluated at `now`.
    pub fn tick(&mut self, now: Instant) -> Result<Option<Transition>, AscentError> {
        // Prograde has to be the surface prograde through the whole ascent.
        self.actuators
            .execute(FlightCommand::SetSpeedMode(SpeedMode::Surface))?;

        let snapshot = self.telemetry.update()?;

        let transition = self.controller.update(&snapshot, now);
        if let Some(t) = &transition {
            info!("T+{:.1}s {}", snapshot.elapsed, t.to.announcement());
            dispatch(&mut self.actuators, t.commands)?;
        }

        if self.telemetry.is_recording() && snapshot.altitude > ATMOSPHERE_EXIT_ALTITUDE_M {
            self.telemetry.stop_recording()?;
        }

        Ok(transition)
    }

    pub fn telemetry(&self) -> &Telemetry<S, K> {
        &self.telemetry
    }

    pub fn telemetry_mut(&mut self) -> &mut Telemetry<S, K> {
        &mut self.telemetry
    }

    pub fn controller(&self) -> &AscentController {
        &self.controller
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::AscentState;
    use crate::test_util::{CommandLog, ExportLog, ScriptedStreams};
    use crate::types::FlightPhase;

    type TestLoop = FlightLoop<ScriptedStreams, ExportLog, CommandLog>;

    fn flight_loop() -> (ScriptedStreams, CommandLog, TestLoop) {
        let streams = ScriptedStreams::new();
        let actuators = CommandLog::new();
        let telemetry = Telemetry::new(streams.clone(), ExportLog::new());
        let fl = FlightLoop::new(telemetry, actuators.clone());
        (streams, actuators, fl)
    }

    #[test]
    fn test_idle_time_is_remainder_of_period() {
        let period = Duration::from_millis(100);
        assert_eq!(
            idle_time(period, Duration::from_millis(30)),
            Some(Duration::from_millis(70))
        );
        assert_eq!(idle_time(period, Duration::from_millis(100)), None);
        assert_eq!(idle_time(period, Duration::from_millis(250)), None);
    }

    #[test]
    fn test_dispatch_skips_settle() {
        let mut log = CommandLog::new();
        dispatch(
            &mut log,
            &[
                FlightCommand::SetSas(true),
                FlightCommand::Settle(Duration::from_millis(1)),
                FlightCommand::SetThrottle(0.5),
            ],
        )
        .unwrap();
        assert_eq!(
            log.commands(),
            vec![FlightCommand::SetSas(true), FlightCommand::SetThrottle(0.5)]
        );
    }

    #[test]
    fn test_arm_sends_safe_state() {
        let (_streams, actuators, mut fl) = flight_loop();
        fl.arm().unwrap();
        assert_eq!(
            actuators.commands(),
            vec![FlightCommand::SetSas(false), FlightCommand::SetRcs(false)]
        );
    }

    #[test]
    fn test_first_tick_launches() {
        let (_streams, actuators, mut fl) = flight_loop();
        let t = fl.tick(Instant::now()).unwrap().unwrap();
        assert_eq!(t.to, FlightPhase::InitialClimb);

        let commands = actuators.commands();
        assert_eq!(
            commands[0],
            FlightCommand::SetSpeedMode(SpeedMode::Surface)
        );
        assert_eq!(&commands[1..], t.commands);
    }

    #[test]
    fn test_quiet_tick_only_holds_speed_mode() {
        let (streams, actuators, mut fl) = flight_loop();
        fl = fl.with_controller(AscentController::from_state(AscentState::InitialClimb));
        streams.set(|r| r.altitude = 50.0);

        assert!(fl.tick(Instant::now()).unwrap().is_none());
        assert_eq!(
            actuators.commands(),
            vec![FlightCommand::SetSpeedMode(SpeedMode::Surface)]
        );
    }

    #[test]
    fn test_seco_sends_zero_throttle() {
        let (streams, actuators, mut fl) = flight_loop();
        fl = fl.with_controller(AscentController::from_state(
            AscentState::SuborbitalAcceleration,
        ));
        streams.set(|r| {
            r.altitude = 50_000.0;
            r.apoapsis = 80_000.0;
            r.thrust = 60_000.0;
        });

        let t = fl.tick(Instant::now()).unwrap().unwrap();
        assert_eq!(t.to, FlightPhase::Seco);
        assert_eq!(
            actuators.commands().last(),
            Some(&FlightCommand::SetThrottle(0.0))
        );
    }

    #[test]
    fn test_atmosphere_exit_exports_once() {
        let (streams, _actuators, mut fl) = flight_loop();
        fl = fl.with_controller(AscentController::from_state(AscentState::Seco));
        fl.telemetry_mut().init_time().unwrap();
        fl.telemetry_mut().start_recording();

        streams.set(|r| {
            r.ut = 120.0;
            r.altitude = 69_999.0;
        });
        fl.tick(Instant::now()).unwrap();
        assert!(fl.telemetry().is_recording());
        assert!(fl.telemetry().sink().exports().is_empty());

        streams.set(|r| {
            r.ut = 120.1;
            r.altitude = 70_001.0;
        });
        let t = fl.tick(Instant::now()).unwrap().unwrap();
        assert_eq!(t.to, FlightPhase::InSpaceTowardsCircularization);
        assert!(!fl.telemetry().is_recording());
        let exports = fl.telemetry().sink().exports();
        assert_eq!(exports.len(), 1);
        // Header plus the 69 999 m and 70 001 m samples.
        assert_eq!(exports[0].len(), 3);

        streams.set(|r| r.altitude = 72_000.0);
        fl.tick(Instant::now()).unwrap();
        assert_eq!(fl.telemetry().sink().exports().len(), 1);
        assert_eq!(fl.telemetry().samples().len(), 2);
    }

    #[test]
    fn test_recording_cut_off_is_independent_of_phase() {
        // Still burning when the atmosphere is left: the trace is cut anyway.
        let (streams, _actuators, mut fl) = flight_loop();
        fl = fl.with_controller(AscentController::from_state(
            AscentState::SuborbitalAcceleration,
        ));
        fl.telemetry_mut().start_recording();
        streams.set(|r| {
            r.altitude = 71_000.0;
            r.apoapsis = 72_000.0;
            r.thrust = 50_000.0;
        });

        assert!(fl.tick(Instant::now()).unwrap().is_none());
        assert_eq!(fl.controller().phase(), FlightPhase::SuborbitalAcceleration);
        assert!(!fl.telemetry().is_recording());
        assert_eq!(fl.telemetry().sink().exports().len(), 1);
    }

    #[test]
    fn test_link_failure_stops_the_tick() {
        let (streams, actuators, mut fl) = flight_loop();
        streams.set(|r| r.fail_altitude = true);
        assert!(fl.tick(Instant::now()).is_err());
        assert_eq!(fl.controller().phase(), FlightPhase::Launchpad);
        // Only the speed mode hold went out before the failed read.
        assert_eq!(actuators.commands().len(), 1);
    }

    #[test]
    fn test_full_ascent_through_loop() {
        let (streams, actuators, mut fl) = flight_loop();
        let t0 = Instant::now();
        fl.arm().unwrap();
        fl.telemetry_mut().init_time().unwrap();
        fl.telemetry_mut().start_recording();

        let mut tick = 0u64;
        let mut step = |fl: &mut TestLoop, f: &dyn Fn(&mut crate::test_util::Readings)| {
            streams.set(|r| {
                r.ut = tick as f64 * 0.1;
                f(r);
            });
            let now = t0 + Duration::from_millis(100 * tick);
            tick += 1;
            fl.tick(now).unwrap()
        };

        step(&mut fl, &|r| r.thrust = 2e5);
        step(&mut fl, &|r| r.altitude = 150.0);
        step(&mut fl, &|r| r.altitude = 800.0);
        step(&mut fl, &|r| {
            r.altitude = 25_000.0;
            r.thrust = 0.0;
        });
        assert_eq!(fl.controller().phase(), FlightPhase::Meco);
        for _ in 0..5 {
            step(&mut fl, &|_| {});
        }
        assert_eq!(fl.controller().phase(), FlightPhase::MainStageSeparation);
        for _ in 0..5 {
            step(&mut fl, &|_| {});
        }
        assert_eq!(fl.controller().phase(), FlightPhase::SuborbitalAcceleration);
        step(&mut fl, &|r| r.apoapsis = 76_000.0);
        step(&mut fl, &|r| r.altitude = 70_500.0);
        assert_eq!(
            fl.controller().phase(),
            FlightPhase::InSpaceTowardsCircularization
        );
        assert!(fl.telemetry().is_exported());

        let stages = actuators
            .commands()
            .iter()
            .filter(|c| **c == FlightCommand::ActivateNextStage)
            .count();
        assert_eq!(stages, 3);
    }
}
