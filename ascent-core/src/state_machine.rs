use crate::telemetry::TelemetrySnapshot;
use crate::timer::Timer;
use crate::types::{FlightCommand, FlightPhase, SasMode};
use std::time::{Duration, Instant};

/// Altitude (m) at which the scripted pitch-over starts.
pub const INITIAL_TURN_ALTITUDE_M: f64 = 100.0;

/// Altitude (m) at which the autopilot hands over to SAS prograde hold.
pub const GRAVITY_TURN_ALTITUDE_M: f64 = 500.0;

/// Thrust (N) below which the first stage is considered flamed out.
pub const FLAME_OUT_THRUST_N: f64 = 1.0;

/// Wait after MECO before separating, and after separating before igniting.
pub const STAGING_DELAY: Duration = Duration::from_millis(500);

/// Apoapsis altitude (m) at which the second stage is shut down.
pub const TARGET_APOAPSIS_M: f64 = 75_000.0;

/// Top of the atmosphere (m).
pub const ATMOSPHERE_EXIT_ALTITUDE_M: f64 = 70_000.0;

/// Pause between enabling SAS and changing its mode. Switching immediately
/// races the mode change against SAS start-up.
pub const SAS_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Heading (degrees) of the whole ascent: due east.
pub const LAUNCH_HEADING_DEG: f32 = 90.0;

/// Phase of the ascent, carrying the timers that gate its exit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AscentState {
    Launchpad,
    InitialClimb,
    InitialTurn,
    GravityTurn,
    Meco { separation_timer: Timer },
    MainStageSeparation { ignition_timer: Timer },
    SuborbitalAcceleration,
    Seco,
    InSpaceTowardsCircularization,
}

impl AscentState {
    pub const fn phase(&self) -> FlightPhase {
        match self {
            AscentState::Launchpad => FlightPhase::Launchpad,
            AscentState::InitialClimb => FlightPhase::InitialClimb,
            AscentState::InitialTurn => FlightPhase::InitialTurn,
            AscentState::GravityTurn => FlightPhase::GravityTurn,
            AscentState::Meco { .. } => FlightPhase::Meco,
            AscentState::MainStageSeparation { .. } => FlightPhase::MainStageSeparation,
            AscentState::SuborbitalAcceleration => FlightPhase::SuborbitalAcceleration,
            AscentState::Seco => FlightPhase::Seco,
            AscentState::InSpaceTowardsCircularization => {
                FlightPhase::InSpaceTowardsCircularization
            }
        }
    }
}

/// Evaluates the exit condition of the current phase only. Returns the next
/// state when it holds, so the ascent advances at most one phase per call.
pub fn next_state(
    state: &AscentState,
    snapshot: &TelemetrySnapshot,
    now: Instant,
) -> Option<AscentState> {
    match state {
        AscentState::Launchpad => Some(AscentState::InitialClimb),
        AscentState::InitialClimb if snapshot.altitude > INITIAL_TURN_ALTITUDE_M => {
            Some(AscentState::InitialTurn)
        }
        AscentState::InitialTurn if snapshot.altitude > GRAVITY_TURN_ALTITUDE_M => {
            Some(AscentState::GravityTurn)
        }
        AscentState::GravityTurn if snapshot.thrust < FLAME_OUT_THRUST_N => {
            Some(AscentState::Meco {
                separation_timer: Timer::starting_at(now, STAGING_DELAY),
            })
        }
        AscentState::Meco { separation_timer } if separation_timer.elapsed_at(now) => {
            Some(AscentState::MainStageSeparation {
                ignition_timer: Timer::starting_at(now, STAGING_DELAY),
            })
        }
        AscentState::MainStageSeparation { ignition_timer } if ignition_timer.elapsed_at(now) => {
            Some(AscentState::SuborbitalAcceleration)
        }
        AscentState::SuborbitalAcceleration if snapshot.apoapsis > TARGET_APOAPSIS_M => {
            Some(AscentState::Seco)
        }
        AscentState::Seco if snapshot.altitude > ATMOSPHERE_EXIT_ALTITUDE_M => {
            Some(AscentState::InSpaceTowardsCircularization)
        }
        _ => None,
    }
}

const LAUNCHPAD_COMMANDS: &[FlightCommand] =
    &[FlightCommand::SetSas(false), FlightCommand::SetRcs(false)];

const INITIAL_CLIMB_COMMANDS: &[FlightCommand] = &[
    FlightCommand::EngageAutopilot,
    FlightCommand::TargetPitchAndHeading {
        pitch: 90.0,
        heading: LAUNCH_HEADING_DEG,
    },
    FlightCommand::SetThrottle(1.0),
    FlightCommand::ActivateNextStage,
];

const INITIAL_TURN_COMMANDS: &[FlightCommand] = &[FlightCommand::TargetPitchAndHeading {
    pitch: 87.0,
    heading: LAUNCH_HEADING_DEG,
}];

const GRAVITY_TURN_COMMANDS: &[FlightCommand] = &[
    FlightCommand::DisengageAutopilot,
    FlightCommand::SetSas(true),
    FlightCommand::Settle(SAS_SETTLE_DELAY),
    FlightCommand::SetSasMode(SasMode::Prograde),
];

const CUT_OFF_COMMANDS: &[FlightCommand] = &[FlightCommand::SetThrottle(0.0)];

const SEPARATION_COMMANDS: &[FlightCommand] = &[FlightCommand::ActivateNextStage];

const SUBORBITAL_ACCELERATION_COMMANDS: &[FlightCommand] = &[
    FlightCommand::ActivateNextStage,
    FlightCommand::SetThrottle(1.0),
];

/// One-shot actions performed when `phase` is entered.
pub const fn entry_commands(phase: FlightPhase) -> &'static [FlightCommand] {
    match phase {
        FlightPhase::Launchpad => LAUNCHPAD_COMMANDS,
        FlightPhase::InitialClimb => INITIAL_CLIMB_COMMANDS,
        FlightPhase::InitialTurn => INITIAL_TURN_COMMANDS,
        FlightPhase::GravityTurn => GRAVITY_TURN_COMMANDS,
        FlightPhase::Meco => CUT_OFF_COMMANDS,
        FlightPhase::MainStageSeparation => SEPARATION_COMMANDS,
        FlightPhase::SuborbitalAcceleration => SUBORBITAL_ACCELERATION_COMMANDS,
        FlightPhase::Seco => CUT_OFF_COMMANDS,
        // Circularization is flown by hand.
        FlightPhase::InSpaceTowardsCircularization => &[],
    }
}

/// A phase change and the actions that have to follow it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub from: FlightPhase,
    pub to: FlightPhase,
    pub commands: &'static [FlightCommand],
}

/// AscentController owns the flight phase and decides when to leave it.
/// It never touches the vehicle itself: every transition hands back the
/// commands the caller has to send.
#[derive(Debug, Clone)]
pub struct AscentController {
    state: AscentState,
}

impl AscentController {
    /// Constructs a new controller sitting on the launchpad.
    pub const fn new() -> Self {
        Self {
            state: AscentState::Launchpad,
        }
    }

    /// Resumes a controller in an arbitrary state.
    pub const fn from_state(state: AscentState) -> Self {
        Self { state }
    }

    pub const fn state(&self) -> &AscentState {
        &self.state
    }

    pub const fn phase(&self) -> FlightPhase {
        self.state.phase()
    }

    /// Actions that put the vehicle in the current phase. Used once at
    /// start-up, before the first `update`.
    pub const fn arm(&self) -> &'static [FlightCommand] {
        entry_commands(self.phase())
    }

    /// Primary entry point for advancing the ascent on a new snapshot.
    pub fn update(&mut self, snapshot: &TelemetrySnapshot, now: Instant) -> Option<Transition> {
        let next = next_state(&self.state, snapshot, now)?;
        let from = self.phase();
        self.state = next;
        let to = self.phase();
        Some(Transition {
            from,
            to,
            commands: entry_commands(to),
        })
    }
}

impl Default for AscentController {
    fn default() -> Self {
        Self::new()
    }
}
