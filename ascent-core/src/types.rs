// types.rs
use core::time::Duration;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum FlightPhase {
    Launchpad = 0,                     // Waiting on the pad, safe state
    InitialClimb = 1,                  // Straight up off the pad
    InitialTurn = 2,                   // Small scripted pitch-over
    GravityTurn = 3,                   // SAS holding prograde
    Meco = 4,                          // Main engine cut-off
    MainStageSeparation = 5,           // Dropping the spent first stage
    SuborbitalAcceleration = 6,        // Second stage raising apoapsis
    Seco = 7,                          // Second engine cut-off, coasting up
    InSpaceTowardsCircularization = 8, // Above the atmosphere
}

impl FlightPhase {
    /// Every phase in flight order.
    pub const ALL: [FlightPhase; 9] = [
        FlightPhase::Launchpad,
        FlightPhase::InitialClimb,
        FlightPhase::InitialTurn,
        FlightPhase::GravityTurn,
        FlightPhase::Meco,
        FlightPhase::MainStageSeparation,
        FlightPhase::SuborbitalAcceleration,
        FlightPhase::Seco,
        FlightPhase::InSpaceTowardsCircularization,
    ];

    /// Position of the phase in the ascent sequence.
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Short operator-facing line printed when the phase is entered.
    pub const fn announcement(self) -> &'static str {
        match self {
            FlightPhase::Launchpad => "On the launchpad",
            FlightPhase::InitialClimb => "Launch!",
            FlightPhase::InitialTurn => "Initial turn!",
            FlightPhase::GravityTurn => "Gravity turn!",
            FlightPhase::Meco => "MECO!",
            FlightPhase::MainStageSeparation => "Main stage separation!",
            FlightPhase::SuborbitalAcceleration => "Suborbital acceleration!",
            FlightPhase::Seco => "SECO!",
            FlightPhase::InSpaceTowardsCircularization => "Leaving the atmosphere!",
        }
    }
}

/// Stabilization targets the controller asks SAS to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SasMode {
    StabilityAssist,
    Prograde,
}

/// Reference the navball speed display (and therefore prograde) is taken in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedMode {
    Orbit,
    Surface,
}

/// One actuator request sent over the control link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlightCommand {
    SetSas(bool),
    SetRcs(bool),
    SetSasMode(SasMode),
    SetSpeedMode(SpeedMode),
    EngageAutopilot,
    DisengageAutopilot,
    /// Degrees.
    TargetPitchAndHeading { pitch: f32, heading: f32 },
    /// 0.0 to 1.0.
    SetThrottle(f32),
    ActivateNextStage,
    /// Not sent to the vehicle. The dispatcher blocks for this long before
    /// issuing the next command.
    Settle(Duration),
}
