use crate::config::BridgeConfig;
use ascent_core::{
    Actuators, AeroReadings, FlightCommand, LinkError, SasMode, SensorStreams, SpeedMode,
};
use krpc_client::{
    Client,
    services::space_center::{self, AutoPilot, Control, SpaceCenter},
    stream::Stream,
};
use log::info;

fn link<E: std::fmt::Display>(context: &'static str) -> impl FnOnce(E) -> LinkError {
    move |e| LinkError::new(context, e)
}

/// Live sensor streams of the active vessel.
pub struct KspSensors {
    // Keeps the session the streams belong to alive.
    _space_center: SpaceCenter,
    ut_stream: Stream<f64>,
    altitude_stream: Stream<f64>,
    apoapsis_stream: Stream<f64>,
    thrust_stream: Stream<f32>,
    drag_stream: Stream<(f64, f64, f64)>,
    tas_stream: Stream<f32>,
    mach_stream: Stream<f32>,
    density_stream: Stream<f32>,
    dynamic_pressure_stream: Stream<f32>,
    temperature_stream: Stream<f32>,
}

/// Control surfaces of the active vessel.
pub struct KspActuators {
    control: Control,
    auto_pilot: AutoPilot,
}

/// Both halves of a kRPC session bound to the active vessel.
pub struct KspAgent {
    pub sensors: KspSensors,
    pub actuators: KspActuators,
    pub vessel_name: String,
}

impl KspAgent {
    pub fn connect(config: &BridgeConfig) -> Result<Self, Box<dyn std::error::Error>> {
        info!(
            "Connecting to kRPC server at {}:{}/{}...",
            config.host, config.rpc_port, config.stream_port
        );
        let client = Client::new(
            config.client_name,
            config.host,
            config.rpc_port.into(),
            config.stream_port.into(),
        )?;
        let space_center = SpaceCenter::new(client);
        let vessel = space_center.get_active_vessel()?;
        let vessel_name = vessel.get_name()?;

        let flight = vessel.flight(None)?;
        let orbit = vessel.get_orbit()?;

        let sensors = KspSensors {
            ut_stream: space_center.get_ut_stream()?,
            altitude_stream: flight.get_mean_altitude_stream()?,
            apoapsis_stream: orbit.get_apoapsis_altitude_stream()?,
            thrust_stream: vessel.get_thrust_stream()?,
            drag_stream: flight.get_drag_stream()?,
            tas_stream: flight.get_true_air_speed_stream()?,
            mach_stream: flight.get_mach_stream()?,
            density_stream: flight.get_atmosphere_density_stream()?,
            dynamic_pressure_stream: flight.get_dynamic_pressure_stream()?,
            temperature_stream: flight.get_static_air_temperature_stream()?,
            _space_center: space_center,
        };
        sensors.set_rate(config.stream_rate_hz)?;

        let actuators = KspActuators {
            control: vessel.get_control()?,
            auto_pilot: vessel.get_auto_pilot()?,
        };

        info!("Connected to {}", vessel_name);
        Ok(Self {
            sensors,
            actuators,
            vessel_name,
        })
    }
}

impl KspSensors {
    fn set_rate(&self, hz: f32) -> Result<(), Box<dyn std::error::Error>> {
        self.ut_stream.set_rate(hz.into())?;
        self.altitude_stream.set_rate(hz.into())?;
        self.apoapsis_stream.set_rate(hz.into())?;
        self.thrust_stream.set_rate(hz.into())?;
        self.drag_stream.set_rate(hz.into())?;
        self.tas_stream.set_rate(hz.into())?;
        self.mach_stream.set_rate(hz.into())?;
        self.density_stream.set_rate(hz.into())?;
        self.dynamic_pressure_stream.set_rate(hz.into())?;
        self.temperature_stream.set_rate(hz.into())?;
        Ok(())
    }
}

impl SensorStreams for KspSensors {
    fn universal_time(&mut self) -> Result<f64, LinkError> {
        self.ut_stream.get().map_err(link("universal time"))
    }

    fn mean_altitude(&mut self) -> Result<f64, LinkError> {
        self.altitude_stream.get().map_err(link("mean altitude"))
    }

    fn apoapsis_altitude(&mut self) -> Result<f64, LinkError> {
        self.apoapsis_stream.get().map_err(link("apoapsis altitude"))
    }

    fn thrust(&mut self) -> Result<f64, LinkError> {
        let thrust = self.thrust_stream.get().map_err(link("thrust"))?;
        Ok(f64::from(thrust))
    }

    fn aero(&mut self) -> Result<AeroReadings, LinkError> {
        let (x, y, z) = self.drag_stream.get().map_err(link("drag"))?;
        Ok(AeroReadings {
            drag: [x, y, z],
            true_air_speed: f64::from(self.tas_stream.get().map_err(link("true air speed"))?),
            mach: f64::from(self.mach_stream.get().map_err(link("mach"))?),
            density: f64::from(
                self.density_stream
                    .get()
                    .map_err(link("atmosphere density"))?,
            ),
            dynamic_pressure: f64::from(
                self.dynamic_pressure_stream
                    .get()
                    .map_err(link("dynamic pressure"))?,
            ),
            static_air_temperature: f64::from(
                self.temperature_stream
                    .get()
                    .map_err(link("static air temperature"))?,
            ),
        })
    }
}

impl Actuators for KspActuators {
    fn execute(&mut self, command: FlightCommand) -> Result<(), LinkError> {
        match command {
            FlightCommand::SetSas(on) => self.control.set_sas(on).map_err(link("set SAS")),
            FlightCommand::SetRcs(on) => self.control.set_rcs(on).map_err(link("set RCS")),
            FlightCommand::SetSasMode(mode) => {
                let mode = match mode {
                    SasMode::StabilityAssist => space_center::SASMode::StabilityAssist,
                    SasMode::Prograde => space_center::SASMode::Prograde,
                };
                self.control.set_sas_mode(mode).map_err(link("set SAS mode"))
            }
            FlightCommand::SetSpeedMode(mode) => {
                let mode = match mode {
                    SpeedMode::Orbit => space_center::SpeedMode::Orbit,
                    SpeedMode::Surface => space_center::SpeedMode::Surface,
                };
                self.control
                    .set_speed_mode(mode)
                    .map_err(link("set speed mode"))
            }
            FlightCommand::EngageAutopilot => {
                self.auto_pilot.engage().map_err(link("engage autopilot"))
            }
            FlightCommand::DisengageAutopilot => self
                .auto_pilot
                .disengage()
                .map_err(link("disengage autopilot")),
            FlightCommand::TargetPitchAndHeading { pitch, heading } => self
                .auto_pilot
                .target_pitch_and_heading(pitch, heading)
                .map_err(link("target pitch and heading")),
            FlightCommand::SetThrottle(throttle) => self
                .control
                .set_throttle(throttle)
                .map_err(link("set throttle")),
            FlightCommand::ActivateNextStage => {
                // The decoupled vessels are not tracked.
                self.control
                    .activate_next_stage()
                    .map(|_| ())
                    .map_err(link("activate next stage"))
            }
            // Handled by the dispatcher, never sent.
            FlightCommand::Settle(_) => Ok(()),
        }
    }
}
