use ascent_core::{CsvFileSink, FlightLoop, Telemetry};
use log::{error, info};

mod agent;
mod config;

use agent::KspAgent;
use config::BridgeConfig;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = BridgeConfig::default();
    let agent = KspAgent::connect(&config)?;
    info!("Flying {}", agent.vessel_name);

    let telemetry = Telemetry::new(agent.sensors, CsvFileSink::new(&config.trace_path));
    let mut flight = FlightLoop::new(telemetry, agent.actuators);

    flight.arm()?;
    flight.telemetry_mut().start_recording();

    // Only returns on a link or export failure.
    if let Err(e) = flight.run() {
        error!("Ascent aborted: {}", e);
        return Err(e.into());
    }
    Ok(())
}
