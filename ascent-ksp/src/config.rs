use std::path::PathBuf;

/// Connection and output settings of the bridge. Nothing here is read from
/// the command line or the environment.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Name shown in the kRPC server's client list.
    pub client_name: &'static str,
    pub host: &'static str,
    pub rpc_port: u16,
    pub stream_port: u16,
    /// Update rate requested for every telemetry stream (Hz).
    pub stream_rate_hz: f32,
    /// Where the ascent trace is written once the atmosphere is left.
    pub trace_path: PathBuf,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            client_name: "Orbital Launch",
            // Standard kRPC ports
            host: "127.0.0.1",
            rpc_port: 50000,
            stream_port: 50001,
            stream_rate_hz: 100.0,
            trace_path: PathBuf::from("output.csv"),
        }
    }
}
