// lib.rs
pub mod control_loop;
pub mod error;
pub mod state_machine;
pub mod telemetry;
pub mod timer;
pub mod trace;
pub mod types;

#[cfg(test)]
mod test_util;

pub use control_loop::*;
pub use error::*;
pub use state_machine::*;
pub use telemetry::*;
pub use timer::*;
pub use trace::*;
pub use types::*;
