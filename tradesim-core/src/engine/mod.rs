//! Simulation engine — configuration, state machine and the day loop.
//!
//! `INITIALIZED → (STEPPING)* → COMPLETED`. Every step simulates one date of
//! the horizon and leaves the portfolio and state consistent, so a run can be
//! paused and inspected between any two steps.

pub mod config;
pub mod simulation;
pub mod state;
pub mod timeout;

pub use config::{ConfigError, SimulationConfig, DEFAULT_PROVIDER_TIMEOUT_MS};
pub use simulation::{SimulationEngine, SimulationError};
pub use state::{
    DayReport, SimulationPhase, SimulationState, SimulationWarning, SymbolOutcome, WarningKind,
};
pub use timeout::call_with_deadline;
