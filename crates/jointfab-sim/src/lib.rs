//! Simulator for joint-fabric administrator trust verification.
//!
//! Loads a scenario (local fabric table, triggering session and the
//! attribute values a remote administrator would serve), runs one
//! verification against in-memory collaborators and renders the result as
//! a JSON [`Report`].

pub mod config;
pub mod report;
pub mod scenario;

pub use config::{load_config, Config, ConfigError};
pub use report::{AdministratorReport, Report};
pub use scenario::{run_scenario, World};
