//! Configuration, scenario setup, and the round runner for the GABM
//! opinion simulation.
//!
//! # Modules
//!
//! - [`config`] -- YAML configuration ([`SimulationConfig`])
//! - [`partner`] -- Partner selection ([`PartnerSource`], [`RandomPartners`], [`ScriptedPartners`])
//! - [`runner`] -- Communication rounds and history recording ([`run_rounds`])
//! - [`scenario`] -- Building an environment from configuration ([`Scenario`])

pub mod config;
pub mod partner;
pub mod runner;
pub mod scenario;

pub use config::{ConfigError, SimulationConfig};
pub use partner::{PartnerSource, RandomPartners, ScriptedPartners};
pub use runner::{RoundSummary, RunResult, RunnerError, log_round, run_round, run_rounds};
pub use scenario::{Scenario, ScenarioError};
