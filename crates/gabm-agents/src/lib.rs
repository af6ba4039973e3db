//! Agents, groups, and environments for the GABM opinion simulation.
//!
//! This crate is the logic layer: everything that reads or changes agent
//! state without touching I/O beyond the optional response cache file. It
//! sits between `gabm-types` (value types) and `gabm-core` (configuration
//! and the round runner).
//!
//! # Modules
//!
//! - [`agent`] -- The agent record, its kinds and capabilities ([`Agent`], [`AgentParams`])
//! - [`communication`] -- Pairwise opinion averaging ([`CommunicationOutcome`])
//! - [`config`] -- Demographic defaults ([`AgentDefaults`])
//! - [`environment`] -- The registry owning agents and groups ([`Environment`])
//! - [`error`] -- Error types ([`AgentError`], [`LlmError`])
//! - [`group`] -- Groups and their roles ([`Group`], [`GroupRole`])
//! - [`llm`] -- The LLM collaborator seam and response cache
//! - [`opinions`] -- Per-holder opinion storage ([`OpinionBook`], [`Opinionated`])
//! - [`warning`] -- Non-fatal warning signals ([`SimWarning`])

pub mod agent;
pub mod communication;
pub mod config;
pub mod environment;
pub mod error;
pub mod group;
pub mod llm;
pub mod opinions;
pub mod warning;

// Re-export primary types at crate root for convenience.
pub use agent::{Agent, AgentKind, AgentParams, BirthContext, LifeRecord, NO_GENDER};
pub use communication::{CommunicationOutcome, average_books, average_value};
pub use config::AgentDefaults;
pub use environment::{Environment, EnvironmentKind};
pub use error::{AgentError, LlmError};
pub use group::{Group, GroupRole, LEGACY_MUTABLE_NAME};
pub use llm::{CacheKey, CachedClient, EchoClient, LlmClient, ResponseCache};
pub use opinions::{OpinionBook, Opinionated};
pub use warning::SimWarning;
