//! Error types for the gabm-agents crate.
//!
//! All operations that can fail return typed errors rather than panicking.
//! Caller programming errors (unknown topic, unknown agent, duplicate
//! registration) surface here; data-quality anomalies with a sensible
//! fallback are reported as [`SimWarning`] values instead.
//!
//! [`SimWarning`]: crate::warning::SimWarning

use gabm_types::{AgentId, EthnicityId, GenderId, GroupId, OpinionError, OpinionTopicId};

/// Errors that can occur during agent, group, and environment operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgentError {
    /// `set_opinion` was called for a topic the holder has no entry for.
    #[error("{holder} holds no opinion on {topic}; known topics: {known:?}")]
    UnknownOpinionTopic {
        /// Description of the opinion holder (agent, group, or environment).
        holder: String,
        /// The topic that was not found.
        topic: OpinionTopicId,
        /// Topics the holder does have entries for.
        known: Vec<OpinionTopicId>,
    },

    /// A value off the topic's registered scale was assigned.
    #[error(transparent)]
    InvalidOpinionValue(#[from] OpinionError),

    /// An agent was given a gender that is not in the environment's gender map.
    #[error("gender {gender} for {agent} is not in the gender map; valid genders: {valid:?}")]
    InvalidGender {
        /// The agent being created.
        agent: AgentId,
        /// The rejected gender.
        gender: GenderId,
        /// Genders registered in the map.
        valid: Vec<GenderId>,
    },

    /// An agent was given an ethnicity that is not in the environment's ethnicity map.
    #[error("ethnicity {ethnicity} for {agent} is not in the ethnicity map; valid ethnicities: {valid:?}")]
    InvalidEthnicity {
        /// The agent being created.
        agent: AgentId,
        /// The rejected ethnicity.
        ethnicity: EthnicityId,
        /// Ethnicities registered in the map.
        valid: Vec<EthnicityId>,
    },

    /// An opinion operation was attempted on something without opinions.
    #[error("{0} does not hold opinions")]
    NotOpinionated(String),

    /// Agent with the given ID is not registered (or not active, where required).
    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),

    /// Group with the given ID is not registered (or not active, where required).
    #[error("group not found: {0}")]
    GroupNotFound(GroupId),

    /// An agent with this ID is already registered.
    #[error("duplicate agent id: {0}")]
    DuplicateAgent(AgentId),

    /// A group with this ID is already registered.
    #[error("duplicate group id: {0}")]
    DuplicateGroup(GroupId),

    /// An arithmetic overflow occurred.
    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow {
        /// Description of what was being computed.
        context: String,
    },
}

/// Errors reported by an [`LlmClient`].
///
/// [`LlmClient`]: crate::llm::LlmClient
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// The client cannot serve requests (no backend, no key, offline).
    #[error("LLM not available: {0}")]
    Unavailable(String),

    /// The backend returned an error or an unusable response.
    #[error("LLM backend error: {0}")]
    Backend(String),

    /// Reading or writing the response cache failed.
    #[error("response cache I/O error: {source}")]
    CacheIo {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The response cache could not be (de)serialized.
    #[error("response cache format error: {source}")]
    CacheFormat {
        /// The underlying serde error.
        #[from]
        source: serde_json::Error,
    },
}
