//! Non-fatal warning signals.
//!
//! Data-quality anomalies that have a sensible fallback do not abort a run.
//! They are emitted with `tracing::warn!` and recorded as [`SimWarning`]
//! values in the environment's warning journal, so callers and tests can
//! inspect what was corrected or skipped.

use serde::Serialize;

use gabm_types::AgentId;

use crate::agent::AgentKind;

/// A recorded non-fatal anomaly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SimWarning {
    /// A birth year after the current year was clamped to the current year.
    InvalidBirthYear {
        /// The agent being created.
        agent: AgentId,
        /// The birth year the caller asked for.
        requested: i32,
        /// The birth year actually stored.
        clamped_to: i32,
    },

    /// A computed age exceeded the plausible maximum. The birth year is
    /// kept as given.
    UnusualAge {
        /// The agent being created.
        agent: AgentId,
        /// The age implied by the birth year.
        age: i32,
    },

    /// `communicate` was invoked where one side cannot hold opinions.
    IncompatibleCommunicationParticipant {
        /// The agent that initiated the exchange.
        initiator: AgentId,
        /// Kind of the initiating agent.
        initiator_kind: AgentKind,
        /// The partner agent.
        partner: AgentId,
        /// Kind of the partner agent.
        partner_kind: AgentKind,
    },
}

impl SimWarning {
    /// The agent the warning is about (the initiator, for communication).
    pub const fn agent(&self) -> AgentId {
        match self {
            Self::InvalidBirthYear { agent, .. } | Self::UnusualAge { agent, .. } => *agent,
            Self::IncompatibleCommunicationParticipant { initiator, .. } => *initiator,
        }
    }

    /// Emit the warning through `tracing`.
    pub fn emit(&self) {
        match self {
            Self::InvalidBirthYear {
                agent,
                requested,
                clamped_to,
            } => tracing::warn!(
                agent = %agent,
                requested,
                clamped_to,
                "birth year is after the current year, clamped"
            ),
            Self::UnusualAge { agent, age } => {
                tracing::warn!(agent = %agent, age, "age is implausibly high");
            }
            Self::IncompatibleCommunicationParticipant {
                initiator,
                initiator_kind,
                partner,
                partner_kind,
            } => tracing::warn!(
                initiator = %initiator,
                initiator_kind = %initiator_kind,
                partner = %partner,
                partner_kind = %partner_kind,
                "communication skipped, participant cannot hold opinions"
            ),
        }
    }
}

impl core::fmt::Display for SimWarning {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidBirthYear {
                agent,
                requested,
                clamped_to,
            } => write!(
                f,
                "{agent}: birth year {requested} is after the current year, clamped to {clamped_to}"
            ),
            Self::UnusualAge { agent, age } => write!(f, "{agent}: unusual age {age}"),
            Self::IncompatibleCommunicationParticipant {
                initiator,
                initiator_kind,
                partner,
                partner_kind,
            } => write!(
                f,
                "{initiator} ({initiator_kind}) cannot communicate with {partner} ({partner_kind})"
            ),
        }
    }
}
