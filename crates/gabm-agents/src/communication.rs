//! Pairwise communication.
//!
//! When two opinion holders communicate and at least one of them belongs to
//! an active mutable group, every mutable participant has its opinions
//! replaced by the pairwise average over the union of both agents' topics.
//! Members of fixed groups only ever act as sources.
//!
//! The averaged book is computed from both agents' state before either is
//! written, so the order of the two writes cannot leak into the result.
//!
//! # Averaging
//!
//! For each topic in the union, a missing value counts as `0`, and the mean
//! is rounded half away from zero: `(1 + 2) / 2 -> 2`, `(-1 + -2) / 2 -> -2`,
//! `(1 + 0) / 2 -> 1`. The scale attached to the result is the initiator's
//! when it has one for the topic, otherwise the partner's.

use std::collections::BTreeSet;

use serde::Serialize;

use gabm_types::{AgentId, Opinion, OpinionTopicId};

use crate::environment::Environment;
use crate::error::AgentError;
use crate::opinions::{OpinionBook, Opinionated};
use crate::warning::SimWarning;

/// What a call to [`Environment::communicate`] did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommunicationOutcome {
    /// One side cannot hold opinions; nothing changed.
    Skipped(SimWarning),
    /// Neither side is in a mutable group; nothing changed.
    Unchanged,
    /// Opinions were averaged and written to the mutable participants.
    Averaged {
        /// Whether the initiator's opinions were replaced.
        initiator_updated: bool,
        /// Whether the partner's opinions were replaced.
        partner_updated: bool,
        /// Number of topics in the averaged book.
        topics: usize,
    },
}

impl CommunicationOutcome {
    /// Whether any opinion was written.
    pub const fn changed_anything(&self) -> bool {
        matches!(
            self,
            Self::Averaged {
                initiator_updated: true,
                ..
            } | Self::Averaged {
                partner_updated: true,
                ..
            }
        )
    }
}

/// Mean of two values, rounded half away from zero.
///
/// # Errors
///
/// Returns [`AgentError::ArithmeticOverflow`] if the result does not fit an
/// `i32`, which cannot happen for `i32` inputs.
pub fn average_value(a: i32, b: i32) -> Result<i32, AgentError> {
    let overflow = || AgentError::ArithmeticOverflow {
        context: format!("average of {a} and {b}"),
    };
    let sum = i64::from(a)
        .checked_add(i64::from(b))
        .ok_or_else(overflow)?;
    let biased = if sum >= 0 {
        sum.checked_add(1)
    } else {
        sum.checked_sub(1)
    }
    .ok_or_else(overflow)?;
    let mean = biased.checked_div(2).ok_or_else(overflow)?;
    i32::try_from(mean).map_err(|e| AgentError::ArithmeticOverflow {
        context: format!("average of {a} and {b}: {e}"),
    })
}

/// Average two books over the union of their topics.
///
/// # Errors
///
/// Returns [`AgentError::ArithmeticOverflow`] from [`average_value`].
pub fn average_books(initiator: &OpinionBook, partner: &OpinionBook) -> Result<OpinionBook, AgentError> {
    let topics: BTreeSet<OpinionTopicId> = initiator
        .topics()
        .into_iter()
        .chain(partner.topics())
        .collect();

    let mut averaged = Vec::with_capacity(topics.len());
    for topic in topics {
        let mine = initiator.get(topic);
        let theirs = partner.get(topic);
        let value = average_value(
            mine.map_or(0, Opinion::value),
            theirs.map_or(0, Opinion::value),
        )?;
        let scale = mine
            .and_then(|o| o.allowed_values.clone())
            .or_else(|| theirs.and_then(|o| o.allowed_values.clone()));
        averaged.push(Opinion::new(topic, scale, value));
    }
    Ok(OpinionBook::from_opinions(averaged))
}

impl Environment {
    /// Let `initiator` communicate with `partner`.
    ///
    /// - If either side cannot hold opinions, a
    ///   [`SimWarning::IncompatibleCommunicationParticipant`] is emitted,
    ///   journaled, and returned as [`CommunicationOutcome::Skipped`].
    /// - If neither side is in an active mutable group, nothing changes.
    /// - Otherwise each mutable participant's opinions are replaced by the
    ///   averaged book; fixed participants keep theirs.
    ///
    /// An agent may communicate with itself; the average of a book with
    /// itself is the book, so this never changes anything.
    ///
    /// # Errors
    ///
    /// - [`AgentError::AgentNotFound`] if either agent is not active.
    /// - [`AgentError::ArithmeticOverflow`] from averaging. Nothing is
    ///   written on error.
    pub fn communicate(
        &mut self,
        initiator: AgentId,
        partner: AgentId,
    ) -> Result<CommunicationOutcome, AgentError> {
        let me = self.agent(initiator).ok_or(AgentError::AgentNotFound(initiator))?;
        let other = self.agent(partner).ok_or(AgentError::AgentNotFound(partner))?;

        let (Some(my_book), Some(their_book)) = (me.opinions(), other.opinions()) else {
            let warning = SimWarning::IncompatibleCommunicationParticipant {
                initiator,
                initiator_kind: me.kind(),
                partner,
                partner_kind: other.kind(),
            };
            warning.emit();
            self.record_warning(warning.clone());
            return Ok(CommunicationOutcome::Skipped(warning));
        };

        let initiator_mutable = self.in_mutable_group(me);
        let partner_mutable = self.in_mutable_group(other);
        if !initiator_mutable && !partner_mutable {
            tracing::debug!(
                initiator = %initiator,
                partner = %partner,
                "neither participant is mutable, opinions unchanged"
            );
            return Ok(CommunicationOutcome::Unchanged);
        }

        let averaged = average_books(my_book, their_book)?;
        let topics = averaged.len();

        if initiator_mutable
            && let Some(agent) = self.agents_active_mut().get_mut(&initiator)
        {
            agent.replace_opinions(averaged.clone());
            tracing::debug!(agent = %initiator, opinions = ?averaged.values(), "opinions averaged");
        }
        if partner_mutable
            && let Some(agent) = self.agents_active_mut().get_mut(&partner)
        {
            tracing::debug!(agent = %partner, opinions = ?averaged.values(), "opinions averaged");
            agent.replace_opinions(averaged);
        }

        Ok(CommunicationOutcome::Averaged {
            initiator_updated: initiator_mutable,
            partner_updated: partner_mutable,
            topics,
        })
    }
}
