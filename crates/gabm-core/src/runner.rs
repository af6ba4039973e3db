//! The round runner.
//!
//! One round works through every active member of a fixed group in ID
//! order. Each speaker asks the [`PartnerSource`] for a partner from the
//! active members of mutable groups and communicates with it. Mutable
//! members therefore drift toward the fixed members they hear from, while
//! fixed members never move.
//!
//! The environment is snapshotted before the first round (round 0) and
//! after every round, giving the opinion history external tools plot.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use gabm_agents::{AgentError, CommunicationOutcome, Environment, GroupRole};
use gabm_types::{AgentId, OpinionHistory, OpinionTopicId};

use crate::partner::PartnerSource;
use crate::scenario::Scenario;

/// Errors that can occur during a run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A communication failed.
    #[error("agent error: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: AgentError,
    },
}

/// What happened in one round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundSummary {
    /// Round number, starting at 1.
    pub round: u32,
    /// Speakers that found a partner and communicated.
    pub conversations: u32,
    /// Conversations that replaced at least one agent's opinions.
    pub updates: u32,
    /// Conversations skipped because a participant holds no opinions.
    pub skipped: u32,
    /// Speakers with no partner available.
    pub unpaired: u32,
    /// Mean over all active opinion holders, per topic with data.
    pub means: BTreeMap<OpinionTopicId, f64>,
    /// Mean over active members of mutable groups, per topic with data.
    pub mutable_means: BTreeMap<OpinionTopicId, f64>,
}

/// Result of a run.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Snapshots for round 0 (initial state) through the last round.
    pub history: OpinionHistory,
    /// One summary per executed round.
    pub summaries: Vec<RoundSummary>,
}

impl RunResult {
    /// The summary of the last executed round.
    pub fn final_summary(&self) -> Option<&RoundSummary> {
        self.summaries.last()
    }
}

/// Run one round on `env`.
///
/// # Errors
///
/// Returns [`RunnerError::Agent`] if a communication fails, e.g. because
/// the partner source returned an agent that is not active.
pub fn run_round(
    env: &mut Environment,
    round: u32,
    topics: &[OpinionTopicId],
    partners: &mut dyn PartnerSource,
) -> Result<RoundSummary, RunnerError> {
    let speakers: Vec<AgentId> = env.agents_with_role(GroupRole::Fixed).into_iter().collect();
    let pool: Vec<AgentId> = env.agents_with_role(GroupRole::Mutable).into_iter().collect();

    let mut summary = RoundSummary {
        round,
        conversations: 0,
        updates: 0,
        skipped: 0,
        unpaired: 0,
        means: BTreeMap::new(),
        mutable_means: BTreeMap::new(),
    };

    for speaker in speakers {
        let Some(partner) = partners.pick(speaker, &pool) else {
            summary.unpaired = summary.unpaired.saturating_add(1);
            debug!(round, speaker = %speaker, "no partner available");
            continue;
        };
        let outcome = env.communicate(speaker, partner)?;
        summary.conversations = summary.conversations.saturating_add(1);
        match outcome {
            CommunicationOutcome::Skipped(_) => {
                summary.skipped = summary.skipped.saturating_add(1);
            }
            CommunicationOutcome::Averaged { .. } if outcome.changed_anything() => {
                summary.updates = summary.updates.saturating_add(1);
            }
            CommunicationOutcome::Averaged { .. } | CommunicationOutcome::Unchanged => {}
        }
        debug!(round, speaker = %speaker, partner = %partner, ?outcome, "communicated");
    }

    let snapshot = env.snapshot(round);
    let mutable_members: Vec<AgentId> = env.agents_with_role(GroupRole::Mutable).into_iter().collect();
    for topic in topics {
        if let Some(mean) = snapshot.mean(*topic) {
            summary.means.insert(*topic, mean);
        }
        if let Some(mean) = snapshot.mean_over(&mutable_members, *topic) {
            summary.mutable_means.insert(*topic, mean);
        }
    }
    Ok(summary)
}

/// Run `rounds` rounds on the scenario, recording history.
///
/// # Errors
///
/// Returns [`RunnerError`] from the first failing round. Rounds already
/// executed stay applied to the environment.
pub fn run_rounds(
    scenario: &mut Scenario,
    rounds: u32,
    partners: &mut dyn PartnerSource,
) -> Result<RunResult, RunnerError> {
    let topics: Vec<OpinionTopicId> = scenario.topics.iter().map(|t| t.id).collect();
    let mut history = OpinionHistory::new();
    history.push(scenario.env.snapshot(0));

    if scenario.env.agents_with_role(GroupRole::Mutable).is_empty() {
        warn!("no active mutable agents, opinions cannot change");
    }

    let mut summaries = Vec::new();
    for round in 1..=rounds {
        let summary = run_round(&mut scenario.env, round, &topics, partners)?;
        log_round(&summary);
        history.push(scenario.env.snapshot(round));
        summaries.push(summary);
    }
    Ok(RunResult { history, summaries })
}

/// Log a round summary.
pub fn log_round(summary: &RoundSummary) {
    for (topic, mean) in &summary.means {
        info!(
            round = summary.round,
            topic = %topic,
            mean,
            mutable_mean = summary.mutable_means.get(topic),
            conversations = summary.conversations,
            updates = summary.updates,
            "round complete"
        );
    }
    if summary.means.is_empty() {
        info!(
            round = summary.round,
            conversations = summary.conversations,
            "round complete, no opinions held"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gabm_agents::{AgentParams, Group};
    use gabm_types::{GroupId, Opinion};

    use super::*;
    use crate::partner::ScriptedPartners;

    fn topic() -> OpinionTopicId {
        OpinionTopicId::new(0)
    }

    /// One fixed agent `0` at 2, one mutable agent `1` at 0.
    fn pair_env() -> Environment {
        let mut env = Environment::new(2024, "x");
        let fixed = env.add_group(Group::new(GroupId::new(0), "Positive")).unwrap();
        let mutable = env
            .add_group(Group::new(GroupId::new(1), "Neutral").with_role(GroupRole::Mutable))
            .unwrap();
        for (raw, value, group) in [(0, 2, fixed), (1, 0, mutable)] {
            let id = env
                .add_agent(AgentParams::person(AgentId::new(raw)).opinion(Opinion::new(topic(), None, value)))
                .unwrap();
            env.add_member(group, id).unwrap();
        }
        env
    }

    #[test]
    fn round_counts_and_means() {
        let mut env = pair_env();
        let mut partners = ScriptedPartners::new([AgentId::new(1)]);
        let summary = run_round(&mut env, 1, &[topic()], &mut partners).unwrap();
        assert_eq!(summary.conversations, 1);
        assert_eq!(summary.updates, 1);
        assert_eq!(summary.unpaired, 0);
        assert!(summary.means.get(&topic()).is_some_and(|m| (m - 1.5).abs() < 1e-9));
        assert!(summary.mutable_means.get(&topic()).is_some_and(|m| (m - 1.0).abs() < 1e-9));
    }

    #[test]
    fn exhausted_script_leaves_speakers_unpaired() {
        let mut env = pair_env();
        let mut partners = ScriptedPartners::default();
        let summary = run_round(&mut env, 1, &[topic()], &mut partners).unwrap();
        assert_eq!(summary.conversations, 0);
        assert_eq!(summary.unpaired, 1);
    }

    #[test]
    fn unknown_partner_is_an_error() {
        let mut env = pair_env();
        let mut partners = ScriptedPartners::new([AgentId::new(77)]);
        assert!(matches!(
            run_round(&mut env, 1, &[topic()], &mut partners),
            Err(RunnerError::Agent {
                source: AgentError::AgentNotFound(_)
            })
        ));
    }

    #[test]
    fn fixed_to_fixed_is_not_an_update() {
        let mut env = pair_env();
        let mut partners = ScriptedPartners::new([AgentId::new(0)]);
        let summary = run_round(&mut env, 1, &[topic()], &mut partners).unwrap();
        assert_eq!(summary.conversations, 1);
        assert_eq!(summary.updates, 0);
    }
}
