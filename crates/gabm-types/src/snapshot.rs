//! Opinion history snapshots for external visualization.
//!
//! A simulation run records one [`RoundSnapshot`] before the first
//! communication round (round 0) and one after every round. The resulting
//! [`OpinionHistory`] is plain data: the core never renders or persists it,
//! it only hands it to whatever plotting or storage layer the caller uses.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{AgentId, OpinionTopicId};

/// Opinion values of every active agent at the end of one round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RoundSnapshot {
    /// Round number; 0 is the initial state.
    pub round: u32,
    /// Per-agent opinion values by topic. Agents without opinions are absent.
    pub opinions: BTreeMap<AgentId, BTreeMap<OpinionTopicId, i32>>,
}

impl RoundSnapshot {
    /// Values held on `topic`, in agent order. Agents without an opinion on
    /// the topic are skipped.
    pub fn values(&self, topic: OpinionTopicId) -> Vec<i32> {
        self.opinions
            .values()
            .filter_map(|by_topic| by_topic.get(&topic).copied())
            .collect()
    }

    /// Value held by one agent on `topic`.
    pub fn value_of(&self, agent: AgentId, topic: OpinionTopicId) -> Option<i32> {
        self.opinions
            .get(&agent)
            .and_then(|by_topic| by_topic.get(&topic).copied())
    }

    /// Mean value on `topic` across agents that hold an opinion on it.
    pub fn mean(&self, topic: OpinionTopicId) -> Option<f64> {
        mean_of(self.values(topic))
    }

    /// Mean value on `topic` across the given agents only.
    pub fn mean_over(&self, agents: &[AgentId], topic: OpinionTopicId) -> Option<f64> {
        mean_of(agents.iter().filter_map(|agent| self.value_of(*agent, topic)))
    }
}

/// Ordered sequence of round snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct OpinionHistory {
    /// Snapshots in round order.
    pub rounds: Vec<RoundSnapshot>,
}

impl OpinionHistory {
    /// Create an empty history.
    pub const fn new() -> Self {
        Self { rounds: Vec::new() }
    }

    /// Append a snapshot.
    pub fn push(&mut self, snapshot: RoundSnapshot) {
        self.rounds.push(snapshot);
    }

    /// Number of recorded snapshots.
    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    /// The most recent snapshot.
    pub fn latest(&self) -> Option<&RoundSnapshot> {
        self.rounds.last()
    }

    /// Per-round value lists for `topic`, one inner list per round. This is
    /// the shape a box plot of the opinion distribution over time expects.
    pub fn series(&self, topic: OpinionTopicId) -> Vec<Vec<i32>> {
        self.rounds.iter().map(|round| round.values(topic)).collect()
    }

    /// Per-round means for `topic`.
    pub fn means(&self, topic: OpinionTopicId) -> Vec<Option<f64>> {
        self.rounds.iter().map(|round| round.mean(topic)).collect()
    }

    /// Serialize the history as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Arithmetic mean of integer values, `None` when there are none.
pub fn mean_of(values: impl IntoIterator<Item = i32>) -> Option<f64> {
    let mut total = 0.0_f64;
    let mut count = 0_u32;
    for value in values {
        total += f64::from(value);
        count = count.saturating_add(1);
    }
    if count == 0 {
        return None;
    }
    Some(total / f64::from(count))
}
