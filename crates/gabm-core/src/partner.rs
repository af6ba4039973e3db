//! Partner selection.
//!
//! Each round, every speaker is paired with a partner drawn from a pool.
//! The [`PartnerSource`] trait abstracts how the partner is chosen: a
//! seeded random draw for real runs ([`RandomPartners`]) or a fixed script
//! for tests and replays ([`ScriptedPartners`]).

use std::collections::VecDeque;

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;

use gabm_types::AgentId;

/// A source of communication partners.
pub trait PartnerSource {
    /// Choose a partner for `speaker` from `candidates`.
    ///
    /// Returns `None` when no partner can be chosen; the speaker then sits
    /// the round out.
    fn pick(&mut self, speaker: AgentId, candidates: &[AgentId]) -> Option<AgentId>;
}

/// Uniform random choice from a seeded generator.
///
/// The same seed and the same sequence of calls give the same partners.
#[derive(Debug, Clone)]
pub struct RandomPartners {
    rng: SmallRng,
}

impl RandomPartners {
    /// Create a source seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl PartnerSource for RandomPartners {
    fn pick(&mut self, _speaker: AgentId, candidates: &[AgentId]) -> Option<AgentId> {
        candidates.choose(&mut self.rng).copied()
    }
}

/// Replays a fixed sequence of partners, one per call.
///
/// Scripted partners do not need to be in the candidate pool. The source
/// yields `None` once the script is used up.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPartners {
    script: VecDeque<AgentId>,
}

impl ScriptedPartners {
    /// Create a source that replays `script` in order.
    pub fn new(script: impl IntoIterator<Item = AgentId>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }

    /// Partners not yet handed out.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl PartnerSource for ScriptedPartners {
    fn pick(&mut self, _speaker: AgentId, _candidates: &[AgentId]) -> Option<AgentId> {
        self.script.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[u64]) -> Vec<AgentId> {
        raw.iter().copied().map(AgentId::new).collect()
    }

    #[test]
    fn random_picks_from_candidates() {
        let pool = ids(&[4, 5, 6]);
        let mut source = RandomPartners::new(42);
        for _ in 0..50 {
            let picked = source.pick(AgentId::new(0), &pool);
            assert!(picked.is_some_and(|p| pool.contains(&p)));
        }
    }

    #[test]
    fn random_is_deterministic_per_seed() {
        let pool = ids(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let draw = |seed| {
            let mut source = RandomPartners::new(seed);
            (0..20)
                .map(|_| source.pick(AgentId::new(0), &pool))
                .collect::<Vec<_>>()
        };
        assert_eq!(draw(7), draw(7));
    }

    #[test]
    fn random_with_empty_pool() {
        let mut source = RandomPartners::new(1);
        assert!(source.pick(AgentId::new(0), &[]).is_none());
    }

    #[test]
    fn scripted_replays_in_order() {
        let mut source = ScriptedPartners::new(ids(&[9, 3]));
        assert_eq!(source.remaining(), 2);
        assert_eq!(source.pick(AgentId::new(0), &[]), Some(AgentId::new(9)));
        assert_eq!(source.pick(AgentId::new(1), &[]), Some(AgentId::new(3)));
        assert_eq!(source.pick(AgentId::new(2), &[]), None);
    }
}
