//! End-to-end runs of the reference scenario.
//!
//! Two "Negative" agents at -2 (IDs 0-1), two "Positive" agents at +2
//! (IDs 2-3), and six "Neutral" agents at 0 (IDs 4-9).

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use gabm_agents::{GroupRole, Opinionated};
use gabm_core::{RandomPartners, ScriptedPartners, SimulationConfig, run_rounds, scenario};
use gabm_types::{AgentId, OpinionTopicId};

fn topic() -> OpinionTopicId {
    OpinionTopicId::new(0)
}

fn ids(raw: &[u64]) -> Vec<AgentId> {
    raw.iter().copied().map(AgentId::new).collect()
}

fn neutral_mean(result: &gabm_core::RunResult) -> f64 {
    result
        .final_summary()
        .and_then(|s| s.mutable_means.get(&topic()).copied())
        .expect("neutral agents hold opinions")
}

#[test]
fn scripted_round_by_hand() {
    let config = SimulationConfig::default();
    let mut scenario = scenario::build(&config).unwrap();
    // Speakers 0, 1, 2, 3 in order.
    let mut partners = ScriptedPartners::new(ids(&[4, 4, 5, 5]));
    let result = run_rounds(&mut scenario, 1, &mut partners).unwrap();

    // 0 (-2) with 4 (0)  -> 4 = -1
    // 1 (-2) with 4 (-1) -> 4 = round(-1.5) = -2
    // 2 (+2) with 5 (0)  -> 5 = 1
    // 3 (+2) with 5 (1)  -> 5 = round(1.5) = 2
    let env = &scenario.env;
    assert_eq!(env.agent(AgentId::new(4)).unwrap().opinion_value(topic()), Some(-2));
    assert_eq!(env.agent(AgentId::new(5)).unwrap().opinion_value(topic()), Some(2));
    for fixed in [0, 1] {
        assert_eq!(env.agent(AgentId::new(fixed)).unwrap().opinion_value(topic()), Some(-2));
    }
    for fixed in [2, 3] {
        assert_eq!(env.agent(AgentId::new(fixed)).unwrap().opinion_value(topic()), Some(2));
    }

    assert!(neutral_mean(&result).abs() < 1e-9);
    let summary = result.final_summary().unwrap();
    assert_eq!(summary.conversations, 4);
    assert_eq!(summary.updates, 4);
    assert_eq!(result.history.len(), 2);
    assert_eq!(result.history.series(topic())[0], vec![-2, -2, 2, 2, 0, 0, 0, 0, 0, 0]);
    assert_eq!(result.history.series(topic())[1], vec![-2, -2, 2, 2, -2, 2, 0, 0, 0, 0]);
}

#[test]
fn scripted_one_sided_pull() {
    let config = SimulationConfig::default();
    let mut scenario = scenario::build(&config).unwrap();
    // Every speaker talks to agent 9 for two rounds.
    let mut partners = ScriptedPartners::new(ids(&[9; 8]));
    let result = run_rounds(&mut scenario, 2, &mut partners).unwrap();

    // Agent 9 goes 0 -> -1 -> -2 -> 0 -> 1 in round 1, then
    // 1 -> -1 -> -2 -> 0 -> 1 in round 2 (round(-0.5) = -1).
    assert_eq!(
        scenario.env.agent(AgentId::new(9)).unwrap().opinion_value(topic()),
        Some(1)
    );
    let means = result.history.means(topic());
    assert_eq!(means.len(), 3);
    assert!(means.iter().flatten().all(|m| m.abs() < 1.0));
    assert_eq!(partners.remaining(), 0);
}

#[test]
fn seeded_run_matches_recorded_trajectory() {
    let config = SimulationConfig::default();
    let mut scenario = scenario::build(&config).unwrap();
    let mut partners = RandomPartners::new(config.world.seed);
    let result = run_rounds(&mut scenario, config.rounds, &mut partners).unwrap();

    assert_eq!(config.world.seed, 42);
    assert_eq!(result.summaries.len(), 5);
    assert_eq!(result.history.len(), 6);

    // Neutral means per round for seed 42.
    let sixth = 1.0 / 6.0;
    let expected = [sixth, sixth, sixth, -sixth, -sixth];
    for (summary, want) in result.summaries.iter().zip(expected) {
        let got = summary.mutable_means[&topic()];
        assert!(
            (got - want).abs() < 1e-9,
            "round {}: neutral mean {got}, expected {want}",
            summary.round
        );
    }
    let mean = neutral_mean(&result);
    assert!(mean > -2.0 && mean < 2.0, "neutral mean {mean} left the open interval");

    let series = result.history.series(topic());
    assert_eq!(series[0], vec![-2, -2, 2, 2, 0, 0, 0, 0, 0, 0]);
    assert_eq!(series[5], vec![-2, -2, 2, 2, -2, -2, 2, 2, -2, 1]);

    // Fixed agents never move.
    let env = &scenario.env;
    for id in env.agents_with_role(GroupRole::Fixed) {
        let start = result.history.rounds[0].value_of(id, topic());
        assert_eq!(env.agent(id).unwrap().opinion_value(topic()), start);
    }
}

#[test]
fn seeded_run_is_reproducible() {
    let config = SimulationConfig::default();
    let run = |seed| {
        let mut scenario = scenario::build(&config).unwrap();
        let mut partners = RandomPartners::new(seed);
        run_rounds(&mut scenario, config.rounds, &mut partners)
            .unwrap()
            .history
    };
    let first = run(config.world.seed);
    assert_eq!(first, run(config.world.seed));
    assert_eq!(first.to_json().unwrap(), run(config.world.seed).to_json().unwrap());
}
