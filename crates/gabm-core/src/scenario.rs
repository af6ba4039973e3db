//! Scenario construction.
//!
//! Turns a [`SimulationConfig`] into a populated [`Environment`]: topics
//! become scales, groups are registered with their roles, and each group's
//! agents are created with the group's initial opinion on every topic.
//! Agent IDs are assigned sequentially from zero in group order.

use gabm_agents::{AgentError, AgentKind, AgentParams, Environment, Group};
use gabm_types::{AgentId, GroupId, Opinion, OpinionTopic, OpinionTopicId};

use crate::config::SimulationConfig;

/// Errors that can occur while building a scenario.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// An agent or group operation failed.
    #[error("agent error: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: AgentError,
    },

    /// An environment-level opinion names a topic that is not configured.
    #[error("environment opinion refers to unknown topic {0}")]
    UnknownTopic(OpinionTopicId),

    /// More agents were requested than IDs are available.
    #[error("agent id space exhausted")]
    IdOverflow,
}

/// A populated environment and its topics.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// The environment owning every agent and group.
    pub env: Environment,
    /// Configured topics, in config order.
    pub topics: Vec<OpinionTopic>,
}

impl Scenario {
    /// The first configured topic, used for headline statistics.
    pub fn primary_topic(&self) -> Option<OpinionTopicId> {
        self.topics.first().map(|t| t.id)
    }
}

/// Build the environment described by `config`.
///
/// When `world.nation_name` is set the environment is a nation and agents
/// are created as citizens; otherwise they are persons. The environment is
/// opinionated when it is a nation or `world.opinions` is non-empty.
///
/// # Errors
///
/// - [`ScenarioError::UnknownTopic`] for an environment opinion on a topic
///   that is not configured.
/// - [`ScenarioError::Agent`] if registration or opinion validation fails.
/// - [`ScenarioError::IdOverflow`] if agent IDs run out.
pub fn build(config: &SimulationConfig) -> Result<Scenario, ScenarioError> {
    let world = &config.world;
    let scales: Vec<(OpinionTopicId, Opinion)> = config
        .topics
        .iter()
        .map(|t| {
            let id = OpinionTopicId::new(t.id);
            (id, Opinion::new(id, Some(t.value_map()), 0))
        })
        .collect();

    let env_opinions = world
        .opinions
        .iter()
        .map(|initial| {
            let topic = OpinionTopicId::new(initial.topic);
            let (_, template) = scales
                .iter()
                .find(|(id, _)| *id == topic)
                .ok_or(ScenarioError::UnknownTopic(topic))?;
            let mut opinion = template.clone();
            opinion.set_value(initial.value).map_err(AgentError::from)?;
            Ok(opinion)
        })
        .collect::<Result<Vec<_>, ScenarioError>>()?;

    let mut env = match (&world.nation_name, env_opinions.is_empty()) {
        (Some(nation), _) => {
            Environment::nation(world.current_year, &world.place, env_opinions, nation)
        }
        (None, false) => Environment::opinionated(world.current_year, &world.place, env_opinions),
        (None, true) => Environment::new(world.current_year, &world.place),
    }
    .with_defaults(config.agents.clone());

    let kind = if world.nation_name.is_some() {
        AgentKind::Citizen
    } else {
        AgentKind::Person
    };

    let mut next_id: u64 = 0;
    for group_config in &config.groups {
        let group_id = env.add_group(
            Group::new(GroupId::new(group_config.id), &group_config.name)
                .with_role(group_config.role()),
        )?;

        for _ in 0..group_config.size {
            let mut params = AgentParams::new(AgentId::new(next_id), kind);
            for (_, template) in &scales {
                let mut opinion = template.clone();
                opinion.set_value(group_config.initial_opinion).map_err(AgentError::from)?;
                params = params.opinion(opinion);
            }
            let agent = env.add_agent(params)?;
            env.add_member(group_id, agent)?;
            next_id = next_id.checked_add(1).ok_or(ScenarioError::IdOverflow)?;
        }

        tracing::info!(
            group = %group_id,
            name = %group_config.name,
            role = %group_config.role(),
            size = group_config.size,
            initial_opinion = group_config.initial_opinion,
            "group populated"
        );
    }

    Ok(Scenario {
        env,
        topics: config.topics.iter().map(crate::config::TopicConfig::topic).collect(),
    })
}
