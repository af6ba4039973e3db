//! Configuration loading and typed config structures for a simulation run.
//!
//! A run is described by a YAML file (conventionally `gabm-config.yaml`).
//! This module defines strongly-typed structs that mirror the YAML
//! structure and a loader that reads and validates it. Every field has a
//! default, so an empty file describes the reference scenario: two
//! "Negative" agents at -2, two "Positive" agents at +2, and six "Neutral"
//! agents at 0 on a single bipolar Likert topic, talking for five rounds.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::Datelike;
use serde::Deserialize;

use gabm_agents::{AgentDefaults, GroupRole};
use gabm_types::{OpinionTopic, OpinionTopicId, OpinionValue, OpinionValueMap};

/// Environment variable that overrides `world.seed`.
pub const SEED_ENV_VAR: &str = "GABM_SEED";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but describes an impossible scenario.
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// World-level settings (seed, year, place, nation).
    #[serde(default)]
    pub world: WorldConfig,

    /// Opinion topics and their scales.
    #[serde(default = "default_topics")]
    pub topics: Vec<TopicConfig>,

    /// Groups and the agents created into them.
    #[serde(default = "default_groups")]
    pub groups: Vec<GroupConfig>,

    /// Number of communication rounds.
    #[serde(default = "default_rounds")]
    pub rounds: u32,

    /// Demographic defaults for new agents.
    #[serde(default)]
    pub agents: AgentDefaults,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Where results go.
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            topics: default_topics(),
            groups: default_groups(),
            rounds: default_rounds(),
            agents: AgentDefaults::default(),
            logging: LoggingConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `GABM_SEED` overrides `world.seed` when set to an integer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.world.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string. No environment overrides
    /// are applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to an empty mapping.
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    ///
    /// - topic IDs and group IDs are unique;
    /// - every topic registers at least one scale point, without duplicates;
    /// - every group's initial opinion is on every topic's scale.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut topic_ids = BTreeSet::new();
        for topic in &self.topics {
            if !topic_ids.insert(topic.id) {
                return Err(ConfigError::Invalid(format!("duplicate topic id {}", topic.id)));
            }
            if topic.values.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "topic {} ({}) has no scale values",
                    topic.id, topic.name
                )));
            }
            let mut points = BTreeSet::new();
            for point in &topic.values {
                if !points.insert(point.value) {
                    return Err(ConfigError::Invalid(format!(
                        "topic {} lists value {} twice",
                        topic.id, point.value
                    )));
                }
            }
        }

        let mut group_ids = BTreeSet::new();
        for group in &self.groups {
            if !group_ids.insert(group.id) {
                return Err(ConfigError::Invalid(format!("duplicate group id {}", group.id)));
            }
            for topic in &self.topics {
                if !topic.values.iter().any(|p| p.value == group.initial_opinion) {
                    return Err(ConfigError::Invalid(format!(
                        "group {} ({}) starts at {}, which is not on the scale of topic {}",
                        group.id, group.name, group.initial_opinion, topic.id
                    )));
                }
            }
        }
        Ok(())
    }

    /// Total number of agents the groups will create.
    pub fn population(&self) -> u64 {
        self.groups
            .iter()
            .fold(0_u64, |acc, g| acc.saturating_add(u64::from(g.size)))
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Random seed for partner selection.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// The environment's current year (default: this calendar year).
    #[serde(default = "default_current_year")]
    pub current_year: i32,

    /// Where the simulation takes place.
    #[serde(default = "default_place")]
    pub place: String,

    /// When set, the environment is a nation and agents are citizens.
    #[serde(default)]
    pub nation_name: Option<String>,

    /// Environment-level opinions. A non-empty list makes the environment
    /// opinionated.
    #[serde(default)]
    pub opinions: Vec<InitialOpinion>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            current_year: default_current_year(),
            place: default_place(),
            nation_name: None,
            opinions: Vec::new(),
        }
    }
}

impl WorldConfig {
    /// Override the seed from `GABM_SEED` when it holds an integer.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(SEED_ENV_VAR) {
            match val.parse::<u64>() {
                Ok(seed) => self.seed = seed,
                Err(e) => tracing::warn!(value = %val, error = %e, "ignoring non-numeric {SEED_ENV_VAR}"),
            }
        }
    }
}

/// One opinion topic and its scale.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TopicConfig {
    /// Topic identifier.
    pub id: u64,

    /// Short name.
    pub name: String,

    /// What the topic means.
    #[serde(default)]
    pub description: String,

    /// Valid points on the scale.
    #[serde(default = "default_likert_points")]
    pub values: Vec<ScalePoint>,
}

impl TopicConfig {
    /// The topic as a value type.
    pub fn topic(&self) -> OpinionTopic {
        OpinionTopic::new(OpinionTopicId::new(self.id), &self.name, &self.description)
    }

    /// The topic's scale as a value map.
    pub fn value_map(&self) -> OpinionValueMap {
        let id = OpinionTopicId::new(self.id);
        OpinionValueMap::from_values(
            self.values
                .iter()
                .map(|p| OpinionValue::new(id, p.value, &p.description)),
        )
    }
}

/// One labelled point on a scale.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScalePoint {
    /// Integer position.
    pub value: i32,
    /// Label.
    pub description: String,
}

/// A group and the agents created into it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GroupConfig {
    /// Group identifier.
    pub id: u64,

    /// Display name.
    pub name: String,

    /// Role in communication. When omitted, a group named "Neutral" is
    /// mutable and any other group fixed.
    #[serde(default)]
    pub role: Option<GroupRole>,

    /// Number of agents to create into the group.
    #[serde(default)]
    pub size: u32,

    /// Value every member starts with, on every topic.
    #[serde(default)]
    pub initial_opinion: i32,
}

impl GroupConfig {
    /// The effective role.
    pub fn role(&self) -> GroupRole {
        self.role
            .unwrap_or_else(|| GroupRole::from_legacy_name(&self.name))
    }
}

/// A topic/value pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct InitialOpinion {
    /// Topic identifier.
    pub topic: u64,
    /// Starting value.
    pub value: i32,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default log level filter (overridden by `RUST_LOG`).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Output configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OutputConfig {
    /// Where to write the opinion history as JSON. Nothing is written
    /// when unset.
    #[serde(default)]
    pub history_path: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_seed() -> u64 {
    42
}

fn default_current_year() -> i32 {
    chrono::Utc::now().year()
}

fn default_place() -> String {
    String::from("Earth")
}

const fn default_rounds() -> u32 {
    5
}

fn default_log_level() -> String {
    String::from("info")
}

fn default_likert_points() -> Vec<ScalePoint> {
    OpinionValueMap::bipolar_likert(OpinionTopicId::new(0))
        .values_for(OpinionTopicId::new(0))
        .map(|v| ScalePoint {
            value: v.value,
            description: v.description.clone(),
        })
        .collect()
}

fn default_topics() -> Vec<TopicConfig> {
    vec![TopicConfig {
        id: 0,
        name: String::from("stance"),
        description: String::from("Agreement with the proposition under discussion."),
        values: default_likert_points(),
    }]
}

fn default_groups() -> Vec<GroupConfig> {
    vec![
        GroupConfig {
            id: 0,
            name: String::from("Negative"),
            role: Some(GroupRole::Fixed),
            size: 2,
            initial_opinion: -2,
        },
        GroupConfig {
            id: 1,
            name: String::from("Positive"),
            role: Some(GroupRole::Fixed),
            size: 2,
            initial_opinion: 2,
        },
        GroupConfig {
            id: 2,
            name: String::from("Neutral"),
            role: Some(GroupRole::Mutable),
            size: 6,
            initial_opinion: 0,
        },
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_reference_scenario() {
        let config = SimulationConfig::default();
        assert_eq!(config.world.seed, 42);
        assert_eq!(config.world.place, "Earth");
        assert_eq!(config.rounds, 5);
        assert_eq!(config.population(), 10);
        assert_eq!(config.topics.len(), 1);
        assert_eq!(config.topics.first().map(|t| t.values.len()), Some(5));
        let roles: Vec<GroupRole> = config.groups.iter().map(GroupConfig::role).collect();
        assert_eq!(roles, vec![GroupRole::Fixed, GroupRole::Fixed, GroupRole::Mutable]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_empty_yaml() {
        let config = SimulationConfig::parse("").unwrap();
        assert_eq!(config.groups, SimulationConfig::default().groups);
    }

    #[test]
    fn parse_minimal_yaml() {
        let config = SimulationConfig::parse("world:\n  seed: 7\nrounds: 3\n").unwrap();
        assert_eq!(config.world.seed, 7);
        assert_eq!(config.rounds, 3);
        assert_eq!(config.world.place, "Earth");
        assert_eq!(config.population(), 10);
        assert_eq!(config.logging.level, "info");
        assert!(config.output.history_path.is_none());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
world:
  seed: 99
  current_year: 2030
  place: "Leeds"
  nation_name: "Yorkshire"
  opinions:
    - { topic: 1, value: 1 }

topics:
  - id: 1
    name: "tax"
    values:
      - { value: -1, description: "against" }
      - { value: 0, description: "unsure" }
      - { value: 1, description: "for" }

groups:
  - { id: 5, name: "Against", size: 3, initial_opinion: -1 }
  - { id: 6, name: "Neutral", size: 4 }
  - { id: 7, name: "Swing", role: mutable, size: 1, initial_opinion: 1 }

rounds: 10

agents:
  default_age: 30

logging:
  level: "debug"

output:
  history_path: "out/history.json"
"#;
        let config = SimulationConfig::parse(yaml).unwrap();
        assert_eq!(config.world.current_year, 2030);
        assert_eq!(config.world.nation_name.as_deref(), Some("Yorkshire"));
        assert_eq!(config.world.opinions, vec![InitialOpinion { topic: 1, value: 1 }]);
        assert_eq!(config.population(), 8);
        let roles: Vec<GroupRole> = config.groups.iter().map(GroupConfig::role).collect();
        assert_eq!(roles, vec![GroupRole::Fixed, GroupRole::Mutable, GroupRole::Mutable]);
        assert_eq!(config.agents.default_age, 30);
        assert_eq!(config.agents.max_plausible_age, 200);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(
            config.output.history_path.as_deref(),
            Some(Path::new("out/history.json"))
        );

        let tax = config.topics.first().unwrap();
        assert_eq!(tax.value_map().lookup(OpinionTopicId::new(1), 1), Some("for"));
        assert_eq!(tax.topic().name, "tax");
    }

    #[test]
    fn topic_without_values_gets_likert_scale() {
        let yaml = "topics:\n  - { id: 3, name: \"x\" }\ngroups: []\n";
        let config = SimulationConfig::parse(yaml).unwrap();
        let map = config.topics.first().unwrap().value_map();
        assert_eq!(map.lookup(OpinionTopicId::new(3), -2), Some("Strongly disagree"));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let yaml = "groups:\n  - { id: 1, name: a }\n  - { id: 1, name: b }\n";
        assert!(matches!(
            SimulationConfig::parse(yaml),
            Err(ConfigError::Invalid(msg)) if msg.contains("duplicate group id 1")
        ));
    }

    #[test]
    fn rejects_off_scale_initial_opinion() {
        let yaml = "groups:\n  - { id: 1, name: a, size: 1, initial_opinion: 9 }\n";
        assert!(matches!(
            SimulationConfig::parse(yaml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_bad_yaml() {
        assert!(matches!(
            SimulationConfig::parse("rounds: [1, 2"),
            Err(ConfigError::Yaml { .. })
        ));
    }
}
