//! Defaults applied when agents are created.
//!
//! [`AgentDefaults`] bundles the demographic tunables so that scenario
//! setup and tests can override them. The core constructs it from the
//! `agents` section of the simulation YAML and passes it to the
//! environment at creation.

use serde::Deserialize;

/// Demographic defaults used by agent construction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AgentDefaults {
    /// Age assumed when no birth year is supplied (default: 18).
    ///
    /// The birth year becomes `current_year - default_age`.
    pub default_age: i32,

    /// Ages above this raise an unusual-age warning (default: 200).
    ///
    /// Construction still succeeds with the birth year as given.
    pub max_plausible_age: i32,
}

impl Default for AgentDefaults {
    fn default() -> Self {
        Self {
            default_age: 18,
            max_plausible_age: 200,
        }
    }
}

impl AgentDefaults {
    /// Birth year assumed for an agent created in `current_year` without
    /// an explicit one. Saturates rather than overflowing.
    pub const fn default_birth_year(&self, current_year: i32) -> i32 {
        current_year.saturating_sub(self.default_age)
    }

    /// Whether `age` exceeds the plausible maximum.
    pub const fn is_unusual_age(&self, age: i32) -> bool {
        age > self.max_plausible_age
    }
}
