//! Type-safe identifier wrappers around plain integers.
//!
//! Every entity in the simulation has a strongly-typed ID so that an agent
//! identifier can never be passed where a group or topic identifier is
//! expected. Identity, ordering, and hashing all follow the wrapped value.
//!
//! Identifiers are assigned by the caller (setup code or configuration),
//! not generated, so that scenarios are reproducible.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Generates a newtype wrapper around `u64` with standard derives.
///
/// The display form is `Label(value)`, e.g. `AgentID(42)`.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident => $label:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub u64);

        impl $name {
            /// Wrap a raw integer identifier.
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            /// Return the inner integer value.
            pub const fn into_inner(self) -> u64 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, concat!($label, "({})"), self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for an agent in an environment.
    AgentId => "AgentID"
}

define_id! {
    /// Unique identifier for a group of agents.
    GroupId => "GroupID"
}

define_id! {
    /// Unique identifier for an opinion topic (an axis of opinion).
    OpinionTopicId => "OpinionTopicID"
}

define_id! {
    /// Unique identifier for a gender category.
    GenderId => "GenderID"
}

define_id! {
    /// Unique identifier for an ethnicity category.
    EthnicityId => "EthnicityID"
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn ids_compare_by_value() {
        assert_eq!(OpinionTopicId::new(1), OpinionTopicId::new(1));
        assert_ne!(OpinionTopicId::new(1), OpinionTopicId::new(2));
        assert!(AgentId::new(3) < AgentId::new(7));
    }

    #[test]
    fn ids_hash_by_value() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(EthnicityId::new(1));
        set.insert(EthnicityId::new(1));
        set.insert(EthnicityId::new(2));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn display_uses_label() {
        assert_eq!(AgentId::new(42).to_string(), "AgentID(42)");
        assert_eq!(GroupId::new(101).to_string(), "GroupID(101)");
        assert_eq!(OpinionTopicId::new(1).to_string(), "OpinionTopicID(1)");
        assert_eq!(GenderId::new(0).to_string(), "GenderID(0)");
        assert_eq!(EthnicityId::new(1).to_string(), "EthnicityID(1)");
    }

    #[test]
    fn id_serializes_as_plain_integer() {
        let json = serde_json::to_string(&AgentId::new(7)).ok();
        assert_eq!(json.as_deref(), Some("7"));
    }

    #[test]
    fn id_works_as_json_map_key() {
        let mut map = BTreeMap::new();
        map.insert(AgentId::new(3), 1_i32);
        let json = serde_json::to_string(&map).unwrap_or_default();
        assert_eq!(json, r#"{"3":1}"#);

        let restored: Result<BTreeMap<AgentId, i32>, _> = serde_json::from_str(&json);
        assert_eq!(restored.ok(), Some(map));
    }
}
