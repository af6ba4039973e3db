//! Categorical descriptive attributes: gender and ethnicity.
//!
//! Both are modelled the same way: an [`Attribute`] is an identified,
//! labelled category and an [`AttributeMap`] is the extensible registry of
//! categories a scenario recognises. Agents store only the identifier and
//! resolve the label through the map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::{EthnicityId, GenderId};

/// A labelled category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute<I> {
    /// Identifier of the category.
    pub id: I,
    /// Integer code of the category.
    pub value: i32,
    /// Human-readable label.
    pub description: String,
}

impl<I> Attribute<I> {
    /// Create a category.
    pub fn new(id: I, value: i32, description: impl Into<String>) -> Self {
        Self {
            id,
            value,
            description: description.into(),
        }
    }
}

impl<I> core::fmt::Display for Attribute<I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.description)
    }
}

/// Registry of categories keyed by identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeMap<I: Ord> {
    entries: BTreeMap<I, Attribute<I>>,
}

impl<I: Ord + Copy> AttributeMap<I> {
    /// Create an empty registry.
    pub const fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Register a category, returning the entry it replaced, if any.
    pub fn insert(&mut self, attribute: Attribute<I>) -> Option<Attribute<I>> {
        self.entries.insert(attribute.id, attribute)
    }

    /// Look up a category.
    pub fn get(&self, id: I) -> Option<&Attribute<I>> {
        self.entries.get(&id)
    }

    /// Whether the identifier is registered.
    pub fn contains(&self, id: I) -> bool {
        self.entries.contains_key(&id)
    }

    /// Resolve an identifier to its label.
    pub fn describe(&self, id: I) -> Option<&str> {
        self.entries.get(&id).map(|a| a.description.as_str())
    }

    /// All registered identifiers in ascending order.
    pub fn ids(&self) -> Vec<I> {
        self.entries.keys().copied().collect()
    }

    /// Number of registered categories.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no categories are registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn from_labels(labels: &[(u64, &str)], make_id: fn(u64) -> I) -> Self {
        let mut map = Self::empty();
        for &(raw, label) in labels {
            let code = i32::try_from(raw).unwrap_or(i32::MAX);
            map.insert(Attribute::new(make_id(raw), code, label));
        }
        map
    }
}

/// A gender category.
pub type Gender = Attribute<GenderId>;

/// Registry of gender categories.
pub type GenderMap = AttributeMap<GenderId>;

/// An ethnicity category.
pub type Ethnicity = Attribute<EthnicityId>;

/// Registry of ethnicity categories.
pub type EthnicityMap = AttributeMap<EthnicityId>;

impl Default for AttributeMap<GenderId> {
    /// `0` female, `1` male, `2` non-binary.
    fn default() -> Self {
        Self::from_labels(&[(0, "female"), (1, "male"), (2, "non-binary")], GenderId::new)
    }
}

impl Default for AttributeMap<EthnicityId> {
    /// `0` white, `1` asian, `2` black, `3` mixed, `4` other.
    fn default() -> Self {
        Self::from_labels(
            &[
                (0, "white"),
                (1, "asian"),
                (2, "black"),
                (3, "mixed"),
                (4, "other"),
            ],
            EthnicityId::new,
        )
    }
}
