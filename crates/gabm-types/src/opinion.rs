//! The opinion value model.
//!
//! - [`OpinionTopic`] names an axis of opinion.
//! - [`OpinionValue`] is one labelled point on that axis, e.g. `2` ->
//!   "Strongly agree" on a bipolar Likert scale.
//! - [`OpinionValueMap`] registers the valid points per topic.
//! - [`Opinion`] is a stance actually held by an agent, group, or
//!   environment, optionally checked against a value map.
//!
//! Values are plain integers. How they are interpreted is up to the
//! scenario; the value map only supplies labels and the set of valid points.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::OpinionError;
use crate::ids::OpinionTopicId;

/// Label returned when an opinion value has no registered description.
pub const UNKNOWN_DESCRIPTION: &str = "unknown";

// ---------------------------------------------------------------------------
// Topics and values
// ---------------------------------------------------------------------------

/// A named axis of opinion. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpinionTopic {
    /// Identifier of the topic.
    pub id: OpinionTopicId,
    /// Short name, e.g. "stance".
    pub name: String,
    /// What the topic means.
    pub description: String,
}

impl OpinionTopic {
    /// Create a topic.
    pub fn new(id: OpinionTopicId, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
        }
    }
}

impl core::fmt::Display for OpinionTopic {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "OpinionTopic({}, {})", self.id, self.name)
    }
}

/// One labelled point on a topic's scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpinionValue {
    /// The topic this point belongs to.
    pub topic_id: OpinionTopicId,
    /// Integer position on the scale.
    pub value: i32,
    /// Human-readable label, e.g. "Strongly disagree".
    pub description: String,
}

impl OpinionValue {
    /// Create a scale point.
    pub fn new(topic_id: OpinionTopicId, value: i32, description: impl Into<String>) -> Self {
        Self {
            topic_id,
            value,
            description: description.into(),
        }
    }
}

impl core::fmt::Display for OpinionValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "OpinionValue({}, {})", self.topic_id, self.value)
    }
}

// ---------------------------------------------------------------------------
// OpinionValueMap
// ---------------------------------------------------------------------------

/// Registry of valid scale points, keyed by topic and then by value.
///
/// Each `(topic, value)` pair appears at most once; inserting the same pair
/// again replaces its description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpinionValueMap {
    values: BTreeMap<OpinionTopicId, BTreeMap<i32, OpinionValue>>,
}

impl OpinionValueMap {
    /// Create an empty map.
    pub const fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Build a map from a collection of scale points.
    pub fn from_values(values: impl IntoIterator<Item = OpinionValue>) -> Self {
        let mut map = Self::new();
        for value in values {
            map.insert(value);
        }
        map
    }

    /// The five-point bipolar Likert scale `-2..=2` for a topic.
    pub fn bipolar_likert(topic_id: OpinionTopicId) -> Self {
        Self::from_values([
            OpinionValue::new(topic_id, -2, "Strongly disagree"),
            OpinionValue::new(topic_id, -1, "Disagree"),
            OpinionValue::new(topic_id, 0, "Neither agree nor disagree"),
            OpinionValue::new(topic_id, 1, "Agree"),
            OpinionValue::new(topic_id, 2, "Strongly agree"),
        ])
    }

    /// Register a scale point, returning the entry it replaced, if any.
    pub fn insert(&mut self, value: OpinionValue) -> Option<OpinionValue> {
        self.values
            .entry(value.topic_id)
            .or_default()
            .insert(value.value, value)
    }

    /// Resolve a value to its label.
    pub fn lookup(&self, topic_id: OpinionTopicId, value: i32) -> Option<&str> {
        self.values
            .get(&topic_id)
            .and_then(|points| points.get(&value))
            .map(|point| point.description.as_str())
    }

    /// Whether any scale points are registered for the topic.
    pub fn has_topic(&self, topic_id: OpinionTopicId) -> bool {
        self.values
            .get(&topic_id)
            .is_some_and(|points| !points.is_empty())
    }

    /// Whether `value` is a registered point on the topic's scale.
    pub fn contains(&self, topic_id: OpinionTopicId, value: i32) -> bool {
        self.values
            .get(&topic_id)
            .is_some_and(|points| points.contains_key(&value))
    }

    /// All registered points for a topic, in ascending value order.
    pub fn values_for(&self, topic_id: OpinionTopicId) -> impl Iterator<Item = &OpinionValue> {
        self.values
            .get(&topic_id)
            .into_iter()
            .flat_map(BTreeMap::values)
    }

    /// All topics that have at least one registered point.
    pub fn topics(&self) -> impl Iterator<Item = OpinionTopicId> + '_ {
        self.values
            .iter()
            .filter(|(_, points)| !points.is_empty())
            .map(|(topic, _)| *topic)
    }
}

impl core::fmt::Display for OpinionValueMap {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "OpinionValueMap(")?;
        for (i, (topic, points)) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            let values: Vec<i32> = points.keys().copied().collect();
            write!(f, "{topic}: {values:?}")?;
        }
        write!(f, ")")
    }
}

// ---------------------------------------------------------------------------
// Opinion
// ---------------------------------------------------------------------------

/// A stance held on one topic.
///
/// When `allowed_values` registers points for the topic, [`Opinion::set_value`]
/// and [`Opinion::checked`] reject values off the scale. [`Opinion::new`] does
/// not validate, so derived opinions (such as communication averages) can
/// always be represented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opinion {
    /// The topic this opinion is about.
    pub topic_id: OpinionTopicId,
    /// Optional scale the value is checked against.
    pub allowed_values: Option<OpinionValueMap>,
    value: i32,
}

impl Opinion {
    /// Create an opinion without validating the value.
    pub const fn new(
        topic_id: OpinionTopicId,
        allowed_values: Option<OpinionValueMap>,
        value: i32,
    ) -> Self {
        Self {
            topic_id,
            allowed_values,
            value,
        }
    }

    /// Create an opinion, rejecting a value that is off the registered scale.
    pub fn checked(
        topic_id: OpinionTopicId,
        allowed_values: Option<OpinionValueMap>,
        value: i32,
    ) -> Result<Self, OpinionError> {
        let mut opinion = Self::new(topic_id, allowed_values, 0);
        opinion.set_value(value)?;
        Ok(opinion)
    }

    /// The current value.
    pub const fn value(&self) -> i32 {
        self.value
    }

    /// Set the value.
    ///
    /// # Errors
    ///
    /// Returns [`OpinionError::InvalidOpinionValue`] if a value map with
    /// points for this topic is attached and `value` is not one of them.
    /// The opinion is left unchanged on error.
    pub fn set_value(&mut self, value: i32) -> Result<(), OpinionError> {
        self.validate(value)?;
        self.value = value;
        Ok(())
    }

    /// Check `value` against the attached scale without assigning it.
    pub fn validate(&self, value: i32) -> Result<(), OpinionError> {
        let Some(allowed) = self.allowed_values.as_ref() else {
            return Ok(());
        };
        if !allowed.has_topic(self.topic_id) || allowed.contains(self.topic_id, value) {
            return Ok(());
        }
        Err(OpinionError::InvalidOpinionValue {
            topic: self.topic_id,
            value,
            valid: allowed
                .values_for(self.topic_id)
                .map(|point| point.value)
                .collect(),
        })
    }

    /// Resolve the current value to its label, or `"unknown"`.
    pub fn description(&self) -> &str {
        self.allowed_values
            .as_ref()
            .and_then(|allowed| allowed.lookup(self.topic_id, self.value))
            .unwrap_or(UNKNOWN_DESCRIPTION)
    }
}

impl core::fmt::Display for Opinion {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Opinion({}, {})", self.topic_id, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic() -> OpinionTopicId {
        OpinionTopicId::new(0)
    }

    #[test]
    fn topic_display() {
        let t = OpinionTopic::new(topic(), "positive", "A positive opinion.");
        assert_eq!(t.to_string(), "OpinionTopic(OpinionTopicID(0), positive)");
        assert_eq!(t.description, "A positive opinion.");
    }

    #[test]
    fn value_display() {
        let v = OpinionValue::new(topic(), 2, "Strongly positive");
        assert_eq!(v.to_string(), "OpinionValue(OpinionTopicID(0), 2)");
    }

    #[test]
    fn value_map_lookup() {
        let map = OpinionValueMap::bipolar_likert(topic());
        assert_eq!(map.lookup(topic(), 2), Some("Strongly agree"));
        assert_eq!(map.lookup(topic(), -2), Some("Strongly disagree"));
        assert_eq!(map.lookup(topic(), 3), None);
        assert_eq!(map.lookup(OpinionTopicId::new(9), 0), None);
    }

    #[test]
    fn value_map_keys_are_unique() {
        let mut map = OpinionValueMap::new();
        assert!(map.insert(OpinionValue::new(topic(), 1, "Agree")).is_none());
        let replaced = map.insert(OpinionValue::new(topic(), 1, "Somewhat agree"));
        assert_eq!(replaced.map(|v| v.description), Some(String::from("Agree")));
        assert_eq!(map.values_for(topic()).count(), 1);
        assert_eq!(map.lookup(topic(), 1), Some("Somewhat agree"));
    }

    #[test]
    fn value_map_topics_and_display() {
        let mut map = OpinionValueMap::bipolar_likert(topic());
        map.insert(OpinionValue::new(OpinionTopicId::new(4), 10, "Ten"));
        let topics: Vec<_> = map.topics().collect();
        assert_eq!(topics, vec![topic(), OpinionTopicId::new(4)]);
        assert!(map.to_string().starts_with("OpinionValueMap("));
    }

    #[test]
    fn opinion_description_resolves_label() {
        let opinion = Opinion::new(topic(), Some(OpinionValueMap::bipolar_likert(topic())), 1);
        assert_eq!(opinion.description(), "Agree");
        assert_eq!(opinion.to_string(), "Opinion(OpinionTopicID(0), 1)");
    }

    #[test]
    fn opinion_description_unknown_when_absent() {
        let bare = Opinion::new(topic(), None, 1);
        assert_eq!(bare.description(), UNKNOWN_DESCRIPTION);

        let off_scale = Opinion::new(topic(), Some(OpinionValueMap::bipolar_likert(topic())), 7);
        assert_eq!(off_scale.description(), UNKNOWN_DESCRIPTION);
    }

    #[test]
    fn set_value_rejects_off_scale_value() {
        let mut opinion = Opinion::new(topic(), Some(OpinionValueMap::bipolar_likert(topic())), 0);
        let result = opinion.set_value(5);
        assert!(matches!(
            result,
            Err(OpinionError::InvalidOpinionValue { value: 5, .. })
        ));
        assert_eq!(opinion.value(), 0);

        assert!(opinion.set_value(-1).is_ok());
        assert_eq!(opinion.value(), -1);
    }

    #[test]
    fn set_value_unchecked_without_scale_for_topic() {
        let mut bare = Opinion::new(topic(), None, 0);
        assert!(bare.set_value(100).is_ok());

        // A map that registers nothing for this topic does not constrain it.
        let other = OpinionValueMap::bipolar_likert(OpinionTopicId::new(8));
        let mut unconstrained = Opinion::new(topic(), Some(other), 0);
        assert!(unconstrained.set_value(100).is_ok());
    }

    #[test]
    fn checked_constructor_validates() {
        let scale = OpinionValueMap::bipolar_likert(topic());
        assert!(Opinion::checked(topic(), Some(scale.clone()), 2).is_ok());
        assert!(Opinion::checked(topic(), Some(scale), 3).is_err());
    }
}
