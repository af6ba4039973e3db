//! Per-holder opinion storage.
//!
//! An [`OpinionBook`] is the `topic -> Opinion` mapping owned by an agent,
//! a group, or an environment. Every holder owns its book by value, so two
//! agents seeded from the same source opinion never share state.
//!
//! The [`Opinionated`] trait is the capability seam: anything that may hold
//! opinions exposes its book (or `None`) through it, and the read-only
//! queries come for free.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use gabm_types::{Opinion, OpinionTopicId};

use crate::error::AgentError;

/// Opinions keyed by topic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpinionBook {
    entries: BTreeMap<OpinionTopicId, Opinion>,
}

impl OpinionBook {
    /// Create an empty book.
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Build a book from owned opinions. A later opinion on the same topic
    /// replaces an earlier one.
    pub fn from_opinions(opinions: impl IntoIterator<Item = Opinion>) -> Self {
        let entries = opinions
            .into_iter()
            .map(|opinion| (opinion.topic_id, opinion))
            .collect();
        Self { entries }
    }

    /// The opinion held on `topic`.
    pub fn get(&self, topic: OpinionTopicId) -> Option<&Opinion> {
        self.entries.get(&topic)
    }

    /// The value held on `topic`.
    pub fn value(&self, topic: OpinionTopicId) -> Option<i32> {
        self.entries.get(&topic).map(Opinion::value)
    }

    /// Whether an entry exists for `topic`.
    pub fn contains(&self, topic: OpinionTopicId) -> bool {
        self.entries.contains_key(&topic)
    }

    /// Topics with an entry, ascending.
    pub fn topics(&self) -> Vec<OpinionTopicId> {
        self.entries.keys().copied().collect()
    }

    /// Iterate entries in topic order.
    pub fn iter(&self) -> impl Iterator<Item = (&OpinionTopicId, &Opinion)> {
        self.entries.iter()
    }

    /// Number of topics held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no opinions are held.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Plain `topic -> value` view, as recorded in history snapshots.
    pub fn values(&self) -> BTreeMap<OpinionTopicId, i32> {
        self.entries
            .iter()
            .map(|(topic, opinion)| (*topic, opinion.value()))
            .collect()
    }

    /// Update the value of an existing entry.
    ///
    /// `holder` names the owner in error messages.
    ///
    /// # Errors
    ///
    /// - [`AgentError::UnknownOpinionTopic`] if there is no entry for `topic`;
    ///   use [`OpinionBook::add`] to introduce a topic.
    /// - [`AgentError::InvalidOpinionValue`] if `value` is off the entry's
    ///   scale. The entry keeps its old value.
    pub fn set(&mut self, topic: OpinionTopicId, value: i32, holder: &str) -> Result<(), AgentError> {
        let known = self.topics();
        let opinion = self
            .entries
            .get_mut(&topic)
            .ok_or_else(|| AgentError::UnknownOpinionTopic {
                holder: holder.to_owned(),
                topic,
                known,
            })?;
        opinion.set_value(value)?;
        Ok(())
    }

    /// Insert or replace the entry for `opinion`'s topic, set to `value`.
    /// Returns the entry it replaced.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidOpinionValue`] if `value` is off the
    /// opinion's scale; nothing is inserted.
    pub fn add(&mut self, mut opinion: Opinion, value: i32) -> Result<Option<Opinion>, AgentError> {
        opinion.set_value(value)?;
        Ok(self.entries.insert(opinion.topic_id, opinion))
    }

    /// Textual summary listing the topics held.
    pub fn profile(&self) -> String {
        if self.entries.is_empty() {
            return String::from("I have no opinions.");
        }
        let mut summary = String::from("I have opinions about the following topics:\n");
        for topic in self.entries.keys() {
            summary.push_str("  ");
            summary.push_str(&topic.to_string());
            summary.push('\n');
        }
        summary
    }
}

impl FromIterator<Opinion> for OpinionBook {
    fn from_iter<T: IntoIterator<Item = Opinion>>(iter: T) -> Self {
        Self::from_opinions(iter)
    }
}

/// Something that may hold opinions.
pub trait Opinionated {
    /// The holder's opinion book, or `None` when it cannot hold opinions.
    fn opinions(&self) -> Option<&OpinionBook>;

    /// Whether the holder can hold opinions at all.
    fn is_opinionated(&self) -> bool {
        self.opinions().is_some()
    }

    /// The opinion held on `topic`, if any.
    fn get_opinion(&self, topic: OpinionTopicId) -> Option<&Opinion> {
        self.opinions().and_then(|book| book.get(topic))
    }

    /// The value held on `topic`, if any.
    fn opinion_value(&self, topic: OpinionTopicId) -> Option<i32> {
        self.opinions().and_then(|book| book.value(topic))
    }
}
