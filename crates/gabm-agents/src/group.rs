//! Groups of agents.
//!
//! A [`Group`] is a named set of agent IDs with a [`GroupRole`] that drives
//! the communication protocol: members of a mutable group have their
//! opinions pulled toward the average, members of fixed groups never change.
//!
//! Membership is symmetric with [`Agent::groups`](crate::Agent::groups).
//! Neither side can be changed alone from outside the crate; the paired
//! update lives in [`Environment::add_member`](crate::Environment::add_member)
//! and [`Environment::remove_member`](crate::Environment::remove_member).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use gabm_types::{AgentId, GroupId, Opinion, OpinionTopicId, mean_of};

use crate::agent::Agent;
use crate::error::AgentError;
use crate::opinions::{OpinionBook, Opinionated};

/// Group name that historically marked a mutable group.
pub const LEGACY_MUTABLE_NAME: &str = "Neutral";

/// How communication treats a group's members.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupRole {
    /// Members are fixed sources: their opinions never change by communication.
    #[default]
    Fixed,
    /// Members are averaging sinks: their opinions move to the pairwise mean.
    Mutable,
}

impl GroupRole {
    /// Infer a role from a group name: `"Neutral"` is mutable, anything
    /// else fixed. For data written before roles were explicit.
    pub fn from_legacy_name(name: &str) -> Self {
        if name == LEGACY_MUTABLE_NAME {
            Self::Mutable
        } else {
            Self::Fixed
        }
    }
}

impl core::fmt::Display for GroupRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Fixed => f.write_str("fixed"),
            Self::Mutable => f.write_str("mutable"),
        }
    }
}

/// A named collection of agents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    id: GroupId,
    name: String,
    role: GroupRole,
    members: BTreeSet<AgentId>,
    opinions: Option<OpinionBook>,
}

impl Group {
    /// Create an empty fixed group. An empty name becomes the raw ID.
    ///
    /// The name never affects the role: a group named `"Neutral"` is still
    /// fixed until [`Group::with_role`] says otherwise. Use
    /// [`GroupRole::from_legacy_name`] to infer a role from a name.
    pub fn new(id: GroupId, name: impl Into<String>) -> Self {
        let mut name = name.into();
        if name.is_empty() {
            name = id.into_inner().to_string();
        }
        Self {
            id,
            name,
            role: GroupRole::Fixed,
            members: BTreeSet::new(),
            opinions: None,
        }
    }

    /// Set the role.
    #[must_use]
    pub const fn with_role(mut self, role: GroupRole) -> Self {
        self.role = role;
        self
    }

    /// Give the group its own opinions, independent of its members'.
    #[must_use]
    pub fn with_opinions(mut self, opinions: impl IntoIterator<Item = Opinion>) -> Self {
        self.opinions = Some(OpinionBook::from_opinions(opinions));
        self
    }

    /// The group's identifier.
    pub const fn id(&self) -> GroupId {
        self.id
    }

    /// The group's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The group's role.
    pub const fn role(&self) -> GroupRole {
        self.role
    }

    /// Whether members are averaging sinks.
    pub const fn is_mutable(&self) -> bool {
        matches!(self.role, GroupRole::Mutable)
    }

    /// Member IDs, ascending.
    pub const fn members(&self) -> &BTreeSet<AgentId> {
        &self.members
    }

    /// Whether `agent` is a member.
    pub fn contains(&self, agent: AgentId) -> bool {
        self.members.contains(&agent)
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the group has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Update the group's own opinion on an existing topic.
    ///
    /// # Errors
    ///
    /// - [`AgentError::NotOpinionated`] if the group holds no opinions.
    /// - [`AgentError::UnknownOpinionTopic`] if there is no entry for `topic`.
    /// - [`AgentError::InvalidOpinionValue`] if `value` is off the scale.
    pub fn set_opinion(&mut self, topic: OpinionTopicId, value: i32) -> Result<(), AgentError> {
        let holder = self.to_string();
        self.opinions
            .as_mut()
            .ok_or_else(|| AgentError::NotOpinionated(holder.clone()))?
            .set(topic, value, &holder)
    }

    /// Insert or replace the group's own opinion. Turns a plain group into
    /// an opinionated one.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidOpinionValue`] if `value` is off the scale.
    pub fn add_opinion(&mut self, opinion: Opinion, value: i32) -> Result<Option<Opinion>, AgentError> {
        self.opinions.get_or_insert_with(OpinionBook::new).add(opinion, value)
    }

    /// Mean of the members' values on `topic`.
    ///
    /// `lookup` resolves member IDs to agents. Members that cannot be
    /// resolved or hold no opinion on the topic are skipped; `None` when
    /// nobody contributes, including for an empty group.
    pub fn average_opinion<'a, F>(&self, topic: OpinionTopicId, lookup: F) -> Option<f64>
    where
        F: Fn(AgentId) -> Option<&'a Agent>,
    {
        mean_of(
            self.members
                .iter()
                .filter_map(|id| lookup(*id))
                .filter_map(|agent| agent.opinion_value(topic)),
        )
    }

    pub(crate) fn insert_member(&mut self, agent: AgentId) -> bool {
        self.members.insert(agent)
    }

    pub(crate) fn remove_member(&mut self, agent: AgentId) -> bool {
        self.members.remove(&agent)
    }
}

impl Opinionated for Group {
    fn opinions(&self) -> Option<&OpinionBook> {
        self.opinions.as_ref()
    }
}

impl core::fmt::Display for Group {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "Group '{}' (id={}) with {} members",
            self.name,
            self.id,
            self.members.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use gabm_types::OpinionValueMap;

    use super::*;

    fn topic() -> OpinionTopicId {
        OpinionTopicId::new(0)
    }

    #[test]
    fn display_and_default_name() {
        let mut group = Group::new(GroupId::new(3), "Neutral");
        assert_eq!(group.to_string(), "Group 'Neutral' (id=GroupID(3)) with 0 members");
        group.insert_member(AgentId::new(1));
        assert_eq!(group.to_string(), "Group 'Neutral' (id=GroupID(3)) with 1 members");

        let unnamed = Group::new(GroupId::new(8), "");
        assert_eq!(unnamed.name(), "8");
    }

    #[test]
    fn role_is_explicit() {
        let group = Group::new(GroupId::new(1), LEGACY_MUTABLE_NAME);
        assert_eq!(group.role(), GroupRole::Fixed);
        assert!(!group.is_mutable());
        assert!(group.with_role(GroupRole::Mutable).is_mutable());

        assert_eq!(GroupRole::from_legacy_name("Neutral"), GroupRole::Mutable);
        assert_eq!(GroupRole::from_legacy_name("neutral"), GroupRole::Fixed);
        assert_eq!(GroupRole::Mutable.to_string(), "mutable");
    }

    #[test]
    fn empty_group_has_no_average() {
        let group = Group::new(GroupId::new(1), "Empty");
        assert!(group.average_opinion(topic(), |_| None).is_none());
    }

    #[test]
    fn group_opinions_are_its_own() {
        let scale = OpinionValueMap::bipolar_likert(topic());
        let mut group = Group::new(GroupId::new(1), "Positive")
            .with_opinions([Opinion::new(topic(), Some(scale), 2)]);
        assert_eq!(group.opinion_value(topic()), Some(2));
        assert!(group.set_opinion(topic(), 1).is_ok());
        assert!(group.set_opinion(topic(), 4).is_err());
        assert_eq!(group.opinion_value(topic()), Some(1));

        let mut plain = Group::new(GroupId::new(2), "Plain");
        assert!(matches!(
            plain.set_opinion(topic(), 1),
            Err(AgentError::NotOpinionated(_))
        ));
        assert!(plain.add_opinion(Opinion::new(topic(), None, 0), 1).is_ok());
        assert!(plain.is_opinionated());
    }
}
