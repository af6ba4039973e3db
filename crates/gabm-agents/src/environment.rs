//! The environment registry.
//!
//! An [`Environment`] owns every agent and group of a run by value, split
//! into active and inactive maps. Deactivation moves an entry between the
//! maps; nothing is ever deleted, so history stays resolvable.
//!
//! The environment is also the only place where membership changes: both
//! sides of the agent/group relation are updated in one call, after both
//! endpoints have been checked, so no half-updated state is observable.
//!
//! Three environment shapes are distinguished by [`EnvironmentKind`]:
//! a plain registry, an opinionated one that holds its own opinions, and a
//! nation, which is an opinionated environment with a name.

use std::collections::{BTreeMap, BTreeSet};

use gabm_types::{
    AgentId, EthnicityMap, GenderMap, GroupId, Opinion, OpinionTopicId, RoundSnapshot, mean_of,
};

use crate::agent::{Agent, AgentParams, BirthContext};
use crate::config::AgentDefaults;
use crate::error::AgentError;
use crate::group::{Group, GroupRole};
use crate::opinions::{OpinionBook, Opinionated};
use crate::warning::SimWarning;

/// Shape of an environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentKind {
    /// Registry only.
    Plain,
    /// Holds environment-level opinions.
    Opinionated,
    /// An opinionated environment with a nation name.
    Nation,
}

/// Registry of agents and groups for one simulation run.
#[derive(Debug, Clone)]
pub struct Environment {
    current_year: i32,
    place: String,
    agents_active: BTreeMap<AgentId, Agent>,
    agents_inactive: BTreeMap<AgentId, Agent>,
    groups_active: BTreeMap<GroupId, Group>,
    groups_inactive: BTreeMap<GroupId, Group>,
    opinions: Option<OpinionBook>,
    nation_name: Option<String>,
    genders: GenderMap,
    ethnicities: EthnicityMap,
    defaults: AgentDefaults,
    warnings: Vec<SimWarning>,
}

impl Environment {
    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Create a plain environment with the default attribute maps.
    pub fn new(current_year: i32, place: impl Into<String>) -> Self {
        Self {
            current_year,
            place: place.into(),
            agents_active: BTreeMap::new(),
            agents_inactive: BTreeMap::new(),
            groups_active: BTreeMap::new(),
            groups_inactive: BTreeMap::new(),
            opinions: None,
            nation_name: None,
            genders: GenderMap::default(),
            ethnicities: EthnicityMap::default(),
            defaults: AgentDefaults::default(),
            warnings: Vec::new(),
        }
    }

    /// Create an environment that holds its own opinions.
    pub fn opinionated(
        current_year: i32,
        place: impl Into<String>,
        opinions: impl IntoIterator<Item = Opinion>,
    ) -> Self {
        let mut env = Self::new(current_year, place);
        env.opinions = Some(OpinionBook::from_opinions(opinions));
        env
    }

    /// Create a nation.
    pub fn nation(
        current_year: i32,
        place: impl Into<String>,
        opinions: impl IntoIterator<Item = Opinion>,
        nation_name: impl Into<String>,
    ) -> Self {
        let mut env = Self::opinionated(current_year, place, opinions);
        env.nation_name = Some(nation_name.into());
        env
    }

    /// Replace the gender map.
    #[must_use]
    pub fn with_genders(mut self, genders: GenderMap) -> Self {
        self.genders = genders;
        self
    }

    /// Replace the ethnicity map.
    #[must_use]
    pub fn with_ethnicities(mut self, ethnicities: EthnicityMap) -> Self {
        self.ethnicities = ethnicities;
        self
    }

    /// Replace the agent defaults.
    #[must_use]
    pub const fn with_defaults(mut self, defaults: AgentDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The current year, used for ages.
    pub const fn current_year(&self) -> i32 {
        self.current_year
    }

    /// Where the environment is.
    pub fn place(&self) -> &str {
        &self.place
    }

    /// The environment's shape.
    pub const fn kind(&self) -> EnvironmentKind {
        match (&self.opinions, &self.nation_name) {
            (_, Some(_)) => EnvironmentKind::Nation,
            (Some(_), None) => EnvironmentKind::Opinionated,
            (None, None) => EnvironmentKind::Plain,
        }
    }

    /// The nation name, for nations.
    pub fn nation_name(&self) -> Option<&str> {
        self.nation_name.as_deref()
    }

    /// Registered genders.
    pub const fn genders(&self) -> &GenderMap {
        &self.genders
    }

    /// Registered ethnicities.
    pub const fn ethnicities(&self) -> &EthnicityMap {
        &self.ethnicities
    }

    /// Demographic defaults for new agents.
    pub const fn defaults(&self) -> &AgentDefaults {
        &self.defaults
    }

    /// Warnings recorded so far, oldest first.
    pub fn warnings(&self) -> &[SimWarning] {
        &self.warnings
    }

    /// Drain the warning journal.
    pub fn take_warnings(&mut self) -> Vec<SimWarning> {
        core::mem::take(&mut self.warnings)
    }

    pub(crate) fn record_warning(&mut self, warning: SimWarning) {
        self.warnings.push(warning);
    }

    // -----------------------------------------------------------------------
    // Agents
    // -----------------------------------------------------------------------

    /// Create an agent from `params` and register it as active.
    ///
    /// Creation warnings are appended to the journal.
    ///
    /// # Errors
    ///
    /// - [`AgentError::DuplicateAgent`] if the ID is already registered,
    ///   active or not.
    /// - Any error from [`Agent::create`].
    pub fn add_agent(&mut self, params: AgentParams) -> Result<AgentId, AgentError> {
        if self.is_registered_agent(params.id) {
            return Err(AgentError::DuplicateAgent(params.id));
        }
        let ctx = BirthContext {
            current_year: self.current_year,
            genders: &self.genders,
            ethnicities: &self.ethnicities,
            defaults: &self.defaults,
        };
        let (agent, warnings) = Agent::create(params, &ctx)?;
        self.warnings.extend(warnings);
        self.insert_agent(agent)
    }

    /// Register an already built agent as active. Group memberships the
    /// agent carries are dropped; use [`Environment::add_member`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::DuplicateAgent`] if the ID is already registered.
    pub fn insert_agent(&mut self, mut agent: Agent) -> Result<AgentId, AgentError> {
        let id = agent.id();
        if self.is_registered_agent(id) {
            return Err(AgentError::DuplicateAgent(id));
        }
        let stale: Vec<GroupId> = agent.groups().iter().copied().collect();
        for group in stale {
            agent.leave(group);
        }
        tracing::debug!(agent = %id, kind = %agent.kind(), "agent registered");
        self.agents_active.insert(id, agent);
        Ok(id)
    }

    /// An active agent.
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents_active.get(&id)
    }

    /// An agent, active or not.
    pub fn any_agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents_active
            .get(&id)
            .or_else(|| self.agents_inactive.get(&id))
    }

    /// Mutable access to an active agent.
    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents_active.get_mut(&id)
    }

    /// Active agents in ID order.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents_active.values()
    }

    /// Inactive agents in ID order.
    pub fn inactive_agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents_inactive.values()
    }

    /// Whether `id` is registered, active or not.
    pub fn is_registered_agent(&self, id: AgentId) -> bool {
        self.agents_active.contains_key(&id) || self.agents_inactive.contains_key(&id)
    }

    /// Move an agent from the active to the inactive map. Memberships are kept.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AgentNotFound`] if the agent is not active.
    pub fn deactivate_agent(&mut self, id: AgentId) -> Result<(), AgentError> {
        let agent = self
            .agents_active
            .remove(&id)
            .ok_or(AgentError::AgentNotFound(id))?;
        self.agents_inactive.insert(id, agent);
        tracing::debug!(agent = %id, "agent deactivated");
        Ok(())
    }

    /// Move an agent from the inactive back to the active map.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AgentNotFound`] if the agent is not inactive.
    pub fn reactivate_agent(&mut self, id: AgentId) -> Result<(), AgentError> {
        let agent = self
            .agents_inactive
            .remove(&id)
            .ok_or(AgentError::AgentNotFound(id))?;
        self.agents_active.insert(id, agent);
        tracing::debug!(agent = %id, "agent reactivated");
        Ok(())
    }

    /// Self description of a registered agent, using this environment's
    /// year and gender map.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AgentNotFound`] if the agent is not registered.
    pub fn self_description(&self, id: AgentId) -> Result<String, AgentError> {
        self.any_agent(id)
            .map(|agent| agent.self_description(self.current_year, &self.genders))
            .ok_or(AgentError::AgentNotFound(id))
    }

    // -----------------------------------------------------------------------
    // Groups
    // -----------------------------------------------------------------------

    /// Register a group as active. Members the group carries are dropped;
    /// use [`Environment::add_member`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::DuplicateGroup`] if the ID is already registered.
    pub fn add_group(&mut self, mut group: Group) -> Result<GroupId, AgentError> {
        let id = group.id();
        if self.groups_active.contains_key(&id) || self.groups_inactive.contains_key(&id) {
            return Err(AgentError::DuplicateGroup(id));
        }
        let stale: Vec<AgentId> = group.members().iter().copied().collect();
        for agent in stale {
            group.remove_member(agent);
        }
        tracing::debug!(group = %id, name = group.name(), role = %group.role(), "group registered");
        self.groups_active.insert(id, group);
        Ok(id)
    }

    /// An active group.
    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups_active.get(&id)
    }

    /// A group, active or not.
    pub fn any_group(&self, id: GroupId) -> Option<&Group> {
        self.groups_active
            .get(&id)
            .or_else(|| self.groups_inactive.get(&id))
    }

    /// Mutable access to an active group, for its own opinions.
    pub fn group_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        self.groups_active.get_mut(&id)
    }

    /// Active groups in ID order.
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups_active.values()
    }

    /// Inactive groups in ID order.
    pub fn inactive_groups(&self) -> impl Iterator<Item = &Group> {
        self.groups_inactive.values()
    }

    /// Move a group from the active to the inactive map. Members are kept,
    /// but an inactive group no longer confers its role in communication.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::GroupNotFound`] if the group is not active.
    pub fn deactivate_group(&mut self, id: GroupId) -> Result<(), AgentError> {
        let group = self
            .groups_active
            .remove(&id)
            .ok_or(AgentError::GroupNotFound(id))?;
        self.groups_inactive.insert(id, group);
        tracing::debug!(group = %id, "group deactivated");
        Ok(())
    }

    /// Move a group from the inactive back to the active map.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::GroupNotFound`] if the group is not inactive.
    pub fn reactivate_group(&mut self, id: GroupId) -> Result<(), AgentError> {
        let group = self
            .groups_inactive
            .remove(&id)
            .ok_or(AgentError::GroupNotFound(id))?;
        self.groups_active.insert(id, group);
        tracing::debug!(group = %id, "group reactivated");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------------

    /// Add `agent` to `group`, updating both sides. Returns `false` if the
    /// agent was already a member.
    ///
    /// Both must be registered; either may be inactive.
    ///
    /// # Errors
    ///
    /// - [`AgentError::AgentNotFound`] if the agent is not registered.
    /// - [`AgentError::GroupNotFound`] if the group is not registered.
    ///
    /// Nothing changes on error.
    pub fn add_member(&mut self, group: GroupId, agent: AgentId) -> Result<bool, AgentError> {
        self.check_endpoints(group, agent)?;
        let mut added = false;
        if let Some(g) = self.any_group_mut(group) {
            added = g.insert_member(agent);
        }
        if let Some(a) = self.any_agent_mut(agent) {
            a.join(group);
        }
        if added {
            tracing::debug!(group = %group, agent = %agent, "member added");
        }
        Ok(added)
    }

    /// Remove `agent` from `group`, updating both sides. Returns `false` if
    /// the agent was not a member.
    ///
    /// # Errors
    ///
    /// Same as [`Environment::add_member`]. Nothing changes on error.
    pub fn remove_member(&mut self, group: GroupId, agent: AgentId) -> Result<bool, AgentError> {
        self.check_endpoints(group, agent)?;
        let mut removed = false;
        if let Some(g) = self.any_group_mut(group) {
            removed = g.remove_member(agent);
        }
        if let Some(a) = self.any_agent_mut(agent) {
            a.leave(group);
        }
        if removed {
            tracing::debug!(group = %group, agent = %agent, "member removed");
        }
        Ok(removed)
    }

    /// Agent-side spelling of [`Environment::add_member`].
    ///
    /// # Errors
    ///
    /// Same as [`Environment::add_member`].
    pub fn join_group(&mut self, agent: AgentId, group: GroupId) -> Result<bool, AgentError> {
        self.add_member(group, agent)
    }

    /// Agent-side spelling of [`Environment::remove_member`].
    ///
    /// # Errors
    ///
    /// Same as [`Environment::remove_member`].
    pub fn leave_group(&mut self, agent: AgentId, group: GroupId) -> Result<bool, AgentError> {
        self.remove_member(group, agent)
    }

    /// Members of a registered group, in ID order.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::GroupNotFound`] if the group is not registered.
    pub fn list_members(&self, group: GroupId) -> Result<Vec<&Agent>, AgentError> {
        let g = self.any_group(group).ok_or(AgentError::GroupNotFound(group))?;
        Ok(g.members()
            .iter()
            .filter_map(|id| self.any_agent(*id))
            .collect())
    }

    /// Whether `agent` belongs to any active mutable group.
    ///
    /// Membership in several groups with different roles resolves to
    /// mutable as soon as one of them is.
    pub fn in_mutable_group(&self, agent: &Agent) -> bool {
        agent
            .groups()
            .iter()
            .any(|id| self.groups_active.get(id).is_some_and(Group::is_mutable))
    }

    /// Active agents that belong to at least one active group with `role`.
    pub fn agents_with_role(&self, role: GroupRole) -> BTreeSet<AgentId> {
        self.groups_active
            .values()
            .filter(|g| g.role() == role)
            .flat_map(|g| g.members().iter().copied())
            .filter(|id| self.agents_active.contains_key(id))
            .collect()
    }

    fn check_endpoints(&self, group: GroupId, agent: AgentId) -> Result<(), AgentError> {
        if self.any_group(group).is_none() {
            return Err(AgentError::GroupNotFound(group));
        }
        if !self.is_registered_agent(agent) {
            return Err(AgentError::AgentNotFound(agent));
        }
        Ok(())
    }

    fn any_agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents_active
            .get_mut(&id)
            .or_else(|| self.agents_inactive.get_mut(&id))
    }

    fn any_group_mut(&mut self, id: GroupId) -> Option<&mut Group> {
        self.groups_active
            .get_mut(&id)
            .or_else(|| self.groups_inactive.get_mut(&id))
    }

    pub(crate) fn agents_active_mut(&mut self) -> &mut BTreeMap<AgentId, Agent> {
        &mut self.agents_active
    }

    // -----------------------------------------------------------------------
    // Opinions
    // -----------------------------------------------------------------------

    /// Update the environment's own opinion on an existing topic.
    ///
    /// # Errors
    ///
    /// - [`AgentError::NotOpinionated`] for a plain environment.
    /// - [`AgentError::UnknownOpinionTopic`] if there is no entry for `topic`.
    /// - [`AgentError::InvalidOpinionValue`] if `value` is off the scale.
    pub fn set_opinion(&mut self, topic: OpinionTopicId, value: i32) -> Result<(), AgentError> {
        let holder = format!("environment '{}'", self.place);
        self.opinions
            .as_mut()
            .ok_or_else(|| AgentError::NotOpinionated(holder.clone()))?
            .set(topic, value, &holder)
    }

    /// Insert or replace the environment's own opinion on a topic.
    ///
    /// # Errors
    ///
    /// - [`AgentError::NotOpinionated`] for a plain environment.
    /// - [`AgentError::InvalidOpinionValue`] if `value` is off the scale.
    pub fn add_opinion(&mut self, opinion: Opinion, value: i32) -> Result<Option<Opinion>, AgentError> {
        let holder = format!("environment '{}'", self.place);
        self.opinions
            .as_mut()
            .ok_or(AgentError::NotOpinionated(holder))?
            .add(opinion, value)
    }

    /// Mean value on `topic` across active agents that hold an opinion on
    /// it. `None` when nobody does.
    pub fn average_opinion(&self, topic: OpinionTopicId) -> Option<f64> {
        mean_of(
            self.agents_active
                .values()
                .filter_map(|agent| agent.opinion_value(topic)),
        )
    }

    /// Mean value on `topic` across a registered group's members.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::GroupNotFound`] if the group is not registered.
    pub fn group_average_opinion(
        &self,
        group: GroupId,
        topic: OpinionTopicId,
    ) -> Result<Option<f64>, AgentError> {
        let g = self.any_group(group).ok_or(AgentError::GroupNotFound(group))?;
        Ok(g.average_opinion(topic, |id| self.any_agent(id)))
    }

    /// Opinion values of every active opinion holder, tagged with `round`.
    pub fn snapshot(&self, round: u32) -> RoundSnapshot {
        RoundSnapshot {
            round,
            opinions: self
                .agents_active
                .iter()
                .filter_map(|(id, agent)| agent.opinion_values().map(|values| (*id, values)))
                .collect(),
        }
    }
}

impl Opinionated for Environment {
    fn opinions(&self) -> Option<&OpinionBook> {
        self.opinions.as_ref()
    }
}
