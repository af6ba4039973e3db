//! The agent record and its capabilities.
//!
//! There is one concrete [`Agent`] type. What an agent can do is decided by
//! its [`AgentKind`]:
//!
//! | Kind      | Identity + groups | Birth year, gender, ethnicity | Opinions, communication |
//! |-----------|-------------------|-------------------------------|-------------------------|
//! | `Agent`   | yes               |                               |                         |
//! | `Animal`  | yes               | yes                           |                         |
//! | `Person`  | yes               | yes                           | yes                     |
//! | `Citizen` | yes               | yes                           | yes                     |
//! | `Alien`   | yes               | yes                           | yes                     |
//!
//! `Citizen` and `Alien` are classificatory: they behave like `Person` and
//! only record whether the agent belongs to the nation it lives in.
//!
//! Agents never hold a reference to their environment. Anything that needs
//! the current year or the attribute maps receives them as arguments, and
//! the environment owns every agent by value.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use gabm_types::{AgentId, EthnicityId, EthnicityMap, GenderId, GenderMap, GroupId, Opinion, OpinionTopicId};

use crate::config::AgentDefaults;
use crate::error::AgentError;
use crate::opinions::{OpinionBook, Opinionated};
use crate::warning::SimWarning;

/// Label used when an agent has no gender set.
pub const NO_GENDER: &str = "none";

// ---------------------------------------------------------------------------
// Kinds and capabilities
// ---------------------------------------------------------------------------

/// What an agent is, and therefore which capabilities it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// Identity and group membership only.
    Agent,
    /// Adds birth year, gender, and ethnicity.
    Animal,
    /// Adds opinions and the communication protocol.
    Person,
    /// A person who belongs to the nation they live in.
    Citizen,
    /// A person who does not belong to the nation they live in.
    Alien,
}

impl AgentKind {
    /// Whether agents of this kind have a birth year and demographics.
    pub const fn has_life(self) -> bool {
        !matches!(self, Self::Agent)
    }

    /// Whether agents of this kind hold opinions and can communicate.
    pub const fn has_opinions(self) -> bool {
        matches!(self, Self::Person | Self::Citizen | Self::Alien)
    }
}

impl core::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Agent => "Agent",
            Self::Animal => "Animal",
            Self::Person => "Person",
            Self::Citizen => "Citizen",
            Self::Alien => "Alien",
        };
        f.write_str(name)
    }
}

/// Birth year and demographic attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifeRecord {
    /// Year of birth. Never after the environment's year at creation.
    pub year_of_birth: i32,
    /// Gender, when set. Always a key of the gender map at creation.
    pub gender: Option<GenderId>,
    /// Ethnicity, when set.
    pub ethnicity: Option<EthnicityId>,
}

impl LifeRecord {
    /// Age in `current_year`, `None` on overflow.
    pub const fn age(&self, current_year: i32) -> Option<i32> {
        current_year.checked_sub(self.year_of_birth)
    }
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

/// Parameters for creating an agent.
///
/// Opinions passed in are owned by the parameters; the created agent takes them
/// over, so it never shares opinion state with the caller.
#[derive(Debug, Clone)]
pub struct AgentParams {
    /// Identifier of the new agent.
    pub id: AgentId,
    /// Kind of the new agent.
    pub kind: AgentKind,
    /// Requested birth year; defaults to `current_year - default_age`.
    pub year_of_birth: Option<i32>,
    /// Requested gender.
    pub gender: Option<GenderId>,
    /// Requested ethnicity.
    pub ethnicity: Option<EthnicityId>,
    /// Initial opinions.
    pub opinions: Vec<Opinion>,
}

impl AgentParams {
    /// Start parameters for an agent of the given kind.
    pub const fn new(id: AgentId, kind: AgentKind) -> Self {
        Self {
            id,
            kind,
            year_of_birth: None,
            gender: None,
            ethnicity: None,
            opinions: Vec::new(),
        }
    }

    /// Start parameters for a plain agent.
    pub const fn agent(id: AgentId) -> Self {
        Self::new(id, AgentKind::Agent)
    }

    /// Start parameters for an animal.
    pub const fn animal(id: AgentId) -> Self {
        Self::new(id, AgentKind::Animal)
    }

    /// Start parameters for a person.
    pub const fn person(id: AgentId) -> Self {
        Self::new(id, AgentKind::Person)
    }

    /// Set the birth year.
    #[must_use]
    pub const fn born(mut self, year: i32) -> Self {
        self.year_of_birth = Some(year);
        self
    }

    /// Set the gender.
    #[must_use]
    pub const fn gender(mut self, gender: GenderId) -> Self {
        self.gender = Some(gender);
        self
    }

    /// Set the ethnicity.
    #[must_use]
    pub const fn ethnicity(mut self, ethnicity: EthnicityId) -> Self {
        self.ethnicity = Some(ethnicity);
        self
    }

    /// Add an initial opinion.
    #[must_use]
    pub fn opinion(mut self, opinion: Opinion) -> Self {
        self.opinions.push(opinion);
        self
    }

    /// Add copies of borrowed opinions.
    #[must_use]
    pub fn opinions_from<'a>(mut self, opinions: impl IntoIterator<Item = &'a Opinion>) -> Self {
        self.opinions.extend(opinions.into_iter().cloned());
        self
    }
}

/// Context an agent is born into.
#[derive(Debug, Clone, Copy)]
pub struct BirthContext<'a> {
    /// The environment's current year.
    pub current_year: i32,
    /// Registered genders.
    pub genders: &'a GenderMap,
    /// Registered ethnicities.
    pub ethnicities: &'a EthnicityMap,
    /// Demographic defaults.
    pub defaults: &'a AgentDefaults,
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// An agent in the simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Agent {
    id: AgentId,
    kind: AgentKind,
    groups: BTreeSet<GroupId>,
    life: Option<LifeRecord>,
    opinions: Option<OpinionBook>,
}

impl Agent {
    /// Create an agent from creation parameters.
    ///
    /// Capabilities not carried by the kind are not created: a plain agent
    /// ignores demographic fields.
    ///
    /// Returns the agent together with any non-fatal warnings raised while
    /// creating it:
    /// - a birth year after `current_year` is clamped to `current_year`;
    /// - for opinion-holding kinds, an age above the plausible maximum raises
    ///   an unusual-age warning; the birth year is kept.
    ///
    /// # Errors
    ///
    /// - [`AgentError::InvalidGender`] if the gender is not in the gender map.
    /// - [`AgentError::InvalidEthnicity`] if the ethnicity is not in the
    ///   ethnicity map.
    /// - [`AgentError::NotOpinionated`] if opinions are supplied for a kind
    ///   that cannot hold them.
    pub fn create(
        params: AgentParams,
        ctx: &BirthContext<'_>,
    ) -> Result<(Self, Vec<SimWarning>), AgentError> {
        let AgentParams {
            id,
            kind,
            year_of_birth,
            gender,
            ethnicity,
            opinions,
        } = params;
        let mut warnings = Vec::new();

        if !kind.has_opinions() && !opinions.is_empty() {
            return Err(AgentError::NotOpinionated(format!("{id} ({kind})")));
        }

        let life = if kind.has_life() {
            if let Some(g) = gender
                && !ctx.genders.contains(g)
            {
                return Err(AgentError::InvalidGender {
                    agent: id,
                    gender: g,
                    valid: ctx.genders.ids(),
                });
            }
            if let Some(e) = ethnicity
                && !ctx.ethnicities.contains(e)
            {
                return Err(AgentError::InvalidEthnicity {
                    agent: id,
                    ethnicity: e,
                    valid: ctx.ethnicities.ids(),
                });
            }

            let mut year = year_of_birth
                .unwrap_or_else(|| ctx.defaults.default_birth_year(ctx.current_year));
            if year > ctx.current_year {
                warnings.push(SimWarning::InvalidBirthYear {
                    agent: id,
                    requested: year,
                    clamped_to: ctx.current_year,
                });
                year = ctx.current_year;
            }

            if kind.has_opinions() {
                let age = ctx.current_year.saturating_sub(year);
                if ctx.defaults.is_unusual_age(age) {
                    warnings.push(SimWarning::UnusualAge { agent: id, age });
                }
            }

            Some(LifeRecord {
                year_of_birth: year,
                gender,
                ethnicity,
            })
        } else {
            None
        };

        let opinions = kind
            .has_opinions()
            .then(|| OpinionBook::from_opinions(opinions));

        for warning in &warnings {
            warning.emit();
        }

        Ok((
            Self {
                id,
                kind,
                groups: BTreeSet::new(),
                life,
                opinions,
            },
            warnings,
        ))
    }

    /// The agent's identifier.
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// The agent's kind.
    pub const fn kind(&self) -> AgentKind {
        self.kind
    }

    /// Groups the agent belongs to.
    pub const fn groups(&self) -> &BTreeSet<GroupId> {
        &self.groups
    }

    /// Whether the agent belongs to `group`.
    pub fn in_group(&self, group: GroupId) -> bool {
        self.groups.contains(&group)
    }

    /// Demographic record, for kinds that have one.
    pub const fn life(&self) -> Option<&LifeRecord> {
        self.life.as_ref()
    }

    /// Birth year, for kinds that have one.
    pub fn year_of_birth(&self) -> Option<i32> {
        self.life.as_ref().map(|life| life.year_of_birth)
    }

    /// Age in `current_year`, for kinds that have a birth year.
    pub fn age(&self, current_year: i32) -> Option<i32> {
        self.life.as_ref().and_then(|life| life.age(current_year))
    }

    /// Gender, when set.
    pub fn gender(&self) -> Option<GenderId> {
        self.life.as_ref().and_then(|life| life.gender)
    }

    /// Ethnicity, when set.
    pub fn ethnicity(&self) -> Option<EthnicityId> {
        self.life.as_ref().and_then(|life| life.ethnicity)
    }

    /// Gender label, `"none"` when no gender is set.
    pub fn gender_description(&self, genders: &GenderMap) -> String {
        self.gender().map_or_else(
            || String::from(NO_GENDER),
            |g| {
                genders
                    .describe(g)
                    .map_or_else(|| g.to_string(), str::to_owned)
            },
        )
    }

    /// Ethnicity label, when set and registered.
    pub fn ethnicity_description<'m>(&self, ethnicities: &'m EthnicityMap) -> Option<&'m str> {
        self.ethnicity().and_then(|e| ethnicities.describe(e))
    }

    /// Deterministic summary of age and gender, for prompts and display.
    ///
    /// `"I am {age} years old. "` followed by `"I am {gender}. "` when a
    /// gender is set. Empty for kinds without a birth year.
    pub fn self_description(&self, current_year: i32, genders: &GenderMap) -> String {
        let Some(age) = self.age(current_year) else {
            return String::new();
        };
        let mut desc = format!("I am {age} years old. ");
        if self.gender().is_some() {
            desc.push_str(&format!("I am {}. ", self.gender_description(genders)));
        }
        desc
    }

    /// Summary of the topics the agent holds opinions on.
    pub fn opinion_profile(&self) -> String {
        self.opinions
            .as_ref()
            .map_or_else(|| OpinionBook::new().profile(), OpinionBook::profile)
    }

    /// Update the value of an opinion the agent already holds.
    ///
    /// # Errors
    ///
    /// - [`AgentError::NotOpinionated`] if the agent's kind has no opinions.
    /// - [`AgentError::UnknownOpinionTopic`] if there is no entry for `topic`.
    /// - [`AgentError::InvalidOpinionValue`] if `value` is off the scale.
    pub fn set_opinion(&mut self, topic: OpinionTopicId, value: i32) -> Result<(), AgentError> {
        let holder = self.id.to_string();
        self.book_mut()?.set(topic, value, &holder)
    }

    /// Insert or replace the opinion on `opinion`'s topic, set to `value`.
    ///
    /// # Errors
    ///
    /// - [`AgentError::NotOpinionated`] if the agent's kind has no opinions.
    /// - [`AgentError::InvalidOpinionValue`] if `value` is off the scale.
    pub fn add_opinion(&mut self, opinion: Opinion, value: i32) -> Result<Option<Opinion>, AgentError> {
        self.book_mut()?.add(opinion, value)
    }

    /// Plain `topic -> value` view of the agent's opinions.
    pub fn opinion_values(&self) -> Option<BTreeMap<OpinionTopicId, i32>> {
        self.opinions.as_ref().map(OpinionBook::values)
    }

    fn book_mut(&mut self) -> Result<&mut OpinionBook, AgentError> {
        let label = format!("{} ({})", self.id, self.kind);
        self.opinions
            .as_mut()
            .ok_or(AgentError::NotOpinionated(label))
    }

    pub(crate) fn replace_opinions(&mut self, book: OpinionBook) {
        if self.opinions.is_some() {
            self.opinions = Some(book);
        }
    }

    pub(crate) fn join(&mut self, group: GroupId) -> bool {
        self.groups.insert(group)
    }

    pub(crate) fn leave(&mut self, group: GroupId) -> bool {
        self.groups.remove(&group)
    }
}

impl Opinionated for Agent {
    fn opinions(&self) -> Option<&OpinionBook> {
        self.opinions.as_ref()
    }
}

impl core::fmt::Display for Agent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}({})", self.kind, self.id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gabm_types::OpinionValueMap;

    use super::*;

    const YEAR: i32 = 2024;

    struct Maps {
        genders: GenderMap,
        ethnicities: EthnicityMap,
        defaults: AgentDefaults,
    }

    impl Maps {
        fn new() -> Self {
            Self {
                genders: GenderMap::default(),
                ethnicities: EthnicityMap::default(),
                defaults: AgentDefaults::default(),
            }
        }

        fn ctx(&self) -> BirthContext<'_> {
            BirthContext {
                current_year: YEAR,
                genders: &self.genders,
                ethnicities: &self.ethnicities,
                defaults: &self.defaults,
            }
        }
    }

    fn topic() -> OpinionTopicId {
        OpinionTopicId::new(0)
    }

    fn stance(value: i32) -> Opinion {
        Opinion::new(topic(), Some(OpinionValueMap::bipolar_likert(topic())), value)
    }

    #[test]
    fn kinds_carry_capabilities() {
        assert!(!AgentKind::Agent.has_life());
        assert!(AgentKind::Animal.has_life());
        assert!(!AgentKind::Animal.has_opinions());
        for kind in [AgentKind::Person, AgentKind::Citizen, AgentKind::Alien] {
            assert!(kind.has_life());
            assert!(kind.has_opinions());
        }
    }

    #[test]
    fn default_birth_year_is_eighteen_years_ago() {
        let maps = Maps::new();
        let (agent, warnings) = Agent::create(AgentParams::animal(AgentId::new(1)), &maps.ctx()).unwrap();
        assert_eq!(agent.year_of_birth(), Some(2006));
        assert_eq!(agent.age(YEAR), Some(18));
        assert!(warnings.is_empty());
    }

    #[test]
    fn future_birth_year_is_clamped() {
        let maps = Maps::new();
        let params = AgentParams::animal(AgentId::new(1)).born(YEAR + 5);
        let (agent, warnings) = Agent::create(params, &maps.ctx()).unwrap();
        assert_eq!(agent.year_of_birth(), Some(YEAR));
        assert_eq!(
            warnings,
            vec![SimWarning::InvalidBirthYear {
                agent: AgentId::new(1),
                requested: YEAR + 5,
                clamped_to: YEAR,
            }]
        );
    }

    #[test]
    fn implausible_age_keeps_birth_year_and_warns() {
        let maps = Maps::new();
        let params = AgentParams::person(AgentId::new(2)).born(1700);
        let (agent, warnings) = Agent::create(params, &maps.ctx()).unwrap();
        assert_eq!(agent.year_of_birth(), Some(1700));
        assert_eq!(agent.age(YEAR), Some(324));
        assert_eq!(
            warnings,
            vec![SimWarning::UnusualAge {
                agent: AgentId::new(2),
                age: 324,
            }]
        );

        // At the limit nothing is flagged.
        let params = AgentParams::person(AgentId::new(5)).born(YEAR - 200);
        let (_, warnings) = Agent::create(params, &maps.ctx()).unwrap();
        assert!(warnings.is_empty());

        // Animals are not age-checked.
        let params = AgentParams::animal(AgentId::new(3)).born(1700);
        let (animal, warnings) = Agent::create(params, &maps.ctx()).unwrap();
        assert_eq!(animal.age(YEAR), Some(324));
        assert!(warnings.is_empty());
    }

    #[test]
    fn unknown_gender_is_rejected() {
        let maps = Maps::new();
        let params = AgentParams::person(AgentId::new(1)).gender(GenderId::new(7));
        let result = Agent::create(params, &maps.ctx());
        assert!(matches!(
            result,
            Err(AgentError::InvalidGender { gender, .. }) if gender == GenderId::new(7)
        ));
    }

    #[test]
    fn unknown_ethnicity_is_rejected() {
        let maps = Maps::new();
        let params = AgentParams::animal(AgentId::new(1)).ethnicity(EthnicityId::new(40));
        assert!(matches!(
            Agent::create(params, &maps.ctx()),
            Err(AgentError::InvalidEthnicity { .. })
        ));
    }

    #[test]
    fn plain_agent_cannot_take_opinions() {
        let maps = Maps::new();
        let params = AgentParams::agent(AgentId::new(1)).opinion(stance(1));
        assert!(matches!(
            Agent::create(params, &maps.ctx()),
            Err(AgentError::NotOpinionated(_))
        ));

        let (mut plain, _) = Agent::create(AgentParams::agent(AgentId::new(2)), &maps.ctx()).unwrap();
        assert!(plain.life().is_none());
        assert!(!plain.is_opinionated());
        assert!(matches!(
            plain.set_opinion(topic(), 1),
            Err(AgentError::NotOpinionated(_))
        ));
        assert_eq!(plain.opinion_profile(), "I have no opinions.");
    }

    #[test]
    fn descriptions() {
        let maps = Maps::new();
        let params = AgentParams::person(AgentId::new(1))
            .born(1990)
            .gender(GenderId::new(2))
            .ethnicity(EthnicityId::new(1));
        let (person, _) = Agent::create(params, &maps.ctx()).unwrap();
        assert_eq!(
            person.self_description(YEAR, &maps.genders),
            "I am 34 years old. I am non-binary. "
        );
        assert_eq!(person.ethnicity_description(&maps.ethnicities), Some("asian"));

        let (ungendered, _) = Agent::create(AgentParams::person(AgentId::new(2)), &maps.ctx()).unwrap();
        assert_eq!(ungendered.gender_description(&maps.genders), NO_GENDER);
        assert_eq!(ungendered.self_description(YEAR, &maps.genders), "I am 18 years old. ");
        assert_eq!(ungendered.to_string(), "Person(AgentID(2))");
    }

    #[test]
    fn set_and_add_opinion() {
        let maps = Maps::new();
        let params = AgentParams::person(AgentId::new(1)).opinion(stance(0));
        let (mut person, _) = Agent::create(params, &maps.ctx()).unwrap();

        assert!(person.set_opinion(topic(), 2).is_ok());
        assert_eq!(person.opinion_value(topic()), Some(2));

        let other = OpinionTopicId::new(1);
        assert!(matches!(
            person.set_opinion(other, 1),
            Err(AgentError::UnknownOpinionTopic { .. })
        ));
        let added = person.add_opinion(Opinion::new(other, None, 0), 7).unwrap();
        assert!(added.is_none());
        assert!(person.set_opinion(other, 1).is_ok());
        assert_eq!(person.opinion_values().map(|v| v.len()), Some(2));
    }

    #[test]
    fn source_opinion_is_copied() {
        let maps = Maps::new();
        let source = stance(1);
        let (mut a, _) = Agent::create(
            AgentParams::person(AgentId::new(1)).opinions_from([&source]),
            &maps.ctx(),
        )
        .unwrap();
        let (b, _) = Agent::create(
            AgentParams::person(AgentId::new(2)).opinions_from([&source]),
            &maps.ctx(),
        )
        .unwrap();

        a.set_opinion(topic(), -2).unwrap();
        assert_eq!(a.opinion_value(topic()), Some(-2));
        assert_eq!(b.opinion_value(topic()), Some(1));
        assert_eq!(source.value(), 1);
    }
}
