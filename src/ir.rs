use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{Months, NaiveDate, TimeDelta};
use once_cell::unsync::OnceCell;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::TreeError;

const MAX_LIFETIME_YEARS: i64 = 100;
pub(crate) const DAYS_IN_YEAR: i64 = 365;
const PREGNANCY_WEEKS: i64 = 40;
const WEDDING_JITTER_WEEKS: i64 = 500;
const MARRIAGEABLE_AGE_YEARS: u32 = 18;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrampsId(String);

impl GrampsId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GrampsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GrampsId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for GrampsId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for GrampsId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateQuality {
    Exact,
    Estimated,
}

impl fmt::Display for DateQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateQuality::Exact => Ok(()),
            DateQuality::Estimated => f.write_str("≈ "),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Date {
    pub date: NaiveDate,
    pub quality: DateQuality,
}

impl Date {
    pub fn exact(date: NaiveDate) -> Self {
        Self {
            date,
            quality: DateQuality::Exact,
        }
    }

    pub fn estimated(date: NaiveDate) -> Self {
        Self {
            date,
            quality: DateQuality::Estimated,
        }
    }

    pub fn is_estimated(&self) -> bool {
        self.quality == DateQuality::Estimated
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.quality, self.date.format("%d %B %Y"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Gender {
    Female,
    Male,
    Unknown,
}

impl TryFrom<u8> for Gender {
    type Error = TreeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Gender::Female),
            1 => Ok(Gender::Male),
            2 => Ok(Gender::Unknown),
            _ => Err(TreeError::UnknownGender { value }),
        }
    }
}

/// A person of the tree.
///
/// Equality and hashing go by `id` only. Notes, events and media are plain
/// references into collections owned elsewhere.
#[derive(Debug, Clone)]
pub struct Person {
    pub id: GrampsId,
    pub full_name: String,
    pub birth: Date,
    pub death: Date,
    pub gender: Gender,
    pub notes: BTreeSet<GrampsId>,
    pub events: BTreeSet<GrampsId>,
    pub media: BTreeSet<GrampsId>,
}

impl Person {
    /// Builds a person, defaulting an unknown death to an estimated
    /// `birth + 100 years`.
    pub fn new(
        id: impl Into<GrampsId>,
        full_name: impl Into<String>,
        birth: Option<Date>,
        death: Option<Date>,
        gender: Gender,
    ) -> Result<Self, TreeError> {
        let id = id.into();
        let Some(birth) = birth else {
            return Err(TreeError::PersonWithoutBirthday { id });
        };
        let death = match death {
            Some(death) => death,
            None => {
                let default_death = birth
                    .date
                    .checked_add_signed(TimeDelta::days(DAYS_IN_YEAR * MAX_LIFETIME_YEARS))
                    .ok_or_else(|| TreeError::MalformedDate {
                        raw: format!("{} + {MAX_LIFETIME_YEARS} years", birth.date),
                    })?;
                Date::estimated(default_death)
            }
        };
        if death.date < birth.date {
            return Err(TreeError::DeathBeforeBirth { id });
        }
        Ok(Self {
            id,
            full_name: full_name.into(),
            birth,
            death,
            gender,
            notes: BTreeSet::new(),
            events: BTreeSet::new(),
            media: BTreeSet::new(),
        })
    }

    pub fn days_of_life(&self) -> i64 {
        (self.death.date - self.birth.date).num_days()
    }

    pub fn mid_life(&self) -> NaiveDate {
        self.birth.date + (self.death.date - self.birth.date) / 2
    }

    pub fn is_male(&self) -> bool {
        self.gender == Gender::Male
    }

    pub fn is_female(&self) -> bool {
        self.gender == Gender::Female
    }

    /// `"Full Name (1950-2010)"`; a death lying after `today` prints as
    /// `present_label`.
    pub fn label(&self, today: NaiveDate, present_label: &str) -> String {
        let right = if self.death.date > today {
            present_label.to_string()
        } else {
            self.death.date.format("%Y").to_string()
        };
        format!(
            "{} ({}-{})",
            self.full_name,
            self.birth.date.format("%Y"),
            right
        )
    }

    pub fn add_note(&mut self, note: GrampsId) {
        self.notes.insert(note);
    }

    pub fn add_event(&mut self, event: GrampsId) {
        self.events.insert(event);
    }

    pub fn add_media(&mut self, media: GrampsId) {
        self.media.insert(media);
    }
}

impl PartialEq for Person {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Person {}

impl Hash for Person {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[derive(Debug, Clone)]
pub struct Family {
    pub id: GrampsId,
    pub father: Option<GrampsId>,
    pub mother: Option<GrampsId>,
    pub children: BTreeSet<GrampsId>,
    wedding_day: OnceCell<NaiveDate>,
}

impl Family {
    pub fn new(id: impl Into<GrampsId>) -> Self {
        Self {
            id: id.into(),
            father: None,
            mother: None,
            children: BTreeSet::new(),
            wedding_day: OnceCell::new(),
        }
    }

    pub fn with_father(mut self, father: impl Into<GrampsId>) -> Self {
        self.father = Some(father.into());
        self
    }

    pub fn with_mother(mut self, mother: impl Into<GrampsId>) -> Self {
        self.mother = Some(mother.into());
        self
    }

    pub fn with_child(mut self, child: impl Into<GrampsId>) -> Self {
        self.children.insert(child.into());
        self
    }

    pub fn add_child(&mut self, child: impl Into<GrampsId>) {
        self.children.insert(child.into());
    }

    pub fn parents(&self) -> impl Iterator<Item = &GrampsId> {
        self.father.iter().chain(self.mother.iter())
    }

    pub fn has_parent(&self, id: &GrampsId) -> bool {
        self.father.as_ref() == Some(id) || self.mother.as_ref() == Some(id)
    }

    pub fn has_child(&self, id: &GrampsId) -> bool {
        self.children.contains(id)
    }

    pub fn is_full(&self) -> bool {
        self.father.is_some() && self.mother.is_some()
    }

    /// Estimated marriage date, computed on first use and then fixed for the
    /// lifetime of this family.
    ///
    /// With children: oldest child's birth minus 40 weeks minus `0..500`
    /// random weeks. Childless: the younger parent's birthday plus 18 years.
    pub fn wedding_day<R: Rng>(
        &self,
        persons: &BTreeMap<GrampsId, Person>,
        rng: &mut R,
    ) -> Result<NaiveDate, TreeError> {
        self.wedding_day
            .get_or_try_init(|| self.estimate_wedding_day(persons, rng))
            .copied()
    }

    fn estimate_wedding_day<R: Rng>(
        &self,
        persons: &BTreeMap<GrampsId, Person>,
        rng: &mut R,
    ) -> Result<NaiveDate, TreeError> {
        let lookup = |id: &GrampsId| {
            persons
                .get(id)
                .ok_or_else(|| TreeError::UnknownPerson { id: id.clone() })
        };

        let mut oldest_child: Option<&Person> = None;
        for id in &self.children {
            let child = lookup(id)?;
            if oldest_child.is_none_or(|current| child.birth.date < current.birth.date) {
                oldest_child = Some(child);
            }
        }
        if let Some(child) = oldest_child {
            let jitter = rng.random_range(0..WEDDING_JITTER_WEEKS);
            return child
                .birth
                .date
                .checked_sub_signed(TimeDelta::weeks(PREGNANCY_WEEKS + jitter))
                .ok_or_else(|| TreeError::MalformedDate {
                    raw: format!("{} - {} weeks", child.birth.date, PREGNANCY_WEEKS + jitter),
                });
        }

        let mut youngest_parent: Option<&Person> = None;
        for id in self.parents() {
            let parent = lookup(id)?;
            if youngest_parent.is_none_or(|current| parent.birth.date > current.birth.date) {
                youngest_parent = Some(parent);
            }
        }
        let parent = youngest_parent.ok_or_else(|| TreeError::EmptyFamily {
            id: self.id.clone(),
        })?;
        parent
            .birth
            .date
            .checked_add_months(Months::new(12 * MARRIAGEABLE_AGE_YEARS))
            .ok_or_else(|| TreeError::MalformedDate {
                raw: format!("{} + {MARRIAGEABLE_AGE_YEARS} years", parent.birth.date),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationType {
    Marriage,
    BirthFrom,
    Simple,
}

/// Typed edge between two persons inside one family.
///
/// For `BirthFrom`, `first` is the child and `other` the parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub first: GrampsId,
    pub kind: RelationType,
    pub other: GrampsId,
    pub family: GrampsId,
}

impl Relation {
    pub fn new(
        first: impl Into<GrampsId>,
        kind: RelationType,
        other: impl Into<GrampsId>,
        family: impl Into<GrampsId>,
    ) -> Self {
        Self {
            first: first.into(),
            kind,
            other: other.into(),
            family: family.into(),
        }
    }
}

// Buckets by family only; set membership is still decided by full equality.
impl Hash for Relation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.family.hash(state);
    }
}

/// Read-only bundle of everything the layout engines consume.
#[derive(Debug, Clone, Default)]
pub struct GrampsTree {
    persons: BTreeMap<GrampsId, Person>,
    families: BTreeMap<GrampsId, Family>,
    relations: HashSet<Relation>,
}

impl GrampsTree {
    pub fn new(
        persons: BTreeMap<GrampsId, Person>,
        families: BTreeMap<GrampsId, Family>,
        relations: HashSet<Relation>,
    ) -> Self {
        Self {
            persons,
            families,
            relations,
        }
    }

    /// Builds the tree and derives its relation set from family membership:
    /// a marriage for every full family, and a birth edge from each child to
    /// the father (or the mother when the father is unknown).
    pub fn with_derived_relations(
        persons: BTreeMap<GrampsId, Person>,
        families: BTreeMap<GrampsId, Family>,
    ) -> Result<Self, TreeError> {
        let mut relations = HashSet::new();
        for family in families.values() {
            for id in family.parents().chain(family.children.iter()) {
                if !persons.contains_key(id) {
                    return Err(TreeError::UnknownPerson { id: id.clone() });
                }
            }
            if let (Some(father), Some(mother)) = (&family.father, &family.mother) {
                relations.insert(Relation::new(
                    father.clone(),
                    RelationType::Marriage,
                    mother.clone(),
                    family.id.clone(),
                ));
            }
            if let Some(parent) = family.father.as_ref().or(family.mother.as_ref()) {
                for child in &family.children {
                    relations.insert(Relation::new(
                        child.clone(),
                        RelationType::BirthFrom,
                        parent.clone(),
                        family.id.clone(),
                    ));
                }
            }
        }
        Ok(Self::new(persons, families, relations))
    }

    pub fn persons(&self) -> &BTreeMap<GrampsId, Person> {
        &self.persons
    }

    pub fn families(&self) -> &BTreeMap<GrampsId, Family> {
        &self.families
    }

    pub fn relations(&self) -> &HashSet<Relation> {
        &self.relations
    }

    pub fn person(&self, id: &GrampsId) -> Result<&Person, TreeError> {
        self.persons
            .get(id)
            .ok_or_else(|| TreeError::UnknownPerson { id: id.clone() })
    }

    /// First family (by ID) listing `id` among its children.
    pub fn parental_family(&self, id: &GrampsId) -> Option<&Family> {
        self.families.values().find(|family| family.has_child(id))
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn person(id: &str, gender: Gender, birth: NaiveDate) -> Person {
        Person::new(id, id, Some(Date::exact(birth)), None, gender).unwrap()
    }

    #[test]
    fn person_requires_birthday() {
        let err = Person::new("I1", "Nobody", None, None, Gender::Male).unwrap_err();
        assert!(matches!(err, TreeError::PersonWithoutBirthday { id } if id.as_str() == "I1"));
    }

    #[test]
    fn death_before_birth_is_rejected() {
        let err = Person::new(
            "I1",
            "Ivan",
            Some(Date::exact(ymd(1950, 1, 1))),
            Some(Date::exact(ymd(1900, 1, 1))),
            Gender::Male,
        )
        .unwrap_err();
        assert!(matches!(err, TreeError::DeathBeforeBirth { id } if id.as_str() == "I1"));

        let same_day = Person::new(
            "I2",
            "Stillborn",
            Some(Date::exact(ymd(1950, 1, 1))),
            Some(Date::exact(ymd(1950, 1, 1))),
            Gender::Unknown,
        )
        .unwrap();
        assert_eq!(same_day.days_of_life(), 0);
    }

    #[test]
    fn unknown_death_defaults_to_estimated_century() {
        let p = person("I1", Gender::Female, ymd(1900, 1, 1));
        assert!(p.death.is_estimated());
        assert_eq!(p.days_of_life(), 36500);
        assert!(!p.birth.is_estimated());
    }

    #[test]
    fn days_of_life_and_mid_life() {
        let p = Person::new(
            "I1",
            "Ivan",
            Some(Date::exact(ymd(1950, 1, 1))),
            Some(Date::exact(ymd(1950, 1, 11))),
            Gender::Male,
        )
        .unwrap();
        assert_eq!(p.days_of_life(), 10);
        assert_eq!(p.mid_life(), ymd(1950, 1, 6));
    }

    #[test]
    fn label_marks_living_persons() {
        let p = person("I1", Gender::Male, ymd(1990, 5, 1));
        assert_eq!(p.label(ymd(2024, 1, 1), "now"), "I1 (1990-now)");
        let dead = Person::new(
            "I2",
            "Olga",
            Some(Date::exact(ymd(1900, 5, 1))),
            Some(Date::exact(ymd(1970, 2, 1))),
            Gender::Female,
        )
        .unwrap();
        assert_eq!(dead.label(ymd(2024, 1, 1), "now"), "Olga (1900-1970)");
    }

    #[test]
    fn estimated_date_is_prefixed() {
        let date = Date::estimated(ymd(1812, 9, 7));
        assert_eq!(date.to_string(), "≈ 07 September 1812");
        assert_eq!(Date::exact(ymd(1812, 9, 7)).to_string(), "07 September 1812");
    }

    #[test]
    fn persons_compare_by_id() {
        let a = person("I1", Gender::Male, ymd(1900, 1, 1));
        let mut b = person("I1", Gender::Female, ymd(1950, 1, 1));
        b.full_name = "Other".to_string();
        assert_eq!(a, b);
    }

    #[test]
    fn childless_wedding_follows_younger_parent() {
        let persons: BTreeMap<_, _> = [
            person("I1", Gender::Male, ymd(1950, 3, 1)),
            person("I2", Gender::Female, ymd(1952, 7, 15)),
        ]
        .into_iter()
        .map(|p| (p.id.clone(), p))
        .collect();
        let family = Family::new("F1").with_father("I1").with_mother("I2");
        let mut rng = StdRng::seed_from_u64(7);
        let wedding = family.wedding_day(&persons, &mut rng).unwrap();
        assert_eq!(wedding, ymd(1970, 7, 15));
    }

    #[test]
    fn wedding_precedes_oldest_child_and_is_cached() {
        let persons: BTreeMap<_, _> = [
            person("I1", Gender::Male, ymd(1950, 1, 1)),
            person("I2", Gender::Female, ymd(1952, 1, 1)),
            person("I3", Gender::Male, ymd(1975, 6, 1)),
            person("I4", Gender::Female, ymd(1980, 6, 1)),
        ]
        .into_iter()
        .map(|p| (p.id.clone(), p))
        .collect();
        let family = Family::new("F1")
            .with_father("I1")
            .with_mother("I2")
            .with_child("I3")
            .with_child("I4");
        let mut rng = StdRng::seed_from_u64(42);
        let first = family.wedding_day(&persons, &mut rng).unwrap();
        let latest = ymd(1975, 6, 1) - TimeDelta::weeks(40);
        let earliest = latest - TimeDelta::weeks(499);
        assert!(first <= latest && first >= earliest);

        let mut other_rng = StdRng::seed_from_u64(1);
        assert_eq!(family.wedding_day(&persons, &mut other_rng).unwrap(), first);
    }

    #[test]
    fn empty_family_has_no_wedding() {
        let family = Family::new("F9");
        let mut rng = StdRng::seed_from_u64(0);
        let err = family.wedding_day(&BTreeMap::new(), &mut rng).unwrap_err();
        assert!(matches!(err, TreeError::EmptyFamily { .. }));
    }

    #[test]
    fn relation_set_dedups_on_full_tuple() {
        let mut set = HashSet::new();
        set.insert(Relation::new("I1", RelationType::Marriage, "I2", "F1"));
        set.insert(Relation::new("I1", RelationType::Marriage, "I2", "F1"));
        set.insert(Relation::new("I3", RelationType::BirthFrom, "I1", "F1"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn derived_relations_follow_family_membership() {
        let persons: BTreeMap<_, _> = [
            person("I1", Gender::Male, ymd(1950, 1, 1)),
            person("I2", Gender::Female, ymd(1952, 1, 1)),
            person("I3", Gender::Male, ymd(1975, 1, 1)),
            person("I4", Gender::Female, ymd(1930, 1, 1)),
            person("I5", Gender::Male, ymd(1960, 1, 1)),
        ]
        .into_iter()
        .map(|p| (p.id.clone(), p))
        .collect();
        let families: BTreeMap<_, _> = [
            Family::new("F1")
                .with_father("I1")
                .with_mother("I2")
                .with_child("I3"),
            Family::new("F2").with_mother("I4").with_child("I5"),
        ]
        .into_iter()
        .map(|f| (f.id.clone(), f))
        .collect();
        let tree = GrampsTree::with_derived_relations(persons, families).unwrap();
        let relations = tree.relations();
        assert_eq!(relations.len(), 3);
        assert!(relations.contains(&Relation::new("I1", RelationType::Marriage, "I2", "F1")));
        assert!(relations.contains(&Relation::new("I3", RelationType::BirthFrom, "I1", "F1")));
        assert!(relations.contains(&Relation::new("I5", RelationType::BirthFrom, "I4", "F2")));
        assert_eq!(tree.parental_family(&"I5".into()).unwrap().id.as_str(), "F2");
    }

    #[test]
    fn dangling_family_member_is_rejected() {
        let families: BTreeMap<_, _> = [Family::new("F1").with_father("I404")]
            .into_iter()
            .map(|f| (f.id.clone(), f))
            .collect();
        let err = GrampsTree::with_derived_relations(BTreeMap::new(), families).unwrap_err();
        assert!(matches!(err, TreeError::UnknownPerson { .. }));
    }
}
