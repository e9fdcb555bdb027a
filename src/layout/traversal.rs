//! Walking the flat family/relation sets in chronological order.
//!
//! Every lookup answers `None` when there is nobody further in that
//! direction; that is a normal terminal condition, not a failure.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::ir::{Family, Gender, GrampsId, GrampsTree, Person, RelationType};

/// Persons of one tree that have not been placed yet.
///
/// Placement only records IDs; the tree itself stays untouched.
#[derive(Debug)]
pub struct UnplacedPool<'a> {
    tree: &'a GrampsTree,
    placed: HashSet<GrampsId>,
}

impl<'a> UnplacedPool<'a> {
    pub fn new(tree: &'a GrampsTree) -> Self {
        Self {
            tree,
            placed: HashSet::new(),
        }
    }

    pub fn tree(&self) -> &'a GrampsTree {
        self.tree
    }

    pub fn get(&self, id: &GrampsId) -> Option<&'a Person> {
        if self.placed.contains(id) {
            return None;
        }
        self.tree.persons().get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Person> + '_ {
        self.tree
            .persons()
            .values()
            .filter(|person| !self.placed.contains(&person.id))
    }

    /// Returns `false` if the person was already placed.
    pub fn place(&mut self, id: &GrampsId) -> bool {
        self.placed.insert(id.clone())
    }
}

// Equal birthdays favour the lower ID on both ends.
fn earliest_born<'a>(persons: impl Iterator<Item = &'a Person>) -> Option<&'a Person> {
    persons.min_by(|a, b| a.birth.date.cmp(&b.birth.date).then_with(|| a.id.cmp(&b.id)))
}

fn latest_born<'a>(persons: impl Iterator<Item = &'a Person>) -> Option<&'a Person> {
    persons.max_by(|a, b| a.birth.date.cmp(&b.birth.date).then_with(|| b.id.cmp(&a.id)))
}

pub fn oldest_of_gender<'a>(
    persons: impl Iterator<Item = &'a Person>,
    gender: Gender,
) -> Option<&'a Person> {
    earliest_born(persons.filter(|person| person.gender == gender))
}

/// Seed of a new row sequence: the oldest unplaced man, else the oldest
/// woman, else the oldest person of unknown gender.
pub fn find_patriarch<'a>(pool: &UnplacedPool<'a>) -> Option<&'a Person> {
    let patriarch = [Gender::Male, Gender::Female, Gender::Unknown]
        .into_iter()
        .find_map(|gender| oldest_of_gender(pool.iter(), gender));
    if let Some(patriarch) = patriarch {
        info!(id = %patriarch.id, name = %patriarch.full_name, "patriarch of a new kind found");
    }
    patriarch
}

/// Unplaced persons joined to `person` by a marriage relation.
pub fn partners_of<'a>(person: &Person, pool: &UnplacedPool<'a>) -> Vec<&'a Person> {
    pool.tree()
        .relations()
        .iter()
        .filter(|relation| relation.kind == RelationType::Marriage)
        .filter_map(|relation| {
            if relation.first == person.id {
                pool.get(&relation.other)
            } else if relation.other == person.id {
                pool.get(&relation.first)
            } else {
                None
            }
        })
        .collect()
}

/// The unplaced partner born last.
pub fn oldest_partner<'a>(person: &Person, pool: &UnplacedPool<'a>) -> Option<&'a Person> {
    latest_born(partners_of(person, pool).into_iter())
}

/// Family whose parent pair is exactly `person` and `partner`, with the man
/// in the father slot. A person of unknown gender may sit in either slot.
pub fn family_of<'a>(
    person: &Person,
    partner: &Person,
    families: impl IntoIterator<Item = &'a Family>,
) -> Option<&'a Family> {
    let as_father = |family: &Family| {
        family.father.as_ref() == Some(&person.id) && family.mother.as_ref() == Some(&partner.id)
    };
    let as_mother = |family: &Family| {
        family.father.as_ref() == Some(&partner.id) && family.mother.as_ref() == Some(&person.id)
    };
    families.into_iter().find(|family| match person.gender {
        Gender::Male => as_father(family),
        Gender::Female => as_mother(family),
        Gender::Unknown => as_father(family) || as_mother(family),
    })
}

/// Family shared with the partner returned by [`oldest_partner`].
pub fn oldest_family<'a>(person: &Person, pool: &UnplacedPool<'a>) -> Option<&'a Family> {
    let partner = oldest_partner(person, pool)?;
    family_of(person, partner, pool.tree().families().values())
}

/// Youngest unplaced child from the family with the most recent partner,
/// falling back to any unplaced child linked by a birth relation.
pub fn latest_child_by_last_partner<'a>(
    person: &Person,
    pool: &UnplacedPool<'a>,
) -> Option<&'a Person> {
    if let Some(family) = oldest_family(person, pool) {
        let child = latest_born(family.children.iter().filter_map(|id| pool.get(id)));
        if child.is_some() {
            return child;
        }
    }

    latest_born(
        pool.tree()
            .relations()
            .iter()
            .filter(|relation| {
                relation.kind == RelationType::BirthFrom && relation.other == person.id
            })
            .filter_map(|relation| pool.get(&relation.first)),
    )
}

/// Next person of the row sequence: the latest unplaced child, else the
/// oldest unplaced partner.
pub fn next_person<'a>(person: &Person, pool: &UnplacedPool<'a>) -> Option<&'a Person> {
    debug!(id = %person.id, "searching the next person");
    if let Some(child) = latest_child_by_last_partner(person, pool) {
        return Some(child);
    }
    if let Some(partner) = oldest_partner(person, pool) {
        return Some(partner);
    }
    info!(id = %person.id, "there are no more next people");
    None
}
