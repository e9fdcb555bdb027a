use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::error::TreeError;
use crate::ir::{Date, DateQuality, Family, Gender, GrampsId, GrampsTree, Person};

/// Gramps date object as exported in its JSON data:
/// `{"dateval": [day, month, year, slash], "quality": 0}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDate {
    pub dateval: Vec<serde_json::Value>,
    #[serde(default)]
    pub quality: u8,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersonFile {
    id: GrampsId,
    #[serde(default)]
    given_name: String,
    #[serde(default)]
    surname: String,
    #[serde(default = "unknown_gender")]
    gender: u8,
    birth: Option<RawDate>,
    death: Option<RawDate>,
    #[serde(default)]
    notes: Vec<GrampsId>,
    #[serde(default)]
    events: Vec<GrampsId>,
    #[serde(default)]
    media: Vec<GrampsId>,
}

fn unknown_gender() -> u8 {
    2
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FamilyFile {
    id: GrampsId,
    father: Option<GrampsId>,
    mother: Option<GrampsId>,
    #[serde(default)]
    children: Vec<GrampsId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TreeFile {
    #[serde(default)]
    persons: Vec<PersonFile>,
    #[serde(default)]
    families: Vec<FamilyFile>,
}

/// Normalizes a Gramps date: a zero day or month stands for "unknown" and is
/// pinned to 1.
pub fn parse_gramps_date(raw: &RawDate) -> Result<Date, TreeError> {
    debug!(?raw, "parsing date");
    let malformed = || TreeError::MalformedDate {
        raw: format!("{:?}", raw.dateval),
    };
    let [day, month, year, ..] = &raw.dateval[..] else {
        error!(?raw, "date value is too short");
        return Err(malformed());
    };
    let (Some(day), Some(month), Some(year)) = (day.as_i64(), month.as_i64(), year.as_i64())
    else {
        error!(?raw, "date value is not numeric");
        return Err(malformed());
    };
    let day = if day == 0 { 1 } else { day };
    let month = if month == 0 { 1 } else { month };
    let quality = match raw.quality {
        0 => DateQuality::Exact,
        // Gramps distinguishes "estimated" from "calculated"; both are inferred.
        1 | 2 => DateQuality::Estimated,
        value => return Err(TreeError::UnknownQuality { value }),
    };
    let date = i32::try_from(year)
        .ok()
        .zip(u32::try_from(month).ok())
        .zip(u32::try_from(day).ok())
        .and_then(|((year, month), day)| NaiveDate::from_ymd_opt(year, month, day));
    match date {
        Some(date) => Ok(Date { date, quality }),
        None => {
            error!(?raw, "invalid calendar date");
            Err(malformed())
        }
    }
}

/// Reads a tree export: persons with their lifetimes and families with their
/// members. Relations are derived from family membership.
pub fn parse_tree_json(input: &str) -> Result<GrampsTree, TreeError> {
    let file: TreeFile = serde_json::from_str(input)?;

    let mut persons = BTreeMap::new();
    for raw in file.persons {
        let birth = raw.birth.as_ref().map(parse_gramps_date).transpose()?;
        let death = raw.death.as_ref().map(parse_gramps_date).transpose()?;
        let full_name = format!("{} {}", raw.given_name, raw.surname);
        let mut person = Person::new(
            raw.id,
            full_name,
            birth,
            death,
            Gender::try_from(raw.gender)?,
        )?;
        raw.notes.into_iter().for_each(|id| person.add_note(id));
        raw.events.into_iter().for_each(|id| person.add_event(id));
        raw.media.into_iter().for_each(|id| person.add_media(id));
        persons.insert(person.id.clone(), person);
    }

    let mut families = BTreeMap::new();
    for raw in file.families {
        let mut family = Family::new(raw.id);
        family.father = raw.father;
        family.mother = raw.mother;
        raw.children.into_iter().for_each(|id| family.add_child(id));
        families.insert(family.id.clone(), family);
    }

    let tree = GrampsTree::with_derived_relations(persons, families)?;
    info!(
        persons = tree.persons().len(),
        families = tree.families().len(),
        relations = tree.relations().len(),
        "tree loaded"
    );
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(dateval: &[i64], quality: u8) -> RawDate {
        RawDate {
            dateval: dateval.iter().map(|v| serde_json::Value::from(*v)).collect(),
            quality,
        }
    }

    #[test]
    fn unknown_day_and_month_are_pinned() {
        let date = parse_gramps_date(&raw(&[0, 0, 1887, 0], 0)).unwrap();
        assert_eq!(date.date, NaiveDate::from_ymd_opt(1887, 1, 1).unwrap());
        assert_eq!(date.quality, DateQuality::Exact);
    }

    #[test]
    fn estimated_and_calculated_are_estimated() {
        assert!(parse_gramps_date(&raw(&[5, 3, 1900, 0], 1)).unwrap().is_estimated());
        assert!(parse_gramps_date(&raw(&[5, 3, 1900, 0], 2)).unwrap().is_estimated());
        assert!(matches!(
            parse_gramps_date(&raw(&[5, 3, 1900, 0], 7)),
            Err(TreeError::UnknownQuality { value: 7 })
        ));
    }

    #[test]
    fn impossible_date_is_malformed() {
        let err = parse_gramps_date(&raw(&[31, 2, 1901, 0], 0)).unwrap_err();
        assert!(matches!(err, TreeError::MalformedDate { .. }));
        let err = parse_gramps_date(&raw(&[1, 13, 1901, 0], 0)).unwrap_err();
        assert!(matches!(err, TreeError::MalformedDate { .. }));
        let err = parse_gramps_date(&raw(&[1, 1], 0)).unwrap_err();
        assert!(matches!(err, TreeError::MalformedDate { .. }));
    }

    #[test]
    fn parses_a_small_tree() {
        let input = r#"{
            "persons": [
                {"id": "I1", "givenName": "Pavel", "surname": "Orlov", "gender": 1,
                 "birth": {"dateval": [12, 4, 1950, false], "quality": 0}},
                {"id": "I2", "givenName": "Vera", "surname": "Orlova", "gender": 0,
                 "birth": {"dateval": [0, 0, 1952, false], "quality": 1},
                 "death": {"dateval": [3, 3, 2001, false], "quality": 0},
                 "notes": ["N1"]},
                {"id": "I3", "givenName": "Ilya", "surname": "Orlov", "gender": 1,
                 "birth": {"dateval": [1, 9, 1975, false], "quality": 0}}
            ],
            "families": [
                {"id": "F1", "father": "I1", "mother": "I2", "children": ["I3"]}
            ]
        }"#;
        let tree = parse_tree_json(input).unwrap();
        assert_eq!(tree.persons().len(), 3);
        assert_eq!(tree.relations().len(), 2);
        let vera = tree.person(&"I2".into()).unwrap();
        assert_eq!(vera.full_name, "Vera Orlova");
        assert!(vera.birth.is_estimated());
        assert!(!vera.death.is_estimated());
        assert!(vera.notes.contains("N1"));
    }

    #[test]
    fn person_without_birth_aborts_load() {
        let input = r#"{"persons": [{"id": "I1", "givenName": "X", "surname": "Y", "gender": 1}]}"#;
        assert!(matches!(
            parse_tree_json(input),
            Err(TreeError::PersonWithoutBirthday { .. })
        ));
    }

    #[test]
    fn death_before_birth_aborts_load() {
        let input = r#"{"persons": [{"id": "I1", "givenName": "X", "surname": "Y", "gender": 1,
            "birth": {"dateval": [1, 1, 1950, false], "quality": 0},
            "death": {"dateval": [1, 1, 1900, false], "quality": 0}}]}"#;
        assert!(matches!(
            parse_tree_json(input),
            Err(TreeError::DeathBeforeBirth { .. })
        ));
    }
}
