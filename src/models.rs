use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One detection kept from a raw logger file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagReading {
    pub date: String,
    pub logger_id: String,
    pub tag_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimalRecord {
    pub animal: String,
    pub species: String,
    pub sex: String,
    pub tags: [Option<String>; 4],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerPlacement {
    pub logger_id: String,
    pub grid_cell: String,
    pub effective: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Rodent {
    pub id: String,
    pub species: String,
    pub sex: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerEvent {
    pub time: NaiveDateTime,
    pub logger_position: String,
    pub rodent: Rodent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactType {
    #[serde(rename = "Within species", alias = "within-species")]
    WithinSpecies,
    #[serde(rename = "Between species", alias = "between-species")]
    BetweenSpecies,
}

impl ContactType {
    pub fn between(first: &Rodent, second: &Rodent) -> Self {
        if first.species == second.species {
            ContactType::WithinSpecies
        } else {
            ContactType::BetweenSpecies
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContactType::WithinSpecies => "Within species",
            ContactType::BetweenSpecies => "Between species",
        }
    }
}

impl fmt::Display for ContactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactEvent {
    pub time: NaiveDateTime,
    pub interval_minutes: i64,
    pub logger_position: String,
    pub rodent1: Rodent,
    pub rodent2: Rodent,
    pub contact_type: ContactType,
}

impl ContactEvent {
    /// True when both events involve the same two rodents, in either order.
    pub fn same_pair(&self, other: &ContactEvent) -> bool {
        let (a, b) = (&self.rodent1.id, &self.rodent2.id);
        let (c, d) = (&other.rodent1.id, &other.rodent2.id);
        (a == c && b == d) || (a == d && b == c)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SiteSummary {
    pub logger_position: String,
    pub contacts: usize,
    pub within_species: usize,
    pub between_species: usize,
    pub mean_interval: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PairSummary {
    pub rodent1: String,
    pub rodent2: String,
    pub contacts: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContactSummary {
    pub total: usize,
    pub within_species: usize,
    pub between_species: usize,
    pub first_contact: Option<NaiveDateTime>,
    pub last_contact: Option<NaiveDateTime>,
    pub sites: Vec<SiteSummary>,
    pub top_pairs: Vec<PairSummary>,
}
