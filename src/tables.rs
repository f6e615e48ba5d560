use std::fs::{self, OpenOptions};
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::warn;
use walkdir::WalkDir;

use crate::dates;
use crate::models::{
    AnimalRecord, ContactEvent, ContactType, LoggerPlacement, Rodent, TagReading, TriggerEvent,
};

/// `motion_det` value marking a recognised chipped-animal trigger.
pub const CHIPPED_TRIGGER: i64 = 3;

/// Reads a raw logger file. The first line is a preamble; the header row
/// follows. Only chipped-animal triggers are returned; rows that do not
/// deserialize are skipped with a warning.
pub fn read_logger_file(path: &Path) -> anyhow::Result<Vec<TagReading>> {
    #[derive(Deserialize)]
    struct RawRow {
        #[serde(alias = "datetime")]
        date: String,
        #[serde(rename = "LoggerID", alias = "LOGGER_ID")]
        logger_id: String,
        #[serde(rename = "TagID", alias = "Tag_ID")]
        tag_id: String,
        #[serde(default, deserialize_with = "csv::invalid_option")]
        motion_det: Option<i64>,
    }

    let mut raw = String::new();
    fs::File::open(path)
        .with_context(|| format!("failed to open logger file {}", path.display()))?
        .read_to_string(&mut raw)?;
    let body = raw.split_once('\n').map_or("", |(_, rest)| rest);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let mut readings = Vec::new();
    for result in reader.deserialize::<RawRow>() {
        let row = match result {
            Ok(row) => row,
            Err(error) => {
                warn!(file = %path.display(), error = %error, "logger_row_skipped");
                continue;
            }
        };
        if row.motion_det == Some(CHIPPED_TRIGGER) {
            readings.push(TagReading {
                date: row.date,
                logger_id: row.logger_id,
                tag_id: row.tag_id,
            });
        }
    }

    Ok(readings)
}

pub fn read_animals(path: &Path) -> anyhow::Result<Vec<AnimalRecord>> {
    #[derive(Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct AnimalRow {
        animal: String,
        species: String,
        sex: String,
        #[serde(default)]
        tag1: Option<String>,
        #[serde(default)]
        tag2: Option<String>,
        #[serde(default)]
        tag3: Option<String>,
        #[serde(default)]
        tag4: Option<String>,
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open animal table {}", path.display()))?;

    let mut records = Vec::new();
    for result in reader.deserialize::<AnimalRow>() {
        let row = result?;
        records.push(AnimalRecord {
            animal: row.animal,
            species: row.species,
            sex: row.sex,
            tags: [row.tag1, row.tag2, row.tag3, row.tag4]
                .map(|tag| tag.filter(|t| !t.is_empty())),
        });
    }

    Ok(records)
}

/// Rows with unparseable dates are skipped with a warning.
pub fn read_placements(path: &Path) -> anyhow::Result<Vec<LoggerPlacement>> {
    #[derive(Deserialize)]
    struct PlacementRow {
        #[serde(rename = "Logger_ID")]
        logger_id: String,
        #[serde(rename = "Date")]
        date: String,
        #[serde(rename = "Grid_Cell")]
        grid_cell: String,
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open placement table {}", path.display()))?;

    let mut placements = Vec::new();
    for result in reader.deserialize::<PlacementRow>() {
        let row = result?;
        match dates::parse_date(&row.date) {
            Ok(effective) => placements.push(LoggerPlacement {
                logger_id: row.logger_id,
                grid_cell: row.grid_cell,
                effective,
            }),
            Err(error) => warn!(logger_id = %row.logger_id, error = %error, "placement_skipped"),
        }
    }

    Ok(placements)
}

/// Reads a headerless list of values separated by commas and/or newlines.
/// Used for both the foreign-tag list and the logger-number list.
pub fn read_value_list(path: &Path) -> anyhow::Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open list {}", path.display()))?;

    let mut values = Vec::new();
    for result in reader.records() {
        let record = result?;
        values.extend(record.iter().filter(|v| !v.is_empty()).map(str::to_string));
    }

    Ok(values)
}

/// Finds every `*-DATA-<n>.txt` file under `<logger_dir>/<n>/`, sorted by
/// path.
pub fn discover_logger_files(logger_dir: &Path, logger_number: &str) -> Vec<PathBuf> {
    let suffix = format!("-DATA-{logger_number}.txt");
    let mut files: Vec<PathBuf> = WalkDir::new(logger_dir.join(logger_number))
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.ends_with(&suffix) && name.len() > suffix.len())
        })
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

#[derive(Debug, Serialize, Deserialize)]
struct TriggerRow {
    #[serde(rename = "Time")]
    time: String,
    #[serde(rename = "LoggerPosition")]
    logger_position: String,
    #[serde(rename = "RodentID")]
    rodent_id: String,
    #[serde(rename = "RodentSpecies")]
    rodent_species: String,
    #[serde(rename = "RodentSex")]
    rodent_sex: String,
}

/// Appends triggers, writing the header only when the file is new or empty.
pub fn append_triggers(path: &Path, triggers: &[TriggerEvent]) -> anyhow::Result<()> {
    ensure_parent(path)?;
    let needs_header = fs::metadata(path).map_or(true, |meta| meta.len() == 0);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open trigger table {}", path.display()))?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);

    for trigger in triggers {
        writer.serialize(TriggerRow {
            time: dates::format_timestamp(&trigger.time),
            logger_position: trigger.logger_position.clone(),
            rodent_id: trigger.rodent.id.clone(),
            rodent_species: trigger.rodent.species.clone(),
            rodent_sex: trigger.rodent.sex.clone(),
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Rows with a malformed `Time` are skipped with a warning.
pub fn read_triggers(path: &Path) -> anyhow::Result<Vec<TriggerEvent>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open trigger table {}", path.display()))?;

    let mut triggers = Vec::new();
    for result in reader.deserialize::<TriggerRow>() {
        let row = match result {
            Ok(row) => row,
            Err(error) => {
                warn!(file = %path.display(), error = %error, "trigger_skipped");
                continue;
            }
        };
        let time = match dates::parse_timestamp(&row.time) {
            Ok(time) => time,
            Err(error) => {
                warn!(rodent_id = %row.rodent_id, error = %error, "trigger_skipped");
                continue;
            }
        };
        triggers.push(TriggerEvent {
            time,
            logger_position: row.logger_position,
            rodent: Rodent {
                id: row.rodent_id,
                species: row.rodent_species,
                sex: row.rodent_sex,
            },
        });
    }

    Ok(triggers)
}

#[derive(Debug, Serialize, Deserialize)]
struct ContactRow {
    #[serde(rename = "Time")]
    time: String,
    #[serde(rename = "Interval(min)")]
    interval: i64,
    #[serde(rename = "LoggerPosition")]
    logger_position: String,
    #[serde(rename = "Rodent1ID")]
    rodent1_id: String,
    #[serde(rename = "Rodent1Species")]
    rodent1_species: String,
    #[serde(rename = "Rodent1Sex")]
    rodent1_sex: String,
    #[serde(rename = "Rodent2ID")]
    rodent2_id: String,
    #[serde(rename = "Rodent2Species")]
    rodent2_species: String,
    #[serde(rename = "Rodent2Sex")]
    rodent2_sex: String,
    #[serde(rename = "ContactType")]
    contact_type: ContactType,
}

pub fn write_contacts(path: &Path, contacts: &[ContactEvent]) -> anyhow::Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create contact table {}", path.display()))?;

    for contact in contacts {
        writer.serialize(ContactRow {
            time: dates::format_timestamp(&contact.time),
            interval: contact.interval_minutes,
            logger_position: contact.logger_position.clone(),
            rodent1_id: contact.rodent1.id.clone(),
            rodent1_species: contact.rodent1.species.clone(),
            rodent1_sex: contact.rodent1.sex.clone(),
            rodent2_id: contact.rodent2.id.clone(),
            rodent2_species: contact.rodent2.species.clone(),
            rodent2_sex: contact.rodent2.sex.clone(),
            contact_type: contact.contact_type,
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_contacts(path: &Path) -> anyhow::Result<Vec<ContactEvent>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open contact table {}", path.display()))?;

    let mut contacts = Vec::new();
    for result in reader.deserialize::<ContactRow>() {
        let row = result?;
        let time = dates::parse_timestamp(&row.time)
            .with_context(|| format!("bad contact time in {}", path.display()))?;
        contacts.push(ContactEvent {
            time,
            interval_minutes: row.interval,
            logger_position: row.logger_position,
            rodent1: Rodent {
                id: row.rodent1_id,
                species: row.rodent1_species,
                sex: row.rodent1_sex,
            },
            rodent2: Rodent {
                id: row.rodent2_id,
                species: row.rodent2_species,
                sex: row.rodent2_sex,
            },
            contact_type: row.contact_type,
        });
    }

    Ok(contacts)
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    Ok(())
}
