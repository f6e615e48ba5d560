//! RFID logger processing for the Wytham grid.
//!
//! Raw logger detections are resolved into per-animal trigger events, and
//! trigger events at the same site are turned into deduplicated pairwise
//! contact events.
//!
//! - `dates`, `identity`, `placement` - resolving a single detection
//! - `triggers` - detections to trigger events
//! - `contacts` - trigger events to contact events
//! - `tables`, `config`, `report` - file formats, settings and summaries

pub mod config;
pub mod contacts;
pub mod dates;
pub mod error;
pub mod identity;
pub mod models;
pub mod placement;
pub mod report;
pub mod tables;
pub mod triggers;
