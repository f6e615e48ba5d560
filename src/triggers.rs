//! Turns raw tag readings into resolved trigger events.

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use crate::dates;
use crate::error::ResolveError;
use crate::identity::{IdentityResolver, TagResolution};
use crate::models::{TagReading, TriggerEvent};
use crate::placement::PositionResolver;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedReading {
    pub reading: TagReading,
    pub error: ResolveError,
}

#[derive(Debug, Default)]
pub struct TriggerOutcome {
    /// Sorted by time ascending.
    pub triggers: Vec<TriggerEvent>,
    pub foreign: usize,
    pub rejected: Vec<RejectedReading>,
}

pub struct TriggerBuilder<'a> {
    identities: &'a IdentityResolver,
    positions: &'a PositionResolver,
}

impl<'a> TriggerBuilder<'a> {
    pub fn new(identities: &'a IdentityResolver, positions: &'a PositionResolver) -> Self {
        Self {
            identities,
            positions,
        }
    }

    pub fn build(&self, readings: &[TagReading]) -> TriggerOutcome {
        let mut outcome = TriggerOutcome::default();
        let mut timed: Vec<(NaiveDateTime, &TagReading)> = Vec::with_capacity(readings.len());

        for reading in readings {
            match dates::parse_timestamp(&reading.date) {
                Ok(time) => timed.push((time, reading)),
                Err(error) => outcome.reject(reading, error),
            }
        }

        // Stable, so the first reading of each simultaneous batch keeps
        // its input position.
        timed.sort_by_key(|(time, _)| *time);

        for batch in timed.chunk_by(|a, b| a.0 == b.0) {
            let (time, reading) = batch[0];
            if batch.len() > 1 {
                debug!(time = %time, readings = batch.len(), "simultaneous_readings");
            }
            debug!(tag_id = %reading.tag_id, logger_id = %reading.logger_id, "processing_tag");

            let rodent = match self.identities.resolve(&reading.tag_id) {
                TagResolution::Animal(rodent) => rodent,
                TagResolution::Foreign => {
                    outcome.foreign += 1;
                    continue;
                }
                TagResolution::Unresolved { .. } => {
                    outcome.reject(
                        reading,
                        ResolveError::UnresolvedTag {
                            tag: reading.tag_id.clone(),
                        },
                    );
                    continue;
                }
            };

            match self.positions.resolve(&reading.logger_id, time) {
                Ok(cell) => outcome.triggers.push(TriggerEvent {
                    time,
                    logger_position: cell.to_string(),
                    rodent,
                }),
                Err(error) => outcome.reject(reading, error),
            }
        }

        outcome.triggers.sort_by_key(|event| event.time);
        outcome
    }
}

impl TriggerOutcome {
    fn reject(&mut self, reading: &TagReading, error: ResolveError) {
        warn!(
            tag_id = %reading.tag_id,
            logger_id = %reading.logger_id,
            date = %reading.date,
            error = %error,
            "reading_rejected"
        );
        self.rejected.push(RejectedReading {
            reading: reading.clone(),
            error,
        });
    }
}
