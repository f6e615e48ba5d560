//! Logger-to-grid-cell lookup over a placement history.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::error::ResolveError;
use crate::models::LoggerPlacement;

/// How to choose among placement rows whose effective date is on or after
/// the detection day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementRule {
    /// First qualifying row in table order. Sensitive to row order.
    #[default]
    FirstInTable,
    /// Qualifying row with the smallest effective date; ties keep table order.
    EarliestQualifying,
}

impl PlacementRule {
    fn select<'a, I>(self, mut candidates: I) -> Option<&'a LoggerPlacement>
    where
        I: Iterator<Item = &'a LoggerPlacement>,
    {
        match self {
            PlacementRule::FirstInTable => candidates.next(),
            PlacementRule::EarliestQualifying => candidates.min_by_key(|row| row.effective),
        }
    }
}

pub struct PositionResolver {
    placements: Vec<LoggerPlacement>,
    rule: PlacementRule,
}

impl PositionResolver {
    pub fn new(placements: Vec<LoggerPlacement>, rule: PlacementRule) -> Self {
        Self { placements, rule }
    }

    pub fn resolve(&self, logger_id: &str, at: NaiveDateTime) -> Result<&str, ResolveError> {
        let logger_id = logger_id.trim();
        let day: NaiveDate = at.date();

        let candidates = self
            .placements
            .iter()
            .filter(|row| row.logger_id == logger_id && row.effective >= day);

        self.rule
            .select(candidates)
            .map(|row| row.grid_cell.as_str())
            .ok_or_else(|| ResolveError::NoPlacementFound {
                logger_id: logger_id.to_string(),
                date: day,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement(logger: &str, cell: &str, y: i32, m: u32, d: u32) -> LoggerPlacement {
        LoggerPlacement {
            logger_id: logger.to_string(),
            grid_cell: cell.to_string(),
            effective: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, 0, 0))
            .unwrap()
    }

    fn table() -> Vec<LoggerPlacement> {
        vec![
            placement("7", "B4", 2021, 6, 20),
            placement("7", "A1", 2021, 6, 10),
            placement("8", "C9", 2021, 6, 30),
            placement("7", "D2", 2021, 6, 1),
        ]
    }

    #[test]
    fn first_in_table_takes_first_qualifying_row() {
        let resolver = PositionResolver::new(table(), PlacementRule::FirstInTable);
        assert_eq!(resolver.resolve("7", at(2021, 6, 5, 12)).unwrap(), "B4");
    }

    #[test]
    fn earliest_qualifying_takes_nearest_date() {
        let resolver = PositionResolver::new(table(), PlacementRule::EarliestQualifying);
        assert_eq!(resolver.resolve("7", at(2021, 6, 5, 12)).unwrap(), "A1");
    }

    #[test]
    fn same_day_placement_qualifies_regardless_of_time() {
        let resolver = PositionResolver::new(table(), PlacementRule::EarliestQualifying);
        assert_eq!(resolver.resolve("7", at(2021, 6, 10, 23)).unwrap(), "A1");
        assert_eq!(resolver.resolve("7", at(2021, 6, 11, 0)).unwrap(), "B4");
    }

    #[test]
    fn other_loggers_are_ignored() {
        let resolver = PositionResolver::new(table(), PlacementRule::FirstInTable);
        assert_eq!(resolver.resolve(" 8 ", at(2021, 6, 21, 0)).unwrap(), "C9");
    }

    #[test]
    fn fails_when_every_placement_is_earlier() {
        let resolver = PositionResolver::new(table(), PlacementRule::FirstInTable);
        let err = resolver.resolve("7", at(2021, 7, 1, 0)).unwrap_err();
        assert_eq!(
            err,
            ResolveError::NoPlacementFound {
                logger_id: "7".to_string(),
                date: NaiveDate::from_ymd_opt(2021, 7, 1).unwrap(),
            }
        );
        assert!(resolver.resolve("99", at(2021, 6, 1, 0)).is_err());
    }
}
