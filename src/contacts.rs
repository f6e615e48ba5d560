//! Pairwise contact detection and deduplication.
//!
//! Contacts are found per logger site by comparing only adjacent triggers
//! in time order. Repeated detections of the same pair at a site within the
//! window are then collapsed onto the most recently retained contact.

use chrono::Duration;
use tracing::{debug, info};

use crate::error::InvalidWindow;
use crate::models::{ContactEvent, ContactType, TriggerEvent};

pub const DEFAULT_WINDOW_MINUTES: f64 = 5.0;

/// Maximum gap between two triggers that still counts as one contact.
/// Comparisons against it are strict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactWindow(Duration);

impl ContactWindow {
    pub fn from_minutes(minutes: f64) -> Result<Self, InvalidWindow> {
        if !minutes.is_finite() || minutes <= 0.0 {
            return Err(InvalidWindow { minutes });
        }
        let millis = (minutes * 60_000.0).round() as i64;
        if millis == 0 {
            return Err(InvalidWindow { minutes });
        }
        Ok(Self(Duration::milliseconds(millis)))
    }

    pub fn duration(&self) -> Duration {
        self.0
    }

    fn contains(&self, gap: Duration) -> bool {
        gap < self.0
    }
}

impl Default for ContactWindow {
    fn default() -> Self {
        Self(Duration::minutes(DEFAULT_WINDOW_MINUTES as i64))
    }
}

/// Splits `items` into runs sharing a site key, in order of each site's
/// first appearance. Relative order within a site is kept.
fn partition_by_site<T, F>(items: Vec<T>, site: F) -> Vec<(String, Vec<T>)>
where
    F: Fn(&T) -> &str,
{
    let mut groups: Vec<(String, Vec<T>)> = Vec::new();
    for item in items {
        match groups.iter_mut().find(|(key, _)| key == site(&item)) {
            Some((_, members)) => members.push(item),
            None => groups.push((site(&item).to_string(), vec![item])),
        }
    }
    groups
}

pub fn detect_contacts(triggers: &[TriggerEvent], window: ContactWindow) -> Vec<ContactEvent> {
    let mut ordered = triggers.to_vec();
    ordered.sort_by(|a, b| {
        a.time
            .cmp(&b.time)
            .then_with(|| a.logger_position.cmp(&b.logger_position))
    });

    let mut candidates = Vec::new();

    for (site, events) in partition_by_site(ordered, |event| event.logger_position.as_str()) {
        let before = candidates.len();

        for pair in events.windows(2) {
            let (earlier, later) = (&pair[0], &pair[1]);
            if earlier.rodent.id == later.rodent.id {
                continue;
            }
            let gap = later.time - earlier.time;
            if !window.contains(gap) {
                continue;
            }

            candidates.push(ContactEvent {
                time: earlier.time,
                interval_minutes: gap.num_seconds().div_euclid(60),
                logger_position: site.clone(),
                rodent1: earlier.rodent.clone(),
                rodent2: later.rodent.clone(),
                contact_type: ContactType::between(&earlier.rodent, &later.rodent),
            });
        }

        debug!(
            site = %site,
            triggers = events.len(),
            candidates = candidates.len() - before,
            "site_scanned"
        );
    }

    info!(
        triggers = triggers.len(),
        candidates = candidates.len(),
        "contacts_detected"
    );
    candidates
}

/// Output is ordered by `(logger position, time)`.
pub fn deduplicate_contacts(contacts: &[ContactEvent], window: ContactWindow) -> Vec<ContactEvent> {
    let mut ordered = contacts.to_vec();
    ordered.sort_by(|a, b| {
        a.logger_position
            .cmp(&b.logger_position)
            .then_with(|| a.time.cmp(&b.time))
    });

    let mut retained: Vec<ContactEvent> = Vec::with_capacity(ordered.len());
    let mut site_start = 0;

    for event in ordered {
        if retained
            .last()
            .map_or(true, |last| last.logger_position != event.logger_position)
        {
            site_start = retained.len();
        }

        let duplicate = retained[site_start..].last().is_some_and(|kept| {
            window.contains(event.time - kept.time) && kept.same_pair(&event)
        });

        if !duplicate {
            retained.push(event);
        }
    }

    info!(
        candidates = contacts.len(),
        retained = retained.len(),
        "contacts_deduplicated"
    );
    retained
}
