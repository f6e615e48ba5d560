use std::collections::HashMap;
use std::fmt::Write;

use crate::models::{ContactEvent, ContactSummary, ContactType, PairSummary, SiteSummary};

pub fn summarize_by_site(contacts: &[ContactEvent]) -> Vec<SiteSummary> {
    let mut map: HashMap<&str, (usize, usize, i64)> = HashMap::new();

    for contact in contacts {
        let entry = map.entry(contact.logger_position.as_str()).or_insert((0, 0, 0));
        entry.0 += 1;
        if contact.contact_type == ContactType::WithinSpecies {
            entry.1 += 1;
        }
        entry.2 += contact.interval_minutes;
    }

    let mut summaries: Vec<SiteSummary> = map
        .into_iter()
        .map(|(site, (count, within, total_interval))| SiteSummary {
            logger_position: site.to_string(),
            contacts: count,
            within_species: within,
            between_species: count - within,
            mean_interval: if count == 0 {
                0.0
            } else {
                total_interval as f64 / count as f64
            },
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.contacts
            .cmp(&a.contacts)
            .then_with(|| a.logger_position.cmp(&b.logger_position))
    });
    summaries
}

/// Pairs are unordered; the lexically smaller ID is reported first.
pub fn summarize_by_pair(contacts: &[ContactEvent]) -> Vec<PairSummary> {
    let mut map: HashMap<(&str, &str), usize> = HashMap::new();

    for contact in contacts {
        let (a, b) = (contact.rodent1.id.as_str(), contact.rodent2.id.as_str());
        let key = if a <= b { (a, b) } else { (b, a) };
        *map.entry(key).or_insert(0) += 1;
    }

    let mut pairs: Vec<PairSummary> = map
        .into_iter()
        .map(|((rodent1, rodent2), count)| PairSummary {
            rodent1: rodent1.to_string(),
            rodent2: rodent2.to_string(),
            contacts: count,
        })
        .collect();

    pairs.sort_by(|a, b| {
        b.contacts
            .cmp(&a.contacts)
            .then_with(|| (&a.rodent1, &a.rodent2).cmp(&(&b.rodent1, &b.rodent2)))
    });
    pairs
}

pub fn summarize(contacts: &[ContactEvent], top_pairs: usize) -> ContactSummary {
    let within = contacts
        .iter()
        .filter(|c| c.contact_type == ContactType::WithinSpecies)
        .count();
    let mut pairs = summarize_by_pair(contacts);
    pairs.truncate(top_pairs);

    ContactSummary {
        total: contacts.len(),
        within_species: within,
        between_species: contacts.len() - within,
        first_contact: contacts.iter().map(|c| c.time).min(),
        last_contact: contacts.iter().map(|c| c.time).max(),
        sites: summarize_by_site(contacts),
        top_pairs: pairs,
    }
}

pub fn build_report(summary: &ContactSummary) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Rodent Contact Report");
    match (summary.first_contact, summary.last_contact) {
        (Some(first), Some(last)) => {
            let _ = writeln!(output, "Contacts from {first} to {last}");
        }
        _ => {
            let _ = writeln!(output, "No contacts recorded.");
        }
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "## Contact Mix");
    let _ = writeln!(output, "- Total: {}", summary.total);
    let _ = writeln!(output, "- {}: {}", ContactType::WithinSpecies, summary.within_species);
    let _ = writeln!(output, "- {}: {}", ContactType::BetweenSpecies, summary.between_species);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Sites");

    if summary.sites.is_empty() {
        let _ = writeln!(output, "No sites with contacts.");
    } else {
        for site in summary.sites.iter() {
            let _ = writeln!(
                output,
                "- {}: {} contacts ({} within, {} between), mean interval {:.1} min",
                site.logger_position,
                site.contacts,
                site.within_species,
                site.between_species,
                site.mean_interval
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Most Frequent Pairs");

    if summary.top_pairs.is_empty() {
        let _ = writeln!(output, "No pairs recorded.");
    } else {
        for pair in summary.top_pairs.iter() {
            let _ = writeln!(
                output,
                "- {} & {}: {} contacts",
                pair.rodent1, pair.rodent2, pair.contacts
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rodent;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 6, 14)
            .and_then(|d| d.and_hms_opt(h, m, 0))
            .unwrap()
    }

    fn contact(h: u32, site: &str, a: &str, b: &str, interval: i64, kind: ContactType) -> ContactEvent {
        let rodent = |id: &str| Rodent {
            id: id.to_string(),
            species: "Mus".to_string(),
            sex: "M".to_string(),
        };
        ContactEvent {
            time: at(h, 0),
            interval_minutes: interval,
            logger_position: site.to_string(),
            rodent1: rodent(a),
            rodent2: rodent(b),
            contact_type: kind,
        }
    }

    fn sample() -> Vec<ContactEvent> {
        vec![
            contact(9, "A1", "M1", "M2", 1, ContactType::WithinSpecies),
            contact(10, "A1", "M2", "M1", 3, ContactType::WithinSpecies),
            contact(11, "B2", "M3", "W1", 0, ContactType::BetweenSpecies),
        ]
    }

    #[test]
    fn sites_are_ranked_by_contact_count() {
        let sites = summarize_by_site(&sample());
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].logger_position, "A1");
        assert_eq!(sites[0].contacts, 2);
        assert!((sites[0].mean_interval - 2.0).abs() < 0.001);
        assert_eq!(sites[1].between_species, 1);
    }

    #[test]
    fn pairs_ignore_rodent_order() {
        let pairs = summarize_by_pair(&sample());
        assert_eq!(pairs[0].rodent1, "M1");
        assert_eq!(pairs[0].rodent2, "M2");
        assert_eq!(pairs[0].contacts, 2);
    }

    #[test]
    fn summary_covers_time_span_and_mix() {
        let summary = summarize(&sample(), 1);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.within_species, 2);
        assert_eq!(summary.first_contact, Some(at(9, 0)));
        assert_eq!(summary.last_contact, Some(at(11, 0)));
        assert_eq!(summary.top_pairs.len(), 1);
    }

    #[test]
    fn report_lists_sites_and_pairs() {
        let report = build_report(&summarize(&sample(), 5));
        assert!(report.contains("# Rodent Contact Report"));
        assert!(report.contains("- A1: 2 contacts (2 within, 0 between), mean interval 2.0 min"));
        assert!(report.contains("- M1 & M2: 2 contacts"));
    }

    #[test]
    fn empty_report_says_so() {
        let report = build_report(&summarize(&[], 5));
        assert!(report.contains("No contacts recorded."));
        assert!(report.contains("No sites with contacts."));
    }
}
