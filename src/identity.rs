use std::collections::{HashMap, HashSet};

use crate::models::{AnimalRecord, Rodent};

/// Significant trailing characters of a tag; loggers may prefix more.
pub const TAG_KEY_LEN: usize = 6;

/// Every tag resolves to exactly one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagResolution {
    Animal(Rodent),
    Foreign,
    Unresolved { key: String },
}

/// Maps raw tag strings to animals.
///
/// Slots are searched across the whole table in slot order: any animal's
/// `Tag1` beats every `Tag2`, and within a slot the first row wins.
pub struct IdentityResolver {
    slots: [HashMap<String, usize>; 4],
    animals: Vec<Rodent>,
    foreign: HashSet<String>,
}

impl IdentityResolver {
    pub fn new<I, S>(records: &[AnimalRecord], foreign_tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut slots: [HashMap<String, usize>; 4] = Default::default();
        let mut animals = Vec::with_capacity(records.len());

        for (index, record) in records.iter().enumerate() {
            for (slot, tag) in slots.iter_mut().zip(record.tags.iter()) {
                if let Some(tag) = tag.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
                    slot.entry(tag.to_string()).or_insert(index);
                }
            }
            animals.push(Rodent {
                id: record.animal.clone(),
                species: record.species.clone(),
                sex: record.sex.clone(),
            });
        }

        let foreign = foreign_tags
            .into_iter()
            .map(|tag| tag.as_ref().trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect();

        Self {
            slots,
            animals,
            foreign,
        }
    }

    pub fn resolve(&self, raw_tag: &str) -> TagResolution {
        let key = tag_key(raw_tag);

        if let Some(&index) = self.slots.iter().find_map(|slot| slot.get(key)) {
            return TagResolution::Animal(self.animals[index].clone());
        }

        if self.foreign.contains(key) {
            TagResolution::Foreign
        } else {
            TagResolution::Unresolved {
                key: key.to_string(),
            }
        }
    }
}

/// Last [`TAG_KEY_LEN`] characters of the trimmed tag, or the whole tag if
/// shorter.
pub fn tag_key(raw_tag: &str) -> &str {
    let trimmed = raw_tag.trim();
    match trimmed.char_indices().rev().nth(TAG_KEY_LEN - 1) {
        Some((start, _)) => &trimmed[start..],
        None => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn animal(id: &str, species: &str, tags: [&str; 4]) -> AnimalRecord {
        AnimalRecord {
            animal: id.to_string(),
            species: species.to_string(),
            sex: "F".to_string(),
            tags: tags.map(|t| (!t.is_empty()).then(|| t.to_string())),
        }
    }

    #[test]
    fn key_is_last_six_characters() {
        assert_eq!(tag_key("0007A1B2C3"), "A1B2C3");
        assert_eq!(tag_key(" A1B2C3 "), "A1B2C3");
        assert_eq!(tag_key("B2C3"), "B2C3");
    }

    #[test]
    fn matches_any_slot_after_prefix_is_stripped() {
        let resolver = IdentityResolver::new(
            &[animal("M1", "Mus", ["111111", "", "", "444444"])],
            Vec::<String>::new(),
        );
        assert_eq!(
            resolver.resolve("99444444"),
            TagResolution::Animal(Rodent {
                id: "M1".to_string(),
                species: "Mus".to_string(),
                sex: "F".to_string(),
            })
        );
    }

    #[test]
    fn lower_slot_wins_across_the_whole_table() {
        let records = [
            animal("X", "Mus", ["aaaaaa", "abc123", "", ""]),
            animal("Y", "Apodemus", ["abc123", "", "", ""]),
        ];
        let resolver = IdentityResolver::new(&records, Vec::<String>::new());

        match resolver.resolve("abc123") {
            TagResolution::Animal(rodent) => assert_eq!(rodent.id, "Y"),
            other => panic!("unexpected resolution {other:?}"),
        }
    }

    #[test]
    fn first_row_wins_within_a_slot() {
        let records = [
            animal("A", "Mus", ["dup001", "", "", ""]),
            animal("B", "Mus", ["dup001", "", "", ""]),
        ];
        let resolver = IdentityResolver::new(&records, Vec::<String>::new());
        assert!(matches!(
            resolver.resolve("dup001"),
            TagResolution::Animal(r) if r.id == "A"
        ));
    }

    #[test]
    fn foreign_tags_are_a_skip_signal() {
        let resolver = IdentityResolver::new(
            &[animal("M1", "Mus", ["111111", "", "", ""])],
            ["F00001"],
        );
        assert_eq!(resolver.resolve("00F00001"), TagResolution::Foreign);
    }

    #[test]
    fn known_animal_beats_foreign_list() {
        let resolver = IdentityResolver::new(
            &[animal("M1", "Mus", ["111111", "", "", ""])],
            ["111111"],
        );
        assert!(matches!(resolver.resolve("111111"), TagResolution::Animal(_)));
    }

    #[test]
    fn unknown_tags_are_unresolved() {
        let resolver = IdentityResolver::new(&[], ["F00001"]);
        assert_eq!(
            resolver.resolve("77ZZZZZZ"),
            TagResolution::Unresolved {
                key: "ZZZZZZ".to_string()
            }
        );
    }
}
