//! Weighted adapter lists passed through alongside the prompt.
//!
//! Hosts submit adapters as flat `lora_{i}_name` / `lora_{i}_strength`
//! fields. This module turns them into an ordered, variable-length list.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Name hosts use for an unset adapter slot.
pub const NO_ADAPTER: &str = "None";

const DEFAULT_STRENGTH: f32 = 1.0;

/// One adapter and the strength it should be applied with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterEntry {
    pub name: String,
    pub strength: f32,
}

/// Adapters in slot order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AdapterList {
    pub entries: Vec<AdapterEntry>,
}

/// Split `lora_{i}_{suffix}` into its slot index and suffix.
fn parse_slot_key(key: &str) -> Option<(u32, &str)> {
    let rest = key.strip_prefix("lora_")?;
    let (index, suffix) = rest.split_once('_')?;
    let index = index.parse().ok()?;
    Some((index, suffix))
}

impl AdapterList {
    /// Collect adapters from host fields.
    ///
    /// A slot exists when its `_name` key is present. Missing strengths
    /// default to 1.0, as do unparseable ones.
    pub fn from_fields(fields: &BTreeMap<String, String>) -> AdapterList {
        let mut slots: BTreeMap<u32, &str> = BTreeMap::new();
        for (key, value) in fields {
            if let Some((index, "name")) = parse_slot_key(key) {
                slots.insert(index, value.as_str());
            }
        }

        let entries = slots
            .into_iter()
            .map(|(index, name)| {
                let strength_key = format!("lora_{index}_strength");
                let strength = match fields.get(&strength_key) {
                    Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                        debug!(key = %strength_key, value = %raw, "invalid adapter strength");
                        DEFAULT_STRENGTH
                    }),
                    None => DEFAULT_STRENGTH,
                };
                AdapterEntry {
                    name: name.to_string(),
                    strength,
                }
            })
            .collect();

        AdapterList { entries }
    }

    /// Entries with a real adapter selected.
    pub fn active(&self) -> impl Iterator<Item = &AdapterEntry> {
        self.entries.iter().filter(|e| e.name != NO_ADAPTER)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn slots_sorted_numerically() {
        let list = AdapterList::from_fields(&fields(&[
            ("lora_10_name", "ink.safetensors"),
            ("lora_10_strength", "0.4"),
            ("lora_2_name", "film.safetensors"),
            ("lora_2_strength", "0.8"),
        ]));
        let names: Vec<&str> = list.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["film.safetensors", "ink.safetensors"]);
        assert_eq!(list.entries[0].strength, 0.8);
        assert_eq!(list.entries[1].strength, 0.4);
    }

    #[test]
    fn missing_or_bad_strength_defaults() {
        let list = AdapterList::from_fields(&fields(&[
            ("lora_1_name", "a"),
            ("lora_2_name", "b"),
            ("lora_2_strength", "strong"),
        ]));
        assert_eq!(list.entries[0].strength, 1.0);
        assert_eq!(list.entries[1].strength, 1.0);
    }

    #[test]
    fn unrelated_keys_ignored() {
        let list = AdapterList::from_fields(&fields(&[
            ("lighting", "random"),
            ("lora_x_name", "bad index"),
            ("lora_3_strength", "0.5"),
        ]));
        assert!(list.is_empty());
    }

    #[test]
    fn active_skips_unset_slots() {
        let list = AdapterList::from_fields(&fields(&[
            ("lora_1_name", "None"),
            ("lora_2_name", "detail.safetensors"),
        ]));
        assert_eq!(list.len(), 2);
        let active: Vec<&str> = list.active().map(|e| e.name.as_str()).collect();
        assert_eq!(active, vec!["detail.safetensors"]);
    }
}
