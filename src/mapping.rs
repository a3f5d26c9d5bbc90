//! Key mapping table
//!
//! Resolves key indices to their configured mapping and groups mappings by
//! function. Groups are built once at load since every switcher event fans
//! out over exactly one group.

use std::collections::HashMap;
use tracing::debug;

use crate::config::{KeyFunction, KeyMapping};

/// Mapping lookup table
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    /// Effective mappings, in configuration order
    mappings: Vec<KeyMapping>,

    /// Index into `mappings` by key
    by_key: HashMap<u16, usize>,

    /// Indices into `mappings` by function
    groups: HashMap<KeyFunction, Vec<usize>>,
}

impl MappingTable {
    /// Build the table. For duplicated keys the last mapping wins.
    pub fn new(keys: &[KeyMapping]) -> Self {
        let mut winners: HashMap<u16, usize> = HashMap::new();
        for (idx, mapping) in keys.iter().enumerate() {
            winners.insert(mapping.key, idx);
        }

        let mut table = Self::default();
        for (idx, mapping) in keys.iter().enumerate() {
            if winners.get(&mapping.key) != Some(&idx) {
                continue;
            }

            let slot = table.mappings.len();
            table.by_key.insert(mapping.key, slot);
            table.groups.entry(mapping.function).or_default().push(slot);
            table.mappings.push(mapping.clone());
        }

        debug!(
            "Mapping table built: {} keys in {} groups",
            table.mappings.len(),
            table.groups.len()
        );

        table
    }

    pub fn lookup(&self, key: u16) -> Option<&KeyMapping> {
        self.by_key.get(&key).map(|&slot| &self.mappings[slot])
    }

    /// Every mapping bound to a function, in configuration order
    pub fn by_function(&self, function: KeyFunction) -> impl Iterator<Item = &KeyMapping> + '_ {
        self.groups
            .get(&function)
            .into_iter()
            .flatten()
            .map(move |&slot| &self.mappings[slot])
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyMapping> + '_ {
        self.mappings.iter()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}
