//! Location names from `/api/locations` and their mapping onto the map
//! topology, whose country names do not always match ours exactly.

use crate::LocationId;
use log::debug;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationIndex {
    names: BTreeMap<LocationId, String>,
}

impl LocationIndex {
    /// Build from the endpoint's `{ "id": "name" }` object.
    pub fn from_map(raw: HashMap<String, String>) -> Self {
        let names = raw
            .into_iter()
            .filter_map(|(key, name)| match key.trim().parse::<LocationId>() {
                Ok(id) => Some((id, name)),
                Err(_) => {
                    debug!("Skipping location with non-numeric id {:?}", key);
                    None
                }
            })
            .collect();
        LocationIndex { names }
    }

    pub fn name(&self, id: LocationId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Match a topology country name against our locations: either name may
    /// contain the other, ignoring case. The lowest matching id wins.
    pub fn match_country(&self, topology_name: &str) -> Option<LocationId> {
        let needle = topology_name.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.names
            .iter()
            .filter(|(_, name)| !name.trim().is_empty())
            .find(|(_, name)| {
                let name = name.to_lowercase();
                name.contains(&needle) || needle.contains(&name)
            })
            .map(|(id, _)| *id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> LocationIndex {
        LocationIndex::from_map(HashMap::from([
            ("6".to_string(), "China".to_string()),
            ("102".to_string(), "United States of America".to_string()),
            ("95".to_string(), "United Kingdom".to_string()),
            ("x".to_string(), "Nowhere".to_string()),
        ]))
    }

    #[test]
    fn non_numeric_ids_are_dropped() {
        let index = index();
        assert_eq!(index.len(), 3);
        assert_eq!(index.name(6), Some("China"));
    }

    #[test]
    fn matches_in_either_direction() {
        let index = index();
        assert_eq!(index.match_country("china"), Some(6));
        assert_eq!(index.match_country("United States of America"), Some(102));
        assert_eq!(index.match_country("People's Republic of China"), Some(6));
        assert_eq!(index.match_country("Atlantis"), None);
        assert_eq!(index.match_country(""), None);
    }

    #[test]
    fn lowest_id_wins_on_ambiguity() {
        // "United" is contained in both UK (95) and USA (102)
        assert_eq!(index().match_country("United"), Some(95));
    }
}
