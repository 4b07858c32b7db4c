//! Which diseases and sexes are active.
//!
//! The selection travels between pages in the `diseases` and `sexes` query
//! parameters and is the key material for every response cache. Both sets
//! remember insertion order so that a URL written by one page comes back
//! unchanged; cache keys sort before joining so order never matters there.

use crate::hierarchy::DiseaseTree;
use crate::{defaults, join_ids, DiseaseId, Sex};
use log::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState {
    diseases: Vec<DiseaseId>,
    sexes: Vec<Sex>,
}

impl Default for SelectionState {
    fn default() -> Self {
        SelectionState {
            diseases: Vec::new(),
            sexes: defaults::SEXES.to_vec(),
        }
    }
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a selection directly. An empty `sexes` falls back to both.
    pub fn from_parts(
        diseases: impl IntoIterator<Item = DiseaseId>,
        sexes: impl IntoIterator<Item = Sex>,
    ) -> Self {
        let mut state = SelectionState {
            diseases: Vec::new(),
            sexes: Vec::new(),
        };
        for id in diseases {
            insert_unique(&mut state.diseases, id);
        }
        for sex in sexes {
            insert_unique(&mut state.sexes, sex);
        }
        if state.sexes.is_empty() {
            state.sexes = defaults::SEXES.to_vec();
        }
        state
    }

    pub fn diseases(&self) -> &[DiseaseId] {
        &self.diseases
    }

    pub fn sexes(&self) -> &[Sex] {
        &self.sexes
    }

    pub fn has_disease(&self, id: DiseaseId) -> bool {
        self.diseases.contains(&id)
    }

    pub fn has_sex(&self, sex: Sex) -> bool {
        self.sexes.contains(&sex)
    }

    /// Nothing to fetch: the views show their "no data" state.
    pub fn is_empty(&self) -> bool {
        self.diseases.is_empty()
    }

    /// Read the `diseases` and `sexes` parameters of a query string.
    ///
    /// Tokens that are not plain integers are dropped. A `sexes` parameter
    /// replaces the default pair only if it names at least one valid code.
    pub fn from_query(query: &str) -> Self {
        let mut state = SelectionState::default();

        if let Some(raw) = query_param(query, "diseases") {
            for id in parse_tokens::<DiseaseId>(&raw) {
                insert_unique(&mut state.diseases, id);
            }
        }

        if let Some(raw) = query_param(query, "sexes") {
            let mut sexes = Vec::new();
            for code in parse_tokens::<u8>(&raw) {
                match Sex::from_code(code) {
                    Some(sex) => insert_unique(&mut sexes, sex),
                    None => debug!("Ignoring unknown sex code {}", code),
                }
            }
            if sexes.is_empty() {
                debug!("No usable sex codes in {:?}, keeping defaults", raw);
            } else {
                state.sexes = sexes;
            }
        }

        state
    }

    /// `diseases=..&sexes=..`, ids in insertion order.
    pub fn to_query(&self) -> String {
        format!(
            "diseases={}&sexes={}",
            join_ids(&self.diseases),
            join_ids(&self.sexes)
        )
    }

    /// Check or uncheck `id` together with its whole subtree.
    ///
    /// An id the tree does not know is treated as a leaf.
    pub fn toggle_disease(&self, tree: &DiseaseTree, id: DiseaseId, checked: bool) -> Self {
        let mut affected = tree.subtree_ids(id);
        if affected.is_empty() {
            warn!("Disease {} is not in the hierarchy, toggling it alone", id);
            affected.push(id);
        }

        let mut next = self.clone();
        if checked {
            for id in affected {
                insert_unique(&mut next.diseases, id);
            }
        } else {
            next.diseases.retain(|d| !affected.contains(d));
        }
        next
    }

    /// Replace the sex filter with exactly the checked boxes.
    ///
    /// Unchecking the last box reinstates both sexes.
    pub fn toggle_sex(&self, checked: &[Sex]) -> Self {
        let mut next = self.clone();
        next.sexes.clear();
        for &sex in checked {
            insert_unique(&mut next.sexes, sex);
        }
        if next.sexes.is_empty() {
            next.sexes = defaults::SEXES.to_vec();
        }
        next
    }

    /// Canonical cache key: `[scope|]sorted diseases|sorted sexes`.
    pub fn cache_key(&self, scope: Option<&str>) -> String {
        let mut diseases = self.diseases.clone();
        diseases.sort_unstable();
        let mut sexes = self.sexes.clone();
        sexes.sort_unstable();

        let key = format!("{}|{}", join_ids(&diseases), join_ids(&sexes));
        match scope {
            Some(scope) => format!("{}|{}", scope, key),
            None => key,
        }
    }
}

fn insert_unique<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if !items.contains(&item) {
        items.push(item);
    }
}

/// First value of `name` in a query string. Keys and values are decoded
/// the way browsers decode form data: `+` is a space, then percent escapes.
fn query_param(query: &str, name: &str) -> Option<String> {
    query
        .trim_start_matches('?')
        .split('&')
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .find(|(key, _)| form_decode(key) == name)
        .map(|(_, value)| form_decode(value))
}

fn form_decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes())).into_owned()
}

fn parse_tokens<T: std::str::FromStr>(raw: &str) -> impl Iterator<Item = T> + '_ {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(|token| token.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::tests::sample_tree;
    use rstest::rstest;

    fn sorted(ids: &[DiseaseId]) -> Vec<DiseaseId> {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn default_has_no_diseases_and_both_sexes() {
        let state = SelectionState::new();
        assert!(state.is_empty());
        assert_eq!(state.sexes(), &[Sex::Male, Sex::Female]);
    }

    #[rstest]
    #[case("?diseases=5,7&sexes=1", vec![5, 7], vec![Sex::Male])]
    #[case("?diseases=5,abc,7", vec![5, 7], vec![Sex::Male, Sex::Female])]
    #[case("", vec![], vec![Sex::Male, Sex::Female])]
    #[case("?sexes=2", vec![], vec![Sex::Female])]
    #[case("?diseases=&sexes=", vec![], vec![Sex::Male, Sex::Female])]
    #[case("?sexes=9,x", vec![], vec![Sex::Male, Sex::Female])]
    #[case("diseases=3%2C4,3,-1,2.5&sexes=2%2c1", vec![3, 4], vec![Sex::Female, Sex::Male])]
    #[case("?year=2019&diseases=8", vec![8], vec![Sex::Male, Sex::Female])]
    #[case("?diseases=5%2C%207&sexes=1+", vec![5, 7], vec![Sex::Male])]
    #[case("?diseases=5%2C+7%2c9&sexes=%32", vec![5, 7, 9], vec![Sex::Female])]
    #[case("?%64iseases=4", vec![4], vec![Sex::Male, Sex::Female])]
    fn parse_from_query(
        #[case] query: &str,
        #[case] diseases: Vec<DiseaseId>,
        #[case] sexes: Vec<Sex>,
    ) {
        let state = SelectionState::from_query(query);
        assert_eq!(state.diseases(), diseases.as_slice());
        assert_eq!(state.sexes(), sexes.as_slice());
    }

    #[test]
    fn query_round_trip_keeps_insertion_order() {
        let state = SelectionState::from_parts([7, 3, 5], [Sex::Female, Sex::Male]);
        assert_eq!(state.to_query(), "diseases=7,3,5&sexes=2,1");
        assert_eq!(SelectionState::from_query(&state.to_query()), state);
        assert_eq!(SelectionState::new().to_query(), "diseases=&sexes=1,2");
    }

    #[test]
    fn cache_key_ignores_insertion_order() {
        let a = SelectionState::from_parts([3, 1], [Sex::Female, Sex::Male]);
        let b = SelectionState::from_parts([1, 3], [Sex::Male, Sex::Female]);
        assert_eq!(a.cache_key(None), b.cache_key(None));
        assert_eq!(a.cache_key(None), "1,3|1,2");
        assert_eq!(a.cache_key(Some("102")), "102|1,3|1,2");
        assert_ne!(a.cache_key(Some("102")), a.cache_key(Some("103")));
    }

    #[test]
    fn cache_key_sorts_numerically() {
        let state = SelectionState::from_parts([10, 9], [Sex::Male]);
        assert_eq!(state.cache_key(None), "9,10|1");
    }

    #[rstest]
    #[case(1, vec![1, 10, 100, 101, 11])]
    #[case(10, vec![10, 100, 101])]
    #[case(2, vec![2, 20])]
    #[case(100, vec![100])]
    fn checking_selects_whole_subtree(#[case] id: DiseaseId, #[case] expected: Vec<DiseaseId>) {
        let tree = sample_tree();
        let state = SelectionState::new().toggle_disease(&tree, id, true);
        assert_eq!(sorted(state.diseases()), sorted(&expected));
    }

    #[test]
    fn unchecking_removes_exactly_the_subtree() {
        let tree = sample_tree();
        let state = SelectionState::new()
            .toggle_disease(&tree, 1, true)
            .toggle_disease(&tree, 2, true)
            .toggle_disease(&tree, 10, false);
        assert_eq!(sorted(state.diseases()), vec![1, 2, 11, 20]);
    }

    #[test]
    fn deselecting_one_child_leaves_parent_and_sibling() {
        let tree = sample_tree();
        let state = SelectionState::new()
            .toggle_disease(&tree, 10, true)
            .toggle_disease(&tree, 101, false);
        assert_eq!(sorted(state.diseases()), vec![10, 100]);
    }

    #[test]
    fn toggling_is_idempotent() {
        let tree = sample_tree();
        let once = SelectionState::new().toggle_disease(&tree, 1, true);
        let twice = once.toggle_disease(&tree, 1, true);
        assert_eq!(once, twice);

        let cleared = twice.toggle_disease(&tree, 1, false);
        assert_eq!(cleared.toggle_disease(&tree, 1, false), cleared);
        assert!(cleared.is_empty());
    }

    #[test]
    fn unknown_disease_toggles_alone() {
        let tree = sample_tree();
        let state = SelectionState::new().toggle_disease(&tree, 999, true);
        assert_eq!(state.diseases(), &[999]);
        assert!(state.toggle_disease(&tree, 999, false).is_empty());
    }

    #[rstest]
    #[case(vec![], vec![Sex::Male, Sex::Female])]
    #[case(vec![Sex::Female], vec![Sex::Female])]
    #[case(vec![Sex::Female, Sex::Male], vec![Sex::Female, Sex::Male])]
    #[case(vec![Sex::Male, Sex::Male], vec![Sex::Male])]
    fn sex_toggle_never_empties(#[case] checked: Vec<Sex>, #[case] expected: Vec<Sex>) {
        let state = SelectionState::from_parts([4], [Sex::Male]).toggle_sex(&checked);
        assert_eq!(state.sexes(), expected.as_slice());
        assert_eq!(state.diseases(), &[4]);
    }
}
