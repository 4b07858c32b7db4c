//! Disease-cause hierarchy as served by `/api/diseases`, and an arena index
//! over it.
//!
//! The endpoint returns a forest of nested [`DiseaseNode`]s. Selection
//! cascades, breadcrumb paths and level-1 grouping all need parent and
//! subtree lookups by id, so the forest is flattened once into a
//! [`DiseaseTree`] whose slots keep the display order of the original.

use crate::error::HierarchyError;
use crate::selection::SelectionState;
use crate::{number_or_string, DiseaseId};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseNode {
    #[serde(deserialize_with = "number_or_string")]
    pub id: DiseaseId,
    pub name: String,
    /// ICD-style cause code, one character for level-1 causes.
    #[serde(default)]
    pub cause: String,
    #[serde(default)]
    pub subcauses: Vec<DiseaseNode>,
}

impl DiseaseNode {
    pub fn leaf(id: DiseaseId, name: &str, cause: &str) -> Self {
        DiseaseNode {
            id,
            name: name.to_string(),
            cause: cause.to_string(),
            subcauses: Vec::new(),
        }
    }

    pub fn with_subcauses(mut self, subcauses: Vec<DiseaseNode>) -> Self {
        self.subcauses = subcauses;
        self
    }
}

/// Payload of `/api/diseases`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiseaseHierarchy {
    #[serde(default)]
    pub causes: Vec<DiseaseNode>,
}

/// One flattened node of the hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct DiseaseInfo {
    pub id: DiseaseId,
    pub name: String,
    pub cause: String,
    pub parent: Option<DiseaseId>,
    pub depth: usize,
    children: Vec<usize>,
}

impl DiseaseInfo {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Tree label, e.g. `Neoplasms (C)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.cause)
    }
}

/// Arena over the disease forest, indexed by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiseaseTree {
    slots: Vec<DiseaseInfo>,
    index: HashMap<DiseaseId, usize>,
    roots: Vec<usize>,
}

impl DiseaseTree {
    /// Flatten `causes` in preorder. Ids must be unique across the forest.
    pub fn build(causes: &[DiseaseNode]) -> Result<Self, HierarchyError> {
        let mut tree = DiseaseTree::default();
        // (node, parent slot, depth); pushed in reverse so pops follow display order
        let mut stack: Vec<(&DiseaseNode, Option<usize>, usize)> =
            causes.iter().rev().map(|n| (n, None, 0)).collect();

        while let Some((node, parent, depth)) = stack.pop() {
            let slot = tree.slots.len();
            if tree.index.insert(node.id, slot).is_some() {
                return Err(HierarchyError::DuplicateId(node.id));
            }
            let parent_id = parent.map(|p| tree.slots[p].id);
            tree.slots.push(DiseaseInfo {
                id: node.id,
                name: node.name.clone(),
                cause: node.cause.clone(),
                parent: parent_id,
                depth,
                children: Vec::with_capacity(node.subcauses.len()),
            });
            match parent {
                Some(p) => tree.slots[p].children.push(slot),
                None => tree.roots.push(slot),
            }
            for child in node.subcauses.iter().rev() {
                stack.push((child, Some(slot), depth + 1));
            }
        }

        debug!(
            "Indexed {} diseases under {} root causes",
            tree.slots.len(),
            tree.roots.len()
        );
        Ok(tree)
    }

    pub fn from_hierarchy(hierarchy: &DiseaseHierarchy) -> Result<Self, HierarchyError> {
        Self::build(&hierarchy.causes)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, id: DiseaseId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn get(&self, id: DiseaseId) -> Option<&DiseaseInfo> {
        self.index.get(&id).map(|&slot| &self.slots[slot])
    }

    pub fn name_of(&self, id: DiseaseId) -> Option<&str> {
        self.get(id).map(|info| info.name.as_str())
    }

    pub fn roots(&self) -> impl Iterator<Item = &DiseaseInfo> {
        self.roots.iter().map(|&slot| &self.slots[slot])
    }

    /// Direct subcauses of `id` in display order.
    pub fn children(&self, id: DiseaseId) -> impl Iterator<Item = &DiseaseInfo> {
        let children: &[usize] = match self.index.get(&id) {
            Some(&slot) => &self.slots[slot].children,
            None => &[],
        };
        children.iter().map(|&slot| &self.slots[slot])
    }

    /// `id` followed by every descendant, preorder. Empty if `id` is unknown.
    pub fn subtree_ids(&self, id: DiseaseId) -> Vec<DiseaseId> {
        let Some(&start) = self.index.get(&id) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut stack = vec![start];
        while let Some(slot) = stack.pop() {
            out.push(self.slots[slot].id);
            stack.extend(self.slots[slot].children.iter().rev());
        }
        out
    }

    /// Top-level causes with a single character cause code.
    pub fn level1_roots(&self) -> impl Iterator<Item = &DiseaseInfo> {
        self.roots().filter(|info| info.cause.chars().count() == 1)
    }

    /// The level-1 cause `id` belongs to, if its root is one.
    pub fn level1_of(&self, id: DiseaseId) -> Option<&DiseaseInfo> {
        let root = self.path_to(id).into_iter().next()?;
        (root.cause.chars().count() == 1).then_some(root)
    }

    /// Ancestors of `id` from its root down to and including `id`.
    pub fn path_to(&self, id: DiseaseId) -> Vec<&DiseaseInfo> {
        let mut path = Vec::new();
        let mut current = self.get(id);
        while let Some(info) = current {
            path.push(info);
            current = info.parent.and_then(|p| self.get(p));
        }
        path.reverse();
        path
    }

    /// Checkbox state of every node for `selection`, in slot order.
    pub fn checked_states(&self, selection: &SelectionState) -> Vec<(DiseaseId, bool)> {
        self.slots
            .iter()
            .map(|info| (info.id, selection.has_disease(info.id)))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Two level-1 causes and one cause without a level-1 code.
    ///
    /// ```text
    /// 1 A
    /// ├── 10 A1
    /// │   ├── 100 A1a
    /// │   └── 101 A1b
    /// └── 11 A2
    /// 2 B
    /// └── 20 B1
    /// 3 XX
    /// ```
    pub(crate) fn sample_causes() -> Vec<DiseaseNode> {
        vec![
            DiseaseNode::leaf(1, "Communicable", "A").with_subcauses(vec![
                DiseaseNode::leaf(10, "Infections", "A01").with_subcauses(vec![
                    DiseaseNode::leaf(100, "Tuberculosis", "A01.1"),
                    DiseaseNode::leaf(101, "Malaria", "A01.2"),
                ]),
                DiseaseNode::leaf(11, "Maternal", "A02"),
            ]),
            DiseaseNode::leaf(2, "Neoplasms", "B")
                .with_subcauses(vec![DiseaseNode::leaf(20, "Lung cancer", "B01")]),
            DiseaseNode::leaf(3, "Other", "XX"),
        ]
    }

    pub(crate) fn sample_tree() -> DiseaseTree {
        DiseaseTree::build(&sample_causes()).unwrap()
    }

    #[test]
    fn build_indexes_every_node() {
        let tree = sample_tree();
        assert_eq!(tree.len(), 8);
        assert_eq!(tree.get(101).unwrap().parent, Some(10));
        assert_eq!(tree.get(101).unwrap().depth, 2);
        assert_eq!(tree.name_of(20), Some("Lung cancer"));
        assert!(!tree.contains(999));
    }

    #[test]
    fn children_keep_display_order() {
        let tree = sample_tree();
        let roots: Vec<_> = tree.roots().map(|i| i.id).collect();
        assert_eq!(roots, vec![1, 2, 3]);
        let kids: Vec<_> = tree.children(1).map(|i| i.id).collect();
        assert_eq!(kids, vec![10, 11]);
        assert_eq!(tree.children(999).count(), 0);
    }

    #[test]
    fn subtree_is_preorder() {
        let tree = sample_tree();
        assert_eq!(tree.subtree_ids(1), vec![1, 10, 100, 101, 11]);
        assert_eq!(tree.subtree_ids(100), vec![100]);
        assert!(tree.subtree_ids(999).is_empty());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let causes = vec![
            DiseaseNode::leaf(1, "A", "A").with_subcauses(vec![DiseaseNode::leaf(5, "x", "A1")]),
            DiseaseNode::leaf(5, "B", "B"),
        ];
        assert_eq!(
            DiseaseTree::build(&causes),
            Err(HierarchyError::DuplicateId(5))
        );
    }

    #[test]
    fn checked_states_follow_selection() {
        let tree = sample_tree();
        let selection = SelectionState::new().toggle_disease(&tree, 10, true);
        let checked: Vec<DiseaseId> = tree
            .checked_states(&selection)
            .into_iter()
            .filter_map(|(id, checked)| checked.then_some(id))
            .collect();
        assert_eq!(checked, vec![10, 100, 101]);
        assert_eq!(tree.checked_states(&selection).len(), tree.len());
    }

    #[test]
    fn level1_lookup_and_paths() {
        let tree = sample_tree();
        let level1: Vec<_> = tree.level1_roots().map(|i| i.id).collect();
        assert_eq!(level1, vec![1, 2]);
        assert_eq!(tree.level1_of(101).map(|i| i.id), Some(1));
        assert_eq!(tree.level1_of(3), None);

        let path: Vec<_> = tree.path_to(101).iter().map(|i| i.id).collect();
        assert_eq!(path, vec![1, 10, 101]);
        assert!(tree.path_to(999).is_empty());
    }

    #[test]
    fn hierarchy_parses_endpoint_payload() {
        let json = r#"{"causes": [
            {"id": "1", "name": "Communicable", "cause": "A",
             "subcauses": [{"id": 10, "name": "Infections", "cause": "A01"}]}
        ]}"#;
        let hierarchy: DiseaseHierarchy = serde_json::from_str(json).unwrap();
        let tree = DiseaseTree::from_hierarchy(&hierarchy).unwrap();
        assert_eq!(tree.subtree_ids(1), vec![1, 10]);
        assert_eq!(tree.get(1).unwrap().label(), "Communicable (A)");
    }
}
