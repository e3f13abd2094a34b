// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hierarchy normalization.
//!
//! A [`Hierarchy`] is an arena of [`HierarchyNode`]s built from caller data. Nodes are stored in
//! pre-order, so a node's id is always smaller than the ids of its descendants and iterating the
//! arena front to back visits the tree in document order.
//!
//! Input records are copied into the arena; the caller's data is only ever borrowed.

extern crate alloc;

use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;

use hashbrown::HashMap;
use serde_json::Value;
use smallvec::SmallVec;

use crate::accessor::{Accessor, value_to_string};
use crate::error::HierarchyError;

/// Default key holding a record's children.
pub const CHILDREN_KEY: &str = "children";

/// Index of a node within a [`Hierarchy`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// The root node of every hierarchy.
    pub const ROOT: Self = Self(0);

    /// Returns the arena index of this node.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX))
    }
}

/// One element of the dataset tree.
#[derive(Clone, Debug, PartialEq)]
pub struct HierarchyNode {
    /// Owned copy of the source record (without its children list).
    pub data: Value,
    /// Parent node, `None` for the root.
    pub parent: Option<NodeId>,
    /// Children in input order.
    pub children: SmallVec<[NodeId; 4]>,
    /// Distance from the root (root is 0).
    pub depth: usize,
    /// Longest distance to a descendant leaf (leaves are 0).
    pub height: usize,
    /// Sum of leaf values in this subtree.
    pub value: f64,
}

impl HierarchyNode {
    /// Returns `true` if this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// A normalized, immutable tree with aggregated values.
#[derive(Clone, Debug, PartialEq)]
pub struct Hierarchy {
    nodes: Vec<HierarchyNode>,
}

impl Hierarchy {
    /// Builds a hierarchy from nested records using the `children` key.
    ///
    /// Leaf values are read with `value`; see [`Hierarchy::from_nested_with_children_key`].
    pub fn from_nested(root: &Value, value: &Accessor) -> Result<Self, HierarchyError> {
        Self::from_nested_with_children_key(root, value, CHILDREN_KEY)
    }

    /// Builds a hierarchy from nested records whose children live under `children_key`.
    ///
    /// Leaf values follow these rules:
    /// - a missing or `null` value counts as `0`,
    /// - numbers are used as-is and numeric strings are parsed,
    /// - anything else fails with [`HierarchyError::NonNumericValue`],
    /// - negative or non-finite values fail with [`HierarchyError::InvalidValue`].
    ///
    /// Branch values are always the sum of their children; a branch's own value field is ignored.
    pub fn from_nested_with_children_key(
        root: &Value,
        value: &Accessor,
        children_key: &str,
    ) -> Result<Self, HierarchyError> {
        let mut nodes: Vec<HierarchyNode> = Vec::new();
        let mut stack: Vec<(&Value, Option<NodeId>, usize)> = vec![(root, None, 0)];

        while let Some((record, parent, depth)) = stack.pop() {
            let Value::Object(map) = record else {
                return Err(HierarchyError::NotARecord { depth });
            };
            let children: &[Value] = match map.get(children_key) {
                None | Some(Value::Null) => &[],
                Some(Value::Array(items)) => items,
                Some(_) => return Err(HierarchyError::ChildrenNotAList { depth }),
            };

            let data: serde_json::Map<String, Value> = map
                .iter()
                .filter(|(k, _)| k.as_str() != children_key)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            let data = Value::Object(data);

            let leaf_value = if children.is_empty() {
                read_leaf_value(value, &data, depth)?
            } else {
                0.0
            };

            let id = NodeId::from_index(nodes.len());
            if let Some(parent) = parent {
                nodes[parent.index()].children.push(id);
            }
            nodes.push(HierarchyNode {
                data,
                parent,
                children: SmallVec::new(),
                depth,
                height: 0,
                value: leaf_value,
            });

            // Reversed so children pop (and get ids) in input order.
            for child in children.iter().rev() {
                stack.push((child, Some(id), depth + 1));
            }
        }

        let hierarchy = Self::aggregate(nodes)?;
        log::debug!(
            "normalized hierarchy: {} nodes, root value {}",
            hierarchy.node_count(),
            hierarchy.root().value
        );
        Ok(hierarchy)
    }

    /// Builds a hierarchy from a flat table of records linked by id / parent-id columns.
    ///
    /// Exactly one row must lack a parent id (missing, `null` or empty string). Children keep
    /// their row order. Rows whose parent chain never reaches the root form a cycle and fail
    /// with [`HierarchyError::Cycle`].
    pub fn stratify(
        rows: &[Value],
        id: &Accessor,
        parent_id: &Accessor,
        value: &Accessor,
    ) -> Result<Self, HierarchyError> {
        let mut index_by_id: HashMap<String, usize> = HashMap::new();
        let mut keys: Vec<Option<String>> = Vec::with_capacity(rows.len());
        for (row, record) in rows.iter().enumerate() {
            let key = id.get(record).as_ref().and_then(link_key);
            if let Some(key) = &key
                && index_by_id.insert(key.clone(), row).is_some()
            {
                return Err(HierarchyError::DuplicateId(key.clone()));
            }
            keys.push(key);
        }

        let mut root = None;
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); rows.len()];
        for (row, record) in rows.iter().enumerate() {
            match parent_id.get(record).as_ref().and_then(link_key) {
                None => {
                    if root.replace(row).is_some() {
                        return Err(HierarchyError::MultipleRoots);
                    }
                }
                Some(parent) => {
                    let Some(&p) = index_by_id.get(&parent) else {
                        return Err(HierarchyError::MissingParent(parent));
                    };
                    children[p].push(row);
                }
            }
        }
        let Some(root) = root else {
            return Err(HierarchyError::NoRoot);
        };

        let mut nodes: Vec<HierarchyNode> = Vec::with_capacity(rows.len());
        let mut visited = vec![false; rows.len()];
        let mut stack: Vec<(usize, Option<NodeId>, usize)> = vec![(root, None, 0)];
        while let Some((row, parent, depth)) = stack.pop() {
            visited[row] = true;
            let record = &rows[row];
            if !record.is_object() {
                return Err(HierarchyError::NotARecord { depth });
            }
            let leaf_value = if children[row].is_empty() {
                read_leaf_value(value, record, depth)?
            } else {
                0.0
            };
            let node_id = NodeId::from_index(nodes.len());
            if let Some(parent) = parent {
                nodes[parent.index()].children.push(node_id);
            }
            nodes.push(HierarchyNode {
                data: record.clone(),
                parent,
                children: SmallVec::new(),
                depth,
                height: 0,
                value: leaf_value,
            });
            for &child in children[row].iter().rev() {
                stack.push((child, Some(node_id), depth + 1));
            }
        }

        if let Some(row) = visited.iter().position(|seen| !seen) {
            let key = keys[row].clone().unwrap_or_else(|| row.to_string());
            return Err(HierarchyError::Cycle(key));
        }

        let hierarchy = Self::aggregate(nodes)?;
        log::debug!(
            "stratified hierarchy: {} rows, root value {}",
            hierarchy.node_count(),
            hierarchy.root().value
        );
        Ok(hierarchy)
    }

    /// Fills in branch values and heights. Relies on pre-order ids (children after parents).
    ///
    /// Fails with [`HierarchyError::InvalidValue`] when a branch sum overflows.
    fn aggregate(mut nodes: Vec<HierarchyNode>) -> Result<Self, HierarchyError> {
        for index in (1..nodes.len()).rev() {
            let (value, height) = (nodes[index].value, nodes[index].height);
            if let Some(parent) = nodes[index].parent {
                let parent = &mut nodes[parent.index()];
                parent.value += value;
                parent.height = parent.height.max(height + 1);
                if !parent.value.is_finite() {
                    return Err(HierarchyError::InvalidValue {
                        depth: parent.depth,
                        value: parent.value.to_string(),
                    });
                }
            }
        }
        Ok(Self { nodes })
    }

    /// Returns the root id.
    pub fn root_id(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Returns the root node.
    pub fn root(&self) -> &HierarchyNode {
        &self.nodes[0]
    }

    /// Returns a node by id.
    ///
    /// Panics if `id` does not belong to this hierarchy.
    pub fn node(&self, id: NodeId) -> &HierarchyNode {
        &self.nodes[id.index()]
    }

    /// Returns a node by id, if present.
    pub fn get(&self, id: NodeId) -> Option<&HierarchyNode> {
        self.nodes.get(id.index())
    }

    /// Number of nodes (always at least one).
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Children of `id` in input order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// All nodes in pre-order, root first.
    pub fn descendants(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId::from_index)
    }

    /// Leaf nodes in pre-order.
    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.descendants().filter(|&id| self.node(id).is_leaf())
    }

    /// `id` followed by each of its ancestors up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        core::iter::successors(Some(id), |&current| self.node(current).parent)
    }
}

fn link_key(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        other => Some(value_to_string(other)),
    }
}

fn read_leaf_value(value: &Accessor, data: &Value, depth: usize) -> Result<f64, HierarchyError> {
    let v = match value.get(data) {
        None | Some(Value::Null) => return Ok(0.0),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) if s.trim().is_empty() => 0.0,
        Some(Value::String(s)) => {
            s.trim()
                .parse::<f64>()
                .map_err(|_| HierarchyError::NonNumericValue {
                    depth,
                    found: Value::String(s.clone()).to_string(),
                })?
        }
        Some(other) => {
            return Err(HierarchyError::NonNumericValue {
                depth,
                found: other.to_string(),
            });
        }
    };
    if !v.is_finite() || v < 0.0 {
        return Err(HierarchyError::InvalidValue {
            depth,
            value: v.to_string(),
        });
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec::Vec;
    use serde_json::json;

    use super::*;

    fn sample() -> Value {
        json!({
            "name": "root",
            "children": [
                { "name": "A", "children": [
                    { "name": "a1", "value": 3 },
                    { "name": "a2", "value": "2" },
                ]},
                { "name": "B", "value": 5 },
                { "name": "C", "value": 100, "children": [
                    { "name": "c1" },
                    { "name": "c2", "value": 1.5 },
                ]},
            ]
        })
    }

    fn names(h: &Hierarchy, ids: impl Iterator<Item = NodeId>) -> Vec<String> {
        ids.map(|id| value_to_string(&h.node(id).data["name"]))
            .collect()
    }

    #[test]
    fn aggregates_leaf_values_only() {
        let h = Hierarchy::from_nested(&sample(), &Accessor::field("value")).unwrap();
        assert_eq!(h.root().value, 11.5);
        let leaf_sum: f64 = h.leaves().map(|id| h.node(id).value).sum();
        assert_eq!(leaf_sum, h.root().value);
        for id in h.descendants() {
            let node = h.node(id);
            if !node.is_leaf() {
                let child_sum: f64 = node.children.iter().map(|&c| h.node(c).value).sum();
                assert_eq!(node.value, child_sum, "branch value must be the sum of its children");
            }
        }
    }

    #[test]
    fn depth_height_and_preorder() {
        let h = Hierarchy::from_nested(&sample(), &Accessor::field("value")).unwrap();
        assert_eq!(
            names(&h, h.descendants()),
            ["root", "A", "a1", "a2", "B", "C", "c1", "c2"]
        );
        assert_eq!(names(&h, h.leaves()), ["a1", "a2", "B", "c1", "c2"]);
        assert_eq!(h.root().height, 2);
        assert_eq!(h.root().depth, 0);
        let a1 = h.descendants().nth(2).unwrap();
        assert_eq!(h.node(a1).depth, 2);
        assert_eq!(names(&h, h.ancestors(a1)), ["a1", "A", "root"]);
    }

    #[test]
    fn records_are_copied_without_children() {
        let input = sample();
        let before = input.clone();
        let h = Hierarchy::from_nested(&input, &Accessor::field("value")).unwrap();
        assert!(h.root().data.get("children").is_none());
        assert_eq!(input, before);
    }

    #[test]
    fn single_record_is_a_leaf_root() {
        let h = Hierarchy::from_nested(&json!({ "value": 4 }), &Accessor::field("value")).unwrap();
        assert_eq!(h.node_count(), 1);
        assert!(h.root().is_leaf());
        assert_eq!(h.root().value, 4.0);
    }

    #[test]
    fn rejects_non_numeric_and_negative_values() {
        let err = Hierarchy::from_nested(
            &json!({ "children": [{ "value": "abc" }] }),
            &Accessor::field("value"),
        )
        .unwrap_err();
        assert!(matches!(err, HierarchyError::NonNumericValue { depth: 1, .. }));

        let err = Hierarchy::from_nested(
            &json!({ "children": [{ "value": [1] }] }),
            &Accessor::field("value"),
        )
        .unwrap_err();
        assert!(matches!(err, HierarchyError::NonNumericValue { .. }));

        let err = Hierarchy::from_nested(
            &json!({ "children": [{ "value": -1 }] }),
            &Accessor::field("value"),
        )
        .unwrap_err();
        assert!(matches!(err, HierarchyError::InvalidValue { .. }));
    }

    #[test]
    fn rejects_overflowing_branch_sums() {
        let value = Accessor::field("value");
        let err = Hierarchy::from_nested(
            &json!({ "children": [{ "value": 1e308 }, { "value": 1e308 }] }),
            &value,
        )
        .unwrap_err();
        assert!(matches!(err, HierarchyError::InvalidValue { depth: 0, .. }));

        let err = Hierarchy::from_nested(
            &json!({ "children": [{ "children": [{ "value": 1e308 }, { "value": 1e308 }] }] }),
            &value,
        )
        .unwrap_err();
        assert!(matches!(err, HierarchyError::InvalidValue { depth: 1, .. }));

        let rows = [
            json!({ "id": "r" }),
            json!({ "id": "a", "parent": "r", "value": 1e308 }),
            json!({ "id": "b", "parent": "r", "value": 1e308 }),
        ];
        let err = Hierarchy::stratify(
            &rows,
            &Accessor::field("id"),
            &Accessor::field("parent"),
            &value,
        )
        .unwrap_err();
        assert!(matches!(err, HierarchyError::InvalidValue { depth: 0, .. }));
    }

    #[test]
    fn rejects_malformed_structure() {
        let value = Accessor::field("value");
        assert_eq!(
            Hierarchy::from_nested(&json!(3), &value).unwrap_err(),
            HierarchyError::NotARecord { depth: 0 }
        );
        assert_eq!(
            Hierarchy::from_nested(&json!({ "children": 3 }), &value).unwrap_err(),
            HierarchyError::ChildrenNotAList { depth: 0 }
        );
    }

    #[test]
    fn stratify_builds_tree_in_row_order() {
        let rows = [
            json!({ "id": "root" }),
            json!({ "id": "b", "parent": "root", "size": 2 }),
            json!({ "id": "a", "parent": "root" }),
            json!({ "id": "a1", "parent": "a", "size": 1 }),
        ];
        let h = Hierarchy::stratify(
            &rows,
            &Accessor::field("id"),
            &Accessor::field("parent"),
            &Accessor::field("size"),
        )
        .unwrap();
        let ids: Vec<String> = h
            .descendants()
            .map(|id| value_to_string(&h.node(id).data["id"]))
            .collect();
        assert_eq!(ids, ["root", "b", "a", "a1"]);
        assert_eq!(h.root().value, 3.0);
        assert_eq!(h.root().height, 2);
    }

    #[test]
    fn stratify_detects_cycles_and_bad_links() {
        let id = Accessor::field("id");
        let parent = Accessor::field("parent");
        let value = Accessor::field("v");

        let cyclic = [
            json!({ "id": "root" }),
            json!({ "id": "x", "parent": "y" }),
            json!({ "id": "y", "parent": "x" }),
        ];
        assert_eq!(
            Hierarchy::stratify(&cyclic, &id, &parent, &value).unwrap_err(),
            HierarchyError::Cycle(String::from("x"))
        );

        let orphan = [json!({ "id": "root" }), json!({ "id": "x", "parent": "nope" })];
        assert_eq!(
            Hierarchy::stratify(&orphan, &id, &parent, &value).unwrap_err(),
            HierarchyError::MissingParent(String::from("nope"))
        );

        let two_roots = [json!({ "id": "a" }), json!({ "id": "b", "parent": "" })];
        assert_eq!(
            Hierarchy::stratify(&two_roots, &id, &parent, &value).unwrap_err(),
            HierarchyError::MultipleRoots
        );

        let dup = [json!({ "id": "a" }), json!({ "id": "a", "parent": "a" })];
        assert_eq!(
            Hierarchy::stratify(&dup, &id, &parent, &value).unwrap_err(),
            HierarchyError::DuplicateId(String::from("a"))
        );

        let rootless = [json!({ "id": "a", "parent": "b" }), json!({ "id": "b", "parent": "a" })];
        assert_eq!(
            Hierarchy::stratify(&rootless, &id, &parent, &value).unwrap_err(),
            HierarchyError::NoRoot
        );
    }
}
