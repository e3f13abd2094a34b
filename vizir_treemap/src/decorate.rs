// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node decoration: turns tiled nodes into render-ready records.
//!
//! [`decorate`] resolves identity, path, fill and border colors and layout geometry for every
//! output node. [`apply_labels`] is a separate pass over the decorated list, so label settings can
//! change without recomputing colors or bounds.

extern crate alloc;

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use kurbo::Rect;
use peniko::Color;
use serde_json::Value;

use crate::accessor::{Getter, value_to_string};
use crate::color::{InheritedColorGenerator, OrdinalColorScale, to_hex};
use crate::hierarchy::NodeId;
use crate::label::LabelGenerator;
use crate::layout::TiledHierarchy;

/// A tiled node with its derived presentation fields.
#[derive(Clone, Debug, PartialEq)]
pub struct DecoratedNode {
    /// Source node in the hierarchy.
    pub node: NodeId,
    /// Parent node, `None` for the root.
    pub parent: Option<NodeId>,
    /// Copy of the source record with the resolved `id`, `value` and `color` written back.
    pub data: Value,
    /// Distance from the root.
    pub depth: usize,
    /// Height of the node in the tree; `0` for leaves.
    pub node_height: usize,
    /// Aggregated value.
    pub value: f64,
    /// Tiled bounds (`x0, y0, x1, y1`).
    pub bounds: Rect,
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width of the bounds.
    pub width: f64,
    /// Height of the bounds.
    pub height: f64,
    /// Identities from the root to this node, joined with `.`.
    pub path: String,
    /// Resolved identity.
    pub id: Option<Value>,
    /// Fill color.
    pub color: Option<Color>,
    /// Border color derived from the fill color.
    pub border_color: Option<Color>,
    /// Label text, only set by [`apply_labels`] on qualifying nodes.
    pub label: Option<String>,
    /// Label text color, set together with [`DecoratedNode::label`].
    pub label_text_color: Option<Color>,
}

/// Inputs of the decoration pass.
#[derive(Clone, Debug)]
pub struct DecorateOptions {
    /// Emit leaves only instead of every node.
    pub leaves_only: bool,
    /// Identity accessor.
    pub identity: Getter,
    /// Fill color scale, fed with the record plus its `depth`.
    pub color: Arc<OrdinalColorScale>,
    /// Border color generator.
    pub border_color: Arc<InheritedColorGenerator>,
}

/// Decorates the nodes of `tiled` in pre-order.
pub fn decorate(tiled: &TiledHierarchy, options: &DecorateOptions) -> Vec<DecoratedNode> {
    let hierarchy = tiled.hierarchy();

    // Pre-order guarantees a parent's path exists before its children need it.
    let mut ids: Vec<Option<Value>> = Vec::with_capacity(hierarchy.node_count());
    let mut paths: Vec<String> = Vec::with_capacity(hierarchy.node_count());
    for id in hierarchy.descendants() {
        let node = hierarchy.node(id);
        let identity = options.identity.get(&node.data);
        let segment = identity.as_ref().map(value_to_string).unwrap_or_default();
        let path = match node.parent {
            Some(parent) => {
                let mut path = paths[parent.index()].clone();
                path.push('.');
                path.push_str(&segment);
                path
            }
            None => segment,
        };
        ids.push(identity);
        paths.push(path);
    }

    let mut out = Vec::new();
    for id in hierarchy.descendants() {
        let node = hierarchy.node(id);
        if options.leaves_only && !node.is_leaf() {
            continue;
        }
        let mut datum = node.data.clone();
        if let Value::Object(map) = &mut datum {
            map.insert(String::from("depth"), Value::from(node.depth));
        }
        let color = options.color.color(&datum);

        let mut data = node.data.clone();
        if let Value::Object(map) = &mut data {
            if let Some(identity) = &ids[id.index()] {
                map.insert(String::from("id"), identity.clone());
            }
            map.insert(String::from("value"), Value::from(node.value));
            if let Some(c) = color {
                map.insert(String::from("color"), Value::String(to_hex(c)));
            }
        }
        let border_color = options.border_color.color(color, &data);

        let bounds = tiled.rect(id);
        out.push(DecoratedNode {
            node: id,
            parent: node.parent,
            data,
            depth: node.depth,
            node_height: node.height,
            value: node.value,
            bounds,
            x: bounds.x0,
            y: bounds.y0,
            width: bounds.width(),
            height: bounds.height(),
            path: paths[id.index()].clone(),
            id: ids[id.index()].clone(),
            color,
            border_color,
            label: None,
            label_text_color: None,
        });
    }
    out
}

/// Inputs of the label pass.
#[derive(Clone, Debug)]
pub struct LabelOptions {
    /// Label text generator.
    pub label: Arc<LabelGenerator>,
    /// Nodes whose smaller side is at most this size get no label; `0` disables the check.
    pub label_skip_size: f64,
    /// Label text color generator.
    pub label_text_color: Arc<InheritedColorGenerator>,
}

/// Returns `true` if `node` should not carry a label.
///
/// Branches never get labels, and neither do nodes too small for the skip size.
pub fn skips_label(node: &DecoratedNode, label_skip_size: f64) -> bool {
    node.node_height > 0
        || (label_skip_size != 0.0 && node.width.min(node.height) <= label_skip_size)
}

/// Returns a copy of `nodes` with labels and label colors set on qualifying nodes.
pub fn apply_labels(nodes: &[DecoratedNode], options: &LabelOptions) -> Vec<DecoratedNode> {
    nodes
        .iter()
        .map(|node| {
            let mut node = node.clone();
            if !skips_label(&node, options.label_skip_size) {
                node.label = options.label.label(&node.data);
                node.label_text_color = options.label_text_color.color(node.color, &node.data);
            }
            node
        })
        .collect()
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;
    use serde_json::json;

    use super::*;
    use crate::accessor::Accessor;
    use crate::color::{Colors, InheritedColor, Theme};
    use crate::hierarchy::Hierarchy;
    use crate::label::LabelFormat;
    use crate::layout::{Size, TreeMapLayout};

    fn options(identity: &str, leaves_only: bool) -> DecorateOptions {
        DecorateOptions {
            leaves_only,
            identity: Accessor::from(identity).resolve(),
            color: Arc::new(OrdinalColorScale::new(
                Colors::List(vec![Color::from_rgb8(100, 200, 50), Color::from_rgb8(0, 0, 255)]),
                Accessor::field("depth"),
            )),
            border_color: Arc::new(InheritedColorGenerator::new(
                InheritedColor::darker(1.0),
                Theme::default(),
            )),
        }
    }

    fn labels(skip: f64) -> LabelOptions {
        LabelOptions {
            label: Arc::new(LabelGenerator::new(Accessor::field("id"), LabelFormat::None)),
            label_skip_size: skip,
            label_text_color: Arc::new(InheritedColorGenerator::new(
                InheritedColor::darker(1.0),
                Theme::default(),
            )),
        }
    }

    fn tiled(data: &Value, width: f64, height: f64) -> TiledHierarchy {
        let h = Hierarchy::from_nested(data, &Accessor::field("value")).unwrap();
        TreeMapLayout::new(Size::new(width, height)).tile(Arc::new(h))
    }

    #[test]
    fn paths_join_ancestor_identities() {
        let data = json!({
            "name": "root",
            "children": [{ "name": "A", "children": [{ "name": "leaf", "value": 1 }] }]
        });
        let nodes = decorate(&tiled(&data, 100.0, 100.0), &options("name", false));
        let paths: Vec<&str> = nodes.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(paths, ["root", "root.A", "root.A.leaf"]);

        let leaves = decorate(&tiled(&data, 100.0, 100.0), &options("name", true));
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].path, "root.A.leaf");
        assert_eq!(leaves[0].node_height, 0);
    }

    #[test]
    fn data_copy_gets_resolved_fields() {
        let data = json!({ "id": "r", "children": [{ "id": "a", "value": 3, "extra": true }] });
        let nodes = decorate(&tiled(&data, 10.0, 10.0), &options("id", true));
        let leaf = &nodes[0];
        assert_eq!(leaf.data["id"], json!("a"));
        assert_eq!(leaf.data["value"], json!(3.0));
        // The only colored node takes the first palette entry.
        assert_eq!(leaf.data["color"], json!("#64c832"));
        assert_eq!(leaf.data["extra"], json!(true));
        assert!(leaf.data.get("depth").is_none());
        assert_eq!(leaf.border_color, Some(Color::from_rgb8(70, 140, 35)));
        assert_eq!((leaf.x, leaf.y, leaf.width, leaf.height), (0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn missing_identity_is_tolerated() {
        let data = json!({ "children": [{ "value": 1 }] });
        let nodes = decorate(&tiled(&data, 10.0, 10.0), &options("name", false));
        assert_eq!(nodes[0].id, None);
        assert_eq!(nodes[1].path, ".");
        assert!(nodes[1].data.get("id").is_none());
    }

    #[test]
    fn small_leaves_and_branches_skip_labels() {
        let data = json!({ "id": "root", "children": [{ "id": "leaf", "value": 1 }] });
        let nodes = decorate(&tiled(&data, 4.0, 4.0), &options("id", false));

        let skipped = apply_labels(&nodes, &labels(5.0));
        assert!(skipped.iter().all(|n| n.label.is_none()));

        let labeled = apply_labels(&nodes, &labels(0.0));
        assert_eq!(labeled[0].label, None);
        assert_eq!(labeled[1].label.as_deref(), Some("leaf"));
        assert!(labeled[1].label_text_color.is_some());
        assert_eq!(labeled[1].bounds, nodes[1].bounds);
        assert_eq!(labeled[1].color, nodes[1].color);
    }
}
