// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

extern crate std;

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use kurbo::Rect;
use serde_json::{Value, json};

use crate::{
    FillDef, FillRule, HierarchyError, LabelFormat, Margin, Renderer, TileMethod, TreeMap,
    TreeMapProps,
};

fn two_leaves() -> Arc<Value> {
    Arc::new(json!({
        "id": "root",
        "children": [
            { "id": "a", "value": 2 },
            { "id": "b", "value": 1 },
        ]
    }))
}

fn nested() -> Arc<Value> {
    Arc::new(json!({
        "id": "root",
        "children": [
            { "id": "x", "children": [
                { "id": "x1", "value": 7 },
                { "id": "x2", "value": 3 },
                { "id": "x3", "value": 0 },
            ] },
            { "id": "y", "children": [
                { "id": "y1", "value": 4 },
                { "id": "y2", "children": [{ "id": "y21", "value": 2.5 }, { "id": "y22", "value": "1.5" }] },
            ] },
            { "id": "z", "value": 6 },
        ]
    }))
}

fn generation(treemap: &TreeMap, stage: &str) -> u64 {
    treemap
        .generations()
        .iter()
        .find(|(name, _)| *name == stage)
        .map(|&(_, g)| g)
        .unwrap()
}

fn overlap_area(a: Rect, b: Rect) -> f64 {
    let i = a.intersect(b);
    if i.width() > 0.0 && i.height() > 0.0 {
        i.area()
    } else {
        0.0
    }
}

#[test]
fn two_leaves_split_two_to_one() {
    let props = TreeMapProps::new(two_leaves())
        .with_size(300.0, 200.0)
        .with_leaves_only(true);
    let out = TreeMap::new(Renderer::Canvas).update(&props).unwrap();
    assert_eq!(out.nodes.len(), 2);
    let (a, b) = (&out.nodes[0], &out.nodes[1]);
    assert_eq!(overlap_area(a.bounds, b.bounds), 0.0);
    assert_eq!(a.bounds.area(), 2.0 * b.bounds.area());
    assert_eq!(a.bounds.area() + b.bounds.area(), 300.0 * 200.0);
    assert_eq!(a.bounds.union(b.bounds), Rect::new(0.0, 0.0, 300.0, 200.0));
}

#[test]
fn leaf_values_sum_to_root() {
    let props = TreeMapProps::new(nested()).with_size(400.0, 300.0);
    let out = TreeMap::new(Renderer::Svg).update(&props).unwrap();
    let root = &out.nodes[0];
    let leaf_sum: f64 = out
        .nodes
        .iter()
        .filter(|n| n.node_height == 0)
        .map(|n| n.value)
        .sum();
    assert_eq!(root.value, 24.0);
    assert_eq!(leaf_sum, root.value);
    assert_eq!(out.nodes.len(), 11);
}

#[test]
fn every_tiling_keeps_children_inside_parents() {
    for tile in [
        TileMethod::Squarify,
        TileMethod::Slice,
        TileMethod::Dice,
        TileMethod::SliceDice,
        TileMethod::Binary,
    ] {
        let props = TreeMapProps::new(nested())
            .with_size(500.0, 320.0)
            .with_tile(tile)
            .with_inner_padding(3.0)
            .with_outer_padding(2.0);
        let out = TreeMap::new(Renderer::Html).update(&props).unwrap();
        for node in out.nodes.iter() {
            let Some(parent) = node.parent else { continue };
            let parent = out.nodes.iter().find(|n| n.node == parent).unwrap();
            let (p, c) = (parent.bounds, node.bounds);
            assert!(
                c.x0 >= p.x0 && c.y0 >= p.y0 && c.x1 <= p.x1 && c.y1 <= p.y1,
                "{tile:?}: {} escapes {}",
                node.path,
                parent.path
            );
            for sibling in out.nodes.iter().filter(|n| n.parent == node.parent) {
                if sibling.node != node.node {
                    assert_eq!(overlap_area(sibling.bounds, c), 0.0, "{tile:?}");
                }
            }
        }
    }
}

#[test]
fn unchanged_props_hit_the_cache() {
    let props = TreeMapProps::new(nested()).with_size(400.0, 300.0);
    let mut treemap = TreeMap::new(Renderer::Svg);
    let first = treemap.update(&props).unwrap();
    let before = treemap.generations();
    let second = treemap.update(&props.clone()).unwrap();
    assert!(Arc::ptr_eq(&first.nodes, &second.nodes));
    assert_eq!(first, second);
    assert_eq!(treemap.generations(), before);
    assert!(before.iter().all(|&(_, g)| g == 1));
}

#[test]
fn label_format_changes_only_labels() {
    let base = TreeMapProps::new(nested())
        .with_size(400.0, 300.0)
        .with_label("value");
    let mut treemap = TreeMap::new(Renderer::Html);
    let plain = treemap.update(&base).unwrap();

    let formatted = treemap
        .update(&base.clone().with_label_format(LabelFormat::number(".1f").unwrap()))
        .unwrap();
    assert_eq!(generation(&treemap, "nodes"), 1);
    assert_eq!(generation(&treemap, "tiled"), 1);
    assert_eq!(generation(&treemap, "labels"), 2);

    for (a, b) in plain.nodes.iter().zip(formatted.nodes.iter()) {
        assert_eq!(a.bounds, b.bounds);
        assert_eq!(a.color, b.color);
        assert_eq!(a.border_color, b.border_color);
    }
    let z = |nodes: &[crate::DecoratedNode]| {
        nodes
            .iter()
            .find(|n| n.path == "root.z")
            .and_then(|n| n.label.clone())
    };
    assert_eq!(z(plain.nodes.as_slice()), Some(String::from("6")));
    assert_eq!(z(formatted.nodes.as_slice()), Some(String::from("6.0")));
}

#[test]
fn resizing_retiles_without_rebuilding_the_hierarchy() {
    let props = TreeMapProps::new(nested()).with_size(400.0, 300.0);
    let mut treemap = TreeMap::new(Renderer::Canvas);
    let small = treemap.update(&props).unwrap();
    let large = treemap.update(&props.clone().with_size(800.0, 600.0)).unwrap();
    assert_eq!(generation(&treemap, "hierarchy"), 1);
    assert_eq!(generation(&treemap, "color"), 1);
    assert_eq!(generation(&treemap, "tiled"), 2);
    assert_eq!(small.nodes[0].bounds, Rect::new(0.0, 0.0, 400.0, 300.0));
    assert_eq!(large.nodes[0].bounds, Rect::new(0.0, 0.0, 800.0, 600.0));
    assert_eq!(small.nodes[0].color, large.nodes[0].color);
}

#[test]
fn margins_shrink_the_tiled_area() {
    let props = TreeMapProps::new(two_leaves())
        .with_size(300.0, 200.0)
        .with_margin(Margin {
            top: 10.0,
            right: 20.0,
            bottom: 30.0,
            left: 40.0,
        });
    let out = TreeMap::new(Renderer::Svg).update(&props).unwrap();
    assert_eq!(out.dimensions.inner.width, 240.0);
    assert_eq!(out.nodes[0].bounds, Rect::new(0.0, 0.0, 240.0, 160.0));
}

#[test]
fn invalid_data_keeps_previous_output() {
    let good = TreeMapProps::new(two_leaves()).with_size(300.0, 200.0);
    let mut treemap = TreeMap::new(Renderer::Svg);
    let first = treemap.update(&good).unwrap();

    let bad = good.clone().with_data(Arc::new(json!({
        "children": [{ "value": "lots" }]
    })));
    assert_eq!(
        treemap.update(&bad),
        Err(HierarchyError::NonNumericValue {
            depth: 1,
            found: String::from("\"lots\""),
        })
    );
    assert_eq!(generation(&treemap, "tiled"), 1);

    let again = treemap.update(&good).unwrap();
    assert!(Arc::ptr_eq(&first.nodes, &again.nodes));
}

#[test]
fn path_joins_identities() {
    let data = Arc::new(json!({
        "name": "root",
        "children": [{ "name": "A", "children": [{ "name": "leaf", "value": 1 }] }]
    }));
    let props = TreeMapProps::new(data)
        .with_size(100.0, 100.0)
        .with_identity("name")
        .with_leaves_only(true);
    let out = TreeMap::new(Renderer::Html).update(&props).unwrap();
    assert_eq!(out.nodes.len(), 1);
    assert_eq!(out.nodes[0].path, "root.A.leaf");
    assert_eq!(out.nodes[0].data["id"], json!("leaf"));
}

#[test]
fn disabled_labels_and_skip_size() {
    let props = TreeMapProps::new(two_leaves()).with_size(4.0, 4.0);
    let mut treemap = TreeMap::new(Renderer::Html);

    let labeled = treemap.update(&props).unwrap();
    assert!(labeled.nodes.iter().any(|n| n.label.is_some()));

    let skipped = treemap.update(&props.clone().with_label_skip_size(5.0)).unwrap();
    assert!(skipped.nodes.iter().all(|n| n.label.is_none()));

    let disabled = treemap.update(&props.clone().with_enable_label(false)).unwrap();
    assert!(disabled.nodes.iter().all(|n| n.label.is_none()));
    assert!(disabled.nodes.iter().all(|n| n.label_text_color.is_none()));
}

#[test]
fn nodes_at_the_same_depth_share_a_color() {
    let props = TreeMapProps::new(nested()).with_size(400.0, 300.0);
    let out = TreeMap::new(Renderer::Canvas).update(&props).unwrap();
    let by_depth = |d: usize| -> Vec<_> {
        out.nodes
            .iter()
            .filter(|n| n.depth == d)
            .map(|n| n.color)
            .collect()
    };
    let depth1 = by_depth(1);
    assert!(depth1.iter().all(|c| *c == depth1[0]));
    assert_ne!(by_depth(0)[0], depth1[0]);
    assert_eq!(out.nodes[0].data["color"], json!("#e8c1a0"));
}

#[test]
fn only_vector_output_carries_defs() {
    let props = TreeMapProps::new(two_leaves())
        .with_size(300.0, 200.0)
        .with_defs(vec![FillDef::lines("lines")])
        .with_fill(vec![FillRule::data("lines", json!({ "id": "b" }))]);

    let svg = TreeMap::new(Renderer::Svg).update(&props).unwrap();
    let defs = svg.defs.unwrap();
    assert_eq!(defs.defs.len(), 1);
    assert_eq!(defs.fills, [None, None, Some(String::from("lines"))]);

    let html = TreeMap::new(Renderer::Html).update(&props).unwrap();
    assert!(html.defs.is_none());
}

#[test]
fn overflowing_totals_are_rejected_at_any_depth() {
    let mut treemap = TreeMap::new(Renderer::Svg);
    for data in [
        json!({ "children": [{ "value": 1e308 }, { "value": 1e308 }] }),
        json!({ "children": [{ "id": "A", "children": [{ "value": 1e308 }, { "value": 1e308 }] }] }),
    ] {
        let props = TreeMapProps::new(Arc::new(data)).with_size(300.0, 200.0);
        assert!(matches!(
            treemap.update(&props),
            Err(HierarchyError::InvalidValue { .. })
        ));
    }
    assert_eq!(generation(&treemap, "tiled"), 0);
}
