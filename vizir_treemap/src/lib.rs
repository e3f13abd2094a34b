// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Treemap layout for VizIR charts.
//!
//! This crate turns a nested JSON dataset into positioned, colored and labeled rectangles:
//! - **Hierarchy**: [`Hierarchy`] normalizes nested records (or flat rows via
//!   [`Hierarchy::stratify`]) into an arena with depths, heights and aggregated values.
//! - **Tiling**: [`TreeMapLayout`] assigns each node a rectangle using a [`TileMethod`]
//!   (squarify, slice, dice, slice-dice, binary) with inner/outer padding.
//! - **Decoration**: [`decorate`] and [`apply_labels`] derive paths, colors and labels.
//! - **Output**: [`adapt`] packages nodes for a [`Renderer`]; vector output also gets gradient
//!   and pattern bindings ([`BoundDefs`]).
//!
//! [`TreeMap`] wires the stages together and caches each one with a [`Memo`], so an update only
//! recomputes what its changed props affect.
//!
//! ```
//! use std::sync::Arc;
//!
//! use serde_json::json;
//! use vizir_treemap::{Renderer, TreeMap, TreeMapProps};
//!
//! let data = Arc::new(json!({
//!     "id": "root",
//!     "children": [
//!         { "id": "a", "value": 2 },
//!         { "id": "b", "value": 1 },
//!     ]
//! }));
//! let props = TreeMapProps::new(data).with_size(300.0, 200.0);
//! let mut treemap = TreeMap::new(Renderer::Html);
//!
//! let first = treemap.update(&props).unwrap();
//! assert_eq!(first.nodes.len(), 3);
//! assert_eq!(first.nodes[1].label.as_deref(), Some("a"));
//!
//! let second = treemap.update(&props).unwrap();
//! assert!(Arc::ptr_eq(&first.nodes, &second.nodes));
//! ```
//!
//! Rendering and text shaping are out of scope; labels are plain strings.

#![no_std]

extern crate alloc;

mod accessor;
mod color;
mod decorate;
mod defs;
mod error;
#[cfg(not(feature = "std"))]
mod float;
mod hierarchy;
mod label;
mod layout;
mod memo;
#[cfg(test)]
mod pipeline_tests;
mod render;
mod tile;
mod treemap;

pub use accessor::{Accessor, Getter, value_to_string};
pub use color::{
    ColorModifier, ColorScheme, Colors, InheritedColor, InheritedColorGenerator,
    OrdinalColorScale, Theme, ThemeColor, to_hex,
};
pub use decorate::{
    DecorateOptions, DecoratedNode, LabelOptions, apply_labels, decorate, skips_label,
};
pub use defs::{
    BoundDefs, DefColor, DefPaint, FillDef, FillMatch, FillRule, GradientStop, PatternKind,
    bind_defs,
};
pub use error::{FormatError, HierarchyError};
pub use hierarchy::{CHILDREN_KEY, Hierarchy, HierarchyNode, NodeId};
pub use label::{Align, FormatType, LabelFormat, LabelGenerator, NumberFormat, Sign};
pub use layout::{Dimensions, Margin, Size, TiledHierarchy, TreeMapLayout};
pub use memo::{ByPtr, Memo};
pub use render::{Renderer, RendererProps, adapt};
pub use tile::TileMethod;
pub use treemap::{TreeMap, TreeMapProps};
