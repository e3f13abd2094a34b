// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Treemap layout: chart dimensions and the tiling pass.
//!
//! [`TreeMapLayout`] walks a [`Hierarchy`] in pre-order. Each branch insets its own rectangle,
//! hands the remaining area to its [`TileMethod`], and the children then inset themselves by
//! half the inner padding so siblings end up `inner_padding` apart. The result is a new
//! [`TiledHierarchy`]; the hierarchy itself is never touched.

extern crate alloc;

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use kurbo::Rect;

#[cfg(not(feature = "std"))]
use crate::float::FloatExt;
use crate::hierarchy::{Hierarchy, NodeId};
use crate::tile::TileMethod;

/// A width/height pair used by chart layout.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    /// Width in chart coordinate units.
    pub width: f64,
    /// Height in chart coordinate units.
    pub height: f64,
}

impl Size {
    /// Creates a new size.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Space reserved around the chart area.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Margin {
    /// Top margin.
    pub top: f64,
    /// Right margin.
    pub right: f64,
    /// Bottom margin.
    pub bottom: f64,
    /// Left margin.
    pub left: f64,
}

impl Margin {
    /// Creates a margin with the same thickness on all sides.
    pub fn uniform(m: f64) -> Self {
        Self {
            top: m,
            right: m,
            bottom: m,
            left: m,
        }
    }
}

/// Outer and inner chart sizes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Dimensions {
    /// Total chart size, including margins.
    pub outer: Size,
    /// Size available to the treemap (outer size minus margins, clamped at zero).
    pub inner: Size,
    /// Margins applied around the treemap.
    pub margin: Margin,
}

impl Dimensions {
    /// Computes chart dimensions from an outer size and margins.
    pub fn new(width: f64, height: f64, margin: Margin) -> Self {
        Self {
            outer: Size::new(width, height),
            inner: Size::new(
                (width - margin.left - margin.right).max(0.0),
                (height - margin.top - margin.bottom).max(0.0),
            ),
            margin,
        }
    }
}

/// Tiling configuration: target size, method, and paddings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreeMapLayout {
    /// Size of the root rectangle.
    pub size: Size,
    /// Tiling method applied at every branch.
    pub tile: TileMethod,
    /// Gap between sibling rectangles.
    pub inner_padding: f64,
    /// Gap between a branch's edge and its children.
    pub outer_padding: f64,
    /// Round coordinates to whole units to avoid sub-pixel seams.
    pub round: bool,
}

impl Default for TreeMapLayout {
    fn default() -> Self {
        Self {
            size: Size::new(1.0, 1.0),
            tile: TileMethod::Squarify,
            inner_padding: 0.0,
            outer_padding: 0.0,
            round: true,
        }
    }
}

impl TreeMapLayout {
    /// Creates a layout for the given size with default settings.
    pub fn new(size: Size) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    /// Sets the tiling method.
    pub fn with_tile(mut self, tile: TileMethod) -> Self {
        self.tile = tile;
        self
    }

    /// Sets the gap between siblings.
    pub fn with_inner_padding(mut self, padding: f64) -> Self {
        self.inner_padding = padding;
        self
    }

    /// Sets the gap between a branch's edge and its children.
    pub fn with_outer_padding(mut self, padding: f64) -> Self {
        self.outer_padding = padding;
        self
    }

    /// Enables or disables rounding to whole units.
    pub fn with_round(mut self, round: bool) -> Self {
        self.round = round;
        self
    }

    /// Computes a rectangle for every node of `hierarchy`.
    pub fn tile(&self, hierarchy: Arc<Hierarchy>) -> TiledHierarchy {
        let mut rects = vec![Rect::ZERO; hierarchy.node_count()];
        rects[0] = Rect::new(0.0, 0.0, self.size.width.max(0.0), self.size.height.max(0.0));
        let inner_half = self.inner_padding.max(0.0) / 2.0;
        let outer = self.outer_padding.max(0.0);

        // Pre-order: a parent's rectangle is final before its children are positioned.
        for id in hierarchy.descendants() {
            let node = hierarchy.node(id);
            let rect = match node.parent {
                None => rects[id.index()],
                Some(parent) => clamp_to(inset(rects[id.index()], inner_half), rects[parent.index()]),
            };
            rects[id.index()] = rect;
            if !node.is_leaf() {
                let area = inset(rect, outer - inner_half);
                self.tile.tile(&hierarchy, id, area, &mut rects);
            }
        }

        if self.round {
            for r in &mut rects {
                *r = Rect::new(r.x0.round(), r.y0.round(), r.x1.round(), r.y1.round());
            }
        }

        log::debug!(
            "tiled {} nodes into {}x{} ({:?})",
            rects.len(),
            self.size.width,
            self.size.height,
            self.tile
        );
        TiledHierarchy { hierarchy, rects }
    }
}

/// Insets `r` by `p` on every side, collapsing to the midline instead of inverting.
fn inset(r: Rect, p: f64) -> Rect {
    let (mut x0, mut y0, mut x1, mut y1) = (r.x0 + p, r.y0 + p, r.x1 - p, r.y1 - p);
    if x1 < x0 {
        x0 = (x0 + x1) / 2.0;
        x1 = x0;
    }
    if y1 < y0 {
        y0 = (y0 + y1) / 2.0;
        y1 = y0;
    }
    Rect::new(x0, y0, x1, y1)
}

/// Clamps `r` into `bounds`.
///
/// Only degenerate children (narrower than the inner padding) can end up outside their parent
/// after insetting. NaN coordinates fall back to the bounds.
fn clamp_to(r: Rect, bounds: Rect) -> Rect {
    let x0 = clamp(r.x0, bounds.x0, bounds.x1);
    let y0 = clamp(r.y0, bounds.y0, bounds.y1);
    Rect::new(
        x0,
        y0,
        clamp(r.x1, x0, bounds.x1.max(x0)),
        clamp(r.y1, y0, bounds.y1.max(y0)),
    )
}

/// Like `f64::clamp`, but never panics on NaN or inverted bounds.
fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}

/// A hierarchy together with the rectangle computed for each of its nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct TiledHierarchy {
    hierarchy: Arc<Hierarchy>,
    rects: Vec<Rect>,
}

impl TiledHierarchy {
    /// The tiled hierarchy.
    pub fn hierarchy(&self) -> &Arc<Hierarchy> {
        &self.hierarchy
    }

    /// Bounds of a node (`x0, y0, x1, y1`).
    pub fn rect(&self, id: NodeId) -> Rect {
        self.rects[id.index()]
    }

    /// Bounds of every node, indexed by [`NodeId::index`].
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }
}
