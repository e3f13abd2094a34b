// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tiling methods.
//!
//! A tiling method partitions a branch rectangle among the branch's children, proportionally to
//! their aggregated values. The methods follow d3-hierarchy's treemap tilers:
//! - **Slice** stacks children top to bottom (each child spans the full width).
//! - **Dice** lays children out left to right (each child spans the full height).
//! - **Slice-dice** alternates: slice at odd depths, dice at even depths.
//! - **Squarify** groups children into rows whose aspect ratios approach the golden ratio.
//! - **Binary** recursively bisects children by cumulative value, along the longer side.
//!
//! Zero-value children still receive a (possibly zero-area) rectangle.

extern crate alloc;

use alloc::vec::Vec;

use kurbo::Rect;

use crate::hierarchy::{Hierarchy, NodeId};

/// The golden ratio, the target aspect ratio of squarified rows.
const PHI: f64 = 1.618_033_988_749_895;

/// How a branch rectangle is divided among its children.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TileMethod {
    /// Squarified rows (default).
    #[default]
    Squarify,
    /// Horizontal stripes stacked vertically.
    Slice,
    /// Vertical stripes laid out horizontally.
    Dice,
    /// Slice at odd depths, dice at even depths.
    SliceDice,
    /// Balanced binary bisection.
    Binary,
}

impl TileMethod {
    /// Parses a tiling method name (`"squarify"`, `"slice"`, `"dice"`, `"sliceDice"` or
    /// `"slice-dice"`, `"binary"`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "squarify" => Some(Self::Squarify),
            "slice" => Some(Self::Slice),
            "dice" => Some(Self::Dice),
            "sliceDice" | "slice-dice" | "slice_dice" => Some(Self::SliceDice),
            "binary" => Some(Self::Binary),
            _ => None,
        }
    }

    /// Positions the children of `parent` inside `area`, writing into `rects` (indexed by
    /// [`NodeId::index`]).
    pub(crate) fn tile(self, hierarchy: &Hierarchy, parent: NodeId, area: Rect, rects: &mut [Rect]) {
        let node = hierarchy.node(parent);
        let children = hierarchy.children(parent);
        if children.is_empty() {
            return;
        }
        let tiler = Tiler { hierarchy, rects };
        match self {
            Self::Squarify => tiler.squarify(children, node.value, area),
            Self::Slice => tiler.slice(children, node.value, area),
            Self::Dice => tiler.dice(children, node.value, area),
            Self::SliceDice => {
                if node.depth % 2 == 1 {
                    tiler.slice(children, node.value, area);
                } else {
                    tiler.dice(children, node.value, area);
                }
            }
            Self::Binary => tiler.binary(children, node.value, area),
        }
    }
}

struct Tiler<'a> {
    hierarchy: &'a Hierarchy,
    rects: &'a mut [Rect],
}

impl Tiler<'_> {
    fn value(&self, id: NodeId) -> f64 {
        self.hierarchy.node(id).value
    }

    fn dice(mut self, nodes: &[NodeId], value: f64, area: Rect) {
        self.dice_row(nodes, value, area);
    }

    fn slice(mut self, nodes: &[NodeId], value: f64, area: Rect) {
        self.slice_row(nodes, value, area);
    }

    fn dice_row(&mut self, nodes: &[NodeId], value: f64, area: Rect) {
        let k = if value != 0.0 {
            (area.x1 - area.x0) / value
        } else {
            0.0
        };
        let mut x = area.x0;
        for &id in nodes {
            let next = x + self.value(id) * k;
            self.rects[id.index()] = Rect::new(x, area.y0, next, area.y1);
            x = next;
        }
    }

    fn slice_row(&mut self, nodes: &[NodeId], value: f64, area: Rect) {
        let k = if value != 0.0 {
            (area.y1 - area.y0) / value
        } else {
            0.0
        };
        let mut y = area.y0;
        for &id in nodes {
            let next = y + self.value(id) * k;
            self.rects[id.index()] = Rect::new(area.x0, y, area.x1, next);
            y = next;
        }
    }

    fn squarify(mut self, nodes: &[NodeId], total: f64, area: Rect) {
        let Rect {
            mut x0,
            mut y0,
            x1,
            y1,
        } = area;
        let mut value = total;
        let n = nodes.len();
        let mut i0 = 0;
        let mut i1 = 0;

        while i0 < n {
            let dx = x1 - x0;
            let dy = y1 - y0;

            // Find the next non-empty node.
            let mut sum_value;
            loop {
                sum_value = self.value(nodes[i1]);
                i1 += 1;
                if sum_value != 0.0 || i1 >= n {
                    break;
                }
            }
            let mut min_value = sum_value;
            let mut max_value = sum_value;
            let alpha = (dy / dx).max(dx / dy) / (value * PHI);
            let mut beta = sum_value * sum_value * alpha;
            let mut min_ratio = (max_value / beta).max(beta / min_value);

            // Keep adding nodes while the aspect ratio maintains or improves.
            while i1 < n {
                let node_value = self.value(nodes[i1]);
                sum_value += node_value;
                min_value = min_value.min(node_value);
                max_value = max_value.max(node_value);
                beta = sum_value * sum_value * alpha;
                let new_ratio = (max_value / beta).max(beta / min_value);
                if new_ratio > min_ratio {
                    sum_value -= node_value;
                    break;
                }
                min_ratio = new_ratio;
                i1 += 1;
            }

            let row = &nodes[i0..i1];
            if dx < dy {
                let next = if value != 0.0 {
                    y0 + dy * sum_value / value
                } else {
                    y1
                };
                self.dice_row(row, sum_value, Rect::new(x0, y0, x1, next));
                if value != 0.0 {
                    y0 = next;
                }
            } else {
                let next = if value != 0.0 {
                    x0 + dx * sum_value / value
                } else {
                    x1
                };
                self.slice_row(row, sum_value, Rect::new(x0, y0, next, y1));
                if value != 0.0 {
                    x0 = next;
                }
            }
            value -= sum_value;
            i0 = i1;
        }
    }

    fn binary(mut self, nodes: &[NodeId], total: f64, area: Rect) {
        let mut sums = Vec::with_capacity(nodes.len() + 1);
        let mut sum = 0.0;
        sums.push(sum);
        for &id in nodes {
            sum += self.value(id);
            sums.push(sum);
        }
        self.partition(nodes, &sums, 0, nodes.len(), total, area);
    }

    fn partition(
        &mut self,
        nodes: &[NodeId],
        sums: &[f64],
        i: usize,
        j: usize,
        value: f64,
        area: Rect,
    ) {
        if i + 1 >= j {
            self.rects[nodes[i].index()] = area;
            return;
        }

        let value_offset = sums[i];
        let value_target = value / 2.0 + value_offset;
        let mut k = i + 1;
        let mut hi = j - 1;
        while k < hi {
            let mid = (k + hi) / 2;
            if sums[mid] < value_target {
                k = mid + 1;
            } else {
                hi = mid;
            }
        }
        if value_target - sums[k - 1] < sums[k] - value_target && i + 1 < k {
            k -= 1;
        }

        let value_left = sums[k] - value_offset;
        let value_right = value - value_left;
        let Rect { x0, y0, x1, y1 } = area;

        if x1 - x0 > y1 - y0 {
            let xk = if value != 0.0 {
                (x0 * value_right + x1 * value_left) / value
            } else {
                x1
            };
            self.partition(nodes, sums, i, k, value_left, Rect::new(x0, y0, xk, y1));
            self.partition(nodes, sums, k, j, value_right, Rect::new(xk, y0, x1, y1));
        } else {
            let yk = if value != 0.0 {
                (y0 * value_right + y1 * value_left) / value
            } else {
                y1
            };
            self.partition(nodes, sums, i, k, value_left, Rect::new(x0, y0, x1, yk));
            self.partition(nodes, sums, k, j, value_right, Rect::new(x0, yk, x1, y1));
        }
    }
}
