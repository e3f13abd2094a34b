// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pixel output, approximated with a character raster.

use vizir_treemap::RendererProps;

const GLYPHS: &[u8] = b"#@%&*+=-:o";

/// Rasterizes the leaves onto a `cols` x `rows` grid, one glyph per leaf.
#[allow(
    clippy::cast_possible_truncation,
    reason = "grid coordinates are clamped to the raster size"
)]
pub(crate) fn render(props: &RendererProps, cols: usize, rows: usize) -> String {
    let inner = props.dimensions.inner;
    let mut grid = vec![vec![' '; cols]; rows];
    if inner.width <= 0.0 || inner.height <= 0.0 {
        return String::new();
    }
    let sx = cols as f64 / inner.width;
    let sy = rows as f64 / inner.height;

    let leaves = props.nodes.iter().filter(|n| n.node_height == 0);
    for (i, node) in leaves.enumerate() {
        let glyph = char::from(GLYPHS[i % GLYPHS.len()]);
        let (c0, c1) = ((node.x * sx) as usize, ((node.x + node.width) * sx) as usize);
        let (r0, r1) = ((node.y * sy) as usize, ((node.y + node.height) * sy) as usize);
        for row in grid.iter_mut().take(r1.min(rows)).skip(r0) {
            for cell in row.iter_mut().take(c1.min(cols)).skip(c0) {
                *cell = glyph;
            }
        }
    }

    grid.into_iter()
        .map(|row| row.into_iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}
