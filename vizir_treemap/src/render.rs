// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Renderer-facing output.

extern crate alloc;

use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::decorate::DecoratedNode;
use crate::defs::{BoundDefs, FillDef, FillRule, bind_defs};
use crate::layout::Dimensions;

/// Output targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Renderer {
    /// Vector output (SVG). Receives fill definition bindings.
    #[default]
    Svg,
    /// Markup output (HTML boxes).
    Html,
    /// Pixel output (canvas).
    Canvas,
}

impl Renderer {
    /// Returns `true` if this target consumes gradient and pattern definitions.
    pub fn uses_defs(self) -> bool {
        matches!(self, Self::Svg)
    }
}

/// Everything a renderer needs to draw the treemap.
#[derive(Clone, Debug, PartialEq)]
pub struct RendererProps {
    /// Target renderer.
    pub renderer: Renderer,
    /// Decorated nodes in pre-order.
    pub nodes: Arc<Vec<DecoratedNode>>,
    /// Fill definition bindings, only present for vector output.
    pub defs: Option<Arc<BoundDefs>>,
    /// Chart dimensions.
    pub dimensions: Dimensions,
}

/// Builds renderer props from decorated nodes.
///
/// Markup and pixel targets get the node list as-is; vector output additionally gets the
/// definitions bound to the nodes.
pub fn adapt(
    renderer: Renderer,
    nodes: Arc<Vec<DecoratedNode>>,
    defs: &[FillDef],
    fill: &[FillRule],
    dimensions: Dimensions,
) -> RendererProps {
    let defs = renderer
        .uses_defs()
        .then(|| Arc::new(bind_defs(defs, &nodes, fill)));
    RendererProps {
        renderer,
        nodes,
        defs,
        dimensions,
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use super::*;

    #[test]
    fn only_vector_output_binds_defs() {
        let nodes = Arc::new(Vec::new());
        let defs = vec![FillDef::dots("dots")];
        let rules = vec![FillRule::any("dots")];
        for renderer in [Renderer::Html, Renderer::Canvas] {
            let props = adapt(renderer, nodes.clone(), &defs, &rules, Dimensions::default());
            assert!(props.defs.is_none());
            assert!(Arc::ptr_eq(&props.nodes, &nodes));
        }
        let svg = adapt(Renderer::Svg, nodes, &defs, &rules, Dimensions::default());
        assert_eq!(svg.defs.as_deref(), Some(&BoundDefs::default()));
    }
}
