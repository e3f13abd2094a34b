// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The treemap pipeline: props in, renderer props out.

extern crate alloc;

use alloc::sync::Arc;
use alloc::vec::Vec;

use serde_json::{Map, Value};

use crate::accessor::{Accessor, Getter};
use crate::color::{Colors, InheritedColor, InheritedColorGenerator, OrdinalColorScale, Theme};
use crate::decorate::{DecorateOptions, DecoratedNode, LabelOptions, apply_labels, decorate};
use crate::defs::{FillDef, FillRule};
use crate::error::HierarchyError;
use crate::hierarchy::Hierarchy;
use crate::label::{LabelFormat, LabelGenerator};
use crate::layout::{Dimensions, Margin, TiledHierarchy, TreeMapLayout};
use crate::memo::{ByPtr, Memo};
use crate::render::{Renderer, RendererProps, adapt};
use crate::tile::TileMethod;

/// Treemap configuration.
///
/// Defaults: identity and label read `id`, values read `value`, nodes are colored by `depth`
/// from the default scheme, borders are the fill darkened by `0.3` and label text the fill
/// darkened by `1`.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeMapProps {
    /// Root record; children are listed under `children`.
    ///
    /// Compared by pointer: swap in a new `Arc` to signal a data change.
    pub data: Arc<Value>,
    /// Node identity accessor.
    pub identity: Accessor,
    /// Leaf value accessor.
    pub value: Accessor,
    /// Fill colors.
    pub colors: Colors,
    /// Key selecting the palette entry.
    pub color_by: Accessor,
    /// Label accessor.
    pub label: Accessor,
    /// Label formatting.
    pub label_format: LabelFormat,
    /// Label text color.
    pub label_text_color: InheritedColor,
    /// Nodes whose smaller side is at most this size get no label; `0` disables the check.
    pub label_skip_size: f64,
    /// Whether labels are computed at all.
    pub enable_label: bool,
    /// Tiling method.
    pub tile: TileMethod,
    /// Gap between siblings.
    pub inner_padding: f64,
    /// Gap between a branch's edge and its children.
    pub outer_padding: f64,
    /// Emit only leaves.
    pub leaves_only: bool,
    /// Outer chart width.
    pub width: f64,
    /// Outer chart height.
    pub height: f64,
    /// Margins around the treemap.
    pub margin: Margin,
    /// Node border color.
    pub border_color: InheritedColor,
    /// Theme colors.
    pub theme: Theme,
    /// Gradient and pattern definitions (vector output only).
    pub defs: Vec<FillDef>,
    /// Rules binding nodes to `defs`.
    pub fill: Vec<FillRule>,
}

impl Default for TreeMapProps {
    fn default() -> Self {
        Self {
            data: Arc::new(Value::Object(Map::new())),
            identity: Accessor::field("id"),
            value: Accessor::field("value"),
            colors: Colors::default(),
            color_by: Accessor::field("depth"),
            label: Accessor::field("id"),
            label_format: LabelFormat::None,
            label_text_color: InheritedColor::darker(1.0),
            label_skip_size: 0.0,
            enable_label: true,
            tile: TileMethod::Squarify,
            inner_padding: 0.0,
            outer_padding: 0.0,
            leaves_only: false,
            width: 0.0,
            height: 0.0,
            margin: Margin::default(),
            border_color: InheritedColor::darker(0.3),
            theme: Theme::default(),
            defs: Vec::new(),
            fill: Vec::new(),
        }
    }
}

impl TreeMapProps {
    /// Creates props for `data` with default settings.
    pub fn new(data: Arc<Value>) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    /// Replaces the data.
    pub fn with_data(mut self, data: Arc<Value>) -> Self {
        self.data = data;
        self
    }

    /// Sets the outer chart size.
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Sets the margins.
    pub fn with_margin(mut self, margin: Margin) -> Self {
        self.margin = margin;
        self
    }

    /// Sets the identity accessor.
    pub fn with_identity(mut self, identity: impl Into<Accessor>) -> Self {
        self.identity = identity.into();
        self
    }

    /// Sets the leaf value accessor.
    pub fn with_value(mut self, value: impl Into<Accessor>) -> Self {
        self.value = value.into();
        self
    }

    /// Sets the fill colors.
    pub fn with_colors(mut self, colors: Colors) -> Self {
        self.colors = colors;
        self
    }

    /// Sets the palette key accessor.
    pub fn with_color_by(mut self, color_by: impl Into<Accessor>) -> Self {
        self.color_by = color_by.into();
        self
    }

    /// Sets the label accessor.
    pub fn with_label(mut self, label: impl Into<Accessor>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the label format.
    pub fn with_label_format(mut self, format: LabelFormat) -> Self {
        self.label_format = format;
        self
    }

    /// Sets the label text color.
    pub fn with_label_text_color(mut self, color: InheritedColor) -> Self {
        self.label_text_color = color;
        self
    }

    /// Sets the label skip size.
    pub fn with_label_skip_size(mut self, size: f64) -> Self {
        self.label_skip_size = size;
        self
    }

    /// Enables or disables labels.
    pub fn with_enable_label(mut self, enable: bool) -> Self {
        self.enable_label = enable;
        self
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

    /// Emits only leaves when `true`.
    pub fn with_leaves_only(mut self, leaves_only: bool) -> Self {
        self.leaves_only = leaves_only;
        self
    }

    /// Sets the node border color.
    pub fn with_border_color(mut self, color: InheritedColor) -> Self {
        self.border_color = color;
        self
    }

    /// Sets the theme.
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Sets the fill definitions.
    pub fn with_defs(mut self, defs: Vec<FillDef>) -> Self {
        self.defs = defs;
        self
    }

    /// Sets the fill rules.
    pub fn with_fill(mut self, fill: Vec<FillRule>) -> Self {
        self.fill = fill;
        self
    }

    /// Computes chart dimensions from size and margins.
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height, self.margin)
    }

    fn layout(&self) -> TreeMapLayout {
        TreeMapLayout::new(self.dimensions().inner)
            .with_tile(self.tile)
            .with_inner_padding(self.inner_padding)
            .with_outer_padding(self.outer_padding)
    }
}

type NodesDeps = (
    ByPtr<TiledHierarchy>,
    bool,
    Getter,
    ByPtr<OrdinalColorScale>,
    ByPtr<InheritedColorGenerator>,
);

type LabelsDeps = (
    bool,
    ByPtr<Vec<DecoratedNode>>,
    ByPtr<LabelGenerator>,
    f64,
    ByPtr<InheritedColorGenerator>,
);

type OutputDeps = (
    ByPtr<Vec<DecoratedNode>>,
    Vec<FillDef>,
    Vec<FillRule>,
    Dimensions,
);

/// A treemap bound to one renderer, caching every stage between updates.
///
/// Each stage only recomputes when its own inputs change, so unchanged stages hand back the
/// same `Arc` as the previous update.
#[derive(Debug)]
pub struct TreeMap {
    renderer: Renderer,
    hierarchy: Memo<(ByPtr<Value>, Accessor), Arc<Hierarchy>>,
    color: Memo<(Colors, Accessor), Arc<OrdinalColorScale>>,
    identity: Memo<Accessor, Getter>,
    border_color: Memo<(InheritedColor, Theme), Arc<InheritedColorGenerator>>,
    label: Memo<(Accessor, LabelFormat), Arc<LabelGenerator>>,
    label_text_color: Memo<(InheritedColor, Theme), Arc<InheritedColorGenerator>>,
    tiled: Memo<(ByPtr<Hierarchy>, TreeMapLayout), Arc<TiledHierarchy>>,
    nodes: Memo<NodesDeps, Arc<Vec<DecoratedNode>>>,
    labels: Memo<LabelsDeps, Arc<Vec<DecoratedNode>>>,
    output: Memo<OutputDeps, RendererProps>,
}

impl TreeMap {
    /// Creates a pipeline for `renderer`.
    pub fn new(renderer: Renderer) -> Self {
        Self {
            renderer,
            hierarchy: Memo::new("hierarchy"),
            color: Memo::new("color"),
            identity: Memo::new("identity"),
            border_color: Memo::new("border_color"),
            label: Memo::new("label"),
            label_text_color: Memo::new("label_text_color"),
            tiled: Memo::new("tiled"),
            nodes: Memo::new("nodes"),
            labels: Memo::new("labels"),
            output: Memo::new("output"),
        }
    }

    /// The renderer this pipeline feeds.
    pub fn renderer(&self) -> Renderer {
        self.renderer
    }

    /// Recomputation counts per stage, in pipeline order.
    pub fn generations(&self) -> [(&'static str, u64); 10] {
        [
            (self.hierarchy.name(), self.hierarchy.generation()),
            (self.color.name(), self.color.generation()),
            (self.identity.name(), self.identity.generation()),
            (self.border_color.name(), self.border_color.generation()),
            (self.label.name(), self.label.generation()),
            (self.label_text_color.name(), self.label_text_color.generation()),
            (self.tiled.name(), self.tiled.generation()),
            (self.nodes.name(), self.nodes.generation()),
            (self.labels.name(), self.labels.generation()),
            (self.output.name(), self.output.generation()),
        ]
    }

    /// Runs the pipeline, reusing every stage whose inputs are unchanged.
    ///
    /// An invalid hierarchy is reported before any tiling happens; the caches keep the output of
    /// the last successful update.
    pub fn update(&mut self, props: &TreeMapProps) -> Result<RendererProps, HierarchyError> {
        let hierarchy = self.hierarchy.try_get_or_update(
            (ByPtr(props.data.clone()), props.value.clone()),
            |(data, value)| Hierarchy::from_nested(data, value).map(Arc::new),
        )?;

        let color = self
            .color
            .get_or_update((props.colors.clone(), props.color_by.clone()), |(c, by)| {
                Arc::new(OrdinalColorScale::new(c.clone(), by.clone()))
            });
        let identity = self
            .identity
            .get_or_update(props.identity.clone(), Accessor::resolve);
        let border_color = self.border_color.get_or_update(
            (props.border_color.clone(), props.theme),
            |(spec, theme)| Arc::new(InheritedColorGenerator::new(spec.clone(), *theme)),
        );
        let label = self.label.get_or_update(
            (props.label.clone(), props.label_format.clone()),
            |(label, format)| Arc::new(LabelGenerator::new(label.clone(), format.clone())),
        );
        let label_text_color = self.label_text_color.get_or_update(
            (props.label_text_color.clone(), props.theme),
            |(spec, theme)| Arc::new(InheritedColorGenerator::new(spec.clone(), *theme)),
        );

        let tiled = self
            .tiled
            .get_or_update((ByPtr(hierarchy), props.layout()), |(h, layout)| {
                Arc::new(layout.tile(h.0.clone()))
            });

        let nodes = self.nodes.get_or_update(
            (
                ByPtr(tiled),
                props.leaves_only,
                identity,
                ByPtr(color),
                ByPtr(border_color),
            ),
            |(tiled, leaves_only, identity, color, border_color)| {
                let options = DecorateOptions {
                    leaves_only: *leaves_only,
                    identity: identity.clone(),
                    color: color.0.clone(),
                    border_color: border_color.0.clone(),
                };
                Arc::new(decorate(tiled, &options))
            },
        );

        let labeled = self.labels.get_or_update(
            (
                props.enable_label,
                ByPtr(nodes),
                ByPtr(label),
                props.label_skip_size,
                ByPtr(label_text_color),
            ),
            |(enabled, nodes, label, skip, text_color)| {
                if !*enabled {
                    return nodes.0.clone();
                }
                let options = LabelOptions {
                    label: label.0.clone(),
                    label_skip_size: *skip,
                    label_text_color: text_color.0.clone(),
                };
                Arc::new(apply_labels(nodes, &options))
            },
        );

        let renderer = self.renderer;
        // Fill rules only matter for vector output.
        let (defs, fill) = if renderer.uses_defs() {
            (props.defs.clone(), props.fill.clone())
        } else {
            (Vec::new(), Vec::new())
        };
        Ok(self.output.get_or_update(
            (ByPtr(labeled), defs, fill, props.dimensions()),
            |(nodes, defs, fill, dimensions)| {
                adapt(renderer, nodes.0.clone(), defs, fill, *dimensions)
            },
        ))
    }
}
