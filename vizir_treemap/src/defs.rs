// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Gradient and pattern fill definitions for vector output.
//!
//! A [`FillDef`] describes a reusable paint server (a linear gradient or a tiling pattern).
//! [`FillRule`]s select which nodes use which definition, and [`bind_defs`] produces the binding
//! table consumed by the vector renderer.
//!
//! Definition colors may be inherited from the node fill. Such definitions are instantiated once
//! per distinct node color under the id `"{def id}.{rrggbb}"`.

extern crate alloc;

use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use hashbrown::HashSet;
use peniko::Color;
use serde_json::Value;

use crate::color::{ColorModifier, to_hex};
use crate::decorate::DecoratedNode;

/// A definition color: fixed, or derived from the node fill.
#[derive(Clone, Debug, PartialEq)]
pub enum DefColor {
    /// A constant color.
    Fixed(Color),
    /// The node fill with modifiers applied in order.
    Inherit(Vec<ColorModifier>),
}

impl DefColor {
    /// Inherits the node fill unchanged.
    pub fn inherit() -> Self {
        Self::Inherit(Vec::new())
    }

    fn resolve(&self, node_color: Color) -> Color {
        match self {
            Self::Fixed(c) => *c,
            Self::Inherit(modifiers) => modifiers.iter().fold(node_color, |c, m| m.apply(c)),
        }
    }

    fn is_inherited(&self) -> bool {
        matches!(self, Self::Inherit(_))
    }
}

impl From<Color> for DefColor {
    fn from(color: Color) -> Self {
        Self::Fixed(color)
    }
}

/// A color stop of a linear gradient.
#[derive(Clone, Debug, PartialEq)]
pub struct GradientStop {
    /// Position along the gradient, `0..=1`.
    pub offset: f64,
    /// Stop color.
    pub color: DefColor,
    /// Stop opacity.
    pub opacity: f64,
}

impl GradientStop {
    /// Creates an opaque stop.
    pub fn new(offset: f64, color: impl Into<DefColor>) -> Self {
        Self {
            offset,
            color: color.into(),
            opacity: 1.0,
        }
    }

    /// Sets the stop opacity.
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }
}

/// Pattern shapes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PatternKind {
    /// A grid of dots.
    Dots {
        /// Dot diameter.
        size: f64,
        /// Space between dots.
        padding: f64,
        /// Offset every other row.
        stagger: bool,
    },
    /// Parallel lines.
    Lines {
        /// Distance between lines.
        spacing: f64,
        /// Rotation in degrees.
        rotation: f64,
        /// Stroke width.
        line_width: f64,
    },
    /// A grid of squares.
    Squares {
        /// Square side.
        size: f64,
        /// Space between squares.
        padding: f64,
        /// Offset every other row.
        stagger: bool,
    },
}

/// What a definition paints.
#[derive(Clone, Debug, PartialEq)]
pub enum DefPaint {
    /// A left-to-right linear gradient.
    LinearGradient(Vec<GradientStop>),
    /// A tiling pattern.
    Pattern {
        /// Pattern shape.
        kind: PatternKind,
        /// Color behind the shapes.
        background: DefColor,
        /// Shape color.
        color: DefColor,
    },
}

/// A named paint server.
#[derive(Clone, Debug, PartialEq)]
pub struct FillDef {
    /// Identifier referenced by [`FillRule`]s and by `url(#id)` fills.
    pub id: String,
    /// Paint description.
    pub paint: DefPaint,
}

impl FillDef {
    /// A linear gradient definition.
    pub fn linear_gradient(id: impl Into<String>, stops: Vec<GradientStop>) -> Self {
        Self {
            id: id.into(),
            paint: DefPaint::LinearGradient(stops),
        }
    }

    fn pattern(id: impl Into<String>, kind: PatternKind) -> Self {
        Self {
            id: id.into(),
            paint: DefPaint::Pattern {
                kind,
                background: DefColor::Fixed(Color::WHITE),
                color: DefColor::Fixed(Color::BLACK),
            },
        }
    }

    /// A dot pattern: 4 unit dots, 4 units apart, black on white.
    pub fn dots(id: impl Into<String>) -> Self {
        Self::pattern(
            id,
            PatternKind::Dots {
                size: 4.0,
                padding: 4.0,
                stagger: false,
            },
        )
    }

    /// A line pattern: 2 unit lines, 5 units apart, black on white.
    pub fn lines(id: impl Into<String>) -> Self {
        Self::pattern(
            id,
            PatternKind::Lines {
                spacing: 5.0,
                rotation: 0.0,
                line_width: 2.0,
            },
        )
    }

    /// A square pattern: 4 unit squares, 4 units apart, black on white.
    pub fn squares(id: impl Into<String>) -> Self {
        Self::pattern(
            id,
            PatternKind::Squares {
                size: 4.0,
                padding: 4.0,
                stagger: false,
            },
        )
    }

    /// Replaces the pattern shape. Has no effect on gradients.
    pub fn with_kind(mut self, new_kind: PatternKind) -> Self {
        if let DefPaint::Pattern { kind, .. } = &mut self.paint {
            *kind = new_kind;
        }
        self
    }

    /// Sets the pattern background. Has no effect on gradients.
    pub fn with_background(mut self, color: impl Into<DefColor>) -> Self {
        if let DefPaint::Pattern { background, .. } = &mut self.paint {
            *background = color.into();
        }
        self
    }

    /// Sets the pattern shape color. Has no effect on gradients.
    pub fn with_color(mut self, new_color: impl Into<DefColor>) -> Self {
        if let DefPaint::Pattern { color, .. } = &mut self.paint {
            *color = new_color.into();
        }
        self
    }

    /// Returns `true` if any color of this definition comes from the node fill.
    pub fn is_inherited(&self) -> bool {
        match &self.paint {
            DefPaint::LinearGradient(stops) => stops.iter().any(|s| s.color.is_inherited()),
            DefPaint::Pattern {
                background, color, ..
            } => background.is_inherited() || color.is_inherited(),
        }
    }

    /// Instantiates an inherited definition for one node color.
    fn resolve(&self, node_color: Color) -> Self {
        let hex = to_hex(node_color);
        let paint = match &self.paint {
            DefPaint::LinearGradient(stops) => DefPaint::LinearGradient(
                stops
                    .iter()
                    .map(|s| GradientStop {
                        color: DefColor::Fixed(s.color.resolve(node_color)),
                        ..s.clone()
                    })
                    .collect(),
            ),
            DefPaint::Pattern {
                kind,
                background,
                color,
            } => DefPaint::Pattern {
                kind: *kind,
                background: DefColor::Fixed(background.resolve(node_color)),
                color: DefColor::Fixed(color.resolve(node_color)),
            },
        };
        Self {
            id: format!("{}.{}", self.id, hex.trim_start_matches('#')),
            paint,
        }
    }
}

/// Which nodes a [`FillRule`] applies to.
#[derive(Clone)]
pub enum FillMatch {
    /// Every node.
    Any,
    /// Nodes whose record contains this partial record.
    Data(Value),
    /// Nodes accepted by a predicate.
    Func(Arc<dyn Fn(&DecoratedNode) -> bool>),
}

impl core::fmt::Debug for FillMatch {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Any => f.write_str("Any"),
            Self::Data(v) => f.debug_tuple("Data").field(v).finish(),
            Self::Func(_) => f.write_str("Func(..)"),
        }
    }
}

impl PartialEq for FillMatch {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Any, Self::Any) => true,
            (Self::Data(a), Self::Data(b)) => a == b,
            (Self::Func(a), Self::Func(b)) => core::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
            _ => false,
        }
    }
}

impl FillMatch {
    fn matches(&self, node: &DecoratedNode) -> bool {
        match self {
            Self::Any => true,
            Self::Data(partial) => is_match(&node.data, partial),
            Self::Func(f) => f(node),
        }
    }
}

/// Returns `true` if `value` contains everything in `partial`.
///
/// Objects match when every key of `partial` matches, arrays element by element, and numbers by
/// numeric value.
fn is_match(value: &Value, partial: &Value) -> bool {
    match (value, partial) {
        (Value::Object(v), Value::Object(p)) => p
            .iter()
            .all(|(k, pv)| v.get(k).is_some_and(|vv| is_match(vv, pv))),
        (Value::Array(v), Value::Array(p)) => {
            v.len() == p.len() && v.iter().zip(p).all(|(vv, pv)| is_match(vv, pv))
        }
        (Value::Number(v), Value::Number(p)) => v.as_f64() == p.as_f64(),
        _ => value == partial,
    }
}

/// Assigns a definition to the nodes selected by a matcher.
#[derive(Clone, Debug, PartialEq)]
pub struct FillRule {
    /// Id of the [`FillDef`] to use.
    pub id: String,
    /// Node selector.
    pub matcher: FillMatch,
}

impl FillRule {
    /// A rule applying to every node.
    pub fn any(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            matcher: FillMatch::Any,
        }
    }

    /// A rule applying to nodes whose record contains `partial`.
    pub fn data(id: impl Into<String>, partial: Value) -> Self {
        Self {
            id: id.into(),
            matcher: FillMatch::Data(partial),
        }
    }

    /// A rule applying to nodes accepted by `f`.
    pub fn func(id: impl Into<String>, f: impl Fn(&DecoratedNode) -> bool + 'static) -> Self {
        Self {
            id: id.into(),
            matcher: FillMatch::Func(Arc::new(f)),
        }
    }
}

/// Definitions in use and the fill reference of each node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BoundDefs {
    /// Referenced definitions, in first-use order.
    pub defs: Vec<FillDef>,
    /// Definition id per node, parallel to the node list; `None` keeps the plain node color.
    pub fills: Vec<Option<String>>,
}

impl BoundDefs {
    /// The `url(#id)` fill reference for node `index`, if any.
    pub fn fill_url(&self, index: usize) -> Option<String> {
        self.fills
            .get(index)
            .and_then(Option::as_deref)
            .map(|id| format!("url(#{id})"))
    }
}

/// Binds nodes to fill definitions.
///
/// Each node takes the first rule that matches it and names an existing definition. Rules using
/// an inherited definition are skipped for nodes without a fill color.
pub fn bind_defs(defs: &[FillDef], nodes: &[DecoratedNode], rules: &[FillRule]) -> BoundDefs {
    let mut used: Vec<FillDef> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut fills = Vec::with_capacity(nodes.len());

    for node in nodes {
        let mut fill = None;
        for rule in rules {
            let Some(def) = defs.iter().find(|d| d.id == rule.id) else {
                continue;
            };
            if !rule.matcher.matches(node) {
                continue;
            }
            let bound = if def.is_inherited() {
                let Some(color) = node.color else {
                    continue;
                };
                def.resolve(color)
            } else {
                def.clone()
            };
            if seen.insert(bound.id.clone()) {
                fill = Some(bound.id.clone());
                used.push(bound);
            } else {
                fill = Some(bound.id);
            }
            break;
        }
        fills.push(fill);
    }

    log::debug!("bound {} fill defs to {} nodes", used.len(), nodes.len());
    BoundDefs { defs: used, fills }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;
    use kurbo::Rect;
    use serde_json::json;

    use super::*;
    use crate::hierarchy::NodeId;

    fn node(data: Value, color: Option<Color>) -> DecoratedNode {
        DecoratedNode {
            node: NodeId::ROOT,
            parent: None,
            data,
            depth: 0,
            node_height: 0,
            value: 1.0,
            bounds: Rect::new(0.0, 0.0, 10.0, 10.0),
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
            path: String::new(),
            id: None,
            color,
            border_color: None,
            label: None,
            label_text_color: None,
        }
    }

    #[test]
    fn first_matching_rule_wins() {
        let defs = vec![FillDef::dots("dots"), FillDef::lines("lines")];
        let nodes = vec![
            node(json!({ "id": "a", "meta": { "kind": "x" } }), None),
            node(json!({ "id": "b" }), None),
        ];
        let rules = vec![
            FillRule::data("missing", json!({})),
            FillRule::data("lines", json!({ "meta": { "kind": "x" } })),
            FillRule::any("dots"),
        ];
        let bound = bind_defs(&defs, &nodes, &rules);
        assert_eq!(bound.fills, [Some(String::from("lines")), Some(String::from("dots"))]);
        let ids: Vec<&str> = bound.defs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["lines", "dots"]);
        assert_eq!(bound.fill_url(0).as_deref(), Some("url(#lines)"));
    }

    #[test]
    fn unreferenced_defs_are_dropped() {
        let defs = vec![FillDef::dots("dots"), FillDef::squares("squares")];
        let nodes = vec![node(json!({ "id": "a", "value": 2 }), None)];
        let rules = vec![
            FillRule::data("squares", json!({ "value": 3 })),
            FillRule::data("dots", json!({ "value": 2.0 })),
        ];
        let bound = bind_defs(&defs, &nodes, &rules);
        assert_eq!(bound.defs, vec![FillDef::dots("dots")]);
    }

    #[test]
    fn inherited_defs_are_instantiated_per_color() {
        let red = Color::from_rgb8(255, 0, 0);
        let defs = vec![
            FillDef::linear_gradient(
                "grad",
                vec![
                    GradientStop::new(0.0, DefColor::inherit()),
                    GradientStop::new(1.0, DefColor::inherit()).with_opacity(0.5),
                ],
            ),
        ];
        let nodes = vec![
            node(json!({}), Some(red)),
            node(json!({}), Some(red)),
            node(json!({}), None),
        ];
        let bound = bind_defs(&defs, &nodes, &[FillRule::any("grad")]);
        assert_eq!(
            bound.fills,
            [Some(String::from("grad.ff0000")), Some(String::from("grad.ff0000")), None]
        );
        assert_eq!(bound.defs.len(), 1);
        assert!(!bound.defs[0].is_inherited());
        let DefPaint::LinearGradient(stops) = &bound.defs[0].paint else {
            panic!("expected a gradient");
        };
        assert_eq!(stops[1].color, DefColor::Fixed(red));
        assert_eq!(stops[1].opacity, 0.5);
    }

    #[test]
    fn pattern_builders_and_predicates() {
        let def = FillDef::dots("d")
            .with_background(DefColor::inherit())
            .with_color(Color::WHITE);
        assert!(def.is_inherited());
        let nodes = vec![node(json!({}), Some(Color::BLACK)), node(json!({}), None)];
        let rules = vec![FillRule::func("d", |n| n.color.is_some())];
        let bound = bind_defs(&[def], &nodes, &rules);
        assert_eq!(bound.fills[0].as_deref(), Some("d.000000"));
        assert_eq!(bound.fills[1], None);
    }
}
