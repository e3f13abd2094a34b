// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node color resolution.
//!
//! Two generators feed the decorator:
//! - [`OrdinalColorScale`] assigns a fill color per node from a palette, keyed by a record field
//!   (depth by default).
//! - [`InheritedColorGenerator`] derives secondary colors (borders, label text) from a node's
//!   fill color, a theme color, or a constant.

extern crate alloc;

use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cell::RefCell;

use hashbrown::HashMap;
use peniko::Color;
use serde_json::Value;

use crate::accessor::{Accessor, value_to_string};
#[cfg(not(feature = "std"))]
use crate::float::FloatExt;

const NIVO: &[u32] = &[0xe8c1a0, 0xf47560, 0xf1e15b, 0xe8a838, 0x61cdbb, 0x97e3d5];
const CATEGORY10: &[u32] = &[
    0x1f77b4, 0xff7f0e, 0x2ca02c, 0xd62728, 0x9467bd, 0x8c564b, 0xe377c2, 0x7f7f7f, 0xbcbd22,
    0x17becf,
];
const ACCENT: &[u32] = &[
    0x7fc97f, 0xbeaed4, 0xfdc086, 0xffff99, 0x386cb0, 0xf0027f, 0xbf5b17, 0x666666,
];
const DARK2: &[u32] = &[
    0x1b9e77, 0xd95f02, 0x7570b3, 0xe7298a, 0x66a61e, 0xe6ab02, 0xa6761d, 0x666666,
];
const PAIRED: &[u32] = &[
    0xa6cee3, 0x1f78b4, 0xb2df8a, 0x33a02c, 0xfb9a99, 0xe31a1c, 0xfdbf6f, 0xff7f00, 0xcab2d6,
    0x6a3d9a, 0xffff99, 0xb15928,
];
const SET2: &[u32] = &[
    0x66c2a5, 0xfc8d62, 0x8da0cb, 0xe78ac3, 0xa6d854, 0xffd92f, 0xe5c494, 0xb3b3b3,
];
const SET3: &[u32] = &[
    0x8dd3c7, 0xffffb3, 0xbebada, 0xfb8072, 0x80b1d3, 0xfdb462, 0xb3de69, 0xfccde5, 0xd9d9d9,
    0xbc80bd, 0xccebc5, 0xffed6f,
];

/// Built-in categorical palettes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ColorScheme {
    /// The default chart palette.
    #[default]
    Nivo,
    /// d3's `schemeCategory10`.
    Category10,
    /// ColorBrewer Accent.
    Accent,
    /// ColorBrewer Dark2.
    Dark2,
    /// ColorBrewer Paired.
    Paired,
    /// ColorBrewer Set2.
    Set2,
    /// ColorBrewer Set3.
    Set3,
}

impl ColorScheme {
    /// Returns the palette colors in order.
    pub fn colors(self) -> Vec<Color> {
        let hex = match self {
            Self::Nivo => NIVO,
            Self::Category10 => CATEGORY10,
            Self::Accent => ACCENT,
            Self::Dark2 => DARK2,
            Self::Paired => PAIRED,
            Self::Set2 => SET2,
            Self::Set3 => SET3,
        };
        hex.iter().map(|&rgb| rgb_hex(rgb)).collect()
    }
}

fn rgb_hex(rgb: u32) -> Color {
    let [_, r, g, b] = rgb.to_be_bytes();
    Color::from_rgb8(r, g, b)
}

/// Formats a color as `#rrggbb`, or `#rrggbbaa` when it is not opaque.
pub fn to_hex(color: Color) -> String {
    let rgba = color.to_rgba8();
    if rgba.a == 255 {
        format!("#{:02x}{:02x}{:02x}", rgba.r, rgba.g, rgba.b)
    } else {
        format!("#{:02x}{:02x}{:02x}{:02x}", rgba.r, rgba.g, rgba.b, rgba.a)
    }
}

/// Fill color specification for treemap nodes.
#[derive(Clone)]
pub enum Colors {
    /// A built-in palette, indexed by the `color_by` key.
    Scheme(ColorScheme),
    /// A custom palette, indexed by the `color_by` key.
    List(Vec<Color>),
    /// The same color for every node.
    Fixed(Color),
    /// A function of the node datum (the record plus its `depth`).
    Custom(Arc<dyn Fn(&Value) -> Option<Color>>),
}

impl Default for Colors {
    fn default() -> Self {
        Self::Scheme(ColorScheme::Nivo)
    }
}

impl core::fmt::Debug for Colors {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Scheme(s) => f.debug_tuple("Scheme").field(s).finish(),
            Self::List(l) => f.debug_tuple("List").field(l).finish(),
            Self::Fixed(c) => f.debug_tuple("Fixed").field(c).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl PartialEq for Colors {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Scheme(a), Self::Scheme(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Fixed(a), Self::Fixed(b)) => a == b,
            (Self::Custom(a), Self::Custom(b)) => {
                core::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }
}

impl Colors {
    /// Creates a custom color function.
    pub fn custom(f: impl Fn(&Value) -> Option<Color> + 'static) -> Self {
        Self::Custom(Arc::new(f))
    }
}

/// Maps node data to a fill color.
///
/// Palette colors are assigned to `color_by` keys in first-seen order and cycle once the palette
/// is exhausted, so a given key keeps its color for the lifetime of the scale. A datum with no
/// key is treated as the key `"undefined"`.
///
/// The key map only grows: every key the scale has seen is remembered until the scale is
/// dropped. [`TreeMap`](crate::TreeMap) keeps one scale per `(colors, color_by)` pair, so a
/// high-cardinality key such as `id` accumulates entries across data updates until either
/// setting changes.
#[derive(Debug)]
pub struct OrdinalColorScale {
    colors: Colors,
    palette: Vec<Color>,
    color_by: Accessor,
    domain: RefCell<HashMap<String, usize>>,
}

impl OrdinalColorScale {
    /// Creates a scale from a color spec and the accessor selecting the ordinal key.
    pub fn new(colors: Colors, color_by: Accessor) -> Self {
        let palette = match &colors {
            Colors::Scheme(scheme) => scheme.colors(),
            Colors::List(list) => list.clone(),
            Colors::Fixed(_) | Colors::Custom(_) => Vec::new(),
        };
        Self {
            colors,
            palette,
            color_by,
            domain: RefCell::new(HashMap::new()),
        }
    }

    /// Returns the color for a node datum.
    pub fn color(&self, datum: &Value) -> Option<Color> {
        match &self.colors {
            Colors::Fixed(c) => Some(*c),
            Colors::Custom(f) => f(datum),
            Colors::Scheme(_) | Colors::List(_) => {
                if self.palette.is_empty() {
                    return None;
                }
                let key = self
                    .color_by
                    .get(datum)
                    .map_or_else(|| String::from("undefined"), |v| value_to_string(&v));
                let mut domain = self.domain.borrow_mut();
                let next = domain.len();
                let index = *domain.entry(key).or_insert(next);
                Some(self.palette[index % self.palette.len()])
            }
        }
    }

    /// Number of distinct keys assigned a palette color so far.
    pub fn domain_len(&self) -> usize {
        self.domain.borrow().len()
    }
}

/// Named colors provided by the chart theme.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Theme {
    /// Chart background.
    pub background: Color,
    /// Default text color.
    pub text_color: Color,
    /// Label text color.
    pub label_text_color: Color,
}

impl Default for Theme {
    fn default() -> Self {
        let text = Color::from_rgb8(0x33, 0x33, 0x33);
        Self {
            background: Color::TRANSPARENT,
            text_color: text,
            label_text_color: text,
        }
    }
}

/// A reference to one of the [`Theme`] colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ThemeColor {
    /// [`Theme::background`].
    Background,
    /// [`Theme::text_color`].
    Text,
    /// [`Theme::label_text_color`].
    LabelText,
}

impl ThemeColor {
    fn resolve(self, theme: &Theme) -> Color {
        match self {
            Self::Background => theme.background,
            Self::Text => theme.text_color,
            Self::LabelText => theme.label_text_color,
        }
    }
}

/// Adjustment applied to an inherited node color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColorModifier {
    /// Darken by `k` steps (each step scales channels by 0.7).
    Darker(f64),
    /// Brighten by `k` steps (each step scales channels by 1/0.7).
    Brighter(f64),
    /// Replace the alpha channel.
    Opacity(f64),
}

const DARKER: f64 = 0.7;

impl ColorModifier {
    /// Applies this modifier to `color`.
    pub fn apply(self, color: Color) -> Color {
        match self {
            Self::Darker(k) => scale_rgb(color, DARKER.powf(k)),
            Self::Brighter(k) => scale_rgb(color, (1.0 / DARKER).powf(k)),
            #[allow(clippy::cast_possible_truncation, reason = "alpha is clamped to 0..=1")]
            Self::Opacity(a) => color.with_alpha(a.clamp(0.0, 1.0) as f32),
        }
    }
}

#[allow(clippy::cast_possible_truncation, reason = "channels are clamped to 0..=255")]
fn scale_rgb(color: Color, factor: f64) -> Color {
    let rgba = color.to_rgba8();
    let channel = |c: u8| (f64::from(c) * factor).round().clamp(0.0, 255.0) as u8;
    Color::from_rgba8(channel(rgba.r), channel(rgba.g), channel(rgba.b), rgba.a)
}

/// Specification of a color derived from a node (borders, label text).
#[derive(Clone)]
pub enum InheritedColor {
    /// A constant color.
    Fixed(Color),
    /// The node's fill color with modifiers applied in order.
    FromNode(Vec<ColorModifier>),
    /// A theme color.
    Theme(ThemeColor),
    /// A function of the node's fill color and record.
    Custom(Arc<dyn Fn(Option<Color>, &Value) -> Option<Color>>),
}

impl core::fmt::Debug for InheritedColor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Fixed(c) => f.debug_tuple("Fixed").field(c).finish(),
            Self::FromNode(m) => f.debug_tuple("FromNode").field(m).finish(),
            Self::Theme(t) => f.debug_tuple("Theme").field(t).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl PartialEq for InheritedColor {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Fixed(a), Self::Fixed(b)) => a == b,
            (Self::FromNode(a), Self::FromNode(b)) => a == b,
            (Self::Theme(a), Self::Theme(b)) => a == b,
            (Self::Custom(a), Self::Custom(b)) => {
                core::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }
}

impl InheritedColor {
    /// The node color, unmodified.
    pub fn inherit() -> Self {
        Self::FromNode(Vec::new())
    }

    /// The node color darkened by `k` steps.
    pub fn darker(k: f64) -> Self {
        Self::FromNode(alloc::vec![ColorModifier::Darker(k)])
    }

    /// The node color brightened by `k` steps.
    pub fn brighter(k: f64) -> Self {
        Self::FromNode(alloc::vec![ColorModifier::Brighter(k)])
    }

    /// Creates a custom color function.
    pub fn custom(f: impl Fn(Option<Color>, &Value) -> Option<Color> + 'static) -> Self {
        Self::Custom(Arc::new(f))
    }
}

/// Resolves an [`InheritedColor`] against a theme.
#[derive(Clone, Debug, PartialEq)]
pub struct InheritedColorGenerator {
    spec: InheritedColor,
    theme: Theme,
}

impl InheritedColorGenerator {
    /// Creates a generator.
    pub fn new(spec: InheritedColor, theme: Theme) -> Self {
        Self { spec, theme }
    }

    /// Returns the derived color for a node with fill `node_color` and record `datum`.
    ///
    /// Inheriting from an undefined node color yields `None`.
    pub fn color(&self, node_color: Option<Color>, datum: &Value) -> Option<Color> {
        match &self.spec {
            InheritedColor::Fixed(c) => Some(*c),
            InheritedColor::FromNode(modifiers) => {
                node_color.map(|c| modifiers.iter().fold(c, |c, m| m.apply(c)))
            }
            InheritedColor::Theme(t) => Some(t.resolve(&self.theme)),
            InheritedColor::Custom(f) => f(node_color, datum),
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use serde_json::json;

    use super::*;

    #[test]
    fn ordinal_scale_assigns_in_first_seen_order_and_cycles() {
        let scale = OrdinalColorScale::new(
            Colors::List(alloc::vec![
                Color::from_rgb8(255, 0, 0),
                Color::from_rgb8(0, 255, 0),
            ]),
            Accessor::field("depth"),
        );
        let d2 = scale.color(&json!({ "depth": 2 }));
        let d0 = scale.color(&json!({ "depth": 0 }));
        let d1 = scale.color(&json!({ "depth": 1 }));
        assert_eq!(d2, Some(Color::from_rgb8(255, 0, 0)));
        assert_eq!(d0, Some(Color::from_rgb8(0, 255, 0)));
        assert_eq!(d1, d2);
        assert_eq!(scale.color(&json!({ "depth": 2 })), d2);
    }

    #[test]
    fn ordinal_domain_remembers_every_key() {
        let scale = OrdinalColorScale::new(Colors::default(), Accessor::field("id"));
        for id in 0..100 {
            scale.color(&json!({ "id": id }));
        }
        assert_eq!(scale.domain_len(), 100);
        scale.color(&json!({ "id": 7 }));
        scale.color(&json!({}));
        assert_eq!(scale.domain_len(), 101);
    }

    #[test]
    fn scheme_fixed_and_custom_colors() {
        let scheme = OrdinalColorScale::new(Colors::default(), Accessor::field("depth"));
        assert_eq!(
            scheme.color(&json!({ "depth": 0 })).map(to_hex).as_deref(),
            Some("#e8c1a0")
        );

        let red = Color::from_rgb8(255, 0, 0);
        let fixed = OrdinalColorScale::new(Colors::Fixed(red), Accessor::field("depth"));
        assert_eq!(fixed.color(&json!({})), Some(red));

        let custom = OrdinalColorScale::new(Colors::custom(|_| None), Accessor::field("depth"));
        assert_eq!(custom.color(&json!({ "depth": 0 })), None);

        let empty = OrdinalColorScale::new(Colors::List(Vec::new()), Accessor::field("depth"));
        assert_eq!(empty.color(&json!({ "depth": 0 })), None);
    }

    #[test]
    fn darker_and_brighter_follow_d3_steps() {
        let c = Color::from_rgb8(100, 200, 50);
        assert_eq!(to_hex(ColorModifier::Darker(1.0).apply(c)), "#468c23");
        assert_eq!(to_hex(ColorModifier::Brighter(1.0).apply(c)), "#8fff47");
        assert_eq!(ColorModifier::Darker(0.0).apply(c), c);
    }

    #[test]
    fn inherited_generator_variants() {
        let theme = Theme::default();
        let fill = Some(Color::from_rgb8(100, 200, 50));
        let datum = json!({});

        let from_node = InheritedColorGenerator::new(InheritedColor::darker(1.0), theme);
        assert_eq!(from_node.color(fill, &datum).map(to_hex).as_deref(), Some("#468c23"));
        assert_eq!(from_node.color(None, &datum), None);

        let themed = InheritedColorGenerator::new(InheritedColor::Theme(ThemeColor::Text), theme);
        assert_eq!(themed.color(None, &datum), Some(theme.text_color));

        let inherit = InheritedColorGenerator::new(InheritedColor::inherit(), theme);
        assert_eq!(inherit.color(fill, &datum), fill);
    }

    #[test]
    fn hex_formatting() {
        assert_eq!(to_hex(Color::from_rgb8(1, 2, 255)), "#0102ff");
        assert_eq!(to_hex(Color::from_rgba8(1, 2, 255, 128)), "#0102ff80");
    }
}
