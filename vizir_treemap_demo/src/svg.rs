// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Minimal SVG output for `vizir_treemap_demo`.

use std::fmt::Write as _;

use peniko::Color;
use vizir_treemap::{DefColor, DefPaint, FillDef, PatternKind, RendererProps, to_hex};

pub(crate) fn render(props: &RendererProps) -> String {
    let dims = props.dimensions;
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
        dims.outer.width, dims.outer.height, dims.outer.width, dims.outer.height
    );

    if let Some(bound) = &props.defs
        && !bound.defs.is_empty()
    {
        out.push_str("<defs>\n");
        for def in &bound.defs {
            write_def(&mut out, def);
        }
        out.push_str("</defs>\n");
    }

    let _ = writeln!(
        out,
        r#"<g transform="translate({},{})">"#,
        dims.margin.left, dims.margin.top
    );
    for (i, node) in props.nodes.iter().enumerate() {
        let fill = props
            .defs
            .as_ref()
            .and_then(|d| d.fill_url(i))
            .or_else(|| node.color.map(to_hex))
            .unwrap_or_else(|| "none".to_string());
        let _ = write!(
            out,
            r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}""#,
            node.x, node.y, node.width, node.height, fill
        );
        if let Some(border) = node.border_color {
            let _ = write!(out, r#" stroke="{}" stroke-width="1""#, to_hex(border));
        }
        out.push_str("/>\n");

        if let Some(label) = &node.label {
            let _ = write!(
                out,
                r#"<text x="{}" y="{}" text-anchor="middle" dominant-baseline="central" font-size="11""#,
                node.x + node.width / 2.0,
                node.y + node.height / 2.0
            );
            if let Some(color) = node.label_text_color {
                let _ = write!(out, r#" fill="{}""#, to_hex(color));
            }
            let _ = writeln!(out, ">{}</text>", escape_xml(label));
        }
    }
    out.push_str("</g>\n</svg>\n");
    out
}

fn def_color(c: &DefColor) -> String {
    match c {
        DefColor::Fixed(color) => to_hex(*color),
        // Bound defs always carry resolved colors.
        DefColor::Inherit(_) => to_hex(Color::BLACK),
    }
}

fn write_def(out: &mut String, def: &FillDef) {
    let id = escape_xml(&def.id);
    match &def.paint {
        DefPaint::LinearGradient(stops) => {
            let _ = writeln!(out, r#"<linearGradient id="{id}">"#);
            for stop in stops {
                let _ = writeln!(
                    out,
                    r#"<stop offset="{}%" stop-color="{}" stop-opacity="{}"/>"#,
                    stop.offset * 100.0,
                    def_color(&stop.color),
                    stop.opacity
                );
            }
            out.push_str("</linearGradient>\n");
        }
        DefPaint::Pattern {
            kind,
            background,
            color,
        } => {
            let (bg, fg) = (def_color(background), def_color(color));
            match *kind {
                PatternKind::Dots {
                    size,
                    padding,
                    stagger,
                }
                | PatternKind::Squares {
                    size,
                    padding,
                    stagger,
                } => {
                    let full = if stagger {
                        (size + padding) * 2.0
                    } else {
                        size + padding
                    };
                    let _ = writeln!(
                        out,
                        r#"<pattern id="{id}" width="{full}" height="{full}" patternUnits="userSpaceOnUse">"#
                    );
                    let _ = writeln!(
                        out,
                        r#"<rect width="{full}" height="{full}" fill="{bg}"/>"#
                    );
                    let half = size / 2.0;
                    let mut origins = vec![(padding / 2.0, padding / 2.0)];
                    if stagger {
                        let o = padding * 1.5 + size;
                        origins.push((o, o));
                    }
                    for (x, y) in origins {
                        if matches!(kind, PatternKind::Dots { .. }) {
                            let _ = writeln!(
                                out,
                                r#"<circle cx="{}" cy="{}" r="{half}" fill="{fg}"/>"#,
                                x + half,
                                y + half
                            );
                        } else {
                            let _ = writeln!(
                                out,
                                r#"<rect x="{x}" y="{y}" width="{size}" height="{size}" fill="{fg}"/>"#
                            );
                        }
                    }
                    out.push_str("</pattern>\n");
                }
                PatternKind::Lines {
                    spacing,
                    rotation,
                    line_width,
                } => {
                    let _ = writeln!(
                        out,
                        r#"<pattern id="{id}" width="{spacing}" height="{spacing}" patternUnits="userSpaceOnUse" patternTransform="rotate({rotation})">"#
                    );
                    let _ = writeln!(
                        out,
                        r#"<rect width="{spacing}" height="{spacing}" fill="{bg}"/>"#
                    );
                    let _ = writeln!(
                        out,
                        r#"<line x1="0" y1="0" x2="0" y2="{spacing}" stroke="{fg}" stroke-width="{line_width}"/>"#
                    );
                    out.push_str("</pattern>\n");
                }
            }
        }
    }
}

pub(crate) fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
