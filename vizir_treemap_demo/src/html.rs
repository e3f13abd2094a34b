// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! HTML output: one absolutely positioned box per node.

use std::fmt::Write as _;

use vizir_treemap::{RendererProps, to_hex};

use crate::svg::escape_xml;

pub(crate) fn render(props: &RendererProps) -> String {
    let dims = props.dimensions;
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<div style="position:relative;width:{}px;height:{}px">"#,
        dims.outer.width, dims.outer.height
    );
    for node in props.nodes.iter() {
        let _ = write!(
            out,
            r#"<div title="{}" style="position:absolute;box-sizing:border-box;left:{}px;top:{}px;width:{}px;height:{}px"#,
            escape_xml(&node.path),
            node.x + dims.margin.left,
            node.y + dims.margin.top,
            node.width,
            node.height
        );
        if let Some(color) = node.color {
            let _ = write!(out, ";background:{}", to_hex(color));
        }
        if let Some(border) = node.border_color {
            let _ = write!(out, ";border:1px solid {}", to_hex(border));
        }
        if let Some(color) = node.label_text_color {
            let _ = write!(out, ";color:{}", to_hex(color));
        }
        out.push_str(r#"">"#);
        if let Some(label) = &node.label {
            out.push_str(&escape_xml(label));
        }
        out.push_str("</div>\n");
    }
    out.push_str("</div>\n");
    out
}

/// Wraps rendered sections into a standalone page.
pub(crate) fn render_report(title: &str, sections: &[(&str, String)]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>{0}</title></head>\n<body style=\"font-family:sans-serif;font-size:11px\">\n<h1>{0}</h1>",
        escape_xml(title)
    );
    for (heading, body) in sections {
        let _ = writeln!(out, "<h2>{}</h2>\n{body}", escape_xml(heading));
    }
    out.push_str("</body></html>\n");
    out
}
