// Copyright 2025 the VizIR Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Treemap demos for `vizir_treemap`.
//!
//! Writes `vizir_treemap_demo.svg` and `vizir_treemap_demo.html`, and prints a character raster
//! of the canvas output. Set `RUST_LOG=vizir_treemap=trace` to watch stage recomputation.

mod canvas;
mod html;
mod svg;

use std::sync::Arc;

use peniko::Color;
use serde_json::{Value, json};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};
use vizir_treemap::{
    ColorModifier, ColorScheme, Colors, DefColor, FillDef, FillRule, GradientStop,
    InheritedColor, LabelFormat, Margin, Renderer, TileMethod, TreeMap, TreeMapProps,
};

fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(filter);
    tracing_subscriber::registry().with(fmt_layer).init();
}

fn sample_data() -> Value {
    json!({
        "name": "vizir",
        "children": [
            { "name": "core", "children": [
                { "name": "scene", "loc": 1840 },
                { "name": "marks", "loc": 1210 },
                { "name": "diff", "loc": 640 },
                { "name": "table", "loc": 420 },
            ] },
            { "name": "charts", "children": [
                { "name": "axis", "loc": 980 },
                { "name": "legend", "loc": 760 },
                { "name": "scale", "loc": 1530 },
                { "name": "stack", "children": [
                    { "name": "bar", "loc": 310 },
                    { "name": "area", "loc": 290 },
                ] },
            ] },
            { "name": "text", "children": [
                { "name": "parley", "loc": 530 },
                { "name": "web", "loc": 270 },
            ] },
            { "name": "transforms", "loc": 1120 },
            { "name": "treemap", "loc": 1460 },
        ]
    })
}

fn base_props(data: Arc<Value>) -> TreeMapProps {
    TreeMapProps::new(data)
        .with_size(640.0, 400.0)
        .with_margin(Margin::uniform(10.0))
        .with_identity("name")
        .with_value("loc")
        .with_colors(Colors::Scheme(ColorScheme::Set2))
        .with_leaves_only(true)
        .with_inner_padding(2.0)
        .with_outer_padding(4.0)
        .with_label_skip_size(12.0)
        .with_label_text_color(InheritedColor::FromNode(vec![ColorModifier::Darker(2.0)]))
}

fn main() {
    setup_logging();
    let data = Arc::new(sample_data());

    let defs = vec![
        FillDef::linear_gradient(
            "fade",
            vec![
                GradientStop::new(0.0, DefColor::inherit()),
                GradientStop::new(1.0, DefColor::inherit()).with_opacity(0.4),
            ],
        ),
        FillDef::lines("stripes")
            .with_background(DefColor::inherit())
            .with_color(Color::from_rgba8(255, 255, 255, 96)),
    ];
    let fill = vec![
        FillRule::data("stripes", json!({ "name": "treemap" })),
        FillRule::func("fade", |node| node.depth > 2),
    ];

    let mut sections = Vec::new();

    let mut svg_map = TreeMap::new(Renderer::Svg);
    let svg_props = base_props(data.clone())
        .with_defs(defs)
        .with_fill(fill)
        .with_label_format(LabelFormat::custom(|v| {
            vizir_treemap::value_to_string(v).to_uppercase()
        }));
    let svg_out = svg_map.update(&svg_props).expect("sample data is valid");
    let svg_doc = svg::render(&svg_out);
    std::fs::write("vizir_treemap_demo.svg", &svg_doc).expect("write vizir_treemap_demo.svg");
    log::info!("wrote vizir_treemap_demo.svg ({} nodes)", svg_out.nodes.len());
    sections.push(("SVG, squarify, gradient and pattern fills", svg_doc));

    let mut html_map = TreeMap::new(Renderer::Html);
    for tile in [TileMethod::SliceDice, TileMethod::Binary] {
        let props = base_props(data.clone())
            .with_tile(tile)
            .with_leaves_only(false)
            .with_label("loc")
            .with_label_format(LabelFormat::number(".2s").expect("valid format"));
        let out = html_map.update(&props).expect("sample data is valid");
        sections.push((
            match tile {
                TileMethod::SliceDice => "HTML, slice-dice, all nodes",
                _ => "HTML, binary, all nodes",
            },
            html::render(&out),
        ));
    }
    for (stage, generation) in html_map.generations() {
        log::info!("html stage {stage}: computed {generation} time(s)");
    }

    let report = html::render_report("VizIR treemap demo", &sections);
    std::fs::write("vizir_treemap_demo.html", report).expect("write vizir_treemap_demo.html");
    log::info!("wrote vizir_treemap_demo.html");

    let mut canvas_map = TreeMap::new(Renderer::Canvas);
    let props = base_props(data).with_margin(Margin::default());
    let first = canvas_map.update(&props).expect("sample data is valid");
    let second = canvas_map.update(&props).expect("sample data is valid");
    log::info!(
        "canvas update reused cached nodes: {}",
        Arc::ptr_eq(&first.nodes, &second.nodes)
    );
    println!("{}", canvas::render(&second, 64, 20));
}
