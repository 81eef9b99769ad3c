/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! SVG render packet for a [`TopologyLayout`].

use crate::layout::{PositionedNode, TopologyEdge, TopologyLayout};

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const MASTER_STROKE: &str = "#c41e1e";
const WORKER_STROKE: &str = "#ffffff";
const NODE_FILL: &str = "rgba(255,255,255,0.08)";

#[derive(Debug, Clone, Default)]
pub struct SvgOptions<'a> {
    /// Node drawn with the `highlight` class.
    pub highlighted: Option<&'a str>,
    /// Emit explicit `width`/`height` and a solid backdrop, for files that
    /// are viewed outside the app.
    pub standalone: bool,
}

/// Escape text for use in SVG character data and attribute values.
pub fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            other => escaped.push(other),
        }
    }
    escaped
}

pub fn render_svg(layout: &TopologyLayout, options: &SvgOptions<'_>) -> String {
    let width = layout.size.width;
    let height = layout.size.height;
    let mut svg = String::new();

    svg.push_str(&format!(
        "<svg xmlns=\"{SVG_NS}\" viewBox=\"0 0 {width} {height}\" preserveAspectRatio=\"xMidYMid meet\""
    ));
    if options.standalone {
        svg.push_str(&format!(" width=\"{width}\" height=\"{height}\""));
    }
    svg.push('>');
    svg.push_str(concat!(
        "<defs><marker id=\"arrow\" markerUnits=\"strokeWidth\" markerWidth=\"10\" ",
        "markerHeight=\"10\" refX=\"8\" refY=\"4\" orient=\"auto\">",
        "<path d=\"M0,0 L0,8 L10,4 z\" fill=\"#ffffff\"/></marker></defs>"
    ));
    if options.standalone {
        svg.push_str(&format!(
            "<rect x=\"0\" y=\"0\" width=\"{width}\" height=\"{height}\" fill=\"#000\"/>"
        ));
    }

    for master in &layout.masters {
        push_node(&mut svg, master, options.highlighted);
    }
    // Each join link follows its worker so it stays paired in document order.
    let mut joins = layout.join_edges();
    for worker in &layout.workers {
        push_node(&mut svg, worker, options.highlighted);
        if let Some(edge) = joins.next() {
            push_join(&mut svg, edge);
        }
    }
    for edge in layout.ring_edges() {
        svg.push_str(&format!(
            "<path class=\"topo-link master-link\" d=\"{}\" stroke=\"{MASTER_STROKE}\" stroke-width=\"2\" fill=\"none\"/>",
            edge.path.to_path_data()
        ));
    }

    svg.push_str("</svg>");
    svg
}

fn push_node(svg: &mut String, node: &PositionedNode, highlighted: Option<&str>) {
    let master = node.role.is_master();
    let class = if highlighted == Some(node.name.as_str()) {
        "topo-node highlight"
    } else {
        "topo-node"
    };
    let (stroke, stroke_width, radius) = if master {
        (MASTER_STROKE, "2", 8)
    } else {
        (WORKER_STROKE, "1.6", 6)
    };
    let (title_size, subtitle_size, title_dy) = if master { (16, 13, -6.0) } else { (14, 12, -4.0) };
    let name = escape_xml(&node.name);
    let rect = node.rect;
    let cx = node.center.x;
    let cy = node.center.y;

    svg.push_str(&format!(
        "<g class=\"{class}\" data-name=\"{name}\" data-ip=\"{}\" data-role=\"{}\">",
        escape_xml(&node.address),
        node.role.as_str()
    ));
    svg.push_str(&format!(
        "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{NODE_FILL}\" stroke=\"{stroke}\" stroke-width=\"{stroke_width}\" rx=\"{radius}\" ry=\"{radius}\"/>",
        rect.origin.x, rect.origin.y, rect.size.width, rect.size.height
    ));
    svg.push_str(&format!(
        "<text x=\"{cx}\" y=\"{}\" fill=\"#ffffff\" font-size=\"{title_size}\"{} text-anchor=\"middle\" dominant-baseline=\"middle\">{name}</text>",
        cy + title_dy,
        if master { " font-weight=\"700\"" } else { "" }
    ));
    svg.push_str(&format!(
        "<text x=\"{cx}\" y=\"{}\" fill=\"#ddd\" font-size=\"{subtitle_size}\" text-anchor=\"middle\" dominant-baseline=\"middle\">{}</text>",
        cy + 12.0,
        escape_xml(&node.subtitle())
    ));
    svg.push_str("</g>");
}

fn push_join(svg: &mut String, edge: &TopologyEdge) {
    svg.push_str(&format!(
        "<path class=\"topo-link join-link\" d=\"{}\" fill=\"none\" stroke=\"#ffffff\" stroke-width=\"1.8\" stroke-linecap=\"round\" marker-end=\"url(#arrow)\"/>",
        edge.path.to_path_data()
    ));
}
