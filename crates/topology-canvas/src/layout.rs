/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Two-tier topology layout.
//!
//! Masters sit on the top tier, workers on the bottom tier. Each worker gets
//! a directed S-curve to the primordial master; adjacent masters are joined
//! by a shallow ring link. The result is plain geometry in diagram space and
//! knows nothing about how it is drawn.

use clustershell_core::{InventoryStore, NodeRecord, NodeRole};
use euclid::default::{Point2D, Rect, Size2D};
use serde::{Deserialize, Serialize};

pub const MASTER_BOX: Size2D<f32> = Size2D::new(220.0, 58.0);
pub const WORKER_BOX: Size2D<f32> = Size2D::new(200.0, 46.0);
/// Minimum horizontal gap between boxes of the same tier.
pub const TIER_GAP: f32 = 50.0;
pub const MIN_HEIGHT: f32 = 240.0;
/// Vertical space reserved per node when sizing the canvas.
pub const ROW_PITCH: f32 = 40.0;
/// Distance of each tier's centre line from the nearest canvas edge.
pub const TIER_INSET: f32 = 60.0;

/// Worker links land this far below the master tier's centre line.
const MASTER_ANCHOR_DROP: f32 = 20.0;
/// Ring links start this far below the master tier's centre line.
const RING_DROP: f32 = 30.0;
/// Ring link control points sit this far below the ring endpoints.
const RING_SAG: f32 = 36.0;

/// Canvas width a tier of `count` boxes of `box_width` asks for.
pub fn min_tier_width(count: usize, box_width: f32) -> f32 {
    count as f32 * (box_width + TIER_GAP) + TIER_GAP
}

/// Horizontal centre of slot `index` in a tier of `count` slots.
pub fn slot_x(index: usize, count: usize, width: f32) -> f32 {
    let count = count.max(1);
    ((index + 1) as f32 * (width / (count + 1) as f32)).round()
}

/// A node placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedNode {
    pub name: String,
    pub address: String,
    pub role: NodeRole,
    /// Index into the inventory's display order.
    pub inventory_index: usize,
    pub center: Point2D<f32>,
    pub rect: Rect<f32>,
}

impl PositionedNode {
    pub fn subtitle(&self) -> String {
        format!("{} \u{2022} {}", self.address, self.role.label())
    }
}

/// A cubic bezier in diagram space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CubicPath {
    pub from: Point2D<f32>,
    pub ctrl1: Point2D<f32>,
    pub ctrl2: Point2D<f32>,
    pub to: Point2D<f32>,
}

impl CubicPath {
    /// SVG path data: `M x y C x y x y x y`.
    pub fn to_path_data(&self) -> String {
        format!(
            "M {} {} C {} {} {} {} {} {}",
            self.from.x,
            self.from.y,
            self.ctrl1.x,
            self.ctrl1.y,
            self.ctrl2.x,
            self.ctrl2.y,
            self.to.x,
            self.to.y
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeKind {
    /// Directed link from a worker to the master it joins through.
    Join { worker: String, master: Option<String> },
    /// Undirected link between two masters adjacent in display order.
    MasterRing { left: String, right: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyEdge {
    pub kind: EdgeKind,
    pub path: CubicPath,
}

impl TopologyEdge {
    pub fn is_directed(&self) -> bool {
        matches!(self.kind, EdgeKind::Join { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyLayout {
    pub size: Size2D<f32>,
    pub masters: Vec<PositionedNode>,
    pub workers: Vec<PositionedNode>,
    pub edges: Vec<TopologyEdge>,
    /// Centre of the master the join links converge on. When no master
    /// exists this is the reserved first master slot.
    pub join_anchor: Point2D<f32>,
}

impl TopologyLayout {
    pub fn top_tier_y(&self) -> f32 {
        TIER_INSET
    }

    pub fn bottom_tier_y(&self) -> f32 {
        self.size.height - TIER_INSET
    }

    /// All placed nodes, masters first.
    pub fn nodes(&self) -> impl Iterator<Item = &PositionedNode> {
        self.masters.iter().chain(self.workers.iter())
    }

    pub fn node(&self, name: &str) -> Option<&PositionedNode> {
        self.nodes().find(|node| node.name == name)
    }

    pub fn join_edges(&self) -> impl Iterator<Item = &TopologyEdge> {
        self.edges.iter().filter(|edge| edge.is_directed())
    }

    pub fn ring_edges(&self) -> impl Iterator<Item = &TopologyEdge> {
        self.edges.iter().filter(|edge| !edge.is_directed())
    }
}

/// Lay out `nodes` inside a container of `container` pixels.
///
/// `primordial` is the explicit primordial reference; when it does not name
/// a master the first master is used instead.
pub fn derive_layout(
    nodes: &[NodeRecord],
    primordial: Option<&str>,
    container: Size2D<f32>,
) -> TopologyLayout {
    let master_records: Vec<(usize, &NodeRecord)> = nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.is_master())
        .collect();
    let worker_records: Vec<(usize, &NodeRecord)> = nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| !node.is_master())
        .collect();

    let width = container
        .width
        .max(min_tier_width(master_records.len().max(1), MASTER_BOX.width))
        .max(if worker_records.is_empty() {
            0.0
        } else {
            min_tier_width(worker_records.len(), WORKER_BOX.width)
        });
    let height = MIN_HEIGHT.max((nodes.len() + 1) as f32 * ROW_PITCH);
    let top_y = TIER_INSET;
    let bottom_y = height - TIER_INSET;

    let place = |tier: &[(usize, &NodeRecord)], y: f32, size: Size2D<f32>| {
        tier.iter()
            .enumerate()
            .map(|(slot, (inventory_index, record))| {
                let center = Point2D::new(slot_x(slot, tier.len(), width), y);
                PositionedNode {
                    name: record.name.clone(),
                    address: record.address.clone(),
                    role: record.role,
                    inventory_index: *inventory_index,
                    center,
                    rect: Rect::new(
                        Point2D::new(center.x - size.width / 2.0, center.y - size.height / 2.0),
                        size,
                    ),
                }
            })
            .collect::<Vec<_>>()
    };
    let masters = place(&master_records, top_y, MASTER_BOX);
    let workers = place(&worker_records, bottom_y, WORKER_BOX);

    let root = primordial
        .and_then(|name| masters.iter().find(|node| node.name == name))
        .or_else(|| masters.first());
    let join_anchor = root
        .map(|node| node.center)
        .unwrap_or_else(|| Point2D::new(slot_x(0, 1, width), top_y));

    let mut edges = Vec::with_capacity(workers.len() + masters.len().saturating_sub(1));
    for worker in &workers {
        let from = Point2D::new(worker.center.x, worker.rect.min_y());
        let to = Point2D::new(join_anchor.x, top_y + MASTER_ANCHOR_DROP);
        let mid_y = (from.y + to.y) / 2.0;
        edges.push(TopologyEdge {
            kind: EdgeKind::Join {
                worker: worker.name.clone(),
                master: root.map(|node| node.name.clone()),
            },
            path: CubicPath {
                from,
                ctrl1: Point2D::new(from.x, mid_y),
                ctrl2: Point2D::new(to.x, mid_y),
                to,
            },
        });
    }
    for pair in masters.windows(2) {
        let y = top_y + RING_DROP;
        let (left, right) = (&pair[0], &pair[1]);
        edges.push(TopologyEdge {
            kind: EdgeKind::MasterRing {
                left: left.name.clone(),
                right: right.name.clone(),
            },
            path: CubicPath {
                from: Point2D::new(left.center.x, y),
                ctrl1: Point2D::new(left.center.x, y + RING_SAG),
                ctrl2: Point2D::new(right.center.x, y + RING_SAG),
                to: Point2D::new(right.center.x, y),
            },
        });
    }

    TopologyLayout {
        size: Size2D::new(width, height),
        masters,
        workers,
        edges,
        join_anchor,
    }
}

/// Convenience wrapper over [`derive_layout`] for a whole store.
pub fn layout_inventory(store: &InventoryStore, container: Size2D<f32>) -> TopologyLayout {
    derive_layout(store.nodes(), store.primordial(), container)
}
