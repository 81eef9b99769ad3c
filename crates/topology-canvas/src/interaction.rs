/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Pointer interaction over a laid-out topology: hit testing plus the
//! click / double-click / hover mapping. Points are in diagram space.

use euclid::default::Point2D;

use crate::layout::{PositionedNode, TopologyLayout};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanvasInput {
    PointerMoved(Point2D<f32>),
    PointerLeft,
    Click(Point2D<f32>),
    DoubleClick(Point2D<f32>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanvasAction {
    /// Show the transient info popup for a node.
    ShowInfo { name: String },
    /// Open the inline editor anchored to a node.
    OpenEditor { name: String },
    /// The highlighted node changed.
    HoverChanged { name: Option<String> },
}

/// Topmost node under `point`, if any. Workers are drawn after masters, so
/// they win on overlap.
pub fn hit_test(layout: &TopologyLayout, point: Point2D<f32>) -> Option<&PositionedNode> {
    layout
        .workers
        .iter()
        .rev()
        .chain(layout.masters.iter().rev())
        .find(|node| contains_inclusive(node, point))
}

fn contains_inclusive(node: &PositionedNode, point: Point2D<f32>) -> bool {
    let rect = node.rect;
    point.x >= rect.min_x() && point.x <= rect.max_x() && point.y >= rect.min_y() && point.y <= rect.max_y()
}

/// Hover state for one canvas.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanvasInteraction {
    hovered: Option<String>,
}

impl CanvasInteraction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    /// Forget hover state, e.g. after the layout was rebuilt without the
    /// hovered node.
    pub fn retain_in(&mut self, layout: &TopologyLayout) {
        if let Some(name) = &self.hovered
            && layout.node(name).is_none()
        {
            self.hovered = None;
        }
    }

    pub fn handle(&mut self, layout: &TopologyLayout, input: CanvasInput) -> Option<CanvasAction> {
        match input {
            CanvasInput::PointerMoved(point) => {
                let next = hit_test(layout, point).map(|node| node.name.clone());
                self.set_hovered(next)
            },
            CanvasInput::PointerLeft => self.set_hovered(None),
            CanvasInput::Click(point) => {
                hit_test(layout, point).map(|node| CanvasAction::ShowInfo {
                    name: node.name.clone(),
                })
            },
            CanvasInput::DoubleClick(point) => {
                hit_test(layout, point).map(|node| CanvasAction::OpenEditor {
                    name: node.name.clone(),
                })
            },
        }
    }

    fn set_hovered(&mut self, next: Option<String>) -> Option<CanvasAction> {
        if self.hovered == next {
            return None;
        }
        self.hovered = next.clone();
        Some(CanvasAction::HoverChanged { name: next })
    }
}
