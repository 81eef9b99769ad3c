/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Framework-agnostic topology canvas.
//!
//! - [`layout`]: pure tier layout and link geometry from an inventory.
//! - [`interaction`]: hit testing and click/double-click/hover mapping.
//! - [`overlay`]: viewport placement for the inline editor and info popup.
//! - [`svg`]: render packet for the layout.

pub mod interaction;
pub mod layout;
pub mod overlay;
pub mod svg;

pub use interaction::{CanvasAction, CanvasInput, CanvasInteraction, hit_test};
pub use layout::{
    CubicPath, EdgeKind, PositionedNode, TopologyEdge, TopologyLayout, derive_layout,
    layout_inventory,
};
pub use overlay::{EditorPlacement, EditorSide, InfoPlacement, SurfaceTransform};
pub use svg::{SvgOptions, render_svg};
