/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Inline node editor overlay.
//!
//! The editor owns its input while open: keyboard events and pointer-downs
//! go to [`InlineEditor::handle`] first. It never touches the store itself;
//! a save hands back an [`EditSubmission`] for the app to apply.

use clustershell_core::{NodeRecord, NodeRole};
use euclid::default::Point2D;
use topology_canvas::EditorPlacement;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKey {
    Enter,
    Escape,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    SetName(String),
    SetAddress(String),
    ToggleRole,
    Key(EditorKey),
    /// Pointer pressed somewhere in the viewport.
    PointerDown(Point2D<f32>),
    SaveClicked,
    CancelClicked,
    CloseClicked,
}

/// Field values at the moment of saving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSubmission {
    /// Name of the node when the editor was opened.
    pub target: String,
    pub name: String,
    pub address: String,
    pub role: NodeRole,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorOutcome {
    /// Still open.
    Pending,
    Save(EditSubmission),
    Cancel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InlineEditor {
    target: String,
    name: String,
    address: String,
    role: NodeRole,
    placement: EditorPlacement,
}

impl InlineEditor {
    pub fn open(node: &NodeRecord, placement: EditorPlacement) -> Self {
        Self {
            target: node.name.clone(),
            name: node.name.clone(),
            address: node.address.clone(),
            role: node.role,
            placement,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn role(&self) -> NodeRole {
        self.role
    }

    pub fn role_label(&self) -> &'static str {
        match self.role {
            NodeRole::Master => "Master",
            NodeRole::Worker => "Worker",
        }
    }

    pub fn placement(&self) -> &EditorPlacement {
        &self.placement
    }

    pub fn contains(&self, point: Point2D<f32>) -> bool {
        let rect = self.placement.rect;
        point.x >= rect.min_x() && point.x <= rect.max_x() && point.y >= rect.min_y() && point.y <= rect.max_y()
    }

    pub fn handle(&mut self, event: EditorEvent) -> EditorOutcome {
        match event {
            EditorEvent::SetName(name) => self.name = name,
            EditorEvent::SetAddress(address) => self.address = address,
            EditorEvent::ToggleRole => self.role = self.role.toggled(),
            EditorEvent::Key(EditorKey::Enter) | EditorEvent::SaveClicked => {
                return EditorOutcome::Save(self.submission());
            },
            EditorEvent::Key(EditorKey::Escape)
            | EditorEvent::CancelClicked
            | EditorEvent::CloseClicked => return EditorOutcome::Cancel,
            EditorEvent::PointerDown(point) => {
                if !self.contains(point) {
                    return EditorOutcome::Cancel;
                }
            },
        }
        EditorOutcome::Pending
    }

    fn submission(&self) -> EditSubmission {
        EditSubmission {
            target: self.target.clone(),
            name: self.name.trim().to_string(),
            address: self.address.trim().to_string(),
            role: self.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use euclid::default::{Rect, Size2D};
    use rstest::rstest;
    use topology_canvas::EditorSide;

    fn editor() -> InlineEditor {
        InlineEditor::open(
            &NodeRecord::new("w1", "10.0.0.2", NodeRole::Worker),
            EditorPlacement {
                rect: Rect::new(Point2D::new(500.0, 100.0), Size2D::new(300.0, 200.0)),
                side: EditorSide::Right,
            },
        )
    }

    #[test]
    fn opens_prefilled() {
        let editor = editor();
        assert_eq!(editor.name(), "w1");
        assert_eq!(editor.address(), "10.0.0.2");
        assert_eq!(editor.role_label(), "Worker");
    }

    #[test]
    fn enter_saves_current_fields() {
        let mut editor = editor();
        assert_eq!(editor.handle(EditorEvent::SetName(" cp-2 ".into())), EditorOutcome::Pending);
        assert_eq!(editor.handle(EditorEvent::ToggleRole), EditorOutcome::Pending);
        assert_eq!(editor.role_label(), "Master");
        assert_eq!(
            editor.handle(EditorEvent::Key(EditorKey::Enter)),
            EditorOutcome::Save(EditSubmission {
                target: "w1".to_string(),
                name: "cp-2".to_string(),
                address: "10.0.0.2".to_string(),
                role: NodeRole::Master,
            })
        );
    }

    #[rstest]
    #[case(EditorEvent::Key(EditorKey::Escape))]
    #[case(EditorEvent::CancelClicked)]
    #[case(EditorEvent::CloseClicked)]
    #[case(EditorEvent::PointerDown(Point2D::new(10.0, 10.0)))]
    fn cancellation_paths(#[case] event: EditorEvent) {
        let mut editor = editor();
        editor.handle(EditorEvent::SetAddress("10.9.9.9".into()));
        assert_eq!(editor.handle(event), EditorOutcome::Cancel);
    }

    #[test]
    fn pointer_down_inside_keeps_editor_open() {
        let mut editor = editor();
        assert_eq!(
            editor.handle(EditorEvent::PointerDown(Point2D::new(650.0, 200.0))),
            EditorOutcome::Pending
        );
    }
}
