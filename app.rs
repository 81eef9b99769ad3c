/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Application state for the cluster inventory shell.
//!
//! [`ClusterShellApp`] owns the inventory store and every transient surface
//! (toast, info popup, inline editor, pending confirmation, connection
//! rows). Synchronous user actions arrive as [`ShellIntent`]s; backend
//! round-trips are separate methods that borrow an [`InventoryGateway`].
//! Every mutation ends with a full re-layout of the diagram.

use std::path::Path;
use std::time::Instant;

use clustershell_comms::{InventoryGateway, SshCredentials};
use clustershell_core::{InventoryError, InventoryStore, NodeRecord, NodeRole};
use euclid::default::{Point2D, Rect, Size2D};
use topology_canvas::overlay::{editor_size, place_editor, place_info};
use topology_canvas::{
    CanvasAction, CanvasInput, CanvasInteraction, SurfaceTransform, SvgOptions, TopologyLayout,
    layout_inventory, render_svg,
};

use crate::connectivity::{BatchSummary, ConnectionBoard, ConnectionStatus};
use crate::editor::{EditSubmission, EditorEvent, EditorOutcome, InlineEditor};
use crate::notifications::{InfoPopup, ToastQueue};

pub const DEFAULT_CONTAINER: Size2D<f32> = Size2D::new(800.0, 400.0);
pub const DEFAULT_VIEWPORT: Size2D<f32> = Size2D::new(1280.0, 800.0);

/// Synchronous user actions.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellIntent {
    AddNode {
        name: String,
        address: String,
        role: NodeRole,
    },
    RemoveNode {
        index: usize,
    },
    SetPrimordial {
        name: String,
    },
    /// Ask to wipe the inventory; needs confirmation when it is not empty.
    RequestClear,
    DismissConfirmation,
    /// Pointer input over the diagram, in viewport coordinates.
    Canvas(CanvasInput),
    OpenEditor {
        name: String,
    },
    Editor(EditorEvent),
    Resize {
        container: Size2D<f32>,
        viewport: Size2D<f32>,
    },
    SetCredentials(SshCredentials),
}

/// Destructive action waiting for an explicit yes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingConfirmation {
    ClearInventory,
    /// Replace a non-empty local inventory with the backend's copy.
    DetectOverwrite,
}

impl PendingConfirmation {
    pub fn prompt(self) -> &'static str {
        match self {
            Self::ClearInventory => "Remove every node from the inventory?",
            Self::DetectOverwrite => {
                "Replace the current inventory with the one found on the backend?"
            },
        }
    }
}

/// How a master is marked in the node list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimordialMarker {
    /// Workers.
    None,
    /// The only master; primordial without a choice.
    Auto,
    /// One of several masters, rendered as an exclusive choice.
    Choice { selected: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeListRow {
    pub index: usize,
    pub name: String,
    pub address: String,
    pub role: NodeRole,
    pub primordial: PrimordialMarker,
    pub connection: ConnectionStatus,
}

#[derive(Debug)]
pub enum ExportError {
    Io(String),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "could not write topology: {e}"),
        }
    }
}

impl std::error::Error for ExportError {}

pub struct ClusterShellApp {
    store: InventoryStore,
    container: Size2D<f32>,
    viewport: Size2D<f32>,
    layout: TopologyLayout,
    interaction: CanvasInteraction,
    editor: Option<InlineEditor>,
    info: Option<InfoPopup>,
    toasts: ToastQueue,
    connections: ConnectionBoard,
    credentials: Option<SshCredentials>,
    pending_confirmation: Option<PendingConfirmation>,
    /// Set once the backend holds generated inventory files.
    inventory_exists: bool,
}

impl ClusterShellApp {
    pub fn new(container: Size2D<f32>, viewport: Size2D<f32>) -> Self {
        let store = InventoryStore::new();
        let layout = layout_inventory(&store, container);
        Self {
            store,
            container,
            viewport,
            layout,
            interaction: CanvasInteraction::new(),
            editor: None,
            info: None,
            toasts: ToastQueue::new(),
            connections: ConnectionBoard::new(),
            credentials: None,
            pending_confirmation: None,
            inventory_exists: false,
        }
    }

    pub fn new_for_testing() -> Self {
        Self::new(DEFAULT_CONTAINER, DEFAULT_VIEWPORT)
    }

    pub fn store(&self) -> &InventoryStore {
        &self.store
    }

    pub fn layout(&self) -> &TopologyLayout {
        &self.layout
    }

    pub fn viewport(&self) -> Size2D<f32> {
        self.viewport
    }

    pub fn editor(&self) -> Option<&InlineEditor> {
        self.editor.as_ref()
    }

    pub fn info_popup(&self) -> Option<&InfoPopup> {
        self.info.as_ref()
    }

    pub fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    pub fn toasts_mut(&mut self) -> &mut ToastQueue {
        &mut self.toasts
    }

    pub fn connections(&self) -> &ConnectionBoard {
        &self.connections
    }

    pub fn pending_confirmation(&self) -> Option<PendingConfirmation> {
        self.pending_confirmation
    }

    pub fn hovered(&self) -> Option<&str> {
        self.interaction.hovered()
    }

    pub fn inventory_exists(&self) -> bool {
        self.inventory_exists
    }

    /// Generation needs at least one master.
    pub fn generate_enabled(&self) -> bool {
        self.store.master_count() > 0
    }

    /// The deploy stage opens only after a full batch where every node passed.
    pub fn deploy_available(&self) -> bool {
        self.connections.all_pass()
    }

    /// Where the diagram is drawn: full container width, height following
    /// the diagram's aspect ratio.
    pub fn surface_transform(&self) -> SurfaceTransform {
        let diagram = self.layout.size;
        let height = if diagram.width > 0.0 {
            self.container.width * diagram.height / diagram.width
        } else {
            self.container.height
        };
        SurfaceTransform::new(
            Rect::new(Point2D::origin(), Size2D::new(self.container.width, height)),
            diagram,
        )
    }

    pub fn node_rows(&self) -> Vec<NodeListRow> {
        let multiple_masters = self.store.master_count() > 1;
        self.store
            .nodes()
            .iter()
            .enumerate()
            .map(|(index, node)| NodeListRow {
                index,
                name: node.name.clone(),
                address: node.address.clone(),
                role: node.role,
                primordial: match (node.role, multiple_masters) {
                    (NodeRole::Worker, _) => PrimordialMarker::None,
                    (NodeRole::Master, false) => PrimordialMarker::Auto,
                    (NodeRole::Master, true) => PrimordialMarker::Choice {
                        selected: self.store.primordial() == Some(node.name.as_str()),
                    },
                },
                connection: self.connections.status(&node.name),
            })
            .collect()
    }

    pub fn render_svg(&self) -> String {
        render_svg(
            &self.layout,
            &SvgOptions {
                highlighted: self.interaction.hovered(),
                standalone: false,
            },
        )
    }

    /// Write the diagram as a self-contained SVG file.
    pub fn export_svg(&self, path: &Path) -> Result<(), ExportError> {
        let svg = render_svg(
            &self.layout,
            &SvgOptions {
                highlighted: None,
                standalone: true,
            },
        );
        std::fs::write(path, svg).map_err(|e| ExportError::Io(e.to_string()))?;
        log::info!("exported topology to {}", path.display());
        Ok(())
    }

    /// Expire the toast and info popup.
    pub fn tick(&mut self, now: Instant) {
        self.toasts.tick(now);
        if self.info.as_ref().is_some_and(|info| info.is_expired(now)) {
            self.info = None;
        }
    }

    pub fn apply_intents<I>(&mut self, intents: I)
    where
        I: IntoIterator<Item = ShellIntent>,
    {
        for intent in intents {
            self.apply_intent(intent);
        }
    }

    fn apply_intent(&mut self, intent: ShellIntent) {
        match intent {
            ShellIntent::AddNode {
                name,
                address,
                role,
            } => self.add_node(&name, &address, role),
            ShellIntent::RemoveNode { index } => self.remove_node(index),
            ShellIntent::SetPrimordial { name } => self.set_primordial(&name),
            ShellIntent::RequestClear => {
                if self.store.is_empty() {
                    self.toasts.show("Inventory is already empty");
                } else {
                    self.pending_confirmation = Some(PendingConfirmation::ClearInventory);
                }
            },
            ShellIntent::DismissConfirmation => self.pending_confirmation = None,
            ShellIntent::Canvas(input) => self.handle_canvas_input(input),
            ShellIntent::OpenEditor { name } => self.open_editor(&name),
            ShellIntent::Editor(event) => self.handle_editor_event(event),
            ShellIntent::Resize {
                container,
                viewport,
            } => {
                self.container = container;
                self.viewport = viewport;
                // The overlay is anchored to the old geometry.
                self.editor = None;
                self.relayout();
            },
            ShellIntent::SetCredentials(credentials) => {
                self.toasts
                    .show(format!("SSH user set to {}", credentials.username));
                self.credentials = Some(credentials);
            },
        }
    }

    fn add_node(&mut self, name: &str, address: &str, role: NodeRole) {
        match self.store.add(name, address, role) {
            Ok(_) => {
                self.connections.forget(name.trim());
                self.toasts.show(format!("{} added", name.trim()));
                self.relayout();
            },
            Err(InventoryError::MissingField) => {
                self.toasts.show("Please fill out both VM name and IP.");
            },
            Err(error) => self.toasts.show(error.to_string()),
        }
    }

    fn remove_node(&mut self, index: usize) {
        match self.store.remove(index) {
            Ok(removed) => {
                self.connections.forget(&removed.name);
                if self.editor.as_ref().is_some_and(|e| e.target() == removed.name) {
                    self.editor = None;
                }
                self.toasts.show("Entry removed");
                self.relayout();
            },
            Err(error) => log::debug!("remove ignored: {error}"),
        }
    }

    fn set_primordial(&mut self, name: &str) {
        match self.store.get(name).map(NodeRecord::is_master) {
            Ok(true) => {
                self.store.set_primordial(name);
                self.toasts.show(format!("{name} set as primordial master"));
                self.relayout();
            },
            Ok(false) => self.toasts.show(format!("{name} is not a master")),
            Err(error) => self.toasts.show(error.to_string()),
        }
    }

    fn clear_inventory(&mut self) {
        self.store.clear();
        self.connections.invalidate();
        self.editor = None;
        self.info = None;
        self.toasts.show("Inventory cleared");
        self.relayout();
    }

    fn relayout(&mut self) {
        self.layout = layout_inventory(&self.store, self.container);
        self.interaction.retain_in(&self.layout);
        if self
            .info
            .as_ref()
            .is_some_and(|info| self.layout.node(&info.name).is_none())
        {
            self.info = None;
        }
    }

    fn handle_canvas_input(&mut self, input: CanvasInput) {
        // An open editor sees pointer-downs first; one outside it closes it
        // and the click still reaches the diagram.
        if let CanvasInput::Click(point) | CanvasInput::DoubleClick(point) = input
            && self.editor.is_some()
        {
            self.handle_editor_event(EditorEvent::PointerDown(point));
            if self.editor.is_some() {
                return;
            }
        }

        let transform = self.surface_transform();
        let diagram_input = match input {
            CanvasInput::PointerMoved(point) => {
                CanvasInput::PointerMoved(transform.to_diagram_point(point))
            },
            CanvasInput::PointerLeft => CanvasInput::PointerLeft,
            CanvasInput::Click(point) => CanvasInput::Click(transform.to_diagram_point(point)),
            CanvasInput::DoubleClick(point) => {
                CanvasInput::DoubleClick(transform.to_diagram_point(point))
            },
        };
        match self.interaction.handle(&self.layout, diagram_input) {
            Some(CanvasAction::ShowInfo { name }) => self.show_info(&name),
            Some(CanvasAction::OpenEditor { name }) => self.open_editor(&name),
            Some(CanvasAction::HoverChanged { .. }) | None => {},
        }
    }

    fn show_info(&mut self, name: &str) {
        let Some(node) = self.layout.node(name) else {
            return;
        };
        self.info = Some(InfoPopup::new(
            &node.name,
            &node.address,
            node.role,
            place_info(node.rect.min_y()),
        ));
    }

    fn open_editor(&mut self, name: &str) {
        let record: NodeRecord = match self.store.get(name) {
            Ok(record) => record.clone(),
            Err(InventoryError::UnknownNode(_)) => return,
            Err(error) => {
                self.toasts.show(error.to_string());
                return;
            },
        };
        let Some(node) = self.layout.node(name) else {
            return;
        };
        let transform = self.surface_transform();
        let anchor = transform.to_viewport_rect(node.rect);
        let size = editor_size(transform.surface.size, self.viewport.width);
        let viewport = Rect::new(Point2D::origin(), self.viewport);
        // Opening replaces whatever overlay was open before.
        self.editor = Some(InlineEditor::open(&record, place_editor(anchor, size, viewport)));
    }

    fn handle_editor_event(&mut self, event: EditorEvent) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        match editor.handle(event) {
            EditorOutcome::Pending => {},
            EditorOutcome::Cancel => self.editor = None,
            EditorOutcome::Save(submission) => self.save_edit(submission),
        }
    }

    fn save_edit(&mut self, submission: EditSubmission) {
        let EditSubmission {
            target,
            name,
            address,
            role,
        } = submission;
        match self.store.edit(&target, &name, &address, role) {
            Ok(()) => {
                self.editor = None;
                self.connections.forget(&target);
                self.connections.forget(&name);
                self.toasts.show("Node updated");
                self.relayout();
            },
            Err(InventoryError::MissingField) => {
                self.toasts.show("Name and IP cannot be empty");
            },
            Err(InventoryError::UnknownNode(_)) => self.editor = None,
            Err(error) => self.toasts.show(error.to_string()),
        }
    }

    /// Answer the pending confirmation with yes.
    pub fn confirm_pending<G: InventoryGateway>(&mut self, gateway: &G) {
        match self.pending_confirmation.take() {
            Some(PendingConfirmation::ClearInventory) => self.clear_inventory(),
            Some(PendingConfirmation::DetectOverwrite) => {
                self.run_detect(gateway);
            },
            None => {},
        }
    }

    /// Push the inventory to the backend.
    ///
    /// Names deleted locally are flushed with `delete-host` first; they are
    /// only forgotten once the generate call itself succeeded.
    pub fn generate_inventory<G: InventoryGateway>(&mut self, gateway: &G) -> bool {
        if !self.generate_enabled() {
            self.toasts.show("Add at least one master before generating.");
            return false;
        }

        let flushed: Vec<String> = self.store.pending_deletions().iter().cloned().collect();
        for name in &flushed {
            if let Err(error) = gateway.delete_host(name) {
                log::warn!("delete-host for {name} failed: {error}");
            }
        }

        let primordial = self
            .store
            .effective_primordial()
            .map(|node| node.name.clone());
        match gateway.generate(self.store.nodes(), primordial.as_deref()) {
            Ok(()) => {
                self.inventory_exists = true;
                self.connections.invalidate();
                self.store.settle_pending_deletions(&flushed);
                self.toasts.show("Inventory files generated!");
                true
            },
            Err(error) => {
                log::warn!("generate failed: {error}");
                self.toasts.show(error.user_message("Generation failed"));
                false
            },
        }
    }

    /// Load the backend's inventory. Asks for confirmation first when it
    /// would overwrite local nodes; returns whether the store was replaced.
    pub fn detect_inventory<G: InventoryGateway>(&mut self, gateway: &G) -> bool {
        if !self.store.is_empty() {
            self.pending_confirmation = Some(PendingConfirmation::DetectOverwrite);
            return false;
        }
        self.run_detect(gateway)
    }

    fn run_detect<G: InventoryGateway>(&mut self, gateway: &G) -> bool {
        match gateway.detect() {
            Ok(detected) => {
                let count = detected.nodes.len();
                self.store
                    .replace_all(detected.nodes, detected.primordial_master);
                self.inventory_exists = count > 0;
                self.connections.invalidate();
                self.editor = None;
                self.info = None;
                self.toasts.show(if count == 0 {
                    "No existing inventory found".to_string()
                } else {
                    format!("Loaded {count} nodes from existing inventory")
                });
                self.relayout();
                true
            },
            Err(error) => {
                log::warn!("detect-inventory failed: {error}");
                self.toasts
                    .show(error.user_message("Failed to detect existing inventory"));
                false
            },
        }
    }

    /// Probe one node. Does not touch the batch gate.
    pub fn test_connection<G: InventoryGateway>(
        &mut self,
        gateway: &G,
        name: &str,
    ) -> Option<ConnectionStatus> {
        let Some(credentials) = self.credentials.clone() else {
            self.toasts.show("Set SSH credentials before testing connections");
            return None;
        };
        let node = match self.store.get(name) {
            Ok(node) => node.clone(),
            Err(error) => {
                self.toasts.show(error.to_string());
                return None;
            },
        };
        self.connections.begin(&node.name);
        let result = gateway.test_ssh(&node, &credentials);
        Some(self.connections.record(&node.name, result).clone())
    }

    /// Retry a failed row. Identical to [`Self::test_connection`]; kept
    /// separate because only failed rows offer it.
    pub fn retry_connection<G: InventoryGateway>(
        &mut self,
        gateway: &G,
        name: &str,
    ) -> Option<ConnectionStatus> {
        if !self.connections.status(name).can_retry() {
            return None;
        }
        self.test_connection(gateway, name)
    }

    /// Probe every node in display order, one at a time. `observer` sees each
    /// row as it enters testing and again once it has a result.
    pub fn test_all_connections<G, F>(&mut self, gateway: &G, mut observer: F) -> Option<BatchSummary>
    where
        G: InventoryGateway,
        F: FnMut(&str, &ConnectionStatus),
    {
        let Some(credentials) = self.credentials.clone() else {
            self.toasts.show("Set SSH credentials before testing connections");
            return None;
        };
        if self.store.is_empty() {
            self.toasts.show("No nodes to test");
            return None;
        }
        let nodes: Vec<NodeRecord> = self.store.nodes().to_vec();
        for node in &nodes {
            self.connections.begin(&node.name);
            observer(&node.name, &ConnectionStatus::Testing);
            let status = self
                .connections
                .record(&node.name, gateway.test_ssh(node, &credentials))
                .clone();
            observer(&node.name, &status);
        }
        let summary = self
            .connections
            .finish_batch(nodes.iter().map(|node| node.name.as_str()));
        self.toasts.show(if summary.all_pass() {
            format!("All {} connections passed", summary.passed)
        } else {
            format!("{} of {} connections failed", summary.failed, nodes.len())
        });
        Some(summary)
    }
}
