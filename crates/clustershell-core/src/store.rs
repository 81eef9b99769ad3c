/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The inventory store.
//!
//! Holds the ordered node list (insertion order is display order), the
//! primordial-master reference, and the set of names deleted locally but not
//! yet removed on the backend. All mutation is synchronous; every successful
//! mutation bumps [`InventoryStore::revision`] so views can tell when they
//! are stale.

use std::collections::BTreeSet;

use crate::node::{NodeRecord, NodeRole};

/// Errors from inventory mutations.
///
/// None of these are fatal: the store is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryError {
    /// Name or address was empty after trimming.
    MissingField,
    IndexOutOfBounds { index: usize, len: usize },
    UnknownNode(String),
    /// More than one node carries this name, so a name lookup cannot pick one.
    AmbiguousName(String),
    /// Another node already uses this name.
    DuplicateName(String),
}

impl std::fmt::Display for InventoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField => write!(f, "name and address are both required"),
            Self::IndexOutOfBounds { index, len } => {
                write!(f, "no node at position {index} (inventory has {len})")
            },
            Self::UnknownNode(name) => write!(f, "no node named {name}"),
            Self::AmbiguousName(name) => write!(f, "more than one node is named {name}"),
            Self::DuplicateName(name) => write!(f, "a node named {name} already exists"),
        }
    }
}

impl std::error::Error for InventoryError {}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryStore {
    nodes: Vec<NodeRecord>,
    primordial_master: Option<String>,
    pending_deletions: BTreeSet<String>,
    revision: u64,
}

impl InventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Monotonic revision incremented whenever the store changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn nodes(&self) -> &[NodeRecord] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn masters(&self) -> impl Iterator<Item = &NodeRecord> {
        self.nodes.iter().filter(|node| node.is_master())
    }

    pub fn workers(&self) -> impl Iterator<Item = &NodeRecord> {
        self.nodes.iter().filter(|node| !node.is_master())
    }

    pub fn master_count(&self) -> usize {
        self.masters().count()
    }

    /// The explicit primordial reference, exactly as last assigned.
    pub fn primordial(&self) -> Option<&str> {
        self.primordial_master.as_deref()
    }

    /// The master the topology treats as root: the explicit reference when it
    /// names a master, otherwise the first master in display order.
    pub fn effective_primordial(&self) -> Option<&NodeRecord> {
        self.primordial_master
            .as_deref()
            .and_then(|name| self.masters().find(|node| node.name == name))
            .or_else(|| self.masters().next())
    }

    pub fn pending_deletions(&self) -> &BTreeSet<String> {
        &self.pending_deletions
    }

    /// Resolve a name to its position.
    pub fn find(&self, name: &str) -> Result<usize, InventoryError> {
        let mut matches = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.name == name)
            .map(|(index, _)| index);
        let Some(first) = matches.next() else {
            return Err(InventoryError::UnknownNode(name.to_string()));
        };
        if matches.next().is_some() {
            return Err(InventoryError::AmbiguousName(name.to_string()));
        }
        Ok(first)
    }

    pub fn get(&self, name: &str) -> Result<&NodeRecord, InventoryError> {
        self.find(name).map(|index| &self.nodes[index])
    }

    /// Append a node. Returns its position.
    pub fn add(
        &mut self,
        name: &str,
        address: &str,
        role: NodeRole,
    ) -> Result<usize, InventoryError> {
        let (name, address) = validated_fields(name, address)?;
        if self.nodes.iter().any(|node| node.name == name) {
            return Err(InventoryError::DuplicateName(name));
        }

        let had_master = self.master_count() > 0;
        if role.is_master() && !had_master {
            self.primordial_master = Some(name.clone());
        }
        log::debug!("inventory: add {name} ({address}) as {role}");
        self.nodes.push(NodeRecord::new(name, address, role));
        self.bump();
        Ok(self.nodes.len() - 1)
    }

    /// Remove the node at `index`, remembering its name for backend cleanup.
    pub fn remove(&mut self, index: usize) -> Result<NodeRecord, InventoryError> {
        if index >= self.nodes.len() {
            return Err(InventoryError::IndexOutOfBounds {
                index,
                len: self.nodes.len(),
            });
        }
        let removed = self.nodes.remove(index);
        if self.primordial_master.as_deref() == Some(removed.name.as_str()) {
            self.primordial_master = None;
        }
        self.pending_deletions.insert(removed.name.clone());
        log::debug!("inventory: removed {} at {index}", removed.name);
        self.bump();
        Ok(removed)
    }

    /// Rewrite the node currently called `name`.
    pub fn edit(
        &mut self,
        name: &str,
        new_name: &str,
        new_address: &str,
        new_role: NodeRole,
    ) -> Result<(), InventoryError> {
        let (new_name, new_address) = validated_fields(new_name, new_address)?;
        let index = self.find(name)?;
        if new_name != name && self.nodes.iter().any(|node| node.name == new_name) {
            return Err(InventoryError::DuplicateName(new_name));
        }

        let old_role = self.nodes[index].role;
        let was_primordial = self.primordial_master.as_deref() == Some(name);
        let other_masters = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(other, node)| *other != index && node.is_master())
            .count();

        let node = &mut self.nodes[index];
        node.name = new_name.clone();
        node.address = new_address;
        node.role = new_role;

        if was_primordial {
            // A rename carries the reference along; a demotion drops it.
            self.primordial_master = new_role.is_master().then(|| new_name.clone());
        }
        if old_role == NodeRole::Worker && new_role.is_master() && other_masters == 0 {
            self.primordial_master = Some(new_name.clone());
        }
        log::debug!("inventory: edited {name} -> {new_name} as {new_role}");
        self.bump();
        Ok(())
    }

    /// Point the primordial reference at `name`. The caller makes sure it is
    /// a master.
    pub fn set_primordial(&mut self, name: &str) {
        self.primordial_master = Some(name.to_string());
        self.bump();
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.primordial_master = None;
        self.pending_deletions.clear();
        self.bump();
    }

    /// Swap in an inventory fetched from the backend. The backend copy is
    /// authoritative, so nothing is left pending.
    pub fn replace_all(&mut self, nodes: Vec<NodeRecord>, primordial_master: Option<String>) {
        self.nodes = nodes;
        self.primordial_master = primordial_master;
        self.pending_deletions.clear();
        self.bump();
    }

    /// Forget the given names once the backend has been told about them.
    /// Names deleted again in the meantime stay pending.
    pub fn settle_pending_deletions<'a, I>(&mut self, flushed: I)
    where
        I: IntoIterator<Item = &'a String>,
    {
        for name in flushed {
            self.pending_deletions.remove(name);
        }
    }

    fn bump(&mut self) {
        self.revision = self.revision.saturating_add(1);
    }
}

fn validated_fields(name: &str, address: &str) -> Result<(String, String), InventoryError> {
    let name = name.trim();
    let address = address.trim();
    if name.is_empty() || address.is_empty() {
        return Err(InventoryError::MissingField);
    }
    Ok((name.to_string(), address.to_string()))
}
