/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Node records: one VM entry in the inventory.

use serde::{Deserialize, Serialize};

/// Role a VM plays in the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    /// Control-plane node, drawn on the top tier.
    Master,
    /// Workload node, drawn on the bottom tier.
    Worker,
}

impl NodeRole {
    pub fn is_master(self) -> bool {
        matches!(self, Self::Master)
    }

    /// The other role; what the editor's role switch flips to.
    pub fn toggled(self) -> Self {
        match self {
            Self::Master => Self::Worker,
            Self::Worker => Self::Master,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Master => "master",
            Self::Worker => "worker",
        }
    }

    /// Upper-case label used in list rows and diagram subtitles.
    pub fn label(self) -> &'static str {
        match self {
            Self::Master => "MASTER",
            Self::Worker => "WORKER",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "master" | "m" => Some(Self::Master),
            "worker" | "w" => Some(Self::Worker),
            _ => None,
        }
    }
}

impl std::fmt::Display for NodeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A VM entry.
///
/// The address is carried as typed by the user; it is never parsed as an IP
/// so host names work too. On the wire the field is called `ip`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub name: String,
    #[serde(rename = "ip")]
    pub address: String,
    pub role: NodeRole,
}

impl NodeRecord {
    pub fn new(name: impl Into<String>, address: impl Into<String>, role: NodeRole) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            role,
        }
    }

    pub fn is_master(&self) -> bool {
        self.role.is_master()
    }
}
