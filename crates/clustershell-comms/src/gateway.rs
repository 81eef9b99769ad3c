/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The seam between the shell and the inventory backend.

use clustershell_core::NodeRecord;

/// Why a backend call did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    InvalidUrl(String),
    /// The request never got a response (connect failure, timeout, ...).
    Network(String),
    /// Non-2xx status, with the server's `message` when it sent one.
    HttpStatus { status: u16, message: Option<String> },
    /// The response body could not be decoded.
    Body(String),
    /// 2xx but the body reported a non-success status.
    Rejected(Option<String>),
}

impl GatewayError {
    /// Text for a transient user-facing message: the server's own
    /// explanation when there is one, otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::HttpStatus {
                message: Some(message),
                ..
            }
            | Self::Rejected(Some(message)) => message.clone(),
            Self::Network(_) => "Network error.".to_string(),
            _ => fallback.to_string(),
        }
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUrl(url) => write!(f, "invalid backend url: {url}"),
            Self::Network(e) => write!(f, "network error: {e}"),
            Self::HttpStatus {
                status,
                message: Some(message),
            } => write!(f, "backend returned {status}: {message}"),
            Self::HttpStatus {
                status,
                message: None,
            } => write!(f, "backend returned {status}"),
            Self::Body(e) => write!(f, "unreadable response body: {e}"),
            Self::Rejected(Some(message)) => write!(f, "backend rejected request: {message}"),
            Self::Rejected(None) => write!(f, "backend rejected request"),
        }
    }
}

impl std::error::Error for GatewayError {}

/// Inventory as persisted by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectedInventory {
    pub nodes: Vec<NodeRecord>,
    pub primordial_master: Option<String>,
}

/// SSH credentials sent along with every reachability probe.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SshCredentials {
    pub username: String,
    /// Private key material, passed through verbatim.
    pub ssh_key: String,
}

/// Result of a reachability probe that got an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub reachable: bool,
    pub message: Option<String>,
}

/// Backend operations. Every call is independently fallible and blocks the
/// calling thread until the backend answers or the transport gives up.
pub trait InventoryGateway {
    fn generate(
        &self,
        nodes: &[NodeRecord],
        primordial_master: Option<&str>,
    ) -> Result<(), GatewayError>;

    fn detect(&self) -> Result<DetectedInventory, GatewayError>;

    fn delete_host(&self, name: &str) -> Result<(), GatewayError>;

    fn test_ssh(
        &self,
        node: &NodeRecord,
        credentials: &SshCredentials,
    ) -> Result<ProbeReport, GatewayError>;
}

impl<G> InventoryGateway for &G
where
    G: InventoryGateway + ?Sized,
{
    fn generate(
        &self,
        nodes: &[NodeRecord],
        primordial_master: Option<&str>,
    ) -> Result<(), GatewayError> {
        (**self).generate(nodes, primordial_master)
    }

    fn detect(&self) -> Result<DetectedInventory, GatewayError> {
        (**self).detect()
    }

    fn delete_host(&self, name: &str) -> Result<(), GatewayError> {
        (**self).delete_host(name)
    }

    fn test_ssh(
        &self,
        node: &NodeRecord,
        credentials: &SshCredentials,
    ) -> Result<ProbeReport, GatewayError> {
        (**self).test_ssh(node, credentials)
    }
}
