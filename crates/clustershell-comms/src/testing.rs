/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! In-memory gateway that records calls and replays scripted answers.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use clustershell_core::NodeRecord;

use crate::gateway::{DetectedInventory, GatewayError, InventoryGateway, ProbeReport, SshCredentials};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    Generate {
        nodes: Vec<NodeRecord>,
        primordial_master: Option<String>,
    },
    Detect,
    DeleteHost(String),
    TestSsh {
        name: String,
        address: String,
        username: String,
    },
}

/// Scripted gateway. Unscripted calls succeed (generate, delete-host,
/// reachable probe) or return an empty inventory (detect).
#[derive(Debug, Default)]
pub struct RecordingGateway {
    calls: RefCell<Vec<GatewayCall>>,
    generate_results: RefCell<VecDeque<Result<(), GatewayError>>>,
    detect_results: RefCell<VecDeque<Result<DetectedInventory, GatewayError>>>,
    delete_results: RefCell<VecDeque<Result<(), GatewayError>>>,
    probe_results: RefCell<HashMap<String, VecDeque<Result<ProbeReport, GatewayError>>>>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.borrow().clone()
    }

    pub fn push_generate(&self, result: Result<(), GatewayError>) {
        self.generate_results.borrow_mut().push_back(result);
    }

    pub fn push_detect(&self, result: Result<DetectedInventory, GatewayError>) {
        self.detect_results.borrow_mut().push_back(result);
    }

    pub fn push_delete(&self, result: Result<(), GatewayError>) {
        self.delete_results.borrow_mut().push_back(result);
    }

    pub fn push_probe(&self, name: &str, result: Result<ProbeReport, GatewayError>) {
        self.probe_results
            .borrow_mut()
            .entry(name.to_string())
            .or_default()
            .push_back(result);
    }

    fn record(&self, call: GatewayCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl InventoryGateway for RecordingGateway {
    fn generate(
        &self,
        nodes: &[NodeRecord],
        primordial_master: Option<&str>,
    ) -> Result<(), GatewayError> {
        self.record(GatewayCall::Generate {
            nodes: nodes.to_vec(),
            primordial_master: primordial_master.map(str::to_string),
        });
        self.generate_results.borrow_mut().pop_front().unwrap_or(Ok(()))
    }

    fn detect(&self) -> Result<DetectedInventory, GatewayError> {
        self.record(GatewayCall::Detect);
        self.detect_results
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(DetectedInventory::default()))
    }

    fn delete_host(&self, name: &str) -> Result<(), GatewayError> {
        self.record(GatewayCall::DeleteHost(name.to_string()));
        self.delete_results.borrow_mut().pop_front().unwrap_or(Ok(()))
    }

    fn test_ssh(
        &self,
        node: &NodeRecord,
        credentials: &SshCredentials,
    ) -> Result<ProbeReport, GatewayError> {
        self.record(GatewayCall::TestSsh {
            name: node.name.clone(),
            address: node.address.clone(),
            username: credentials.username.clone(),
        });
        self.probe_results
            .borrow_mut()
            .get_mut(&node.name)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Ok(ProbeReport {
                    reachable: true,
                    message: None,
                })
            })
    }
}
