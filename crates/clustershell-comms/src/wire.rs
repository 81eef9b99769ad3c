/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! JSON bodies exchanged with the inventory backend.

use clustershell_core::NodeRecord;
use serde::{Deserialize, Serialize};

pub const STATUS_SUCCESS: &str = "success";

/// `POST /generate`
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest<'a> {
    pub vms: &'a [NodeRecord],
    #[serde(rename = "primordialMaster")]
    pub primordial_master: Option<&'a str>,
}

/// `GET /detect-inventory`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DetectResponse {
    #[serde(default)]
    pub vms: Vec<NodeRecord>,
    #[serde(default, alias = "primordialMaster")]
    pub primordial_master: Option<String>,
}

/// `POST /delete-host`
#[derive(Debug, Clone, Serialize)]
pub struct DeleteHostRequest<'a> {
    pub name: &'a str,
}

/// `POST /test-ssh`
#[derive(Debug, Clone, Serialize)]
pub struct TestSshRequest<'a> {
    pub name: &'a str,
    pub ip: &'a str,
    pub username: &'a str,
    pub ssh_key: &'a str,
}

/// Generic `{status, message}` reply used by several endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl StatusResponse {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some(STATUS_SUCCESS)
    }
}
