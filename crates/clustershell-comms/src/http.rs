/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! `reqwest`-backed [`InventoryGateway`].

use std::time::Duration;

use clustershell_core::NodeRecord;
use reqwest::blocking::{Client, Response};
use url::Url;

use crate::gateway::{DetectedInventory, GatewayError, InventoryGateway, ProbeReport, SshCredentials};
use crate::wire::{
    DeleteHostRequest, DetectResponse, GenerateRequest, StatusResponse, TestSshRequest,
};

pub const ENDPOINT_GENERATE: &str = "generate";
pub const ENDPOINT_DETECT_INVENTORY: &str = "detect-inventory";
pub const ENDPOINT_DELETE_HOST: &str = "delete-host";
pub const ENDPOINT_TEST_SSH: &str = "test-ssh";

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpGateway {
    client: Client,
    base: Url,
}

impl HttpGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let base = normalize_base(base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        self.base
            .join(path)
            .map_err(|_| GatewayError::InvalidUrl(format!("{}{path}", self.base)))
    }

    fn post<B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Response, GatewayError> {
        let url = self.endpoint(path)?;
        log::debug!("POST {url}");
        self.client
            .post(url)
            .json(body)
            .send()
            .map_err(|e| GatewayError::Network(e.to_string()))
    }
}

/// Parse `base_url`, making sure relative endpoint joins land under it.
fn normalize_base(base_url: &str) -> Result<Url, GatewayError> {
    let trimmed = base_url.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&with_slash).map_err(|_| GatewayError::InvalidUrl(base_url.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(GatewayError::InvalidUrl(base_url.to_string()));
    }
    Ok(url)
}

/// Split a response into a decoded `{status, message}` body, or an error for
/// non-2xx statuses. Bodies that are not JSON decode as an empty status.
fn read_status(response: Response) -> Result<StatusResponse, GatewayError> {
    let status = response.status();
    let text = response.text().map_err(|e| GatewayError::Body(e.to_string()))?;
    let body: StatusResponse = serde_json::from_str(&text).unwrap_or_default();
    if !status.is_success() {
        return Err(GatewayError::HttpStatus {
            status: status.as_u16(),
            message: body.message,
        });
    }
    Ok(body)
}

impl InventoryGateway for HttpGateway {
    fn generate(
        &self,
        nodes: &[NodeRecord],
        primordial_master: Option<&str>,
    ) -> Result<(), GatewayError> {
        let request = GenerateRequest {
            vms: nodes,
            primordial_master,
        };
        let body = read_status(self.post(ENDPOINT_GENERATE, &request)?)?;
        // Older backends answer with an empty 200; only an explicit non-success
        // status counts as a rejection.
        match body.status.as_deref() {
            Some(status) if !body.is_success() => {
                log::warn!("generate rejected with status {status}");
                Err(GatewayError::Rejected(body.message))
            },
            _ => Ok(()),
        }
    }

    fn detect(&self) -> Result<DetectedInventory, GatewayError> {
        let url = self.endpoint(ENDPOINT_DETECT_INVENTORY)?;
        log::debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        let status = response.status();
        let text = response.text().map_err(|e| GatewayError::Body(e.to_string()))?;
        if !status.is_success() {
            let body: StatusResponse = serde_json::from_str(&text).unwrap_or_default();
            return Err(GatewayError::HttpStatus {
                status: status.as_u16(),
                message: body.message,
            });
        }
        let body: DetectResponse =
            serde_json::from_str(&text).map_err(|e| GatewayError::Body(e.to_string()))?;
        Ok(DetectedInventory {
            nodes: body.vms,
            primordial_master: body.primordial_master,
        })
    }

    fn delete_host(&self, name: &str) -> Result<(), GatewayError> {
        read_status(self.post(ENDPOINT_DELETE_HOST, &DeleteHostRequest { name })?).map(|_| ())
    }

    fn test_ssh(
        &self,
        node: &NodeRecord,
        credentials: &SshCredentials,
    ) -> Result<ProbeReport, GatewayError> {
        let request = TestSshRequest {
            name: &node.name,
            ip: &node.address,
            username: &credentials.username,
            ssh_key: &credentials.ssh_key,
        };
        let body = read_status(self.post(ENDPOINT_TEST_SSH, &request)?)?;
        Ok(ProbeReport {
            reachable: body.is_success(),
            message: body.message,
        })
    }
}
