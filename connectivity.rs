/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Per-node SSH reachability results and the batch "all pass" gate.

use std::collections::HashMap;

use clustershell_comms::{GatewayError, ProbeReport};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    #[default]
    Untested,
    /// A probe is in flight. A hung request leaves the row here.
    Testing,
    Passed(Option<String>),
    /// Failed probes carry the reason and offer a retry.
    Failed(String),
}

impl ConnectionStatus {
    pub fn passed(&self) -> bool {
        matches!(self, Self::Passed(_))
    }

    pub fn can_retry(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn label(&self) -> String {
        match self {
            Self::Untested => "untested".to_string(),
            Self::Testing => "testing\u{2026}".to_string(),
            Self::Passed(None) => "ok".to_string(),
            Self::Passed(Some(message)) => format!("ok ({message})"),
            Self::Failed(reason) => format!("failed: {reason} [retry]"),
        }
    }

    fn from_probe(result: Result<ProbeReport, GatewayError>) -> Self {
        match result {
            Ok(ProbeReport {
                reachable: true,
                message,
            }) => Self::Passed(message),
            Ok(ProbeReport {
                reachable: false,
                message,
            }) => Self::Failed(message.unwrap_or_else(|| "connection failed".to_string())),
            Err(error) => Self::Failed(error.user_message(&error.to_string())),
        }
    }
}

/// Outcome of one full batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub passed: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn all_pass(&self) -> bool {
        self.failed == 0 && self.passed > 0
    }
}

#[derive(Debug, Default)]
pub struct ConnectionBoard {
    rows: HashMap<String, ConnectionStatus>,
    all_pass: bool,
    last_batch: Option<BatchSummary>,
}

impl ConnectionBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, name: &str) -> ConnectionStatus {
        self.rows.get(name).cloned().unwrap_or_default()
    }

    /// Whether the last full batch passed for every node. Only a fresh
    /// batch run can set this.
    pub fn all_pass(&self) -> bool {
        self.all_pass
    }

    pub fn last_batch(&self) -> Option<BatchSummary> {
        self.last_batch
    }

    pub fn begin(&mut self, name: &str) {
        self.rows.insert(name.to_string(), ConnectionStatus::Testing);
    }

    pub fn record(&mut self, name: &str, result: Result<ProbeReport, GatewayError>) -> &ConnectionStatus {
        let status = ConnectionStatus::from_probe(result);
        match &status {
            ConnectionStatus::Failed(reason) => log::warn!("ssh probe to {name} failed: {reason}"),
            _ => log::info!("ssh probe to {name} passed"),
        }
        self.rows.insert(name.to_string(), status);
        &self.rows[name]
    }

    /// Close a batch over `names` and recompute the gate from their rows.
    pub fn finish_batch<'a, I>(&mut self, names: I) -> BatchSummary
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut summary = BatchSummary { passed: 0, failed: 0 };
        for name in names {
            if self.status(name).passed() {
                summary.passed += 1;
            } else {
                summary.failed += 1;
            }
        }
        self.all_pass = summary.all_pass();
        self.last_batch = Some(summary);
        summary
    }

    /// Drop a node's row and the batch gate; the tested set no longer
    /// matches the inventory.
    pub fn forget(&mut self, name: &str) {
        self.rows.remove(name);
        self.all_pass = false;
    }

    /// Throw away every result, e.g. after the inventory was regenerated.
    pub fn invalidate(&mut self) {
        self.rows.clear();
        self.all_pass = false;
        self.last_batch = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pass() -> Result<ProbeReport, GatewayError> {
        Ok(ProbeReport {
            reachable: true,
            message: Some("SSH OK".to_string()),
        })
    }

    fn fail() -> Result<ProbeReport, GatewayError> {
        Ok(ProbeReport {
            reachable: false,
            message: Some("Permission denied".to_string()),
        })
    }

    #[test]
    fn batch_with_failure_keeps_gate_closed_and_retry_does_not_open_it() {
        let mut board = ConnectionBoard::new();
        board.record("n1", fail());
        board.record("n2", pass());
        let summary = board.finish_batch(["n1", "n2"]);
        assert_eq!(summary, BatchSummary { passed: 1, failed: 1 });
        assert!(!board.all_pass());

        assert!(board.status("n1").can_retry());
        board.record("n1", pass());
        assert!(board.status("n1").passed());
        assert!(!board.all_pass());
    }

    #[test]
    fn empty_batch_never_passes() {
        let mut board = ConnectionBoard::new();
        let summary = board.finish_batch(std::iter::empty());
        assert!(!summary.all_pass());
        assert!(!board.all_pass());
    }

    #[test]
    fn transport_errors_become_failed_rows() {
        let mut board = ConnectionBoard::new();
        board.begin("n1");
        assert_eq!(board.status("n1"), ConnectionStatus::Testing);
        let status = board.record("n1", Err(GatewayError::Network("refused".to_string())));
        assert_eq!(status, &ConnectionStatus::Failed("Network error.".to_string()));
    }

    #[test]
    fn invalidate_and_forget_close_the_gate() {
        let mut board = ConnectionBoard::new();
        board.record("n1", pass());
        board.finish_batch(["n1"]);
        assert!(board.all_pass());
        board.forget("n1");
        assert!(!board.all_pass());
        assert_eq!(board.status("n1"), ConnectionStatus::Untested);

        board.record("n1", pass());
        board.finish_batch(["n1"]);
        board.invalidate();
        assert!(!board.all_pass());
        assert_eq!(board.last_batch(), None);
    }
}
