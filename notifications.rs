/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Transient surfaces: the toast line and the node info popup.
//!
//! Both hold at most one item; showing a new one replaces the old one and
//! restarts its timer. Expiry is driven by [`ToastQueue::tick`] /
//! [`InfoPopup::is_expired`] so the caller owns the clock.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use clustershell_core::NodeRole;
use topology_canvas::InfoPlacement;

pub const TOAST_DURATION: Duration = Duration::from_millis(3000);
pub const INFO_POPUP_DURATION: Duration = Duration::from_millis(4500);
/// Undrained messages kept for [`ToastQueue::take_emitted`]; older ones drop.
pub const EMITTED_BACKLOG: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub expires_at: Instant,
}

#[derive(Debug, Default)]
pub struct ToastQueue {
    current: Option<Toast>,
    /// Messages shown since the last [`ToastQueue::take_emitted`], oldest
    /// first. Lets a line-oriented front end echo every message even when a
    /// later one replaced it on screen. Holds at most [`EMITTED_BACKLOG`].
    emitted: VecDeque<String>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, message: impl Into<String>) {
        self.show_for(message, TOAST_DURATION);
    }

    pub fn show_for(&mut self, message: impl Into<String>, duration: Duration) {
        let message = message.into();
        log::info!("toast: {message}");
        if self.emitted.len() == EMITTED_BACKLOG {
            self.emitted.pop_front();
        }
        self.emitted.push_back(message.clone());
        self.current = Some(Toast {
            message,
            expires_at: Instant::now() + duration,
        });
    }

    pub fn current(&self) -> Option<&Toast> {
        self.current.as_ref()
    }

    pub fn current_message(&self) -> Option<&str> {
        self.current.as_ref().map(|toast| toast.message.as_str())
    }

    pub fn tick(&mut self, now: Instant) {
        if self.current.as_ref().is_some_and(|toast| now >= toast.expires_at) {
            self.current = None;
        }
    }

    pub fn take_emitted(&mut self) -> Vec<String> {
        self.emitted.drain(..).collect()
    }
}

/// Read-only node summary shown after a single click.
#[derive(Debug, Clone, PartialEq)]
pub struct InfoPopup {
    pub name: String,
    pub address: String,
    pub role: NodeRole,
    pub placement: InfoPlacement,
    pub expires_at: Instant,
}

impl InfoPopup {
    pub fn new(name: &str, address: &str, role: NodeRole, placement: InfoPlacement) -> Self {
        Self {
            name: name.to_string(),
            address: address.to_string(),
            role,
            placement,
            expires_at: Instant::now() + INFO_POPUP_DURATION,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    pub fn summary(&self) -> String {
        format!("{} \u{2014} {} \u{2022} {}", self.name, self.address, self.role.label())
    }
}
