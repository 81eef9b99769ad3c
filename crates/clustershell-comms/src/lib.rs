/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Remote gateway to the inventory backend.
//!
//! [`InventoryGateway`] is the seam the shell talks through; [`HttpGateway`]
//! implements it over blocking `reqwest`. The backend endpoints are
//! `/generate`, `/detect-inventory`, `/delete-host` and `/test-ssh`.

pub mod gateway;
pub mod http;
pub mod wire;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use gateway::{DetectedInventory, GatewayError, InventoryGateway, ProbeReport, SshCredentials};
pub use http::{DEFAULT_REQUEST_TIMEOUT, HttpGateway};
