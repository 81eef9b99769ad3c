/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Portable inventory kernel for clustershell.
//!
//! Everything here is UI-agnostic: the node record type and the store that
//! owns the node list, the primordial-master reference and the pending
//! backend deletions.

pub mod node;
pub mod store;

pub use node::{NodeRecord, NodeRole};
pub use store::{InventoryError, InventoryStore};

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils {
    use super::{InventoryStore, NodeRole};

    /// Build a store from `(name, role)` pairs with synthetic addresses.
    pub fn store_from(nodes: &[(&str, NodeRole)]) -> InventoryStore {
        let mut store = InventoryStore::new();
        for (index, (name, role)) in nodes.iter().enumerate() {
            if let Err(error) = store.add(name, &format!("10.0.0.{}", index + 1), *role) {
                panic!("test inventory rejected {name}: {error}");
            }
        }
        store
    }
}
