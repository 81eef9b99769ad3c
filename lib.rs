/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! clustershell: edit a small cluster inventory, see its topology and push
//! it to the inventory backend.

pub mod app;
pub mod connectivity;
pub mod editor;
pub mod notifications;
pub mod prefs;
pub mod shell;

pub use app::{ClusterShellApp, ShellIntent};

pub const VERSION: &str = concat!("clustershell/", env!("CARGO_PKG_VERSION"));

/// Install the global subscriber. `filter` wins over `RUST_LOG`; without
/// either only warnings and errors are shown. `log` records are bridged.
pub fn init_tracing(filter: Option<&str>) {
    use tracing_subscriber::EnvFilter;

    let filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("tracing already initialized: {e}");
    }
}
