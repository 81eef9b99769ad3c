/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::error::Error;
use std::fs::File;
use std::io::{self, BufReader};
use std::{env, fs};

use clustershell_comms::{HttpGateway, SshCredentials};

use crate::app::{ClusterShellApp, ShellIntent};
use crate::prefs::{AppPreferences, ArgumentParsingResult, parse_command_line_arguments};
use crate::shell::console::run_console;

pub fn main() {
    // Skip the first argument, which is the binary name.
    let args: Vec<String> = env::args().skip(1).collect();
    let preferences = match parse_command_line_arguments(&args) {
        ArgumentParsingResult::Run(preferences) => preferences,
        ArgumentParsingResult::Exit => std::process::exit(0),
        ArgumentParsingResult::ErrorParsing => std::process::exit(1),
    };

    crate::init_tracing(preferences.tracing_filter.as_deref());
    log::info!(
        "clustershell {} talking to {}",
        crate::VERSION,
        preferences.backend_url
    );

    if let Err(e) = run(preferences) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run(preferences: AppPreferences) -> Result<(), Box<dyn Error>> {
    let gateway = HttpGateway::new(preferences.backend_url.as_str(), preferences.request_timeout)?;
    let mut app = ClusterShellApp::new(preferences.container, preferences.viewport);

    if let Some(username) = preferences.ssh_user.clone() {
        let ssh_key = match &preferences.ssh_key {
            Some(path) => fs::read_to_string(path)
                .map_err(|e| format!("could not read ssh key {}: {e}", path.display()))?,
            None => String::new(),
        };
        app.apply_intents([ShellIntent::SetCredentials(SshCredentials { username, ssh_key })]);
        // The credentials toast is noise at startup.
        app.toasts_mut().take_emitted();
    }

    let stdout = io::stdout();
    match &preferences.script {
        Some(path) => {
            let script = File::open(path)
                .map_err(|e| format!("could not open script {}: {e}", path.display()))?;
            run_console(&mut app, &gateway, BufReader::new(script), stdout.lock())?;
        },
        None => run_console(&mut app, &gateway, io::stdin().lock(), stdout.lock())?,
    }
    Ok(())
}
