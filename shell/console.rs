/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Line-oriented front end.
//!
//! Each input line is one command. Pointer commands take viewport
//! coordinates, so `click`/`dblclick`/`hover` behave like the pointer over
//! the rendered diagram. Every toast raised by a command is echoed with a
//! leading `*`.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clustershell_comms::{InventoryGateway, SshCredentials};
use clustershell_core::NodeRole;
use euclid::default::Point2D;
use topology_canvas::CanvasInput;

use crate::app::{ClusterShellApp, NodeListRow, PrimordialMarker, ShellIntent};
use crate::editor::{EditorEvent, EditorKey};
use crate::prefs::PixelSize;

pub const HELP: &str = "\
add <name> <ip> [master|worker]   add a node (default worker)
rm <n>                            remove the n-th node of `list`
primordial <name>                 choose the primordial master
list                              show the inventory
svg                               print the diagram
click|dblclick|hover <x> <y>      pointer input over the diagram
hover off                         pointer left the diagram
open <name>                       open the inline editor
set-name <v> | set-address <v>    edit the open editor's fields
toggle-role | save | cancel       editor buttons
key enter|escape                  editor keys
pointer <x> <y>                   pointer-down anywhere in the viewport
generate | detect                 backend inventory calls
confirm | dismiss                 answer a pending confirmation
creds <user> [key-file]           SSH credentials for connection tests
test <name> | retry <name>        test one node
test-all                          test every node in order
resize <w>x<h> [<vw>x<vh>]        container and viewport size
export <path>                     write the diagram to an SVG file
clear                             remove every node (asks first)
tick [ms]                         advance the clock for toasts and popups
help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Add {
        name: String,
        address: String,
        role: NodeRole,
    },
    Remove {
        position: usize,
    },
    Primordial(String),
    List,
    Svg,
    Click(Point2D<f32>),
    DoubleClick(Point2D<f32>),
    Hover(Option<Point2D<f32>>),
    Open(String),
    SetName(String),
    SetAddress(String),
    ToggleRole,
    Key(EditorKey),
    Pointer(Point2D<f32>),
    Save,
    Cancel,
    Generate,
    Detect,
    Confirm,
    Dismiss,
    Test(String),
    TestAll,
    Retry(String),
    Credentials {
        username: String,
        key_file: Option<PathBuf>,
    },
    Resize {
        container: PixelSize,
        viewport: Option<PixelSize>,
    },
    Export(PathBuf),
    Clear,
    Tick(Duration),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError(pub String);

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ParseError {}

fn usage(text: &str) -> ParseError {
    ParseError(format!("usage: {text}"))
}

fn point(args: &[&str], command: &str) -> Result<Point2D<f32>, ParseError> {
    match args {
        [x, y] => {
            let x = x.parse().map_err(|_| usage(&format!("{command} <x> <y>")))?;
            let y = y.parse().map_err(|_| usage(&format!("{command} <x> <y>")))?;
            Ok(Point2D::new(x, y))
        },
        _ => Err(usage(&format!("{command} <x> <y>"))),
    }
}

fn one(args: &[&str], command: &str) -> Result<String, ParseError> {
    match args {
        [value] => Ok(value.to_string()),
        _ => Err(usage(&format!("{command} <name>"))),
    }
}

/// The rest of the line, verbatim, for free-text fields.
fn rest(line: &str, command: &str) -> String {
    line.trim_start()
        .strip_prefix(command)
        .unwrap_or_default()
        .trim()
        .to_string()
}

impl ConsoleCommand {
    /// `Ok(None)` for blank lines and `#` comments.
    pub fn parse(line: &str) -> Result<Option<Self>, ParseError> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = words.split_first() else {
            return Ok(None);
        };
        if command.starts_with('#') {
            return Ok(None);
        }

        let parsed = match command {
            "add" => match args {
                [name, address] => Self::Add {
                    name: name.to_string(),
                    address: address.to_string(),
                    role: NodeRole::Worker,
                },
                [name, address, role] => Self::Add {
                    name: name.to_string(),
                    address: address.to_string(),
                    role: NodeRole::parse(role)
                        .ok_or_else(|| ParseError(format!("unknown role {role:?}")))?,
                },
                _ => return Err(usage("add <name> <ip> [master|worker]")),
            },
            "rm" => match args {
                [n] => Self::Remove {
                    position: n
                        .parse::<usize>()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or_else(|| usage("rm <n>"))?,
                },
                _ => return Err(usage("rm <n>")),
            },
            "primordial" => Self::Primordial(one(args, command)?),
            "list" => Self::List,
            "svg" => Self::Svg,
            "click" => Self::Click(point(args, command)?),
            "dblclick" => Self::DoubleClick(point(args, command)?),
            "hover" => match args {
                ["off"] => Self::Hover(None),
                _ => Self::Hover(Some(point(args, command)?)),
            },
            "pointer" => Self::Pointer(point(args, command)?),
            "open" => Self::Open(one(args, command)?),
            "set-name" => Self::SetName(rest(line, command)),
            "set-address" => Self::SetAddress(rest(line, command)),
            "toggle-role" => Self::ToggleRole,
            "key" => match args {
                [key] if key.eq_ignore_ascii_case("enter") => Self::Key(EditorKey::Enter),
                [key] if key.eq_ignore_ascii_case("escape") || key.eq_ignore_ascii_case("esc") => {
                    Self::Key(EditorKey::Escape)
                },
                _ => return Err(usage("key enter|escape")),
            },
            "save" => Self::Save,
            "cancel" => Self::Cancel,
            "generate" => Self::Generate,
            "detect" => Self::Detect,
            "confirm" | "yes" => Self::Confirm,
            "dismiss" | "no" => Self::Dismiss,
            "test" => Self::Test(one(args, command)?),
            "test-all" => Self::TestAll,
            "retry" => Self::Retry(one(args, command)?),
            "creds" => match args {
                [username] => Self::Credentials {
                    username: username.to_string(),
                    key_file: None,
                },
                [username, key_file] => Self::Credentials {
                    username: username.to_string(),
                    key_file: Some(PathBuf::from(key_file)),
                },
                _ => return Err(usage("creds <user> [key-file]")),
            },
            "resize" => {
                let size = |value: &str| value.parse::<PixelSize>().map_err(ParseError);
                match args {
                    [container] => Self::Resize {
                        container: size(container)?,
                        viewport: None,
                    },
                    [container, viewport] => Self::Resize {
                        container: size(container)?,
                        viewport: Some(size(viewport)?),
                    },
                    _ => return Err(usage("resize <w>x<h> [<vw>x<vh>]")),
                }
            },
            "export" => match args {
                [path] => Self::Export(PathBuf::from(path)),
                _ => return Err(usage("export <path>")),
            },
            "clear" => Self::Clear,
            "tick" => match args {
                [] => Self::Tick(Duration::ZERO),
                [ms] => Self::Tick(Duration::from_millis(
                    ms.parse().map_err(|_| usage("tick [ms]"))?,
                )),
                _ => return Err(usage("tick [ms]")),
            },
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(ParseError(format!("unknown command {other:?}, try `help`"))),
        };
        Ok(Some(parsed))
    }
}

fn format_row(row: &NodeListRow) -> String {
    let marker = match row.primordial {
        PrimordialMarker::None => "",
        PrimordialMarker::Auto => " (primordial)",
        PrimordialMarker::Choice { selected: true } => " (\u{25c9})",
        PrimordialMarker::Choice { selected: false } => " (\u{25cb})",
    };
    format!(
        "{}. {} {} {}{} [{}]",
        row.index + 1,
        row.name,
        row.address,
        row.role.label(),
        marker,
        row.connection.label()
    )
}

fn print_editor<W: Write>(app: &ClusterShellApp, out: &mut W) -> io::Result<()> {
    if let Some(editor) = app.editor() {
        let rect = editor.placement().rect;
        writeln!(
            out,
            "editing {}: name={:?} ip={:?} role={} at ({}, {}) {:?}",
            editor.target(),
            editor.name(),
            editor.address(),
            editor.role_label(),
            rect.origin.x,
            rect.origin.y,
            editor.placement().side
        )?;
    }
    Ok(())
}

/// Run a single command. Returns `false` on `quit`.
pub fn execute<G, W>(
    app: &mut ClusterShellApp,
    gateway: &G,
    command: ConsoleCommand,
    out: &mut W,
) -> io::Result<bool>
where
    G: InventoryGateway,
    W: Write,
{
    let info_before = app.info_popup().map(|info| info.expires_at);
    let editor_before = app.editor().map(|editor| editor.target().to_string());

    match command {
        ConsoleCommand::Add {
            name,
            address,
            role,
        } => app.apply_intents([ShellIntent::AddNode {
            name,
            address,
            role,
        }]),
        ConsoleCommand::Remove { position } => app.apply_intents([ShellIntent::RemoveNode {
            index: position - 1,
        }]),
        ConsoleCommand::Primordial(name) => app.apply_intents([ShellIntent::SetPrimordial { name }]),
        ConsoleCommand::List => {
            let rows = app.node_rows();
            if rows.is_empty() {
                writeln!(out, "(no nodes)")?;
            }
            for row in &rows {
                writeln!(out, "{}", format_row(row))?;
            }
            if app.deploy_available() {
                writeln!(out, "all connections pass; ready to deploy")?;
            }
        },
        ConsoleCommand::Svg => writeln!(out, "{}", app.render_svg())?,
        ConsoleCommand::Click(point) => {
            app.apply_intents([ShellIntent::Canvas(CanvasInput::Click(point))])
        },
        ConsoleCommand::DoubleClick(point) => {
            app.apply_intents([ShellIntent::Canvas(CanvasInput::DoubleClick(point))])
        },
        ConsoleCommand::Hover(point) => {
            let input = match point {
                Some(point) => CanvasInput::PointerMoved(point),
                None => CanvasInput::PointerLeft,
            };
            app.apply_intents([ShellIntent::Canvas(input)]);
            writeln!(out, "hover: {}", app.hovered().unwrap_or("-"))?;
        },
        ConsoleCommand::Open(name) => app.apply_intents([ShellIntent::OpenEditor { name }]),
        ConsoleCommand::SetName(value) => {
            app.apply_intents([ShellIntent::Editor(EditorEvent::SetName(value))])
        },
        ConsoleCommand::SetAddress(value) => {
            app.apply_intents([ShellIntent::Editor(EditorEvent::SetAddress(value))])
        },
        ConsoleCommand::ToggleRole => {
            app.apply_intents([ShellIntent::Editor(EditorEvent::ToggleRole)]);
            print_editor(app, out)?;
        },
        ConsoleCommand::Key(key) => app.apply_intents([ShellIntent::Editor(EditorEvent::Key(key))]),
        ConsoleCommand::Pointer(point) => {
            app.apply_intents([ShellIntent::Editor(EditorEvent::PointerDown(point))])
        },
        ConsoleCommand::Save => app.apply_intents([ShellIntent::Editor(EditorEvent::SaveClicked)]),
        ConsoleCommand::Cancel => {
            app.apply_intents([ShellIntent::Editor(EditorEvent::CancelClicked)])
        },
        ConsoleCommand::Generate => {
            app.generate_inventory(gateway);
        },
        ConsoleCommand::Detect => {
            app.detect_inventory(gateway);
        },
        ConsoleCommand::Confirm => app.confirm_pending(gateway),
        ConsoleCommand::Dismiss => app.apply_intents([ShellIntent::DismissConfirmation]),
        ConsoleCommand::Test(name) => {
            if let Some(status) = app.test_connection(gateway, &name) {
                writeln!(out, "{name}: {}", status.label())?;
            }
        },
        ConsoleCommand::Retry(name) => match app.retry_connection(gateway, &name) {
            Some(status) => writeln!(out, "{name}: {}", status.label())?,
            None => writeln!(out, "{name}: nothing to retry")?,
        },
        ConsoleCommand::TestAll => {
            // Each row is written as it changes so a hung probe stays visible.
            let mut write_error = None;
            app.test_all_connections(gateway, |name, status| {
                if write_error.is_some() {
                    return;
                }
                let written = writeln!(out, "{name}: {}", status.label()).and_then(|()| out.flush());
                if let Err(error) = written {
                    write_error = Some(error);
                }
            });
            if let Some(error) = write_error {
                return Err(error);
            }
        },
        ConsoleCommand::Credentials { username, key_file } => {
            let ssh_key = match key_file {
                Some(path) => match std::fs::read_to_string(&path) {
                    Ok(key) => key,
                    Err(error) => {
                        writeln!(out, "error: could not read {}: {error}", path.display())?;
                        return Ok(true);
                    },
                },
                None => String::new(),
            };
            app.apply_intents([ShellIntent::SetCredentials(SshCredentials { username, ssh_key })]);
        },
        ConsoleCommand::Resize {
            container,
            viewport,
        } => {
            let viewport = viewport.map_or_else(|| app.viewport(), |PixelSize(size)| size);
            app.apply_intents([ShellIntent::Resize {
                container: container.0,
                viewport,
            }]);
            let size = app.layout().size;
            writeln!(out, "diagram {}x{}", size.width, size.height)?;
        },
        ConsoleCommand::Export(path) => match app.export_svg(&path) {
            Ok(()) => writeln!(out, "wrote {}", path.display())?,
            Err(error) => writeln!(out, "error: {error}")?,
        },
        ConsoleCommand::Clear => app.apply_intents([ShellIntent::RequestClear]),
        ConsoleCommand::Tick(elapsed) => app.tick(Instant::now() + elapsed),
        ConsoleCommand::Help => writeln!(out, "{HELP}")?,
        ConsoleCommand::Quit => return Ok(false),
    }

    for message in app.toasts_mut().take_emitted() {
        writeln!(out, "* {message}")?;
    }
    if let Some(pending) = app.pending_confirmation() {
        writeln!(out, "? {} (confirm/dismiss)", pending.prompt())?;
    }
    if let Some(info) = app.info_popup()
        && info_before != Some(info.expires_at)
    {
        writeln!(out, "info: {}", info.summary())?;
    }
    match (editor_before, app.editor()) {
        (None, Some(_)) => print_editor(app, out)?,
        (Some(before), Some(editor)) if before != editor.target() => print_editor(app, out)?,
        (Some(before), None) => writeln!(out, "editor for {before} closed")?,
        _ => {},
    }
    Ok(true)
}

/// Read commands from `input` until it ends or `quit`.
pub fn run_console<G, R, W>(
    app: &mut ClusterShellApp,
    gateway: &G,
    input: R,
    mut out: W,
) -> io::Result<()>
where
    G: InventoryGateway,
    R: BufRead,
    W: Write,
{
    for line in input.lines() {
        let line = line?;
        match ConsoleCommand::parse(&line) {
            Ok(None) => {},
            Ok(Some(command)) => {
                log::debug!("console: {command:?}");
                if !execute(app, gateway, command, &mut out)? {
                    break;
                }
            },
            Err(error) => writeln!(out, "error: {error}")?,
        }
        out.flush()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clustershell_comms::testing::{GatewayCall, RecordingGateway};
    use clustershell_comms::{DetectedInventory, GatewayError, ProbeReport};
    use clustershell_core::NodeRecord;
    use euclid::default::Size2D;
    use std::cell::RefCell;
    use std::rc::Rc;
    use rstest::rstest;

    #[rstest]
    #[case("add n1 10.0.0.1 master", ConsoleCommand::Add {
        name: "n1".into(), address: "10.0.0.1".into(), role: NodeRole::Master,
    })]
    #[case("add w1 10.0.0.2", ConsoleCommand::Add {
        name: "w1".into(), address: "10.0.0.2".into(), role: NodeRole::Worker,
    })]
    #[case("rm 2", ConsoleCommand::Remove { position: 2 })]
    #[case("click 10 20.5", ConsoleCommand::Click(Point2D::new(10.0, 20.5)))]
    #[case("hover off", ConsoleCommand::Hover(None))]
    #[case("set-name  new name ", ConsoleCommand::SetName("new name".into()))]
    #[case("set-address", ConsoleCommand::SetAddress(String::new()))]
    #[case("key Esc", ConsoleCommand::Key(EditorKey::Escape))]
    #[case("tick 4500", ConsoleCommand::Tick(Duration::from_millis(4500)))]
    #[case("resize 600x300", ConsoleCommand::Resize {
        container: PixelSize(Size2D::new(600.0, 300.0)), viewport: None,
    })]
    #[case("creds ubuntu", ConsoleCommand::Credentials { username: "ubuntu".into(), key_file: None })]
    fn parses(#[case] line: &str, #[case] expected: ConsoleCommand) {
        assert_eq!(ConsoleCommand::parse(line), Ok(Some(expected)));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("# a comment")]
    fn skips_blank_and_comment_lines(#[case] line: &str) {
        assert_eq!(ConsoleCommand::parse(line), Ok(None));
    }

    #[rstest]
    #[case("add n1")]
    #[case("add n1 10.0.0.1 boss")]
    #[case("rm 0")]
    #[case("rm x")]
    #[case("click 1")]
    #[case("key tab")]
    #[case("frobnicate")]
    fn rejects(#[case] line: &str) {
        assert!(ConsoleCommand::parse(line).is_err());
    }

    fn run(script: &str, gateway: &RecordingGateway) -> (ClusterShellApp, String) {
        let mut app = ClusterShellApp::new_for_testing();
        let mut out = Vec::new();
        run_console(&mut app, gateway, script.as_bytes(), &mut out).unwrap();
        (app, String::from_utf8(out).unwrap())
    }

    #[test]
    fn script_builds_inventory_and_echoes_toasts() {
        let gateway = RecordingGateway::new();
        let (app, out) = run(
            "add n1 10.0.0.1 master\nadd w1 10.0.0.2\nadd x\nlist\ngenerate\n",
            &gateway,
        );
        assert_eq!(app.store().len(), 2);
        assert!(out.contains("* n1 added"));
        assert!(out.contains("error: usage: add"));
        assert!(out.contains("1. n1 10.0.0.1 MASTER (primordial) [untested]"));
        assert!(out.contains("2. w1 10.0.0.2 WORKER [untested]"));
        assert!(out.contains("* Inventory files generated!"));
        assert_eq!(gateway.calls().len(), 1);
    }

    #[test]
    fn quit_stops_reading() {
        let gateway = RecordingGateway::new();
        let (app, _) = run("add n1 10.0.0.1 master\nquit\nadd n2 10.0.0.2\n", &gateway);
        assert_eq!(app.store().len(), 1);
    }

    #[test]
    fn clear_asks_before_wiping() {
        let gateway = RecordingGateway::new();
        let (app, out) = run("add n1 10.0.0.1 master\nclear\n", &gateway);
        assert!(out.contains("? Remove every node from the inventory? (confirm/dismiss)"));
        assert_eq!(app.store().len(), 1);

        let (app, _) = run("add n1 10.0.0.1 master\nclear\nconfirm\n", &gateway);
        assert!(app.store().is_empty());
    }

    #[test]
    fn editor_session_through_commands() {
        let gateway = RecordingGateway::new();
        let (app, out) = run(
            "add w1 10.0.0.2\nopen w1\nset-name cp-1\ntoggle-role\nkey enter\n",
            &gateway,
        );
        assert!(out.contains("editing w1: name=\"w1\""));
        assert!(out.contains("* Node updated"));
        assert!(out.contains("editor for w1 closed"));
        assert_eq!(app.store().nodes()[0].name, "cp-1");
        assert_eq!(app.store().primordial(), Some("cp-1"));
    }

    #[test]
    fn test_all_prints_each_transition() {
        let gateway = RecordingGateway::new();
        let (_, out) = run("add n1 10.0.0.1 master\ncreds ubuntu\ntest-all\n", &gateway);
        assert!(out.contains("n1: testing\u{2026}\nn1: ok\n"));
        assert!(out.contains("* All 1 connections passed"));
        assert!(matches!(
            gateway.calls().last(),
            Some(GatewayCall::TestSsh { username, .. }) if username == "ubuntu"
        ));
    }

    /// Shared sink so a gateway can look at what was printed mid-batch.
    #[derive(Clone, Default)]
    struct SharedOutput(Rc<RefCell<Vec<u8>>>);

    impl SharedOutput {
        fn text(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).unwrap()
        }
    }

    impl Write for SharedOutput {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Records the console output at the moment `watch` is probed.
    struct WatchingGateway {
        inner: RecordingGateway,
        output: SharedOutput,
        watch: &'static str,
        seen: RefCell<Option<String>>,
    }

    impl InventoryGateway for WatchingGateway {
        fn generate(
            &self,
            nodes: &[NodeRecord],
            primordial_master: Option<&str>,
        ) -> Result<(), GatewayError> {
            self.inner.generate(nodes, primordial_master)
        }

        fn detect(&self) -> Result<DetectedInventory, GatewayError> {
            self.inner.detect()
        }

        fn delete_host(&self, name: &str) -> Result<(), GatewayError> {
            self.inner.delete_host(name)
        }

        fn test_ssh(
            &self,
            node: &NodeRecord,
            credentials: &SshCredentials,
        ) -> Result<ProbeReport, GatewayError> {
            if node.name == self.watch {
                *self.seen.borrow_mut() = Some(self.output.text());
            }
            self.inner.test_ssh(node, credentials)
        }
    }

    #[test]
    fn test_all_renders_each_row_before_probing_the_next() {
        let output = SharedOutput::default();
        let gateway = WatchingGateway {
            inner: RecordingGateway::new(),
            output: output.clone(),
            watch: "n2",
            seen: RefCell::new(None),
        };
        let mut app = ClusterShellApp::new_for_testing();
        let script = "add n1 10.0.0.1 master\nadd n2 10.0.0.2\ncreds u\ntest-all\n";
        run_console(&mut app, &gateway, script.as_bytes(), output.clone()).unwrap();

        let seen = gateway.seen.borrow().clone().unwrap();
        assert!(seen.contains("n1: ok\n"));
        assert!(seen.ends_with("n2: testing\u{2026}\n"));
        assert!(output.text().contains("n2: ok\n"));
    }
}
