/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Startup preferences.
//!
//! Values are layered: built-in defaults, then the TOML config file, then
//! `CLUSTERSHELL_*` environment variables, then command line flags.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use bpaf::Bpaf;
use euclid::default::Size2D;
use serde::Deserialize;
use url::Url;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";
pub const ENV_BACKEND_URL: &str = "CLUSTERSHELL_BACKEND_URL";
pub const ENV_SSH_USER: &str = "CLUSTERSHELL_SSH_USER";
pub const ENV_SSH_KEY: &str = "CLUSTERSHELL_SSH_KEY";
pub const ENV_TRACING_FILTER: &str = "CLUSTERSHELL_TRACING_FILTER";

/// A `WIDTHxHEIGHT` pixel size, e.g. `1280x800`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelSize(pub Size2D<f32>);

impl FromStr for PixelSize {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (width, height) = value
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {value:?}"))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<f32>()
                .ok()
                .filter(|px| px.is_finite() && *px > 0.0)
                .ok_or_else(|| format!("invalid pixel count {part:?}"))
        };
        Ok(Self(Size2D::new(parse(width)?, parse(height)?)))
    }
}

#[derive(Debug, Clone, Bpaf)]
#[bpaf(options, version, generate(cli_options))]
pub struct CliOptions {
    /// Base URL of the inventory backend
    #[bpaf(long("backend-url"), argument("URL"))]
    pub backend_url: Option<String>,
    /// Read preferences from this TOML file instead of the default location
    #[bpaf(long("config"), argument("PATH"))]
    pub config: Option<PathBuf>,
    /// Diagram container width in pixels
    #[bpaf(long("width"), argument("PX"))]
    pub width: Option<f32>,
    /// Diagram container height in pixels
    #[bpaf(long("height"), argument("PX"))]
    pub height: Option<f32>,
    /// Viewport size used to place overlays
    #[bpaf(long("viewport"), argument("WxH"))]
    pub viewport: Option<PixelSize>,
    /// SSH user for connection tests
    #[bpaf(long("ssh-user"), argument("USER"))]
    pub ssh_user: Option<String>,
    /// Private key file for connection tests
    #[bpaf(long("ssh-key"), argument("PATH"))]
    pub ssh_key: Option<PathBuf>,
    /// Log filter, e.g. `clustershell=debug`
    #[bpaf(long("tracing-filter"), argument("FILTER"))]
    pub tracing_filter: Option<String>,
    /// Run console commands from a file instead of stdin
    #[bpaf(long("script"), argument("FILE"))]
    pub script: Option<PathBuf>,
}

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub backend_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub container_width: Option<f32>,
    pub container_height: Option<f32>,
    pub viewport: Option<String>,
    pub ssh_user: Option<String>,
    pub ssh_key: Option<PathBuf>,
    pub tracing_filter: Option<String>,
}

#[derive(Debug)]
pub enum PrefsError {
    Read { path: PathBuf, error: String },
    Parse { path: PathBuf, error: String },
    InvalidUrl(String),
    InvalidSize(String),
}

impl std::fmt::Display for PrefsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, error } => {
                write!(f, "could not read {}: {error}", path.display())
            },
            Self::Parse { path, error } => {
                write!(f, "could not parse {}: {error}", path.display())
            },
            Self::InvalidUrl(e) => write!(f, "invalid backend url: {e}"),
            Self::InvalidSize(e) => write!(f, "invalid size: {e}"),
        }
    }
}

impl std::error::Error for PrefsError {}

#[derive(Debug, Clone, PartialEq)]
pub struct AppPreferences {
    pub backend_url: Url,
    pub request_timeout: Duration,
    pub container: Size2D<f32>,
    pub viewport: Size2D<f32>,
    pub ssh_user: Option<String>,
    pub ssh_key: Option<PathBuf>,
    pub tracing_filter: Option<String>,
    pub script: Option<PathBuf>,
}

/// `<config dir>/clustershell/config.toml`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("clustershell").join("config.toml"))
}

/// Load a config file. A missing file at the default location is not an
/// error; an explicitly named one is.
pub fn load_file_config(path: &Path, required: bool) -> Result<FileConfig, PrefsError> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(error) if !required && error.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("no config file at {}", path.display());
            return Ok(FileConfig::default());
        },
        Err(error) => {
            return Err(PrefsError::Read {
                path: path.to_path_buf(),
                error: error.to_string(),
            });
        },
    };
    toml::from_str(&text).map_err(|error| PrefsError::Parse {
        path: path.to_path_buf(),
        error: error.to_string(),
    })
}

fn parse_backend_url(value: &str) -> Result<Url, PrefsError> {
    let url = Url::parse(value).map_err(|e| PrefsError::InvalidUrl(format!("{value}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(PrefsError::InvalidUrl(format!(
            "{value}: unsupported scheme {scheme}"
        ))),
    }
}

/// Layer `file`, the environment (read through `env`) and `cli` over the
/// defaults.
pub fn resolve_preferences<E>(
    cli: &CliOptions,
    file: &FileConfig,
    env: E,
) -> Result<AppPreferences, PrefsError>
where
    E: Fn(&str) -> Option<String>,
{
    let backend_url = cli
        .backend_url
        .clone()
        .or_else(|| env(ENV_BACKEND_URL))
        .or_else(|| file.backend_url.clone())
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
    let mut prefs = AppPreferences {
        backend_url: parse_backend_url(&backend_url)?,
        request_timeout: file
            .request_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(clustershell_comms::DEFAULT_REQUEST_TIMEOUT),
        container: crate::app::DEFAULT_CONTAINER,
        viewport: crate::app::DEFAULT_VIEWPORT,
        ssh_user: None,
        ssh_key: None,
        tracing_filter: None,
        script: None,
    };

    if let Some(width) = cli.width.or(file.container_width) {
        prefs.container.width = width;
    }
    if let Some(height) = cli.height.or(file.container_height) {
        prefs.container.height = height;
    }
    if prefs.container.width <= 0.0 || prefs.container.height <= 0.0 {
        return Err(PrefsError::InvalidSize(format!(
            "container {}x{}",
            prefs.container.width, prefs.container.height
        )));
    }

    if let Some(PixelSize(size)) = cli.viewport {
        prefs.viewport = size;
    } else if let Some(value) = &file.viewport {
        prefs.viewport = value
            .parse::<PixelSize>()
            .map_err(PrefsError::InvalidSize)?
            .0;
    }

    prefs.ssh_user = cli
        .ssh_user
        .clone()
        .or_else(|| env(ENV_SSH_USER))
        .or_else(|| file.ssh_user.clone());
    prefs.ssh_key = cli
        .ssh_key
        .clone()
        .or_else(|| env(ENV_SSH_KEY).map(PathBuf::from))
        .or_else(|| file.ssh_key.clone());
    prefs.tracing_filter = cli
        .tracing_filter
        .clone()
        .or_else(|| env(ENV_TRACING_FILTER))
        .or_else(|| file.tracing_filter.clone());
    prefs.script = cli.script.clone();

    Ok(prefs)
}

pub enum ArgumentParsingResult {
    Run(AppPreferences),
    Exit,
    ErrorParsing,
}

/// Parse `args` (without the binary name) and load the matching config.
pub fn parse_command_line_arguments(args: &[String]) -> ArgumentParsingResult {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let cli = match cli_options().run_inner(&args[..]) {
        Ok(cli) => cli,
        Err(failure) => {
            failure.print_message(100);
            return if failure.exit_code() == 0 {
                ArgumentParsingResult::Exit
            } else {
                ArgumentParsingResult::ErrorParsing
            };
        },
    };

    let file = match cli.config.clone() {
        Some(path) => load_file_config(&path, true),
        None => default_config_path()
            .map(|path| load_file_config(&path, false))
            .unwrap_or_else(|| Ok(FileConfig::default())),
    };
    let preferences = file.and_then(|file| {
        resolve_preferences(&cli, &file, |key| std::env::var(key).ok())
    });
    match preferences {
        Ok(preferences) => ArgumentParsingResult::Run(preferences),
        Err(error) => {
            eprintln!("{error}");
            ArgumentParsingResult::ErrorParsing
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn parse(args: &[&str]) -> CliOptions {
        cli_options().run_inner(args).unwrap()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[rstest]
    #[case("1280x800", 1280.0, 800.0)]
    #[case("640X480", 640.0, 480.0)]
    #[case(" 300 x 200 ", 300.0, 200.0)]
    fn pixel_size_parses(#[case] input: &str, #[case] width: f32, #[case] height: f32) {
        let PixelSize(size) = input.parse().unwrap();
        assert_eq!(size, Size2D::new(width, height));
    }

    #[rstest]
    #[case("1280")]
    #[case("0x800")]
    #[case("axb")]
    #[case("-5x10")]
    fn pixel_size_rejects(#[case] input: &str) {
        assert!(input.parse::<PixelSize>().is_err());
    }

    #[test]
    fn defaults_apply_without_any_source() {
        let prefs = resolve_preferences(&parse(&[]), &FileConfig::default(), no_env).unwrap();
        assert_eq!(prefs.backend_url.as_str(), "http://127.0.0.1:5000/");
        assert_eq!(prefs.request_timeout, clustershell_comms::DEFAULT_REQUEST_TIMEOUT);
        assert_eq!(prefs.container, crate::app::DEFAULT_CONTAINER);
        assert_eq!(prefs.ssh_user, None);
    }

    #[test]
    fn flags_beat_env_beat_file() {
        let file = FileConfig {
            backend_url: Some("http://file:1".to_string()),
            ssh_user: Some("file-user".to_string()),
            tracing_filter: Some("warn".to_string()),
            ..FileConfig::default()
        };
        let env: HashMap<&str, &str> = [
            (ENV_BACKEND_URL, "http://env:2"),
            (ENV_SSH_USER, "env-user"),
        ]
        .into_iter()
        .collect();
        let cli = parse(&["--backend-url", "https://cli:3/api"]);
        let prefs =
            resolve_preferences(&cli, &file, |key| env.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(prefs.backend_url.as_str(), "https://cli:3/api");
        assert_eq!(prefs.ssh_user.as_deref(), Some("env-user"));
        assert_eq!(prefs.tracing_filter.as_deref(), Some("warn"));
    }

    #[test]
    fn size_flags_override_file() {
        let file = FileConfig {
            container_width: Some(1000.0),
            container_height: Some(500.0),
            viewport: Some("1920x1080".to_string()),
            ..FileConfig::default()
        };
        let cli = parse(&["--width", "640", "--viewport", "800x600"]);
        let prefs = resolve_preferences(&cli, &file, no_env).unwrap();
        assert_eq!(prefs.container, Size2D::new(640.0, 500.0));
        assert_eq!(prefs.viewport, Size2D::new(800.0, 600.0));
    }

    #[rstest]
    #[case("not a url")]
    #[case("ftp://example.com")]
    fn bad_backend_url_is_reported(#[case] url: &str) {
        let cli = parse(&["--backend-url", url]);
        assert!(matches!(
            resolve_preferences(&cli, &FileConfig::default(), no_env),
            Err(PrefsError::InvalidUrl(_))
        ));
    }

    #[test]
    fn config_file_round_trips_through_toml() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "backend_url = \"http://10.0.0.5:5000\"\nrequest_timeout_secs = 5\nssh_user = \"ubuntu\"\n",
        )
        .unwrap();
        let file = load_file_config(&path, true).unwrap();
        let prefs = resolve_preferences(&parse(&[]), &file, no_env).unwrap();
        assert_eq!(prefs.backend_url.as_str(), "http://10.0.0.5:5000/");
        assert_eq!(prefs.request_timeout, Duration::from_secs(5));
        assert_eq!(prefs.ssh_user.as_deref(), Some("ubuntu"));
    }

    #[test]
    fn missing_default_config_is_fine_but_named_one_is_not() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");
        assert_eq!(load_file_config(&path, false).unwrap(), FileConfig::default());
        assert!(matches!(
            load_file_config(&path, true),
            Err(PrefsError::Read { .. })
        ));
    }

    #[test]
    fn unknown_config_keys_are_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "colour = \"red\"\n").unwrap();
        assert!(matches!(
            load_file_config(&path, true),
            Err(PrefsError::Parse { .. })
        ));
    }
}
