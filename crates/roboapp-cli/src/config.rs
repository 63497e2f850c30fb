//! Configuration – reads `roboapp/config.toml` from the XDG config directory.

use roboapp_types::DashError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings shared by every roboapp process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// WebSocket port of the UI bridge.
    #[serde(default = "default_websocket_port")]
    pub websocket_port: u16,

    /// Prefix placed in front of every key expression (empty for none).
    #[serde(default)]
    pub zenoh_prefix: String,
}

/// Settings specific to the dashboard front-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuiConfig {
    #[serde(default = "default_host")]
    pub host: String,
}

/// Contents of `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: GlobalConfig,
    /// Present only when the file has a `[gui]` table.
    pub gui: Option<GuiConfig>,
}

fn default_websocket_port() -> u16 {
    8080
}
fn default_host() -> String {
    "localhost".to_string()
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            websocket_port: default_websocket_port(),
            zenoh_prefix: String::new(),
        }
    }
}

impl Default for GuiConfig {
    fn default() -> Self {
        Self { host: default_host() }
    }
}

/// Return the config path: `$ROBOAPP_CONFIG`, else
/// `$XDG_CONFIG_HOME/roboapp/config.toml`, else
/// `$HOME/.config/roboapp/config.toml`.
pub fn config_path() -> PathBuf {
    if let Ok(explicit) = std::env::var("ROBOAPP_CONFIG") {
        return PathBuf::from(explicit);
    }
    config_path_for(
        std::env::var("XDG_CONFIG_HOME").ok().as_deref(),
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path from an optional XDG config dir and a home dir.
/// Extracted for testability without mutating environment variables.
pub(crate) fn config_path_for(xdg_config_home: Option<&str>, home: &str) -> PathBuf {
    let base = match xdg_config_home {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(home).join(".config"),
    };
    base.join("roboapp").join("config.toml")
}

/// Load the config at `path` and apply environment overrides.  Returns
/// `None` if the file does not exist.
pub fn load(path: &Path) -> Result<Option<Config>, DashError> {
    load_with(path, |name| std::env::var(name).ok())
}

/// Same as [`load`], reading overrides through `lookup`.
pub(crate) fn load_with<F>(path: &Path, lookup: F) -> Result<Option<Config>, DashError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut cfg = load_from(path)?;
    if let Some(cfg) = cfg.as_mut() {
        apply_overrides_from(cfg, lookup);
    }
    Ok(cfg)
}

/// Load the config from a specific path.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, DashError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|e| {
        DashError::Config(format!("failed to read {}: {}", path.display(), e))
    })?;
    let cfg: Config = toml::from_str(&raw)
        .map_err(|e| DashError::Config(format!("failed to parse {}: {}", path.display(), e)))?;
    Ok(Some(cfg))
}

/// Apply `ROBOAPP_*` overrides to `cfg`, reading each variable through
/// `lookup` (the process environment in [`load`]).
///
/// | Variable | Config field |
/// |---|---|
/// | `ROBOAPP_ZENOH_PREFIX` | `global.zenoh_prefix` |
/// | `ROBOAPP_WEBSOCKET_PORT` | `global.websocket_port` |
pub(crate) fn apply_overrides_from<F>(cfg: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("ROBOAPP_ZENOH_PREFIX") {
        cfg.global.zenoh_prefix = v;
    }
    if let Some(v) = lookup("ROBOAPP_WEBSOCKET_PORT")
        && let Ok(port) = v.parse::<u16>()
    {
        cfg.global.websocket_port = port;
    }
}
