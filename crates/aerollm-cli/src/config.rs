//! Configuration vault – reads/writes `~/.aerollm/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use aerollm_runtime::{EndpointConfig, Sampling, SchedulerConfig};
use serde::{Deserialize, Serialize};

/// Persisted user configuration.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// OpenAI-compatible base URL, including the version prefix.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer credential (stored as plain text – the file is written with
    /// owner-only permissions).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_key: String,

    /// Model identifier (e.g. "llama3", "gpt-4o-mini").
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Wait between ticks, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Per-request timeout, in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Replaces the built-in system prompt when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field(
                "api_key",
                if self.api_key.is_empty() { &"<not set>" } else { &"<redacted>" },
            )
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("system_prompt", &self.system_prompt.as_ref().map(|_| "<custom>"))
            .finish()
    }
}

fn default_base_url() -> String {
    "http://localhost:11434/v1".to_string()
}
fn default_model() -> String {
    "llama3".to_string()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_max_tokens() -> u32 {
    256
}
fn default_poll_interval_ms() -> u64 {
    1000
}
fn default_request_timeout_ms() -> u64 {
    5000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            system_prompt: None,
        }
    }
}

impl Config {
    pub fn endpoint(&self) -> EndpointConfig {
        EndpointConfig::new(&self.base_url).with_api_key(self.api_key.clone())
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            model: self.model.clone(),
            sampling: Sampling {
                temperature: self.temperature,
                max_tokens: self.max_tokens,
            },
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            system_prompt: self.system_prompt.clone(),
        }
    }
}

/// Return the path to `~/.aerollm/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".aerollm").join("config.toml")
}

/// Load the config from `path`, applying environment overrides.
/// Returns `None` if the file does not exist.
pub fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `AEROLLM_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `AEROLLM_BASE_URL` | `base_url` |
/// | `AEROLLM_API_KEY` | `api_key` |
/// | `AEROLLM_MODEL` | `model` |
/// | `AEROLLM_POLL_INTERVAL_MS` | `poll_interval_ms` |
/// | `AEROLLM_REQUEST_TIMEOUT_MS` | `request_timeout_ms` |
///
/// Numeric values that do not parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("AEROLLM_BASE_URL") {
        cfg.base_url = v;
    }
    if let Ok(v) = std::env::var("AEROLLM_API_KEY") {
        cfg.api_key = v;
    }
    if let Ok(v) = std::env::var("AEROLLM_MODEL") {
        cfg.model = v;
    }
    if let Ok(v) = std::env::var("AEROLLM_POLL_INTERVAL_MS")
        && let Ok(ms) = v.trim().parse::<u64>()
    {
        cfg.poll_interval_ms = ms;
    }
    if let Ok(v) = std::env::var("AEROLLM_REQUEST_TIMEOUT_MS")
        && let Ok(ms) = v.trim().parse::<u64>()
    {
        cfg.request_timeout_ms = ms;
    }
}

/// Save the config to `path`, creating the parent directory if necessary.
///
/// Only a directory created here is restricted to the owner; an existing
/// parent keeps its permissions.
pub fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    prepare_parent(path)?;
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}

fn prepare_parent(path: &Path) -> Result<(), String> {
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    if parent.exists() {
        return Ok(());
    }
    fs::create_dir_all(parent)
        .map_err(|e| format!("Failed to create config directory: {}", e))?;
    // Owner only (rwx------): the file may hold a credential.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
            .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
    }
    Ok(())
}
