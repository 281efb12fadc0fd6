// src/config.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::tools::{Tool, ToolInvocation, ToolRegistry};
use crate::logging::{PROJECT_NAME, get_config_dir, get_data_dir};

pub const CONFIG_FILE: &str = "config.json";

/// Runtime settings of the engine.
///
/// A `0` timeout or concurrency means "no limit".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconConfig {
    /// Per-tool program overrides, e.g. `{"nmap": {"program": "sudo", "args": ["nmap"]}}`.
    #[serde(default)]
    pub tools: ToolRegistry,

    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,

    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Where nmap writes its XML reports.
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,

    /// Runs the seven-category NSE battery after the service scan. Slow and
    /// very noisy, so off unless asked for.
    #[serde(default)]
    pub script_scan: bool,
}

fn default_command_timeout_secs() -> u64 {
    3600
}
fn default_max_concurrency() -> usize {
    16
}
fn default_results_dir() -> PathBuf {
    get_data_dir().join("results")
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            tools: ToolRegistry::default(),
            command_timeout_secs: default_command_timeout_secs(),
            max_concurrency: default_max_concurrency(),
            results_dir: default_results_dir(),
            script_scan: false,
        }
    }
}

impl ReconConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("reading {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .wrap_err_with(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Reads `config.json` from the config directory when it exists, then
    /// applies environment overrides.
    pub fn load() -> Result<Self> {
        let path = get_config_dir().join(CONFIG_FILE);
        let mut config = if path.exists() {
            info!(path = %path.display(), "Loading configuration.");
            Self::from_json_file(&path)?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Overrides fields from `<PROJECT>_TIMEOUT`, `<PROJECT>_MAX_CONCURRENCY`,
    /// `<PROJECT>_RESULTS_DIR`, `<PROJECT>_SCRIPT_SCAN` (`true`/`false`,
    /// `1`/`0`) and `<PROJECT>_NMAP` (a whitespace separated command such as
    /// `sudo nmap`). Unparsable values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |suffix: &str| lookup(&format!("{}_{suffix}", PROJECT_NAME.as_str()));

        if let Some(raw) = var("TIMEOUT") {
            match raw.trim().parse::<u64>() {
                Ok(secs) => self.command_timeout_secs = secs,
                Err(_) => warn!(value = %raw, "Ignoring invalid timeout override."),
            }
        }
        if let Some(raw) = var("MAX_CONCURRENCY") {
            match raw.trim().parse::<usize>() {
                Ok(n) => self.max_concurrency = n,
                Err(_) => warn!(value = %raw, "Ignoring invalid concurrency override."),
            }
        }
        if let Some(dir) = var("RESULTS_DIR").filter(|d| !d.trim().is_empty()) {
            self.results_dir = PathBuf::from(dir);
        }
        if let Some(raw) = var("SCRIPT_SCAN") {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => self.script_scan = true,
                "0" | "false" | "no" => self.script_scan = false,
                _ => warn!(value = %raw, "Ignoring invalid script scan override."),
            }
        }
        if let Some(raw) = var("NMAP") {
            let mut words = raw.split_whitespace().map(String::from);
            if let Some(program) = words.next() {
                let invocation = ToolInvocation { program, args: words.collect() };
                self.tools = std::mem::take(&mut self.tools).with(Tool::Nmap, invocation);
            }
        }
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        (self.command_timeout_secs > 0).then(|| Duration::from_secs(self.command_timeout_secs))
    }

    pub fn concurrency_limit(&self) -> Option<usize> {
        (self.max_concurrency > 0).then_some(self.max_concurrency)
    }
}
