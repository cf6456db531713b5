use serde::{Deserialize, Serialize};

use crate::fetch::{DEFAULT_TIMEOUT_MS, MAX_TIMEOUT_MS};

const CONFIG_PATH: &str = "unfurl.yaml";
const DEFAULT_BIND: &str = "0.0.0.0:8080";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Address the daemon listens on.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Development mode: error responses carry a raw `details` field.
    #[serde(default)]
    pub dev: bool,

    /// Fetch timeout used when the request does not ask for one.
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,

    /// Whether to attempt the best-effort web-app-manifest icon fetch.
    #[serde(default = "default_manifest_icons")]
    pub manifest_icons: bool,
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_manifest_icons() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            dev: false,
            default_timeout_ms: default_timeout_ms(),
            manifest_icons: default_manifest_icons(),
        }
    }
}

impl Config {
    fn validate(&mut self) {
        if self.default_timeout_ms == 0 || self.default_timeout_ms > MAX_TIMEOUT_MS {
            self.default_timeout_ms = DEFAULT_TIMEOUT_MS;
        }
    }

    /// Load `unfurl.yaml` from the working directory when present,
    /// otherwise use defaults. A malformed config file is a startup
    /// error.
    pub fn load() -> Self {
        let mut config: Self = match std::fs::read_to_string(CONFIG_PATH) {
            Ok(contents) => serde_yml::from_str(&contents).expect("config is malformed"),
            Err(_) => Self::default(),
        };

        config.validate();
        config
    }
}
