use serde::{Deserialize, Serialize};
use std::path::Path;

pub const APP_NAME: &str = "dishwatch";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the hub listens on
    pub bind: String,
    /// Path clients upgrade to a WebSocket on
    pub hub_path: String,
    /// Inbound text frames above this size are answered with an error and dropped
    pub max_message_bytes: usize,
    /// tracing filter directive, overridden by RUST_LOG
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8890".into(),
            hub_path: "/hubs/dish-viewers".into(),
            max_message_bytes: 4096,
            log_filter: "info".into(),
        }
    }
}

impl Config {
    /// Load from an explicit file, or from the per-user config location.
    /// A missing file is created with the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, confy::ConfyError> {
        match path {
            Some(path) => confy::load_path(path),
            None => confy::load(APP_NAME, None),
        }
    }
}
