use eyre::WrapErr;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const APP_NAME: &str = "portfolio_tracker";
const CONFIG_NAME: &str = "config";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tab shown when the TUI opens: `entry`, `entries` or `charts`.
    pub default_tab: String,
    /// Component names to hide, see `tui::Component`.
    pub disabled_components: Vec<String>,
    pub log_level: String,
    /// Log file for the TUI. Without one the TUI does not log at all.
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_tab: "entry".to_string(),
            disabled_components: Vec::new(),
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl Config {
    pub fn load() -> eyre::Result<Config> {
        confy::load(APP_NAME, CONFIG_NAME).wrap_err("failed to load configuration")
    }

    pub fn path() -> eyre::Result<PathBuf> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
            .wrap_err("failed to locate configuration file")
    }
}
