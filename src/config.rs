//! Configuration management for mcu-sim.
//!
//! Configuration is loaded from multiple sources in priority order:
//! 1. Environment variables (MCU_SIM_CLOCK_HZ, MCU_SIM_DISPLAY, MCU_SIM_MAX_CYCLES)
//! 2. Project-local config file (`./mcu-sim.toml`)
//! 3. User config file (`~/.config/mcu-sim/config.toml`)
//! 4. Built-in defaults
//!
//! # Config File Format
//!
//! ```toml
//! # mcu-sim.toml
//!
//! # Automatic clock frequency in Hz
//! clock_hz = 1000
//!
//! # How OUTPUT is shown: "numeric" or "traffic-lights"
//! display = "traffic-lights"
//!
//! # Cycle limit for `mcu-sim run`
//! max_cycles = 10000
//! ```

use crate::panel::DisplayMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Global cached configuration.
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Default automatic clock frequency (1 kHz).
pub const DEFAULT_CLOCK_HZ: u32 = 1000;

/// Default cycle limit for batch runs.
pub const DEFAULT_MAX_CYCLES: u64 = 10_000;

/// Values as read from one source; unset fields defer to lower priority.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    clock_hz: Option<u32>,
    display: Option<DisplayMode>,
    max_cycles: Option<u64>,
}

/// mcu-sim configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Automatic clock frequency.
    pub clock_hz: u32,
    /// How OUTPUT is presented.
    pub display: DisplayMode,
    /// Cycle limit for batch runs.
    pub max_cycles: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clock_hz: DEFAULT_CLOCK_HZ,
            display: DisplayMode::Numeric,
            max_cycles: DEFAULT_MAX_CYCLES,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. Project-local `mcu-sim.toml`
    /// 3. User config `~/.config/mcu-sim/config.toml`
    /// 4. Defaults
    pub fn load() -> Self {
        let mut config = Self::default();

        // Load user config first (lowest priority of file configs)
        if let Some(user_config) = Self::user_config_path().and_then(|p| Self::load_from_file(&p)) {
            config.merge(user_config);
        }

        // Load project-local config (higher priority)
        if let Some(local_config) = Self::load_from_file(Path::new("mcu-sim.toml")) {
            config.merge(local_config);
        }

        // Environment variables override everything
        config.apply_env_overrides(|key| std::env::var(key).ok());

        config
    }

    /// Get the cached global configuration.
    ///
    /// Loads configuration on first call and caches it.
    pub fn get() -> &'static Config {
        CONFIG.get_or_init(|| {
            let config = Self::load();
            log::debug!("Loaded configuration: {:?}", config);
            config
        })
    }

    /// Parse a config file body and layer it over the defaults.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        let file: ConfigFile = toml::from_str(content)?;
        let mut config = Self::default();
        config.merge(file);
        Ok(config)
    }

    /// Path to the user config file.
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("mcu-sim").join("config.toml"))
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Option<ConfigFile> {
        if !path.exists() {
            return None;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    Some(config)
                }
                Err(e) => {
                    log::warn!("Failed to parse {}: {}", path.display(), e);
                    None
                }
            },
            Err(e) => {
                log::warn!("Failed to read {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Merge another config into this one.
    /// Only overrides fields that are set in the other config.
    fn merge(&mut self, other: ConfigFile) {
        if let Some(hz) = other.clock_hz {
            self.clock_hz = hz;
        }
        if let Some(display) = other.display {
            self.display = display;
        }
        if let Some(max_cycles) = other.max_cycles {
            self.max_cycles = max_cycles;
        }
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(value) = var("MCU_SIM_CLOCK_HZ") {
            match value.parse() {
                Ok(hz) => {
                    log::info!("Using MCU_SIM_CLOCK_HZ from environment: {}", hz);
                    self.clock_hz = hz;
                }
                Err(_) => log::warn!("Ignoring invalid MCU_SIM_CLOCK_HZ: {}", value),
            }
        }
        if let Some(value) = var("MCU_SIM_DISPLAY") {
            match value.as_str() {
                "numeric" => self.display = DisplayMode::Numeric,
                "traffic-lights" => self.display = DisplayMode::TrafficLights,
                _ => log::warn!("Ignoring invalid MCU_SIM_DISPLAY: {}", value),
            }
        }
        if let Some(value) = var("MCU_SIM_MAX_CYCLES") {
            match value.parse() {
                Ok(max) => self.max_cycles = max,
                Err(_) => log::warn!("Ignoring invalid MCU_SIM_MAX_CYCLES: {}", value),
            }
        }
    }

    /// Generate a sample config file content.
    pub fn sample_config() -> String {
        r#"# mcu-sim configuration
# Place this file at ~/.config/mcu-sim/config.toml or ./mcu-sim.toml

# Automatic clock frequency in Hz
clock_hz = 1000

# How OUTPUT is shown: "numeric" or "traffic-lights"
display = "numeric"

# Cycle limit for `mcu-sim run`
max_cycles = 10000
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.clock_hz, 1000);
        assert_eq!(config.display, DisplayMode::Numeric);
        assert_eq!(config.max_cycles, 10_000);
    }

    #[test]
    fn test_partial_file() {
        let config = Config::from_toml("display = \"traffic-lights\"\n").unwrap();
        assert_eq!(config.display, DisplayMode::TrafficLights);
        assert_eq!(config.clock_hz, DEFAULT_CLOCK_HZ);
    }

    #[test]
    fn test_sample_parses() {
        let config = Config::from_toml(&Config::sample_config()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(Config::from_toml("clock = 5\n").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("MCU_SIM_CLOCK_HZ", "50"),
            ("MCU_SIM_DISPLAY", "traffic-lights"),
            ("MCU_SIM_MAX_CYCLES", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.clock_hz, 50);
        assert_eq!(config.display, DisplayMode::TrafficLights);
        assert_eq!(config.max_cycles, DEFAULT_MAX_CYCLES);
    }

    #[test]
    fn test_missing_file_ignored() {
        assert!(Config::load_from_file(Path::new("/nonexistent/mcu-sim.toml")).is_none());
    }
}
