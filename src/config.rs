use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use strum::{Display, EnumString};

use crate::error::{Result, StoreError};

/// Split a `.env` line into key and value.
///
/// Blank lines and `#` comments yield `None`. Values may contain spaces
/// without quoting; a single pair of surrounding quotes is stripped.
fn parse_env_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let mut value = value.trim();

    let quoted = value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')));
    if quoted {
        value = &value[1..value.len() - 1];
    }

    if key.is_empty() { None } else { Some((key, value)) }
}

/// Load environment variables from a `.env` file in the working directory.
///
/// Variables already set in the environment take precedence.
pub fn load_dotenv() {
    load_dotenv_from(Path::new(".env"));
}

fn load_dotenv_from(path: &Path) {
    let Ok(content) = fs::read_to_string(path) else {
        return;
    };

    for (key, value) in content.lines().filter_map(parse_env_line) {
        if std::env::var(key).is_err() {
            // SAFETY: called from main before the runtime spawns any threads
            unsafe { std::env::set_var(key, value) };
        }
    }
}

/// Where refreshed data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Simulated,
    Snapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub refresh: RefreshConfig,
    pub snapshot: SnapshotConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    pub source: SourceKind,
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotConfig {
    pub path: PathBuf,
    /// Restore from `path` at startup.
    pub load_on_start: bool,
    /// Write the store to `path` on shutdown.
    pub save_on_exit: bool,
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Default snapshot location under the platform data directory.
pub fn default_snapshot_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("weather-store")
        .join("snapshot.json")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh: RefreshConfig {
                source: SourceKind::Simulated,
                interval_secs: 30,
            },
            snapshot: SnapshotConfig {
                path: default_snapshot_path(),
                load_on_start: true,
                save_on_exit: false,
            },
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    /// Defaults overridden by environment variables.
    ///
    /// Unparsable values are ignored and the default is kept.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(source) = lookup("SENSOR_SOURCE")
            && let Ok(s) = source.parse()
        {
            config.refresh.source = s;
        }
        if let Some(interval) = lookup("REFRESH_INTERVAL_SECS")
            && let Ok(i) = interval.parse()
        {
            config.refresh.interval_secs = i;
        }

        if let Some(path) = lookup("SNAPSHOT_PATH") {
            config.snapshot.path = PathBuf::from(path);
        }
        if let Some(load) = lookup("LOAD_ON_START")
            && let Some(b) = parse_bool(&load)
        {
            config.snapshot.load_on_start = b;
        }
        if let Some(save) = lookup("SAVE_ON_EXIT")
            && let Some(b) = parse_bool(&save)
        {
            config.snapshot.save_on_exit = b;
        }

        config
    }

    /// Reject settings the daemon cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.refresh.interval_secs == 0 {
            return Err(StoreError::InvalidConfig(
                "refresh interval must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_parse_env_line() {
        assert_eq!(parse_env_line("A=b"), Some(("A", "b")));
        assert_eq!(parse_env_line("  NAME = two words "), Some(("NAME", "two words")));
        assert_eq!(parse_env_line("Q=\"quoted value\""), Some(("Q", "quoted value")));
        assert_eq!(parse_env_line("S='x'"), Some(("S", "x")));
        assert_eq!(parse_env_line("URL=a=b"), Some(("URL", "a=b")));
        assert_eq!(parse_env_line("# comment"), None);
        assert_eq!(parse_env_line(""), None);
        assert_eq!(parse_env_line("no_equals"), None);
        assert_eq!(parse_env_line("=value"), None);
        assert_eq!(parse_env_line("E=\""), Some(("E", "\"")));
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.refresh.source, SourceKind::Simulated);
        assert_eq!(config.refresh.interval(), Duration::from_secs(30));
        assert!(config.snapshot.load_on_start);
        assert!(!config.snapshot.save_on_exit);
        assert!(config.snapshot.path.ends_with("weather-store/snapshot.json"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("SENSOR_SOURCE", "Snapshot"),
            ("REFRESH_INTERVAL_SECS", "5"),
            ("SNAPSHOT_PATH", "/tmp/weather.json"),
            ("LOAD_ON_START", "no"),
            ("SAVE_ON_EXIT", "true"),
        ]));
        assert_eq!(config.refresh.source, SourceKind::Snapshot);
        assert_eq!(config.refresh.interval_secs, 5);
        assert_eq!(config.snapshot.path, PathBuf::from("/tmp/weather.json"));
        assert!(!config.snapshot.load_on_start);
        assert!(config.snapshot.save_on_exit);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("SENSOR_SOURCE", "carrier-pigeon"),
            ("REFRESH_INTERVAL_SECS", "soon"),
            ("SAVE_ON_EXIT", "maybe"),
        ]));
        assert_eq!(config.refresh.source, SourceKind::Simulated);
        assert_eq!(config.refresh.interval_secs, 30);
        assert!(!config.snapshot.save_on_exit);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = Config::default();
        config.refresh.interval_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(StoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_dotenv_does_not_override() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".env");
        fs::write(
            &path,
            "WEATHER_STORE_TEST_NEW=from-file\nWEATHER_STORE_TEST_SET=from-file\n",
        )
        .unwrap();

        // SAFETY: test-only variables with unique names
        unsafe { std::env::set_var("WEATHER_STORE_TEST_SET", "from-env") };
        load_dotenv_from(&path);

        assert_eq!(std::env::var("WEATHER_STORE_TEST_NEW").unwrap(), "from-file");
        assert_eq!(std::env::var("WEATHER_STORE_TEST_SET").unwrap(), "from-env");
    }
}
