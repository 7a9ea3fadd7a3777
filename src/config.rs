//! hashcrack configuration loaded from `hashcrack.toml`.
//!
//! Every field has a default, so a missing file or a partial one is fine.
//! `HASHCRACK_CONFIG` points at an alternative file; an explicit `--config`
//! path wins over both.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::registry::SettingsUpdate;
use crate::strength::StrengthPolicy;
use crate::technique::TechniqueKind;

const DEFAULT_PATH: &str = "hashcrack.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HashcrackConfig {
    /// How often the CLI polls job progress.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// How long a finished job stays queryable.
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,

    /// Period of the eviction sweep.
    #[serde(default = "default_reaper_interval_secs")]
    pub reaper_interval_secs: u64,

    /// Upper bound for a custom dictionary upload.
    #[serde(default = "default_max_dictionary_bytes")]
    pub max_dictionary_bytes: usize,

    /// Initial technique toggles.
    #[serde(default)]
    pub techniques: TechniqueToggles,

    #[serde(default)]
    pub brute_force: BruteForceConfig,

    /// Per-technique time ceilings in seconds, keyed by wire name.
    #[serde(default)]
    pub ceilings: BTreeMap<TechniqueKind, f64>,

    #[serde(default)]
    pub strength: StrengthPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TechniqueToggles {
    #[serde(default = "enabled")]
    pub brute_force: bool,
    #[serde(default = "enabled")]
    pub dictionary_attack: bool,
    #[serde(default = "enabled")]
    pub rainbow_table: bool,
    #[serde(default = "enabled")]
    pub hybrid_attack: bool,
    #[serde(default = "enabled")]
    pub mask_attack: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BruteForceConfig {
    /// Longest candidate the brute-force worker generates.
    #[serde(default = "default_max_length")]
    pub max_length: usize,
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_retention_secs() -> u64 {
    3600
}

fn default_reaper_interval_secs() -> u64 {
    60
}

// 5 MiB, the upload limit of the settings form.
fn default_max_dictionary_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_max_length() -> usize {
    4
}

fn enabled() -> bool {
    true
}

impl Default for TechniqueToggles {
    fn default() -> Self {
        Self {
            brute_force: true,
            dictionary_attack: true,
            rainbow_table: true,
            hybrid_attack: true,
            mask_attack: true,
        }
    }
}

impl Default for BruteForceConfig {
    fn default() -> Self {
        Self {
            max_length: default_max_length(),
        }
    }
}

impl Default for HashcrackConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            retention_secs: default_retention_secs(),
            reaper_interval_secs: default_reaper_interval_secs(),
            max_dictionary_bytes: default_max_dictionary_bytes(),
            techniques: TechniqueToggles::default(),
            brute_force: BruteForceConfig::default(),
            ceilings: BTreeMap::new(),
            strength: StrengthPolicy::default(),
        }
    }
}

impl TechniqueToggles {
    pub fn to_settings(&self) -> SettingsUpdate {
        SettingsUpdate {
            brute_force: self.brute_force,
            dictionary_attack: self.dictionary_attack,
            rainbow_table: self.rainbow_table,
            hybrid_attack: self.hybrid_attack,
            mask_attack: self.mask_attack,
            custom_dictionary: None,
        }
    }
}

impl HashcrackConfig {
    /// Loads from `explicit`, else `HASHCRACK_CONFIG`, else `./hashcrack.toml`.
    /// A missing default file yields defaults; a missing explicit file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        if let Ok(path) = std::env::var("HASHCRACK_CONFIG") {
            if !path.is_empty() {
                return Self::load_from(Path::new(&path));
            }
        }
        let path = PathBuf::from(DEFAULT_PATH);
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = toml::from_str::<HashcrackConfig>(&contents)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(10))
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub fn reaper_interval(&self) -> Duration {
        Duration::from_secs(self.reaper_interval_secs.max(1))
    }

    /// Ceiling durations; non-positive or unrepresentable entries are dropped.
    pub fn ceiling_durations(&self) -> BTreeMap<TechniqueKind, Duration> {
        self.ceilings
            .iter()
            .filter(|(_, secs)| **secs > 0.0)
            .filter_map(|(kind, secs)| {
                Duration::try_from_secs_f64(*secs)
                    .ok()
                    .map(|d| (*kind, d))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_values() {
        let config = HashcrackConfig::default();
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.retention_secs, 3600);
        assert_eq!(config.max_dictionary_bytes, 5 * 1024 * 1024);
        assert_eq!(config.brute_force.max_length, 4);
        assert!(config.ceilings.is_empty());
        assert_eq!(config.techniques.to_settings(), SettingsUpdate::all_enabled());
    }

    #[test]
    fn deserialize_partial_toml() {
        let toml_str = r#"
            retention_secs = 120

            [techniques]
            brute_force = false

            [brute_force]
            max_length = 3

            [ceilings]
            hybrid_attack = 2.5

            [strength]
            weak_max_secs = 1.0
        "#;
        let config: HashcrackConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.retention(), Duration::from_secs(120));
        assert_eq!(config.poll_interval_ms, 250);
        assert!(!config.techniques.brute_force);
        assert!(config.techniques.mask_attack);
        assert_eq!(config.brute_force.max_length, 3);
        assert_eq!(
            config.ceiling_durations()[&TechniqueKind::Hybrid],
            Duration::from_millis(2500)
        );
        assert_eq!(config.strength.weak_max(), Duration::from_secs(1));
    }

    #[test]
    fn unknown_ceiling_key_is_rejected() {
        let toml_str = r#"
            [ceilings]
            markov_chain_attack = 1
        "#;
        assert!(toml::from_str::<HashcrackConfig>(toml_str).is_err());
    }

    #[test]
    fn non_positive_ceilings_are_dropped() {
        let toml_str = r#"
            [ceilings]
            mask_attack = 0
            brute_force = -3
        "#;
        let config: HashcrackConfig = toml::from_str(toml_str).unwrap();
        assert!(config.ceiling_durations().is_empty());
    }

    #[test]
    fn load_from_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "poll_interval_ms = 50").unwrap();
        let config = HashcrackConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(50));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(HashcrackConfig::load(Some(&missing)).is_err());
    }
}
