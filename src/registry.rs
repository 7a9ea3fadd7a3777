//! Technique selection and the custom dictionary, versioned and swapped atomically.
//!
//! Jobs never see the registry itself, only an [`Arc<TechniqueConfig>`]
//! snapshot taken at submission. Publishing a new config replaces the `Arc`;
//! snapshots already handed out stay untouched.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::CrackError;
use crate::technique::{Dictionary, TechniqueKind};

/// Immutable, published technique configuration.
#[derive(Debug, Clone)]
pub struct TechniqueConfig {
    enabled: BTreeMap<TechniqueKind, bool>,
    dictionary: Option<Arc<Dictionary>>,
    version: u64,
}

impl TechniqueConfig {
    pub fn is_enabled(&self, kind: TechniqueKind) -> bool {
        self.enabled.get(&kind).copied().unwrap_or(false)
    }

    /// Enabled kinds in declaration order.
    pub fn enabled_kinds(&self) -> Vec<TechniqueKind> {
        TechniqueKind::ALL
            .into_iter()
            .filter(|kind| self.is_enabled(*kind))
            .collect()
    }

    pub fn toggles(&self) -> &BTreeMap<TechniqueKind, bool> {
        &self.enabled
    }

    pub fn dictionary(&self) -> Option<&Arc<Dictionary>> {
        self.dictionary.as_ref()
    }

    pub fn version(&self) -> u64 {
        self.version
    }
}

/// A requested settings change, shaped like the `updateSettings` payload.
///
/// The dictionary is not part of the JSON body; it is attached after the
/// upload has been validated into a [`Dictionary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SettingsUpdate {
    pub brute_force: bool,
    pub dictionary_attack: bool,
    pub rainbow_table: bool,
    pub hybrid_attack: bool,
    pub mask_attack: bool,
    #[serde(skip)]
    pub custom_dictionary: Option<Arc<Dictionary>>,
}

impl Default for SettingsUpdate {
    fn default() -> Self {
        Self::all_enabled()
    }
}

impl SettingsUpdate {
    pub fn all_enabled() -> Self {
        Self::only(&TechniqueKind::ALL)
    }

    pub fn only(kinds: &[TechniqueKind]) -> Self {
        let mut update = Self {
            brute_force: false,
            dictionary_attack: false,
            rainbow_table: false,
            hybrid_attack: false,
            mask_attack: false,
            custom_dictionary: None,
        };
        for kind in kinds {
            update.set(*kind, true);
        }
        update
    }

    pub fn with_dictionary(mut self, dictionary: Dictionary) -> Self {
        self.custom_dictionary = Some(Arc::new(dictionary));
        self
    }

    pub fn set(&mut self, kind: TechniqueKind, enabled: bool) {
        match kind {
            TechniqueKind::BruteForce => self.brute_force = enabled,
            TechniqueKind::Dictionary => self.dictionary_attack = enabled,
            TechniqueKind::RainbowTable => self.rainbow_table = enabled,
            TechniqueKind::Hybrid => self.hybrid_attack = enabled,
            TechniqueKind::Mask => self.mask_attack = enabled,
        }
    }

    pub fn enabled(&self, kind: TechniqueKind) -> bool {
        match kind {
            TechniqueKind::BruteForce => self.brute_force,
            TechniqueKind::Dictionary => self.dictionary_attack,
            TechniqueKind::RainbowTable => self.rainbow_table,
            TechniqueKind::Hybrid => self.hybrid_attack,
            TechniqueKind::Mask => self.mask_attack,
        }
    }

    fn validate(&self) -> Result<(), CrackError> {
        if TechniqueKind::ALL.iter().any(|k| self.enabled(*k)) {
            Ok(())
        } else {
            Err(CrackError::InvalidConfiguration(
                "at least one technique must remain enabled".into(),
            ))
        }
    }

    fn into_config(self, version: u64) -> TechniqueConfig {
        let enabled = TechniqueKind::ALL
            .iter()
            .map(|kind| (*kind, self.enabled(*kind)))
            .collect();
        TechniqueConfig {
            enabled,
            dictionary: self.custom_dictionary,
            version,
        }
    }
}

/// Holder of the current [`TechniqueConfig`].
#[derive(Debug)]
pub struct TechniqueRegistry {
    current: RwLock<Arc<TechniqueConfig>>,
}

impl TechniqueRegistry {
    /// Publishes `initial` as version 1.
    ///
    /// Unlike [`update_config`](Self::update_config) this accepts a config with
    /// nothing enabled; submissions against it fail with `NoTechniquesEnabled`.
    pub fn new(initial: SettingsUpdate) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial.into_config(1))),
        }
    }

    /// Replaces the configuration. On error the previous one stays in effect.
    pub fn update_config(&self, update: SettingsUpdate) -> Result<Arc<TechniqueConfig>, CrackError> {
        update.validate()?;

        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let next = Arc::new(update.into_config(current.version + 1));
        *current = Arc::clone(&next);

        info!(
            version = next.version,
            enabled = ?next.enabled_kinds(),
            custom_dictionary = next.dictionary.is_some(),
            "technique settings updated"
        );
        Ok(next)
    }

    pub fn snapshot(&self) -> Arc<TechniqueConfig> {
        let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&current)
    }
}
