//! Technique workers: the uniform interface the orchestrator drives, plus the
//! built-in reference implementations.
//!
//! A [`Technique`] is synchronous and CPU-bound. The orchestrator runs it on
//! the blocking pool and hands it a [`CancellationToken`]; implementations
//! must call [`CrackRequest::should_stop`] at bounded intervals and return
//! [`Attempt::Interrupted`] once it reports true.

mod brute_force;
mod dictionary;
mod hybrid;
mod mask;
mod rainbow;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::CrackError;
use crate::hashing::HashAlgorithm;

pub use brute_force::BruteForce;
pub use dictionary::{DEFAULT_WORDS, Dictionary, DictionaryAttack};
pub use hybrid::HybridAttack;
pub use mask::MaskAttack;
pub use rainbow::RainbowTable;

/// The closed set of cracking strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TechniqueKind {
    #[serde(rename = "brute_force")]
    BruteForce,
    #[serde(rename = "dictionary_attack")]
    Dictionary,
    #[serde(rename = "rainbow_table")]
    RainbowTable,
    #[serde(rename = "hybrid_attack")]
    Hybrid,
    #[serde(rename = "mask_attack")]
    Mask,
}

impl TechniqueKind {
    pub const ALL: [TechniqueKind; 5] = [
        TechniqueKind::BruteForce,
        TechniqueKind::Dictionary,
        TechniqueKind::RainbowTable,
        TechniqueKind::Hybrid,
        TechniqueKind::Mask,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TechniqueKind::BruteForce => "brute_force",
            TechniqueKind::Dictionary => "dictionary_attack",
            TechniqueKind::RainbowTable => "rainbow_table",
            TechniqueKind::Hybrid => "hybrid_attack",
            TechniqueKind::Mask => "mask_attack",
        }
    }
}

impl fmt::Display for TechniqueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TechniqueKind {
    type Err = CrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "brute_force" | "bruteforce" | "brute" => Ok(TechniqueKind::BruteForce),
            "dictionary_attack" | "dictionaryattack" | "dictionary" => {
                Ok(TechniqueKind::Dictionary)
            }
            "rainbow_table" | "rainbowtable" | "rainbow" => Ok(TechniqueKind::RainbowTable),
            "hybrid_attack" | "hybridattack" | "hybrid" => Ok(TechniqueKind::Hybrid),
            "mask_attack" | "maskattack" | "mask" => Ok(TechniqueKind::Mask),
            _ => Err(CrackError::InvalidInput(format!("unknown technique: {s}"))),
        }
    }
}

/// Everything a worker needs for one attempt.
#[derive(Debug, Clone)]
pub struct CrackRequest {
    /// Target digest, lowercase hex.
    pub hash: String,
    pub algorithm: HashAlgorithm,
    /// Point past which the worker must give up. `None` means unbounded.
    pub deadline: Option<Instant>,
    pub dictionary: Option<Arc<Dictionary>>,
}

impl CrackRequest {
    pub fn should_stop(&self, cancel: &CancellationToken) -> bool {
        cancel.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    pub fn matches(&self, guess: &str) -> bool {
        self.algorithm.matches(guess, &self.hash)
    }

    /// Custom dictionary words if one was configured, else the built-in list.
    pub fn words(&self) -> Vec<&str> {
        match &self.dictionary {
            Some(dict) => dict.words().iter().map(String::as_str).collect(),
            None => DEFAULT_WORDS.to_vec(),
        }
    }
}

/// How a single technique run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    Found(String),
    Exhausted,
    /// Stopped by deadline or cancellation before finishing the search space.
    Interrupted,
}

pub trait Technique: Send + Sync {
    fn kind(&self) -> TechniqueKind;

    fn crack(
        &self,
        request: &CrackRequest,
        cancel: &CancellationToken,
    ) -> Result<Attempt, CrackError>;
}

/// Walks `candidates` in order, checking for a match and for interruption.
pub(crate) fn try_candidates<I>(
    request: &CrackRequest,
    cancel: &CancellationToken,
    candidates: I,
) -> Attempt
where
    I: IntoIterator<Item = String>,
{
    for (i, guess) in candidates.into_iter().enumerate() {
        if i % 256 == 0 && request.should_stop(cancel) {
            return Attempt::Interrupted;
        }
        if request.matches(&guess) {
            return Attempt::Found(guess);
        }
    }
    Attempt::Exhausted
}

/// The built-in worker for every kind, keyed by kind.
pub fn builtin_techniques(brute_force_max_length: usize) -> BTreeMap<TechniqueKind, Arc<dyn Technique>> {
    let mut set: BTreeMap<TechniqueKind, Arc<dyn Technique>> = BTreeMap::new();
    set.insert(
        TechniqueKind::BruteForce,
        Arc::new(BruteForce::new(brute_force_max_length)),
    );
    set.insert(TechniqueKind::Dictionary, Arc::new(DictionaryAttack));
    set.insert(TechniqueKind::RainbowTable, Arc::new(RainbowTable::builtin()));
    set.insert(TechniqueKind::Hybrid, Arc::new(HybridAttack::default()));
    set.insert(TechniqueKind::Mask, Arc::new(MaskAttack::default()));
    set
}

#[cfg(test)]
pub(crate) fn request_for(plaintext: &str, algorithm: HashAlgorithm) -> CrackRequest {
    CrackRequest {
        hash: algorithm.digest_hex(plaintext),
        algorithm,
        deadline: None,
        dictionary: None,
    }
}
