//! Supported digest algorithms and plaintext verification.

use std::fmt;
use std::str::FromStr;

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::CrackError;

/// Closed set of hash algorithms a job may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Md5,
    Sha256,
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha256 => "sha256",
        }
    }

    /// Length of the lowercase hex digest this algorithm produces.
    pub fn hex_len(&self) -> usize {
        match self {
            HashAlgorithm::Md5 => 32,
            HashAlgorithm::Sha256 => 64,
        }
    }

    pub fn digest_hex(&self, plaintext: &str) -> String {
        match self {
            HashAlgorithm::Md5 => format!("{:x}", Md5::digest(plaintext.as_bytes())),
            HashAlgorithm::Sha256 => format!("{:x}", Sha256::digest(plaintext.as_bytes())),
        }
    }

    /// True when `plaintext` hashes to `target` (expected lowercase hex).
    pub fn matches(&self, plaintext: &str, target: &str) -> bool {
        self.digest_hex(plaintext) == target
    }

    /// Normalizes a submitted digest, rejecting anything that is not hex of the right length.
    pub fn normalize_digest(&self, hash: &str) -> Result<String, CrackError> {
        let trimmed = hash.trim();
        if trimmed.is_empty() {
            return Err(CrackError::InvalidInput("hash value is required".into()));
        }
        if trimmed.len() != self.hex_len() || !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CrackError::InvalidInput(format!(
                "expected a {}-character hex {} digest",
                self.hex_len(),
                self
            )));
        }
        Ok(trimmed.to_ascii_lowercase())
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = CrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "md5" => Ok(HashAlgorithm::Md5),
            "sha256" => Ok(HashAlgorithm::Sha256),
            other => Err(CrackError::InvalidInput(format!(
                "unsupported hash algorithm: {other}"
            ))),
        }
    }
}
