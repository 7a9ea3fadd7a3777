use std::path::Path;

use tokio_util::sync::CancellationToken;

use super::{Attempt, CrackRequest, Technique, TechniqueKind, try_candidates};
use crate::error::CrackError;

/// Words tried when no custom dictionary is configured.
pub const DEFAULT_WORDS: &[&str] = &["password", "123456", "123456789", "qwerty"];

/// A validated, read-only word list.
///
/// Construction is the size/type boundary: once built, a dictionary is known
/// to be UTF-8 text within the configured limit with at least one word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dictionary {
    words: Vec<String>,
    size_bytes: usize,
}

impl Dictionary {
    pub fn from_bytes(bytes: &[u8], max_bytes: usize) -> Result<Self, CrackError> {
        if bytes.len() > max_bytes {
            return Err(CrackError::InvalidConfiguration(format!(
                "custom dictionary is {} bytes, limit is {max_bytes}",
                bytes.len()
            )));
        }
        let text = std::str::from_utf8(bytes).map_err(|_| {
            CrackError::InvalidConfiguration("custom dictionary must be plain UTF-8 text".into())
        })?;
        if text.contains('\0') {
            return Err(CrackError::InvalidConfiguration(
                "custom dictionary must be plain UTF-8 text".into(),
            ));
        }

        let words: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();
        if words.is_empty() {
            return Err(CrackError::InvalidConfiguration(
                "custom dictionary contains no words".into(),
            ));
        }

        Ok(Self {
            words,
            size_bytes: bytes.len(),
        })
    }

    pub fn load(path: &Path, max_bytes: usize) -> Result<Self, CrackError> {
        let len = std::fs::metadata(path)?.len();
        if len > max_bytes as u64 {
            return Err(CrackError::InvalidConfiguration(format!(
                "custom dictionary {} is {len} bytes, limit is {max_bytes}",
                path.display()
            )));
        }
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes, max_bytes)
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }
}

/// Plain word-list lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct DictionaryAttack;

impl Technique for DictionaryAttack {
    fn kind(&self) -> TechniqueKind {
        TechniqueKind::Dictionary
    }

    fn crack(
        &self,
        request: &CrackRequest,
        cancel: &CancellationToken,
    ) -> Result<Attempt, CrackError> {
        let words = request.words();
        Ok(try_candidates(
            request,
            cancel,
            words.into_iter().map(str::to_string),
        ))
    }
}
