use std::collections::HashMap;

use tokio_util::sync::CancellationToken;

use super::{Attempt, CrackRequest, Technique, TechniqueKind};
use crate::error::CrackError;
use crate::hashing::HashAlgorithm;

/// Precomputed digest → plaintext lookup for a single algorithm.
#[derive(Debug, Clone)]
pub struct RainbowTable {
    algorithm: HashAlgorithm,
    table: HashMap<String, String>,
}

impl RainbowTable {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            table: HashMap::new(),
        }
    }

    /// The small MD5 table shipped with the crate.
    pub fn builtin() -> Self {
        let mut table = Self::new(HashAlgorithm::Md5);
        table.insert_plaintext("password");
        table.insert_plaintext("abc123");
        table
    }

    /// Hashes `plaintext` with the table's algorithm and stores the pair.
    pub fn insert_plaintext(&mut self, plaintext: &str) {
        let digest = self.algorithm.digest_hex(plaintext);
        self.table.insert(digest, plaintext.to_string());
    }
}

impl Technique for RainbowTable {
    fn kind(&self) -> TechniqueKind {
        TechniqueKind::RainbowTable
    }

    fn crack(
        &self,
        request: &CrackRequest,
        cancel: &CancellationToken,
    ) -> Result<Attempt, CrackError> {
        if request.should_stop(cancel) {
            return Ok(Attempt::Interrupted);
        }
        if request.algorithm != self.algorithm {
            return Ok(Attempt::Exhausted);
        }
        Ok(match self.table.get(&request.hash) {
            Some(plaintext) => Attempt::Found(plaintext.clone()),
            None => Attempt::Exhausted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::technique::request_for;

    #[test]
    fn builtin_table_knows_password() {
        let request = request_for("password", HashAlgorithm::Md5);
        let attempt = RainbowTable::builtin()
            .crack(&request, &CancellationToken::new())
            .unwrap();
        assert_eq!(attempt, Attempt::Found("password".into()));
    }

    #[test]
    fn builtin_table_digests() {
        let table = RainbowTable::builtin();
        assert_eq!(
            table.table.get("5f4dcc3b5aa765d61d8327deb882cf99").map(String::as_str),
            Some("password")
        );
        assert_eq!(
            table.table.get("e99a18c428cb38d5f260853678922e03").map(String::as_str),
            Some("abc123")
        );
        assert_eq!(table.table.len(), 2);
    }

    #[test]
    fn other_algorithms_exhaust() {
        let request = request_for("password", HashAlgorithm::Sha256);
        let attempt = RainbowTable::builtin()
            .crack(&request, &CancellationToken::new())
            .unwrap();
        assert_eq!(attempt, Attempt::Exhausted);
    }

    #[test]
    fn insert_plaintext_extends_table() {
        let mut table = RainbowTable::new(HashAlgorithm::Sha256);
        assert!(table.table.is_empty());
        table.insert_plaintext("dragon");

        let request = request_for("dragon", HashAlgorithm::Sha256);
        let attempt = table.crack(&request, &CancellationToken::new()).unwrap();
        assert_eq!(attempt, Attempt::Found("dragon".into()));
    }
}
