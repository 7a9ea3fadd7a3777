use tokio_util::sync::CancellationToken;

use super::{Attempt, CrackRequest, Technique, TechniqueKind, try_candidates};
use crate::error::CrackError;

/// Fixed-shape guesses: `prefix` + one of `fillers` + `suffix`.
#[derive(Debug, Clone)]
pub struct MaskAttack {
    prefix: String,
    fillers: Vec<String>,
    suffix: String,
}

impl Default for MaskAttack {
    fn default() -> Self {
        Self::new("A", &["", "b", "B", "c", "C"], "123")
    }
}

impl MaskAttack {
    pub fn new(prefix: &str, fillers: &[&str], suffix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            fillers: fillers.iter().map(|f| f.to_string()).collect(),
            suffix: suffix.to_string(),
        }
    }
}

impl Technique for MaskAttack {
    fn kind(&self) -> TechniqueKind {
        TechniqueKind::Mask
    }

    fn crack(
        &self,
        request: &CrackRequest,
        cancel: &CancellationToken,
    ) -> Result<Attempt, CrackError> {
        let candidates = self
            .fillers
            .iter()
            .map(|mid| format!("{}{mid}{}", self.prefix, self.suffix));
        Ok(try_candidates(request, cancel, candidates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::HashAlgorithm;
    use crate::technique::request_for;

    #[test]
    fn default_mask_covers_bare_pattern() {
        let request = request_for("A123", HashAlgorithm::Md5);
        let attempt = MaskAttack::default()
            .crack(&request, &CancellationToken::new())
            .unwrap();
        assert_eq!(attempt, Attempt::Found("A123".into()));
    }

    #[test]
    fn default_mask_covers_fillers() {
        let request = request_for("AC123", HashAlgorithm::Sha256);
        let attempt = MaskAttack::default()
            .crack(&request, &CancellationToken::new())
            .unwrap();
        assert_eq!(attempt, Attempt::Found("AC123".into()));
    }

    #[test]
    fn outside_mask_exhausts() {
        let request = request_for("Ad123", HashAlgorithm::Md5);
        let attempt = MaskAttack::default()
            .crack(&request, &CancellationToken::new())
            .unwrap();
        assert_eq!(attempt, Attempt::Exhausted);
    }
}
