use tokio_util::sync::CancellationToken;

use super::{Attempt, CrackRequest, Technique, TechniqueKind, try_candidates};
use crate::error::CrackError;

/// Dictionary words with a numeric suffix appended (`word0` .. `word99`).
#[derive(Debug, Clone)]
pub struct HybridAttack {
    max_suffix: u32,
}

impl Default for HybridAttack {
    fn default() -> Self {
        Self::new(99)
    }
}

impl HybridAttack {
    pub fn new(max_suffix: u32) -> Self {
        Self { max_suffix }
    }
}

impl Technique for HybridAttack {
    fn kind(&self) -> TechniqueKind {
        TechniqueKind::Hybrid
    }

    fn crack(
        &self,
        request: &CrackRequest,
        cancel: &CancellationToken,
    ) -> Result<Attempt, CrackError> {
        let words = request.words();
        let candidates = words
            .iter()
            .flat_map(|word| (0..=self.max_suffix).map(move |n| format!("{word}{n}")));
        Ok(try_candidates(request, cancel, candidates))
    }
}
