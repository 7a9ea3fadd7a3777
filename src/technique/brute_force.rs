use tokio_util::sync::CancellationToken;

use super::{Attempt, CrackRequest, Technique, TechniqueKind};
use crate::error::CrackError;

const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

// Candidates hashed between two interruption checks.
const CHECK_EVERY: u64 = 1024;

// Steps the odometer; the last position spins fastest. Returns false once every position wrapped.
fn advance(indices: &mut [usize]) -> bool {
    for slot in indices.iter_mut().rev() {
        *slot += 1;
        if *slot < CHARSET.len() {
            return true;
        }
        *slot = 0;
    }
    false
}

/// Exhaustive search over `[a-zA-Z0-9]`, shortest candidates first.
#[derive(Debug, Clone)]
pub struct BruteForce {
    max_length: usize,
}

impl BruteForce {
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }
}

impl Technique for BruteForce {
    fn kind(&self) -> TechniqueKind {
        TechniqueKind::BruteForce
    }

    fn crack(
        &self,
        request: &CrackRequest,
        cancel: &CancellationToken,
    ) -> Result<Attempt, CrackError> {
        let mut tried: u64 = 0;
        let mut guess = String::with_capacity(self.max_length);

        for length in 1..=self.max_length {
            let mut indices = vec![0usize; length];
            loop {
                if tried % CHECK_EVERY == 0 && request.should_stop(cancel) {
                    return Ok(Attempt::Interrupted);
                }
                tried += 1;

                guess.clear();
                guess.extend(indices.iter().map(|&i| CHARSET[i] as char));
                if request.matches(&guess) {
                    return Ok(Attempt::Found(guess));
                }

                if !advance(&mut indices) {
                    break;
                }
            }
        }

        Ok(Attempt::Exhausted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::HashAlgorithm;
    use crate::technique::request_for;
    use std::time::{Duration, Instant};

    #[test]
    fn finds_short_password() {
        let request = request_for("aZ", HashAlgorithm::Md5);
        let attempt = BruteForce::new(2)
            .crack(&request, &CancellationToken::new())
            .unwrap();
        assert_eq!(attempt, Attempt::Found("aZ".into()));
    }

    #[test]
    fn finds_last_candidate_of_length() {
        let request = request_for("99", HashAlgorithm::Sha256);
        let attempt = BruteForce::new(2)
            .crack(&request, &CancellationToken::new())
            .unwrap();
        assert_eq!(attempt, Attempt::Found("99".into()));
    }

    #[test]
    fn exhausts_when_longer_than_max_length() {
        let request = request_for("abc", HashAlgorithm::Md5);
        let attempt = BruteForce::new(2)
            .crack(&request, &CancellationToken::new())
            .unwrap();
        assert_eq!(attempt, Attempt::Exhausted);
    }

    #[test]
    fn zero_length_exhausts_immediately() {
        let request = request_for("a", HashAlgorithm::Md5);
        let attempt = BruteForce::new(0)
            .crack(&request, &CancellationToken::new())
            .unwrap();
        assert_eq!(attempt, Attempt::Exhausted);
    }

    #[test]
    fn stops_when_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        let request = request_for("zzzzzz", HashAlgorithm::Md5);
        let attempt = BruteForce::new(6).crack(&request, &token).unwrap();
        assert_eq!(attempt, Attempt::Interrupted);
    }

    #[test]
    fn honours_deadline() {
        let mut request = request_for("ZZZZZZ", HashAlgorithm::Sha256);
        request.deadline = Some(Instant::now() + Duration::from_millis(50));
        let started = Instant::now();
        let attempt = BruteForce::new(6)
            .crack(&request, &CancellationToken::new())
            .unwrap();
        assert_eq!(attempt, Attempt::Interrupted);
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
