//! Weak/medium/strong classification of a finished job.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::state_machine::{CancelReason, Job, JobStatus};
use crate::technique::TechniqueKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrengthRating {
    Weak,
    Medium,
    Strong,
}

impl fmt::Display for StrengthRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrengthRating::Weak => write!(f, "weak"),
            StrengthRating::Medium => write!(f, "medium"),
            StrengthRating::Strong => write!(f, "strong"),
        }
    }
}

/// Thresholds for [`StrengthRating`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrengthPolicy {
    /// A crack at or under this many seconds by a weak technique rates weak.
    #[serde(default = "default_weak_max_secs")]
    pub weak_max_secs: f64,

    /// Techniques whose quick success means a weak password.
    #[serde(default = "default_weak_techniques")]
    pub weak_techniques: Vec<TechniqueKind>,
}

fn default_weak_max_secs() -> f64 {
    5.0
}

fn default_weak_techniques() -> Vec<TechniqueKind> {
    vec![
        TechniqueKind::BruteForce,
        TechniqueKind::Dictionary,
        TechniqueKind::RainbowTable,
    ]
}

impl Default for StrengthPolicy {
    fn default() -> Self {
        Self {
            weak_max_secs: default_weak_max_secs(),
            weak_techniques: default_weak_techniques(),
        }
    }
}

impl StrengthPolicy {
    pub fn weak_max(&self) -> Duration {
        Duration::try_from_secs_f64(self.weak_max_secs).unwrap_or(Duration::ZERO)
    }

    /// Rating from the raw facts of a finished job.
    pub fn classify(&self, cracked_by: Option<TechniqueKind>, elapsed: Duration) -> StrengthRating {
        match cracked_by {
            None => StrengthRating::Strong,
            Some(kind) if self.weak_techniques.contains(&kind) && elapsed <= self.weak_max() => {
                StrengthRating::Weak
            }
            Some(_) => StrengthRating::Medium,
        }
    }

    /// Rating for `job`, or `None` while running or after an explicit cancel.
    pub fn rate(&self, job: &Job) -> Option<StrengthRating> {
        match job.status {
            JobStatus::Running | JobStatus::Cancelled(CancelReason::Requested) => None,
            JobStatus::Cracked | JobStatus::Exhausted | JobStatus::Cancelled(CancelReason::Timeout) => {
                Some(self.classify(job.cracked_by, job.elapsed_so_far()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::HashAlgorithm;
    use crate::state_machine::{JobEvent, StateMachine, TechniqueOutcome, TechniqueResult};

    fn policy(weak_max_secs: f64) -> StrengthPolicy {
        StrengthPolicy {
            weak_max_secs,
            ..Default::default()
        }
    }

    #[test]
    fn quick_dictionary_crack_is_weak() {
        let rating = policy(5.0).classify(Some(TechniqueKind::Dictionary), Duration::from_secs(1));
        assert_eq!(rating, StrengthRating::Weak);
    }

    #[test]
    fn slow_crack_is_medium() {
        let p = policy(0.5);
        let rating = p.classify(Some(TechniqueKind::BruteForce), Duration::from_secs(1));
        assert_eq!(rating, StrengthRating::Medium);
        let rating = p.classify(Some(TechniqueKind::BruteForce), Duration::from_millis(500));
        assert_eq!(rating, StrengthRating::Weak);
    }

    #[test]
    fn hybrid_and_mask_are_medium_by_default() {
        let p = policy(60.0);
        assert_eq!(p.classify(Some(TechniqueKind::Hybrid), Duration::ZERO), StrengthRating::Medium);
        assert_eq!(p.classify(Some(TechniqueKind::Mask), Duration::ZERO), StrengthRating::Medium);
    }

    #[test]
    fn weak_technique_set_is_configurable() {
        let p = StrengthPolicy {
            weak_max_secs: 60.0,
            weak_techniques: vec![TechniqueKind::Mask],
        };
        assert_eq!(p.classify(Some(TechniqueKind::Mask), Duration::ZERO), StrengthRating::Weak);
        assert_eq!(
            p.classify(Some(TechniqueKind::Dictionary), Duration::ZERO),
            StrengthRating::Medium
        );
    }

    #[test]
    fn uncracked_is_strong() {
        assert_eq!(policy(5.0).classify(None, Duration::ZERO), StrengthRating::Strong);
    }

    #[test]
    fn negative_threshold_never_rates_weak() {
        let rating = policy(-1.0).classify(Some(TechniqueKind::Dictionary), Duration::from_millis(1));
        assert_eq!(rating, StrengthRating::Medium);
    }

    #[test]
    fn rate_skips_running_and_requested_cancel() {
        let p = StrengthPolicy::default();
        let mut job = Job::new(
            "00".repeat(16),
            HashAlgorithm::Md5,
            Duration::ZERO,
            &[TechniqueKind::Dictionary],
            1,
        );
        assert_eq!(p.rate(&job), None);

        let mut timed_out = job.clone();
        StateMachine::next(&mut timed_out, JobEvent::BudgetExpired);
        assert_eq!(p.rate(&timed_out), Some(StrengthRating::Strong));

        StateMachine::next(&mut job, JobEvent::CancelRequested);
        assert_eq!(p.rate(&job), None);
    }

    #[test]
    fn rate_cracked_job() {
        let mut job = Job::new(
            HashAlgorithm::Md5.digest_hex("password"),
            HashAlgorithm::Md5,
            Duration::ZERO,
            &[TechniqueKind::Dictionary],
            1,
        );
        StateMachine::next(
            &mut job,
            JobEvent::Outcome {
                kind: TechniqueKind::Dictionary,
                result: TechniqueResult::new(
                    TechniqueOutcome::Cracked {
                        plaintext: "password".into(),
                    },
                    Duration::from_millis(2),
                ),
            },
        );
        assert_eq!(StrengthPolicy::default().rate(&job), Some(StrengthRating::Weak));
    }

    #[test]
    fn deserialize_partial_policy() {
        let p: StrengthPolicy = toml::from_str("weak_max_secs = 2.5").unwrap();
        assert_eq!(p.weak_max(), Duration::from_millis(2500));
        assert_eq!(p.weak_techniques, default_weak_techniques());
    }
}
