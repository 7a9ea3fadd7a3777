use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::error::CrackError;
use crate::hashing::HashAlgorithm;
use crate::technique::TechniqueKind;

/// Limits past this are treated as no limit at all.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `start + limit`, or `None` when the limit is too far out to be a real deadline.
pub fn deadline_after(start: Instant, limit: Duration) -> Option<Instant> {
    if limit > FAR_FUTURE {
        return None;
    }
    start.checked_add(limit)
}

/// Opaque job identifier handed back on submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for JobId {
    type Err = CrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(JobId)
            .map_err(|_| CrackError::InvalidInput(format!("malformed job id: {s}")))
    }
}

/// Why a job ended in [`JobStatus::Cancelled`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The job's time budget elapsed first.
    Timeout,
    /// A caller asked for cancellation.
    Requested,
}

/// Lifecycle status of a job. Everything except `Running` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Cracked,
    Exhausted,
    Cancelled(CancelReason),
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Running)
    }

    pub fn label(&self) -> &'static str {
        match self {
            JobStatus::Running => "running",
            JobStatus::Cracked => "cracked",
            JobStatus::Exhausted => "exhausted",
            JobStatus::Cancelled(CancelReason::Timeout) => "timed_out",
            JobStatus::Cancelled(CancelReason::Requested) => "cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for JobStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// How one technique's slot was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TechniqueOutcome {
    Cracked { plaintext: String },
    /// Search space covered without a match.
    Exhausted,
    /// Deadline (technique ceiling or job budget) hit first.
    TimedOut,
    /// Job was cancelled on request while this technique was pending.
    Cancelled,
    /// The worker errored or panicked.
    Faulted { reason: String },
}

impl TechniqueOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            TechniqueOutcome::Cracked { .. } => "cracked",
            TechniqueOutcome::Exhausted => "exhausted",
            TechniqueOutcome::TimedOut => "timed_out",
            TechniqueOutcome::Cancelled => "cancelled",
            TechniqueOutcome::Faulted { .. } => "faulted",
        }
    }
}

/// A recorded, immutable technique result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TechniqueResult {
    pub outcome: TechniqueOutcome,
    pub elapsed: Duration,
}

impl TechniqueResult {
    pub fn new(outcome: TechniqueOutcome, elapsed: Duration) -> Self {
        Self { outcome, elapsed }
    }

    #[cfg(test)]
    pub fn cracked(plaintext: impl Into<String>, elapsed: Duration) -> Self {
        Self::new(
            TechniqueOutcome::Cracked {
                plaintext: plaintext.into(),
            },
            elapsed,
        )
    }

    pub fn success(&self) -> bool {
        matches!(self.outcome, TechniqueOutcome::Cracked { .. })
    }

    pub fn plaintext(&self) -> Option<&str> {
        match &self.outcome {
            TechniqueOutcome::Cracked { plaintext } => Some(plaintext),
            _ => None,
        }
    }
}

/// State for one submitted hash.
///
/// The key set of `outcomes` is fixed at construction; `None` marks a
/// pending technique. Only [`StateMachine::next`](super::StateMachine::next)
/// mutates a job after creation.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub hash: String,
    pub algorithm: HashAlgorithm,
    /// Zero means unbounded.
    pub time_budget: Duration,
    pub created_at: DateTime<Utc>,
    pub started: Instant,
    pub config_version: u64,
    pub status: JobStatus,
    pub outcomes: BTreeMap<TechniqueKind, Option<TechniqueResult>>,
    pub cracked_by: Option<TechniqueKind>,
    pub finished_at: Option<DateTime<Utc>>,
    pub elapsed: Option<Duration>,
}

impl Job {
    pub fn new(
        hash: String,
        algorithm: HashAlgorithm,
        time_budget: Duration,
        techniques: &[TechniqueKind],
        config_version: u64,
    ) -> Self {
        Self {
            id: JobId::new(),
            hash,
            algorithm,
            time_budget,
            created_at: Utc::now(),
            started: Instant::now(),
            config_version,
            status: JobStatus::Running,
            outcomes: techniques.iter().map(|kind| (*kind, None)).collect(),
            cracked_by: None,
            finished_at: None,
            elapsed: None,
        }
    }

    pub fn total_count(&self) -> usize {
        self.outcomes.len()
    }

    pub fn completed_count(&self) -> usize {
        self.outcomes.values().filter(|slot| slot.is_some()).count()
    }

    pub fn pending_count(&self) -> usize {
        self.total_count() - self.completed_count()
    }

    /// Total elapsed once terminal, time since start while running.
    pub fn elapsed_so_far(&self) -> Duration {
        self.elapsed.unwrap_or_else(|| self.started.elapsed())
    }

    /// Plaintext of the winning technique, if the job was cracked.
    pub fn plaintext(&self) -> Option<&str> {
        let kind = self.cracked_by?;
        self.outcomes.get(&kind)?.as_ref()?.plaintext()
    }

    /// Budget deadline measured from the start instant, if bounded.
    pub fn budget_deadline(&self) -> Option<Instant> {
        if self.time_budget.is_zero() {
            return None;
        }
        deadline_after(self.started, self.time_budget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_job(kinds: &[TechniqueKind]) -> Job {
        Job::new(
            HashAlgorithm::Md5.digest_hex("password"),
            HashAlgorithm::Md5,
            Duration::from_secs(10),
            kinds,
            1,
        )
    }

    #[test]
    fn job_creation_defaults() {
        let job = make_job(&[TechniqueKind::Dictionary, TechniqueKind::Mask]);
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(job.total_count(), 2);
        assert_eq!(job.completed_count(), 0);
        assert_eq!(job.pending_count(), 2);
        assert!(job.plaintext().is_none());
        assert!(job.finished_at.is_none());
    }

    #[test]
    fn zero_budget_has_no_deadline() {
        let mut job = make_job(&[TechniqueKind::Mask]);
        assert!(job.budget_deadline().is_some());
        job.time_budget = Duration::ZERO;
        assert!(job.budget_deadline().is_none());
    }

    #[test]
    fn huge_budget_is_unbounded() {
        let mut job = make_job(&[TechniqueKind::Mask]);
        job.time_budget = Duration::from_secs(u64::MAX);
        assert!(job.budget_deadline().is_none());
        job.time_budget = Duration::MAX;
        assert!(job.budget_deadline().is_none());
    }

    #[test]
    fn deadline_after_caps_far_limits() {
        let now = Instant::now();
        assert_eq!(
            deadline_after(now, Duration::from_secs(5)),
            Some(now + Duration::from_secs(5))
        );
        assert!(deadline_after(now, Duration::from_secs(86_400 * 365 * 31)).is_none());
        assert!(deadline_after(now, Duration::from_secs(u64::MAX)).is_none());
    }

    #[test]
    fn job_id_round_trips_through_display() {
        let id = JobId::new();
        let parsed: JobId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<JobId>().is_err());
    }

    #[test]
    fn status_labels() {
        assert_eq!(JobStatus::Running.to_string(), "running");
        assert_eq!(JobStatus::Cancelled(CancelReason::Timeout).to_string(), "timed_out");
        assert_eq!(
            serde_json::to_string(&JobStatus::Cancelled(CancelReason::Requested)).unwrap(),
            "\"cancelled\""
        );
        assert!(JobStatus::Exhausted.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
    }

    #[test]
    fn technique_result_success_only_when_cracked() {
        let hit = TechniqueResult::cracked("password", Duration::from_millis(3));
        assert!(hit.success());
        assert_eq!(hit.plaintext(), Some("password"));

        let miss = TechniqueResult::new(TechniqueOutcome::TimedOut, Duration::from_secs(1));
        assert!(!miss.success());
        assert!(miss.plaintext().is_none());
        assert_eq!(miss.outcome.label(), "timed_out");
    }
}
