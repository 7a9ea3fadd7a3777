use chrono::Utc;

use super::job::{CancelReason, Job, JobStatus, TechniqueOutcome, TechniqueResult};
use crate::technique::TechniqueKind;

/// Something that happened to a job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    /// A worker finished and reports its technique's result.
    Outcome {
        kind: TechniqueKind,
        result: TechniqueResult,
    },
    /// The job's time budget elapsed.
    BudgetExpired,
    /// A caller cancelled the job.
    CancelRequested,
}

/// The effect of applying an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The slot was filled; the job keeps running.
    Recorded,
    /// The job reached this terminal status. Produced at most once per job.
    Terminal(JobStatus),
    /// Nothing changed: the job was already terminal, or the slot was
    /// unknown or already filled.
    Ignored,
}

/// Applies [`JobEvent`]s to a [`Job`].
///
/// Callers serialize access per job (the orchestrator holds the job's mutex
/// around every call), so the order events arrive here is the order they
/// take effect.
pub struct StateMachine;

impl StateMachine {
    /// Apply `event` to `job` and report what changed.
    ///
    /// - A success moves `Running` to `Cracked` immediately; first arrival wins.
    /// - Filling the last pending slot without any success moves to `Exhausted`.
    /// - `BudgetExpired` marks pending slots `TimedOut` and ends in
    ///   `Cancelled(Timeout)`; `CancelRequested` marks them `Cancelled` and
    ///   ends in `Cancelled(Requested)`.
    /// - Terminal jobs ignore everything.
    pub fn next(job: &mut Job, event: JobEvent) -> Transition {
        if job.status.is_terminal() {
            return Transition::Ignored;
        }

        match event {
            JobEvent::Outcome { kind, result } => {
                let Some(slot) = job.outcomes.get_mut(&kind) else {
                    return Transition::Ignored;
                };
                if slot.is_some() {
                    return Transition::Ignored;
                }
                let success = result.success();
                *slot = Some(result);

                if success {
                    job.cracked_by = Some(kind);
                    Self::finish(job, JobStatus::Cracked)
                } else if job.pending_count() == 0 {
                    Self::finish(job, JobStatus::Exhausted)
                } else {
                    Transition::Recorded
                }
            }
            JobEvent::BudgetExpired => {
                Self::fill_pending(job, TechniqueOutcome::TimedOut);
                Self::finish(job, JobStatus::Cancelled(CancelReason::Timeout))
            }
            JobEvent::CancelRequested => {
                Self::fill_pending(job, TechniqueOutcome::Cancelled);
                Self::finish(job, JobStatus::Cancelled(CancelReason::Requested))
            }
        }
    }

    fn fill_pending(job: &mut Job, outcome: TechniqueOutcome) {
        let elapsed = job.started.elapsed();
        for slot in job.outcomes.values_mut().filter(|slot| slot.is_none()) {
            *slot = Some(TechniqueResult::new(outcome.clone(), elapsed));
        }
    }

    fn finish(job: &mut Job, status: JobStatus) -> Transition {
        job.status = status;
        job.elapsed = Some(job.started.elapsed());
        job.finished_at = Some(Utc::now());
        Transition::Terminal(status)
    }
}
