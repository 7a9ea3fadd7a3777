//! Read-only projections of a [`Job`] handed to polling clients.
//!
//! Views are built from a job while its lock is held and own all their data,
//! so a caller never observes a half-applied event.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::CrackError;
use crate::hashing::HashAlgorithm;
use crate::state_machine::{Job, JobId, JobStatus, TechniqueOutcome, TechniqueResult};
use crate::strength::{StrengthPolicy, StrengthRating};
use crate::technique::TechniqueKind;

/// Per-technique status as reported to pollers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Pending,
    Cracked,
    Exhausted,
    TimedOut,
    Cancelled,
    Faulted,
}

impl SlotStatus {
    fn of(slot: Option<&TechniqueResult>) -> Self {
        match slot.map(|r| &r.outcome) {
            None => SlotStatus::Pending,
            Some(TechniqueOutcome::Cracked { .. }) => SlotStatus::Cracked,
            Some(TechniqueOutcome::Exhausted) => SlotStatus::Exhausted,
            Some(TechniqueOutcome::TimedOut) => SlotStatus::TimedOut,
            Some(TechniqueOutcome::Cancelled) => SlotStatus::Cancelled,
            Some(TechniqueOutcome::Faulted { .. }) => SlotStatus::Faulted,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SlotStatus::Pending => "pending",
            SlotStatus::Cracked => "cracked",
            SlotStatus::Exhausted => "exhausted",
            SlotStatus::TimedOut => "timed_out",
            SlotStatus::Cancelled => "cancelled",
            SlotStatus::Faulted => "faulted",
        }
    }
}

/// Answer to `getProgress`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressView {
    pub job_id: JobId,
    pub status: JobStatus,
    pub algorithm: HashAlgorithm,
    pub created_at: DateTime<Utc>,
    /// Settings version the job was snapshotted from.
    pub config_version: u64,
    pub completed_techniques: usize,
    pub total_techniques: usize,
    pub remaining_techniques: usize,
    pub elapsed: f64,
    pub results: BTreeMap<TechniqueKind, SlotStatus>,
}

impl ProgressView {
    pub fn from_job(job: &Job) -> Self {
        let results: BTreeMap<TechniqueKind, SlotStatus> = job
            .outcomes
            .iter()
            .map(|(kind, slot)| (*kind, SlotStatus::of(slot.as_ref())))
            .collect();
        let completed = results
            .values()
            .filter(|s| **s != SlotStatus::Pending)
            .count();

        Self {
            job_id: job.id,
            status: job.status,
            algorithm: job.algorithm,
            created_at: job.created_at,
            config_version: job.config_version,
            completed_techniques: completed,
            total_techniques: results.len(),
            remaining_techniques: results.len() - completed,
            elapsed: job.elapsed_so_far().as_secs_f64(),
            results,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// One technique line of a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TechniqueSummary {
    pub success: bool,
    pub time_taken: f64,
    pub status: SlotStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault: Option<String>,
}

/// Answer to `getResults`; only exists for terminal jobs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultView {
    pub job_id: JobId,
    pub status: JobStatus,
    pub cracked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub time_taken: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strength_rating: Option<StrengthRating>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cracked_by: Option<TechniqueKind>,
    pub techniques: BTreeMap<TechniqueKind, TechniqueSummary>,
}

impl ResultView {
    pub fn from_job(job: &Job, policy: &StrengthPolicy) -> Result<Self, CrackError> {
        if !job.status.is_terminal() {
            return Err(CrackError::NotReady(job.id));
        }

        let techniques = job
            .outcomes
            .iter()
            .map(|(kind, slot)| {
                let summary = TechniqueSummary {
                    success: slot.as_ref().is_some_and(TechniqueResult::success),
                    time_taken: slot.as_ref().map_or(0.0, |r| r.elapsed.as_secs_f64()),
                    status: SlotStatus::of(slot.as_ref()),
                    fault: match slot.as_ref().map(|r| &r.outcome) {
                        Some(TechniqueOutcome::Faulted { reason }) => Some(reason.clone()),
                        _ => None,
                    },
                };
                (*kind, summary)
            })
            .collect();

        Ok(Self {
            job_id: job.id,
            status: job.status,
            cracked: job.status == JobStatus::Cracked,
            password: job.plaintext().map(str::to_string),
            time_taken: job.elapsed_so_far().as_secs_f64(),
            finished_at: job.finished_at,
            strength_rating: policy.rate(job),
            cracked_by: job.cracked_by,
            techniques,
        })
    }

    /// Plain-text export of the result.
    pub fn to_report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Password Cracking Results:");
        let status = if self.cracked { "Cracked" } else { "Not Cracked" };
        let _ = writeln!(out, "Status: {status} ({})", self.status);
        if let Some(password) = &self.password {
            let _ = writeln!(out, "Password: {password}");
        }
        if let Some(kind) = self.cracked_by {
            let _ = writeln!(out, "Cracked By: {kind}");
        }
        let _ = writeln!(out, "Total Time Taken: {:.2} seconds", self.time_taken);
        match self.strength_rating {
            Some(rating) => {
                let _ = writeln!(out, "Strength Rating: {rating}");
            }
            None => {
                let _ = writeln!(out, "Strength Rating: n/a");
            }
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "Technique Details:");
        for (kind, summary) in &self.techniques {
            let verdict = if summary.success { "Success" } else { "Failed" };
            let _ = write!(out, "{kind}: {verdict} ({:.2} seconds)", summary.time_taken);
            if !summary.success && summary.status != SlotStatus::Exhausted {
                let _ = write!(out, " [{}]", summary.status.label());
            }
            let _ = writeln!(out);
        }
        out
    }
}
