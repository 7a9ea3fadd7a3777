//! Job lifecycle: submission, worker fan-out, outcome collection, queries.
//!
//! Each job lives behind a [`JobHandle`]: a `Mutex<Job>` that is the single
//! decision point for every event, and a [`CancellationToken`] that is
//! cancelled exactly when the job turns terminal. Workers and the budget
//! timer only ever talk to the job through [`JobHandle::apply`].

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::HashcrackConfig;
use crate::error::{CrackError, Result};
use crate::hashing::HashAlgorithm;
use crate::registry::{SettingsUpdate, TechniqueConfig, TechniqueRegistry};
use crate::state_machine::{
    Job, JobEvent, JobId, StateMachine, TechniqueOutcome, TechniqueResult, Transition,
    deadline_after,
};
use crate::strength::StrengthPolicy;
use crate::technique::{Attempt, CrackRequest, Technique, TechniqueKind, builtin_techniques};
use crate::view::{ProgressView, ResultView};

/// Tunables that are not part of the per-job technique selection.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Upper bound on a single technique's run, independent of the job budget.
    pub ceilings: BTreeMap<TechniqueKind, Duration>,
    pub strength: StrengthPolicy,
    /// How long a terminal job stays queryable.
    pub retention: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            ceilings: BTreeMap::new(),
            strength: StrengthPolicy::default(),
            retention: Duration::from_secs(3600),
        }
    }
}

struct JobHandle {
    id: JobId,
    job: Mutex<Job>,
    cancel: CancellationToken,
}

impl JobHandle {
    /// Runs one event through the state machine under the job lock.
    fn apply(&self, event: JobEvent) -> Transition {
        let mut job = self.job.lock().unwrap_or_else(PoisonError::into_inner);
        let transition = StateMachine::next(&mut job, event);

        if let Transition::Terminal(status) = transition {
            info!(
                job_id = %self.id,
                status = %status,
                cracked_by = ?job.cracked_by,
                elapsed_ms = job.elapsed_so_far().as_millis() as u64,
                "job finished"
            );
            self.cancel.cancel();
        }
        transition
    }

    fn read<T>(&self, f: impl FnOnce(&Job) -> T) -> T {
        let job = self.job.lock().unwrap_or_else(PoisonError::into_inner);
        f(&job)
    }
}

/// Owns every job and the technique workers that run against them.
pub struct JobOrchestrator {
    registry: TechniqueRegistry,
    techniques: BTreeMap<TechniqueKind, Arc<dyn Technique>>,
    jobs: RwLock<HashMap<JobId, Arc<JobHandle>>>,
    settings: OrchestratorSettings,
}

impl JobOrchestrator {
    pub fn new(
        registry: TechniqueRegistry,
        techniques: BTreeMap<TechniqueKind, Arc<dyn Technique>>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            registry,
            techniques,
            jobs: RwLock::new(HashMap::new()),
            settings,
        }
    }

    /// Built-in workers with toggles, ceilings, strength policy and retention from `config`.
    pub fn from_config(config: &HashcrackConfig) -> Self {
        Self::new(
            TechniqueRegistry::new(config.techniques.to_settings()),
            builtin_techniques(config.brute_force.max_length),
            OrchestratorSettings {
                ceilings: config.ceiling_durations(),
                strength: config.strength.clone(),
                retention: config.retention(),
            },
        )
    }

    pub fn update_settings(&self, update: SettingsUpdate) -> Result<Arc<TechniqueConfig>> {
        self.registry.update_config(update)
    }

    pub fn settings(&self) -> Arc<TechniqueConfig> {
        self.registry.snapshot()
    }

    /// Creates a job and starts one worker per enabled technique.
    ///
    /// Returns as soon as the workers are spawned. A zero `time_budget` means
    /// the job runs until a verdict or an explicit cancel.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit_job(&self, hash: &str, algorithm: &str, time_budget: Duration) -> Result<JobId> {
        if hash.trim().is_empty() {
            return Err(CrackError::InvalidInput("hash value is required".into()));
        }
        let algorithm: HashAlgorithm = algorithm.parse()?;
        let hash = algorithm.normalize_digest(hash)?;

        let config = self.registry.snapshot();
        let kinds = config.enabled_kinds();
        if kinds.is_empty() {
            return Err(CrackError::NoTechniquesEnabled);
        }

        let job = Job::new(hash, algorithm, time_budget, &kinds, config.version());
        let id = job.id;
        let started = job.started;
        let budget_deadline = job.budget_deadline();
        let request = CrackRequest {
            hash: job.hash.clone(),
            algorithm,
            deadline: budget_deadline,
            dictionary: config.dictionary().cloned(),
        };

        let handle = Arc::new(JobHandle {
            id,
            job: Mutex::new(job),
            cancel: CancellationToken::new(),
        });
        self.jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::clone(&handle));

        info!(
            job_id = %id,
            algorithm = %algorithm,
            budget_secs = time_budget.as_secs_f64(),
            techniques = ?kinds,
            config_version = config.version(),
            "job submitted"
        );

        for kind in kinds {
            let Some(technique) = self.techniques.get(&kind) else {
                let fault = CrackError::WorkerFault {
                    technique: kind,
                    reason: "no worker registered".into(),
                };
                warn!(job_id = %id, error = %fault, "technique unavailable");
                handle.apply(JobEvent::Outcome {
                    kind,
                    result: TechniqueResult::new(
                        TechniqueOutcome::Faulted {
                            reason: "no worker registered".into(),
                        },
                        Duration::ZERO,
                    ),
                });
                continue;
            };

            // A ceiling only matters when it lands before the job budget.
            let ceiling = self
                .settings
                .ceilings
                .get(&kind)
                .and_then(|limit| deadline_after(started, *limit))
                .filter(|at| budget_deadline.is_none_or(|budget| *at < budget));

            let mut request = request.clone();
            if ceiling.is_some() {
                request.deadline = ceiling;
            }

            tokio::spawn(run_worker(
                Arc::clone(&handle),
                Arc::clone(technique),
                request,
                ceiling,
            ));
        }

        if let Some(deadline) = budget_deadline {
            tokio::spawn(run_budget_timer(Arc::clone(&handle), deadline));
        }

        Ok(id)
    }

    /// Consistent snapshot of a job's progress. Never waits on workers.
    pub fn get_progress(&self, id: JobId) -> Result<ProgressView> {
        let handle = self.lookup(id)?;
        Ok(handle.read(ProgressView::from_job))
    }

    /// Final result; `NotReady` while the job is still running.
    pub fn get_result(&self, id: JobId) -> Result<ResultView> {
        let handle = self.lookup(id)?;
        handle.read(|job| ResultView::from_job(job, &self.settings.strength))
    }

    /// Cancels a running job. No-op for terminal jobs.
    pub fn cancel_job(&self, id: JobId) -> Result<()> {
        let handle = self.lookup(id)?;
        if handle.apply(JobEvent::CancelRequested) == Transition::Ignored {
            debug!(job_id = %id, "cancel ignored, job already finished");
        }
        Ok(())
    }

    /// Drops terminal jobs finished longer ago than the retention period.
    pub fn evict_expired(&self) -> usize {
        let retention = self.settings.retention;
        let now = Instant::now();
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);
        let before = jobs.len();
        jobs.retain(|_, handle| {
            handle.read(|job| match job.elapsed {
                Some(elapsed) if job.status.is_terminal() => {
                    now.saturating_duration_since(job.started + elapsed) < retention
                }
                _ => true,
            })
        });
        let evicted = before - jobs.len();
        if evicted > 0 {
            info!(evicted, remaining = jobs.len(), "evicted expired jobs");
        }
        evicted
    }

    /// Runs [`evict_expired`](Self::evict_expired) every `interval` until `shutdown` fires.
    pub fn spawn_reaper(
        self: &Arc<Self>,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let orchestrator = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let evicted = orchestrator.evict_expired();
                        debug!(evicted, jobs = orchestrator.job_count(), "reaper sweep");
                    }
                    _ = shutdown.cancelled() => {
                        debug!("job reaper shutting down");
                        break;
                    }
                }
            }
        })
    }

    pub fn job_count(&self) -> usize {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn lookup(&self, id: JobId) -> Result<Arc<JobHandle>> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or(CrackError::NotFound(id))
    }
}

/// Sleeps until `deadline`, or forever when there is none.
async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at.into()).await,
        None => std::future::pending().await,
    }
}

/// One technique against one job.
///
/// Reports at most one outcome. A worker stopped because the job ended
/// (cracked elsewhere, budget expired, cancelled) reports nothing; the
/// terminal transition has already settled its slot.
async fn run_worker(
    handle: Arc<JobHandle>,
    technique: Arc<dyn Technique>,
    request: CrackRequest,
    ceiling: Option<Instant>,
) {
    let kind = technique.kind();
    let started = Instant::now();
    let token = handle.cancel.child_token();
    debug!(job_id = %handle.id, technique = %kind, "worker started");

    let task = {
        let token = token.clone();
        tokio::task::spawn_blocking(move || technique.crack(&request, &token))
    };

    let outcome = tokio::select! {
        joined = task => match joined {
            Ok(Ok(Attempt::Found(plaintext))) => Some(TechniqueOutcome::Cracked { plaintext }),
            Ok(Ok(Attempt::Exhausted)) => Some(TechniqueOutcome::Exhausted),
            Ok(Ok(Attempt::Interrupted)) => ceiling
                .filter(|at| Instant::now() >= *at)
                .map(|_| TechniqueOutcome::TimedOut),
            Ok(Err(err)) => Some(fault(&handle, kind, err.to_string())),
            Err(join_err) => {
                let reason = if join_err.is_panic() {
                    "worker panicked".to_string()
                } else {
                    format!("worker aborted: {join_err}")
                };
                Some(fault(&handle, kind, reason))
            }
        },
        _ = sleep_until_opt(ceiling) => {
            token.cancel();
            Some(TechniqueOutcome::TimedOut)
        }
        _ = handle.cancel.cancelled() => {
            token.cancel();
            None
        }
    };

    let elapsed = started.elapsed();
    match outcome {
        Some(outcome) => {
            debug!(
                job_id = %handle.id,
                technique = %kind,
                outcome = outcome.label(),
                elapsed_ms = elapsed.as_millis() as u64,
                "worker finished"
            );
            handle.apply(JobEvent::Outcome {
                kind,
                result: TechniqueResult::new(outcome, elapsed),
            });
        }
        None => debug!(job_id = %handle.id, technique = %kind, "worker stopped"),
    }
}

fn fault(handle: &JobHandle, technique: TechniqueKind, reason: String) -> TechniqueOutcome {
    let err = CrackError::WorkerFault {
        technique,
        reason: reason.clone(),
    };
    warn!(job_id = %handle.id, error = %err, "technique worker faulted");
    TechniqueOutcome::Faulted { reason }
}

async fn run_budget_timer(handle: Arc<JobHandle>, deadline: Instant) {
    tokio::select! {
        _ = tokio::time::sleep_until(deadline.into()) => {
            if let Transition::Terminal(_) = handle.apply(JobEvent::BudgetExpired) {
                info!(job_id = %handle.id, "job budget expired");
            }
        }
        _ = handle.cancel.cancelled() => {}
    }
}
