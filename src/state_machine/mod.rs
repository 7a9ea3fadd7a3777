mod job;
mod state;

pub use job::{
    CancelReason, Job, JobId, JobStatus, TechniqueOutcome, TechniqueResult, deadline_after,
};
pub use state::{JobEvent, StateMachine, Transition};
