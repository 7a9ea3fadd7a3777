use thiserror::Error;

use crate::state_machine::JobId;
use crate::technique::TechniqueKind;

#[derive(Debug, Error)]
pub enum CrackError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No techniques enabled. Enable at least one technique before submitting.")]
    NoTechniquesEnabled,

    #[error("Job not found: {0}")]
    NotFound(JobId),

    #[error("Job {0} is still running")]
    NotReady(JobId),

    #[error("Technique {technique} faulted: {reason}")]
    WorkerFault {
        technique: TechniqueKind,
        reason: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T, E = CrackError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display_includes_id() {
        let id = JobId::new();
        let err = CrackError::NotFound(id);
        assert_eq!(err.to_string(), format!("Job not found: {id}"));
    }

    #[test]
    fn worker_fault_display() {
        let err = CrackError::WorkerFault {
            technique: TechniqueKind::Hybrid,
            reason: "dictionary unreadable".into(),
        };
        assert_eq!(
            err.to_string(),
            "Technique hybrid_attack faulted: dictionary unreadable"
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CrackError>();
    }
}
