//! Closed error enum for the engine/orchestrator core (spec.md §7).
//!
//! The engine itself raises only `InputValidation` and `InternalInvariant`;
//! cancellation and timeout are coordinated by the orchestrator. The CLI
//! boundary (`main.rs`) wraps `SimError` in `anyhow::Error`, the way the
//! teacher's subcommand handlers already return `anyhow::Result<()>`.

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("input validation failed: {0}")]
    InputValidation(String),

    #[error("simulation cancelled")]
    Cancelled,

    #[error("timeout after {0}ms")]
    Timeout(u64),

    #[error("external fetch failed: {0}")]
    ExternalFetch(String),

    #[error("internal invariant violated ({id}): {detail}")]
    InternalInvariant { id: String, detail: String },
}

impl SimError {
    pub fn internal(id: impl Into<String>, detail: impl Into<String>) -> Self {
        SimError::InternalInvariant {
            id: id.into(),
            detail: detail.into(),
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;
