use crate::types::{ProcessId, Units};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BankerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Malformed input in case {case}: {reason}")]
    MalformedInput { case: usize, reason: String },

    #[error("Dimension mismatch in {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Process {process} not found (system has {processes} processes)")]
    UnknownProcess { process: ProcessId, processes: usize },

    #[error("Negative need for process {process}, resource {resource}: {value}")]
    NegativeNeed {
        process: ProcessId,
        resource: usize,
        value: Units,
    },

    #[error("Process {process} requests {requested} of resource {resource}, need is {need}")]
    RequestExceedsNeed {
        process: ProcessId,
        resource: usize,
        requested: Units,
        need: Units,
    },

    #[error("Unit count overflow computing {what}")]
    UnitsOverflow { what: &'static str },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type BankerResult<T> = Result<T, BankerError>;
