//! The evaluation trace.
//!
//! RULE: every transition of the per-case state machine is recorded as
//! an EvalEvent. The engine keeps them in an in-memory log; the same
//! input always yields the same log, byte for byte.

use crate::{
    config::RequestPolicy,
    types::{ProcessId, ResourceVector, Units},
};
use serde::{Deserialize, Serialize};

/// States of the per-case evaluation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EvalPhase {
    ParseState,
    CheckInitial,
    CheckHypothetical,
    Unsafe,
    Decided,
}

impl EvalPhase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ParseState        => "parse_state",
            Self::CheckInitial      => "check_initial",
            Self::CheckHypothetical => "check_hypothetical",
            Self::Unsafe            => "unsafe",
            Self::Decided           => "decided",
        }
    }
}

/// Why a request was turned down before the second safety check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectReason {
    InsufficientAvailable {
        resources: Vec<usize>,
    },
    RequestExceedsNeed {
        resource:  usize,
        requested: Units,
        need:      Units,
    },
}

/// Every event emitted while evaluating a stream.
/// Variants are only ever appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EvalEvent {
    // ── Engine events ──────────────────────────────
    RunInitialized {
        policy: RequestPolicy,
    },

    // ── Per-case events ────────────────────────────
    CaseParsed {
        case:      usize,
        processes: usize,
        resources: usize,
        requester: ProcessId,
        label:     String,
    },
    StateRejected {
        case:     usize,
        process:  ProcessId,
        resource: usize,
        value:    Units,
    },
    InitialCheckCompleted {
        case:     usize,
        safe:     bool,
        sequence: Vec<ProcessId>,
    },
    HypotheticalStateBuilt {
        case:      usize,
        available: ResourceVector,
    },
    RequestRejected {
        case:   usize,
        reason: RejectReason,
    },
    HypotheticalCheckCompleted {
        case:     usize,
        safe:     bool,
        sequence: Vec<ProcessId>,
    },
    CaseDecided {
        case:    usize,
        granted: bool,
    },
    CaseFailed {
        case:  usize,
        error: String,
    },
}

impl EvalEvent {
    /// Stable name used for the `event_type` field of the log.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::RunInitialized { .. }             => "run_initialized",
            Self::CaseParsed { .. }                 => "case_parsed",
            Self::StateRejected { .. }              => "state_rejected",
            Self::InitialCheckCompleted { .. }      => "initial_check_completed",
            Self::HypotheticalStateBuilt { .. }     => "hypothetical_state_built",
            Self::RequestRejected { .. }            => "request_rejected",
            Self::HypotheticalCheckCompleted { .. } => "hypothetical_check_completed",
            Self::CaseDecided { .. }                => "case_decided",
            Self::CaseFailed { .. }                 => "case_failed",
        }
    }
}

/// One entry of the in-memory event log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventLogEntry {
    /// 0 for run-level events.
    pub case_index: usize,
    pub phase:      String,
    pub event_type: String,
    pub payload:    String, // JSON-serialized EvalEvent
}
