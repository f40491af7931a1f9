//! The request evaluator.
//!
//! Per case:
//!   1. ParseState        — the case arrives with its state built
//!   2. CheckInitial      — safety check on the current state
//!   3. Unsafe            — terminal; the state is unsafe (or, under
//!                          the strict policy, invalid) and no request
//!                          is simulated
//!   4. CheckHypothetical — build the post-grant copy, validate it,
//!                          run the safety check again
//!   5. Decided           — grant or deny; nothing is committed
//!
//! Every case ends with exactly one `CaseDecided` event, emitted under
//! either `Unsafe` or `Decided`.
//!
//! Both checks go through `SystemState::check_safety`.

use crate::{
    config::RequestPolicy,
    error::{BankerError, BankerResult},
    event::{EvalEvent, EvalPhase, RejectReason},
    input::TestCase,
    safety::SafetyReport,
    types::{Matrix, ProcessId, Units},
};
use serde::Serialize;

/// Verdict on a request whose grant was simulated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decision {
    Granted { report: SafetyReport },
    /// The hypothetical state has no completion order.
    DeniedUnsafe { report: SafetyReport },
    /// Some available count would go negative. No safety check was run.
    DeniedInsufficient { resources: Vec<usize> },
}

impl Decision {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CaseOutcome {
    /// Strict policy only: the parsed state has `max < allocation`.
    InvalidState {
        process:  ProcessId,
        resource: usize,
        value:    Units,
    },
    CurrentUnsafe {
        initial: SafetyReport,
    },
    /// Strict policy only: the request is above the requester's need.
    RequestExceedsNeed {
        initial:   SafetyReport,
        resource:  usize,
        requested: Units,
        need:      Units,
    },
    Simulated {
        initial:           SafetyReport,
        /// Need matrix of the hypothetical post-grant state.
        hypothetical_need: Matrix,
        decision:          Decision,
    },
}

impl CaseOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Simulated { decision, .. } if decision.is_granted())
    }
}

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub outcome: CaseOutcome,
    /// Events in emission order, each tagged with the phase that emitted it.
    pub events:  Vec<(EvalPhase, EvalEvent)>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RequestEvaluator {
    policy: RequestPolicy,
}

impl RequestEvaluator {
    pub fn new(policy: RequestPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> RequestPolicy {
        self.policy
    }

    /// Decide one case. Errors when the request does not fit the state
    /// (unknown requester or wrong length), which the reader never
    /// produces, and with `MalformedInput` when granting the request
    /// would overflow a unit count.
    pub fn evaluate(&self, case: &TestCase) -> BankerResult<Evaluation> {
        let n = case.index;
        let state = &case.state;
        let mut events = vec![(
            EvalPhase::ParseState,
            EvalEvent::CaseParsed {
                case:      n,
                processes: state.processes(),
                resources: state.resources(),
                requester: case.requester,
                label:     case.label.clone(),
            },
        )];

        if self.policy == RequestPolicy::Strict {
            match state.validate_need() {
                Ok(()) => {}
                Err(BankerError::NegativeNeed { process, resource, value }) => {
                    log::warn!("case {n}: process {process} has negative need {value} for resource {resource}");
                    events.push((
                        EvalPhase::ParseState,
                        EvalEvent::StateRejected { case: n, process, resource, value },
                    ));
                    events.push((EvalPhase::Unsafe, EvalEvent::CaseDecided { case: n, granted: false }));
                    return Ok(Evaluation {
                        outcome: CaseOutcome::InvalidState { process, resource, value },
                        events,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        let initial = state.check_safety();
        events.push((
            EvalPhase::CheckInitial,
            EvalEvent::InitialCheckCompleted {
                case:     n,
                safe:     initial.safe,
                sequence: initial.sequence.clone(),
            },
        ));

        if !initial.safe {
            log::info!("case {n}: current state is unsafe after {:?}", initial.sequence);
            events.push((EvalPhase::Unsafe, EvalEvent::CaseDecided { case: n, granted: false }));
            return Ok(Evaluation {
                outcome: CaseOutcome::CurrentUnsafe { initial },
                events,
            });
        }

        if self.policy == RequestPolicy::Strict {
            match state.validate_request_within_need(case.requester, &case.request) {
                Ok(()) => {}
                Err(BankerError::RequestExceedsNeed { resource, requested, need, .. }) => {
                    log::warn!(
                        "case {n}: {} requests {requested} of resource {resource}, need is {need}",
                        case.label
                    );
                    events.push((
                        EvalPhase::CheckHypothetical,
                        EvalEvent::RequestRejected {
                            case:   n,
                            reason: RejectReason::RequestExceedsNeed { resource, requested, need },
                        },
                    ));
                    events.push((EvalPhase::Decided, EvalEvent::CaseDecided { case: n, granted: false }));
                    return Ok(Evaluation {
                        outcome: CaseOutcome::RequestExceedsNeed { initial, resource, requested, need },
                        events,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        let hypothetical = state
            .with_grant(case.requester, &case.request)
            .map_err(|e| match e {
                BankerError::UnitsOverflow { .. } => BankerError::MalformedInput {
                    case:   n,
                    reason: e.to_string(),
                },
                e => e,
            })?;
        events.push((
            EvalPhase::CheckHypothetical,
            EvalEvent::HypotheticalStateBuilt {
                case:      n,
                available: hypothetical.available.clone(),
            },
        ));

        let overdrawn = hypothetical.overdrawn_resources();
        let decision = if !overdrawn.is_empty() {
            log::info!("case {n}: {} would overdraw resources {overdrawn:?}", case.label);
            events.push((
                EvalPhase::CheckHypothetical,
                EvalEvent::RequestRejected {
                    case:   n,
                    reason: RejectReason::InsufficientAvailable { resources: overdrawn.clone() },
                },
            ));
            Decision::DeniedInsufficient { resources: overdrawn }
        } else {
            let report = hypothetical.check_safety();
            events.push((
                EvalPhase::CheckHypothetical,
                EvalEvent::HypotheticalCheckCompleted {
                    case:     n,
                    safe:     report.safe,
                    sequence: report.sequence.clone(),
                },
            ));
            if report.safe {
                Decision::Granted { report }
            } else {
                Decision::DeniedUnsafe { report }
            }
        };

        log::info!("case {n}: {} granted={}", case.label, decision.is_granted());
        events.push((
            EvalPhase::Decided,
            EvalEvent::CaseDecided { case: n, granted: decision.is_granted() },
        ));

        Ok(Evaluation {
            outcome: CaseOutcome::Simulated {
                initial,
                hypothetical_need: hypothetical.need,
                decision,
            },
            events,
        })
    }
}
