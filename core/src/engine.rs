//! The engine: drives a whole input stream through the evaluator.
//!
//! RULES:
//!   - Cases run strictly one after another; no state carries over
//!     between cases except the event log and the summary counters.
//!   - A malformed record is reported on the error sink and the run
//!     continues with the next record.
//!   - Report lines go to the output sink only; logging and the
//!     trace never share it.

use crate::{
    config::BankerConfig,
    error::{BankerError, BankerResult},
    evaluator::{CaseOutcome, RequestEvaluator},
    event::{EvalEvent, EvalPhase, EventLogEntry},
    input::{CaseReader, TestCase},
    report,
};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};

/// Counters for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunSummary {
    /// Records started, including malformed ones.
    pub cases:          usize,
    pub granted:        usize,
    pub denied:         usize,
    pub current_unsafe: usize,
    /// Strict policy: states rejected for negative need.
    pub invalid:        usize,
    pub malformed:      usize,
}

pub struct BankerEngine {
    pub config: BankerConfig,
    evaluator:  RequestEvaluator,
    log:        Vec<EventLogEntry>,
    summary:    RunSummary,
}

impl BankerEngine {
    pub fn new(config: BankerConfig) -> Self {
        Self {
            evaluator: RequestEvaluator::new(config.policy),
            config,
            log:       Vec::new(),
            summary:   RunSummary::default(),
        }
    }

    /// Read every record from `input`, write report lines to `out` and
    /// one line per malformed record to `errors`.
    pub fn run<R, W, E>(&mut self, input: R, out: &mut W, errors: &mut E) -> BankerResult<RunSummary>
    where
        R: BufRead,
        W: Write,
        E: Write,
    {
        if self.log.is_empty() {
            let init = EvalEvent::RunInitialized { policy: self.config.policy };
            self.append(0, EvalPhase::ParseState, &init)?;
        }

        let mut reader = CaseReader::new(input, self.config.grammar.clone());
        for item in reader.by_ref() {
            match item {
                Ok(case) => match self.process_case(&case) {
                    Ok(lines) => {
                        for line in lines {
                            writeln!(out, "{line}")?;
                        }
                    }
                    Err(e @ BankerError::Io(_)) => return Err(e),
                    Err(e) => self.fail_case(case.index, &e, errors)?,
                },
                Err(e @ BankerError::Io(_)) => return Err(e),
                Err(e) => {
                    let case = match &e {
                        BankerError::MalformedInput { case, .. } => *case,
                        _ => 0,
                    };
                    self.fail_case(case, &e, errors)?;
                }
            }
        }
        self.summary.cases += reader.cases_read();
        out.flush()?;

        log::info!(
            "run complete: {} cases, {} granted, {} denied, {} unsafe, {} malformed",
            self.summary.cases,
            self.summary.granted,
            self.summary.denied,
            self.summary.current_unsafe,
            self.summary.malformed
        );
        Ok(self.summary.clone())
    }

    /// Evaluate one case, record its events and return its report lines.
    pub fn process_case(&mut self, case: &TestCase) -> BankerResult<Vec<String>> {
        let evaluation = self.evaluator.evaluate(case)?;
        for (phase, event) in &evaluation.events {
            self.append(case.index, *phase, event)?;
        }

        match &evaluation.outcome {
            CaseOutcome::InvalidState { .. } => self.summary.invalid += 1,
            CaseOutcome::CurrentUnsafe { .. } => self.summary.current_unsafe += 1,
            outcome if outcome.is_granted() => self.summary.granted += 1,
            _ => self.summary.denied += 1,
        }

        Ok(report::render(case, &evaluation.outcome, &self.config))
    }

    pub fn events(&self) -> &[EventLogEntry] {
        &self.log
    }

    /// Write the event log as JSON lines.
    pub fn write_trace<W: Write>(&self, sink: &mut W) -> BankerResult<()> {
        for entry in &self.log {
            writeln!(sink, "{}", serde_json::to_string(entry)?)?;
        }
        Ok(())
    }

    /// Count a record that could not be evaluated and report it.
    fn fail_case<E: Write>(&mut self, case: usize, e: &BankerError, errors: &mut E) -> BankerResult<()> {
        self.summary.malformed += 1;
        self.append(case, EvalPhase::ParseState, &EvalEvent::CaseFailed {
            case,
            error: e.to_string(),
        })?;
        writeln!(errors, "error: {e}")?;
        Ok(())
    }

    fn append(&mut self, case_index: usize, phase: EvalPhase, event: &EvalEvent) -> BankerResult<()> {
        let entry = EventLogEntry {
            case_index,
            phase:      phase.name().to_string(),
            event_type: event.type_name().to_string(),
            payload:    serde_json::to_string(event)?,
        };
        log::debug!("case={case_index} {}: {}", entry.phase, entry.event_type);
        self.log.push(entry);
        Ok(())
    }
}
