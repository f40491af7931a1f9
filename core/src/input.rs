//! The input adapter: turns a whitespace-delimited token stream into
//! test cases.
//!
//! RULE: a malformed record never ends the run. The reader reports it
//! once, skips forward to the next case marker, and carries on.

use crate::{
    config::InputGrammar,
    error::{BankerError, BankerResult},
    state::SystemState,
    types::{Matrix, ProcessId, ResourceVector, Units},
};
use std::collections::VecDeque;
use std::fmt::Write as _;
use std::io::BufRead;

/// One record: the current state plus one pending request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    /// 1-based position of the record in the stream.
    pub index:     usize,
    pub state:     SystemState,
    /// The requester label exactly as written, e.g. `P1`.
    pub label:     String,
    pub requester: ProcessId,
    pub request:   ResourceVector,
}

impl TestCase {
    /// Render the case back into the record grammar.
    pub fn to_record(&self, grammar: &InputGrammar) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} {}", grammar.case_marker, self.state.resources());
        let _ = writeln!(out, "{} {}", grammar.process_marker, self.state.processes());
        let _ = writeln!(out, "{} {}", grammar.available_keyword, join(&self.state.available));
        let _ = writeln!(out, "{}", grammar.max_keyword);
        for row in &self.state.max {
            let _ = writeln!(out, "{}", join(row));
        }
        let _ = writeln!(out, "{}", grammar.allocation_keyword);
        for row in &self.state.allocation {
            let _ = writeln!(out, "{}", join(row));
        }
        let _ = writeln!(out, "{} {}", self.label, join(&self.request));
        out
    }
}

fn join(row: &[Units]) -> String {
    row.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(" ")
}

struct Token {
    text:       String,
    line_start: bool,
}

/// Streaming reader of test cases.
pub struct CaseReader<R: BufRead> {
    source:   R,
    grammar:  InputGrammar,
    pending:  VecDeque<Token>,
    cases:    usize,
    finished: bool,
}

impl<R: BufRead> CaseReader<R> {
    pub fn new(source: R, grammar: InputGrammar) -> Self {
        Self {
            source,
            grammar,
            pending:  VecDeque::new(),
            cases:    0,
            finished: false,
        }
    }

    /// Number of records started so far, including malformed ones.
    pub fn cases_read(&self) -> usize {
        self.cases
    }

    /// Make sure at least one token is buffered. Ok(false) at end of stream.
    fn fill(&mut self) -> BankerResult<bool> {
        let mut line = String::new();
        while self.pending.is_empty() {
            line.clear();
            if self.source.read_line(&mut line)? == 0 {
                return Ok(false);
            }
            self.pending.extend(line.split_whitespace().enumerate().map(|(i, t)| Token {
                text:       t.to_string(),
                line_start: i == 0,
            }));
        }
        Ok(true)
    }

    /// Whether the next token is the case marker. Ok(None) at end of stream.
    fn peek_marker(&mut self) -> BankerResult<Option<bool>> {
        if !self.fill()? {
            return Ok(None);
        }
        Ok(self.pending.front().map(|t| t.text == self.grammar.case_marker))
    }

    /// Take the next token of the current record. The case marker is left
    /// in place so the next record can still be read.
    fn next_in_record(&mut self, what: &str) -> BankerResult<String> {
        match self.peek_marker()? {
            None => Err(self.malformed(format!("stream ended while reading {what}"))),
            Some(true) => Err(self.malformed(format!(
                "record ended early: found case marker while reading {what}"
            ))),
            Some(false) => Ok(self.pending.pop_front().map(|t| t.text).unwrap_or_default()),
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> BankerResult<()> {
        let token = self.next_in_record(keyword)?;
        if token != keyword {
            return Err(self.malformed(format!("expected '{keyword}', found '{token}'")));
        }
        Ok(())
    }

    fn read_count(&mut self, what: &str, limit: usize) -> BankerResult<usize> {
        let token = self.next_in_record(what)?;
        let count = token
            .parse::<usize>()
            .map_err(|_| self.malformed(format!("{what} must be a non-negative integer, found '{token}'")))?;
        if count > limit {
            return Err(self.malformed(format!("{what} {count} exceeds the limit of {limit}")));
        }
        Ok(count)
    }

    /// Unit counts in a record are never negative.
    fn read_units(&mut self, what: &str) -> BankerResult<Units> {
        let token = self.next_in_record(what)?;
        match token.parse::<Units>() {
            Ok(value) if value >= 0 => Ok(value),
            _ => Err(self.malformed(format!(
                "{what} must be a non-negative integer, found '{token}'"
            ))),
        }
    }

    fn read_vector(&mut self, len: usize, what: &str) -> BankerResult<ResourceVector> {
        (0..len).map(|_| self.read_units(what)).collect()
    }

    fn read_matrix(&mut self, rows: usize, cols: usize, what: &str) -> BankerResult<Matrix> {
        (0..rows).map(|_| self.read_vector(cols, what)).collect()
    }

    fn parse_label(&self, label: &str, processes: usize) -> BankerResult<ProcessId> {
        let index = label
            .strip_prefix(self.grammar.label_prefix.as_str())
            .and_then(|rest| rest.parse::<ProcessId>().ok())
            .ok_or_else(|| self.malformed(format!("'{label}' is not a process label")))?;
        if index >= processes {
            return Err(self.malformed(format!(
                "'{label}' names process {index}, but there are only {processes}"
            )));
        }
        Ok(index)
    }

    fn malformed(&self, reason: String) -> BankerError {
        BankerError::MalformedInput { case: self.cases, reason }
    }

    /// Everything after the case marker.
    fn read_body(&mut self) -> BankerResult<TestCase> {
        let resources = self.read_count("resource count", self.grammar.max_resources)?;
        let process_marker = self.grammar.process_marker.clone();
        self.expect_keyword(&process_marker)?;
        let processes = self.read_count("process count", self.grammar.max_processes)?;

        let keyword = self.grammar.available_keyword.clone();
        self.expect_keyword(&keyword)?;
        let available = self.read_vector(resources, "available")?;

        let keyword = self.grammar.max_keyword.clone();
        self.expect_keyword(&keyword)?;
        let max = self.read_matrix(processes, resources, "max")?;

        let keyword = self.grammar.allocation_keyword.clone();
        self.expect_keyword(&keyword)?;
        let allocation = self.read_matrix(processes, resources, "allocation")?;

        let label = self.next_in_record("process label")?;
        let requester = self.parse_label(&label, processes)?;
        let request = self.read_vector(resources, "request")?;

        let state = SystemState::new(available, max, allocation)
            .map_err(|e| self.malformed(e.to_string()))?;
        Ok(TestCase {
            index: self.cases,
            state,
            label,
            requester,
            request,
        })
    }

    /// Whether `token` could appear anywhere inside a record.
    fn belongs_to_record(&self, token: &str) -> bool {
        let g = &self.grammar;
        [&g.process_marker, &g.available_keyword, &g.max_keyword, &g.allocation_keyword]
            .iter()
            .any(|k| k.as_str() == token)
            || token.parse::<Units>().is_ok()
            || token
                .strip_prefix(g.label_prefix.as_str())
                .is_some_and(|rest| rest.parse::<ProcessId>().is_ok())
    }

    /// Drop tokens up to (not including) the next case marker. A line
    /// that opens with a token no record can contain is a terminator;
    /// it is left in place so the stream ends there.
    fn resync(&mut self) -> BankerResult<()> {
        while let Some(false) = self.peek_marker()? {
            let stop = self
                .pending
                .front()
                .is_some_and(|t| t.line_start && !self.belongs_to_record(&t.text));
            if stop {
                log::debug!("resync stopped at terminator line");
                break;
            }
            self.pending.pop_front();
        }
        Ok(())
    }

    /// Read the next record. Ok(None) at end of stream or when the next
    /// token is not the case marker.
    pub fn next_case(&mut self) -> BankerResult<Option<TestCase>> {
        match self.peek_marker()? {
            None => return Ok(None),
            Some(false) => {
                log::debug!(
                    "stream ends at non-marker token {:?}",
                    self.pending.front().map(|t| t.text.as_str())
                );
                return Ok(None);
            }
            Some(true) => {}
        }
        self.pending.pop_front();
        self.cases += 1;

        match self.read_body() {
            Ok(case) => Ok(Some(case)),
            Err(e @ BankerError::Io(_)) => Err(e),
            Err(e) => {
                log::warn!("{e}; skipping to next record");
                self.resync()?;
                Err(e)
            }
        }
    }
}

impl<R: BufRead> Iterator for CaseReader<R> {
    type Item = BankerResult<TestCase>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_case() {
            Ok(Some(case)) => Some(Ok(case)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                if matches!(e, BankerError::Io(_)) {
                    self.finished = true;
                }
                Some(Err(e))
            }
        }
    }
}
