//! The safety checker.
//!
//! RULE: this module is pure. It owns its `work` and `finish` copies,
//! never mutates its inputs, and two calls on identical inputs return
//! identical reports.
//!
//! Tie-break: within each pass processes are tried in index order,
//! so among processes that can finish in the same pass the lowest
//! index is scheduled first.

use crate::types::{dominated_by, ProcessId, Units};
use serde::{Deserialize, Serialize};

/// Result of one safety check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyReport {
    pub safe: bool,
    /// Processes in the order they finished. Complete (length P) iff `safe`.
    pub sequence: Vec<ProcessId>,
    /// Number of scans over the process list, including the final
    /// scan that made no progress.
    pub passes: usize,
}

/// Run the greedy fixpoint safety test.
///
/// `allocation` and `need` have one row per process; each row has
/// `available.len()` columns. Entries are trusted, including negative
/// need, which simply compares as satisfiable.
pub fn is_safe<A, N>(available: &[Units], allocation: &[A], need: &[N]) -> SafetyReport
where
    A: AsRef<[Units]>,
    N: AsRef<[Units]>,
{
    let processes = allocation.len().min(need.len());
    let mut work = available.to_vec();
    let mut finish = vec![false; processes];
    let mut sequence = Vec::with_capacity(processes);
    let mut passes = 0;

    loop {
        passes += 1;
        let mut progress = false;

        for i in 0..processes {
            if finish[i] || !dominated_by(need[i].as_ref(), &work) {
                continue;
            }
            release(&mut work, allocation[i].as_ref());
            finish[i] = true;
            sequence.push(i);
            progress = true;
        }

        log::debug!("safety pass {passes}: work={work:?} sequence={sequence:?}");

        if !progress {
            break;
        }
    }

    let safe = finish.iter().all(|f| *f);
    SafetyReport { safe, sequence, passes }
}

/// Return a finished process's allocation to `work`. Saturates: once
/// an entry reaches `Units::MAX` every need compares as covered, which
/// is what the unbounded sum would give.
fn release(work: &mut [Units], allocation: &[Units]) {
    for (w, a) in work.iter_mut().zip(allocation) {
        *w = w.saturating_add(*a);
    }
}

/// Replay `sequence` against the state, accumulating released
/// allocations into `work`. Returns false as soon as a scheduled
/// process's need is not covered, or a process is out of range
/// or scheduled twice.
pub fn replay_sequence<A, N>(
    available: &[Units],
    allocation: &[A],
    need: &[N],
    sequence: &[ProcessId],
) -> bool
where
    A: AsRef<[Units]>,
    N: AsRef<[Units]>,
{
    let processes = allocation.len().min(need.len());
    let mut work = available.to_vec();
    let mut seen = vec![false; processes];

    for &i in sequence {
        if i >= processes || seen[i] || !dominated_by(need[i].as_ref(), &work) {
            return false;
        }
        seen[i] = true;
        release(&mut work, allocation[i].as_ref());
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_system_is_safe() {
        let none: Vec<Vec<Units>> = vec![];
        let report = is_safe(&[1, 2, 3], &none, &none);
        assert!(report.safe);
        assert!(report.sequence.is_empty());
        assert_eq!(report.passes, 1);
    }

    #[test]
    fn lowest_index_first_within_a_pass() {
        // Process 2 can only go after 0 releases; 1 is free immediately.
        let allocation = vec![vec![2], vec![0], vec![1]];
        let need = vec![vec![1], vec![0], vec![3]];
        let report = is_safe(&[1], &allocation, &need);
        assert!(report.safe);
        assert_eq!(report.sequence, vec![0, 1, 2]);
    }

    #[test]
    fn later_pass_picks_up_earlier_index() {
        // 0 needs what 1 releases, so 0 finishes in pass two.
        let allocation = vec![vec![0], vec![4]];
        let need = vec![vec![5], vec![1]];
        let report = is_safe(&[1], &allocation, &need);
        assert!(report.safe);
        assert_eq!(report.sequence, vec![1, 0]);
        assert_eq!(report.passes, 3);
    }

    #[test]
    fn stuck_process_makes_state_unsafe() {
        let allocation = vec![vec![1, 0], vec![0, 1]];
        let need = vec![vec![0, 0], vec![5, 5]];
        let report = is_safe(&[0, 0], &allocation, &need);
        assert!(!report.safe);
        assert_eq!(report.sequence, vec![0]);
    }

    #[test]
    fn negative_need_compares_as_satisfiable() {
        let allocation = vec![vec![3]];
        let need = vec![vec![-2]];
        assert!(is_safe(&[0], &allocation, &need).safe);
    }

    #[test]
    fn replay_rejects_duplicates_and_uncovered_steps() {
        let allocation = vec![vec![0], vec![4]];
        let need = vec![vec![5], vec![1]];
        assert!(replay_sequence(&[1], &allocation, &need, &[1, 0]));
        assert!(!replay_sequence(&[1], &allocation, &need, &[0, 1]));
        assert!(!replay_sequence(&[1], &allocation, &need, &[1, 1]));
        assert!(!replay_sequence(&[1], &allocation, &need, &[7]));
    }

    #[test]
    fn huge_allocations_do_not_overflow_work() {
        let allocation = vec![vec![Units::MAX], vec![Units::MAX], vec![0]];
        let need = vec![vec![0], vec![0], vec![Units::MAX]];
        let report = is_safe(&[Units::MAX], &allocation, &need);
        assert!(report.safe);
        assert_eq!(report.sequence, vec![0, 1, 2]);
    }
}
