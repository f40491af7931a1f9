//! System state snapshots.
//!
//! RULE: a SystemState is a value. The hypothetical post-grant state
//! is always a fresh copy built by `with_grant`; the current state is
//! never mutated, so simulation can never commit a grant.

use crate::{
    error::{BankerError, BankerResult},
    safety::{is_safe, SafetyReport},
    types::{checked_add, checked_sub, Matrix, ProcessId, ResourceVector, Units},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemState {
    pub available:  ResourceVector,
    pub allocation: Matrix,
    pub max:        Matrix,
    /// Derived: `max - allocation`, except for the requester's row in a
    /// hypothetical state, where it is `need - request`.
    pub need:       Matrix,
}

impl SystemState {
    /// Build a state from parsed rows and derive `need`.
    /// Rejects matrices whose shape does not match `available`.
    pub fn new(available: ResourceVector, max: Matrix, allocation: Matrix) -> BankerResult<Self> {
        if max.len() != allocation.len() {
            return Err(BankerError::DimensionMismatch {
                what:     "allocation rows",
                expected: max.len(),
                actual:   allocation.len(),
            });
        }
        let resources = available.len();
        for row in max.iter().chain(allocation.iter()) {
            if row.len() != resources {
                return Err(BankerError::DimensionMismatch {
                    what:     "matrix columns",
                    expected: resources,
                    actual:   row.len(),
                });
            }
        }

        let need = max
            .iter()
            .zip(&allocation)
            .map(|(m, a)| checked_sub(m, a))
            .collect::<Option<Matrix>>()
            .ok_or(BankerError::UnitsOverflow { what: "need" })?;

        let state = Self { available, allocation, max, need };
        state.totals()?;
        Ok(state)
    }

    pub fn processes(&self) -> usize {
        self.allocation.len()
    }

    pub fn resources(&self) -> usize {
        self.available.len()
    }

    /// Units of each resource in the system: `available + Σ allocation`.
    /// Preserved by `with_grant`. Every constructed state has totals that
    /// fit in `Units`.
    pub fn totals(&self) -> BankerResult<ResourceVector> {
        self.allocation
            .iter()
            .try_fold(self.available.clone(), |acc, row| checked_add(&acc, row))
            .ok_or(BankerError::UnitsOverflow { what: "resource totals" })
    }

    /// Run the safety checker on this state.
    pub fn check_safety(&self) -> SafetyReport {
        is_safe(&self.available, &self.allocation, &self.need)
    }

    /// First (process, resource, value) with `max < allocation`, if any.
    fn find_negative_need(&self) -> Option<(ProcessId, usize, Units)> {
        self.need.iter().enumerate().find_map(|(i, row)| {
            row.iter()
                .position(|n| *n < 0)
                .map(|j| (i, j, row[j]))
        })
    }

    /// Fail with `NegativeNeed` on the first row where max is below allocation.
    pub fn validate_need(&self) -> BankerResult<()> {
        match self.find_negative_need() {
            Some((process, resource, value)) => Err(BankerError::NegativeNeed {
                process,
                resource,
                value,
            }),
            None => Ok(()),
        }
    }

    /// Fail with `RequestExceedsNeed` if `request` asks for more than the
    /// process declared it could still need.
    pub fn validate_request_within_need(
        &self,
        process: ProcessId,
        request: &[Units],
    ) -> BankerResult<()> {
        self.check_request_shape(process, request)?;
        let need = &self.need[process];
        match request.iter().zip(need).position(|(r, n)| r > n) {
            Some(resource) => Err(BankerError::RequestExceedsNeed {
                process,
                resource,
                requested: request[resource],
                need:      need[resource],
            }),
            None => Ok(()),
        }
    }

    /// The hypothetical state after granting `request` to `process`.
    /// Only the requester's rows and `available` differ from `self`.
    pub fn with_grant(&self, process: ProcessId, request: &[Units]) -> BankerResult<Self> {
        self.check_request_shape(process, request)?;

        let overflow = |what| BankerError::UnitsOverflow { what };
        let mut next = self.clone();
        next.allocation[process] =
            checked_add(&self.allocation[process], request).ok_or(overflow("granted allocation"))?;
        next.need[process] =
            checked_sub(&self.need[process], request).ok_or(overflow("granted need"))?;
        next.available =
            checked_sub(&self.available, request).ok_or(overflow("granted available"))?;
        Ok(next)
    }

    /// Resources whose available count is below zero.
    pub fn overdrawn_resources(&self) -> Vec<usize> {
        self.available
            .iter()
            .enumerate()
            .filter(|(_, a)| **a < 0)
            .map(|(j, _)| j)
            .collect()
    }

    fn check_request_shape(&self, process: ProcessId, request: &[Units]) -> BankerResult<()> {
        if process >= self.processes() {
            return Err(BankerError::UnknownProcess {
                process,
                processes: self.processes(),
            });
        }
        if request.len() != self.resources() {
            return Err(BankerError::DimensionMismatch {
                what:     "request",
                expected: self.resources(),
                actual:   request.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> SystemState {
        SystemState::new(
            vec![2, 1],
            vec![vec![3, 2], vec![1, 1]],
            vec![vec![1, 0], vec![0, 1]],
        )
        .expect("valid state")
    }

    #[test]
    fn need_is_max_minus_allocation() {
        assert_eq!(small().need, vec![vec![2, 2], vec![1, 0]]);
    }

    #[test]
    fn grant_leaves_current_state_untouched() {
        let current = small();
        let before = current.clone();
        let next = current.with_grant(0, &[1, 1]).expect("grant");

        assert_eq!(current, before);
        assert_eq!(next.available, vec![1, 0]);
        assert_eq!(next.allocation[0], vec![2, 1]);
        assert_eq!(next.need[0], vec![1, 1]);
        assert_eq!(next.allocation[1], current.allocation[1]);
        assert_eq!(next.need[1], current.need[1]);
    }

    #[test]
    fn grant_conserves_totals() {
        let current = small();
        let next = current.with_grant(1, &[2, 0]).expect("grant");
        assert_eq!(current.totals().unwrap(), next.totals().unwrap());
    }

    #[test]
    fn totals_beyond_units_max_are_rejected() {
        let err = SystemState::new(
            vec![Units::MAX],
            vec![vec![1], vec![1]],
            vec![vec![1], vec![1]],
        )
        .unwrap_err();
        assert!(matches!(err, BankerError::UnitsOverflow { what: "resource totals" }));
    }

    #[test]
    fn need_underflow_is_rejected() {
        let err = SystemState::new(vec![0], vec![vec![Units::MIN]], vec![vec![1]]).unwrap_err();
        assert!(matches!(err, BankerError::UnitsOverflow { what: "need" }));
    }

    #[test]
    fn grant_that_overflows_allocation_is_an_error() {
        let state = SystemState::new(vec![0], vec![vec![Units::MAX]], vec![vec![Units::MAX]])
            .expect("totals fit");
        let err = state.with_grant(0, &[Units::MAX]).unwrap_err();
        assert!(matches!(err, BankerError::UnitsOverflow { what: "granted allocation" }));
    }

    #[test]
    fn ragged_matrix_is_rejected() {
        let err = SystemState::new(vec![1, 1], vec![vec![1]], vec![vec![0, 0]]).unwrap_err();
        assert!(matches!(err, BankerError::DimensionMismatch { .. }));
    }

    #[test]
    fn grant_to_unknown_process_is_rejected() {
        let err = small().with_grant(5, &[0, 0]).unwrap_err();
        assert!(matches!(err, BankerError::UnknownProcess { process: 5, processes: 2 }));
    }

    #[test]
    fn negative_need_is_located() {
        let state = SystemState::new(vec![0], vec![vec![1], vec![1]], vec![vec![0], vec![3]])
            .expect("shape is fine");
        assert_eq!(state.find_negative_need(), Some((1, 0, -2)));
        assert!(state.validate_need().is_err());
    }

    #[test]
    fn request_above_need_is_reported_with_position() {
        let err = small().validate_request_within_need(1, &[1, 1]).unwrap_err();
        match err {
            BankerError::RequestExceedsNeed { process, resource, requested, need } => {
                assert_eq!((process, resource, requested, need), (1, 1, 1, 0));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
