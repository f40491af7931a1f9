//! Deterministic scenario generation for property tests and the
//! `--generate` mode of the runner.
//!
//! RULE: nothing here calls a platform RNG. Every scenario is derived
//! from a single seed, so a failing property test can be replayed
//! exactly from the seed it prints.

use crate::{
    input::TestCase,
    state::SystemState,
    types::{Matrix, ProcessId, ResourceVector, Units},
};
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// A seeded RNG stream. Different `stream` values of the same seed
/// never share a sequence.
pub struct ScenarioRng {
    inner: Pcg64Mcg,
}

impl ScenarioRng {
    pub fn new(seed: u64, stream: u64) -> Self {
        let derived_seed = seed ^ stream.wrapping_mul(0x9e37_79b9_7f4a_7c15);
        Self {
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Roll units in [0, max].
    pub fn units_up_to(&mut self, max: Units) -> Units {
        if max <= 0 {
            return 0;
        }
        self.next_u64_below(max as u64 + 1) as Units
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// A uniformly random ordering of 0..n.
    pub fn permutation(&mut self, n: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..n).collect();
        for i in (1..n).rev() {
            let j = self.next_u64_below(i as u64 + 1) as usize;
            order.swap(i, j);
        }
        order
    }
}

pub struct ScenarioGenerator {
    rng:               ScenarioRng,
    pub max_processes: usize,
    pub max_resources: usize,
    /// Upper bound for any single allocation or need entry.
    pub max_units:     Units,
    cases:             usize,
}

impl ScenarioGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng:           ScenarioRng::new(seed, 0),
            max_processes: 6,
            max_resources: 4,
            max_units:     9,
            cases:         0,
        }
    }

    fn random_matrix(&mut self, processes: usize, resources: usize) -> Matrix {
        let max = self.max_units;
        let rng = &mut self.rng;
        (0..processes)
            .map(|_| (0..resources).map(|_| rng.units_up_to(max)).collect::<ResourceVector>())
            .collect()
    }

    fn build(available: ResourceVector, allocation: Matrix, need: &Matrix) -> SystemState {
        let max: Matrix = allocation
            .iter()
            .zip(need)
            .map(|(a, n)| a.iter().zip(n).map(|(x, y)| x + y).collect::<ResourceVector>())
            .collect();
        SystemState {
            available,
            allocation,
            max,
            need: need.clone(),
        }
    }

    /// A state that is safe by construction: a hidden completion order
    /// is planted and `available` is topped up just enough for it.
    /// Returns the state and the planted order.
    pub fn safe_state(&mut self, processes: usize, resources: usize) -> (SystemState, Vec<ProcessId>) {
        let allocation = self.random_matrix(processes, resources);
        let need = self.random_matrix(processes, resources);
        let order = self.rng.permutation(processes);

        let mut available: ResourceVector = vec![0; resources];
        let mut work: ResourceVector = vec![0; resources];
        for &p in &order {
            for j in 0..resources {
                let deficit = need[p][j] - work[j];
                if deficit > 0 {
                    available[j] += deficit;
                    work[j] += deficit;
                }
                work[j] += allocation[p][j];
            }
        }
        for a in available.iter_mut() {
            *a += self.rng.units_up_to(2);
        }

        (Self::build(available, allocation, &need), order)
    }

    /// A state with no guarantee either way.
    pub fn random_state(&mut self, processes: usize, resources: usize) -> SystemState {
        let allocation = self.random_matrix(processes, resources);
        let need = self.random_matrix(processes, resources);
        let available: ResourceVector = (0..resources)
            .map(|_| self.rng.units_up_to(self.max_units))
            .collect();
        Self::build(available, allocation, &need)
    }

    /// A full test case with at least one process. Requests usually stay
    /// within the requester's need; some overshoot it or `available`.
    pub fn random_case(&mut self) -> TestCase {
        let processes = 1 + self.rng.next_u64_below(self.max_processes.max(1) as u64) as usize;
        let resources = self.rng.next_u64_below(self.max_resources as u64 + 1) as usize;
        let state = if self.rng.chance(0.6) {
            self.safe_state(processes, resources).0
        } else {
            self.random_state(processes, resources)
        };

        let requester = self.rng.next_u64_below(processes as u64) as ProcessId;
        let overshoot = self.rng.chance(0.2);
        let request: ResourceVector = (0..resources)
            .map(|j| {
                let cap = if overshoot {
                    state.need[requester][j] + state.available[j] + 1
                } else {
                    state.need[requester][j]
                };
                self.rng.units_up_to(cap)
            })
            .collect();

        self.cases += 1;
        TestCase {
            index: self.cases,
            label: format!("P{requester}"),
            state,
            requester,
            request,
        }
    }
}
