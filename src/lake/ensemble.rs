//! Ensemble runner: one recurrence propagation per forcing column.
//!
//! Sample paths never interact, so the ensemble loop is embarrassingly
//! parallel. The parallel runner uses lock-free work stealing
//! (crossbeam-deque) to level the load across workers and reassembles
//! trajectories by column index, so it is bit-identical to the
//! sequential runner.

use crossbeam_deque::{Injector, Steal, Stealer, Worker};

use crate::error::{LakeError, LakeResult};
use crate::lake::forcing::ForcingEnsemble;
use crate::lake::params::LakeParams;
use crate::lake::recurrence::propagate;

/// (T+1) x N matrix of state trajectories, one column per sample path.
#[derive(Debug, Clone, PartialEq)]
pub struct StateMatrix {
    rows: usize,
    cols: usize,
    /// Column-major storage: trajectory n occupies `[n*rows, (n+1)*rows)`.
    values: Vec<f64>,
}

impl StateMatrix {
    fn from_trajectories(trajectories: Vec<Vec<f64>>) -> Self {
        let cols = trajectories.len();
        let rows = trajectories.first().map_or(0, Vec::len);
        let mut values = Vec::with_capacity(rows * cols);
        for trajectory in trajectories {
            debug_assert_eq!(trajectory.len(), rows);
            values.extend_from_slice(&trajectory);
        }
        Self { rows, cols, values }
    }

    /// Number of rows (T+1).
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (N).
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// State at time step `t` for sample path `n`.
    ///
    /// # Panics
    ///
    /// Panics if `t >= rows` or `n >= cols`.
    #[must_use]
    pub fn get(&self, t: usize, n: usize) -> f64 {
        assert!(t < self.rows && n < self.cols, "state index out of bounds");
        self.values[n * self.rows + t]
    }

    /// Full trajectory of sample path `n` (length T+1).
    ///
    /// # Panics
    ///
    /// Panics if `n >= cols`.
    #[must_use]
    pub fn column(&self, n: usize) -> &[f64] {
        assert!(n < self.cols, "sample path index out of bounds");
        &self.values[n * self.rows..(n + 1) * self.rows]
    }

    /// Terminal-horizon states: row T across all sample paths.
    #[must_use]
    pub fn terminal_row(&self) -> Vec<f64> {
        (0..self.cols).map(|n| self.get(self.rows - 1, n)).collect()
    }

    /// Verify no trajectory produced a NaN or infinite value.
    ///
    /// # Errors
    ///
    /// Returns `NonFiniteState` naming the first offending entry.
    pub fn check_finite(&self) -> LakeResult<()> {
        for n in 0..self.cols {
            for (t, &x) in self.column(n).iter().enumerate() {
                if !x.is_finite() {
                    return Err(LakeError::NonFiniteState { step: t, sample: n });
                }
            }
        }
        Ok(())
    }
}

/// Applies the recurrence propagator independently to every forcing column.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnsembleRunner;

impl EnsembleRunner {
    /// Run every sample path sequentially.
    ///
    /// # Errors
    ///
    /// Propagates the first error from the recurrence propagator
    /// (shape mismatch, invalid parameters, degenerate horizon).
    pub fn run(
        params: &LakeParams,
        policy: &[f64],
        forcing: &ForcingEnsemble,
    ) -> LakeResult<StateMatrix> {
        if policy.len() != forcing.horizon() {
            return Err(LakeError::shape("policy", forcing.horizon(), policy.len()));
        }

        let trajectories = (0..forcing.samples())
            .map(|n| propagate(params, policy, forcing.column(n)))
            .collect::<LakeResult<Vec<_>>>()?;

        Ok(StateMatrix::from_trajectories(trajectories))
    }

    /// Run sample paths across `workers` threads with work stealing.
    ///
    /// Completion order is irrelevant: results are reassembled by column
    /// index, so the output is bit-identical to [`Self::run`].
    ///
    /// # Errors
    ///
    /// Same contract as [`Self::run`]; input validation happens up front
    /// so a failing call spawns no threads.
    pub fn run_parallel(
        params: &LakeParams,
        policy: &[f64],
        forcing: &ForcingEnsemble,
        workers: usize,
    ) -> LakeResult<StateMatrix> {
        params.validate()?;
        if policy.len() != forcing.horizon() {
            return Err(LakeError::shape("policy", forcing.horizon(), policy.len()));
        }
        let workers = workers.max(1);
        if workers == 1 || forcing.samples() == 1 {
            return Self::run(params, policy, forcing);
        }

        let injector: Injector<usize> = Injector::new();
        for n in 0..forcing.samples() {
            injector.push(n);
        }

        let local_queues: Vec<Worker<usize>> = (0..workers).map(|_| Worker::new_fifo()).collect();
        let stealers: Vec<Stealer<usize>> = local_queues.iter().map(Worker::stealer).collect();

        let results: std::sync::Mutex<Vec<(usize, LakeResult<Vec<f64>>)>> =
            std::sync::Mutex::new(Vec::with_capacity(forcing.samples()));

        std::thread::scope(|s| {
            for (worker_id, local) in local_queues.into_iter().enumerate() {
                let injector = &injector;
                let stealers = &stealers;
                let results = &results;

                s.spawn(move || {
                    loop {
                        let task = local
                            .pop()
                            .or_else(|| loop {
                                match injector.steal() {
                                    Steal::Success(n) => return Some(n),
                                    Steal::Empty => return None,
                                    Steal::Retry => {}
                                }
                            })
                            .or_else(|| {
                                for i in 0..stealers.len() {
                                    let idx = (worker_id + i + 1) % stealers.len();
                                    loop {
                                        match stealers[idx].steal() {
                                            Steal::Success(n) => return Some(n),
                                            Steal::Empty => break,
                                            Steal::Retry => {}
                                        }
                                    }
                                }
                                None
                            });

                        match task {
                            Some(n) => {
                                let trajectory = propagate(params, policy, forcing.column(n));
                                if let Ok(mut guard) = results.lock() {
                                    guard.push((n, trajectory));
                                }
                            }
                            None => break, // No more work
                        }
                    }
                });
            }
        });

        let mut indexed = results.into_inner().unwrap_or_default();
        if indexed.len() != forcing.samples() {
            return Err(LakeError::config(
                "parallel ensemble lost sample paths during reassembly",
            ));
        }
        indexed.sort_by_key(|(n, _)| *n);

        let trajectories = indexed
            .into_iter()
            .map(|(_, t)| t)
            .collect::<LakeResult<Vec<_>>>()?;

        Ok(StateMatrix::from_trajectories(trajectories))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_ensemble() -> ForcingEnsemble {
        ForcingEnsemble::generate(100, 50, 0.03_f64.ln(), 0.1, 42).unwrap()
    }

    #[test]
    fn test_output_shape() {
        let params = LakeParams::default();
        let forcing = small_ensemble();
        let policy = vec![0.02; 100];

        let matrix = EnsembleRunner::run(&params, &policy, &forcing).unwrap();
        assert_eq!(matrix.rows(), 101);
        assert_eq!(matrix.cols(), 50);
        assert_eq!(matrix.terminal_row().len(), 50);
    }

    #[test]
    fn test_columns_match_standalone_propagation() {
        let params = LakeParams::default();
        let forcing = small_ensemble();
        let policy = vec![0.02; 100];

        let matrix = EnsembleRunner::run(&params, &policy, &forcing).unwrap();
        for n in 0..forcing.samples() {
            let standalone = propagate(&params, &policy, forcing.column(n)).unwrap();
            assert_eq!(
                matrix.column(n),
                standalone.as_slice(),
                "column {n} must be bit-identical to standalone propagation"
            );
        }
    }

    #[test]
    fn test_shared_initial_state() {
        let params = LakeParams {
            initial_state: 0.25,
            ..Default::default()
        };
        let forcing = small_ensemble();
        let policy = vec![0.02; 100];

        let matrix = EnsembleRunner::run(&params, &policy, &forcing).unwrap();
        for n in 0..matrix.cols() {
            assert_eq!(matrix.get(0, n), 0.25);
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let params = LakeParams::default();
        let forcing = small_ensemble();
        let policy = vec![0.02; 100];

        let sequential = EnsembleRunner::run(&params, &policy, &forcing).unwrap();
        for workers in [2, 4, 8] {
            let parallel =
                EnsembleRunner::run_parallel(&params, &policy, &forcing, workers).unwrap();
            assert_eq!(
                sequential, parallel,
                "parallel run with {workers} workers must be bit-identical"
            );
        }
    }

    #[test]
    fn test_parallel_single_worker() {
        let params = LakeParams::default();
        let forcing = small_ensemble();
        let policy = vec![0.02; 100];

        let sequential = EnsembleRunner::run(&params, &policy, &forcing).unwrap();
        let parallel = EnsembleRunner::run_parallel(&params, &policy, &forcing, 1).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_policy_shape_mismatch() {
        let params = LakeParams::default();
        let forcing = small_ensemble();
        let err = EnsembleRunner::run(&params, &[0.02; 99], &forcing).unwrap_err();
        assert!(matches!(err, LakeError::ShapeMismatch { .. }));

        let err = EnsembleRunner::run_parallel(&params, &[0.02; 99], &forcing, 4).unwrap_err();
        assert!(matches!(err, LakeError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_invalid_params_fail_before_spawning() {
        let params = LakeParams {
            b: -1.0,
            ..Default::default()
        };
        let forcing = small_ensemble();
        let err = EnsembleRunner::run_parallel(&params, &[0.02; 100], &forcing, 4).unwrap_err();
        assert!(matches!(err, LakeError::InvalidParameter { .. }));
    }

    #[test]
    fn test_check_finite() {
        let params = LakeParams::default();
        let forcing = small_ensemble();
        let matrix = EnsembleRunner::run(&params, &vec![0.02; 100], &forcing).unwrap();
        assert!(matrix.check_finite().is_ok());
    }

    #[test]
    fn test_state_matrix_terminal_row_is_last_row() {
        let forcing = ForcingEnsemble::from_columns(&[vec![0.1, 0.2], vec![0.3, 0.4]]).unwrap();
        let params = LakeParams::default();
        let matrix = EnsembleRunner::run(&params, &[0.0, 0.0], &forcing).unwrap();

        let terminal = matrix.terminal_row();
        assert_eq!(terminal.len(), 2);
        assert_eq!(terminal[0], matrix.get(2, 0));
        assert_eq!(terminal[1], matrix.get(2, 1));
    }
}
