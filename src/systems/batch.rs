//! Batch runner and final-state extraction.
//!
//! A batch is `n_runs` independent urns under one rule and configuration.
//! Run `k` (1-based) draws from its own generator, `stoch::run_rng(seed, k)`,
//! so a batch is reproducible from `seed` alone and gives the same result
//! whether runs execute sequentially or on the rayon pool.
//!
//! Failure policy: the first run that fails aborts the whole batch and its
//! error is returned; there are no partial batches.

use std::collections::{BTreeMap, HashSet};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, UrnError};
use crate::mechanics::stoch;
use crate::systems::rule::Reinforcement;
use crate::systems::urn::{RoundRecord, Trajectory, simulate, validate_run};

/// One run inside a batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub run_id: usize,
    pub trajectory: Trajectory,
}

/// All runs of one configuration, ordered by `run_id`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    runs: Vec<Run>,
}

impl BatchResult {
    /// Build from externally produced runs. Run ids must be unique.
    pub fn from_runs(mut runs: Vec<Run>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(runs.len());
        for r in &runs {
            if !seen.insert(r.run_id) {
                return Err(UrnError::DuplicateRunId { run_id: r.run_id });
            }
        }
        runs.sort_by_key(|r| r.run_id);
        Ok(Self { runs })
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn get(&self, run_id: usize) -> Option<&Run> {
        self.runs
            .binary_search_by_key(&run_id, |r| r.run_id)
            .ok()
            .map(|i| &self.runs[i])
    }

    /// Every run flattened into tabular rows, run by run.
    pub fn records(&self) -> impl Iterator<Item = RoundRecord> + '_ {
        self.runs.iter().flat_map(|r| r.trajectory.records(r.run_id))
    }

    /// Final-round share of `color` (0-based) per run.
    pub fn final_color_shares(&self, color: usize) -> Result<BTreeMap<usize, f64>> {
        self.runs
            .iter()
            .map(|r| {
                let last = r
                    .trajectory
                    .last_round()
                    .ok_or(UrnError::EmptyTrajectory { run_id: r.run_id })?;
                let share = last.shares.get(color).copied().ok_or(UrnError::ColorOutOfRange {
                    color,
                    n_colors: last.shares.len(),
                })?;
                Ok((r.run_id, share))
            })
            .collect()
    }
}

/// Run `n_runs` independent urns and collect them under ids `1..=n_runs`.
pub fn run_batch<P>(n_runs: usize, n_rounds: usize, initial_balls: &[u64], rule: &P, seed: u64) -> Result<BatchResult>
where
    P: Reinforcement + Sync,
{
    if n_runs == 0 {
        return Err(UrnError::ZeroRuns);
    }
    validate_run(n_rounds, initial_balls, rule.increment())?;
    debug!(n_runs, n_rounds, ?initial_balls, seed, "batch start");

    let one = |run_id: usize| -> Result<Run> {
        let mut rng = stoch::run_rng(seed, run_id);
        let trajectory = simulate(n_rounds, initial_balls, rule, &mut rng)
            .inspect_err(|e| debug!(run_id, error = %e, "run failed"))?;
        Ok(Run { run_id, trajectory })
    };

    #[cfg(feature = "parallel")]
    let runs: Result<Vec<Run>> = (1..=n_runs).into_par_iter().map(one).collect();
    #[cfg(not(feature = "parallel"))]
    let runs: Result<Vec<Run>> = (1..=n_runs).map(one).collect();

    let runs = runs.inspect_err(|e| debug!(error = %e, "batch aborted"))?;
    debug!(n_runs = runs.len(), "batch done");
    Ok(BatchResult { runs })
}

/// Dominant (max over colors) share at each run's last recorded round.
///
/// Exactly one entry per run; a run with no rounds is an error.
pub fn extract_final_shares(batch: &BatchResult) -> Result<BTreeMap<usize, f64>> {
    batch
        .runs
        .iter()
        .map(|r| {
            let last = r
                .trajectory
                .last_round()
                .ok_or(UrnError::EmptyTrajectory { run_id: r.run_id })?;
            Ok((r.run_id, last.dominant_share()))
        })
        .collect()
}

/// Descriptive statistics of a batch's terminal state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub n_runs: usize,
    pub mean_dominant_share: f64,
    pub std_dominant_share: f64,
    pub min_dominant_share: f64,
    pub max_dominant_share: f64,
    /// Mean final share per color (0-based); ≈ initial shares for the Standard rule.
    pub mean_color_shares: Vec<f64>,
}

impl BatchSummary {
    pub fn from_batch(batch: &BatchResult) -> Result<Self> {
        let finals = extract_final_shares(batch)?;
        let n = finals.len();
        if n == 0 {
            return Ok(Self::default());
        }
        let nf = n as f64;
        let mean = finals.values().sum::<f64>() / nf;
        let var = finals.values().map(|s| (s - mean).powi(2)).sum::<f64>() / nf;
        let min = finals.values().copied().fold(f64::INFINITY, f64::min);
        let max = finals.values().copied().fold(f64::NEG_INFINITY, f64::max);

        let n_colors = batch
            .runs
            .iter()
            .filter_map(|r| r.trajectory.last_round())
            .map(|s| s.shares.len())
            .max()
            .unwrap_or(0);
        let mut mean_color_shares = vec![0.0; n_colors];
        for r in &batch.runs {
            if let Some(last) = r.trajectory.last_round() {
                for (acc, s) in mean_color_shares.iter_mut().zip(&last.shares) {
                    *acc += s / nf;
                }
            }
        }

        Ok(Self {
            n_runs: n,
            mean_dominant_share: mean,
            std_dominant_share: var.sqrt(),
            min_dominant_share: min,
            max_dominant_share: max,
            mean_color_shares,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::rule::Rule;
    use crate::systems::urn::RoundSnapshot;

    #[test]
    fn ids_are_one_based_and_ordered() {
        let b = run_batch(6, 10, &[1, 1], &Rule::Standard, 42).unwrap();
        let ids: Vec<usize> = b.runs().iter().map(|r| r.run_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
        assert!(b.runs().iter().all(|r| r.trajectory.len() == 10));
    }

    #[test]
    fn same_seed_same_batch() {
        let a = run_batch(8, 40, &[1, 1], &Rule::Probabilistic, 9).unwrap();
        let b = run_batch(8, 40, &[1, 1], &Rule::Probabilistic, 9).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn each_run_replays_its_own_stream() {
        let balls = [2u64, 1, 1];
        let b = run_batch(12, 30, &balls, &Rule::Arthur, 555).unwrap();
        for (k, run) in b.runs().iter().enumerate() {
            let mut rng = stoch::run_rng(555, k + 1);
            let alone = simulate(30, &balls, &Rule::Arthur, &mut rng).unwrap();
            assert_eq!(run.run_id, k + 1);
            assert_eq!(run.trajectory, alone, "run {}", k + 1);
        }
    }

    #[test]
    fn overflow_aborts_the_batch() {
        assert!(matches!(
            run_batch(1, 3, &[u64::MAX - 1, 0], &Rule::HigherGrowth, 0),
            Err(UrnError::CountOverflow)
        ));
    }

    /// Passes config validation, then fails on the first draw of every run.
    struct NanWeights;

    impl Reinforcement for NanWeights {
        fn weight(&self, _share: f64) -> f64 {
            f64::NAN
        }
        fn increment(&self) -> u64 {
            1
        }
    }

    #[test]
    fn a_failing_run_aborts_the_batch() {
        assert!(matches!(
            run_batch(4, 5, &[1, 1], &NanWeights, 0),
            Err(UrnError::DegenerateWeights { .. })
        ));
    }

    #[test]
    fn runs_do_not_share_randomness() {
        let b = run_batch(2, 200, &[1, 1], &Rule::Standard, 1).unwrap();
        assert_ne!(b.runs()[0].trajectory, b.runs()[1].trajectory);
    }

    #[test]
    fn config_errors_fail_before_running() {
        assert!(matches!(run_batch(0, 10, &[1, 1], &Rule::Standard, 0), Err(UrnError::ZeroRuns)));
        assert!(matches!(run_batch(3, 0, &[1, 1], &Rule::Standard, 0), Err(UrnError::ZeroRounds)));
        assert!(matches!(run_batch(3, 10, &[0, 0], &Rule::Standard, 0), Err(UrnError::NoPositiveCount)));
    }

    #[test]
    fn final_shares_one_per_run_in_range() {
        let b = run_batch(25, 60, &[1, 1, 1], &Rule::Arthur, 3).unwrap();
        let f = extract_final_shares(&b).unwrap();
        assert_eq!(f.len(), 25);
        for s in f.values() {
            assert!(*s >= 1.0 / 3.0 - 1e-12 && *s <= 1.0);
        }
    }

    #[test]
    fn final_share_uses_highest_round() {
        let snap = |round, counts: Vec<u64>| RoundSnapshot {
            round,
            shares: crate::systems::rule::shares(&counts).unwrap(),
            counts,
        };
        // snapshots stored out of order on purpose
        let t = Trajectory::from_snapshots(vec![snap(2, vec![1, 3]), snap(1, vec![1, 1])]);
        let b = BatchResult::from_runs(vec![Run { run_id: 4, trajectory: t }]).unwrap();
        let f = extract_final_shares(&b).unwrap();
        assert_eq!(f[&4], 0.75);
    }

    #[test]
    fn empty_trajectory_is_an_error() {
        let b = BatchResult::from_runs(vec![Run { run_id: 7, trajectory: Trajectory::new() }]).unwrap();
        assert!(matches!(extract_final_shares(&b), Err(UrnError::EmptyTrajectory { run_id: 7 })));
    }

    #[test]
    fn duplicate_run_ids_rejected() {
        let r = Run { run_id: 1, trajectory: Trajectory::new() };
        let err = BatchResult::from_runs(vec![r.clone(), r]).unwrap_err();
        assert!(matches!(err, UrnError::DuplicateRunId { run_id: 1 }));
    }

    #[test]
    fn summary_matches_final_shares() {
        let b = run_batch(40, 50, &[1, 1], &Rule::HigherGrowth, 77).unwrap();
        let f = extract_final_shares(&b).unwrap();
        let s = BatchSummary::from_batch(&b).unwrap();
        assert_eq!(s.n_runs, 40);
        let mean = f.values().sum::<f64>() / 40.0;
        assert!((s.mean_dominant_share - mean).abs() < 1e-12);
        assert!(s.min_dominant_share <= s.mean_dominant_share);
        assert!(s.mean_dominant_share <= s.max_dominant_share);
        let color_sum: f64 = s.mean_color_shares.iter().sum();
        assert!((color_sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn lookup_and_color_shares() {
        let b = run_batch(5, 20, &[1, 1], &Rule::Standard, 5).unwrap();
        assert_eq!(b.get(3).map(|r| r.run_id), Some(3));
        assert!(b.get(6).is_none());
        let c1 = b.final_color_shares(0).unwrap();
        let c2 = b.final_color_shares(1).unwrap();
        for id in 1..=5 {
            assert!((c1[&id] + c2[&id] - 1.0).abs() < 1e-12);
        }
        assert!(matches!(b.final_color_shares(2), Err(UrnError::ColorOutOfRange { color: 2, n_colors: 2 })));
    }

    #[test]
    fn records_cover_every_cell() {
        let b = run_batch(3, 4, &[1, 1], &Rule::Standard, 2).unwrap();
        assert_eq!(b.records().count(), 3 * 4 * 2);
    }
}
