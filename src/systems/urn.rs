//! Single-run simulator: one urn trajectory over a fixed number of rounds.
//!
//! The snapshot for round `t` is the composition *entering* round `t`, taken
//! before that round's draw. Round 1 therefore always shows `initial_balls`.

use rand_core::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::{Result, UrnError};
use crate::systems::rule::{Reinforcement, shares};

/// Urn state as of one round (pre-draw).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundSnapshot {
    /// 1-based round index.
    pub round: usize,
    pub counts: Vec<u64>,
    pub shares: Vec<f64>,
}

impl RoundSnapshot {
    /// Ball total, saturating at `u64::MAX`.
    pub fn total(&self) -> u64 {
        self.counts.iter().fold(0u64, |acc, &c| acc.saturating_add(c))
    }

    /// Largest share among colors.
    pub fn dominant_share(&self) -> f64 {
        self.shares.iter().copied().fold(0.0, f64::max)
    }
}

/// One flattened row: `run_id, round, color (1-indexed), count, share`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub run_id: usize,
    pub round: usize,
    pub color: usize,
    pub count: u64,
    pub share: f64,
}

/// Ordered snapshots of one run, round 1 first.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub snapshots: Vec<RoundSnapshot>,
}

impl Trajectory {
    pub fn new() -> Self {
        Self { snapshots: Vec::new() }
    }

    pub fn from_snapshots(snapshots: Vec<RoundSnapshot>) -> Self {
        Self { snapshots }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Snapshot at the highest round index.
    pub fn last_round(&self) -> Option<&RoundSnapshot> {
        self.snapshots.iter().max_by_key(|s| s.round)
    }

    /// Share series of `color` (0-based), one value per round.
    pub fn color_shares(&self, color: usize) -> Vec<f64> {
        self.snapshots
            .iter()
            .map(|s| s.shares.get(color).copied().unwrap_or(0.0))
            .collect()
    }

    /// Flatten into tabular rows tagged with `run_id`.
    pub fn records(&self, run_id: usize) -> impl Iterator<Item = RoundRecord> + '_ {
        self.snapshots.iter().flat_map(move |s| {
            s.counts
                .iter()
                .zip(&s.shares)
                .enumerate()
                .map(move |(i, (&count, &share))| RoundRecord {
                    run_id,
                    round: s.round,
                    color: i + 1,
                    count,
                    share,
                })
        })
    }
}

/// Check `n_rounds` and `initial_balls` before any draw happens.
///
/// `increment` is the rule's balls-per-round; the final total
/// `sum(initial_balls) + n_rounds * increment` must fit in a `u64`.
pub fn validate_run(n_rounds: usize, initial_balls: &[u64], increment: u64) -> Result<()> {
    if n_rounds == 0 {
        return Err(UrnError::ZeroRounds);
    }
    if initial_balls.is_empty() {
        return Err(UrnError::EmptyUrn);
    }
    if initial_balls.iter().all(|&c| c == 0) {
        return Err(UrnError::NoPositiveCount);
    }
    let start = initial_balls
        .iter()
        .try_fold(0u64, |acc, &c| acc.checked_add(c))
        .ok_or(UrnError::CountOverflow)?;
    (n_rounds as u64)
        .checked_mul(increment)
        .and_then(|added| start.checked_add(added))
        .ok_or(UrnError::CountOverflow)?;
    Ok(())
}

/// Run one urn for `n_rounds` rounds, recording the pre-draw state of each.
///
/// The rule is applied after every snapshot, including the last, so the RNG
/// consumption is exactly one draw per round.
pub fn simulate<P, R>(n_rounds: usize, initial_balls: &[u64], rule: &P, rng: &mut R) -> Result<Trajectory>
where
    P: Reinforcement,
    R: RngCore + ?Sized,
{
    validate_run(n_rounds, initial_balls, rule.increment())?;

    let mut counts = initial_balls.to_vec();
    let mut snapshots = Vec::with_capacity(n_rounds);
    for round in 1..=n_rounds {
        snapshots.push(RoundSnapshot {
            round,
            shares: shares(&counts)?,
            counts: counts.clone(),
        });
        rule.reinforce(&mut counts, rng)?;
    }
    Ok(Trajectory { snapshots })
}
