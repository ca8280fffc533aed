// src/systems/rule.rs

//! # Replacement rules
//!
//! A replacement rule decides, given the urn's current ball counts, which
//! color is drawn and how many balls of that color go back in. Every rule here
//! is described by two things:
//!
//! - a **feedback function** `f(share) -> weight`; the draw probability of a
//!   color is its weight renormalized over all colors,
//! - an **increment**: balls of the drawn color added per round.
//!
//! The [`Reinforcement`] trait turns those two into the draw/reinforce step.
//! [`Rule`] is the closed set of reference rules:
//!
//! | rule            | f(x)         | increment |
//! |-----------------|--------------|-----------|
//! | `Standard`      | x            | 1         |
//! | `HigherGrowth`  | x            | 3         |
//! | `Probabilistic` | x²           | 1         |
//! | `Arthur`        | 3x² − 2x³    | 1         |
//!
//! Custom rules implement [`Reinforcement`] directly; the simulator and batch
//! runner accept any implementor.

use std::fmt;
use std::str::FromStr;

use rand_core::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::{Result, UrnError};
use crate::mechanics::{feedback, stoch};

/// Normalized shares `counts[i] / total`.
pub fn shares(counts: &[u64]) -> Result<Vec<f64>> {
    if counts.is_empty() {
        return Err(UrnError::EmptyUrn);
    }
    let total = counts
        .iter()
        .try_fold(0u64, |acc, &c| acc.checked_add(c))
        .ok_or(UrnError::CountOverflow)?;
    if total == 0 {
        return Err(UrnError::NoPositiveCount);
    }
    let total = total as f64;
    Ok(counts.iter().map(|&c| c as f64 / total).collect())
}

/// Draw-and-reinforce capability shared by all replacement rules.
pub trait Reinforcement {
    /// Unnormalized draw weight for a color holding `share` of the urn.
    fn weight(&self, share: f64) -> f64;

    /// Balls of the drawn color added back.
    fn increment(&self) -> u64;

    /// Draw probabilities for every color; non-negative and summing to 1.
    fn draw_probabilities(&self, counts: &[u64]) -> Result<Vec<f64>> {
        let mut w: Vec<f64> = shares(counts)?.into_iter().map(|s| self.weight(s)).collect();
        let sum: f64 = w.iter().sum();
        if !(sum.is_finite() && sum > 0.0) || w.iter().any(|x| *x < 0.0 || !x.is_finite()) {
            return Err(UrnError::DegenerateWeights { sum });
        }
        for x in w.iter_mut() {
            *x /= sum;
        }
        Ok(w)
    }

    /// One round in place: draw a color, add `increment()` balls of it.
    /// Returns the drawn color index.
    fn reinforce<R: RngCore + ?Sized>(&self, counts: &mut [u64], rng: &mut R) -> Result<usize> {
        let probs = self.draw_probabilities(counts)?;
        let color = stoch::categorical(rng, &probs);
        counts[color] = counts[color]
            .checked_add(self.increment())
            .ok_or(UrnError::CountOverflow)?;
        Ok(color)
    }

    /// Pure form of [`Reinforcement::reinforce`]: returns the next counts.
    fn apply<R: RngCore + ?Sized>(&self, counts: &[u64], rng: &mut R) -> Result<Vec<u64>> {
        let mut next = counts.to_vec();
        self.reinforce(&mut next, rng)?;
        Ok(next)
    }
}

/// The four reference replacement rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    /// Draw ∝ count, add 1.
    Standard,
    /// Draw ∝ count, add 3.
    HigherGrowth,
    /// Draw ∝ share², add 1.
    Probabilistic,
    /// Draw ∝ 3s² − 2s³, add 1.
    Arthur,
}

impl Rule {
    pub const ALL: [Rule; 4] = [Rule::Standard, Rule::HigherGrowth, Rule::Probabilistic, Rule::Arthur];

    pub fn name(self) -> &'static str {
        match self {
            Rule::Standard => "standard",
            Rule::HigherGrowth => "higher_growth",
            Rule::Probabilistic => "probabilistic",
            Rule::Arthur => "arthur",
        }
    }
}

impl Reinforcement for Rule {
    fn weight(&self, share: f64) -> f64 {
        match self {
            Rule::Standard | Rule::HigherGrowth => feedback::linear(share),
            Rule::Probabilistic => feedback::quadratic(share),
            Rule::Arthur => feedback::arthur_s_curve(share),
        }
    }

    fn increment(&self) -> u64 {
        match self {
            Rule::HigherGrowth => 3,
            _ => 1,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown rule name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRuleError(pub String);

impl fmt::Display for ParseRuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown replacement rule: {}", self.0)
    }
}

impl std::error::Error for ParseRuleError {}

impl FromStr for Rule {
    type Err = ParseRuleError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Rule::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseRuleError(s.to_string()))
    }
}
