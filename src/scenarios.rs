// src/scenarios.rs

//! # Scenarios
//!
//! A scenario is a named pairing of one replacement rule with one batch
//! configuration. This is the only configuration the simulation consumes:
//! everything downstream (CSV tables, figures) is derived from the
//! [`ScenarioOutcome`] a scenario produces.
//!
//! The four reference scenarios compare path dependence across rules from the
//! same fair start: 500 runs of 200 rounds each, starting from one ball of
//! each of two colors.
//!
//! Scenario sets can also be loaded from JSON:
//!
//! ```json
//! [
//!   { "name": "standard", "rule": "standard",
//!     "config": { "n_runs": 500, "n_rounds": 200, "initial_balls": [1, 1], "seed": 42 } }
//! ]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, UrnError};
use crate::systems::batch::{BatchResult, BatchSummary, extract_final_shares, run_batch};
use crate::systems::rule::{Reinforcement, Rule};
use crate::systems::urn::validate_run;

pub const REFERENCE_RUNS: usize = 500;
pub const REFERENCE_ROUNDS: usize = 200;
pub const REFERENCE_INITIAL_BALLS: [u64; 2] = [1, 1];

/// Batch parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    pub n_runs: usize,
    pub n_rounds: usize,
    pub initial_balls: Vec<u64>,
    /// Base seed; run `k` uses a generator derived from `(seed, k)`.
    #[serde(default)]
    pub seed: u64,
}

impl BatchConfig {
    pub fn reference(seed: u64) -> Self {
        Self {
            n_runs: REFERENCE_RUNS,
            n_rounds: REFERENCE_ROUNDS,
            initial_balls: REFERENCE_INITIAL_BALLS.to_vec(),
            seed,
        }
    }

    /// Checks for a rule adding `increment` balls per round.
    pub fn validate(&self, increment: u64) -> Result<()> {
        if self.n_runs == 0 {
            return Err(UrnError::ZeroRuns);
        }
        validate_run(self.n_rounds, &self.initial_balls, increment)
    }
}

/// A rule plus the batch it runs under.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub rule: Rule,
    pub config: BatchConfig,
}

impl Scenario {
    pub fn validate(&self) -> Result<()> {
        self.config.validate(self.rule.increment())
    }
}

/// Everything a sink needs from one scenario.
#[derive(Clone, Debug)]
pub struct ScenarioOutcome {
    pub scenario: Scenario,
    pub batch: BatchResult,
    pub final_shares: BTreeMap<usize, f64>,
    pub summary: BatchSummary,
}

/// One reference scenario per rule, all sharing `seed`.
pub fn reference_scenarios(seed: u64) -> Vec<Scenario> {
    Rule::ALL
        .into_iter()
        .map(|rule| Scenario {
            name: rule.name().to_string(),
            rule,
            config: BatchConfig::reference(seed),
        })
        .collect()
}

/// Parse a JSON array of scenarios; each one is validated.
pub fn parse_scenarios(json: &str) -> Result<Vec<Scenario>> {
    let scenarios: Vec<Scenario> = serde_json::from_str(json)?;
    for s in &scenarios {
        s.validate()?;
    }
    Ok(scenarios)
}

pub fn load_scenarios(path: impl AsRef<Path>) -> Result<Vec<Scenario>> {
    let text = std::fs::read_to_string(path)?;
    parse_scenarios(&text)
}

/// Validate, run the batch, extract final shares and summarize.
pub fn run_scenario(scenario: &Scenario) -> Result<ScenarioOutcome> {
    let cfg = &scenario.config;
    scenario.validate()?;

    let batch = run_batch(cfg.n_runs, cfg.n_rounds, &cfg.initial_balls, &scenario.rule, cfg.seed)?;
    let final_shares = extract_final_shares(&batch)?;
    let summary = BatchSummary::from_batch(&batch)?;

    info!(
        scenario = %scenario.name,
        rule = %scenario.rule,
        n_runs = summary.n_runs,
        mean_dominant = summary.mean_dominant_share,
        std_dominant = summary.std_dominant_share,
        "scenario done"
    );

    Ok(ScenarioOutcome {
        scenario: scenario.clone(),
        batch,
        final_shares,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_set_covers_every_rule() {
        let s = reference_scenarios(1);
        assert_eq!(s.len(), 4);
        let rules: Vec<Rule> = s.iter().map(|x| x.rule).collect();
        assert_eq!(rules, Rule::ALL.to_vec());
        for sc in &s {
            assert_eq!(sc.config.n_runs, 500);
            assert_eq!(sc.config.n_rounds, 200);
            assert_eq!(sc.config.initial_balls, vec![1, 1]);
        }
    }

    #[test]
    fn parse_json_scenarios() {
        let json = r#"[
            {"name": "a", "rule": "arthur",
             "config": {"n_runs": 3, "n_rounds": 5, "initial_balls": [2, 1]}},
            {"name": "b", "rule": "higher_growth",
             "config": {"n_runs": 1, "n_rounds": 1, "initial_balls": [1, 1], "seed": 9}}
        ]"#;
        let s = parse_scenarios(json).unwrap();
        assert_eq!(s[0].rule, Rule::Arthur);
        assert_eq!(s[0].config.seed, 0);
        assert_eq!(s[1].rule, Rule::HigherGrowth);
        assert_eq!(s[1].config.seed, 9);
    }

    #[test]
    fn parse_rejects_invalid_config() {
        let json = r#"[{"name": "x", "rule": "standard",
            "config": {"n_runs": 0, "n_rounds": 5, "initial_balls": [1, 1]}}]"#;
        assert!(matches!(parse_scenarios(json), Err(UrnError::ZeroRuns)));
        assert!(matches!(parse_scenarios("{"), Err(UrnError::Json(_))));

        // fits with +1 per round, not with +3
        let near = u64::MAX - 250;
        let json = format!(
            r#"[{{"name": "y", "rule": "higher_growth",
                "config": {{"n_runs": 1, "n_rounds": 100, "initial_balls": [{near}, 0]}}}}]"#
        );
        assert!(matches!(parse_scenarios(&json), Err(UrnError::CountOverflow)));
        assert!(parse_scenarios(&json.replace("higher_growth", "standard")).is_ok());
    }

    #[test]
    fn run_small_scenario() {
        let sc = Scenario {
            name: "small".into(),
            rule: Rule::Standard,
            config: BatchConfig { n_runs: 10, n_rounds: 15, initial_balls: vec![1, 1], seed: 4 },
        };
        let out = run_scenario(&sc).unwrap();
        assert_eq!(out.batch.len(), 10);
        assert_eq!(out.final_shares.len(), 10);
        assert_eq!(out.summary.n_runs, 10);
    }
}
