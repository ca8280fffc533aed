/*!
`polya_urn` — Pólya urn simulations of path dependence.

What it does
- Runs urns of colored balls where every draw feeds back into the next one:
  the drawn color is reinforced, so early luck compounds into lock-in.
- Compares four replacement rules (`Rule::Standard`, `Rule::HigherGrowth`,
  `Rule::Probabilistic`, `Rule::Arthur`) that differ in how shares map to draw
  probabilities and how many balls a draw adds.
- Aggregates many independent runs into a batch and reduces each run to its
  terminal dominant share.

How to use (call surface only)
- Single run: `simulate(n_rounds, &initial_balls, &rule, &mut rng) -> Trajectory`.
- Batch: `run_batch(n_runs, n_rounds, &initial_balls, &rule, seed) -> BatchResult`.
- Reduce: `extract_final_shares(&batch) -> BTreeMap<run_id, dominant_share>`.
- Or run a named `Scenario` with `scenarios::run_scenario` and hand the outcome
  to a `sink::PersistenceSink` / `sink::PresentationSink`.

What it does NOT do
- No plotting, no inference or fitting. Randomness is always explicit: pass a
  generator or a seed, nothing global.
*/

pub mod error;
pub mod mechanics;
pub mod scenarios;
pub mod sink;
pub mod systems;

pub use error::{Result, UrnError};
pub use systems::{
    BatchResult, BatchSummary, Reinforcement, RoundRecord, RoundSnapshot, Rule, Run, Trajectory,
    extract_final_shares, run_batch, simulate,
};
