//! Output collaborators: persistence of batch tables and presentation views.
//!
//! Nothing here draws pixels. [`CsvSink`] writes the flattened trajectory
//! table; [`ViewDataSink`] writes the two plot-ready tables a figure needs
//! (share-over-time lines, final-share scatter). Plotting tools read those.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::error::{Result, UrnError};
use crate::scenarios::ScenarioOutcome;
use crate::systems::batch::BatchResult;
use crate::systems::urn::RoundRecord;

pub const TRAJECTORY_HEADER: &str = "run_id,round,color,count,share";

/// Stores a scenario's batch somewhere durable.
pub trait PersistenceSink {
    fn persist(&mut self, outcome: &ScenarioOutcome) -> Result<()>;
}

/// Renders a scenario's batch and final-share summary.
pub trait PresentationSink {
    fn present(&mut self, outcome: &ScenarioOutcome) -> Result<()>;
}

/// Write the `run_id,round,color,count,share` table.
pub fn write_records<W: Write>(mut w: W, records: impl IntoIterator<Item = RoundRecord>) -> Result<()> {
    writeln!(w, "{TRAJECTORY_HEADER}")?;
    for r in records {
        writeln!(w, "{},{},{},{},{}", r.run_id, r.round, r.color, r.count, r.share)?;
    }
    w.flush()?;
    Ok(())
}

/// Write `run_id,final_share`.
pub fn write_final_shares<W: Write>(mut w: W, finals: &BTreeMap<usize, f64>) -> Result<()> {
    writeln!(w, "run_id,final_share")?;
    for (id, s) in finals {
        writeln!(w, "{id},{s}")?;
    }
    w.flush()?;
    Ok(())
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(BufWriter::new(File::create(path)?))
}

/// One directory, three files per scenario:
/// `<name>.csv`, `<name>_final.csv`, `<name>_summary.json`.
#[derive(Clone, Debug)]
pub struct CsvSink {
    pub dir: PathBuf,
}

impl CsvSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn trajectory_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.csv"))
    }
}

impl PersistenceSink for CsvSink {
    fn persist(&mut self, outcome: &ScenarioOutcome) -> Result<()> {
        let name = &outcome.scenario.name;
        let path = self.trajectory_path(name);
        write_records(create(&path)?, outcome.batch.records())?;
        write_final_shares(create(&self.dir.join(format!("{name}_final.csv")))?, &outcome.final_shares)?;

        #[derive(Serialize)]
        struct SummaryFile<'a> {
            scenario: &'a crate::scenarios::Scenario,
            summary: &'a crate::systems::batch::BatchSummary,
        }
        let json = create(&self.dir.join(format!("{name}_summary.json")))?;
        serde_json::to_writer_pretty(
            json,
            &SummaryFile {
                scenario: &outcome.scenario,
                summary: &outcome.summary,
            },
        )?;
        debug!(path = %path.display(), "persisted scenario");
        Ok(())
    }
}

/// Share-over-time of one color for one run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SharePath {
    pub run_id: usize,
    /// 0-based color index.
    pub color: usize,
    pub shares: Vec<f64>,
}

/// Share lines for `run_ids` and 0-based `color`; every id must be in the batch.
pub fn share_paths(batch: &BatchResult, run_ids: &[usize], color: usize) -> Result<Vec<SharePath>> {
    let mut out = Vec::with_capacity(run_ids.len());
    for &id in run_ids {
        let run = batch.get(id).ok_or(UrnError::UnknownRunId { run_id: id })?;
        let n_colors = run.trajectory.snapshots.first().map_or(0, |s| s.shares.len());
        if color >= n_colors {
            return Err(UrnError::ColorOutOfRange { color, n_colors });
        }
        out.push(SharePath {
            run_id: id,
            color,
            shares: run.trajectory.color_shares(color),
        });
    }
    Ok(out)
}

/// Final dominant share per run, with the batch mean and the fair-split line.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FinalShareScatter {
    pub points: Vec<(usize, f64)>,
    pub mean: f64,
    pub reference: f64,
}

impl FinalShareScatter {
    pub fn from_finals(finals: &BTreeMap<usize, f64>) -> Self {
        let points: Vec<(usize, f64)> = finals.iter().map(|(&k, &v)| (k, v)).collect();
        let mean = if points.is_empty() {
            0.0
        } else {
            points.iter().map(|p| p.1).sum::<f64>() / points.len() as f64
        };
        Self { points, mean, reference: 0.5 }
    }
}

/// Writes `<name>_paths.csv` (round,run_id,share) and `<name>_scatter.csv`
/// (run_id,final_share,mean,reference) for the first `n_paths` runs of `color`.
#[derive(Clone, Debug)]
pub struct ViewDataSink {
    pub dir: PathBuf,
    pub n_paths: usize,
    pub color: usize,
}

impl ViewDataSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), n_paths: 20, color: 0 }
    }
}

impl PresentationSink for ViewDataSink {
    fn present(&mut self, outcome: &ScenarioOutcome) -> Result<()> {
        let name = &outcome.scenario.name;
        let ids: Vec<usize> = outcome.batch.runs().iter().take(self.n_paths).map(|r| r.run_id).collect();
        let paths = share_paths(&outcome.batch, &ids, self.color)?;

        let mut w = create(&self.dir.join(format!("{name}_paths.csv")))?;
        writeln!(w, "round,run_id,share")?;
        for p in &paths {
            for (i, s) in p.shares.iter().enumerate() {
                writeln!(w, "{},{},{}", i + 1, p.run_id, s)?;
            }
        }
        w.flush()?;

        let scatter = FinalShareScatter::from_finals(&outcome.final_shares);
        let mut w = create(&self.dir.join(format!("{name}_scatter.csv")))?;
        writeln!(w, "run_id,final_share,mean,reference")?;
        for (id, s) in &scatter.points {
            writeln!(w, "{id},{s},{},{}", scatter.mean, scatter.reference)?;
        }
        w.flush()?;
        Ok(())
    }
}
