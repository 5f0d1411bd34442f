//! Output adapter: write the selected roster as CSV and summarize its totals.

use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::data::candidate::PositionCategory;
use crate::optimizer::Solution;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Serialize)]
struct SelectedRow<'a> {
    player: &'a str,
    position: &'static str,
    score: f64,
    cap_hit: f64,
}

/// Totals for a written roster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterSummary {
    pub players: usize,
    pub forwards: usize,
    pub defensemen: usize,
    pub goalies: usize,
    pub total_score: f64,
    pub total_cap_hit: f64,
    pub salary_cap: f64,
    pub cap_space: f64,
    pub generated_at: String,
}

impl RosterSummary {
    pub fn from_solution(solution: &Solution) -> Self {
        Self {
            players: solution.selected.len(),
            forwards: solution.count(PositionCategory::Forward),
            defensemen: solution.count(PositionCategory::Defenseman),
            goalies: solution.count(PositionCategory::Goalie),
            total_score: solution.total_score,
            total_cap_hit: solution.total_cap_hit,
            salary_cap: solution.salary_cap,
            cap_space: solution.cap_space,
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Write `player,Position,score,cap_hit` rows for the selected roster.
pub fn write_solution<W: Write>(writer: W, solution: &Solution) -> Result<(), ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    // Header written by hand so an empty roster still produces one.
    writer.write_record(["player", "Position", "score", "cap_hit"])?;
    for candidate in &solution.selected {
        writer.serialize(SelectedRow {
            player: &candidate.id,
            position: candidate.position.code(),
            score: candidate.score,
            cap_hit: candidate.cap_hit,
        })?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Write the roster CSV to `path`, creating parent directories as needed.
pub fn write_solution_csv(
    path: impl AsRef<Path>,
    solution: &Solution,
) -> Result<RosterSummary, ExportError> {
    let path = path.as_ref();
    let io_error = |source: std::io::Error| ExportError::Io {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    let file = File::create(path).map_err(io_error)?;
    write_solution(file, solution)?;
    Ok(RosterSummary::from_solution(solution))
}

/// Tab-separated roster listing followed by the totals, for terminal output.
pub fn render_table(solution: &Solution) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "player\tPosition\tscore\tcap_hit");
    for candidate in &solution.selected {
        let _ = writeln!(
            out,
            "{}\t{}\t{:.6}\t{:.0}",
            candidate.id, candidate.position, candidate.score, candidate.cap_hit
        );
    }
    let _ = writeln!(out, "Total Cap Hit of Selected Players: {:.0}", solution.total_cap_hit);
    let _ = writeln!(out, "Total Score: {:.6}", solution.total_score);
    let _ = write!(out, "Cap Space: {:.0}", solution.cap_space);
    out
}
