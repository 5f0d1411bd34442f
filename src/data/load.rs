//! Input adapter: read the merged player table and turn it into clean [Candidate]s.
//!
//! Cleaning policy: currency formatting (`$`, `,`) is stripped from `cap_hit`, and any cap
//! hit or score that still fails to parse becomes 0. Unknown positions and negative cap
//! hits are rejected with the row and field named.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::data::candidate::{Candidate, Position};

pub const PLAYER_COLUMN: &str = "player";
pub const POSITION_COLUMN: &str = "Position";
pub const SCORE_COLUMN: &str = "cps";
pub const CAP_HIT_COLUMN: &str = "cap_hit";

const PLAYER_ALIASES: &[&str] = &["player", "name"];
const POSITION_ALIASES: &[&str] = &["position", "pos"];
const SCORE_ALIASES: &[&str] = &["cps", "score"];
const CAP_HIT_ALIASES: &[&str] = &["cap_hit", "caphit"];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("row {row}: invalid {field}: {message}")]
    Validation {
        /// 1-based data row; the header is not counted.
        row: usize,
        field: &'static str,
        message: String,
    },
}

/// Header positions of the four columns the optimizer needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateColumns {
    pub player: usize,
    pub position: usize,
    pub score: usize,
    pub cap_hit: usize,
}

impl CandidateColumns {
    pub fn from_headers(headers: &StringRecord) -> Result<Self, LoadError> {
        Ok(Self {
            player: find_column(headers, PLAYER_ALIASES)
                .ok_or(LoadError::MissingColumn(PLAYER_COLUMN))?,
            position: find_column(headers, POSITION_ALIASES)
                .ok_or(LoadError::MissingColumn(POSITION_COLUMN))?,
            score: find_column(headers, SCORE_ALIASES)
                .ok_or(LoadError::MissingColumn(SCORE_COLUMN))?,
            cap_hit: find_column(headers, CAP_HIT_ALIASES)
                .ok_or(LoadError::MissingColumn(CAP_HIT_COLUMN))?,
        })
    }
}

/// Header lookup is case-insensitive and treats spaces like underscores (`Cap Hit` == `cap_hit`).
pub fn find_column(headers: &StringRecord, aliases: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|header| aliases.contains(&normalize_header(header).as_str()))
}

fn normalize_header(header: &str) -> String {
    header
        .trim()
        .trim_start_matches('\u{feff}')
        .to_ascii_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Parse a currency cell such as `"$1,250,000"`. Returns None when nothing numeric remains.
pub fn parse_currency(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Parse a score cell. Placeholders like `-` or blanks give None.
pub fn parse_score(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

pub fn load_candidates(path: impl AsRef<Path>) -> Result<Vec<Candidate>, LoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let candidates = parse_candidates(file)?;
    info!(path = %path.display(), candidates = candidates.len(), "loaded candidates");
    Ok(candidates)
}

pub fn parse_candidates<R: Read>(reader: R) -> Result<Vec<Candidate>, LoadError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns = CandidateColumns::from_headers(reader.headers()?)?;

    let mut candidates = Vec::new();
    let mut seen = HashSet::new();
    for (index, result) in reader.records().enumerate() {
        let row = index + 1;
        let record = result?;
        let Some(candidate) = candidate_from_record(&record, &columns, row)? else {
            continue;
        };
        if !seen.insert(candidate.id.clone()) {
            warn!(row, player = %candidate.id, "dropping duplicate player row");
            continue;
        }
        candidates.push(candidate);
    }
    Ok(candidates)
}

/// Build one candidate. Fully blank rows yield `Ok(None)`.
fn candidate_from_record(
    record: &StringRecord,
    columns: &CandidateColumns,
    row: usize,
) -> Result<Option<Candidate>, LoadError> {
    if record.iter().all(|cell| cell.trim().is_empty()) {
        return Ok(None);
    }

    let player = record.get(columns.player).unwrap_or("").trim();
    if player.is_empty() {
        return Err(LoadError::Validation {
            row,
            field: PLAYER_COLUMN,
            message: "player name is empty".to_string(),
        });
    }

    let raw_position = record.get(columns.position).unwrap_or("");
    let position = Position::parse_listing(raw_position).ok_or_else(|| LoadError::Validation {
        row,
        field: POSITION_COLUMN,
        message: format!("unknown position '{}' for {player}", raw_position.trim()),
    })?;

    let raw_score = record.get(columns.score).unwrap_or("");
    let score = parse_score(raw_score).unwrap_or_else(|| {
        debug!(row, player, raw = raw_score, "score defaulted to 0");
        0.0
    });

    let raw_cap_hit = record.get(columns.cap_hit).unwrap_or("");
    let cap_hit = parse_currency(raw_cap_hit).unwrap_or_else(|| {
        debug!(row, player, raw = raw_cap_hit, "cap hit defaulted to 0");
        0.0
    });
    if cap_hit < 0.0 {
        return Err(LoadError::Validation {
            row,
            field: CAP_HIT_COLUMN,
            message: format!("negative cap hit {cap_hit} for {player}"),
        });
    }

    Ok(Some(Candidate::new(player, position, score, cap_hit)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_currency_formatting() {
        assert_eq!(parse_currency("$1,250,000"), Some(1_250_000.0));
        assert_eq!(parse_currency(" 775000.50 "), Some(775_000.5));
        assert_eq!(parse_currency("-"), None);
        assert_eq!(parse_currency(""), None);
        assert_eq!(parse_currency("n/a"), None);
    }

    #[test]
    fn parses_table_and_defaults_bad_numbers_to_zero() {
        let csv_data = "\
player,Position,cps,cap_hit
Connor McDavid,C,0.91,\"$12,500,000\"
Cale Makar,D,-,\"$9,000,000\"
Igor Shesterkin,G,0.77,
";
        let candidates = parse_candidates(csv_data.as_bytes()).unwrap();
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0], Candidate::new("Connor McDavid", Position::Center, 0.91, 12_500_000.0));
        assert_eq!(candidates[1].score, 0.0);
        assert_eq!(candidates[1].cap_hit, 9_000_000.0);
        assert_eq!(candidates[2].position, Position::Goalie);
        assert_eq!(candidates[2].cap_hit, 0.0);
    }

    #[test]
    fn header_aliases_are_case_insensitive() {
        let csv_data = "Player,POSITION,CPS,Cap Hit\nA,L,1.5,100\n";
        let candidates = parse_candidates(csv_data.as_bytes()).unwrap();
        assert_eq!(candidates[0].position, Position::LeftWing);
        assert_eq!(candidates[0].cap_hit, 100.0);
    }

    #[test]
    fn missing_column_is_named() {
        let err = parse_candidates("player,Position,cps\nA,C,1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn("cap_hit")));
    }

    #[test]
    fn unknown_position_names_row_and_field() {
        let err = parse_candidates("player,Position,cps,cap_hit\nA,C,1,1\nB,X,1,1\n".as_bytes())
            .unwrap_err();
        match err {
            LoadError::Validation { row, field, .. } => {
                assert_eq!(row, 2);
                assert_eq!(field, "Position");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn negative_cap_hit_is_rejected() {
        let err = parse_candidates("player,Position,cps,cap_hit\nA,C,1,-5\n".as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::Validation { field: "cap_hit", .. }));
    }

    #[test]
    fn duplicate_players_keep_first_row() {
        let csv_data = "player,Position,cps,cap_hit\nA,C,1,1\nA,D,9,1\n\nB,\"C, R\",2,2\n";
        let candidates = parse_candidates(csv_data.as_bytes()).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].position, Position::Center);
        assert_eq!(candidates[1].position, Position::RightWing);
    }
}
