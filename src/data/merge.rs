//! Join the score table with the salary table on corrected player names.
//!
//! Score and salary sources spell some names differently ("Mitch Marner" vs
//! "Mitchell Marner"). Both tables go through the same alias map before the join, duplicate
//! names are dropped (first row wins), and only names present in both tables survive.

use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::data::load::find_column;

pub const DEFAULT_MERGED_OUTPUT_PATH: &str =
    "data/processed/merged_player_goalie_cps_and_salaries.csv";

/// Name variants seen across sources, mapped to the spelling used downstream.
const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("Mitch Marner", "Mitchell Marner"),
    ("John (Jack) Roslovic", "Jack Roslovic"),
    ("Alexander Wennberg", "Alex Wennberg"),
    ("Cameron Atkinson", "Cam Atkinson"),
    ("Janis Moser", "J.J. Moser"),
    ("Patrick Maroon", "Pat Maroon"),
    // Salary export that lost the umlauts to a bad encoding.
    ("Jani Hakanp§§", "Jani Hakanpää"),
    ("Mathew Dumba", "Matt Dumba"),
    ("Matthew Grzelcyk", "Matt Grzelcyk"),
    ("Joshua Brown", "Josh Brown"),
    ("Gustav Lindstrom", "Gustav Lindström"),
    ("Joshua Mahura", "Josh Mahura"),
    ("Jesse Ylonen", "Jesse Ylönen"),
    ("Zachary Sanford", "Zach Sanford"),
    ("Jake Lucchini", "Jacob Lucchini"),
    ("Matt Benning", "Matthew Benning"),
    ("Maxime Lajoie", "Max Lajoie"),
    ("Maxime Comtois", "Max Comtois"),
    ("Alexander Petrovic", "Alex Petrovic"),
    ("Matthew Savoie", "Matt Savoie"),
];

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {table} table: {source}")]
    Csv {
        table: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("{table} table is missing column '{column}'")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },

    #[error("failed to parse alias map: {0}")]
    Aliases(#[from] serde_json::Error),
}

/// Variant spelling → canonical spelling. Keys are matched after whitespace/case folding.
#[derive(Debug, Clone, Default)]
pub struct AliasMap {
    aliases: HashMap<String, String>,
}

impl AliasMap {
    pub fn builtin() -> Self {
        Self::from_pairs(
            BUILTIN_ALIASES
                .iter()
                .map(|(alias, canonical)| (alias.to_string(), canonical.to_string())),
        )
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let aliases = pairs
            .into_iter()
            .map(|(alias, canonical)| (normalize_key(&alias), canonical.trim().to_string()))
            .collect();
        Self { aliases }
    }

    /// JSON object of `{ "variant": "canonical" }`.
    pub fn from_json_str(raw: &str) -> Result<Self, MergeError> {
        let parsed: HashMap<String, String> = serde_json::from_str(raw)?;
        Ok(Self::from_pairs(parsed))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, MergeError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| MergeError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Canonical spelling for `name`; unmapped names come back trimmed.
    pub fn canonical(&self, name: &str) -> String {
        self.aliases
            .get(&normalize_key(name))
            .cloned()
            .unwrap_or_else(|| name.trim().to_string())
    }
}

fn normalize_key(value: &str) -> String {
    value
        .trim()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedRow {
    pub player: String,
    #[serde(rename = "Position")]
    pub position: String,
    pub cps: String,
    /// Raw text; currency cleaning happens in the load adapter.
    pub cap_hit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeReport {
    pub score_rows: usize,
    pub salary_rows: usize,
    pub score_duplicates_dropped: usize,
    pub salary_duplicates_dropped: usize,
    pub matched_rows: usize,
    pub unmatched_players: Vec<String>,
    #[serde(skip)]
    pub rows: Vec<MergedRow>,
}

struct ScoreRow {
    player: String,
    position: String,
    cps: String,
}

/// Merge in memory. Output rows follow score-table order.
pub fn merge_tables<S: Read, P: Read>(
    scores: S,
    salaries: P,
    aliases: &AliasMap,
) -> Result<MergeReport, MergeError> {
    let (score_rows, score_total, score_duplicates) = read_score_table(scores, aliases)?;
    let (salary_by_player, salary_total, salary_duplicates) =
        read_salary_table(salaries, aliases)?;

    let mut rows = Vec::with_capacity(score_rows.len());
    let mut unmatched_players = Vec::new();
    for score in score_rows {
        match salary_by_player.get(&score.player) {
            Some(cap_hit) => rows.push(MergedRow {
                player: score.player,
                position: score.position,
                cps: score.cps,
                cap_hit: cap_hit.clone(),
            }),
            None => unmatched_players.push(score.player),
        }
    }

    Ok(MergeReport {
        score_rows: score_total,
        salary_rows: salary_total,
        score_duplicates_dropped: score_duplicates,
        salary_duplicates_dropped: salary_duplicates,
        matched_rows: rows.len(),
        unmatched_players,
        rows,
    })
}

/// Merge two CSV files and write the joined table to `output`.
pub fn merge_files(
    scores_path: impl AsRef<Path>,
    salaries_path: impl AsRef<Path>,
    output: impl AsRef<Path>,
    aliases: &AliasMap,
) -> Result<MergeReport, MergeError> {
    let scores = open(scores_path.as_ref())?;
    let salaries = open(salaries_path.as_ref())?;
    let report = merge_tables(scores, salaries, aliases)?;

    let output = output.as_ref();
    let io_error = |source: std::io::Error| MergeError::Io {
        path: output.display().to_string(),
        source,
    };
    if let Some(parent) = output.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    let file = File::create(output).map_err(io_error)?;
    write_merged(file, &report.rows)?;

    info!(
        output = %output.display(),
        matched = report.matched_rows,
        unmatched = report.unmatched_players.len(),
        "merged score and salary tables"
    );
    Ok(report)
}

pub fn write_merged<W: Write>(writer: W, rows: &[MergedRow]) -> Result<(), MergeError> {
    let csv_error = |source| MergeError::Csv {
        table: "merged",
        source,
    };
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    writer
        .write_record(["player", "Position", "cps", "cap_hit"])
        .map_err(csv_error)?;
    for row in rows {
        writer.serialize(row).map_err(csv_error)?;
    }
    writer
        .flush()
        .map_err(|err| csv_error(csv::Error::from(err)))?;
    Ok(())
}

fn open(path: &Path) -> Result<File, MergeError> {
    File::open(path).map_err(|source| MergeError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn read_score_table<R: Read>(
    reader: R,
    aliases: &AliasMap,
) -> Result<(Vec<ScoreRow>, usize, usize), MergeError> {
    const TABLE: &str = "score";
    let csv_error = |source| MergeError::Csv { table: TABLE, source };
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader.headers().map_err(csv_error)?.clone();
    let player = require(&headers, TABLE, "Player", &["player", "name"])?;
    let position = require(&headers, TABLE, "Position", &["position", "pos"])?;
    let cps = require(&headers, TABLE, "cps", &["cps", "cps_goalie", "score"])?;

    let mut rows = Vec::new();
    let mut seen = HashSet::new();
    let mut total = 0usize;
    let mut duplicates = 0usize;
    for result in reader.records() {
        let record = result.map_err(csv_error)?;
        let raw_name = record.get(player).unwrap_or("");
        if raw_name.trim().is_empty() {
            continue;
        }
        total += 1;
        let name = aliases.canonical(raw_name);
        if !seen.insert(name.clone()) {
            duplicates += 1;
            warn!(table = TABLE, player = %name, "dropping duplicate player row");
            continue;
        }
        rows.push(ScoreRow {
            player: name,
            position: record.get(position).unwrap_or("").trim().to_string(),
            cps: record.get(cps).unwrap_or("").trim().to_string(),
        });
    }
    Ok((rows, total, duplicates))
}

fn read_salary_table<R: Read>(
    reader: R,
    aliases: &AliasMap,
) -> Result<(HashMap<String, String>, usize, usize), MergeError> {
    const TABLE: &str = "salary";
    let csv_error = |source| MergeError::Csv { table: TABLE, source };
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader.headers().map_err(csv_error)?.clone();
    let player = require(&headers, TABLE, "name", &["name", "player"])?;
    let cap_hit = require(&headers, TABLE, "cap_hit", &["cap_hit", "caphit"])?;

    let mut by_player = HashMap::new();
    let mut total = 0usize;
    let mut duplicates = 0usize;
    for result in reader.records() {
        let record = result.map_err(csv_error)?;
        let raw_name = record.get(player).unwrap_or("");
        if raw_name.trim().is_empty() {
            continue;
        }
        total += 1;
        let name = aliases.canonical(raw_name);
        if by_player.contains_key(&name) {
            duplicates += 1;
            warn!(table = TABLE, player = %name, "dropping duplicate player row");
            continue;
        }
        by_player.insert(name, record.get(cap_hit).unwrap_or("").trim().to_string());
    }
    Ok((by_player, total, duplicates))
}

fn require(
    headers: &csv::StringRecord,
    table: &'static str,
    column: &'static str,
    aliases: &[&str],
) -> Result<usize, MergeError> {
    find_column(headers, aliases).ok_or(MergeError::MissingColumn { table, column })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCORES: &str = "\
Player,Position,cps
Mitch Marner,R,0.81
Auston Matthews,C,0.95
Auston Matthews,C,0.10
Unsigned Prospect,L,0.40
";

    const SALARIES: &str = "\
name,cap_hit
Mitchell Marner,\"$10,903,000\"
Auston Matthews,\"$13,250,000\"
Auston Matthews,\"$1\"
";

    #[test]
    fn joins_on_corrected_names() {
        let report =
            merge_tables(SCORES.as_bytes(), SALARIES.as_bytes(), &AliasMap::builtin()).unwrap();
        assert_eq!(report.score_rows, 4);
        assert_eq!(report.salary_rows, 3);
        assert_eq!(report.score_duplicates_dropped, 1);
        assert_eq!(report.salary_duplicates_dropped, 1);
        assert_eq!(report.matched_rows, 2);
        assert_eq!(report.unmatched_players, vec!["Unsigned Prospect".to_string()]);

        assert_eq!(report.rows[0].player, "Mitchell Marner");
        assert_eq!(report.rows[0].cap_hit, "$10,903,000");
        assert_eq!(report.rows[1].cps, "0.95");
        assert_eq!(report.rows[1].cap_hit, "$13,250,000");
    }

    #[test]
    fn builtin_map_repairs_mangled_umlauts() {
        let aliases = AliasMap::builtin();
        assert_eq!(aliases.canonical("Jani Hakanp§§"), "Jani Hakanpää");
        assert_eq!(aliases.canonical("Jani Hakanpää"), "Jani Hakanpää");
    }

    #[test]
    fn alias_lookup_folds_case_and_spacing() {
        let aliases = AliasMap::from_json_str(r#"{"  jake   LUCCHINI ": "Jacob Lucchini"}"#).unwrap();
        assert_eq!(aliases.len(), 1);
        assert_eq!(aliases.canonical("Jake Lucchini"), "Jacob Lucchini");
        assert_eq!(aliases.canonical(" Someone Else "), "Someone Else");
    }

    #[test]
    fn merged_output_is_loadable() {
        let report =
            merge_tables(SCORES.as_bytes(), SALARIES.as_bytes(), &AliasMap::builtin()).unwrap();
        let mut buffer = Vec::new();
        write_merged(&mut buffer, &report.rows).unwrap();
        let candidates = crate::data::load::parse_candidates(buffer.as_slice()).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].cap_hit, 10_903_000.0);
    }

    #[test]
    fn missing_salary_column_is_reported() {
        let err = merge_tables(SCORES.as_bytes(), "name,salary\nA,1\n".as_bytes(), &AliasMap::default())
            .unwrap_err();
        assert!(matches!(
            err,
            MergeError::MissingColumn { table: "salary", column: "cap_hit" }
        ));
    }
}
