use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs::File;
use std::io::Read;

use serde::Serialize;

use crate::data::candidate::{Position, PositionCategory};
use crate::data::load::{
    parse_currency, parse_score, CandidateColumns, LoadError, CAP_HIT_COLUMN, PLAYER_COLUMN,
    POSITION_COLUMN, SCORE_COLUMN,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.context, self.message)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub rows: usize,
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }

    pub fn count(&self, severity: ValidationSeverity) -> usize {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity == severity)
            .count()
    }
}

/// Scan a candidate CSV and collect every issue instead of stopping at the first one.
pub fn validate_candidate_file(path: &str) -> Result<ValidationReport, String> {
    let file = File::open(path).map_err(|err| format!("unable to read '{path}': {err}"))?;
    validate_candidate_table(file).map_err(|err| format!("unable to parse csv '{path}': {err}"))
}

pub fn validate_candidate_table<R: Read>(reader: R) -> Result<ValidationReport, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut report = ValidationReport::default();

    let columns = match CandidateColumns::from_headers(reader.headers()?) {
        Ok(columns) => columns,
        Err(LoadError::MissingColumn(column)) => {
            report.push(
                ValidationSeverity::Error,
                "header",
                format!("missing required column '{column}'"),
            );
            return Ok(report);
        }
        Err(LoadError::Csv(err)) => return Err(err),
        Err(other) => {
            report.push(ValidationSeverity::Error, "header", other.to_string());
            return Ok(report);
        }
    };

    let mut seen = HashSet::new();
    let mut per_category: HashMap<PositionCategory, usize> = HashMap::new();

    for (index, result) in reader.records().enumerate() {
        let row = index + 1;
        let record = result?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        report.rows += 1;
        let context = |field: &str| format!("row[{row}].{field}");

        let player = record.get(columns.player).unwrap_or("").trim();
        if player.is_empty() {
            report.push(ValidationSeverity::Error, context(PLAYER_COLUMN), "missing player name");
        } else if !seen.insert(player.to_string()) {
            report.push(
                ValidationSeverity::Warning,
                context(PLAYER_COLUMN),
                format!("duplicate player '{player}', later row will be dropped"),
            );
            continue;
        }

        let raw_position = record.get(columns.position).unwrap_or("").trim();
        match Position::parse_listing(raw_position) {
            Some(position) => {
                *per_category.entry(position.category()).or_default() += 1;
                if raw_position.contains(',') {
                    report.push(
                        ValidationSeverity::Info,
                        context(POSITION_COLUMN),
                        format!("dual listing '{raw_position}' resolved to {position}"),
                    );
                }
            }
            None => report.push(
                ValidationSeverity::Error,
                context(POSITION_COLUMN),
                format!("unknown position '{raw_position}'"),
            ),
        }

        let raw_score = record.get(columns.score).unwrap_or("").trim();
        if parse_score(raw_score).is_none() {
            report.push(
                ValidationSeverity::Warning,
                context(SCORE_COLUMN),
                format!("unparseable score '{raw_score}' will default to 0"),
            );
        }

        let raw_cap_hit = record.get(columns.cap_hit).unwrap_or("").trim();
        match parse_currency(raw_cap_hit) {
            Some(value) if value < 0.0 => report.push(
                ValidationSeverity::Error,
                context(CAP_HIT_COLUMN),
                format!("negative cap hit {value}"),
            ),
            Some(_) => {}
            None => report.push(
                ValidationSeverity::Warning,
                context(CAP_HIT_COLUMN),
                format!("unparseable cap hit '{raw_cap_hit}' will default to 0"),
            ),
        }
    }

    for category in PositionCategory::ALL {
        let count = per_category.get(&category).copied().unwrap_or(0);
        report.push(
            ValidationSeverity::Info,
            format!("summary.{category}"),
            format!("{count} eligible"),
        );
    }

    Ok(report)
}
