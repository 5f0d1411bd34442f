use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RosterConstraints;
use crate::data::candidate::Candidate;
use crate::data::export::RosterSummary;
use crate::optimizer::{optimize_roster, OptimizeError};

#[derive(Debug, Clone, Deserialize)]
pub struct OptimizeRequest {
    pub candidates: Vec<Candidate>,
    pub salary_cap: Option<f64>,
    pub forwards_needed: Option<u32>,
    pub defensemen_needed: Option<u32>,
    pub goalies_needed: Option<u32>,
    pub time_limit_seconds: Option<f64>,
}

impl OptimizeRequest {
    /// Request overrides on top of `base`.
    pub fn constraints(&self, base: &RosterConstraints) -> RosterConstraints {
        RosterConstraints {
            salary_cap: self.salary_cap.unwrap_or(base.salary_cap),
            forwards_needed: self.forwards_needed.unwrap_or(base.forwards_needed),
            defensemen_needed: self.defensemen_needed.unwrap_or(base.defensemen_needed),
            goalies_needed: self.goalies_needed.unwrap_or(base.goalies_needed),
            time_limit_seconds: self.time_limit_seconds.or(base.time_limit_seconds),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizeResponse {
    pub status: &'static str,
    pub engine: &'static str,
    pub constraints: RosterConstraints,
    pub roster: Vec<Candidate>,
    pub summary: RosterSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

#[derive(Debug, Error)]
pub enum OptimizePayloadError {
    #[error("{0}")]
    Parse(serde_json::Error),

    #[error(transparent)]
    Optimize(#[from] OptimizeError),

    #[error("failed to serialize response: {0}")]
    Serialize(serde_json::Error),
}

pub fn health_payload() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&serde_json::json!({
        "status": "ok",
        "service": "rinkroster-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub fn optimize_payload(body: &str) -> Result<String, OptimizePayloadError> {
    let request: OptimizeRequest =
        serde_json::from_str(body).map_err(OptimizePayloadError::Parse)?;
    let constraints = request.constraints(&RosterConstraints::default());
    let solution = optimize_roster(&request.candidates, &constraints)?;

    let response = OptimizeResponse {
        status: "ok",
        engine: "milp",
        summary: RosterSummary::from_solution(&solution),
        constraints,
        roster: solution.selected,
    };
    serde_json::to_string_pretty(&response).map_err(OptimizePayloadError::Serialize)
}

pub fn error_payload(status: &'static str, message: impl Into<String>, field: Option<String>) -> String {
    let payload = ErrorResponse {
        status,
        message: message.into(),
        field,
    };
    serde_json::to_string_pretty(&payload).unwrap_or_else(|_| {
        "{\n  \"status\": \"error\",\n  \"message\": \"Unknown error\"\n}".to_string()
    })
}
