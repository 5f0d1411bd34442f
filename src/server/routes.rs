use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::optimizer::OptimizeError;
use crate::server::api::{self, OptimizePayloadError};

pub struct HttpResponse {
    pub status_code: u16,
    pub status_text: &'static str,
    pub content_type: &'static str,
    pub body: String,
}

impl IntoResponse for HttpResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, [(header::CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}

pub fn route_request(method: &str, path: &str, body: &str) -> HttpResponse {
    let path = path.split('?').next().unwrap_or(path);
    match (method, path) {
        ("GET", "/api/health") => match api::health_payload() {
            Ok(payload) => ok_json(payload),
            Err(err) => error_response(500, "Internal Server Error", "error", &err.to_string()),
        },
        ("POST", "/api/optimize") => match api::optimize_payload(body) {
            Ok(payload) => ok_json(payload),
            Err(OptimizePayloadError::Parse(err)) => error_response(
                400,
                "Bad Request",
                "error",
                &format!("Invalid request body: {err}"),
            ),
            Err(OptimizePayloadError::Optimize(err)) => optimize_error_response(err),
            Err(err @ OptimizePayloadError::Serialize(_)) => {
                error_response(500, "Internal Server Error", "error", &err.to_string())
            }
        },
        (_, "/api/health") | (_, "/api/optimize") => {
            error_response(405, "Method Not Allowed", "error", "Method not allowed")
        }
        _ => error_response(404, "Not Found", "error", "Route not found"),
    }
}

fn ok_json(body: String) -> HttpResponse {
    HttpResponse {
        status_code: 200,
        status_text: "OK",
        content_type: "application/json",
        body,
    }
}

fn optimize_error_response(err: OptimizeError) -> HttpResponse {
    let message = err.to_string();
    match err {
        OptimizeError::Validation { field, .. } => HttpResponse {
            status_code: 400,
            status_text: "Bad Request",
            content_type: "application/json",
            body: api::error_payload("validation_error", message, Some(field)),
        },
        OptimizeError::Infeasible(_) => {
            error_response(422, "Unprocessable Entity", "infeasible", &message)
        }
        OptimizeError::Solver(_) => {
            error_response(500, "Internal Server Error", "solver_error", &message)
        }
    }
}

pub fn error_response(
    status_code: u16,
    status_text: &'static str,
    status: &'static str,
    message: &str,
) -> HttpResponse {
    HttpResponse {
        status_code,
        status_text,
        content_type: "application/json",
        body: api::error_payload(status, message, None),
    }
}
