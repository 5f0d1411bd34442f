//! HTTP front end. Routing lives in [routes::route_request] as a plain function; axum only
//! carries requests to it, off the async runtime since solves block.

use axum::http::{Method, Uri};
use axum::Router;
use tracing::{error, info};

pub mod api;
pub mod routes;

use routes::HttpResponse;

pub fn router() -> Router {
    Router::new().fallback(dispatch)
}

async fn dispatch(method: Method, uri: Uri, body: String) -> HttpResponse {
    let method = method.as_str().to_string();
    let path = uri.path().to_string();
    let log_path = path.clone();
    match tokio::task::spawn_blocking(move || routes::route_request(&method, &path, &body)).await {
        Ok(response) => {
            info!(path = %log_path, status = response.status_code, "request handled");
            response
        }
        Err(err) => {
            error!(path = %log_path, error = %err, "request handler failed");
            routes::error_response(500, "Internal Server Error", "error", "request handler failed")
        }
    }
}

pub async fn serve(bind_addr: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("rinkroster server listening on http://{bind_addr}");
    axum::serve(listener, router()).await
}

pub fn run_server(bind_addr: &str) -> std::io::Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(serve(bind_addr))
}
