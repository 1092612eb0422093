//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum Router with the echo handler
//! - Wire up middleware (tracing, request ID)
//! - Serve until Ctrl+C

use std::time::Instant;

use axum::http::{Method, Uri};
use axum::response::IntoResponse;
use axum::routing::any;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::http::request::with_request_logging;

/// HTTP server for the demo service.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new() -> Self {
        Self {
            router: Self::build_router(),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router() -> Router {
        let router = Router::new()
            .route("/{*path}", any(echo_handler))
            .route("/", any(echo_handler));

        with_request_logging(router).layer(TraceLayer::new_for_http())
    }

    /// The fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }
}

impl Default for HttpServer {
    fn default() -> Self {
        Self::new()
    }
}

/// Echo handler: replies with the method and path, logging each request.
async fn echo_handler(method: Method, uri: Uri) -> impl IntoResponse {
    let start = Instant::now();
    let body = format!("{} {}\n", method, uri.path());

    info!(
        method = method.as_str(),
        path = uri.path(),
        elapsed = start.elapsed().as_secs_f64(),
        "Handled request"
    );
    body
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
}
