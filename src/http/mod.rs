//! HTTP surface of the demo service.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, TraceLayer)
//!     → request.rs (assign x-request-id, enter a reqId span)
//!     → echo handler logs inside that span
//! ```

pub mod request;
pub mod server;

pub use request::{request_id, with_request_logging, X_REQUEST_ID};
pub use server::HttpServer;
