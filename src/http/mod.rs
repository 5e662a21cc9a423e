//! HTTP API subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, request span)
//!     → identity.rs (X-Caller-Id → CallerId)
//!     → handlers.rs (directory / authority / engine calls)
//!     → response.rs (RoutingError → status + JSON body)
//! ```

pub mod handlers;
pub mod identity;
pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuidV4, REQUEST_ID_HEADER};
pub use response::ApiError;
pub use server::{AppState, HttpServer};
