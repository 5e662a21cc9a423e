//! Alert routing engine.
//!
//! Assigns incoming alerts to the nearest verified responder within a search
//! radius, escalating the radius on each failed attempt up to a fixed
//! attempt budget.

pub mod admin;
pub mod authority;
pub mod clock;
pub mod config;
pub mod directory;
pub mod error;
pub mod geo;
pub mod http;
pub mod identity;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod store;

pub use config::schema::RouterConfig;
pub use error::{RoutingError, RoutingResult};
pub use http::HttpServer;
pub use identity::{AlertId, CallerId, ResponderId};
pub use lifecycle::Shutdown;
pub use routing::RoutingEngine;
