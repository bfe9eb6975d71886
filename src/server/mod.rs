//! # Server Module
//!
//! Glue between the `may_minihttp` listener and the routing core.
//!
//! Per request, [`AppService`]:
//!
//! 1. parses the raw request into a `HandlerRequest` ([`parse_request`])
//! 2. matches the path against the routing table
//! 3. dispatches to the bound handler
//! 4. writes the resulting envelope ([`write_envelope`])
//!
//! [`App`] bundles configuration, router and dispatcher and owns the startup
//! sequence (runtime config, lifecycle hooks, banner, listener).

mod app;
mod http_server;
mod request;
mod response;
mod service;

pub use app::App;
pub use http_server::{HttpServer, ServerHandle, READY_TIMEOUT};
pub use request::{parse_request, RequestError};
pub use response::{
    reserve_route_headers, status_reason, write_envelope, write_status, MAX_DYNAMIC_HEADER_LINES,
    MAX_RESPONSE_HEADERS,
};
pub use service::AppService;
