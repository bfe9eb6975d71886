//! # Dispatcher Module
//!
//! Resolves a matched route into a handler invocation and a response
//! envelope.
//!
//! ## Overview
//!
//! Handlers are bound statically: a [`HandlerRegistry`] maps each route url
//! (as derived by the scanner, brackets included) to a [`RouteHandler`].
//! [`Dispatcher::bind`] checks the registry against the routing table once at
//! startup; afterwards the dispatcher is immutable.
//!
//! ## Handler Registration
//!
//! ```rust,ignore
//! use fsrouter::dispatcher::{Body, ContentType, Dispatcher, HandlerRegistry, RouteHandler};
//! use http::Method;
//!
//! let mut registry = HandlerRegistry::new();
//! registry.register(
//!     "/v1/methods/post",
//!     RouteHandler::new(|_req, _res| Ok(Body::from("Can be accessed via HTTP POST method")))
//!         .method(Method::POST)
//!         .cors("*"),
//! )?;
//! let dispatcher = Dispatcher::bind(&router, registry)?;
//! ```
//!
//! ## Request Flow
//!
//! 1. Headers: `Content-Type` from the declared content type, custom headers,
//!    then `Access-Control-Allow-Origin`
//! 2. Method check against the declared allow-set
//! 3. Handler selection (single function or per-method table)
//! 4. Handler call with route params attached to the request
//! 5. Status 200, then the `on_request` hook
//! 6. Body finalization (objects serialized for JSON routes and on errors)
//!
//! ## Error Handling
//!
//! Dispatch never fails:
//! - Unmatched paths return 404
//! - Method mismatches return 405 with an `Allow` header
//! - Handler errors and panics are logged and keep status 503 unless the
//!   handler or the `on_error` hook changed it; `on_error` supplies the body

mod core;
mod envelope;
mod handler;
mod registry;

pub use core::Dispatcher;
pub use envelope::{Body, HeaderVec, ResponseEnvelope, MAX_INLINE_HEADERS, UNRESOLVED_STATUS};
pub use handler::{
    ContentType, ErrorHook, HandlerFn, HandlerKind, HandlerRequest, HandlerResult, RequestHook,
    RouteHandler,
};
pub use registry::HandlerRegistry;
