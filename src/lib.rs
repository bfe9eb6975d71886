//! # fsrouter
//!
//! **fsrouter** is a convention-based HTTP router for Rust: the directory tree
//! *is* the route table. Handler files are discovered at startup, their paths
//! become URL patterns, and requests are dispatched on `may` coroutines through
//! `may_minihttp`.
//!
//! ## Overview
//!
//! ```text
//! routes/
//! └── v1/
//!     ├── hello.rs                 -> /v1/hello
//!     ├── dynamic/[id].rs          -> /v1/dynamic/*        id
//!     ├── dynamic/[slug]/[id].rs   -> /v1/dynamic/*/*      slug, id
//!     ├── list/[projectId].rs      -> /v1/list/*           projectId
//!     └── list/item-[itemId].rs    -> /v1/list/item-*      itemId
//! ```
//!
//! A bracketed segment (`[name]`) captures one path segment; a literal prefix
//! (`item-[itemId]`) narrows it. When several patterns match, the most
//! specific wins: literal segments beat prefixed captures, which beat bare
//! captures, compared left to right.
//!
//! ## Architecture
//!
//! - **[`scanner`]** - Walks the routes directory and derives each file's URL
//!   and parameter names
//! - **[`router`]** - Groups routes by glob, ranks globs by specificity and
//!   matches request paths
//! - **[`dispatcher`]** - Binds routes to compiled handlers and runs the
//!   per-request pipeline (method check, headers, hooks, error recovery)
//! - **[`server`]** - `may_minihttp` service, listener handle and the [`App`]
//!   startup sequence
//! - **[`config`]** / **[`runtime_config`]** - YAML + environment
//!   configuration and coroutine stack size
//! - **[`logging`]** - `tracing` subscriber setup (JSON or pretty)
//! - **[`cli`]** - `fsrouter routes` and `fsrouter serve`
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as AppService<br/>(may_minihttp)
//!     participant Router as Router
//!     participant Dispatcher as Dispatcher
//!     participant Handler as RouteHandler
//!
//!     Client->>Server: GET /v1/list/item-42
//!     Server->>Server: parse_request (headers, query, body, request id)
//!     Server->>Router: route("/v1/list/item-42")
//!     Router-->>Server: RouteMatch { url: /v1/list/item-[itemId], itemId=42 }
//!     Server->>Dispatcher: dispatch(match, request)
//!     Dispatcher->>Dispatcher: Content-Type, custom headers, CORS
//!     Dispatcher->>Dispatcher: method check (405 + Allow)
//!     Dispatcher->>Handler: handler(&request, &mut envelope)
//!     alt handler fails or panics
//!         Dispatcher->>Handler: on_error(err, &request, &mut envelope)
//!     else success
//!         Dispatcher->>Handler: on_request(&request, &mut envelope)
//!     end
//!     Dispatcher-->>Server: ResponseEnvelope
//!     Server-->>Client: status, headers, body
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use fsrouter::dispatcher::{Body, HandlerRegistry, RouteHandler};
//! use fsrouter::{App, AppConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut registry = HandlerRegistry::new();
//!     registry.register(
//!         "/v1/hello",
//!         RouteHandler::new(|_req, _res| Ok(Body::from("Hello World"))),
//!     )?;
//!
//!     let config = AppConfig::resolve(None)?;
//!     let handle = App::from_config(config, registry)?.serve()?;
//!     handle.join().ok();
//!     Ok(())
//! }
//! ```
//!
//! ## Runtime Considerations
//!
//! fsrouter uses the `may` coroutine runtime, not tokio:
//!
//! - Every connection runs in a coroutine
//! - Stack size is configurable via `FSR_STACK_SIZE` or `stack_size` in the
//!   config file
//! - The route table and handler bindings are immutable after startup and
//!   shared without locks
//! - Handlers run synchronously inside the connection's coroutine

pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod echo;
pub mod error;
pub mod ids;
pub mod logging;
pub mod router;
pub mod runtime_config;
pub mod scanner;
pub mod server;

pub use config::AppConfig;
pub use dispatcher::{Body, ContentType, Dispatcher, HandlerRegistry, HandlerRequest, RouteHandler};
pub use error::{DispatchError, RegistryError, RouterError};
pub use router::{RouteMatch, Router};
pub use scanner::RouteFile;
pub use server::{App, AppService, HttpServer, ServerHandle};
