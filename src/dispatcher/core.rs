//! Dispatcher core module - hot path for request dispatch.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]
#![deny(clippy::unnecessary_to_owned)]

use crate::error::{DispatchError, RouterError};
use crate::router::{RouteMatch, Router};
use http::Method;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::envelope::{Body, ResponseEnvelope};
use super::handler::{ContentType, HandlerRequest, RouteHandler};
use super::registry::HandlerRegistry;

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("handler panicked")
}

/// Run `f`, turning a panic into a handler failure.
fn guarded<T>(f: impl FnOnce() -> anyhow::Result<T>) -> Result<T, DispatchError> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result.map_err(DispatchError::Handler),
        Err(panic) => Err(DispatchError::Handler(anyhow::anyhow!(
            "handler panicked: {}",
            panic_message(&*panic)
        ))),
    }
}

fn join_methods(methods: &[Method]) -> String {
    let names: Vec<&str> = methods.iter().map(Method::as_str).collect();
    names.join(", ")
}

/// Dispatcher that runs the handler bound to a matched route.
///
/// Holds the handler of every route in the table. Built once at startup and
/// shared read-only between requests.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    handlers: HashMap<String, Arc<RouteHandler>>,
}

impl Dispatcher {
    /// Bind every route of `router` to its registered handler.
    ///
    /// Several files may derive the same url (`hello.rs` and `hello.route`);
    /// they share one binding. Registrations for urls that no scanned file
    /// produces are logged and dropped.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::UnboundRoute`] for the first route without a
    /// handler.
    pub fn bind(router: &Router, registry: HandlerRegistry) -> Result<Self, RouterError> {
        let registered = registry.into_inner();
        let mut handlers = HashMap::with_capacity(registered.len());
        for route in router.table().routes() {
            if handlers.contains_key(&route.url) {
                continue;
            }
            let handler = registered
                .get(&route.url)
                .ok_or_else(|| RouterError::UnboundRoute {
                    url: route.url.clone(),
                })?;
            handlers.insert(route.url.clone(), Arc::clone(handler));
        }
        Self::warn_unused(&registered, &handlers);
        info!(bound_routes = handlers.len(), "Dispatcher bound to routing table");
        Ok(Self { handlers })
    }

    /// Bind every route of `router`, using `fallback` for routes the registry
    /// does not cover.
    #[must_use]
    pub fn bind_with_fallback(
        router: &Router,
        registry: HandlerRegistry,
        fallback: RouteHandler,
    ) -> Self {
        let registered = registry.into_inner();
        let fallback = Arc::new(fallback);
        let mut handlers = HashMap::with_capacity(registered.len());
        for route in router.table().routes() {
            if handlers.contains_key(&route.url) {
                continue;
            }
            let handler = registered.get(&route.url).map_or_else(
                || {
                    debug!(url = %route.url, "Route served by fallback handler");
                    Arc::clone(&fallback)
                },
                Arc::clone,
            );
            handlers.insert(route.url.clone(), handler);
        }
        Self::warn_unused(&registered, &handlers);
        Self { handlers }
    }

    fn warn_unused(
        registered: &HashMap<String, Arc<RouteHandler>>,
        bound: &HashMap<String, Arc<RouteHandler>>,
    ) {
        for url in registered.keys().filter(|url| !bound.contains_key(*url)) {
            warn!(url = %url, "Handler registered for a route that does not exist on disk");
        }
    }

    /// Every bound handler, once per url.
    pub fn handlers(&self) -> impl Iterator<Item = &Arc<RouteHandler>> {
        self.handlers.values()
    }

    /// Handler bound to a route url.
    #[must_use]
    pub fn handler_for(&self, url: &str) -> Option<&Arc<RouteHandler>> {
        self.handlers.get(url)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Resolve a request into a response envelope.
    ///
    /// Never fails: every error is logged and turned into a status and body.
    ///
    /// * no route -> 404, empty body
    /// * method outside the declared set, or no per-method entry -> 405 with
    ///   an `Allow` header
    /// * handler success -> the status the handler set, 200 if it set none
    /// * handler error or panic -> status left as the handler set it (503 by
    ///   default)
    ///
    /// On failure the route's `on_error` hook, if any, supplies the body.
    #[must_use]
    pub fn dispatch(
        &self,
        route_match: Option<&RouteMatch>,
        mut request: HandlerRequest,
    ) -> ResponseEnvelope {
        let mut response = ResponseEnvelope::new();

        let Some(route_match) = route_match else {
            let err = DispatchError::NotFound {
                path: request.path.clone(),
            };
            debug!(request_id = %request.request_id, path = %request.path, "{err}");
            response.set_status(err.status());
            return response;
        };
        let Some(handler) = self.handlers.get(route_match.route.url.as_str()) else {
            warn!(
                request_id = %request.request_id,
                path = %request.path,
                url = %route_match.route.url,
                "Route matched but no handler is bound"
            );
            response.set_status(404);
            return response;
        };

        Self::apply_headers(handler, &mut response);
        request.params.clone_from(&route_match.path_params);

        let start = Instant::now();
        let outcome = Self::invoke(handler, &request, &mut response);
        let failed = outcome.is_err();

        match outcome {
            Ok(body) => {
                debug!(
                    request_id = %request.request_id,
                    url = %route_match.route.url,
                    execution_time_us = start.elapsed().as_micros(),
                    "Handler execution complete"
                );
                response.body = body;
            }
            Err(err) => {
                if let DispatchError::MethodNotAllowed { allowed, .. } = &err {
                    warn!(
                        request_id = %request.request_id,
                        path = %request.path,
                        error = %err,
                        "Request rejected"
                    );
                    response.set_status(err.status());
                    response.set_header("allow", join_methods(allowed));
                } else {
                    error!(
                        request_id = %request.request_id,
                        path = %request.path,
                        url = %route_match.route.url,
                        error = %err,
                        "Handler failed"
                    );
                }
                response.body = Self::recover(handler, &err, &request, &mut response);
            }
        }

        let serialize = failed || handler.content_type == ContentType::Json;
        response.body = std::mem::take(&mut response.body).finalize(serialize);
        response
    }

    /// Content type first, then custom headers, then the CORS origin.
    fn apply_headers(handler: &RouteHandler, response: &mut ResponseEnvelope) {
        response.set_header("content-type", handler.content_type.mime());
        for (name, value) in &handler.headers {
            response.set_shared_header(name, value);
        }
        if let Some(origin) = &handler.cors {
            response.set_header("access-control-allow-origin", origin.as_str());
        }
    }

    fn invoke(
        handler: &RouteHandler,
        request: &HandlerRequest,
        response: &mut ResponseEnvelope,
    ) -> Result<Body, DispatchError> {
        handler.check_method(&request.method)?;
        let handler_fn = handler.select(&request.method)?;

        let body = guarded(|| handler_fn(request, response))?;
        if !response.is_status_set() {
            response.set_status(200);
        }

        if let Some(hook) = &handler.on_request {
            if let Err(err) = guarded(|| hook(request, response)) {
                response.set_status(err.status());
                return Err(err);
            }
        }
        Ok(body)
    }

    /// Body produced by the route's `on_error` hook, or empty.
    fn recover(
        handler: &RouteHandler,
        err: &DispatchError,
        request: &HandlerRequest,
        response: &mut ResponseEnvelope,
    ) -> Body {
        let Some(hook) = &handler.on_error else {
            return Body::Empty;
        };
        match catch_unwind(AssertUnwindSafe(|| hook(err, request, response))) {
            Ok(body) => body.unwrap_or_default(),
            Err(panic) => {
                error!(
                    request_id = %request.request_id,
                    path = %request.path,
                    panic_message = %panic_message(&*panic),
                    "Error hook panicked"
                );
                Body::Empty
            }
        }
    }
}
