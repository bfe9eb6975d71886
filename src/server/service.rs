use super::request::parse_request;
use super::response::{reserve_route_headers, write_envelope, write_status};
use crate::dispatcher::{Dispatcher, HandlerRequest, ResponseEnvelope};
use crate::router::Router;
use may_minihttp::{HttpService, Request, Response};
use std::io;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// `HttpService` that routes, dispatches and writes one request.
///
/// Cloned per connection by the listener; the router and dispatcher are
/// shared read-only.
#[derive(Clone)]
pub struct AppService {
    pub router: Arc<Router>,
    pub dispatcher: Arc<Dispatcher>,
}

impl AppService {
    /// Also reserves the header lines the bound routes declare.
    #[must_use]
    pub fn new(router: Arc<Router>, dispatcher: Arc<Dispatcher>) -> Self {
        reserve_route_headers(&dispatcher);
        Self { router, dispatcher }
    }

    /// Route and dispatch a parsed request.
    #[must_use]
    pub fn handle(&self, request: HandlerRequest) -> ResponseEnvelope {
        let route_match = self.router.route(&request.path);
        self.dispatcher.dispatch(route_match.as_ref(), request)
    }
}

impl HttpService for AppService {
    fn call(&mut self, req: Request, res: &mut Response) -> io::Result<()> {
        let start = Instant::now();
        let request = match parse_request(req) {
            Ok(request) => request,
            Err(err) => {
                warn!(error = %err, "Rejected malformed request");
                write_status(res, 400);
                return Ok(());
            }
        };

        let request_id = request.request_id;
        let method = request.method.clone();
        let path = request.path.clone();

        let envelope = self.handle(request);
        let status = envelope.status();
        write_envelope(res, envelope);

        info!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status,
            latency_us = start.elapsed().as_micros(),
            "Request handled"
        );
        Ok(())
    }
}
