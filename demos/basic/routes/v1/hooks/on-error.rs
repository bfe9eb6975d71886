use fsrouter::dispatcher::RouteHandler;
use serde_json::json;
use tracing::info;

pub fn route() -> RouteHandler {
    RouteHandler::new(|_req, _res| Err(anyhow::anyhow!("This page crashed!"))).on_error(
        |err, req, _res| {
            info!(request_id = %req.request_id, error = %err, "Recovering from handler error");
            Some(json!({ "error": true, "message": err.to_string() }).into())
        },
    )
}
