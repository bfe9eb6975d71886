use crate::dispatcher::{Body, ContentType, HandlerRequest, ResponseEnvelope, RouteHandler};
use crate::router::ParamVec;
use serde_json::{json, Map, Value};

fn to_object(pairs: &ParamVec) -> Value {
    let map: Map<String, Value> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.clone())))
        .collect();
    Value::Object(map)
}

/// Handler that describes the request it received.
///
/// Used by `fsrouter serve` for every route of a tree that has no compiled
/// handlers, so a routes directory can be explored before any code is
/// written for it.
pub fn echo_handler(req: &HandlerRequest, _res: &mut ResponseEnvelope) -> anyhow::Result<Body> {
    Ok(Body::Json(json!({
        "request_id": req.request_id.to_string(),
        "method": req.method.as_str(),
        "path": req.path,
        "params": to_object(&req.params),
        "query": to_object(&req.query_params),
        "body": String::from_utf8_lossy(&req.body),
    })))
}

/// [`echo_handler`] as a JSON route accepting any method.
#[must_use]
pub fn echo_route() -> RouteHandler {
    RouteHandler::new(echo_handler).content_type(ContentType::Json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use std::sync::Arc;

    #[test]
    fn test_echo_describes_request() {
        let mut req = HandlerRequest::new(Method::PUT, "/items/7?verbose=1").with_body("hi");
        req.params.push((Arc::from("id"), "7".to_string()));
        let mut res = ResponseEnvelope::new();

        let Body::Json(value) = echo_handler(&req, &mut res).unwrap() else {
            panic!("echo must return a JSON body");
        };
        assert_eq!(value["method"], "PUT");
        assert_eq!(value["path"], "/items/7");
        assert_eq!(value["params"]["id"], "7");
        assert_eq!(value["query"]["verbose"], "1");
        assert_eq!(value["body"], "hi");
    }

    #[test]
    fn test_echo_route_is_json() {
        assert_eq!(*echo_route().declared_content_type(), ContentType::Json);
        assert!(echo_route().allowed_methods().is_none());
    }
}
