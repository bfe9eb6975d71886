use fsrouter::dispatcher::{ContentType, RouteHandler};
use http::Method;
use serde_json::json;

pub fn route() -> RouteHandler {
    RouteHandler::per_method()
        .get(|_req, _res| Ok(json!({ "hello": "from get" }).into()))
        .post(|_req, _res| Ok(json!({ "hello": "from post" }).into()))
        .methods([Method::GET, Method::POST])
        .content_type(ContentType::Json)
}
