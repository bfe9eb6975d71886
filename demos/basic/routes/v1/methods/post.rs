use fsrouter::dispatcher::RouteHandler;
use http::Method;

pub fn route() -> RouteHandler {
    RouteHandler::new(|_req, _res| Ok("Can be accessed via HTTP POST method".into()))
        .method(Method::POST)
        .cors("*")
}
