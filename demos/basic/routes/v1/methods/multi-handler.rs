use fsrouter::dispatcher::RouteHandler;

pub fn route() -> RouteHandler {
    RouteHandler::per_method()
        .get(|_req, _res| Ok("GET method".into()))
        .post(|_req, _res| Ok("POST method".into()))
        .header("Content-Type", "text/plain")
}
