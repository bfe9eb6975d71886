use fsrouter::dispatcher::RouteHandler;
use tracing::info;

pub fn route() -> RouteHandler {
    RouteHandler::new(|_req, _res| Ok("On request test".into())).on_request(|req, res| {
        info!(url = %req.url, status = res.status(), "test from");
        Ok(())
    })
}
