//! Dispatch pipeline tests against a scanned routes tree.
//!
//! Covers binding (strict and fallback), method validation, content type
//! and header resolution, lifecycle hooks and error recovery.

mod common;

use common::route_tree::RouteTree;
use fsrouter::dispatcher::{
    Body, ContentType, Dispatcher, HandlerRegistry, HandlerRequest, ResponseEnvelope,
    RouteHandler,
};
use fsrouter::echo::echo_route;
use fsrouter::router::Router;
use fsrouter::{DispatchError, RouterError};
use http::Method;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Fixture {
    _tree: RouteTree,
    router: Router,
    dispatcher: Dispatcher,
}

impl Fixture {
    fn new(files: &[&str], registry: HandlerRegistry) -> Self {
        let tree = RouteTree::new(files);
        let router = Router::from_dir(tree.root(), &RouteTree::extensions()).unwrap();
        let dispatcher = Dispatcher::bind(&router, registry).unwrap();
        Self {
            _tree: tree,
            router,
            dispatcher,
        }
    }

    fn single(url: &str, handler: RouteHandler) -> Self {
        let mut registry = HandlerRegistry::new();
        registry.register(url, handler).unwrap();
        let file = format!("{}.rs", url.trim_start_matches('/'));
        Self::new(&[file.as_str()], registry)
    }

    fn call(&self, method: Method, url: &str) -> ResponseEnvelope {
        let request = HandlerRequest::new(method, url);
        let route_match = self.router.route(&request.path);
        self.dispatcher.dispatch(route_match.as_ref(), request)
    }
}

fn text(res: ResponseEnvelope) -> String {
    String::from_utf8(res.body.into_bytes().unwrap()).unwrap()
}

#[test]
fn test_bind_requires_every_route() {
    let tree = RouteTree::new(&["a.rs", "b.rs"]);
    let router = Router::from_dir(tree.root(), &RouteTree::extensions()).unwrap();
    let mut registry = HandlerRegistry::new();
    registry
        .register("/a", RouteHandler::new(|_, _| Ok(Body::from("a"))))
        .unwrap();
    let err = Dispatcher::bind(&router, registry).unwrap_err();
    match err {
        RouterError::UnboundRoute { url } => assert_eq!(url, "/b"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_bind_with_fallback_covers_missing_routes() {
    let tree = RouteTree::new(&["a.rs", "items/[id].rs"]);
    let router = Router::from_dir(tree.root(), &RouteTree::extensions()).unwrap();
    let mut registry = HandlerRegistry::new();
    registry
        .register("/a", RouteHandler::new(|_, _| Ok(Body::from("a"))))
        .unwrap();
    let dispatcher = Dispatcher::bind_with_fallback(&router, registry, echo_route());
    assert_eq!(dispatcher.len(), 2);

    let request = HandlerRequest::new(Method::GET, "/items/9?full=true");
    let res = dispatcher.dispatch(router.route(&request.path).as_ref(), request);
    assert_eq!(res.status(), 200);
    assert_eq!(res.get_header("content-type"), Some("application/json"));
    let body: Value = serde_json::from_str(&text(res)).unwrap();
    assert_eq!(body["params"]["id"], "9");
    assert_eq!(body["query"]["full"], "true");
}

#[test]
fn test_files_sharing_a_url_share_one_binding() {
    let tree = RouteTree::new(&["hello.rs", "hello.route"]);
    let extensions = vec!["rs".to_string(), "route".to_string()];
    let router = Router::from_dir(tree.root(), &extensions).unwrap();

    let registry = || {
        let mut registry = HandlerRegistry::new();
        registry
            .register("/hello", RouteHandler::new(|_, _| Ok(Body::from("registered"))))
            .unwrap();
        registry
    };

    let dispatcher = Dispatcher::bind(&router, registry()).unwrap();
    assert_eq!(dispatcher.len(), 1);
    let request = HandlerRequest::new(Method::GET, "/hello");
    let res = dispatcher.dispatch(router.route(&request.path).as_ref(), request);
    assert_eq!(text(res), "registered");

    let dispatcher = Dispatcher::bind_with_fallback(&router, registry(), echo_route());
    assert_eq!(dispatcher.len(), 1);
    let request = HandlerRequest::new(Method::GET, "/hello");
    let res = dispatcher.dispatch(router.route(&request.path).as_ref(), request);
    assert_eq!(text(res), "registered");
}

#[test]
fn test_unmatched_path_is_404_with_empty_body() {
    let fx = Fixture::single("/hello", RouteHandler::new(|_, _| Ok(Body::from("hi"))));
    let res = fx.call(Method::GET, "/missing");
    assert_eq!(res.status(), 404);
    assert!(res.body.is_empty());
    assert!(res.headers.is_empty());
}

#[test]
fn test_declared_methods_gate_the_handler() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let handler = RouteHandler::new(move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(Body::from("ok"))
    })
    .methods([Method::GET, Method::POST]);
    let fx = Fixture::single("/gated", handler);

    let res = fx.call(Method::DELETE, "/gated");
    assert_eq!(res.status(), 405);
    assert_eq!(res.get_header("allow"), Some("GET, POST"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    assert_eq!(fx.call(Method::GET, "/gated").status(), 200);
    assert_eq!(fx.call(Method::POST, "/gated").status(), 200);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_undeclared_methods_accept_anything() {
    let fx = Fixture::single("/open", RouteHandler::new(|_, _| Ok(Body::from("ok"))));
    for method in [Method::GET, Method::PATCH, Method::OPTIONS] {
        assert_eq!(fx.call(method, "/open").status(), 200);
    }
}

#[test]
fn test_method_not_allowed_runs_error_hook() {
    let handler = RouteHandler::new(|_, _| Ok(Body::from("ok")))
        .method(Method::POST)
        .on_error(|err, _req, _res| {
            assert!(matches!(err, DispatchError::MethodNotAllowed { .. }));
            Some(Body::from(err.to_string()))
        });
    let fx = Fixture::single("/submit", handler);
    let res = fx.call(Method::GET, "/submit");
    assert_eq!(res.status(), 405);
    assert_eq!(text(res), "invalid http method GET, expected one of [POST]");
}

#[test]
fn test_per_method_selection() {
    let handler = RouteHandler::per_method()
        .get(|_, _| Ok(Body::from("GET method")))
        .post(|_, _| Ok(Body::from("POST method")));
    let fx = Fixture::single("/multi", handler);
    assert_eq!(text(fx.call(Method::GET, "/multi")), "GET method");
    assert_eq!(text(fx.call(Method::POST, "/multi")), "POST method");

    let res = fx.call(Method::PUT, "/multi");
    assert_eq!(res.status(), 405);
    assert_eq!(res.get_header("allow"), Some("GET, POST"));
    assert!(res.body.is_empty());
}

#[test]
fn test_json_content_type_serializes_objects() {
    let handler = RouteHandler::new(|_, _| Ok(json!({ "hello": "world" }).into()))
        .content_type(ContentType::Json);
    let fx = Fixture::single("/json", handler);
    let res = fx.call(Method::GET, "/json");
    assert_eq!(res.status(), 200);
    assert_eq!(res.get_header("content-type"), Some("application/json"));
    assert_eq!(res.body.as_text(), Some(r#"{"hello":"world"}"#));
}

#[test]
fn test_text_content_type_keeps_structured_body() {
    let handler = RouteHandler::new(|_, _| Ok(json!({ "hello": "world" }).into()));
    let fx = Fixture::single("/plain", handler);
    let res = fx.call(Method::GET, "/plain");
    assert_eq!(res.get_header("content-type"), Some("text/plain"));
    assert!(matches!(res.body, Body::Json(_)));
}

#[test]
fn test_custom_content_type_passes_through() {
    let handler = RouteHandler::new(|_, _| Ok(Body::from("<a/>")))
        .content_type("application/xml".parse().unwrap());
    let fx = Fixture::single("/feed", handler);
    let res = fx.call(Method::GET, "/feed");
    assert_eq!(res.get_header("content-type"), Some("application/xml"));
}

#[test]
fn test_header_order_and_replacement() {
    let handler = RouteHandler::new(|_, _| Ok(Body::from("ok")))
        .content_type(ContentType::Html)
        .header("X-Powered-By", "fsrouter")
        .header("Content-Type", "text/plain")
        .cors("*");
    let fx = Fixture::single("/headers", handler);
    let res = fx.call(Method::GET, "/headers");
    let names: Vec<&str> = res.headers.iter().map(|(k, _)| k.as_ref()).collect();
    assert_eq!(
        names,
        vec!["X-Powered-By", "Content-Type", "access-control-allow-origin"]
    );
    assert_eq!(res.get_header("content-type"), Some("text/plain"));
    assert_eq!(res.get_header("access-control-allow-origin"), Some("*"));
}

#[test]
fn test_failing_handler_uses_error_hook_body() {
    let handler = RouteHandler::new(|_, _| Err(anyhow::anyhow!("This page crashed!"))).on_error(
        |err, _req, _res| Some(json!({ "error": true, "message": err.to_string() }).into()),
    );
    let fx = Fixture::single("/crash", handler);
    let res = fx.call(Method::GET, "/crash");
    assert_eq!(res.status(), 503);
    let body: Value = serde_json::from_str(res.body.as_text().unwrap()).unwrap();
    assert_eq!(body, json!({ "error": true, "message": "This page crashed!" }));
}

#[test]
fn test_failing_handler_without_hook_has_empty_body() {
    let fx = Fixture::single(
        "/crash",
        RouteHandler::new(|_, _| Err(anyhow::anyhow!("boom"))),
    );
    let res = fx.call(Method::GET, "/crash");
    assert_eq!(res.status(), 503);
    assert!(res.body.is_empty());
}

#[test]
fn test_panicking_handler_is_contained() {
    let handler = RouteHandler::new(|_, _| -> fsrouter::dispatcher::HandlerResult {
        panic!("handler exploded")
    })
    .on_error(|err, _req, _res| Some(Body::from(err.to_string())));
    let fx = Fixture::single("/panic", handler);
    let res = fx.call(Method::GET, "/panic");
    assert_eq!(res.status(), 503);
    assert_eq!(text(res), "handler panicked: handler exploded");

    // the dispatcher is still usable afterwards
    assert_eq!(fx.call(Method::GET, "/panic").status(), 503);
}

#[test]
fn test_panicking_error_hook_yields_empty_body() {
    let handler = RouteHandler::new(|_, _| Err(anyhow::anyhow!("boom")))
        .on_error(|_err, _req, _res| -> Option<Body> { panic!("hook exploded") });
    let fx = Fixture::single("/double", handler);
    let res = fx.call(Method::GET, "/double");
    assert_eq!(res.status(), 503);
    assert!(res.body.is_empty());
}

#[test]
fn test_handler_status_survives_failure() {
    let handler = RouteHandler::new(|_, res| {
        res.set_status(422);
        Err(anyhow::anyhow!("invalid input"))
    });
    let fx = Fixture::single("/validate", handler);
    assert_eq!(fx.call(Method::POST, "/validate").status(), 422);
}

#[test]
fn test_handler_status_survives_success() {
    let created = RouteHandler::new(|_, res| {
        res.set_status(201);
        Ok(Body::from("created"))
    });
    let fx = Fixture::single("/create", created);
    assert_eq!(fx.call(Method::POST, "/create").status(), 201);

    let maintenance = RouteHandler::new(|_, res| {
        res.set_status(503);
        Ok(Body::from("back soon"))
    });
    let fx = Fixture::single("/maintenance", maintenance);
    let res = fx.call(Method::GET, "/maintenance");
    assert_eq!(res.status(), 503);
    assert_eq!(text(res), "back soon");
}

#[test]
fn test_on_request_sees_handler_status() {
    let handler = RouteHandler::new(|_, res| {
        res.set_status(202);
        Ok(Body::from("accepted"))
    })
    .on_request(|_req, res| {
        assert_eq!(res.status(), 202);
        Ok(())
    });
    let fx = Fixture::single("/queue", handler);
    assert_eq!(fx.call(Method::POST, "/queue").status(), 202);
}

#[test]
fn test_error_hook_can_set_status() {
    let handler = RouteHandler::new(|_, _| Err(anyhow::anyhow!("gone")))
        .on_error(|_err, _req, res| {
            res.set_status(500);
            None
        });
    let fx = Fixture::single("/gone", handler);
    assert_eq!(fx.call(Method::GET, "/gone").status(), 500);
}

#[test]
fn test_on_request_sees_200_and_can_fail() {
    let seen = Arc::new(AtomicUsize::new(0));
    let seen_in_hook = Arc::clone(&seen);
    let handler = RouteHandler::new(|_, _| Ok(Body::from("On request test"))).on_request(
        move |_req, res| {
            seen_in_hook.store(usize::from(res.status()), Ordering::SeqCst);
            Ok(())
        },
    );
    let fx = Fixture::single("/hooked", handler);
    let res = fx.call(Method::GET, "/hooked");
    assert_eq!(res.status(), 200);
    assert_eq!(seen.load(Ordering::SeqCst), 200);
    assert_eq!(text(res), "On request test");

    let failing = RouteHandler::new(|_, _| Ok(Body::from("never sent")))
        .on_request(|_req, _res| Err(anyhow::anyhow!("rejected by hook")))
        .on_error(|err, _req, _res| Some(Body::from(err.to_string())));
    let fx = Fixture::single("/hooked", failing);
    let res = fx.call(Method::GET, "/hooked");
    assert_eq!(res.status(), 503);
    assert_eq!(text(res), "rejected by hook");
}

#[test]
fn test_error_path_serializes_object_regardless_of_content_type() {
    let handler = RouteHandler::new(|_, _| Err(anyhow::anyhow!("nope")))
        .content_type(ContentType::Html)
        .on_error(|_err, _req, _res| Some(json!({ "ok": false }).into()));
    let fx = Fixture::single("/html", handler);
    let res = fx.call(Method::GET, "/html");
    assert_eq!(res.get_header("content-type"), Some("text/html"));
    assert_eq!(res.body.as_text(), Some(r#"{"ok":false}"#));
}

#[test]
fn test_params_are_attached_to_request() {
    let mut registry = HandlerRegistry::new();
    registry
        .register(
            "/list/item-[itemId]",
            RouteHandler::new(|req, _| {
                Ok(format!("item {}", req.get_param("itemId").unwrap_or("?")).into())
            }),
        )
        .unwrap();
    registry
        .register(
            "/list/[projectId]",
            RouteHandler::new(|req, _| {
                Ok(format!("project {}", req.get_param("projectId").unwrap_or("?")).into())
            }),
        )
        .unwrap();
    let fx = Fixture::new(&["list/[projectId].rs", "list/item-[itemId].rs"], registry);
    assert_eq!(text(fx.call(Method::GET, "/list/item-42")), "item 42");
    assert_eq!(text(fx.call(Method::GET, "/list/42")), "project 42");
    assert_eq!(
        text(fx.call(Method::GET, "/list/hello%20world")),
        "project hello world"
    );
}
