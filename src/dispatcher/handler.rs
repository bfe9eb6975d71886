use crate::error::{DispatchError, RegistryError};
use crate::ids::RequestId;
use crate::router::ParamVec;
use http::{HeaderName, HeaderValue, Method};
use serde::de::DeserializeOwned;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::warn;

use super::envelope::{Body, HeaderVec, ResponseEnvelope};

/// Request handed to a route handler.
///
/// `params` is filled by the dispatcher from the route match before the
/// handler runs.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    /// Unique request ID for tracing and correlation
    pub request_id: RequestId,
    pub method: Method,
    /// Request target as received (path and query)
    pub url: String,
    /// Path without query string
    pub path: String,
    pub query_params: ParamVec,
    /// Headers with lowercase names
    pub headers: HeaderVec,
    pub body: Vec<u8>,
    /// Decoded dynamic segments of the matched route
    pub params: ParamVec,
}

impl HandlerRequest {
    /// Build a request from a method and a request target (`/path?query`).
    #[must_use]
    pub fn new(method: Method, url: &str) -> Self {
        let (path, query) = url.split_once('?').unwrap_or((url, ""));
        let query_params = url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (Arc::from(&*k), v.into_owned()))
            .collect();
        Self {
            request_id: RequestId::new(),
            method,
            url: url.to_string(),
            path: if path.is_empty() { "/".to_string() } else { path.to_string() },
            query_params,
            headers: HeaderVec::new(),
            body: Vec::new(),
            params: ParamVec::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .push((Arc::from(name.to_ascii_lowercase().as_str()), value.to_string()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Get a route parameter by name (last write wins)
    #[inline]
    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name (last write wins)
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Deserialize the request body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Symbolic content type declared by a route.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ContentType {
    Html,
    Json,
    #[default]
    Text,
    /// Any other MIME type, passed through verbatim
    Custom(String),
}

impl ContentType {
    /// MIME value for the `Content-Type` header.
    #[must_use]
    pub fn mime(&self) -> &str {
        match self {
            ContentType::Html => "text/html",
            ContentType::Json => "application/json",
            ContentType::Text => "text/plain",
            ContentType::Custom(mime) => mime,
        }
    }
}

impl FromStr for ContentType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "html" => ContentType::Html,
            "json" => ContentType::Json,
            "text" => ContentType::Text,
            other => ContentType::Custom(other.to_string()),
        })
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// Result of a handler call: the body on success.
pub type HandlerResult = anyhow::Result<Body>;

/// A route handler function.
pub type HandlerFn =
    Arc<dyn Fn(&HandlerRequest, &mut ResponseEnvelope) -> HandlerResult + Send + Sync>;

/// Hook run after a successful handler call, before the body is set.
pub type RequestHook =
    Arc<dyn Fn(&HandlerRequest, &mut ResponseEnvelope) -> anyhow::Result<()> + Send + Sync>;

/// Hook run instead of the normal body when dispatch fails; its return
/// value becomes the body.
pub type ErrorHook = Arc<
    dyn Fn(&DispatchError, &HandlerRequest, &mut ResponseEnvelope) -> Option<Body> + Send + Sync,
>;

/// Executable shape of a route: one function, or one per method.
#[derive(Clone)]
pub enum HandlerKind {
    Single(HandlerFn),
    PerMethod(Vec<(Method, HandlerFn)>),
}

/// Handler plus the optional metadata a route may declare.
///
/// Built with a small builder and validated once when registered:
///
/// ```rust,ignore
/// use fsrouter::dispatcher::{ContentType, RouteHandler};
/// use http::Method;
/// use serde_json::json;
///
/// let hello = RouteHandler::per_method()
///     .get(|_req, _res| Ok(json!({ "hello": "from get" }).into()))
///     .post(|_req, _res| Ok(json!({ "hello": "from post" }).into()))
///     .methods([Method::GET, Method::POST])
///     .content_type(ContentType::Json);
/// ```
#[derive(Clone)]
pub struct RouteHandler {
    pub(crate) kind: HandlerKind,
    /// Allowed methods; `None` accepts any method
    pub(crate) methods: Option<Vec<Method>>,
    pub(crate) headers: Vec<(Arc<str>, String)>,
    pub(crate) cors: Option<String>,
    pub(crate) content_type: ContentType,
    pub(crate) on_request: Option<RequestHook>,
    pub(crate) on_error: Option<ErrorHook>,
}

impl RouteHandler {
    fn with_kind(kind: HandlerKind) -> Self {
        Self {
            kind,
            methods: None,
            headers: Vec::new(),
            cors: None,
            content_type: ContentType::default(),
            on_request: None,
            on_error: None,
        }
    }

    /// A route served by one function for every method.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&HandlerRequest, &mut ResponseEnvelope) -> HandlerResult + Send + Sync + 'static,
    {
        Self::with_kind(HandlerKind::Single(Arc::new(handler)))
    }

    /// A route with one function per method; add entries with [`Self::on`].
    #[must_use]
    pub fn per_method() -> Self {
        Self::with_kind(HandlerKind::PerMethod(Vec::new()))
    }

    /// Add (or replace) the function for `method`.
    ///
    /// Turns a single-function route into a per-method one.
    #[must_use]
    pub fn on<F>(mut self, method: Method, handler: F) -> Self
    where
        F: Fn(&HandlerRequest, &mut ResponseEnvelope) -> HandlerResult + Send + Sync + 'static,
    {
        let handler: HandlerFn = Arc::new(handler);
        match &mut self.kind {
            HandlerKind::PerMethod(table) => {
                table.retain(|(m, _)| *m != method);
                table.push((method, handler));
            }
            HandlerKind::Single(_) => {
                self.kind = HandlerKind::PerMethod(vec![(method, handler)]);
            }
        }
        self
    }

    #[must_use]
    pub fn get<F>(self, handler: F) -> Self
    where
        F: Fn(&HandlerRequest, &mut ResponseEnvelope) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(Method::GET, handler)
    }

    #[must_use]
    pub fn post<F>(self, handler: F) -> Self
    where
        F: Fn(&HandlerRequest, &mut ResponseEnvelope) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(Method::POST, handler)
    }

    #[must_use]
    pub fn put<F>(self, handler: F) -> Self
    where
        F: Fn(&HandlerRequest, &mut ResponseEnvelope) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(Method::PUT, handler)
    }

    #[must_use]
    pub fn delete<F>(self, handler: F) -> Self
    where
        F: Fn(&HandlerRequest, &mut ResponseEnvelope) -> HandlerResult + Send + Sync + 'static,
    {
        self.on(Method::DELETE, handler)
    }

    /// Accept only `method`.
    #[must_use]
    pub fn method(self, method: Method) -> Self {
        self.methods([method])
    }

    /// Accept only the given methods.
    #[must_use]
    pub fn methods<I: IntoIterator<Item = Method>>(mut self, methods: I) -> Self {
        self.methods = Some(methods.into_iter().collect());
        self
    }

    /// Add a custom response header.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((Arc::from(name), value.to_string()));
        self
    }

    /// Emit `Access-Control-Allow-Origin: <origin>`.
    #[must_use]
    pub fn cors(mut self, origin: &str) -> Self {
        self.cors = Some(origin.to_string());
        self
    }

    #[must_use]
    pub fn content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    #[must_use]
    pub fn on_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(&HandlerRequest, &mut ResponseEnvelope) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_request = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&DispatchError, &HandlerRequest, &mut ResponseEnvelope) -> Option<Body>
            + Send
            + Sync
            + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }

    /// Declared content type.
    #[must_use]
    pub fn declared_content_type(&self) -> &ContentType {
        &self.content_type
    }

    /// Declared allow-set, if any.
    #[must_use]
    pub fn allowed_methods(&self) -> Option<&[Method]> {
        self.methods.as_deref()
    }

    /// Headers every response of this route carries, in the order the
    /// dispatcher applies them.
    pub fn declared_headers(&self) -> impl Iterator<Item = (&str, &str)> {
        let origin = self
            .cors
            .as_deref()
            .map(|origin| ("access-control-allow-origin", origin));
        std::iter::once(("content-type", self.content_type.mime()))
            .chain(
                self.headers
                    .iter()
                    .map(|(name, value)| (name.as_ref(), value.as_str())),
            )
            .chain(origin)
    }

    /// Check the declared metadata once, at registration.
    pub(crate) fn validate(&self, url: &str) -> Result<(), RegistryError> {
        if let HandlerKind::PerMethod(table) = &self.kind {
            if table.is_empty() {
                return Err(RegistryError::EmptyMethodTable {
                    url: url.to_string(),
                });
            }
        }
        if let Some(methods) = &self.methods {
            if methods.is_empty() {
                return Err(RegistryError::EmptyMethodSet {
                    url: url.to_string(),
                });
            }
            if let HandlerKind::PerMethod(table) = &self.kind {
                for method in methods {
                    if !table.iter().any(|(m, _)| m == method) {
                        warn!(
                            url = %url,
                            method = %method,
                            "Allowed method has no per-method handler"
                        );
                    }
                }
            }
        }

        for (name, value) in self.declared_headers() {
            if HeaderName::from_bytes(name.as_bytes()).is_err()
                || HeaderValue::from_str(value).is_err()
            {
                return Err(RegistryError::InvalidHeader {
                    url: url.to_string(),
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Reject `method` if an allow-set is declared and does not contain it.
    pub(crate) fn check_method(&self, method: &Method) -> Result<(), DispatchError> {
        match &self.methods {
            Some(allowed) if !allowed.contains(method) => Err(DispatchError::MethodNotAllowed {
                method: method.clone(),
                allowed: allowed.clone(),
            }),
            _ => Ok(()),
        }
    }

    /// Pick the function that serves `method`.
    pub(crate) fn select(&self, method: &Method) -> Result<&HandlerFn, DispatchError> {
        match &self.kind {
            HandlerKind::Single(handler) => Ok(handler),
            HandlerKind::PerMethod(table) => table
                .iter()
                .find(|(m, _)| m == method)
                .map(|(_, handler)| handler)
                .ok_or_else(|| DispatchError::MethodNotAllowed {
                    method: method.clone(),
                    allowed: table.iter().map(|(m, _)| m.clone()).collect(),
                }),
        }
    }
}

impl fmt::Debug for RouteHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            HandlerKind::Single(_) => "single".to_string(),
            HandlerKind::PerMethod(table) => {
                let methods: Vec<&str> = table.iter().map(|(m, _)| m.as_str()).collect();
                format!("per-method [{}]", methods.join(", "))
            }
        };
        f.debug_struct("RouteHandler")
            .field("kind", &kind)
            .field("methods", &self.methods)
            .field("headers", &self.headers)
            .field("cors", &self.cors)
            .field("content_type", &self.content_type)
            .field("on_request", &self.on_request.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(_req: &HandlerRequest, _res: &mut ResponseEnvelope) -> HandlerResult {
        Ok(Body::from("ok"))
    }

    #[test]
    fn test_request_splits_query() {
        let req = HandlerRequest::new(Method::GET, "/search?q=rust%20lang&page=2");
        assert_eq!(req.path, "/search");
        assert_eq!(req.get_query_param("q"), Some("rust lang"));
        assert_eq!(req.get_query_param("page"), Some("2"));
        assert_eq!(req.url, "/search?q=rust%20lang&page=2");
    }

    #[test]
    fn test_content_type_parse_and_mime() {
        assert_eq!("json".parse::<ContentType>().unwrap(), ContentType::Json);
        assert_eq!(ContentType::default().mime(), "text/plain");
        assert_eq!(ContentType::Html.mime(), "text/html");
        let custom: ContentType = "application/xml".parse().unwrap();
        assert_eq!(custom.mime(), "application/xml");
    }

    #[test]
    fn test_on_converts_single_to_per_method() {
        let handler = RouteHandler::new(ok).on(Method::PATCH, ok);
        assert!(handler.select(&Method::PATCH).is_ok());
        assert!(handler.select(&Method::GET).is_err());
    }

    #[test]
    fn test_validate_rejects_empty_table_and_set() {
        let err = RouteHandler::per_method().validate("/x").unwrap_err();
        assert_eq!(err, RegistryError::EmptyMethodTable { url: "/x".into() });

        let err = RouteHandler::new(ok)
            .methods(Vec::new())
            .validate("/x")
            .unwrap_err();
        assert_eq!(err, RegistryError::EmptyMethodSet { url: "/x".into() });
    }

    #[test]
    fn test_validate_rejects_invalid_header() {
        let err = RouteHandler::new(ok)
            .header("bad header", "v")
            .validate("/x")
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidHeader { .. }));

        let err = RouteHandler::new(ok)
            .cors("bad\norigin")
            .validate("/x")
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidHeader { .. }));
    }

    #[test]
    fn test_check_method() {
        let handler = RouteHandler::new(ok).methods([Method::GET, Method::POST]);
        assert!(handler.check_method(&Method::GET).is_ok());
        assert!(handler.check_method(&Method::POST).is_ok());
        assert!(matches!(
            handler.check_method(&Method::DELETE),
            Err(DispatchError::MethodNotAllowed { .. })
        ));
        assert!(RouteHandler::new(ok).check_method(&Method::DELETE).is_ok());
    }
}
