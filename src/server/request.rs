use crate::dispatcher::HandlerRequest;
use crate::ids::{RequestId, REQUEST_ID_HEADER};
use http::Method;
use may_minihttp::Request;
use std::fmt;
use std::io::{self, Read};
use std::sync::Arc;
use tracing::debug;

/// Why a raw request could not be turned into a [`HandlerRequest`].
#[derive(Debug)]
pub enum RequestError {
    /// Method token rejected by `http::Method`
    InvalidMethod(String),
    /// Body could not be read from the connection
    Body(io::Error),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::InvalidMethod(method) => write!(f, "invalid http method {method:?}"),
            RequestError::Body(err) => write!(f, "failed to read request body: {err}"),
        }
    }
}

impl std::error::Error for RequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RequestError::Body(err) => Some(err),
            RequestError::InvalidMethod(_) => None,
        }
    }
}

/// Extract a [`HandlerRequest`] from a `may_minihttp::Request`.
///
/// Header names are lowercased. The request id comes from `x-request-id`
/// when it holds a valid ULID and is generated otherwise.
///
/// # Errors
///
/// Fails on a method that is not a valid HTTP token, or when the body
/// cannot be read.
pub fn parse_request(req: Request) -> Result<HandlerRequest, RequestError> {
    let method = Method::from_bytes(req.method().as_bytes())
        .map_err(|_| RequestError::InvalidMethod(req.method().to_string()))?;
    let mut request = HandlerRequest::new(method, req.path());

    for header in req.headers() {
        request.headers.push((
            Arc::from(header.name.to_ascii_lowercase().as_str()),
            String::from_utf8_lossy(header.value).into_owned(),
        ));
    }
    request.request_id = RequestId::from_header_or_new(request.get_header(REQUEST_ID_HEADER));

    let mut body = Vec::new();
    req.body()
        .read_to_end(&mut body)
        .map_err(RequestError::Body)?;
    request.body = body;

    debug!(
        request_id = %request.request_id,
        method = %request.method,
        path = %request.path,
        header_count = request.headers.len(),
        query_count = request.query_params.len(),
        body_size_bytes = request.body.len(),
        "HTTP request parsed"
    );
    Ok(request)
}
