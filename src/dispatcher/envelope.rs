use serde_json::Value;
use smallvec::SmallVec;
use std::fmt;
use std::io::{self, Read};
use std::sync::Arc;

/// Maximum inline headers before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Ordered header multimap. Names are `Arc<str>` because most of them are
/// repeated on every response of a route (content type, CORS, custom headers).
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Status of an envelope nobody has resolved yet.
pub const UNRESOLVED_STATUS: u16 = 503;

/// Response body produced by a handler or an error hook.
#[derive(Default)]
pub enum Body {
    #[default]
    Empty,
    Text(String),
    Bytes(Vec<u8>),
    /// Structured value; serialized when the response is written
    Json(Value),
    /// Open reader drained when the response is written
    Stream(Box<dyn Read + Send>),
}

impl Body {
    /// Wrap a reader as a streaming body.
    pub fn stream<R: Read + Send + 'static>(reader: R) -> Self {
        Body::Stream(Box::new(reader))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Body::Empty => true,
            Body::Text(s) => s.is_empty(),
            Body::Bytes(b) => b.is_empty(),
            Body::Json(_) | Body::Stream(_) => false,
        }
    }

    /// Text content, if the body is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Body::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Serialize a keyed JSON structure into a text body when `serialize`
    /// is set. Strings, bytes, streams and non-object values are untouched.
    #[must_use]
    pub fn finalize(self, serialize: bool) -> Self {
        match self {
            Body::Json(value @ Value::Object(_)) if serialize => Body::Text(value.to_string()),
            other => other,
        }
    }

    /// Consume the body into wire bytes.
    ///
    /// # Errors
    ///
    /// Returns the reader's error if a stream body fails while draining.
    pub fn into_bytes(self) -> io::Result<Vec<u8>> {
        match self {
            Body::Empty => Ok(Vec::new()),
            Body::Text(s) => Ok(s.into_bytes()),
            Body::Bytes(b) => Ok(b),
            Body::Json(value) => Ok(value.to_string().into_bytes()),
            Body::Stream(mut reader) => {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf)?;
                Ok(buf)
            }
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => f.write_str("Empty"),
            Body::Text(s) => f.debug_tuple("Text").field(s).finish(),
            Body::Bytes(b) => write!(f, "Bytes({} bytes)", b.len()),
            Body::Json(v) => f.debug_tuple("Json").field(v).finish(),
            Body::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Body::Text(s.to_string())
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Body::Text(s)
    }
}

impl From<Vec<u8>> for Body {
    fn from(b: Vec<u8>) -> Self {
        Body::Bytes(b)
    }
}

impl From<Value> for Body {
    fn from(v: Value) -> Self {
        Body::Json(v)
    }
}

impl From<()> for Body {
    fn from((): ()) -> Self {
        Body::Empty
    }
}

/// Response being assembled for one request.
///
/// Starts at [`UNRESOLVED_STATUS`] with no headers and an empty body.
#[derive(Debug)]
pub struct ResponseEnvelope {
    /// Response headers in insertion order
    pub headers: HeaderVec,
    status: u16,
    status_set: bool,
    pub body: Body,
}

impl Default for ResponseEnvelope {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseEnvelope {
    #[must_use]
    pub fn new() -> Self {
        Self {
            headers: HeaderVec::new(),
            status: UNRESOLVED_STATUS,
            status_set: false,
            body: Body::Empty,
        }
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, code: u16) {
        self.status = code;
        self.status_set = true;
    }

    /// Whether anyone has called [`ResponseEnvelope::set_status`], including
    /// with the unresolved default.
    #[must_use]
    pub fn is_status_set(&self) -> bool {
        self.status_set
    }

    /// Get a header by name (case-insensitive)
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header (case-insensitive name match).
    ///
    /// The listener only accepts header lines that live for the whole
    /// process, so each distinct `name: value` line is kept once and reused.
    /// Lines declared on a route are reserved at startup. Lines built per
    /// request (a `Location` or `ETag` carrying an id) share a budget of
    /// 4096 distinct lines; once it is spent, new lines are dropped from the
    /// wire with a warning. Prefer the body for values unique per request.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value.into()));
    }

    /// Set a header whose name is shared with the route configuration
    pub(crate) fn set_shared_header(&mut self, name: &Arc<str>, value: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::clone(name), value.to_string()));
    }

    /// Append a header, keeping existing values with the same name
    pub fn append_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.push((Arc::from(name), value.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_starts_unresolved() {
        let mut res = ResponseEnvelope::new();
        assert_eq!(res.status(), 503);
        assert!(!res.is_status_set());
        res.set_status(503);
        assert!(res.is_status_set());
        let res = ResponseEnvelope::new();
        assert!(res.body.is_empty());
        assert!(res.headers.is_empty());
    }

    #[test]
    fn test_set_header_replaces_case_insensitively() {
        let mut res = ResponseEnvelope::new();
        res.set_header("Content-Type", "text/plain");
        res.set_header("content-type", "application/json");
        assert_eq!(res.headers.len(), 1);
        assert_eq!(res.get_header("CONTENT-TYPE"), Some("application/json"));

        res.append_header("set-thing", "a");
        res.append_header("set-thing", "b");
        assert_eq!(res.headers.len(), 3);
    }

    #[test]
    fn test_finalize_serializes_objects_only() {
        let body = Body::Json(json!({"hello": "world"})).finalize(true);
        assert_eq!(body.as_text(), Some(r#"{"hello":"world"}"#));

        let body = Body::Json(json!({"hello": "world"})).finalize(false);
        assert!(matches!(body, Body::Json(_)));

        let body = Body::Json(json!([1, 2])).finalize(true);
        assert!(matches!(body, Body::Json(_)));

        let body = Body::from("plain").finalize(true);
        assert_eq!(body.as_text(), Some("plain"));
    }

    #[test]
    fn test_stream_body_drains() {
        let body = Body::stream(std::io::Cursor::new(b"chunked".to_vec()));
        assert!(!body.is_empty());
        assert_eq!(body.into_bytes().unwrap(), b"chunked");
    }
}
