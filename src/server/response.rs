use crate::dispatcher::{Dispatcher, ResponseEnvelope};
use http::{HeaderName, HeaderValue, StatusCode};
use may_minihttp::Response;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, error, warn};

/// Headers `may_minihttp` holds per response
pub const MAX_RESPONSE_HEADERS: usize = 16;

/// Distinct header lines built at request time that are kept for the life
/// of the process. Lines declared on routes do not count.
pub const MAX_DYNAMIC_HEADER_LINES: usize = 4096;

/// `may_minihttp` only takes `&'static str` header lines, so each distinct
/// line is leaked once and reused afterwards.
struct HeaderLineCache {
    lines: HashSet<&'static str>,
    dynamic: usize,
    dynamic_limit: usize,
}

impl HeaderLineCache {
    fn new(dynamic_limit: usize) -> Self {
        Self {
            lines: HashSet::new(),
            dynamic: 0,
            dynamic_limit,
        }
    }

    fn leak(&mut self, line: String) -> &'static str {
        let leaked: &'static str = Box::leak(line.into_boxed_str());
        self.lines.insert(leaked);
        leaked
    }

    /// Keep a route-declared line without touching the dynamic budget.
    fn reserve(&mut self, line: String) -> &'static str {
        match self.lines.get(line.as_str()) {
            Some(known) => known,
            None => self.leak(line),
        }
    }

    /// Look up or keep a line built at request time; `None` once the
    /// dynamic budget is spent.
    fn intern(&mut self, line: String) -> Option<&'static str> {
        if let Some(known) = self.lines.get(line.as_str()) {
            return Some(known);
        }
        if self.dynamic >= self.dynamic_limit {
            return None;
        }
        self.dynamic += 1;
        Some(self.leak(line))
    }
}

static HEADER_LINES: Lazy<Mutex<HeaderLineCache>> =
    Lazy::new(|| Mutex::new(HeaderLineCache::new(MAX_DYNAMIC_HEADER_LINES)));

static DYNAMIC_BUDGET_SPENT: AtomicBool = AtomicBool::new(false);

fn header_lines() -> MutexGuard<'static, HeaderLineCache> {
    match HEADER_LINES.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Keep the header lines every bound route declares (content type, custom
/// headers, CORS origin) so they are written whatever the request traffic
/// did to the dynamic budget.
pub fn reserve_route_headers(dispatcher: &Dispatcher) {
    let mut cache = header_lines();
    let before = cache.lines.len();
    for handler in dispatcher.handlers() {
        for (name, value) in handler.declared_headers() {
            cache.reserve(format!("{name}: {value}"));
        }
    }
    debug!(
        reserved = cache.lines.len() - before,
        "Route header lines reserved"
    );
}

fn intern_header_line(line: String) -> Option<&'static str> {
    let interned = header_lines().intern(line);
    if interned.is_none() {
        if DYNAMIC_BUDGET_SPENT.swap(true, Ordering::Relaxed) {
            debug!("Dynamic header line dropped");
        } else {
            warn!(
                limit = MAX_DYNAMIC_HEADER_LINES,
                "Dynamic header line budget spent, new per-request header lines are dropped"
            );
        }
    }
    interned
}

/// Reason phrase for a status code.
#[must_use]
pub fn status_reason(status: u16) -> &'static str {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("Unknown")
}

/// Write a status line with no body.
pub fn write_status(res: &mut Response, status: u16) {
    res.status_code(usize::from(status), status_reason(status));
}

/// Serialize an envelope into a `may_minihttp` response.
///
/// `Content-Length` is computed by the listener; a handler-set one is
/// dropped. Headers that are not valid HTTP are skipped with a warning.
pub fn write_envelope(res: &mut Response, envelope: ResponseEnvelope) {
    let status = envelope.status();
    write_status(res, status);

    let mut written = 0;
    for (name, value) in &envelope.headers {
        if name.eq_ignore_ascii_case("content-length") {
            continue;
        }
        if HeaderName::from_bytes(name.as_bytes()).is_err()
            || HeaderValue::from_str(value).is_err()
        {
            warn!(header = %name, "Skipping invalid response header");
            continue;
        }
        if written == MAX_RESPONSE_HEADERS {
            warn!(header = %name, limit = MAX_RESPONSE_HEADERS, "Response header limit reached");
            continue;
        }
        if let Some(line) = intern_header_line(format!("{name}: {value}")) {
            res.header(line);
            written += 1;
        }
    }

    match envelope.body.into_bytes() {
        Ok(bytes) => {
            res.body_vec(bytes);
        }
        Err(err) => {
            error!(status, error = %err, "Failed to drain response body stream");
            res.body_vec(Vec::new());
        }
    }
}
