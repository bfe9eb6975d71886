//! Router core module - hot path for request routing.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]
#![deny(clippy::unnecessary_to_owned)]

use crate::error::RouterError;
use crate::scanner::{self, RouteFile};
use smallvec::SmallVec;
use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::table::RouteTable;

/// Maximum number of path parameters before heap allocation.
/// Most routes have ≤4 dynamic segments (e.g. `/[org]/[repo]/issues/[id]`).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the hot path.
///
/// Param names are `Arc<str>` shared with the route table (known at startup);
/// values are per-request data decoded from the URL.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Result of successfully matching a request path to a route.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// The matched route file
    pub route: Arc<RouteFile>,
    /// Glob the route was matched through (e.g. `/list/item-*`)
    pub glob: Arc<str>,
    /// Percent-decoded parameter values in declaration order
    pub path_params: ParamVec,
}

impl RouteMatch {
    /// Get a path parameter by name
    ///
    /// Uses "last write wins" semantics: if a name is declared twice
    /// (`/[id]/child/[id]`), returns the last occurrence.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Convert path_params to a HashMap
    /// Note: This allocates - use get_path_param() in hot paths instead
    #[must_use]
    pub fn path_params_map(&self) -> HashMap<String, String> {
        self.path_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

/// Percent-decode one captured segment. Captures that do not decode to
/// UTF-8 are kept verbatim.
fn decode_segment(raw: &str) -> String {
    urlencoding::decode(raw).map_or_else(|_| raw.to_owned(), Cow::into_owned)
}

/// Router that matches request paths against the grouped route table.
///
/// Built once at startup and shared read-only between requests.
#[derive(Debug, Clone)]
pub struct Router {
    table: RouteTable,
}

impl Router {
    /// Create a router from scanned route files.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::Pattern`] if a glob cannot be compiled.
    pub fn new(routes: Vec<RouteFile>) -> Result<Self, RouterError> {
        let table = RouteTable::group(routes)?;

        let routes_summary: Vec<&str> = table.entries().take(10).map(|e| &*e.glob).collect();
        info!(
            globs_count = table.len(),
            routes_count = table.routes().count(),
            routes_summary = ?routes_summary,
            "Routing table loaded"
        );

        Ok(Self { table })
    }

    /// Scan `root` and build a router from what was found.
    ///
    /// # Errors
    ///
    /// Propagates every scanner error; all of them are fatal at startup.
    pub fn from_dir(root: &Path, extensions: &[String]) -> Result<Self, RouterError> {
        Self::new(scanner::scan(root, extensions)?)
    }

    /// The grouped route table.
    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// One line per candidate route, in grouping order.
    #[must_use]
    pub fn describe_routes(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.table.len() + 1);
        lines.push(format!("[routes] count={}", self.table.routes().count()));
        for entry in self.table.entries() {
            for candidate in &entry.candidates {
                lines.push(format!(
                    "[route] {} -> {} params={:?}",
                    entry.glob,
                    candidate.route.path.display(),
                    candidate.route.params
                ));
            }
        }
        lines
    }

    /// Match a request path (without query string) to a route.
    ///
    /// 1. A static glob equal to `path` wins immediately with no params.
    /// 2. Wildcard globs are tried most specific first; the first whose
    ///    expression matches and which has a candidate with the right
    ///    parameter count wins.
    /// 3. Captures are zipped with the winner's parameter names and
    ///    percent-decoded.
    ///
    /// Returns `None` when nothing matches.
    #[must_use]
    pub fn route(&self, path: &str) -> Option<RouteMatch> {
        let match_start = Instant::now();

        if let Some(entry) = self.table.exact(path) {
            if let Some(winner) = entry.winner() {
                debug!(path = %path, url = %winner.route.url, "Route matched exactly");
                return Some(RouteMatch {
                    route: Arc::clone(&winner.route),
                    glob: Arc::clone(&entry.glob),
                    path_params: ParamVec::new(),
                });
            }
        }

        for entry in self.table.ranked() {
            let Some(pattern) = &entry.pattern else {
                continue;
            };
            let Some(captures) = pattern.captures(path) else {
                continue;
            };
            let Some(winner) = entry.winner() else {
                continue;
            };

            let path_params: ParamVec = winner
                .names
                .iter()
                .zip(captures.iter().skip(1))
                .map(|(name, cap)| {
                    (
                        Arc::clone(name),
                        decode_segment(cap.map_or("", |m| m.as_str())),
                    )
                })
                .collect();

            let match_duration = match_start.elapsed();
            if match_duration > Duration::from_millis(1) {
                warn!(
                    path = %path,
                    glob = %entry.glob,
                    url = %winner.route.url,
                    duration_us = match_duration.as_micros(),
                    "Slow route matching detected"
                );
            } else {
                debug!(
                    path = %path,
                    glob = %entry.glob,
                    url = %winner.route.url,
                    path_params = ?path_params,
                    duration_us = match_duration.as_micros(),
                    "Route matched"
                );
            }

            return Some(RouteMatch {
                route: Arc::clone(&winner.route),
                glob: Arc::clone(&entry.glob),
                path_params,
            });
        }

        debug!(
            path = %path,
            duration_us = match_start.elapsed().as_micros(),
            "No route matched"
        );
        None
    }
}
