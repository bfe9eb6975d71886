//! Route grouping: glob derivation, specificity ranking and pattern compilation.
//!
//! Runs once at startup. The resulting [`RouteTable`] is never mutated.

use crate::error::RouterError;
use crate::scanner::{RouteFile, BRACKET_SEGMENT};
use regex::Regex;
use smallvec::SmallVec;
use std::cmp::{Ordering, Reverse};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::core::MAX_INLINE_PARAMS;

/// Wildcard marker substituted for every bracketed segment.
pub const WILDCARD: char = '*';

/// Capture for one path segment's worth of characters.
const SEGMENT_CAPTURE: &str = "([A-Za-z0-9_%-]+)";

/// Replace every bracketed segment of `url` with the wildcard marker.
///
/// `/list/item-[itemId]` becomes `/list/item-*`.
#[must_use]
pub fn glob_of(url: &str) -> String {
    BRACKET_SEGMENT.replace_all(url, "*").into_owned()
}

/// Build the anchored matching expression for a glob.
///
/// Literal parts are escaped; every `*` becomes a single-segment capture.
pub(crate) fn compile_glob(glob: &str) -> Result<Regex, RouterError> {
    let mut pattern = String::with_capacity(glob.len() + 2 + SEGMENT_CAPTURE.len());
    pattern.push('^');
    for (i, literal) in glob.split(WILDCARD).enumerate() {
        if i > 0 {
            pattern.push_str(SEGMENT_CAPTURE);
        }
        pattern.push_str(&regex::escape(literal));
    }
    pattern.push('$');
    Regex::new(&pattern).map_err(|source| RouterError::Pattern {
        glob: glob.to_string(),
        source,
    })
}

/// How specific one glob segment is. Declaration order is rank order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum SegmentKind {
    Literal,
    /// Literal text combined with a wildcard; more literal chars rank first
    Mixed(Reverse<usize>),
    Wildcard,
}

fn segment_kinds(glob: &str) -> SmallVec<[SegmentKind; 8]> {
    glob.split('/')
        .filter(|s| !s.is_empty())
        .map(|segment| {
            if !segment.contains(WILDCARD) {
                SegmentKind::Literal
            } else if segment.chars().all(|c| c == WILDCARD) {
                SegmentKind::Wildcard
            } else {
                let literal = segment.chars().filter(|&c| c != WILDCARD).count();
                SegmentKind::Mixed(Reverse(literal))
            }
        })
        .collect()
}

/// Order two globs by specificity: the more specific glob sorts first.
///
/// Segments are compared left to right (literal, then mixed with the longer
/// literal part, then bare wildcard). Ties go to the glob with more segments,
/// then to lexicographic order.
#[must_use]
pub fn compare_specificity(a: &str, b: &str) -> Ordering {
    let (ka, kb) = (segment_kinds(a), segment_kinds(b));
    ka.iter()
        .zip(kb.iter())
        .map(|(x, y)| x.cmp(y))
        .find(|o| o.is_ne())
        .unwrap_or_else(|| kb.len().cmp(&ka.len()))
        .then_with(|| a.cmp(b))
}

/// A route file plus its parameter names, shared with every match.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub route: Arc<RouteFile>,
    pub(crate) names: SmallVec<[Arc<str>; MAX_INLINE_PARAMS]>,
}

impl Candidate {
    fn new(route: RouteFile) -> Self {
        let names = route.params.iter().map(|p| Arc::from(p.as_str())).collect();
        Self {
            route: Arc::new(route),
            names,
        }
    }
}

/// All route files sharing one glob, in grouping order.
#[derive(Debug, Clone)]
pub struct GlobEntry {
    pub glob: Arc<str>,
    /// Number of wildcard markers in the glob
    pub wildcards: usize,
    /// Compiled expression; `None` for static globs (exact lookup only)
    pub(crate) pattern: Option<Regex>,
    pub candidates: Vec<Candidate>,
}

impl GlobEntry {
    /// Winning candidate: the last one whose parameter count equals the
    /// wildcard count.
    #[must_use]
    pub fn winner(&self) -> Option<&Candidate> {
        self.candidates
            .iter()
            .rev()
            .find(|c| c.route.params.len() == self.wildcards)
    }
}

/// Immutable mapping from glob to candidate route files.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: Vec<GlobEntry>,
    /// glob -> index into `entries`
    index: HashMap<Arc<str>, usize>,
    /// Indices of wildcard globs, most specific first
    ranked: Vec<usize>,
}

impl RouteTable {
    /// Group route files by glob and rank the wildcard globs.
    ///
    /// Append order inside a glob is the order of `routes`.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::Pattern`] if a glob cannot be compiled.
    pub fn group(routes: Vec<RouteFile>) -> Result<Self, RouterError> {
        let mut entries: Vec<GlobEntry> = Vec::new();
        let mut index: HashMap<Arc<str>, usize> = HashMap::new();

        for route in routes {
            let glob = glob_of(&route.url);
            let slot = match index.get(glob.as_str()) {
                Some(&slot) => slot,
                None => {
                    let wildcards = glob.matches(WILDCARD).count();
                    let pattern = if wildcards > 0 {
                        Some(compile_glob(&glob)?)
                    } else {
                        None
                    };
                    let glob: Arc<str> = Arc::from(glob);
                    entries.push(GlobEntry {
                        glob: Arc::clone(&glob),
                        wildcards,
                        pattern,
                        candidates: Vec::new(),
                    });
                    index.insert(glob, entries.len() - 1);
                    entries.len() - 1
                }
            };
            debug!(glob = %entries[slot].glob, url = %route.url, "Route grouped");
            entries[slot].candidates.push(Candidate::new(route));
        }

        for entry in &entries {
            let eligible: Vec<&str> = entry
                .candidates
                .iter()
                .filter(|c| c.route.params.len() == entry.wildcards)
                .map(|c| c.route.url.as_str())
                .collect();
            if eligible.len() > 1 {
                warn!(
                    glob = %entry.glob,
                    routes = ?eligible,
                    winner = eligible.last().copied().unwrap_or_default(),
                    "Routes share a glob; the last one shadows the others"
                );
            }
        }

        let mut ranked: Vec<usize> = (0..entries.len())
            .filter(|&i| entries[i].wildcards > 0)
            .collect();
        ranked.sort_by(|&a, &b| compare_specificity(&entries[a].glob, &entries[b].glob));

        Ok(Self {
            entries,
            index,
            ranked,
        })
    }

    /// Entry for an exact glob key.
    #[must_use]
    pub fn get(&self, glob: &str) -> Option<&GlobEntry> {
        self.index.get(glob).map(|&i| &self.entries[i])
    }

    /// Static entry whose glob equals `path` verbatim.
    pub(crate) fn exact(&self, path: &str) -> Option<&GlobEntry> {
        self.get(path).filter(|e| e.wildcards == 0)
    }

    /// Wildcard entries, most specific first.
    pub fn ranked(&self) -> impl Iterator<Item = &GlobEntry> {
        self.ranked.iter().map(move |&i| &self.entries[i])
    }

    /// Every entry in grouping order.
    pub fn entries(&self) -> impl Iterator<Item = &GlobEntry> {
        self.entries.iter()
    }

    /// Every route file in grouping order.
    pub fn routes(&self) -> impl Iterator<Item = &Arc<RouteFile>> {
        self.entries
            .iter()
            .flat_map(|e| e.candidates.iter().map(|c| &c.route))
    }

    /// Number of distinct globs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
