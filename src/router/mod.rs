//! # Router Module
//!
//! Path matching and route resolution for routes discovered on disk.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Grouping scanned route files by glob (`/list/[id]` -> `/list/*`)
//! - Ranking wildcard globs by specificity, once, at startup
//! - Matching incoming request paths and extracting decoded parameters
//!
//! ## Architecture
//!
//! The router uses a two-phase approach:
//!
//! 1. **Compilation**: At startup every wildcard glob is compiled into an
//!    anchored regex where each `*` captures one path segment
//!    (`[A-Za-z0-9_%-]+`). Static globs are indexed for exact lookup.
//!
//! 2. **Matching**: A request path is first looked up verbatim among the
//!    static globs. Otherwise the wildcard globs are tried most specific
//!    first, so `/list/item-*` is preferred over `/list/*` regardless of the
//!    order in which files were found.
//!
//! ## Example
//!
//! ```rust,ignore
//! use fsrouter::router::Router;
//! use std::path::Path;
//!
//! let router = Router::from_dir(Path::new("routes"), &["rs".to_string()])?;
//! if let Some(m) = router.route("/v1/list/item-42") {
//!     println!("Route: {}", m.route.url);
//!     println!("itemId: {:?}", m.get_path_param("itemId"));
//! }
//! ```

mod core;
mod table;

pub use core::{ParamVec, RouteMatch, Router, MAX_INLINE_PARAMS};
pub use table::{compare_specificity, glob_of, Candidate, GlobEntry, RouteTable, WILDCARD};
