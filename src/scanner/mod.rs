//! # Scanner Module
//!
//! Discovers route files below a routes root directory and derives, for each
//! one, the logical URL and the ordered list of dynamic parameter names.
//!
//! ## Layout Convention
//!
//! ```text
//! routes/
//! ├── v1/
//! │   ├── hello.rs              -> /v1/hello
//! │   ├── dynamic/[id].rs       -> /v1/dynamic/[id]        params: [id]
//! │   ├── dynamic/[slug]/[id].rs-> /v1/dynamic/[slug]/[id] params: [slug, id]
//! │   └── list/item-[itemId].rs -> /v1/list/item-[itemId]  params: [itemId]
//! ```
//!
//! A segment in square brackets is a dynamic capture named by the bracket's
//! interior text. A literal prefix may share the segment with a capture
//! (`item-[itemId]`). Brackets do not nest.
//!
//! Scanning happens once at startup. A missing root or an empty scan is a
//! fatal [`RouterError`](crate::error::RouterError).

mod core;

pub use core::{bracket_params, scan, RouteFile, BRACKET_SEGMENT, DEFAULT_EXTENSIONS};
