//! Demo application: the routes tree under `routes/` served with compiled
//! handlers.

pub mod registry;

use std::path::PathBuf;

/// The demo's routes tree, independent of the working directory.
#[must_use]
pub fn routes_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("routes")
}
