//! # CLI Module
//!
//! Command line for inspecting and serving a routes directory.
//!
//! ## Commands
//!
//! ### `routes`
//!
//! Scan a routes tree and print every glob with its candidate files and
//! parameter names:
//!
//! ```bash
//! fsrouter routes --routes demos/basic/routes
//! ```
//!
//! ### `serve`
//!
//! Serve a routes tree with the echo handler bound to every route. Useful to
//! check what a directory layout matches before writing handlers:
//!
//! ```bash
//! fsrouter serve --routes demos/basic/routes --addr 127.0.0.1:8888
//! fsrouter serve --config fsrouter.yaml
//! ```
//!
//! `--routes` and `--addr` override the config file, which in turn is
//! overridden by `FSR_*` environment variables.

mod commands;


pub use commands::{run, run_cli, Cli, Commands};
