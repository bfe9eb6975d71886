//! Error types for route discovery, handler registration and dispatch.
//!
//! Startup failures ([`RouterError`], [`RegistryError`]) are fatal: the binary
//! logs them and exits. Per-request failures ([`DispatchError`]) never leave
//! the dispatcher; they are converted into a response envelope.

use http::Method;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Fatal startup error raised while building the route table or binding handlers.
#[derive(Debug)]
pub enum RouterError {
    /// The configured routes root does not exist or is not a directory.
    RoutesDirectoryMissing {
        /// The directory that was looked up
        root: PathBuf,
    },
    /// The routes root exists but contains no file with a handler extension.
    NoRoutesFound {
        /// The directory that was scanned
        root: PathBuf,
        /// Extensions that were accepted
        extensions: Vec<String>,
    },
    /// A discovered route has no handler registered for it.
    UnboundRoute {
        /// Route identifier (the derived url, e.g. `/list/[id]`)
        url: String,
    },
    /// A glob could not be compiled into a matching expression.
    Pattern {
        glob: String,
        source: regex::Error,
    },
    /// Walking the routes directory failed.
    Io {
        path: PathBuf,
        source: io::Error,
    },
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouterError::RoutesDirectoryMissing { root } => {
                write!(f, "`{}` directory not found", root.display())
            }
            RouterError::NoRoutesFound { root, extensions } => write!(
                f,
                "no route files found under `{}` (extensions: {})",
                root.display(),
                extensions.join(", ")
            ),
            RouterError::UnboundRoute { url } => {
                write!(f, "no handler registered for route `{url}`")
            }
            RouterError::Pattern { glob, source } => {
                write!(f, "invalid route pattern `{glob}`: {source}")
            }
            RouterError::Io { path, source } => {
                write!(f, "failed to read `{}`: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for RouterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RouterError::Pattern { source, .. } => Some(source),
            RouterError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Handler registration rejected during validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A per-method handler table was registered without any method entry.
    EmptyMethodTable { url: String },
    /// An allow-set of methods was declared but left empty.
    EmptyMethodSet { url: String },
    /// A declared header name or value is not a valid HTTP token.
    InvalidHeader { url: String, name: String },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::EmptyMethodTable { url } => {
                write!(f, "route `{url}` registers a per-method handler with no methods")
            }
            RegistryError::EmptyMethodSet { url } => {
                write!(f, "route `{url}` declares an empty set of allowed methods")
            }
            RegistryError::InvalidHeader { url, name } => {
                write!(f, "route `{url}` declares an invalid header `{name}`")
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// Per-request failure inside the dispatch pipeline.
///
/// Every variant maps to a status code through [`DispatchError::status`].
#[derive(Debug)]
pub enum DispatchError {
    /// No route matched the request path.
    NotFound { path: String },
    /// The request method is not accepted by the route.
    MethodNotAllowed { method: Method, allowed: Vec<Method> },
    /// The handler or its `on_request` hook failed (or panicked).
    Handler(anyhow::Error),
}

impl DispatchError {
    /// HTTP status this error resolves to.
    ///
    /// Handler failures keep the "not yet resolved" 503.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            DispatchError::NotFound { .. } => 404,
            DispatchError::MethodNotAllowed { .. } => 405,
            DispatchError::Handler(_) => 503,
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::NotFound { path } => write!(f, "no route matches `{path}`"),
            DispatchError::MethodNotAllowed { method, allowed } => {
                let allowed: Vec<&str> = allowed.iter().map(Method::as_str).collect();
                write!(
                    f,
                    "invalid http method {method}, expected one of [{}]",
                    allowed.join(", ")
                )
            }
            DispatchError::Handler(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::Handler(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}
