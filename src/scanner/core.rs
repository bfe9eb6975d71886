use crate::error::RouterError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Handler file extensions accepted when none are configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["rs"];

/// A bracket pair with no nested brackets: `[name]`.
pub static BRACKET_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[([^\[\]]*)\]").expect("bracket segment regex should be valid")
});

/// One file on disk that is eligible to be a route handler.
///
/// Immutable once scanned; shared by the route table for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteFile {
    /// Absolute location of the file
    pub path: PathBuf,
    /// Logical URL: the path below the routes root, without extension
    /// (e.g. `/v1/list/item-[itemId]`)
    pub url: String,
    /// Parameter names in left-to-right order (e.g. `["itemId"]`)
    pub params: Vec<String>,
}

impl RouteFile {
    /// Build a route file from its location below `root`.
    ///
    /// Returns `None` when `path` is not below `root`.
    #[must_use]
    pub fn from_path(root: &Path, path: &Path) -> Option<Self> {
        let relative = path.strip_prefix(root).ok()?;
        let url = url_from_relative(relative)?;
        let params = bracket_params(&url);
        Some(Self {
            path: path.to_path_buf(),
            url,
            params,
        })
    }

    /// `true` when the url contains no dynamic segment.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.params.is_empty()
    }
}

/// Extract bracketed parameter names from a url, left to right.
#[must_use]
pub fn bracket_params(url: &str) -> Vec<String> {
    BRACKET_SEGMENT
        .captures_iter(url)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Join the components of a root-relative path into a `/`-separated url,
/// dropping the extension of the final component.
fn url_from_relative(relative: &Path) -> Option<String> {
    let mut components: Vec<&OsStr> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s),
            _ => None,
        })
        .collect();
    let file = components.pop()?;
    let stem = Path::new(file).file_stem()?;

    let mut url = String::with_capacity(relative.as_os_str().len() + 1);
    for dir in components {
        url.push('/');
        url.push_str(&dir.to_string_lossy());
    }
    url.push('/');
    url.push_str(&stem.to_string_lossy());
    Some(url)
}

fn has_handler_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| extensions.iter().any(|e| e.trim_start_matches('.') == ext))
}

/// Recursively walk `root` and return every eligible route file.
///
/// Output is sorted by path so grouping order, and with it every
/// last-match-wins tie-break, does not depend on the filesystem.
///
/// # Errors
///
/// * [`RouterError::RoutesDirectoryMissing`] if `root` is not a directory
/// * [`RouterError::NoRoutesFound`] if no file carries a handler extension
/// * [`RouterError::Io`] if the walk fails
pub fn scan(root: &Path, extensions: &[String]) -> Result<Vec<RouteFile>, RouterError> {
    if !root.is_dir() {
        return Err(RouterError::RoutesDirectoryMissing {
            root: root.to_path_buf(),
        });
    }
    let root = fs::canonicalize(root).map_err(|source| RouterError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    let mut routes = Vec::new();
    for entry in WalkDir::new(&root)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| RouterError::Io {
            path: e.path().map_or_else(|| root.clone(), Path::to_path_buf),
            source: io::Error::from(e),
        })?;
        if !entry.file_type().is_file() || !has_handler_extension(entry.path(), extensions) {
            continue;
        }
        if let Some(route) = RouteFile::from_path(&root, entry.path()) {
            debug!(
                url = %route.url,
                path = %route.path.display(),
                params = ?route.params,
                "Route file discovered"
            );
            routes.push(route);
        }
    }

    if routes.is_empty() {
        return Err(RouterError::NoRoutesFound {
            root,
            extensions: extensions.to_vec(),
        });
    }

    info!(
        root = %root.display(),
        routes_count = routes.len(),
        "Routes directory scanned"
    );
    Ok(routes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bracket_params_order() {
        assert_eq!(
            bracket_params("/v1/dynamic/[slug]/[id]"),
            vec!["slug".to_string(), "id".to_string()]
        );
        assert_eq!(bracket_params("/v1/list/item-[itemId]"), vec!["itemId"]);
        assert!(bracket_params("/v1/hello").is_empty());
    }

    #[test]
    fn test_bracket_params_not_nested() {
        // only the innermost well-formed pair counts
        assert_eq!(bracket_params("/a/[[x]]"), vec!["x"]);
        assert_eq!(bracket_params("/a/[x][y]"), vec!["x", "y"]);
    }

    #[test]
    fn test_route_file_from_path() {
        let root = Path::new("/srv/routes");
        let route = RouteFile::from_path(root, Path::new("/srv/routes/v1/list/item-[itemId].rs"))
            .unwrap();
        assert_eq!(route.url, "/v1/list/item-[itemId]");
        assert_eq!(route.params, vec!["itemId"]);
        assert!(!route.is_static());

        assert!(RouteFile::from_path(root, Path::new("/elsewhere/x.rs")).is_none());
    }

    #[test]
    fn test_extension_filter() {
        let exts = vec!["rs".to_string(), ".route".to_string()];
        assert!(has_handler_extension(Path::new("a/b.rs"), &exts));
        assert!(has_handler_extension(Path::new("a/b.route"), &exts));
        assert!(!has_handler_extension(Path::new("a/b.ts"), &exts));
        assert!(!has_handler_extension(Path::new("a/README"), &exts));
    }
}
