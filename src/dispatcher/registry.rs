use crate::error::RegistryError;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use super::handler::RouteHandler;

/// Compiled table from route identifier to handler.
///
/// The identifier is the route's derived url as produced by the scanner,
/// brackets included (`/v1/list/item-[itemId]`). Handlers are validated here,
/// once, so dispatch never re-checks their metadata.
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<RouteHandler>>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for the route identified by `url`.
    ///
    /// A second registration for the same url replaces the first.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError`] when the handler's declared metadata is
    /// invalid.
    pub fn register(&mut self, url: &str, handler: RouteHandler) -> Result<(), RegistryError> {
        handler.validate(url)?;
        if self
            .handlers
            .insert(url.to_string(), Arc::new(handler))
            .is_some()
        {
            warn!(url = %url, "Replaced existing handler registration");
        } else {
            info!(
                url = %url,
                total_handlers = self.handlers.len(),
                "Handler registered successfully"
            );
        }
        Ok(())
    }

    #[must_use]
    pub fn get(&self, url: &str) -> Option<&Arc<RouteHandler>> {
        self.handlers.get(url)
    }

    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.handlers.contains_key(url)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub(crate) fn into_inner(self) -> HashMap<String, Arc<RouteHandler>> {
        self.handlers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Body;

    #[test]
    fn test_register_and_replace() {
        let mut registry = HandlerRegistry::new();
        registry
            .register("/a", RouteHandler::new(|_, _| Ok(Body::from("one"))))
            .unwrap();
        registry
            .register("/a", RouteHandler::new(|_, _| Ok(Body::from("two"))))
            .unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("/a"));
        assert!(!registry.contains("/b"));
    }

    #[test]
    fn test_register_rejects_invalid_handler() {
        let mut registry = HandlerRegistry::new();
        let err = registry
            .register("/a", RouteHandler::per_method())
            .unwrap_err();
        assert_eq!(err, RegistryError::EmptyMethodTable { url: "/a".into() });
        assert!(registry.is_empty());
    }
}
