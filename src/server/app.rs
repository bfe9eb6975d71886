use super::http_server::{HttpServer, ServerHandle};
use super::service::AppService;
use crate::config::AppConfig;
use crate::dispatcher::{Dispatcher, HandlerRegistry, RouteHandler};
use crate::error::RouterError;
use crate::router::Router;
use anyhow::Context;
use std::sync::Arc;
use tracing::info;

type BeforeStartHook = Box<dyn FnOnce() -> anyhow::Result<()> + Send>;
type OnStartHook = Box<dyn FnOnce(&ServerHandle) + Send>;

/// A routes tree bound to its handlers, ready to serve.
///
/// ```rust,ignore
/// let app = App::from_config(AppConfig::resolve(None)?, registry())?
///     .before_start(|| { println!("preparing..."); Ok(()) })
///     .on_start(|handle| println!("listening on {}", handle.addr()));
/// app.serve()?.join().ok();
/// ```
pub struct App {
    config: AppConfig,
    router: Arc<Router>,
    dispatcher: Arc<Dispatcher>,
    before_start: Option<BeforeStartHook>,
    on_start: Option<OnStartHook>,
}

impl App {
    #[must_use]
    pub fn new(config: AppConfig, router: Router, dispatcher: Dispatcher) -> Self {
        Self {
            config,
            router: Arc::new(router),
            dispatcher: Arc::new(dispatcher),
            before_start: None,
            on_start: None,
        }
    }

    /// Scan `config.routes_dir`, build the routing table and bind every route
    /// to its handler in `registry`.
    ///
    /// # Errors
    ///
    /// Any startup-fatal [`RouterError`]: missing directory, no routes, or a
    /// route without a handler.
    pub fn from_config(config: AppConfig, registry: HandlerRegistry) -> Result<Self, RouterError> {
        let router = Router::from_dir(&config.routes_dir, &config.extensions)?;
        let dispatcher = Dispatcher::bind(&router, registry)?;
        Ok(Self::new(config, router, dispatcher))
    }

    /// Like [`App::from_config`], serving routes missing from `registry`
    /// with `fallback`.
    ///
    /// # Errors
    ///
    /// Fails when the directory is missing or holds no routes.
    pub fn with_fallback(
        config: AppConfig,
        registry: HandlerRegistry,
        fallback: RouteHandler,
    ) -> Result<Self, RouterError> {
        let router = Router::from_dir(&config.routes_dir, &config.extensions)?;
        let dispatcher = Dispatcher::bind_with_fallback(&router, registry, fallback);
        Ok(Self::new(config, router, dispatcher))
    }

    /// Run `hook` after the runtime is configured, before the banner and the
    /// listener. An error aborts [`App::serve`].
    #[must_use]
    pub fn before_start<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        self.before_start = Some(Box::new(hook));
        self
    }

    /// Run `hook` once the listener is accepting connections.
    #[must_use]
    pub fn on_start<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&ServerHandle) + Send + 'static,
    {
        self.on_start = Some(Box::new(hook));
        self
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    #[must_use]
    pub fn service(&self) -> AppService {
        AppService::new(Arc::clone(&self.router), Arc::clone(&self.dispatcher))
    }

    fn log_banner(&self, exported_env: &[(String, String)]) {
        info!(
            addr = %self.config.addr,
            routes_dir = %self.config.routes_dir.display(),
            route_count = self.router.table().routes().count(),
            "Starting fsrouter server"
        );
        for entry in self.router.table().entries() {
            for candidate in &entry.candidates {
                info!(
                    glob = %entry.glob,
                    url = %candidate.route.url,
                    file = %candidate.route.path.display(),
                    "Route"
                );
            }
        }
        for (name, value) in exported_env {
            info!(name = %name, value = %value, "Server environment");
        }
    }

    /// Configure the runtime, run the hooks and start listening.
    ///
    /// Order: stack size, `SERVER_ENV_*` export, `before_start`, banner,
    /// listener, `on_start`.
    ///
    /// # Errors
    ///
    /// Fails when `before_start` fails or the address cannot be bound.
    pub fn serve(mut self) -> anyhow::Result<ServerHandle> {
        self.config.runtime().apply();
        let exported_env = self.config.export_env();

        if let Some(hook) = self.before_start.take() {
            hook().context("before_start hook failed")?;
        }

        self.log_banner(&exported_env);

        let handle = HttpServer(self.service())
            .start(self.config.addr.as_str())
            .with_context(|| format!("Failed to bind {}", self.config.addr))?;
        handle
            .wait_ready()
            .with_context(|| format!("Server on {} did not become ready", handle.addr()))?;

        if let Some(hook) = self.on_start.take() {
            hook(&handle);
        }
        Ok(handle)
    }
}
