use crate::config::AppConfig;
use crate::dispatcher::HandlerRegistry;
use crate::echo::echo_route;
use crate::logging::{try_init_logging, LogConfig};
use crate::router::Router;
use crate::server::App;
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line interface for fsrouter
#[derive(Parser, Debug)]
#[command(name = "fsrouter", version)]
#[command(about = "File-system HTTP router", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the route table discovered in a directory
    Routes {
        /// Root of the routes tree
        #[arg(short, long)]
        routes: PathBuf,

        /// Handler file extension (repeatable)
        #[arg(long = "ext", default_value = "rs")]
        extensions: Vec<String>,
    },
    /// Serve a routes directory with echo handlers
    Serve {
        /// Root of the routes tree (overrides the config file)
        #[arg(short, long)]
        routes: Option<PathBuf>,

        /// Address and port to bind (overrides the config file)
        #[arg(long)]
        addr: Option<String>,

        /// YAML config file
        #[arg(short, long, env = "FSR_CONFIG")]
        config: Option<PathBuf>,

        /// Handler file extension (repeatable, overrides the config file)
        #[arg(long = "ext")]
        extensions: Vec<String>,
    },
}

/// Parse the process arguments and run the selected command.
///
/// # Errors
///
/// See [`run`].
pub fn run_cli() -> anyhow::Result<()> {
    run(Cli::parse())
}

/// Run a parsed command line.
///
/// # Errors
///
/// Returns an error if the routes directory is missing or empty, the config
/// file cannot be loaded, or the server fails to start.
pub fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Routes { routes, extensions } => {
            let router = Router::from_dir(&routes, &extensions)
                .with_context(|| format!("Failed to load routes from {}", routes.display()))?;
            for line in router.describe_routes() {
                println!("{line}");
            }
            Ok(())
        }
        Commands::Serve {
            routes,
            addr,
            config,
            extensions,
        } => {
            try_init_logging(&LogConfig::from_env());
            let config = serve_config(config, routes, addr, extensions)?;
            let app = App::with_fallback(config, HandlerRegistry::new(), echo_route())
                .context("Failed to build route table")?;
            let handle = app.serve()?;
            handle
                .join()
                .map_err(|e| anyhow::anyhow!("server stopped unexpectedly: {e:?}"))
        }
    }
}

/// Resolve the serve configuration: file, then environment, then flags.
fn serve_config(
    path: Option<PathBuf>,
    routes: Option<PathBuf>,
    addr: Option<String>,
    extensions: Vec<String>,
) -> anyhow::Result<AppConfig> {
    let mut config = AppConfig::resolve(path.as_deref())?;
    if let Some(routes) = routes {
        config.routes_dir = routes;
    }
    if let Some(addr) = addr {
        config.addr = addr;
    }
    if !extensions.is_empty() {
        config.extensions = extensions;
    }
    Ok(config)
}

#[cfg(test)]
pub(super) fn resolve_serve_config(cli: Cli) -> anyhow::Result<AppConfig> {
    match cli.command {
        Commands::Serve {
            routes,
            addr,
            config,
            extensions,
        } => serve_config(config, routes, addr, extensions),
        Commands::Routes { .. } => Err(anyhow::anyhow!("not a serve command")),
    }
}
