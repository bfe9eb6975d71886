use basic_demo::registry::register_all;
use basic_demo::routes_dir;
use clap::Parser;
use fsrouter::logging::{init_logging, LogConfig};
use fsrouter::{App, AppConfig};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "basic_demo", about = "fsrouter demo server")]
struct Args {
    /// YAML config file
    #[arg(short, long, env = "FSR_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind (overrides the config file)
    #[arg(long)]
    addr: Option<String>,
}

fn main() -> anyhow::Result<()> {
    init_logging(&LogConfig::from_env())?;
    let args = Args::parse();

    let mut config = AppConfig::resolve(args.config.as_deref())?;
    if args.config.is_none() {
        config.routes_dir = routes_dir();
    }
    if let Some(addr) = args.addr {
        config.addr = addr;
    }

    let app = App::from_config(config, register_all()?)?
        .before_start(|| {
            info!("preparing...");
            Ok(())
        })
        .on_start(|handle| info!(addr = %handle.addr(), "server already started..."));

    let handle = app.serve()?;
    handle
        .join()
        .map_err(|e| anyhow::anyhow!("Server failed: {e:?}"))
}
