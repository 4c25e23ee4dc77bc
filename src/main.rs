#[macro_use] extern crate log;

pub mod config;
pub mod context;
pub mod error;
pub mod frame;
pub mod handlers;
pub mod logger;
pub mod request;
pub mod response;
pub mod router;
pub mod server;
pub mod storage;
pub mod utils;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use crate::config::Config;
use crate::router::Router;
use crate::server::Server;
use crate::storage::DirStorage;
use crate::utils::ResultV;


const MODULE: &str = "MAIN";

/// HTTP/1.1 server built directly on TCP sockets
#[derive(Parser, Debug)]
#[command(author, version, about, long_about)]
struct Args {
    /// Directory served and written by the /files routes
    #[arg(long)]
    directory: Option<PathBuf>,

    /// Path to the configurational file
    #[arg(short, long)]
    config: Option<String>,
}


fn main() -> ResultV {
    let args = Args::parse();
    let cfg = Config::load(args.config.as_deref())
        .map_err(|e| {
            eprintln!("Could not load configuration: {}", e);
            "config error"
        })?
        .with_directory(args.directory);
    logger::init_logger(&cfg.log)?;

    let reporter = logger::get_reporter(MODULE, "Bind", "init server error");

    let storage = DirStorage::new(cfg.storage.directory.clone());
    match storage.root() {
        Some(dir) => info!("[{}] Serving files from {}", MODULE, dir.display()),
        None => warn!("[{}] No storage directory given, /files requests will fail", MODULE),
    }
    let router = Router::new(Arc::new(storage));

    let addr = cfg.server.address();
    let server = Server::bind(&cfg.server, router).map_err(|e| reporter.report(format!("{}: {}", addr, e)))?;

    info!("[{}] Starting rawhttpd at {} with {} workers", MODULE, addr, cfg.server.workers);
    if let Some(path) = &args.config {
        info!("[{}] Config loaded from {}", MODULE, path);
    }

    server.run();
    Ok(())
}
