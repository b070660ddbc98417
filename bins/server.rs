use tracing::{error, info};
use uuid::Uuid;

fn main() -> std::process::ExitCode {
    dotenvy::dotenv().ok();

    let service_id = Uuid::new_v4();
    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    std::panic::set_hook(Box::new(move |info| {
        error!(service = "portal", event = "panic", %service_id, pid, message = %info, "unhandled panic occurred");
    }));

    // config.toml first, then TOKIO_WORKER_THREADS
    let worker_threads = match configs::AppConfig::load_or_default() {
        Ok(cfg) => cfg.server.worker_threads,
        Err(_) => std::env::var("TOKIO_WORKER_THREADS").ok().and_then(|v| v.parse::<usize>().ok()),
    };

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(w) = worker_threads {
        builder.worker_threads(w);
    }

    let rt = match builder.build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to build tokio runtime: {e}");
            return std::process::ExitCode::FAILURE;
        }
    };

    rt.block_on(async move {
        // logging is initialised inside run() once the config is loaded
        match server::run().await {
            Ok(()) => {
                info!(service = "portal", event = "stop", %service_id, pid, version, "portal stopped normally");
                std::process::ExitCode::SUCCESS
            }
            Err(e) => {
                error!(service = "portal", event = "run_failed", %service_id, error = %e, "portal exited with error");
                eprintln!("portal failed: {e}");
                std::process::ExitCode::FAILURE
            }
        }
    })
}
