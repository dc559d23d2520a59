use std::process::ExitCode;

use lantern::config::Config;
use lantern::server::listener;
use lantern::server_log::{ServerLog, Severity};
use tracing::Level;

fn main() -> ExitCode {
    let cfg = Config::load();

    let debug = cfg.as_ref().is_ok_and(|c| c.debug_mode);
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(if debug { Level::DEBUG } else { Level::INFO })
        .init();

    let cfg = match cfg {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Failed to load configuration: {:#}", e);
            return ExitCode::from(1);
        }
    };
    cfg.log_effective();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(cfg.num_threads)
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to start runtime: {}", e);
            return ExitCode::from(1);
        }
    };

    runtime.block_on(serve(cfg))
}

async fn serve(cfg: Config) -> ExitCode {
    let log = ServerLog::open(&cfg.logging.file, cfg.logging.level).await;

    let listener = match listener::bind(&cfg).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to initialize server: {:#}", e);
            log.append(Severity::Error, format!("Failed to initialize server: {e:#}"));
            return ExitCode::from(1);
        }
    };

    tokio::select! {
        res = listener::run(listener, &cfg, log.clone()) => {
            if let Err(e) = res {
                tracing::error!("Error running server: {:#}", e);
                log.append(Severity::Error, format!("Error running server: {e:#}"));
                return ExitCode::from(2);
            }
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    ExitCode::SUCCESS
}
