use log::*;
use service::{config::Config, logging::Logger, AppState};
use sse::{LifecycleLogger, Manager};
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config);

    info!("Starting up SSE platform...");

    let sse_manager = Arc::new(Manager::new().with_observer(Arc::new(LifecycleLogger)));

    if let Some(millis) = config.reconnect_interval_ms {
        sse_manager.set_reconnect_interval(millis).await;
    }

    // Held for the lifetime of the process; the task ends with the runtime
    let _keep_alive = config.keep_alive_interval().map(|period| {
        debug!("Sending keep-alive comments every {period:?}");
        sse_manager.spawn_keep_alive(period)
    });

    let app_state = AppState::new(config, &sse_manager);

    if let Err(e) = web::init_server(app_state).await {
        error!("Server stopped: {e}");
        process::exit(1);
    }
}
