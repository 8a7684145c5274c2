use anyhow::Result;
use rce_sensor::driver::RceDriver;
use rce_sensor::web::{AppState, WebServer};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let mut driver =
        RceDriver::new().map_err(|e| anyhow::anyhow!("Failed to create driver: {}", e))?;

    info!("RCE sensor {} starting up", env!("APP_VERSION"));

    let state = AppState {
        snapshot_rx: driver.subscribe(),
        config: Arc::new(driver.config().clone()),
    };
    let (host, port) = (
        driver.config().web.host.clone(),
        driver.config().web.port,
    );

    let web_task = tokio::spawn(async move {
        let web = WebServer::new(state);
        if let Err(e) = web.start(&host, port).await {
            error!("Web server error: {}", e);
        }
    });

    match driver.run().await {
        Ok(()) => {
            info!("Driver shutdown complete");
            web_task.abort();
            Ok(())
        }
        Err(e) => {
            error!("Driver failed with error: {}", e);
            web_task.abort();
            Err(anyhow::anyhow!("Driver error: {}", e))
        }
    }
}
