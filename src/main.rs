use anyhow::{Context, Result};
use sni_relay::{handle_connection, load_config};
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = load_config()?;
    info!(
        config_file = "config.toml",
        listen_ip = %config.listen.ip,
        listen_port = config.listen.port,
        target_host = %config.target.host,
        target_port = config.target.port,
        "Configuration loaded"
    );

    let addr = config.listen.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address {addr}"))?;

    info!(
        listen_addr = %addr,
        target_addr = %config.target.addr(),
        "Relay listening"
    );

    while let Ok((stream, client_addr)) = listener.accept().await {
        info!(client_addr = %client_addr, "Accepted connection");
        let target = config.target.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, &target).await {
                error!(client_addr = %client_addr, error = %e, "Connection failed");
            }
        });
    }

    Ok(())
}
