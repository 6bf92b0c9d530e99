use anyhow::{Context, Result};
use std::time::Duration;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::TcpStream,
    time::timeout,
};
use tracing::{debug, error, info};

use crate::classify::{Classification, classify};
use crate::config::TargetConfig;

/// Maximum bytes moved per forwarding step.
pub const BUFFER_SIZE: usize = 4096;

/// How long one read waits before the loop re-polls, so an idle direction
/// stays responsive to shutdown.
const READ_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Relays one connection pair: connects to the configured target, then runs
/// one [`pump`] per direction until each observes its own end-of-stream.
///
/// The directions are joined, not raced: a closed client-to-target stream
/// does not cancel the target-to-client stream, which keeps draining until
/// its own endpoint closes.
#[tracing::instrument(
    skip(client, target),
    fields(client_addr = %client.peer_addr().map_or_else(|_| "unknown".to_string(), |addr| addr.to_string()))
)]
pub async fn handle_connection(client: TcpStream, target: &TargetConfig) -> Result<()> {
    let target_addr = target.addr();

    debug!(target_addr = %target_addr, "Attempting to connect to target server");
    let server = TcpStream::connect(&target_addr)
        .await
        .with_context(|| format!("Failed to connect to target {target_addr}"))?;
    info!(target_addr = %target_addr, "Connected to target server");

    let client_addr = client
        .peer_addr()
        .map_or_else(|_| "unknown".to_string(), |addr| addr.to_string());

    let (mut client_reader, mut client_writer) = client.into_split();
    let (mut server_reader, mut server_writer) = server.into_split();

    let (client_to_server, server_to_client) = tokio::join!(
        pump(&mut client_reader, &mut server_writer, &target_addr),
        pump(&mut server_reader, &mut client_writer, &client_addr),
    );
    client_to_server?;
    server_to_client?;

    info!("Relay connection closed");
    Ok(())
}

/// Pumps bytes from `source` to `destination` until `source` reaches
/// end-of-stream or either endpoint fails.
///
/// Each chunk is classified and the outcome logged before the exact same
/// bytes are forwarded; classification never alters what is sent. On
/// end-of-stream the pump returns without shutting down `destination` — the
/// sibling direction owns that endpoint's lifetime. `peer` names the
/// destination endpoint in log output.
pub async fn pump<R, W>(source: &mut R, destination: &mut W, peer: &str) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buffer = [0u8; BUFFER_SIZE];

    loop {
        let read = match timeout(READ_POLL_INTERVAL, source.read(&mut buffer)).await {
            Err(_) => continue, // nothing readable within the interval
            Ok(read) => read,
        };

        match read {
            Ok(0) => {
                debug!(peer = %peer, "Source closed the stream");
                break;
            }
            Ok(n) => {
                let chunk = &buffer[..n];
                log_classification(&classify(chunk), peer);
                if let Err(e) = destination.write_all(chunk).await {
                    error!(error = %e, bytes = n, "Failed to write to destination");
                    return Err(e).context("Failed to forward data to destination");
                }
                debug!(bytes = n, peer = %peer, "Forwarded data");
            }
            Err(e) => {
                error!(error = %e, "Failed to read from source");
                break;
            }
        }
    }

    Ok(())
}

fn log_classification(classification: &Classification, peer: &str) {
    match classification {
        Classification::HttpRequest { url } => {
            info!(url = %url, "HTTP request");
        }
        Classification::ConnectTunnel => {
            info!(peer = %peer, "Forwarded CONNECT request");
        }
        Classification::TlsClientHello { sni: Some(host) } => {
            info!(sni = %host, "HTTPS request SNI");
        }
        Classification::TlsClientHello { sni: None } => {
            debug!("TLS handshake without SNI");
        }
        Classification::Unrecognized => {}
    }
}
