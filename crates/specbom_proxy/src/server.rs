use std::future::Future;
use std::net::SocketAddr;

use bom_logging::{bom_error, bom_info, bom_warn};
use tokio::net::TcpListener;

use crate::relay::{router, ProxyState};
use crate::ProxyError;

/// Binds `addr` and relays until `shutdown` resolves.
pub async fn serve<F>(addr: SocketAddr, state: ProxyState, shutdown: F) -> Result<(), ProxyError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ProxyError::Bind {
            addr: addr.to_string(),
            source,
        })?;
    serve_on(listener, state, shutdown).await
}

pub async fn serve_on<F>(
    listener: TcpListener,
    state: ProxyState,
    shutdown: F,
) -> Result<(), ProxyError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let local = listener.local_addr().map_err(ProxyError::Serve)?;
    bom_info!("Relay listening on {} -> {}", local, state.base());
    if !local.ip().is_loopback() {
        bom_warn!("Relay is reachable beyond localhost; it attaches the platform credential to every request");
    }

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|err| {
            bom_error!("Relay stopped with error: {}", err);
            ProxyError::Serve(err)
        })?;
    bom_info!("Relay shut down");
    Ok(())
}

/// Resolves on Ctrl+C.
pub async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        bom_error!("Failed to install Ctrl+C handler: {}", err);
        std::future::pending::<()>().await;
    }
}
