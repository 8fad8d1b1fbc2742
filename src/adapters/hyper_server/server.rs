use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ServerBuilder;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error};

use super::HyperHubAdapter;

/// Accept loop: one task per TCP connection, upgrades allowed.
pub async fn serve(listener: TcpListener, adapter: Arc<HyperHubAdapter>) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("Failed to accept connection: {}", e);
                continue;
            }
        };

        let io = TokioIo::new(stream);
        let adapter = adapter.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req| {
                let adapter = adapter.clone();
                async move { Ok::<_, hyper::Error>(adapter.handle(req).await) }
            });

            if let Err(err) = ServerBuilder::new(TokioExecutor::new())
                .serve_connection_with_upgrades(io, service)
                .await
            {
                debug!("Connection from {} ended with error: {}", peer, err);
            }
        });
    }
}
