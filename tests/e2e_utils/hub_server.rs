#![cfg(test)]
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use dishwatch::adapters::{serve, ActiveDishViewers, ConnectionRegistry, HyperHubAdapter};
use dishwatch::config::Config;
use dishwatch::domain::DishViewersService;
use dishwatch::ports::{BroadcastPort, PresencePort};

pub struct TestHubServer {
    addr: SocketAddr,
    hub_path: String,
    _server_handle: JoinHandle<()>,
}

impl TestHubServer {
    pub async fn start() -> Result<Self, Box<dyn std::error::Error>> {
        Self::start_with(Config::default()).await
    }

    pub async fn start_with(config: Config) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let tracker: Arc<dyn PresencePort> = Arc::new(ActiveDishViewers::new());
        let registry = Arc::new(ConnectionRegistry::new());
        let broadcast: Arc<dyn BroadcastPort> = registry.clone();

        let service = Arc::new(DishViewersService::new(tracker, broadcast));
        let adapter = Arc::new(HyperHubAdapter::new(
            service,
            registry,
            config.hub_path.clone(),
            config.max_message_bytes,
        ));

        let server_handle = tokio::spawn(serve(listener, adapter));

        Ok(Self {
            addr,
            hub_path: config.hub_path,
            _server_handle: server_handle,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn hub_url(&self) -> String {
        format!("ws://{}{}", self.addr, self.hub_path)
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestHubServer {
    fn drop(&mut self) {
        self._server_handle.abort();
    }
}
