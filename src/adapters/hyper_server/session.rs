use futures::{SinkExt, StreamExt};
use hyper_tungstenite::tungstenite::Message;
use hyper_tungstenite::WebSocketStream;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{error, info, warn};

use crate::adapters::ConnectionRegistry;
use crate::domain::{ClientMessage, ConnectionId, DishViewersService, Result, ServerMessage, ViewerError};

/// One client's WebSocket session on the hub
pub struct HubSession {
    service: Arc<DishViewersService>,
    registry: Arc<ConnectionRegistry>,
    max_message_bytes: usize,
}

impl HubSession {
    pub fn new(service: Arc<DishViewersService>, registry: Arc<ConnectionRegistry>, max_message_bytes: usize) -> Self {
        Self {
            service,
            registry,
            max_message_bytes,
        }
    }

    pub async fn run<S>(self, ws: WebSocketStream<S>)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let connection = ConnectionId::generate();
        info!("{} connected", connection);

        let (mut sink, mut frames) = ws.split();
        let mut outbox = self.registry.register(connection.clone()).await;

        let mut writer = tokio::spawn(async move {
            while let Some(message) = outbox.recv().await {
                let text = match message.to_json() {
                    Ok(text) => text,
                    Err(e) => {
                        error!("Dropping unserializable message: {}", e);
                        continue;
                    }
                };
                if sink.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            sink.close().await.ok();
        });

        // tungstenite queues the pong for incoming pings on its own
        loop {
            tokio::select! {
                frame = frames.next() => match frame {
                    Some(Ok(Message::Text(text))) => self.on_text(&connection, &text).await,
                    Some(Ok(Message::Binary(_))) => {
                        self.reply_error(&connection, ViewerError::InvalidMessage("binary frames are not supported".into()))
                            .await
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("WebSocket error on {}: {}", connection, e);
                        break;
                    }
                },
                _ = &mut writer => break,
            }
        }

        self.service.disconnect(&connection).await;
        self.registry.unregister(&connection).await;
        writer.abort();
        info!("{} disconnected", connection);
    }

    async fn on_text(&self, connection: &ConnectionId, text: &str) {
        if text.len() > self.max_message_bytes {
            let err = ViewerError::InvalidMessage(format!(
                "frame of {} bytes exceeds the {} byte limit",
                text.len(),
                self.max_message_bytes
            ));
            return self.reply_error(connection, err).await;
        }

        if let Err(e) = self.dispatch(connection, text).await {
            self.reply_error(connection, e).await;
        }
    }

    async fn dispatch(&self, connection: &ConnectionId, text: &str) -> Result<()> {
        match ClientMessage::parse(text)? {
            ClientMessage::StartViewing { dish_id } => {
                self.service.start_viewing(connection, &dish_id).await?;
            }
            ClientMessage::StopViewing { dish_id } => {
                self.service.stop_viewing(connection, &dish_id).await?;
            }
        }
        Ok(())
    }

    async fn reply_error(&self, connection: &ConnectionId, err: ViewerError) {
        warn!("Rejected frame from {}: {}", connection, err);
        if let Err(e) = self
            .registry
            .send_to(connection, ServerMessage::error(err.to_string()))
            .await
        {
            log::debug!("Could not report error to {}: {}", connection, e);
        }
    }
}
