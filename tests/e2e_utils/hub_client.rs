#![cfg(test)]
#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use dishwatch::domain::{DishId, ServerMessage, ViewerCountUpdate};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

pub struct HubClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl HubClient {
    pub async fn connect(url: &str) -> Self {
        let (ws, _) = connect_async(url).await.expect("Should be able to open the hub");
        Self { ws }
    }

    pub async fn send_text(&mut self, text: &str) {
        self.ws
            .send(Message::Text(text.to_string()))
            .await
            .expect("Should be able to write to the hub");
    }

    /// Write a frame the hub may refuse mid-transfer; the outcome is ignored.
    pub async fn send_text_unchecked(&mut self, text: String) {
        let _ = tokio::time::timeout(RECV_TIMEOUT, self.ws.send(Message::Text(text))).await;
    }

    pub async fn start_viewing(&mut self, dish: DishId) {
        self.send_text(&format!(r#"{{"type":"startViewing","dishId":"{}"}}"#, dish))
            .await;
    }

    pub async fn stop_viewing(&mut self, dish: DishId) {
        self.send_text(&format!(r#"{{"type":"stopViewing","dishId":"{}"}}"#, dish))
            .await;
    }

    /// Next server message, failing the test after a timeout
    pub async fn recv(&mut self) -> ServerMessage {
        self.try_recv(RECV_TIMEOUT)
            .await
            .expect("Should receive a message within timeout")
    }

    pub async fn try_recv(&mut self, wait: Duration) -> Option<ServerMessage> {
        loop {
            let frame = tokio::time::timeout(wait, self.ws.next()).await.ok()??;
            match frame.expect("Hub connection failed") {
                Message::Text(text) => {
                    return Some(serde_json::from_str(&text).expect("Hub sent malformed JSON"));
                }
                Message::Close(_) => return None,
                _ => continue,
            }
        }
    }

    pub async fn recv_update(&mut self) -> ViewerCountUpdate {
        match self.recv().await {
            ServerMessage::ViewerCountUpdated(update) => update,
            other => panic!("Expected a viewer count update, got {:?}", other),
        }
    }

    pub async fn expect_silence(&mut self) {
        if let Some(msg) = self.try_recv(Duration::from_millis(300)).await {
            panic!("Expected no message, got {:?}", msg);
        }
    }

    /// Whether the hub ends the session (close frame, reset or EOF) within the timeout
    pub async fn is_closed_by_hub(&mut self) -> bool {
        loop {
            match tokio::time::timeout(RECV_TIMEOUT, self.ws.next()).await {
                Err(_) => return false,
                Ok(None) | Ok(Some(Err(_))) | Ok(Some(Ok(Message::Close(_)))) => return true,
                Ok(Some(Ok(_))) => continue,
            }
        }
    }

    pub async fn close(mut self) {
        self.ws.close(None).await.ok();
    }
}
