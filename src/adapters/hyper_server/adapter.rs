use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{body::Incoming, Method, Request, Response, StatusCode};
use hyper_tungstenite::tungstenite::protocol::WebSocketConfig;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error};

use super::session::HubSession;
use crate::adapters::ConnectionRegistry;
use crate::domain::{DishId, DishViewersService, ViewerError};

pub type Body = BoxBody<Bytes, hyper::Error>;

/// Frames up to this multiple of `max_message_bytes` are read and answered with
/// an error; anything larger is refused by tungstenite from the frame header.
const HARD_LIMIT_FACTOR: usize = 2;

pub struct HyperHubAdapter {
    service: Arc<DishViewersService>,
    registry: Arc<ConnectionRegistry>,
    hub_path: String,
    max_message_bytes: usize,
    ws_config: WebSocketConfig,
}

impl HyperHubAdapter {
    pub fn new(
        service: Arc<DishViewersService>,
        registry: Arc<ConnectionRegistry>,
        hub_path: String,
        max_message_bytes: usize,
    ) -> Self {
        Self {
            service,
            registry,
            hub_path,
            max_message_bytes,
            ws_config: ws_config(max_message_bytes),
        }
    }

    pub async fn handle(&self, req: Request<Incoming>) -> Response<Body> {
        self.handle_internal(req).unwrap_or_else(|e| {
            error!("Hub error: {}", e);
            respond(StatusCode::INTERNAL_SERVER_ERROR, "text/plain", Bytes::new())
        })
    }

    fn handle_internal(&self, mut req: Request<Incoming>) -> Result<Response<Body>, ViewerError> {
        debug!("{} {}", req.method(), req.uri().path());

        if req.uri().path() == self.hub_path {
            return Ok(self.handle_upgrade(&mut req));
        }

        if req.method() != Method::GET {
            return Ok(text(StatusCode::METHOD_NOT_ALLOWED, "method not allowed"));
        }

        let segments: Vec<&str> = req.uri().path().split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            ["health"] => Ok(text(StatusCode::OK, "ok")),
            ["api", "dishes", "viewers"] => json(StatusCode::OK, &self.service.active_dishes()),
            ["api", "dishes", dish_id, "viewers"] => match dish_id.parse::<DishId>() {
                Ok(dish) => json(StatusCode::OK, &self.service.viewer_count(&dish)),
                Err(e) => Ok(text(StatusCode::BAD_REQUEST, &e.to_string())),
            },
            _ => Ok(text(StatusCode::NOT_FOUND, "not found")),
        }
    }

    fn handle_upgrade(&self, req: &mut Request<Incoming>) -> Response<Body> {
        if !hyper_tungstenite::is_upgrade_request(req) {
            return text(StatusCode::BAD_REQUEST, "expected a WebSocket upgrade");
        }

        let (response, websocket) = match hyper_tungstenite::upgrade(req, Some(self.ws_config)) {
            Ok(upgrade) => upgrade,
            Err(e) => {
                error!("WebSocket upgrade error: {}", e);
                return text(StatusCode::BAD_REQUEST, "invalid WebSocket upgrade request");
            }
        };

        let session = HubSession::new(self.service.clone(), self.registry.clone(), self.max_message_bytes);
        tokio::spawn(async move {
            match websocket.await {
                Ok(ws) => session.run(ws).await,
                Err(e) => error!("WebSocket handshake failed: {}", e),
            }
        });

        response.map(|body| body.map_err(|never| match never {}).boxed())
    }
}

fn ws_config(max_message_bytes: usize) -> WebSocketConfig {
    let hard_limit = max_message_bytes.saturating_mul(HARD_LIMIT_FACTOR);
    WebSocketConfig {
        max_message_size: Some(hard_limit),
        max_frame_size: Some(hard_limit),
        ..Default::default()
    }
}

fn respond(status: StatusCode, content_type: &'static str, body: Bytes) -> Response<Body> {
    let mut response = Response::new(Full::new(body).map_err(|never| match never {}).boxed());
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

fn text(status: StatusCode, body: &str) -> Response<Body> {
    respond(status, "text/plain", Bytes::from(body.to_string()))
}

fn json<T: Serialize>(status: StatusCode, value: &T) -> Result<Response<Body>, ViewerError> {
    let body = serde_json::to_vec(value).map_err(|e| ViewerError::InvalidMessage(e.to_string()))?;
    Ok(respond(status, "application/json", Bytes::from(body)))
}
