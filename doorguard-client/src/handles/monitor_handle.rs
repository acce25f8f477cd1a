use std::sync::Arc;

use axum::{Json, Router};
use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get};
use doorguard_api::{DeviceDescriptor, StatusEvent, WatchedDevice};
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::errors::DeviceError;
use crate::services::monitor_service::DeviceMonitor;
use crate::services::relay_service::RelayApi;

pub fn monitor_router<A>(monitor: Arc<DeviceMonitor<A>>) -> Router
where
    A: RelayApi + 'static,
{
    Router::new()
        .route("/devices", get(list_devices::<A>).post(add_device::<A>))
        .route("/devices/:device_id", delete(remove_device::<A>))
        .route("/ws", get(ws_handler::<A>))
        .with_state(monitor)
}

async fn list_devices<A: RelayApi + 'static>(
    State(monitor): State<Arc<DeviceMonitor<A>>>,
) -> Json<Vec<WatchedDevice>> {
    Json(monitor.devices().await)
}

async fn add_device<A: RelayApi + 'static>(
    State(monitor): State<Arc<DeviceMonitor<A>>>,
    Json(device): Json<DeviceDescriptor>,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    let device_id = device.id.to_uppercase();

    match monitor.add_device(device).await {
        Ok(()) => {
            tracing::info!("watching device {}", device_id);
            Ok((
                StatusCode::CREATED,
                Json(json!({ "message": format!("Device {device_id} added successfully") })),
            ))
        }
        Err(e) => {
            tracing::warn!("{}", e);
            Err(StatusCode::BAD_REQUEST)
        }
    }
}

async fn remove_device<A: RelayApi + 'static>(
    State(monitor): State<Arc<DeviceMonitor<A>>>,
    Path(device_id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    match monitor.remove_device(&device_id).await {
        Ok(device) => Ok(Json(
            json!({ "message": format!("Device {} removed successfully", device.id) }),
        )),
        Err(DeviceError::DeviceNotFound(_)) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::warn!("{}", e);
            Err(StatusCode::BAD_REQUEST)
        }
    }
}

async fn ws_handler<A: RelayApi + 'static>(
    ws: WebSocketUpgrade,
    State(monitor): State<Arc<DeviceMonitor<A>>>,
) -> impl IntoResponse {
    // Events raised during the handshake are queued for this watcher
    let events = monitor.subscribe();

    ws.on_upgrade(move |socket| handle_socket(socket, events))
}

async fn handle_socket(socket: WebSocket, mut events: broadcast::Receiver<StatusEvent>) {
    let (mut sender, mut receiver) = socket.split();

    tracing::info!("WebSocket watcher connected");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let payload = match serde_json::to_string(&event) {
                        Ok(payload) => payload,
                        Err(e) => {
                            tracing::warn!("Failed to serialize event: {}", e);
                            continue;
                        }
                    };

                    if sender.send(WsMessage::Text(payload)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("WebSocket watcher lagged, {} events skipped", skipped);
                }
                Err(RecvError::Closed) => break,
            },
            message = receiver.next() => match message {
                Some(Ok(WsMessage::Close(_))) | None => break,
                Some(Err(e)) => {
                    tracing::warn!("WebSocket error: {}", e);
                    break;
                }
                Some(Ok(_)) => {}
            },
        }
    }

    tracing::info!("WebSocket watcher disconnected");
}
