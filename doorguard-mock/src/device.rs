use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use doorguard_api::{RelayEntry, RelayStatus, Turn, TurnQuery};
use time::OffsetDateTime;
use tokio::sync::RwLock;

/// A device that knows how to mount its own HTTP routes.
///
/// The server shim owns the listener and request logging, the device owns
/// every path.
pub trait RouteProvider: Send + Sync + 'static {
    fn setup_http_routes(&self, router: Router) -> Router;
}

#[derive(Debug)]
struct Channel {
    ison: bool,
    history: Vec<Turn>,
}

/// In-memory stand-in for a single channel relay.
#[derive(Debug, Clone)]
pub struct MockRelay {
    name: Arc<str>,
    channel: Arc<RwLock<Channel>>,
    fault: Option<StatusCode>,
}

impl MockRelay {
    pub fn new(name: &str, ison: bool) -> Self {
        Self {
            name: Arc::from(name),
            channel: Arc::new(RwLock::new(Channel {
                ison,
                history: Vec::new(),
            })),
            fault: None,
        }
    }

    /// Answer every request with `status` instead of serving it.
    pub fn failing(mut self, status: StatusCode) -> Self {
        self.fault = Some(status);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn is_on(&self) -> bool {
        self.channel.read().await.ison
    }

    /// Commands applied through `/relay/0`, oldest first.
    pub async fn history(&self) -> Vec<Turn> {
        self.channel.read().await.history.clone()
    }

    fn check_fault(&self) -> Result<(), StatusCode> {
        match self.fault {
            Some(status) => Err(status),
            None => Ok(()),
        }
    }
}

impl RouteProvider for MockRelay {
    fn setup_http_routes(&self, router: Router) -> Router {
        let relay = Router::new()
            .route("/status", get(get_status))
            .route("/relay/0", get(set_relay))
            .with_state(self.clone());

        router.merge(relay)
    }
}

async fn get_status(State(relay): State<MockRelay>) -> Result<Json<RelayStatus>, StatusCode> {
    relay.check_fault()?;

    let ison = relay.is_on().await;

    Ok(Json(RelayStatus {
        relays: vec![RelayEntry { ison }],
        unixtime: Some(OffsetDateTime::now_utc().unix_timestamp()),
    }))
}

async fn set_relay(
    State(relay): State<MockRelay>,
    Query(query): Query<TurnQuery>,
) -> Result<Json<RelayEntry>, StatusCode> {
    relay.check_fault()?;

    let mut channel = relay.channel.write().await;
    channel.ison = query.turn.apply(channel.ison);
    channel.history.push(query.turn);

    tracing::info!(
        "[{}] turn={} -> {}",
        relay.name,
        query.turn.as_str(),
        if channel.ison { "on" } else { "off" }
    );

    Ok(Json(RelayEntry { ison: channel.ison }))
}
