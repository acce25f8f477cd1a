use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::device::RouteProvider;

struct Running {
    address: SocketAddr,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Minimal HTTP host for a single device.
///
/// Logs and counts every inbound request, everything else is up to the
/// device's routes.
pub struct HttpServer<D: RouteProvider> {
    device: Arc<D>,
    host: IpAddr,
    port: u16,
    requests: Arc<AtomicUsize>,
    running: Option<Running>,
}

impl<D: RouteProvider> HttpServer<D> {
    pub fn new(device: D, port: u16) -> Self {
        Self {
            device: Arc::new(device),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port,
            requests: Arc::new(AtomicUsize::new(0)),
            running: None,
        }
    }

    pub fn with_host(mut self, host: IpAddr) -> Self {
        self.host = host;
        self
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn router(&self) -> Router {
        self.device
            .setup_http_routes(Router::new())
            .layer(middleware::from_fn_with_state(self.requests.clone(), log_request))
    }

    /// Bind and start serving. Returns the bound address; a server that is
    /// already running keeps its listener.
    pub async fn start(&mut self) -> io::Result<SocketAddr> {
        if let Some(running) = &self.running {
            return Ok(running.address);
        }

        let listener = TcpListener::bind((self.host, self.port)).await?;
        let address = listener.local_addr()?;
        let app = self.router();

        let (shutdown, signal) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = signal.await;
            });

            if let Err(e) = serve.await {
                tracing::error!("server on {} failed: {}", address, e);
            }
        });

        tracing::debug!("listening on {}", address);

        self.running = Some(Running {
            address,
            shutdown,
            handle,
        });

        Ok(address)
    }

    /// Stop accepting connections and wait for the serving task to finish.
    pub async fn stop(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };

        let _ = running.shutdown.send(());

        if let Err(e) = running.handle.await {
            tracing::error!("server on {} did not shut down cleanly: {}", running.address, e);
        }

        tracing::debug!("stopped listening on {}", running.address);
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running.as_ref().map(|running| running.address)
    }

    /// Requests received since the server was created.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

async fn log_request(
    State(requests): State<Arc<AtomicUsize>>,
    request: Request,
    next: Next,
) -> Response {
    requests.fetch_add(1, Ordering::SeqCst);
    tracing::info!("{} {}", request.method(), request.uri());

    next.run(request).await
}
