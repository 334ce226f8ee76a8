//! Callback listener for the latency-tracking variant

use crate::errors::HttpError;
use crate::types::{ApiReply, CallbackMessage};
use axum::{body::Bytes, extract::State, http::StatusCode, routing::post, Json, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use volley_core::{CorrelationTable, ResultAggregator};

#[derive(Clone)]
struct ListenerState {
    table: Arc<CorrelationTable>,
    aggregator: Arc<ResultAggregator>,
}

/// Stands in for the bot API. Every outbound message the target sends is
/// matched against the correlation table by `chat_id`.
pub struct CallbackListener {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<std::io::Result<()>>,
}

impl CallbackListener {
    /// Bind and start serving. Port `0` picks a free port.
    pub async fn bind(
        addr: SocketAddr,
        table: Arc<CorrelationTable>,
        aggregator: Arc<ResultAggregator>,
    ) -> Result<Self, HttpError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| HttpError::Listener(format!("failed to bind {}: {}", addr, e)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| HttpError::Listener(e.to_string()))?;

        let app = Self::router(table, aggregator);
        let (shutdown, signal) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = signal.await;
                })
                .await
        });

        info!("Callback listener on {}", local_addr);
        Ok(Self {
            local_addr,
            shutdown,
            handle,
        })
    }

    /// Accepts POSTs on any path, as bot API calls carry the method in the path
    pub fn router(table: Arc<CorrelationTable>, aggregator: Arc<ResultAggregator>) -> Router {
        Router::new()
            .route("/", post(handle_callback))
            .route("/{*path}", post(handle_callback))
            .with_state(ListenerState { table, aggregator })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    /// Stop accepting callbacks and wait for in-flight handlers
    pub async fn shutdown(self) -> Result<(), HttpError> {
        let _ = self.shutdown.send(());
        self.handle
            .await
            .map_err(|e| HttpError::Listener(e.to_string()))?
            .map_err(|e| HttpError::Listener(e.to_string()))?;
        debug!("Callback listener on {} stopped", self.local_addr);
        Ok(())
    }
}

async fn handle_callback(
    State(state): State<ListenerState>,
    body: Bytes,
) -> (StatusCode, Json<ApiReply>) {
    let received_at = Instant::now();

    let message: CallbackMessage = match serde_json::from_slice(&body) {
        Ok(message) => message,
        Err(e) => {
            warn!("Unparsable callback: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiReply::error(format!("Bad Request: {}", e))),
            );
        }
    };

    match state
        .table
        .complete(message.chat_id, received_at, &state.aggregator)
    {
        Some(latency) => debug!("Response for {} after {:?}", message.chat_id, latency),
        None => debug!("Unmatched response for {}", message.chat_id),
    }

    (StatusCode::OK, Json(ApiReply::ok()))
}
