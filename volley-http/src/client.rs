//! Webhook executor

use crate::errors::HttpError;
use crate::types::WebhookUpdate;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::debug;
use url::Url;
use volley_config::HttpConfig;
use volley_core::{CorrelationTable, Operation, OperationError, Task};

/// Build the shared client. One client serves every task of a run so
/// connections are pooled.
pub fn build_client(config: &HttpConfig) -> Result<Client, HttpError> {
    debug!(
        "Creating HTTP client with {}s timeout",
        config.timeout.as_secs()
    );

    Ok(Client::builder()
        .timeout(config.timeout)
        .user_agent(&config.user_agent)
        .build()?)
}

/// Posts one [`WebhookUpdate`] per task to the target
#[derive(Debug, Clone)]
pub struct WebhookOperation {
    client: Client,
    target: Url,
    message_text: String,
    correlation: Option<Arc<CorrelationTable>>,
}

impl WebhookOperation {
    /// Fails when the target URL cannot be parsed or the client cannot be built
    pub fn new(config: &HttpConfig) -> Result<Self, HttpError> {
        let target = Url::parse(&config.target_url)
            .map_err(|e| HttpError::InvalidUrl(format!("{}: {}", config.target_url, e)))?;
        if !matches!(target.scheme(), "http" | "https") {
            return Err(HttpError::InvalidUrl(format!(
                "{}: scheme must be http or https",
                config.target_url
            )));
        }

        Ok(Self {
            client: build_client(config)?,
            target,
            message_text: config.message_text.clone(),
            correlation: None,
        })
    }

    /// Register each request in `table` before it is sent
    pub fn with_correlation(mut self, table: Arc<CorrelationTable>) -> Self {
        self.correlation = Some(table);
        self
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    /// Check that the target answers at all. Any HTTP response counts,
    /// whatever its status; only a transport failure is an error.
    pub async fn probe(&self) -> Result<(), HttpError> {
        match self.client.head(self.target.clone()).send().await {
            Ok(response) => {
                debug!("Target {} answered probe with {}", self.target, response.status());
                Ok(())
            }
            Err(e) => Err(HttpError::Unreachable(format!("{}: {}", self.target, e))),
        }
    }

    async fn send(&self, update: &WebhookUpdate) -> Result<(), HttpError> {
        let response = self
            .client
            .post(self.target.clone())
            .json(update)
            .send()
            .await?;

        let status = response.status();
        // Drain the body so the connection returns to the pool
        response.bytes().await?;

        if !status.is_success() {
            return Err(HttpError::Status(status.as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl Operation for WebhookOperation {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn execute(&self, task: &Task) -> Result<(), OperationError> {
        let update = WebhookUpdate::for_task(task, &self.message_text);

        if let Some(table) = &self.correlation {
            table.put(task.request_id, Instant::now());
        }

        let result = self.send(&update).await;
        if result.is_err() {
            if let Some(table) = &self.correlation {
                table.forget(task.request_id);
            }
        }

        result.map_err(OperationError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use parking_lot::Mutex;
    use std::net::SocketAddr;
    use std::time::Duration;
    use volley_core::{ErrorKind, TaskFactory};

    async fn serve(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn config_for(addr: SocketAddr) -> HttpConfig {
        HttpConfig {
            target_url: format!("http://{}/", addr),
            timeout: Duration::from_secs(5),
            ..HttpConfig::default()
        }
    }

    #[tokio::test]
    async fn test_posts_update_to_target() {
        let received = Arc::new(Mutex::new(Vec::<WebhookUpdate>::new()));
        let sink = Arc::clone(&received);
        let app = Router::new().route(
            "/",
            post(move |Json(update): Json<WebhookUpdate>| {
                let sink = Arc::clone(&sink);
                async move {
                    sink.lock().push(update);
                    StatusCode::OK
                }
            }),
        );
        let addr = serve(app).await;

        let operation = WebhookOperation::new(&config_for(addr)).unwrap();
        let task = TaskFactory::new(0, 0).task(4);
        operation.execute(&task).await.unwrap();

        let received = received.lock();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].chat_id(), 5);
        assert_eq!(received[0].message.text, "/start");
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let app = Router::new().route("/", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
        let addr = serve(app).await;

        let operation = WebhookOperation::new(&config_for(addr)).unwrap();
        let err = operation
            .execute(&TaskFactory::new(0, 0).task(0))
            .await
            .unwrap_err();

        assert_eq!(err, OperationError::Status { code: 500 });
    }

    #[tokio::test]
    async fn test_failed_send_is_forgotten_in_correlation() {
        // Bind then drop to get a port nothing listens on
        let addr = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let table = Arc::new(CorrelationTable::new());
        let operation = WebhookOperation::new(&config_for(addr))
            .unwrap()
            .with_correlation(Arc::clone(&table));

        let err = operation
            .execute(&TaskFactory::new(0, 0).task(0))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Connection);
        assert_eq!(table.pending(), 0);
        assert_eq!(table.unmatched(), 0);
    }

    #[tokio::test]
    async fn test_reachability_accepts_any_response() {
        let app = Router::new().route("/", post(|| async { StatusCode::OK }));
        let addr = serve(app).await;

        // HEAD is not routed, so the target answers 405
        let operation = WebhookOperation::new(&config_for(addr)).unwrap();
        operation.probe().await.unwrap();
    }

    #[tokio::test]
    async fn test_reachability_fails_when_nothing_listens() {
        let addr = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let operation = WebhookOperation::new(&config_for(addr)).unwrap();

        let err = operation.probe().await.unwrap_err();
        assert!(matches!(err, HttpError::Unreachable(_)));
    }

    #[test]
    fn test_rejects_invalid_target() {
        let config = HttpConfig {
            target_url: "not a url".to_string(),
            ..HttpConfig::default()
        };
        assert!(matches!(
            WebhookOperation::new(&config),
            Err(HttpError::InvalidUrl(_))
        ));

        let config = HttpConfig {
            target_url: "ftp://localhost/".to_string(),
            ..HttpConfig::default()
        };
        assert!(WebhookOperation::new(&config).is_err());
    }
}
