//! Anomaly notifications raised during rotation.
//!
//! Delivery is best-effort: `notify` returns immediately, the webhook POST
//! runs on a detached task, and failures only reach the log. Events are not
//! ordered relative to the HTTP response of the rotation that raised them.

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, info_span, warn, Instrument};
use url::Url;
use uuid::Uuid;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);
const IP_CHANGE_EVENT: &str = "ip_address_changed";
const IP_CHANGE_EVENT_TYPE: &str = "security.ip_change";

/// A refresh credential was presented from a different IP than it was issued to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IpChangeEvent {
    pub user_id: Uuid,
    pub old_ip: String,
    pub new_ip: String,
    pub client_agent: String,
}

/// Fire-and-forget sink for anomaly events. Implementations must not block.
pub trait AnomalyNotifier: Send + Sync {
    fn notify(&self, event: IpChangeEvent);
}

/// Local dev notifier that only logs the event.
#[derive(Clone, Debug)]
pub struct LogNotifier;

impl AnomalyNotifier for LogNotifier {
    fn notify(&self, event: IpChangeEvent) {
        info!(
            user_id = %event.user_id,
            old_ip = %event.old_ip,
            new_ip = %event.new_ip,
            client_agent = %event.client_agent,
            "client ip changed during rotation"
        );
    }
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    user_id: String,
    ip_address: &'a str,
    user_agent: &'a str,
    event: &'static str,
}

/// POSTs each event as JSON to a configured URL.
#[derive(Clone, Debug)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: Url,
}

impl WebhookNotifier {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: Url) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .context("failed to build webhook client")?;
        Ok(Self { client, url })
    }

    async fn deliver(&self, event: &IpChangeEvent) -> Result<()> {
        let payload = WebhookPayload {
            user_id: event.user_id.to_string(),
            ip_address: &event.new_ip,
            user_agent: &event.client_agent,
            event: IP_CHANGE_EVENT,
        };

        let response = self
            .client
            .post(self.url.clone())
            .header("X-Event-Type", IP_CHANGE_EVENT_TYPE)
            .header("X-Old-IP", event.old_ip.as_str())
            .json(&payload)
            .send()
            .await
            .context("failed to send webhook")?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("webhook returned status {status}: {body}"));
        }
        Ok(())
    }
}

impl AnomalyNotifier for WebhookNotifier {
    fn notify(&self, event: IpChangeEvent) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(user_id = %event.user_id, "no async runtime; ip change webhook dropped");
            return;
        };

        let notifier = self.clone();
        let span = info_span!("webhook.ip_change", user_id = %event.user_id);
        runtime.spawn(
            async move {
                if let Err(err) = notifier.deliver(&event).await {
                    warn!("ip change webhook failed: {err:#}");
                }
            }
            .instrument(span),
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::{
        extract::State,
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use tokio::{net::TcpListener, sync::mpsc};

    type Captured = (HeaderMap, serde_json::Value);

    async fn spawn_receiver(status: StatusCode) -> (Url, mpsc::UnboundedReceiver<Captured>) {
        let (tx, rx) = mpsc::unbounded_channel::<Captured>();
        let app = Router::new()
            .route(
                "/hook",
                post(
                    move |State(tx): State<mpsc::UnboundedSender<Captured>>,
                          headers: HeaderMap,
                          Json(body): Json<serde_json::Value>| async move {
                        let _ = tx.send((headers, body));
                        status
                    },
                ),
            )
            .with_state(tx);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        (Url::parse(&format!("http://{addr}/hook")).unwrap(), rx)
    }

    fn event() -> IpChangeEvent {
        IpChangeEvent {
            user_id: Uuid::new_v4(),
            old_ip: "10.0.0.1".to_string(),
            new_ip: "10.0.0.2".to_string(),
            client_agent: "test-agent/1.0".to_string(),
        }
    }

    #[tokio::test]
    async fn webhook_posts_ip_change_payload() {
        let (url, mut rx) = spawn_receiver(StatusCode::OK).await;
        let notifier = WebhookNotifier::new(url).unwrap();
        let event = event();

        notifier.notify(event.clone());

        let (headers, body) = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(headers.get("x-event-type").unwrap(), IP_CHANGE_EVENT_TYPE);
        assert_eq!(headers.get("x-old-ip").unwrap(), "10.0.0.1");
        assert_eq!(body["user_id"], event.user_id.to_string());
        assert_eq!(body["ip_address"], "10.0.0.2");
        assert_eq!(body["user_agent"], "test-agent/1.0");
        assert_eq!(body["event"], IP_CHANGE_EVENT);
    }

    #[tokio::test]
    async fn webhook_error_status_is_reported() {
        let (url, _rx) = spawn_receiver(StatusCode::INTERNAL_SERVER_ERROR).await;
        let notifier = WebhookNotifier::new(url).unwrap();
        let result = notifier.deliver(&event()).await;
        assert!(result.is_err());
    }

    #[test]
    fn notify_outside_runtime_does_not_panic() {
        let notifier = WebhookNotifier::new(Url::parse("http://127.0.0.1:9/hook").unwrap()).unwrap();
        notifier.notify(event());
        LogNotifier.notify(event());
    }
}
