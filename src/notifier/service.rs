use std::time::Duration;

use log::{debug, error, info};
use tokio::sync::mpsc::Receiver;

use super::DispatchError;
use super::payload::WebhookPayload;
use crate::config::WebhookConfig;
use crate::tracker::Alert;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Whole request, connect included. A stalled webhook holds up the queue for
/// at most this long per alert.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Background task that posts queued alerts to the webhook.
///
/// Delivery is best effort: failures are logged and the alert is dropped.
pub struct WebhookService {
    config: WebhookConfig,
    http: reqwest::Client,
    rx: Receiver<Alert>,
}

impl WebhookService {
    pub fn new(config: WebhookConfig, rx: Receiver<Alert>) -> Result<Self, DispatchError> {
        Self::build(config, rx, REQUEST_TIMEOUT)
    }

    fn build(
        config: WebhookConfig,
        rx: Receiver<Alert>,
        timeout: Duration,
    ) -> Result<Self, DispatchError> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout);
        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy.as_str())?);
        }
        let http = builder.build()?;
        Ok(Self { config, http, rx })
    }

    pub async fn run(mut self) {
        info!("Webhook dispatcher started");
        while let Some(alert) = self.rx.recv().await {
            match self.deliver(&alert).await {
                Ok(()) => info!("Alert for {} sent", alert.image),
                Err(e) => error!("Failed to send alert for {}: {e}", alert.image),
            }
        }
        info!("Alert channel closed, webhook dispatcher stopped");
    }

    async fn deliver(&self, alert: &Alert) -> Result<(), DispatchError> {
        let payload = WebhookPayload::new(&alert.message, self.config.channel.as_deref());
        debug!("Posting alert payload: {payload:?}");

        let response = self
            .http
            .post(self.config.url.clone())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::Status(status));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;
    use url::Url;

    fn alert() -> Alert {
        Alert {
            image: "x".to_string(),
            message: "Image x is restarting a lot on docker-01 ".to_string(),
        }
    }

    fn webhook(url: Url, channel: Option<&str>) -> WebhookConfig {
        WebhookConfig {
            url,
            channel: channel.map(str::to_string),
            proxy: None,
        }
    }

    fn service(url: Url, channel: Option<&str>) -> WebhookService {
        let (_tx, rx) = mpsc::channel(1);
        WebhookService::new(webhook(url, channel), rx).unwrap()
    }

    fn hook_url(server: &mockito::Server) -> Url {
        Url::parse(&format!("{}/hook", server.url())).unwrap()
    }

    #[tokio::test]
    async fn test_deliver_posts_json_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({
                "text": "Image x is restarting a lot on docker-01 ",
                "username": "Conmon",
                "icon_emoji": ":bomb:",
                "channel": "#alerts",
            })))
            .with_status(200)
            .create_async()
            .await;

        let result = service(hook_url(&server), Some("#alerts"))
            .deliver(&alert())
            .await;

        assert!(result.is_ok(), "{result:?}");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_deliver_omits_unset_channel() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .match_body(Matcher::Json(json!({
                "text": "Image x is restarting a lot on docker-01 ",
                "username": "Conmon",
                "icon_emoji": ":bomb:",
            })))
            .with_status(200)
            .create_async()
            .await;

        let result = service(hook_url(&server), None).deliver(&alert()).await;

        assert!(result.is_ok(), "{result:?}");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_deliver_reports_non_success_status() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .with_status(500)
            .create_async()
            .await;

        let result = service(hook_url(&server), None).deliver(&alert()).await;

        assert!(matches!(
            result,
            Err(DispatchError::Status(status)) if status.as_u16() == 500
        ));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_deliver_gives_up_on_stalled_webhook() {
        // Accept connections but never answer.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let (_tx, rx) = mpsc::channel(1);
        let url = Url::parse(&format!("http://{addr}/hook")).unwrap();
        let service =
            WebhookService::build(webhook(url, None), rx, Duration::from_millis(200)).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), service.deliver(&alert()))
            .await
            .expect("request was not cut off by the client timeout");

        assert!(
            matches!(&result, Err(DispatchError::Http(e)) if e.is_timeout()),
            "{result:?}"
        );
    }

    #[tokio::test]
    async fn test_run_survives_unreachable_webhook() {
        // Grab a free port, then close it so the connection is refused.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let (tx, rx) = mpsc::channel(4);
        let url = Url::parse(&format!("http://{addr}/hook")).unwrap();
        let service = WebhookService::new(webhook(url, None), rx).unwrap();

        tx.send(alert()).await.unwrap();
        tx.send(alert()).await.unwrap();
        drop(tx);

        service.run().await;
    }
}
