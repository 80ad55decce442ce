mod client;
mod payload;
mod service;

pub use client::AlertClient;
pub use service::WebhookService;

use std::time::Duration;

use log::{info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::tracker::Alert;

/// Alerts waiting for delivery before new ones start being dropped.
pub const ALERT_QUEUE_SIZE: usize = 64;

/// Something that accepts alerts for delivery.
///
/// Sending never blocks and never reports failure to the caller.
pub trait AlertSink {
    fn send(&self, alert: Alert);
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("webhook answered with status {0}")]
    Status(reqwest::StatusCode),
}

pub fn alert_channel() -> (AlertClient, mpsc::Receiver<Alert>) {
    let (tx, rx) = mpsc::channel(ALERT_QUEUE_SIZE);
    (AlertClient::new(tx), rx)
}

/// Close the queue behind `client` and give `dispatcher` up to `grace` to
/// deliver what is still queued. Returns whether it finished in time.
pub async fn drain(client: AlertClient, dispatcher: JoinHandle<()>, grace: Duration) -> bool {
    drop(client);
    match tokio::time::timeout(grace, dispatcher).await {
        Ok(_) => {
            info!("Pending alerts flushed");
            true
        }
        Err(_) => {
            warn!("Gave up on pending alerts after {}s", grace.as_secs());
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use url::Url;

    use crate::config::WebhookConfig;

    fn alert(image: &str) -> Alert {
        Alert {
            image: image.to_string(),
            message: format!("Image {image} is restarting a lot on docker-01 "),
        }
    }

    fn start(url: Url) -> (AlertClient, JoinHandle<()>) {
        let (client, rx) = alert_channel();
        let config = WebhookConfig {
            url,
            channel: None,
            proxy: None,
        };
        let service = WebhookService::new(config, rx).unwrap();
        (client, tokio::spawn(service.run()))
    }

    #[tokio::test]
    async fn test_drain_delivers_queued_alerts() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .with_status(200)
            .expect(2)
            .create_async()
            .await;

        let (client, dispatcher) = start(Url::parse(&format!("{}/hook", server.url())).unwrap());
        client.send(alert("x"));
        client.send(alert("y"));

        assert!(drain(client, dispatcher, Duration::from_secs(5)).await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_drain_is_bounded_by_grace_period() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let (client, dispatcher) = start(Url::parse(&format!("http://{addr}/hook")).unwrap());
        client.send(alert("x"));

        assert!(!drain(client, dispatcher, Duration::from_millis(100)).await);
    }
}
