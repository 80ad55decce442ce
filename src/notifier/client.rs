use log::error;
use tokio::sync::mpsc::Sender;

use super::AlertSink;
use crate::tracker::Alert;

/// Handle used by the event loop to queue alerts for delivery.
#[derive(Clone)]
pub struct AlertClient {
    tx: Sender<Alert>,
}

impl AlertClient {
    pub fn new(tx: Sender<Alert>) -> Self {
        Self { tx }
    }
}

impl AlertSink for AlertClient {
    fn send(&self, alert: Alert) {
        // Never block the event loop. A full or closed queue loses the alert.
        if let Err(e) = self.tx.try_send(alert) {
            error!("Failed to queue alert (channel full or closed): {e}");
        }
    }
}
