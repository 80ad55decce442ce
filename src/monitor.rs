use std::pin::pin;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use log::info;
use tokio::sync::oneshot;

use crate::config::ConmonConfig;
use crate::docker::{self, SourceError};
use crate::event::DeathEvent;
use crate::notifier::{self, AlertSink, DispatchError, WebhookService};
use crate::signals;
use crate::tracker::{Clock, RestartTracker};

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("Unable to set up webhook client: {0}")]
    Dispatch(#[from] DispatchError),
    #[error("Docker event stream ended")]
    StreamEnded,
}

/// How long queued alerts may take to go out once we are told to stop.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(15);

/// Connect to Docker, start the webhook dispatcher and watch for restarts
/// until the event stream fails or `shutdown` fires.
///
/// Either way, alerts already queued get `SHUTDOWN_GRACE` to be delivered.
pub async fn run(
    config: ConmonConfig,
    shutdown: oneshot::Receiver<i32>,
) -> Result<(), MonitorError> {
    let docker = docker::connect().await?;

    let (alerts, rx) = notifier::alert_channel();
    let service = WebhookService::new(config.webhook, rx)?;
    let dispatcher = tokio::spawn(service.run());

    let mut tracker = RestartTracker::new(config.tracker);
    let events = pin!(docker::death_events(&docker));

    info!("Watching for dying containers");
    signals::notify_ready();

    let outcome = tokio::select! {
        res = watch(events, &mut tracker, &alerts) => res,
        _ = shutdown => Ok(()),
    };

    notifier::drain(alerts, dispatcher, SHUTDOWN_GRACE).await;
    outcome
}

/// Feed every event to the tracker, in order, and hand resulting alerts to
/// `sink`.
///
/// Only returns on error: a malformed event or a broken stream stops the
/// loop, as does the stream ending.
pub async fn watch<S, K, C>(
    mut events: S,
    tracker: &mut RestartTracker<C>,
    sink: &K,
) -> Result<(), MonitorError>
where
    S: Stream<Item = Result<DeathEvent, SourceError>> + Unpin,
    K: AlertSink,
    C: Clock,
{
    while let Some(event) = events.next().await {
        let event = event?;
        info!("{event}");

        if let Some(alert) = tracker.handle_event(&event) {
            sink.send(alert);
        }
    }
    Err(MonitorError::StreamEnded)
}
