//! Docker client module using bollard.
//!
//! Connects to the daemon with the default connection method (Unix socket
//! on Linux/macOS, named pipe on Windows, or `DOCKER_HOST` when set) and
//! subscribes to its event stream.

use std::collections::HashMap;

use bollard::Docker;
use bollard::query_parameters::{EventsOptions, EventsOptionsBuilder};
use futures_util::{Stream, StreamExt};

use crate::event::{DeathEvent, EventError};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Docker API error: {0}")]
    DockerApi(#[from] bollard::errors::Error),
    #[error("Malformed event: {0}")]
    Malformed(#[from] EventError),
}

/// Connect and agree on an API version with the daemon.
pub async fn connect() -> Result<Docker, SourceError> {
    let docker = Docker::connect_with_local_defaults()?;
    Ok(docker.negotiate_version().await?)
}

fn die_filters() -> HashMap<&'static str, Vec<&'static str>> {
    HashMap::from([("type", vec!["container"]), ("event", vec!["die"])])
}

/// Live stream of "container died" events, in the order the daemon reports
/// them.
pub fn death_events(docker: &Docker) -> impl Stream<Item = Result<DeathEvent, SourceError>> + '_ {
    let options: EventsOptions = EventsOptionsBuilder::new().filters(&die_filters()).build();

    docker.events(Some(options)).map(|message| {
        let message = message?;
        Ok(DeathEvent::try_from(message)?)
    })
}
