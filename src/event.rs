use std::collections::HashMap;
use std::fmt;

use bollard::models::EventMessage;

const SWARM_NODE_ID: &str = "com.docker.swarm.node.id";
const SWARM_SERVICE_ID: &str = "com.docker.swarm.service.id";
const SWARM_SERVICE_NAME: &str = "com.docker.swarm.service.name";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EventError {
    #[error("event is missing its actor")]
    MissingActor,
    #[error("event is missing the `{0}` field")]
    MissingField(&'static str),
}

/// A "container died" event, validated and reduced to what the tracker needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeathEvent {
    /// Seconds since epoch, as reported by the runtime.
    pub time: i64,
    pub image: String,
    pub container_id: Option<String>,
    pub attributes: HashMap<String, String>,
}

/// Orchestration labels attached to containers started by a swarm service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwarmMetadata<'a> {
    pub node_id: &'a str,
    pub service_id: &'a str,
    pub service_name: &'a str,
}

impl DeathEvent {
    pub fn container_name(&self) -> Option<&str> {
        self.attributes.get("name").map(String::as_str)
    }

    /// Swarm labels, present only when the node id is reported.
    pub fn swarm(&self) -> Option<SwarmMetadata<'_>> {
        let node_id = self.attributes.get(SWARM_NODE_ID)?;
        let attr = |key: &str| self.attributes.get(key).map_or("", String::as_str);
        Some(SwarmMetadata {
            node_id,
            service_id: attr(SWARM_SERVICE_ID),
            service_name: attr(SWARM_SERVICE_NAME),
        })
    }
}

impl fmt::Display for SwarmMetadata<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            " node_id {} service_id {} service_name {}",
            self.node_id, self.service_id, self.service_name
        )
    }
}

impl fmt::Display for DeathEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID {} image {} name {} time {}",
            self.container_id.as_deref().unwrap_or("-"),
            self.image,
            self.container_name().unwrap_or("-"),
            self.time
        )
    }
}

impl TryFrom<EventMessage> for DeathEvent {
    type Error = EventError;

    fn try_from(msg: EventMessage) -> Result<Self, Self::Error> {
        let time = msg.time.ok_or(EventError::MissingField("time"))?;
        let actor = msg.actor.ok_or(EventError::MissingActor)?;
        let attributes = actor.attributes.unwrap_or_default();
        let image = attributes
            .get("image")
            .filter(|image| !image.is_empty())
            .cloned()
            .ok_or(EventError::MissingField("image"))?;

        Ok(Self {
            time,
            image,
            container_id: actor.id,
            attributes,
        })
    }
}
