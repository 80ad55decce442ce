//! Per-image restart tracking.
//!
//! The tracker turns a stream of "container died" events into rate-limited
//! alerts. State is kept per image, never per container, and lives in memory
//! for the lifetime of the process.

mod clock;
mod window;

pub use clock::{Clock, SystemClock};
pub use window::RestartWindow;

#[cfg(test)]
pub use clock::testing;

use std::collections::HashMap;

use crate::event::DeathEvent;

/// Minimum wall-clock gap, in seconds, between two alerts for the same image.
pub const ALERT_COOLDOWN_SECS: i64 = 600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerSettings {
    /// Name of the monitored host, included in every alert.
    pub hostname: String,
    /// Trailing window, in seconds of event time.
    pub time_limit: i64,
    /// Number of restarts inside the window that is considered abnormal.
    pub restart_limit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub image: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRestartState {
    restart_count: usize,
    recent_restarts: RestartWindow,
    last_alert_time: Option<i64>,
}

impl ImageRestartState {
    fn new(capacity: usize, time: i64) -> Self {
        Self {
            restart_count: 1,
            recent_restarts: RestartWindow::seeded(capacity, time),
            last_alert_time: None,
        }
    }

    fn reset(&mut self, time: i64) {
        self.restart_count = 1;
        self.recent_restarts.reset(time);
    }

    fn cooldown_elapsed(&self, now: i64) -> bool {
        match self.last_alert_time {
            None => true,
            Some(last) => last < now.saturating_sub(ALERT_COOLDOWN_SECS),
        }
    }
}

#[cfg(test)]
impl ImageRestartState {
    pub fn restart_count(&self) -> usize {
        self.restart_count
    }

    pub fn recent_restarts(&self) -> &RestartWindow {
        &self.recent_restarts
    }

    pub fn last_alert_time(&self) -> Option<i64> {
        self.last_alert_time
    }
}

pub struct RestartTracker<C = SystemClock> {
    settings: TrackerSettings,
    images: HashMap<String, ImageRestartState>,
    clock: C,
}

impl RestartTracker<SystemClock> {
    pub fn new(settings: TrackerSettings) -> Self {
        Self::with_clock(settings, SystemClock)
    }
}

impl<C: Clock> RestartTracker<C> {
    pub fn with_clock(settings: TrackerSettings, clock: C) -> Self {
        Self {
            settings,
            images: HashMap::new(),
            clock,
        }
    }

    #[cfg(test)]
    pub fn state(&self, image: &str) -> Option<&ImageRestartState> {
        self.images.get(image)
    }

    /// Record one death event and decide whether it warrants an alert.
    ///
    /// The first event for an image only seeds its state. Once more than
    /// `restart_limit` restarts fall inside the trailing `time_limit`, the
    /// image's counters are reset and an alert is returned, unless one was
    /// already sent for this image within the cooldown.
    pub fn handle_event(&mut self, event: &DeathEvent) -> Option<Alert> {
        let capacity = self.settings.restart_limit.saturating_add(1);
        let Some(state) = self.images.get_mut(&event.image) else {
            self.images.insert(
                event.image.clone(),
                ImageRestartState::new(capacity, event.time),
            );
            return None;
        };

        state.recent_restarts.push(event.time);
        state.restart_count += 1;

        if state.restart_count <= self.settings.restart_limit {
            return None;
        }

        let window_start = state.recent_restarts.oldest()?;
        if event.time.saturating_sub(window_start) >= self.settings.time_limit {
            return None;
        }

        log::debug!(
            "{} restarts of {} within {}s: {:?}",
            state.restart_count,
            event.image,
            self.settings.time_limit,
            state.recent_restarts.iter().collect::<Vec<_>>()
        );
        state.reset(event.time);

        let extra_info = event.swarm().map(|s| s.to_string()).unwrap_or_default();
        let message = format!(
            "Image {} is restarting a lot on {} {}",
            event.image, self.settings.hostname, extra_info
        );
        log::warn!("{message}");

        let now = self.clock.now();
        if !state.cooldown_elapsed(now) {
            log::info!(
                "Alert for {} suppressed, last one was sent less than {}s ago",
                event.image,
                ALERT_COOLDOWN_SECS
            );
            return None;
        }

        state.last_alert_time = Some(now);
        Some(Alert {
            image: event.image.clone(),
            message,
        })
    }
}
