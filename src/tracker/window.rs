use std::collections::VecDeque;

/// Largest up-front reservation; bigger windows grow as restarts arrive.
const MAX_PREALLOCATED: usize = 64;

/// Fixed-capacity ring of the most recent restart timestamps for one image.
///
/// Once full, pushing a new timestamp drops the oldest one. Storage is
/// reserved up front for small windows and never exceeds `capacity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartWindow {
    times: VecDeque<i64>,
    capacity: usize,
}

impl RestartWindow {
    /// Create a window holding a single timestamp.
    pub fn seeded(capacity: usize, time: i64) -> Self {
        assert!(capacity > 0);

        let mut times = VecDeque::with_capacity(capacity.min(MAX_PREALLOCATED));
        times.push_back(time);
        Self { times, capacity }
    }

    pub fn push(&mut self, time: i64) {
        if self.times.len() >= self.capacity {
            let _ = self.times.pop_front();
        }
        self.times.push_back(time);
    }

    /// Oldest retained timestamp.
    pub fn oldest(&self) -> Option<i64> {
        self.times.front().copied()
    }

    /// Drop everything and keep only `time`.
    pub fn reset(&mut self, time: i64) {
        self.times.clear();
        self.times.push_back(time);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.times.iter().copied()
    }
}
