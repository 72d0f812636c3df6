//! Bounded automatic reconnection

/// Fixed retry count with a fixed delay between attempts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    max_attempts: u32,
    delay_ms: u32,
    attempts: u32,
}

impl ReconnectPolicy {
    pub fn new(max_attempts: u32, delay_ms: u32) -> Self {
        Self {
            max_attempts,
            delay_ms,
            attempts: 0,
        }
    }

    /// Delay before the next attempt, or `None` once retries are exhausted
    pub fn next_delay(&mut self) -> Option<u32> {
        if self.attempts >= self.max_attempts {
            return None;
        }
        self.attempts += 1;
        Some(self.delay_ms)
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Called after a successful connection
    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}
