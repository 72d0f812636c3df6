//! Frame send policy: drop, never queue
//!
//! A frame is captured and sent on a tick only when the channel is ready
//! and the camera has produced a frame. Anything else skips the tick.

/// Outcome of one transport tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameDecision {
    Send,
    SkipChannelBusy,
    SkipNoFrame,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameCounters {
    pub sent: u64,
    pub skipped_channel: u64,
    pub skipped_no_frame: u64,
    /// Frames whose capture or send failed after the gate let them through
    pub failed: u64,
}

#[derive(Debug, Default)]
pub struct FrameGate {
    counters: FrameCounters,
}

impl FrameGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide and count; the caller sends only on [`FrameDecision::Send`]
    pub fn decide(&mut self, channel_ready: bool, frame_available: bool) -> FrameDecision {
        let decision = if !channel_ready {
            FrameDecision::SkipChannelBusy
        } else if !frame_available {
            FrameDecision::SkipNoFrame
        } else {
            FrameDecision::Send
        };
        match decision {
            FrameDecision::Send => self.counters.sent += 1,
            FrameDecision::SkipChannelBusy => self.counters.skipped_channel += 1,
            FrameDecision::SkipNoFrame => self.counters.skipped_no_frame += 1,
        }
        decision
    }

    /// Undo a `Send` that did not go out
    pub fn record_failure(&mut self) {
        self.counters.sent = self.counters.sent.saturating_sub(1);
        self.counters.failed += 1;
    }

    pub fn counters(&self) -> FrameCounters {
        self.counters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_only_when_both_ready() {
        let mut gate = FrameGate::new();
        assert_eq!(gate.decide(true, true), FrameDecision::Send);
        assert_eq!(gate.decide(false, true), FrameDecision::SkipChannelBusy);
        assert_eq!(gate.decide(true, false), FrameDecision::SkipNoFrame);
        assert_eq!(gate.decide(false, false), FrameDecision::SkipChannelBusy);
    }

    #[test]
    fn test_skipped_ticks_are_not_queued() {
        let mut gate = FrameGate::new();
        for _ in 0..10 {
            gate.decide(false, true);
        }
        // channel recovers: exactly one frame per tick, no backlog flush
        assert_eq!(gate.decide(true, true), FrameDecision::Send);
        let counters = gate.counters();
        assert_eq!(counters.sent, 1);
        assert_eq!(counters.skipped_channel, 10);
    }

    #[test]
    fn test_failure_accounting() {
        let mut gate = FrameGate::new();
        gate.decide(true, true);
        gate.record_failure();
        assert_eq!(gate.counters().sent, 0);
        assert_eq!(gate.counters().failed, 1);
    }
}
