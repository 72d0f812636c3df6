//! Rep phase classification from a position percentage

/// Below this percentage the body is "down"; no hysteresis band
pub const DOWN_THRESHOLD: f32 = 40.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Contracted
    Down,
    /// Extended
    Up,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Down => "down",
            Phase::Up => "up",
        }
    }
}

/// `Down` if `percentage < 40`, otherwise `Up`
pub fn classify_phase(percentage: f32) -> Phase {
    if percentage < DOWN_THRESHOLD {
        Phase::Down
    } else {
        Phase::Up
    }
}
