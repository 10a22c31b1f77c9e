// Self-harm detection and crisis banner policy

mod detector;

pub use detector::{
    CrisisDetector, CrisisKeywords, CRISIS_BANNER, DENIAL_WINDOW_TURNS, WARNING_COOLDOWN_TURNS,
};
