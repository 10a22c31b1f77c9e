// Emotional level and biometric inputs

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ValidationError;

/// User-reported or inferred emotional intensity, always within 1..=5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "u8")]
pub struct EmotionalLevel(u8);

impl EmotionalLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(level: i64) -> Result<Self, ValidationError> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&level) {
            Ok(Self(level as u8))
        } else {
            Err(ValidationError::EmotionalLevelOutOfRange(level))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Sampling temperature: steadier output for more distressed users
    pub fn temperature(self) -> f32 {
        match self.0 {
            4..=5 => 0.3,
            3 => 0.5,
            _ => 0.7,
        }
    }

    /// Whether this level alone puts the prompt into crisis mode
    pub fn is_severe(self) -> bool {
        self.0 >= 4
    }

    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "Bình thường/Ổn định",
            2 => "Căng thẳng nhẹ",
            3 => "Lo âu vừa phải",
            4 => "Lo âu/Trầm cảm nghiêm trọng",
            _ => "Khủng hoảng",
        }
    }
}

impl Default for EmotionalLevel {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

impl TryFrom<i64> for EmotionalLevel {
    type Error = ValidationError;

    fn try_from(level: i64) -> Result<Self, Self::Error> {
        Self::new(level)
    }
}

impl From<EmotionalLevel> for u8 {
    fn from(level: EmotionalLevel) -> Self {
        level.0
    }
}

impl fmt::Display for EmotionalLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wearable readings that inform tone but are never echoed to the user
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiometricSnapshot {
    /// Beats per minute
    pub heart_rate: f64,
    /// Heart rate variability, milliseconds
    pub hrv: f64,
    /// 0-100
    pub sleep_quality: f64,
}

impl BiometricSnapshot {
    /// Deterministic estimate derived from the emotional level alone
    pub fn for_level(level: EmotionalLevel) -> Self {
        let step = f64::from(level.get() - 1);
        Self {
            heart_rate: 75.0 + step * 5.0,
            hrv: 60.0 - step * 10.0,
            sleep_quality: 80.0 - step * 10.0,
        }
    }
}
