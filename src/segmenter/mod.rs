// Response segmentation and exercise consent gating

mod exercise;
mod split;

pub use exercise::{detect_exercise_suggestion, ExerciseSplit, CONSENT_QUESTION, EXERCISE_KEYWORDS};
pub use split::{segment, MAX_MESSAGE_CHARS};
