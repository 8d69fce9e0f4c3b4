use serde::{Deserialize, Serialize};

/// The classifier's structured judgment of whether a text is a valid resume.
///
/// Ephemeral: folded into the candidate record on arrival, never stored on
/// its own. Score and confidence are passed through unvalidated; a score the
/// model omitted (binary mode) defaults to zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Verdict {
    pub valid: bool,
    pub score: i32,
    pub confidence: f64,
    pub reason: String,
}
