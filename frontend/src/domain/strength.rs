//! Password strength heuristic for the registration form.
//!
//! The score is a sum of fixed bonuses for length and character variety.
//! Level thresholds use the raw score; the bar width uses the clamped
//! percentage.

use std::fmt;

use super::validation::utf16_len;

/// Coarse strength bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StrengthLevel {
    Weak,
    Fair,
    Good,
    Strong,
}

impl StrengthLevel {
    fn from_score(score: u32) -> Self {
        match score {
            0..30 => Self::Weak,
            30..60 => Self::Fair,
            60..80 => Self::Good,
            _ => Self::Strong,
        }
    }

    /// Lowercase identifier, e.g. `fair`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weak => "weak",
            Self::Fair => "fair",
            Self::Good => "good",
            Self::Strong => "strong",
        }
    }

    /// Text shown next to the bar.
    pub fn label(self) -> &'static str {
        match self {
            Self::Weak => "Weak password",
            Self::Fair => "Fair password",
            Self::Good => "Good password",
            Self::Strong => "Strong password",
        }
    }
}

impl fmt::Display for StrengthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of scoring one password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrengthResult {
    /// Raw heuristic score.
    pub score: u32,
    /// Bucket derived from the raw score.
    pub level: StrengthLevel,
    /// Display label for `level`.
    pub label: &'static str,
    /// Hints such as `too short`.
    pub feedback: Vec<&'static str>,
}

impl StrengthResult {
    /// Bar width in percent, clamped to 100.
    pub fn percentage(&self) -> u32 {
        self.score.min(100)
    }
}

/// Score a password.
///
/// Callers suppress the indicator for empty input; see [`describe`].
///
/// # Examples
/// ```
/// use frontend::domain::{score, StrengthLevel};
///
/// let result = score("Abcdef12!");
/// assert_eq!(result.score, 90);
/// assert_eq!(result.level, StrengthLevel::Strong);
/// assert_eq!(score("ab").level, StrengthLevel::Weak);
/// ```
pub fn score(password: &str) -> StrengthResult {
    let length = utf16_len(password);
    let mut total = 0_u32;
    let mut feedback = Vec::new();

    if length >= 8 {
        total += 25;
    } else if length >= 6 {
        total += 10;
    } else {
        feedback.push("too short");
    }

    if password.chars().any(|c| c.is_ascii_lowercase()) {
        total += 15;
    }
    if password.chars().any(|c| c.is_ascii_uppercase()) {
        total += 15;
    }
    if password.chars().any(|c| c.is_ascii_digit()) {
        total += 15;
    }
    if password.chars().any(|c| !c.is_ascii_alphanumeric()) {
        total += 20;
    }
    if length >= 12 {
        total += 10;
    }

    let level = StrengthLevel::from_score(total);
    StrengthResult {
        score: total,
        level,
        label: level.label(),
        feedback,
    }
}

/// Score a password for display, returning `None` for empty input.
pub fn describe(password: &str) -> Option<StrengthResult> {
    if password.is_empty() {
        None
    } else {
        Some(score(password))
    }
}
