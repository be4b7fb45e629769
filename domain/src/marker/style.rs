//! Marker visual weight and color.
//!
//! Derived from the latest problem snapshot on every read, never stored.

use crate::problem::{Problem, ProblemStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Size of a marker with only the reporter's confirmation.
pub const BASE_MARKER_SIZE: u32 = 35;

/// Hard ceiling on marker footprint.
pub const MAX_MARKER_SIZE: u32 = 70;

/// Growth per additional confirmation.
pub const MARKER_SIZE_STEP: u32 = 4;

/// Marker size for a confirmation count.
///
/// `clamp(35 + (count - 1) * 4, 35, 70)`
///
/// # Examples
///
/// ```
/// use zeladoria_domain::marker::visual_weight;
///
/// assert_eq!(visual_weight(1), 35);
/// assert_eq!(visual_weight(2), 39);
/// assert_eq!(visual_weight(10), 70); // 71 clamped
/// ```
pub fn visual_weight(confirmation_count: u32) -> u32 {
    let growth = confirmation_count
        .saturating_sub(1)
        .saturating_mul(MARKER_SIZE_STEP);
    BASE_MARKER_SIZE
        .saturating_add(growth)
        .clamp(BASE_MARKER_SIZE, MAX_MARKER_SIZE)
}

/// Semantic color of a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorToken {
    Alert,
    Warning,
    Success,
}

impl ColorToken {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorToken::Alert => "alert",
            ColorToken::Warning => "warning",
            ColorToken::Success => "success",
        }
    }

    /// Reference palette for web renderers.
    pub fn hex(&self) -> &'static str {
        match self {
            ColorToken::Alert => "#dc3545",
            ColorToken::Warning => "#fd7e14",
            ColorToken::Success => "#198754",
        }
    }
}

impl fmt::Display for ColorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Marker color for a status.
pub fn visual_color(status: ProblemStatus) -> ColorToken {
    match status {
        ProblemStatus::Open => ColorToken::Alert,
        ProblemStatus::InReview => ColorToken::Warning,
        ProblemStatus::Resolved => ColorToken::Success,
    }
}

/// Everything a renderer needs to draw a pin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerStyle {
    pub size: u32,
    pub font_size: f32,
    /// Offset of the coordinate within the icon: bottom-center, like a pin.
    pub anchor: (f32, f32),
    pub color: ColorToken,
}

impl MarkerStyle {
    pub fn new(confirmation_count: u32, status: ProblemStatus) -> Self {
        let size = visual_weight(confirmation_count);
        let size_f = size as f32;
        Self {
            size,
            font_size: size_f * 0.5,
            anchor: (size_f / 2.0, size_f),
            color: visual_color(status),
        }
    }

    pub fn for_problem(problem: &Problem) -> Self {
        Self::new(problem.confirmation_count(), problem.status())
    }
}
