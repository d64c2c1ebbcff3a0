// Copyright 2025 Cowboy AI, LLC.

//! Shared helpers for half-open effective-date ranges.
//!
//! Documents, constraints, and relationships are all "in force" over a
//! half-open interval `[start, end)` with an optionally open end. This
//! module gives that interval one implementation instead of three.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A half-open effective-date range: `start` is inclusive, `end` (if
/// present) is exclusive... except callers that model closed intervals
/// (relationship `effectiveEnd`) treat `end` as inclusive via
/// [`EffectiveRange::contains_inclusive`]. Use the method matching the
/// entity's documented semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveRange {
    /// Start of the range, inclusive.
    pub start: DateTime<Utc>,
    /// End of the range. `None` means open-ended.
    pub end: Option<DateTime<Utc>>,
}

impl EffectiveRange {
    /// Construct a range, open-ended if `end` is `None`.
    pub fn new(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    /// An always-open range starting at `start`.
    pub fn open(start: DateTime<Utc>) -> Self {
        Self { start, end: None }
    }

    /// `true` iff `start <= end` (vacuously true when `end` is `None`).
    pub fn is_well_formed(&self) -> bool {
        match self.end {
            Some(end) => self.start <= end,
            None => true,
        }
    }

    /// Half-open containment: `start <= at` and (`end` absent or `at < end`).
    ///
    /// Used by documents ("in force at") and constraints ("effective at").
    pub fn contains_half_open(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && self.end.map(|end| at < end).unwrap_or(true)
    }

    /// Closed containment: `start <= at <= end` (or no upper bound).
    ///
    /// Used by relationships, whose `effectiveEnd` marks the instant the
    /// edge is still considered current at.
    pub fn contains_inclusive(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && self.end.map(|end| at <= end).unwrap_or(true)
    }
}
