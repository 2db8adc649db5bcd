//! Interval arithmetic for busy/free time computation.
//!
//! Pure functions: overlap testing, merging a set of possibly-overlapping
//! busy intervals into a minimal disjoint cover, and subtracting the merged
//! cover from a day window to obtain free gaps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A half-open time interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    /// Create an interval. Returns `None` when `end <= start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        if end <= start {
            return None;
        }
        Some(Self { start, end })
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Strict overlap test: touching endpoints do not overlap.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Collapse a list of possibly-overlapping intervals into a minimal sorted
/// disjoint cover. Adjacent (touching) intervals are merged as well.
/// O(n log n).
pub fn merge_intervals(mut intervals: Vec<Interval>) -> Vec<Interval> {
    intervals.sort_by_key(|iv| iv.start);

    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    for iv in intervals {
        match merged.last_mut() {
            Some(last) if iv.start <= last.end => {
                last.end = last.end.max(iv.end);
            }
            _ => merged.push(iv),
        }
    }
    merged
}

/// Subtract a merged, sorted busy cover from a day window, returning the
/// free gaps of at least `min_minutes` duration in ascending order.
///
/// `busy` must be the output of [`merge_intervals`]; intervals entirely
/// outside the window are ignored.
pub fn subtract_busy(window: Interval, busy: &[Interval], min_minutes: i64) -> Vec<Interval> {
    let mut gaps = Vec::new();
    let mut cursor = window.start;

    for iv in busy {
        if iv.end <= cursor {
            continue;
        }
        if iv.start >= window.end {
            break;
        }
        if iv.start > cursor {
            if let Some(gap) = Interval::new(cursor, iv.start.min(window.end)) {
                if gap.duration_minutes() >= min_minutes {
                    gaps.push(gap);
                }
            }
        }
        cursor = cursor.max(iv.end.min(window.end));
    }

    if cursor < window.end {
        if let Some(gap) = Interval::new(cursor, window.end) {
            if gap.duration_minutes() >= min_minutes {
                gaps.push(gap);
            }
        }
    }

    gaps
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, hour, min, 0).unwrap()
    }

    fn iv(start_h: u32, start_m: u32, end_h: u32, end_m: u32) -> Interval {
        Interval::new(at(start_h, start_m), at(end_h, end_m)).unwrap()
    }

    #[test]
    fn rejects_empty_interval() {
        assert!(Interval::new(at(10, 0), at(10, 0)).is_none());
        assert!(Interval::new(at(10, 0), at(9, 0)).is_none());
    }

    #[test]
    fn overlap_is_strict() {
        let a = iv(9, 0, 10, 0);
        let b = iv(10, 0, 11, 0);
        let c = iv(9, 30, 10, 30);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
    }

    #[test]
    fn merge_collapses_overlapping_and_adjacent() {
        let merged = merge_intervals(vec![
            iv(13, 0, 14, 0),
            iv(9, 0, 10, 30),
            iv(10, 0, 11, 0),
            iv(11, 0, 12, 0),
        ]);
        assert_eq!(merged, vec![iv(9, 0, 12, 0), iv(13, 0, 14, 0)]);
    }

    #[test]
    fn subtract_emits_leading_middle_and_trailing_gaps() {
        let window = iv(9, 0, 22, 0);
        let busy = vec![iv(10, 0, 11, 0), iv(14, 0, 16, 0)];
        let gaps = subtract_busy(window, &busy, 30);
        assert_eq!(gaps, vec![iv(9, 0, 10, 0), iv(11, 0, 14, 0), iv(16, 0, 22, 0)]);
    }

    #[test]
    fn subtract_filters_short_gaps() {
        let window = iv(9, 0, 12, 0);
        let busy = vec![iv(9, 20, 11, 45)];
        // Leading gap is 20 min, trailing is 15 min: both below the minimum.
        assert!(subtract_busy(window, &busy, 30).is_empty());
    }

    #[test]
    fn subtract_clips_busy_to_window() {
        let window = iv(9, 0, 17, 0);
        let busy = vec![iv(7, 0, 9, 30), iv(16, 30, 19, 0)];
        let gaps = subtract_busy(window, &busy, 30);
        assert_eq!(gaps, vec![iv(9, 30, 16, 30)]);
    }

    #[test]
    fn fully_booked_window_has_no_gaps() {
        let window = iv(9, 0, 17, 0);
        let busy = vec![iv(8, 0, 18, 0)];
        assert!(subtract_busy(window, &busy, 30).is_empty());
    }

    proptest! {
        #[test]
        fn merged_cover_is_sorted_and_disjoint(raw in prop::collection::vec((0i64..720, 1i64..240), 0..40)) {
            let base = at(6, 0);
            let intervals: Vec<Interval> = raw
                .iter()
                .map(|&(offset, len)| {
                    Interval::new(
                        base + Duration::minutes(offset),
                        base + Duration::minutes(offset + len),
                    )
                    .unwrap()
                })
                .collect();

            let merged = merge_intervals(intervals.clone());

            for pair in merged.windows(2) {
                prop_assert!(pair[0].end < pair[1].start);
            }
            // Total covered time never shrinks below any single input and
            // every input is contained in some merged interval.
            for iv in &intervals {
                prop_assert!(merged.iter().any(|m| m.start <= iv.start && iv.end <= m.end));
            }
        }

        #[test]
        fn gaps_never_intersect_busy(raw in prop::collection::vec((0i64..720, 1i64..240), 0..20)) {
            let base = at(6, 0);
            let busy = merge_intervals(
                raw.iter()
                    .map(|&(offset, len)| {
                        Interval::new(
                            base + Duration::minutes(offset),
                            base + Duration::minutes(offset + len),
                        )
                        .unwrap()
                    })
                    .collect(),
            );
            let window = Interval::new(base, base + Duration::minutes(960)).unwrap();

            for gap in subtract_busy(window, &busy, 1) {
                prop_assert!(gap.start >= window.start && gap.end <= window.end);
                for b in &busy {
                    prop_assert!(!gap.overlaps(b));
                }
            }
        }
    }
}
