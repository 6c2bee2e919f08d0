//! Interval geometry over one employee's day
//!
//! All scans work in minutes from midnight over half-open `[start, end)`
//! ranges and expect their input sorted by start time.

use chrono::{NaiveTime, Timelike};
use timeguard_domain::TimeEntry;

/// Entry bounds in minutes from midnight; an overnight entry's end extends
/// past 1440.
pub(crate) fn entry_range_minutes(entry: &TimeEntry) -> (i64, i64) {
    let start = i64::from(entry.start_time.num_seconds_from_midnight()) / 60;
    let mut end = i64::from(entry.end_time.num_seconds_from_midnight()) / 60;
    if entry.overnight {
        end += 1440;
    }
    (start, end)
}

fn time_from_minutes(minutes: i64) -> NaiveTime {
    let clamped = minutes.clamp(0, 1439) as u32;
    NaiveTime::from_hms_opt(clamped / 60, clamped % 60, 0).unwrap_or(NaiveTime::MIN)
}

/// Two entries whose spans intersect
#[derive(Debug, Clone)]
pub struct OverlapPair<'a> {
    pub first: &'a TimeEntry,
    pub second: &'a TimeEntry,
    pub overlap_minutes: i64,
}

/// Overlaps between adjacent entries in start-time order.
///
/// An earlier entry whose end lies past the next entry's start is an
/// overlap; chained overlaps surface pairwise on re-detection after each
/// repair.
pub fn find_overlaps<'a>(sorted: &[&'a TimeEntry]) -> Vec<OverlapPair<'a>> {
    let mut overlaps = Vec::new();
    for pair in sorted.windows(2) {
        let (_, first_end) = entry_range_minutes(pair[0]);
        let (second_start, second_end) = entry_range_minutes(pair[1]);
        if first_end > second_start {
            overlaps.push(OverlapPair {
                first: pair[0],
                second: pair[1],
                overlap_minutes: first_end.min(second_end) - second_start,
            });
        }
    }
    overlaps
}

/// An uncovered span inside the expected working window
#[derive(Debug, Clone)]
pub struct GapSpan<'a> {
    start_minutes: i64,
    end_minutes: i64,
    /// Entry ending at or before the gap, when one exists
    pub before: Option<&'a TimeEntry>,
    /// Entry starting at or after the gap, when one exists
    pub after: Option<&'a TimeEntry>,
}

impl GapSpan<'_> {
    pub fn start_time(&self) -> NaiveTime {
        time_from_minutes(self.start_minutes)
    }

    pub fn end_time(&self) -> NaiveTime {
        time_from_minutes(self.end_minutes)
    }

    pub fn duration_minutes(&self) -> i64 {
        self.end_minutes - self.start_minutes
    }

    pub fn duration_hours(&self) -> f64 {
        self.duration_minutes() as f64 / 60.0
    }

    /// Stable discriminator for issue identity.
    pub fn key(&self) -> String {
        format!("{}-{}", self.start_minutes, self.end_minutes)
    }
}

/// Uncovered spans of at least `min_gap_minutes` inside
/// `[window_start, window_end)`.
///
/// Spans before the first entry and after the last one count too. Entries
/// with non-positive duration and overnight entries are ignored; they are
/// defects of their own, not coverage.
pub fn find_gaps<'a>(
    sorted: &[&'a TimeEntry],
    window_start: NaiveTime,
    window_end: NaiveTime,
    min_gap_minutes: i64,
) -> Vec<GapSpan<'a>> {
    let window_start = i64::from(window_start.num_seconds_from_midnight()) / 60;
    let window_end = i64::from(window_end.num_seconds_from_midnight()) / 60;

    let mut gaps = Vec::new();
    let mut cursor = window_start;
    let mut previous: Option<&'a TimeEntry> = None;

    for entry in sorted.iter().copied() {
        let (start, end) = entry_range_minutes(entry);
        if end <= start || entry.overnight {
            continue;
        }
        let gap_end = start.min(window_end);
        if gap_end - cursor >= min_gap_minutes {
            gaps.push(GapSpan {
                start_minutes: cursor,
                end_minutes: gap_end,
                before: previous,
                after: Some(entry),
            });
        }
        if end > cursor {
            cursor = end;
            previous = Some(entry);
        }
        if cursor >= window_end {
            break;
        }
    }

    if window_end - cursor >= min_gap_minutes {
        gaps.push(GapSpan {
            start_minutes: cursor,
            end_minutes: window_end,
            before: previous,
            after: None,
        });
    }

    gaps
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use timeguard_domain::{ApprovalStatus, AuditTrail};
    use uuid::Uuid;

    use super::*;

    fn create_test_entry(start: (u32, u32), end: (u32, u32)) -> TimeEntry {
        TimeEntry {
            id: Uuid::new_v4(),
            employee_id: "emp-1".into(),
            project_id: "proj-1".into(),
            task_id: None,
            date: NaiveDate::from_ymd_opt(2024, 10, 24).unwrap(),
            start_time: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
            overnight: false,
            billable: false,
            notes: String::new(),
            locked: false,
            approval: ApprovalStatus::Draft,
            audit: AuditTrail::new("emp-1", Utc::now()),
            change_log: Vec::new(),
        }
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_overlap_detected_for_adjacent_pair() {
        let a = create_test_entry((9, 0), (12, 0));
        let b = create_test_entry((11, 0), (13, 0));
        let sorted = [&a, &b];

        let overlaps = find_overlaps(&sorted);
        assert_eq!(overlaps.len(), 1);
        assert_eq!(overlaps[0].overlap_minutes, 60);
    }

    #[test]
    fn test_touching_entries_are_not_overlapping() {
        let a = create_test_entry((9, 0), (12, 0));
        let b = create_test_entry((12, 0), (13, 0));
        let sorted = [&a, &b];

        assert!(find_overlaps(&sorted).is_empty());
    }

    #[test]
    fn test_gap_between_entries() {
        let a = create_test_entry((9, 0), (11, 0));
        let b = create_test_entry((13, 0), (17, 0));
        let sorted = [&a, &b];

        let gaps = find_gaps(&sorted, at(9, 0), at(17, 0), 30);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].start_time(), at(11, 0));
        assert_eq!(gaps[0].end_time(), at(13, 0));
        assert_eq!(gaps[0].duration_minutes(), 120);
        assert!(gaps[0].before.is_some());
        assert!(gaps[0].after.is_some());
    }

    #[test]
    fn test_gaps_at_window_edges() {
        let entry = create_test_entry((10, 0), (16, 0));
        let sorted = [&entry];

        let gaps = find_gaps(&sorted, at(8, 0), at(18, 0), 30);
        assert_eq!(gaps.len(), 2);
        assert_eq!(gaps[0].start_time(), at(8, 0));
        assert_eq!(gaps[0].end_time(), at(10, 0));
        assert!(gaps[0].before.is_none());
        assert_eq!(gaps[1].start_time(), at(16, 0));
        assert_eq!(gaps[1].end_time(), at(18, 0));
        assert!(gaps[1].after.is_none());
    }

    #[test]
    fn test_short_gap_below_threshold_is_ignored() {
        let a = create_test_entry((9, 0), (12, 0));
        let b = create_test_entry((12, 20), (17, 0));
        let sorted = [&a, &b];

        assert!(find_gaps(&sorted, at(9, 0), at(17, 0), 30).is_empty());
    }

    #[test]
    fn test_fully_covered_window_has_no_gaps() {
        let entry = create_test_entry((8, 0), (18, 0));
        let sorted = [&entry];

        assert!(find_gaps(&sorted, at(9, 0), at(17, 0), 30).is_empty());
    }

    #[test]
    fn test_negative_duration_entry_does_not_cover() {
        let broken = create_test_entry((14, 0), (9, 0));
        let sorted = [&broken];

        let gaps = find_gaps(&sorted, at(9, 0), at(17, 0), 30);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].duration_minutes(), 480);
    }
}
