use std::ops::ControlFlow;

use chrono::{DateTime, Utc};

use crate::domain::{FeedEntry, WatermarkRecord};

/// What one entry does to a newest-first scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Excluded category: ignore it and keep going.
    Skip,
    /// Not newer than the watermark: everything after it is seen.
    Stop,
    /// Strictly newer: new content.
    Take,
}

pub fn step(entry: &FeedEntry, watermark: &WatermarkRecord) -> Step {
    if entry.excluded {
        Step::Skip
    } else if watermark.is_newer(entry.published) {
        Step::Take
    } else {
        Step::Stop
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    /// New entries, oldest first.
    pub new_entries: Vec<FeedEntry>,
    /// Published time of the newest new entry. `None` iff nothing is new.
    pub new_watermark: Option<DateTime<Utc>>,
    pub skipped: usize,
}

/// Find the entries of a newest-first page that are newer than `watermark`.
pub fn scan(entries: &[FeedEntry], watermark: &WatermarkRecord) -> ScanOutcome {
    let mut skipped = 0;

    let flow = entries.iter().try_fold(Vec::new(), |mut taken, entry| {
        match step(entry, watermark) {
            Step::Skip => {
                skipped += 1;
                ControlFlow::Continue(taken)
            }
            Step::Take => {
                taken.push(entry.clone());
                ControlFlow::Continue(taken)
            }
            Step::Stop => ControlFlow::Break(taken),
        }
    });

    let mut new_entries = match flow {
        ControlFlow::Continue(taken) | ControlFlow::Break(taken) => taken,
    };
    let new_watermark = new_entries.first().map(|e| e.published);
    new_entries.reverse();

    ScanOutcome {
        new_entries,
        new_watermark,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    fn watermark(day: u32) -> WatermarkRecord {
        WatermarkRecord {
            feed_id: "UC1".into(),
            name: "Alpha".into(),
            last_seen: t(day),
        }
    }

    fn entry(id: &str, day: u32) -> FeedEntry {
        FeedEntry::new(id, t(day), id)
    }

    fn excluded(id: &str, day: u32) -> FeedEntry {
        FeedEntry::new(format!("{} #shorts", id), t(day), id).classify("#shorts")
    }

    fn ids(outcome: &ScanOutcome) -> Vec<&str> {
        outcome
            .new_entries
            .iter()
            .map(|e| e.content_id.as_str())
            .collect()
    }

    #[test]
    fn test_new_entries_come_out_oldest_first() {
        let page = [entry("t5", 5), entry("t4", 4), entry("t3", 3), entry("t2", 2), entry("t1", 1)];
        let outcome = scan(&page, &watermark(2));

        assert_eq!(ids(&outcome), vec!["t3", "t4", "t5"]);
        assert_eq!(outcome.new_watermark, Some(t(5)));
    }

    #[test]
    fn test_stop_immediately() {
        let page = [entry("t2", 2), entry("t1", 1)];
        let outcome = scan(&page, &watermark(2));

        assert!(outcome.new_entries.is_empty());
        assert_eq!(outcome.new_watermark, None);
    }

    #[test]
    fn test_exclude_then_stop() {
        let page = [excluded("s9", 9), entry("t2", 2), entry("t5", 5)];
        let outcome = scan(&page, &watermark(2));

        assert!(outcome.new_entries.is_empty());
        assert_eq!(outcome.new_watermark, None);
        assert_eq!(outcome.skipped, 1);
    }

    #[test]
    fn test_exclude_then_continue() {
        let page = [excluded("s9", 9), entry("t4", 4), excluded("s3", 3), entry("t3", 3), entry("t1", 1)];
        let outcome = scan(&page, &watermark(2));

        assert_eq!(ids(&outcome), vec!["t3", "t4"]);
        assert_eq!(outcome.new_watermark, Some(t(4)));
        assert_eq!(outcome.skipped, 2);
    }

    #[test]
    fn test_all_excluded_page_is_not_new() {
        let page = [excluded("s5", 5), excluded("s4", 4), excluded("s3", 3)];
        let outcome = scan(&page, &watermark(1));

        assert!(outcome.new_entries.is_empty());
        assert_eq!(outcome.new_watermark, None);
        assert_eq!(outcome.skipped, 3);
    }

    #[test]
    fn test_equal_timestamp_stops() {
        let page = [entry("t2", 2)];
        assert_eq!(scan(&page, &watermark(2)).new_watermark, None);
    }

    #[test]
    fn test_entries_after_stop_are_ignored_even_if_newer() {
        let page = [entry("t3", 3), entry("t1", 1), entry("t9", 9)];
        let outcome = scan(&page, &watermark(2));

        assert_eq!(ids(&outcome), vec!["t3"]);
        assert_eq!(outcome.new_watermark, Some(t(3)));
    }

    #[test]
    fn test_whole_page_new() {
        let page = [entry("t5", 5), entry("t4", 4)];
        let outcome = scan(&page, &watermark(1));
        assert_eq!(ids(&outcome), vec!["t4", "t5"]);
    }

    #[test]
    fn test_empty_page() {
        let outcome = scan(&[], &watermark(1));
        assert_eq!(outcome, ScanOutcome::default());
    }

    #[test]
    fn test_step_classification() {
        let mark = watermark(2);
        assert_eq!(step(&excluded("s", 1), &mark), Step::Skip);
        assert_eq!(step(&entry("a", 2), &mark), Step::Stop);
        assert_eq!(step(&entry("b", 3), &mark), Step::Take);
    }
}
