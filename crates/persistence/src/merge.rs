//! Event -> sample attachment by timestamp.

use contracts::Event;

/// Labels aligned with the sample rows of one batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedLabels {
    /// One entry per sample row
    pub labels: Vec<Option<String>>,
    /// Events later than the last sample, attached to the last row
    pub past_tail: usize,
    /// Events whose row already held a label (the later one wins)
    pub overwritten: usize,
}

/// Attach every event to the first sample at or after its timestamp
///
/// `sample_ts` must be sorted ascending. Ties resolve to the sample with the
/// same timestamp; an event after the last sample goes to the last row.
pub fn merge_events(sample_ts: &[i64], events: &[Event]) -> MergedLabels {
    let mut merged = MergedLabels {
        labels: vec![None; sample_ts.len()],
        ..Default::default()
    };
    let Some(last) = sample_ts.len().checked_sub(1) else {
        merged.past_tail = events.len();
        return merged;
    };

    for event in events {
        let mut row = sample_ts.partition_point(|&ts| ts < event.system_time_stamp);
        if row > last {
            row = last;
            merged.past_tail += 1;
        }
        if merged.labels[row].replace(event.label.clone()).is_some() {
            merged.overwritten += 1;
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_attaches_to_next_sample() {
        let merged = merge_events(&[100, 200, 300], &[Event::new(150, "cue")]);
        assert_eq!(merged.labels, vec![None, Some("cue".to_string()), None]);
        assert_eq!(merged.past_tail, 0);
    }

    #[test]
    fn test_exact_timestamp_tie() {
        let merged = merge_events(&[100, 200, 300], &[Event::new(200, "tie")]);
        assert_eq!(merged.labels[1].as_deref(), Some("tie"));
    }

    #[test]
    fn test_event_before_first_and_after_last() {
        let merged = merge_events(
            &[100, 200, 300],
            &[Event::new(50, "early"), Event::new(400, "late")],
        );
        assert_eq!(merged.labels[0].as_deref(), Some("early"));
        assert_eq!(merged.labels[2].as_deref(), Some("late"));
        assert_eq!(merged.past_tail, 1);
    }

    #[test]
    fn test_same_row_overwritten() {
        let merged = merge_events(
            &[100, 200],
            &[Event::new(110, "first"), Event::new(120, "second")],
        );
        assert_eq!(merged.labels[1].as_deref(), Some("second"));
        assert_eq!(merged.overwritten, 1);
    }

    #[test]
    fn test_no_samples() {
        let merged = merge_events(&[], &[Event::new(1, "orphan")]);
        assert!(merged.labels.is_empty());
        assert_eq!(merged.past_tail, 1);
    }
}
