//! Collapses a window of reports into one snapshot per vehicle.

use std::collections::HashMap;

use crate::report::RawReport;

/// The latest report per vehicle, kept in first-seen vehicle order so that
/// downstream stable sorting is deterministic for a given input.
#[derive(Debug, Default)]
pub struct Snapshots {
    index: HashMap<String, usize>,
    reports: Vec<RawReport>,
}

impl Snapshots {
    /// Offers a report; it replaces the current snapshot for its vehicle only
    /// when its timestamp is strictly newer.
    pub fn offer(&mut self, report: RawReport) {
        match self.index.get(&report.vehicle_id) {
            Some(&slot) => {
                if report.effective_timestamp() > self.reports[slot].effective_timestamp() {
                    self.reports[slot] = report;
                }
            }
            None => {
                self.index
                    .insert(report.vehicle_id.clone(), self.reports.len());
                self.reports.push(report);
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn get(&self, vehicle_id: &str) -> Option<&RawReport> {
        self.index.get(vehicle_id).map(|&slot| &self.reports[slot])
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RawReport> {
        self.reports.iter()
    }
}

/// Last-write-wins reduction by timestamp. Single pass, O(n).
pub fn dedupe<I>(reports: I) -> Snapshots
where
    I: IntoIterator<Item = RawReport>,
{
    let mut snapshots = Snapshots::default();
    for report in reports {
        snapshots.offer(report);
    }
    snapshots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::sample_report;

    #[test]
    fn test_newer_timestamp_replaces() {
        let snapshots = dedupe(vec![
            sample_report("S8-7", 100, 1.0, 1.0),
            sample_report("S8-7", 200, 2.0, 2.0),
        ]);

        assert_eq!(snapshots.len(), 1);
        let kept = snapshots.get("S8-7").unwrap();
        assert_eq!(kept.timestamp, Some(200));
        assert_eq!(kept.position, geo::coord! { x: 2.0, y: 2.0 });
    }

    #[test]
    fn test_older_or_equal_timestamp_is_ignored() {
        let snapshots = dedupe(vec![
            sample_report("S8-7", 200, 2.0, 2.0),
            sample_report("S8-7", 100, 1.0, 1.0),
            sample_report("S8-7", 200, 3.0, 3.0),
        ]);

        let kept = snapshots.get("S8-7").unwrap();
        assert_eq!(kept.position, geo::coord! { x: 2.0, y: 2.0 });
    }

    #[test]
    fn test_missing_timestamp_loses_to_any_positive() {
        let mut untimed = sample_report("S8-7", 0, 9.0, 9.0);
        untimed.timestamp = None;

        let snapshots = dedupe(vec![untimed, sample_report("S8-7", 1, 1.0, 1.0)]);
        assert_eq!(snapshots.get("S8-7").unwrap().timestamp, Some(1));
    }

    #[test]
    fn test_max_timestamp_wins_in_every_order() {
        let reports = vec![
            sample_report("S8-1", 30, 3.0, 0.0),
            sample_report("S8-1", 10, 1.0, 0.0),
            sample_report("S8-1", 50, 5.0, 0.0),
            sample_report("S8-1", 20, 2.0, 0.0),
        ];

        // Every rotation and its reverse.
        for shift in 0..reports.len() {
            let mut rotated = reports.clone();
            rotated.rotate_left(shift);
            let mut reversed = rotated.clone();
            reversed.reverse();

            for batch in [rotated, reversed] {
                let snapshots = dedupe(batch);
                assert_eq!(snapshots.len(), 1);
                assert_eq!(snapshots.get("S8-1").unwrap().timestamp, Some(50));
            }
        }
    }

    #[test]
    fn test_one_snapshot_per_vehicle_in_first_seen_order() {
        let snapshots = dedupe(vec![
            sample_report("b", 1, 0.0, 0.0),
            sample_report("a", 1, 0.0, 0.0),
            sample_report("b", 2, 0.0, 0.0),
            sample_report("c", 1, 0.0, 0.0),
        ]);

        let ids: Vec<_> = snapshots.iter().map(|r| r.vehicle_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_empty_batch() {
        let snapshots = dedupe(Vec::new());
        assert!(snapshots.is_empty());
    }
}
