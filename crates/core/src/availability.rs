//! Zone availability: time/zone overlap between bookings.

use serde::{Deserialize, Serialize};

use crate::booking::{normalize_zone_ids, TimeWindow};
use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// An existing booking occupying one or more zones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookedSlot {
    pub id: DbId,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub zone_ids: Vec<DbId>,
}

/// A booking that blocks the requested window, with the shared zones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub id: DbId,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub zone_ids: Vec<DbId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityReport {
    pub available: bool,
    pub conflicts: Vec<Conflict>,
}

/// What to check: a branch, its zones and a window, optionally ignoring the
/// booking being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityQuery {
    pub branch_id: DbId,
    pub zone_ids: Vec<DbId>,
    pub window: TimeWindow,
    pub exclude_id: Option<DbId>,
}

/// Body of `POST /appointments/check`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AvailabilityRequest {
    pub branch_id: Option<DbId>,
    #[serde(default)]
    pub zone_ids: Vec<DbId>,
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
    /// Booking to leave out, used when re-checking an edit.
    pub appointment_id: Option<DbId>,
}

impl AvailabilityRequest {
    pub fn query(&self) -> Result<AvailabilityQuery, CoreError> {
        let branch_id = self
            .branch_id
            .ok_or_else(|| CoreError::Validation("branch_id is required".to_string()))?;
        let zone_ids = normalize_zone_ids(&self.zone_ids)?;
        let (Some(start), Some(end)) = (self.start_time, self.end_time) else {
            return Err(CoreError::Validation(
                "start_time and end_time are required".to_string(),
            ));
        };
        Ok(AvailabilityQuery {
            branch_id,
            zone_ids,
            window: TimeWindow::new(start, end)?,
            exclude_id: self.appointment_id,
        })
    }
}

/// Build the availability report for `query` from candidate bookings.
///
/// Candidates are expected to be pre-filtered by branch; the zone, window
/// and exclusion rules are applied here. Conflicts come back ordered by
/// start time.
pub fn check(
    query: &AvailabilityQuery,
    slots: impl IntoIterator<Item = BookedSlot>,
) -> AvailabilityReport {
    let mut conflicts: Vec<Conflict> = slots
        .into_iter()
        .filter(|slot| Some(slot.id) != query.exclude_id)
        .filter(|slot| query.window.overlaps(slot.start_time, slot.end_time))
        .filter_map(|slot| {
            let mut shared: Vec<DbId> = slot
                .zone_ids
                .iter()
                .copied()
                .filter(|z| query.zone_ids.contains(z))
                .collect();
            if shared.is_empty() {
                return None;
            }
            shared.sort_unstable();
            shared.dedup();
            Some(Conflict {
                id: slot.id,
                start_time: slot.start_time,
                end_time: slot.end_time,
                zone_ids: shared,
            })
        })
        .collect();

    conflicts.sort_by(|a, b| a.start_time.cmp(&b.start_time).then(a.id.cmp(&b.id)));

    AvailabilityReport {
        available: conflicts.is_empty(),
        conflicts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    fn at(h: u32, m: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2025, 3, 10, h, m, 0).unwrap()
    }

    fn slot(id: DbId, from: (u32, u32), to: (u32, u32), zones: &[DbId]) -> BookedSlot {
        BookedSlot {
            id,
            start_time: at(from.0, from.1),
            end_time: at(to.0, to.1),
            zone_ids: zones.to_vec(),
        }
    }

    fn query(zones: &[DbId], exclude_id: Option<DbId>) -> AvailabilityQuery {
        AvailabilityQuery {
            branch_id: 1,
            zone_ids: zones.to_vec(),
            window: TimeWindow::new(at(10, 0), at(11, 0)).unwrap(),
            exclude_id,
        }
    }

    #[test]
    fn partial_overlap_conflicts() {
        let report = check(&query(&[1], None), vec![slot(7, (10, 30), (11, 30), &[1])]);
        assert!(!report.available);
        assert_eq!(report.conflicts[0].id, 7);
        assert_eq!(report.conflicts[0].zone_ids, vec![1]);
    }

    #[test]
    fn back_to_back_is_available() {
        let report = check(
            &query(&[1], None),
            vec![slot(7, (11, 0), (12, 0), &[1]), slot(8, (9, 0), (10, 0), &[1])],
        );
        assert!(report.available);
        assert!(report.conflicts.is_empty());
    }

    #[test]
    fn different_zone_is_available() {
        let report = check(&query(&[1], None), vec![slot(7, (10, 0), (11, 0), &[2])]);
        assert!(report.available);
    }

    #[test]
    fn excluded_booking_never_conflicts() {
        let report = check(&query(&[1], Some(7)), vec![slot(7, (10, 0), (11, 0), &[1])]);
        assert!(report.available);
    }

    #[test]
    fn conflicts_report_shared_zones_in_start_order() {
        let report = check(
            &query(&[1, 2], None),
            vec![
                slot(9, (10, 45), (11, 15), &[3, 2]),
                slot(4, (9, 30), (10, 15), &[1, 2, 5]),
            ],
        );
        assert_eq!(report.conflicts.len(), 2);
        assert_eq!(report.conflicts[0].id, 4);
        assert_eq!(report.conflicts[0].zone_ids, vec![1, 2]);
        assert_eq!(report.conflicts[1].id, 9);
        assert_eq!(report.conflicts[1].zone_ids, vec![2]);
    }

    #[test]
    fn request_requires_zones_and_window() {
        let req = AvailabilityRequest {
            branch_id: Some(1),
            zone_ids: vec![],
            start_time: Some(at(10, 0)),
            end_time: Some(at(11, 0)),
            appointment_id: None,
        };
        assert_matches!(req.query(), Err(CoreError::Validation(_)));

        let req = AvailabilityRequest {
            zone_ids: vec![1],
            end_time: None,
            ..req
        };
        assert_matches!(req.query(), Err(CoreError::Validation(_)));
    }
}
