use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{Detection, Horse, Location};

pub const RECENT_ACTIVITY_LIMIT: usize = 10;

/// Detections recorded on one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateGroup<'a> {
    pub date: NaiveDate,
    pub detections: Vec<&'a Detection>,
}

/// Groups detections by day. Days appear in the order they are first seen and
/// each day keeps the input order, so a server-sorted timeline stays sorted.
pub fn group_by_date(detections: &[Detection]) -> Vec<DateGroup<'_>> {
    let mut groups: Vec<DateGroup<'_>> = Vec::new();

    for detection in detections {
        let date = detection.timestamp.date_naive();
        match groups.iter_mut().find(|group| group.date == date) {
            Some(group) => group.detections.push(detection),
            None => groups.push(DateGroup {
                date,
                detections: vec![detection],
            }),
        }
    }

    groups
}

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub horse_count: usize,
    pub location_count: usize,
    pub detection_count: usize,
    pub matched_count: usize,
    pub recent: Vec<RecentActivity>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentActivity {
    pub detection: Detection,
    pub top_candidate: Option<String>,
}

impl DashboardSummary {
    /// `detections` is expected newest first, as the service returns them.
    pub fn build(horses: &[Horse], locations: &[Location], detections: &[Detection]) -> Self {
        let recent = detections
            .iter()
            .take(RECENT_ACTIVITY_LIMIT)
            .map(|detection| RecentActivity {
                top_candidate: detection
                    .is_matched()
                    .then(|| detection.top_candidate_name().map(str::to_owned))
                    .flatten(),
                detection: detection.clone(),
            })
            .collect();

        Self {
            horse_count: horses.len(),
            location_count: locations.len(),
            detection_count: detections.len(),
            matched_count: detections.iter().filter(|d| d.is_matched()).count(),
            recent,
        }
    }
}
