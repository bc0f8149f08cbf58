use chrono::{DateTime, Utc};
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

use crate::timestamp;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From,
)]
#[serde(transparent)]
pub struct HorseId(pub i64);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From,
)]
#[serde(transparent)]
pub struct LocationId(pub i64);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From,
)]
#[serde(transparent)]
pub struct DetectionId(pub i64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Horse {
    pub id: HorseId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub reference_image_path: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorseDetail {
    pub horse: Horse,
    #[serde(default)]
    pub recent_detections: Vec<Detection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of `POST /api/locations`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewLocation {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Probability the analysis assigned to one candidate horse.
///
/// `horse_id` is `None` for the "unknown horse" bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorseScore {
    pub horse_id: Option<HorseId>,
    pub horse_name: String,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub id: DetectionId,
    pub horse_id: Option<HorseId>,
    pub location_id: LocationId,
    pub image_path: String,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub confidence: f64,
    #[serde(default)]
    pub raw_vlm_response: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub horse_scores: Option<Vec<HorseScore>>,
}

impl Detection {
    pub fn is_matched(&self) -> bool {
        self.horse_id.is_some()
    }

    /// Name of the highest scoring candidate, if the detection carries scores.
    pub fn top_candidate_name(&self) -> Option<&str> {
        self.horse_scores
            .as_deref()?
            .iter()
            .reduce(|best, score| {
                if score.probability > best.probability {
                    score
                } else {
                    best
                }
            })
            .map(|score| score.horse_name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub detection_id: DetectionId,
    pub horse_id: Option<HorseId>,
    pub horse_name: Option<String>,
    pub location_id: LocationId,
    pub action: String,
    pub confidence: f64,
    pub kept: bool,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    pub image_path: String,
    #[serde(default)]
    pub raw_vlm_response: Option<String>,
    #[serde(default)]
    pub horse_scores: Vec<HorseScore>,
}

impl AnalyzeResponse {
    pub fn status_label(&self) -> &'static str {
        if self.kept { "Kept" } else { "Discarded" }
    }
}

/// Optional filters for `GET /api/detections`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DetectionFilter {
    pub horse_id: Option<HorseId>,
    pub location_id: Option<LocationId>,
}

impl DetectionFilter {
    pub fn for_horse(horse_id: HorseId) -> Self {
        Self {
            horse_id: Some(horse_id),
            location_id: None,
        }
    }

    /// Query string including the leading `?`, or empty when no filter is set.
    pub fn query_string(&self) -> String {
        let mut params = Vec::with_capacity(2);
        if let Some(horse_id) = self.horse_id {
            params.push(format!("horse_id={}", horse_id));
        }
        if let Some(location_id) = self.location_id {
            params.push(format!("location_id={}", location_id));
        }

        if params.is_empty() {
            String::new()
        } else {
            format!("?{}", params.join("&"))
        }
    }
}
