//! Turns the per-horse probabilities of an analysis into a display verdict.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::model::{AnalyzeResponse, Detection, HorseId, HorseScore};

pub const HIGH_CONFIDENCE: f64 = 0.70;
pub const MEDIUM_CONFIDENCE: f64 = 0.40;
pub const UNKNOWN_HORSE_LABEL: &str = "Unknown";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    /// 0.70 and above is high, 0.40 up to 0.70 is medium, the rest is low.
    pub fn classify(confidence: f64) -> Self {
        if confidence >= HIGH_CONFIDENCE {
            ConfidenceLevel::High
        } else if confidence >= MEDIUM_CONFIDENCE {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "confidence-high",
            ConfidenceLevel::Medium => "confidence-medium",
            ConfidenceLevel::Low => "confidence-low",
        }
    }
}

/// Probability as a whole percentage, rounded half away from zero.
pub fn confidence_percent(confidence: f64) -> u8 {
    (confidence.clamp(0.0, 1.0) * 100.0).round() as u8
}

/// Anything the service has scored against the registered horses.
pub trait Reviewable {
    fn matched_horse_id(&self) -> Option<HorseId>;
    fn matched_horse_name(&self) -> Option<&str>;
    fn confidence(&self) -> f64;
    fn horse_scores(&self) -> &[HorseScore];
    fn raw_response(&self) -> Option<&str>;
}

impl Reviewable for AnalyzeResponse {
    fn matched_horse_id(&self) -> Option<HorseId> {
        self.horse_id
    }

    fn matched_horse_name(&self) -> Option<&str> {
        self.horse_name.as_deref()
    }

    fn confidence(&self) -> f64 {
        self.confidence
    }

    fn horse_scores(&self) -> &[HorseScore] {
        &self.horse_scores
    }

    fn raw_response(&self) -> Option<&str> {
        self.raw_vlm_response.as_deref()
    }
}

impl Reviewable for Detection {
    fn matched_horse_id(&self) -> Option<HorseId> {
        self.horse_id
    }

    // Detections only carry the id; the name comes from the scores if at all.
    fn matched_horse_name(&self) -> Option<&str> {
        let matched = self.horse_id?;
        self.horse_scores()
            .iter()
            .find(|score| score.horse_id == Some(matched))
            .map(|score| score.horse_name.as_str())
    }

    fn confidence(&self) -> f64 {
        self.confidence
    }

    fn horse_scores(&self) -> &[HorseScore] {
        self.horse_scores.as_deref().unwrap_or_default()
    }

    fn raw_response(&self) -> Option<&str> {
        self.raw_vlm_response.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedScore {
    pub score: HorseScore,
    pub is_best_match: bool,
    pub level: ConfidenceLevel,
    pub percent: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub ranked_scores: Vec<RankedScore>,
    pub best_match_id: Option<HorseId>,
    pub classification: ConfidenceLevel,
    /// Set only when the service returned no candidates.
    pub fallback_label: Option<String>,
    pub raw_response: Option<String>,
}

impl Verdict {
    pub fn review<R: Reviewable + ?Sized>(subject: &R) -> Self {
        // The server's horse_id is authoritative; the client never re-derives
        // the best match from its own ranking.
        let best_match_id = subject.matched_horse_id();
        let ranked_scores: Vec<RankedScore> = rank_scores(subject.horse_scores())
            .into_iter()
            .map(|score| RankedScore {
                is_best_match: best_match_id.is_some() && score.horse_id == best_match_id,
                level: ConfidenceLevel::classify(score.probability),
                percent: confidence_percent(score.probability),
                score,
            })
            .collect();

        let fallback_label = ranked_scores
            .is_empty()
            .then(|| fallback_label(subject.matched_horse_name(), best_match_id));

        Self {
            ranked_scores,
            best_match_id,
            classification: ConfidenceLevel::classify(subject.confidence()),
            fallback_label,
            raw_response: subject.raw_response().map(str::to_owned),
        }
    }

    pub fn best_match(&self) -> Option<&RankedScore> {
        self.ranked_scores.iter().find(|ranked| ranked.is_best_match)
    }

    /// Name to headline the verdict with.
    pub fn headline(&self) -> String {
        if let Some(label) = &self.fallback_label {
            return label.clone();
        }
        self.best_match()
            .map(|ranked| ranked.score.horse_name.clone())
            .unwrap_or_else(|| UNKNOWN_HORSE_LABEL.to_string())
    }
}

/// Sorts by probability, highest first. Equal probabilities keep their
/// original order.
pub fn rank_scores(scores: &[HorseScore]) -> Vec<HorseScore> {
    let mut ranked = scores.to_vec();
    ranked.sort_by(|a, b| b.probability.total_cmp(&a.probability));
    ranked
}

fn fallback_label(name: Option<&str>, horse_id: Option<HorseId>) -> String {
    match (name, horse_id) {
        (Some(name), _) if !name.trim().is_empty() => name.to_string(),
        (_, Some(id)) => format!("Horse #{}", id),
        _ => UNKNOWN_HORSE_LABEL.to_string(),
    }
}
