//! Types and pure logic shared by every HorseWatch client surface.

pub mod images;
pub mod model;
pub mod review;
pub mod timeline;
pub mod timestamp;

pub use images::resolve_image_url;
pub use model::{
    AnalyzeResponse, Detection, DetectionFilter, DetectionId, Horse, HorseDetail, HorseId,
    HorseScore, Location, LocationId, NewLocation,
};
pub use review::{ConfidenceLevel, RankedScore, Reviewable, Verdict};
pub use timeline::{DashboardSummary, DateGroup, group_by_date};
