use shared::{AnalyzeResponse, Detection, DetectionFilter, HorseId, LocationId};

use super::client::{ApiClient, Method, RequestBody, Transport};
use super::{ApiError, ImageUpload, required_image};

impl<T: Transport> ApiClient<T> {
    pub async fn list_detections(&self, filter: DetectionFilter) -> Result<Vec<Detection>, ApiError> {
        self.get_json(&format!("/api/detections{}", filter.query_string()))
            .await
    }

    pub async fn timeline(&self, horse_id: HorseId) -> Result<Vec<Detection>, ApiError> {
        self.get_json(&format!("/api/detections/{}/timeline", horse_id))
            .await
    }

    /// Submits a capture for identification. The service records a detection
    /// as a side effect.
    pub async fn analyze(
        &self,
        location_id: Option<LocationId>,
        image: ImageUpload,
    ) -> Result<AnalyzeResponse, ApiError> {
        let location_id = location_id
            .ok_or_else(|| ApiError::Validation("Select a location first.".into()))?;
        let image = required_image(image, "Select an image to analyze.")?;

        self.send_json(
            Method::Post,
            &format!("/api/detections/analyze?location_id={}", location_id),
            RequestBody::Multipart(vec![image.into_part("image")]),
        )
        .await
    }
}
