use shared::{Location, LocationId, NewLocation};

use super::client::{ApiClient, Method, RequestBody, Transport};
use super::{ApiError, optional_text, required_text};

impl<T: Transport> ApiClient<T> {
    pub async fn list_locations(&self) -> Result<Vec<Location>, ApiError> {
        self.get_json("/api/locations").await
    }

    pub async fn create_location(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<Location, ApiError> {
        let body = NewLocation {
            name: required_text(name, "Location name is required.")?,
            description: optional_text(description),
        };
        let json = serde_json::to_string(&body).map_err(|e| ApiError::Decode(e.to_string()))?;

        self.send_json(Method::Post, "/api/locations", RequestBody::Json(json))
            .await
    }

    /// Fails with a conflict while the location still owns detections.
    pub async fn delete_location(&self, id: LocationId) -> Result<(), ApiError> {
        self.execute(Method::Delete, &format!("/api/locations/{}", id))
            .await
    }
}
