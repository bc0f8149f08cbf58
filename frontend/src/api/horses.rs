use shared::{Horse, HorseDetail, HorseId};

use super::client::{ApiClient, FormPart, Method, RequestBody, Transport};
use super::{ApiError, ImageUpload, optional_text, required_image, required_text};

impl<T: Transport> ApiClient<T> {
    pub async fn list_horses(&self) -> Result<Vec<Horse>, ApiError> {
        self.get_json("/api/horses").await
    }

    pub async fn get_horse(&self, id: HorseId) -> Result<HorseDetail, ApiError> {
        self.get_json(&format!("/api/horses/{}", id)).await
    }

    /// Registers a horse with its reference photo.
    pub async fn create_horse(
        &self,
        name: &str,
        description: Option<&str>,
        image: ImageUpload,
    ) -> Result<Horse, ApiError> {
        let name = required_text(name, "Horse name is required.")?;
        let image = required_image(image, "A reference image is required.")?;

        let mut parts = vec![FormPart::Text {
            name: "name".into(),
            value: name,
        }];
        if let Some(description) = optional_text(description) {
            parts.push(FormPart::Text {
                name: "description".into(),
                value: description,
            });
        }
        parts.push(image.into_part("image"));

        self.send_json(Method::Post, "/api/horses", RequestBody::Multipart(parts))
            .await
    }

    pub async fn delete_horse(&self, id: HorseId) -> Result<(), ApiError> {
        self.execute(Method::Delete, &format!("/api/horses/{}", id))
            .await
    }
}
