// Object storage endpoints (profile avatars).

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::Error;

/// Result of an image upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageUpload {
    pub image_url: String,
}

/// An image ready to be sent as a multipart part.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl ApiClient {
    /// Upload a profile image (`POST /storage/{userId}/profile-image`).
    pub async fn upload_profile_image(
        &self,
        user_id: &str,
        image: ImageFile,
    ) -> Result<ImageUpload, Error> {
        let part = Part::bytes(image.bytes.to_vec())
            .file_name(image.file_name)
            .mime_str(&image.content_type)?;
        let form = Form::new().part("image", part);

        self.post_multipart(&format!("storage/{user_id}/profile-image"), form)
            .await
    }
}
