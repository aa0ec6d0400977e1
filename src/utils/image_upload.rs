use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::error::AttendanceError;

/// Client for a Cloudinary-style unsigned upload endpoint.
#[derive(Clone)]
pub struct ImageUploader {
    client: reqwest::Client,
    url: Option<String>,
    preset: Option<String>,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: String,
}

/// Accepts either a full data URI or bare base64 (assumed JPEG).
pub fn as_data_uri(base64_image: &str) -> String {
    let trimmed = base64_image.trim();
    if trimmed.starts_with("data:") {
        trimmed.to_string()
    } else {
        format!("data:image/jpeg;base64,{trimmed}")
    }
}

impl ImageUploader {
    pub fn new(
        url: Option<String>,
        preset: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url, preset })
    }

    pub fn is_enabled(&self) -> bool {
        self.url.is_some()
    }

    /// Uploads the photo and returns its public URL.
    ///
    /// Returns `Ok(None)` when no upload endpoint is configured.
    pub async fn upload(
        &self,
        base64_image: &str,
        folder: &str,
    ) -> Result<Option<String>, AttendanceError> {
        let Some(url) = &self.url else {
            tracing::warn!("IMAGE_UPLOAD_URL not set, attendance photo dropped");
            return Ok(None);
        };

        let response = self
            .client
            .post(url)
            .json(&json!({
                "file": as_data_uri(base64_image),
                "upload_preset": self.preset,
                "folder": folder,
            }))
            .send()
            .await
            .map_err(|e| AttendanceError::Upload(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AttendanceError::Upload(format!(
                "upload endpoint returned {}",
                response.status()
            )));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| AttendanceError::Upload(e.to_string()))?;

        tracing::debug!(url = %body.secure_url, "Attendance photo uploaded");
        Ok(Some(body.secure_url))
    }
}
