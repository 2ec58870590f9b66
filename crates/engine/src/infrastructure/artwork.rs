//! HTTP client for the cover art service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::ports::outbound::{CoverArtError, CoverArtPort, CoverArtRequest};

#[derive(Clone)]
pub struct HttpCoverArtClient {
    client: Client,
    base_url: String,
}

impl HttpCoverArtClient {
    pub fn new(base_url: &str) -> Self {
        // Image generation is slow; the caller already treats this channel
        // as best-effort, so a generous timeout is fine.
        let client = Client::builder()
            .timeout(Duration::from_secs(180))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_env() -> Self {
        let base_url = std::env::var("QUESTFORGE_BACKEND_URL")
            .unwrap_or_else(|_| "http://localhost:8700".to_string());
        Self::new(&base_url)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CoverRequestBody<'a> {
    quest_id: String,
    title: &'a str,
    synopsis: &'a str,
    tags: &'a [String],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoverResponseBody {
    image_url: String,
}

#[async_trait]
impl CoverArtPort for HttpCoverArtClient {
    async fn generate_cover(&self, request: CoverArtRequest) -> Result<String, CoverArtError> {
        let body = CoverRequestBody {
            quest_id: request.quest_id.to_string(),
            title: &request.title,
            synopsis: &request.synopsis,
            tags: &request.tags,
        };

        let response = self
            .client
            .post(format!("{}/api/artwork/cover", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    CoverArtError::Unavailable
                } else {
                    CoverArtError::GenerationFailed(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CoverArtError::GenerationFailed(error_text));
        }

        let parsed: CoverResponseBody = response
            .json()
            .await
            .map_err(|e| CoverArtError::GenerationFailed(e.to_string()))?;
        Ok(parsed.image_url)
    }
}
