//! HTTP client for the generation pipeline backend.
//!
//! The backend runs generation as a job: one POST starts it, then the client
//! polls the job's event feed and replays each event into the observer in
//! arrival order. Polling keeps the transport dumb; ordering within the feed
//! is the backend's promise, ordering of callback dispatch is ours (events
//! are dispatched one at a time from a single poll loop).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Instant};

use questforge_domain::Scene;

use crate::application::ports::outbound::{
    CreatorPayload, PipelineError, PipelineObserver, PipelineOutput, PipelinePort, PipelineRequest,
    PlayerPreview, PlotDraft,
};

const DEFAULT_TIMEOUT_SECS: u64 = 300;
const POLL_INTERVAL_MS: u64 = 500;

/// Client for the quest generation backend.
#[derive(Clone)]
pub struct HttpPipelineClient {
    client: Client,
    base_url: String,
    timeout_secs: u64,
}

impl HttpPipelineClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs,
        }
    }

    /// Read `QUESTFORGE_BACKEND_URL` and `PIPELINE_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let base_url = std::env::var("QUESTFORGE_BACKEND_URL")
            .unwrap_or_else(|_| "http://localhost:8700".to_string());
        let timeout_secs = std::env::var("PIPELINE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Self::new(&base_url, timeout_secs)
    }

    async fn start_job(&self, request: &PipelineRequest) -> Result<String, PipelineError> {
        let response = self
            .client
            .post(format!("{}/api/pipeline/jobs", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(|e| PipelineError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PipelineError::RequestFailed(error_text));
        }

        let started: JobStarted = response
            .json()
            .await
            .map_err(|e| PipelineError::InvalidResponse(e.to_string()))?;
        Ok(started.job_id)
    }

    async fn poll_events(&self, job_id: &str, cursor: u64) -> Result<JobPoll, PipelineError> {
        let response = self
            .client
            .get(format!(
                "{}/api/pipeline/jobs/{}/events",
                self.base_url, job_id
            ))
            .query(&[("after", cursor)])
            .send()
            .await
            .map_err(|e| PipelineError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PipelineError::RequestFailed(error_text));
        }

        response
            .json()
            .await
            .map_err(|e| PipelineError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl PipelinePort for HttpPipelineClient {
    async fn run(
        &self,
        request: PipelineRequest,
        observer: Arc<dyn PipelineObserver>,
    ) -> Result<PipelineOutput, PipelineError> {
        let job_id = self.start_job(&request).await?;
        tracing::debug!(%job_id, "Pipeline job started");

        let deadline = Instant::now() + Duration::from_secs(self.timeout_secs);
        let mut cursor = 0u64;

        loop {
            if Instant::now() >= deadline {
                return Err(PipelineError::Timeout(self.timeout_secs));
            }

            let poll = self.poll_events(&job_id, cursor).await?;
            cursor = poll.cursor;

            for event in poll.events {
                match event {
                    WireEvent::Progress {
                        phase,
                        scene_index,
                        scene_total,
                    } => observer.on_progress(&phase, scene_index, scene_total),
                    WireEvent::Plot { plot } => observer.on_plot_complete(plot),
                    WireEvent::Spot { scene, index } => observer.on_spot_complete(scene, index),
                }
            }

            match poll.outcome {
                Some(JobOutcome::Completed { result }) => {
                    tracing::debug!(%job_id, "Pipeline job completed");
                    return Ok(PipelineOutput {
                        player_preview: result.player_preview,
                        creator_payload: result.creator_payload,
                    });
                }
                Some(JobOutcome::Failed { message }) => {
                    return Err(PipelineError::RequestFailed(message));
                }
                None => sleep(Duration::from_millis(POLL_INTERVAL_MS)).await,
            }
        }
    }

    async fn regenerate_spot(
        &self,
        request: PipelineRequest,
        index: usize,
    ) -> Result<Scene, PipelineError> {
        let response = self
            .client
            .post(format!("{}/api/pipeline/spots/regenerate", self.base_url))
            .json(&RegenerateRequest { request, index })
            .send()
            .await
            .map_err(|e| PipelineError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PipelineError::RequestFailed(error_text));
        }

        response
            .json()
            .await
            .map_err(|e| PipelineError::InvalidResponse(e.to_string()))
    }
}

// Wire types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobStarted {
    job_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobPoll {
    /// Opaque feed position to pass back as `after`
    cursor: u64,
    #[serde(default)]
    events: Vec<WireEvent>,
    #[serde(default)]
    outcome: Option<JobOutcome>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum WireEvent {
    #[serde(rename_all = "camelCase")]
    Progress {
        phase: String,
        #[serde(default)]
        scene_index: Option<usize>,
        #[serde(default)]
        scene_total: Option<usize>,
    },
    Plot {
        plot: PlotDraft,
    },
    Spot {
        scene: Scene,
        index: usize,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
enum JobOutcome {
    Completed { result: JobResult },
    Failed { message: String },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobResult {
    #[serde(default)]
    player_preview: Option<PlayerPreview>,
    #[serde(default)]
    creator_payload: Option<CreatorPayload>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegenerateRequest {
    request: PipelineRequest,
    index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = HttpPipelineClient::new("http://localhost:8700/", 60);
        assert_eq!(client.base_url, "http://localhost:8700");
    }

    #[test]
    fn test_wire_events_deserialize() {
        let json = r#"{
            "cursor": 3,
            "events": [
                {"type": "progress", "phase": "plotting", "sceneTotal": 6},
                {"type": "plot", "plot": {"title": "T", "synopsis": "S", "tags": []}}
            ]
        }"#;
        let poll: JobPoll = serde_json::from_str(json).expect("poll");
        assert_eq!(poll.cursor, 3);
        assert_eq!(poll.events.len(), 2);
        assert!(poll.outcome.is_none());
    }

    #[test]
    fn test_failed_outcome_deserializes() {
        let json = r#"{"cursor": 9, "outcome": {"status": "failed", "message": "model crashed"}}"#;
        let poll: JobPoll = serde_json::from_str(json).expect("poll");
        assert!(matches!(
            poll.outcome,
            Some(JobOutcome::Failed { ref message }) if message == "model crashed"
        ));
    }
}
