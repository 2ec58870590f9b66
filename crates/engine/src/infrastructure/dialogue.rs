//! HTTP client for the scene dialogue service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use questforge_domain::{CastMember, DialogueLine, DialogueStage, SpeakerType};

use crate::application::ports::outbound::{DialogueBrief, DialogueError, DialoguePort};

#[derive(Clone)]
pub struct HttpDialogueClient {
    client: Client,
    base_url: String,
}

impl HttpDialogueClient {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
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
struct DialogueRequestBody {
    prologue: String,
    epilogue: String,
    cast: Vec<CastMember>,
    scenes: Vec<SceneBody>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SceneBody {
    order_index: u32,
    name: String,
    role: String,
    puzzle_prompt: String,
    next_hook: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LineBody {
    scene_order: u32,
    stage: DialogueStage,
    order: u32,
    speaker: SpeakerType,
    #[serde(default)]
    speaker_name: String,
    text: String,
}

#[derive(Deserialize)]
struct DialogueResponseBody {
    lines: Vec<LineBody>,
}

#[async_trait]
impl DialoguePort for HttpDialogueClient {
    async fn generate_dialogue(
        &self,
        brief: DialogueBrief,
    ) -> Result<Vec<DialogueLine>, DialogueError> {
        let body = DialogueRequestBody {
            prologue: brief.prologue,
            epilogue: brief.epilogue,
            cast: brief.cast,
            scenes: brief
                .scenes
                .into_iter()
                .map(|s| SceneBody {
                    order_index: s.order_index,
                    name: s.name,
                    role: s.role.to_string(),
                    puzzle_prompt: s.puzzle_prompt,
                    next_hook: s.next_hook,
                })
                .collect(),
        };

        let response = self
            .client
            .post(format!("{}/api/dialogue/generate", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    DialogueError::Unavailable
                } else {
                    DialogueError::GenerationFailed(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(DialogueError::GenerationFailed(error_text));
        }

        let parsed: DialogueResponseBody = response
            .json()
            .await
            .map_err(|e| DialogueError::GenerationFailed(e.to_string()))?;

        Ok(parsed
            .lines
            .into_iter()
            .map(|l| {
                DialogueLine::new(l.scene_order, l.stage, l.order, l.speaker, l.speaker_name, l.text)
            })
            .collect())
    }
}
