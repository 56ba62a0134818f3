//! Gemini `generateContent` backend for image and tag synthesis.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use promptdir_core::{
    Error, ImageGenerationBackend, InlineImage, Result, TagGenerationBackend,
};

use crate::config::InferenceConfig;
use crate::prompt::{fallback_tags, image_prompt, parse_tags, tag_prompt};

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<&'static str>,
    image_config: ImageConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

impl GenerateContentResponse {
    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates
            .first()
            .into_iter()
            .flat_map(|c| c.content.parts.iter())
    }
}

fn text_request(prompt: String, generation_config: Option<GenerationConfig>) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            parts: vec![Part {
                text: Some(prompt),
                inline_data: None,
            }],
        }],
        generation_config,
    }
}

// =============================================================================
// BACKEND
// =============================================================================

/// Hosted Gemini backend implementing both generation traits.
pub struct GeminiBackend {
    client: Client,
    config: InferenceConfig,
}

impl GeminiBackend {
    pub fn new(config: InferenceConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Error::Config(e.to_string()))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// Create from environment variables. `Ok(None)` when no API key is set.
    pub fn from_env() -> Result<Option<Self>> {
        InferenceConfig::from_env().map(Self::new).transpose()
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, model
        );
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::Inference(format!("Generation request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "Generation API returned {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Failed to parse generation response: {}", e)))
    }

    /// Check that the API is reachable with the configured key.
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/v1beta/models", self.config.base_url);
        match self
            .client
            .get(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}

#[async_trait]
impl ImageGenerationBackend for GeminiBackend {
    async fn generate_image(&self, body: &str) -> Result<InlineImage> {
        let start = Instant::now();
        let model = self.config.image_model.as_str();
        debug!(subsystem = "inference", component = "gemini", op = "generate_image", model = %model, "Requesting image");

        let request = text_request(
            image_prompt(body),
            Some(GenerationConfig {
                response_modalities: vec!["IMAGE"],
                image_config: ImageConfig { aspect_ratio: "1:1" },
            }),
        );
        let response = self.generate_content(model, &request).await?;

        let inline = response
            .parts()
            .find_map(|p| p.inline_data.as_ref())
            .ok_or_else(|| Error::Inference("No image generated in the response".to_string()))?;
        let data = base64::engine::general_purpose::STANDARD
            .decode(inline.data.trim())
            .map_err(|e| Error::Inference(format!("Invalid image payload: {}", e)))?;

        info!(
            subsystem = "inference",
            component = "gemini",
            op = "generate_image",
            model = %model,
            image_bytes = data.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Generated image"
        );
        Ok(InlineImage {
            mime_type: inline.mime_type.clone(),
            data,
        })
    }

    fn model_name(&self) -> &str {
        &self.config.image_model
    }
}

#[async_trait]
impl TagGenerationBackend for GeminiBackend {
    async fn generate_tags(&self, body: &str) -> Vec<String> {
        let model = self.config.text_model.as_str();
        let request = text_request(tag_prompt(body), None);
        match self.generate_content(model, &request).await {
            Ok(response) => {
                let text: Vec<&str> = response.parts().filter_map(|p| p.text.as_deref()).collect();
                let tags = parse_tags(&text.join("\n"));
                debug!(subsystem = "inference", component = "gemini", op = "generate_tags", result_count = tags.len(), "Generated tags");
                tags
            }
            Err(e) => {
                warn!(
                    subsystem = "inference",
                    component = "gemini",
                    op = "generate_tags",
                    model = %model,
                    error = %e,
                    "Tag generation failed, using fallback tags"
                );
                fallback_tags()
            }
        }
    }
}
