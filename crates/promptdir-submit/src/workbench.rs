//! Generation workbench: edit a JSON body, render it, hand it to the form.

use serde_json::json;
use tracing::warn;

use promptdir_core::defaults::EMPTY_WORKBENCH_BODY;
use promptdir_core::{ImageGenerationBackend, ImageRef, InlineImage};

use crate::form::Prefill;

/// Progress of the last generation request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationState {
    pub loading: bool,
    pub error: Option<String>,
    pub result: Option<InlineImage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workbench {
    pub body: String,
    pub generation: GenerationState,
}

fn default_body() -> String {
    let value = json!({
        "subject": "Mystical owl",
        "lighting": "Golden hour glow",
        "style": "Impressionist painting",
        "colors": ["Amber", "Deep Blue", "Copper"],
        "resolution": "8k"
    });
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
}

impl Default for Workbench {
    fn default() -> Self {
        Self {
            body: default_body(),
            generation: GenerationState::default(),
        }
    }
}

impl Workbench {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render the current body. The previous result is dropped on failure.
    pub async fn generate(&mut self, backend: &dyn ImageGenerationBackend) -> &GenerationState {
        self.generation.loading = true;
        self.generation.error = None;

        match backend.generate_image(&self.body).await {
            Ok(image) => {
                self.generation = GenerationState {
                    loading: false,
                    error: None,
                    result: Some(image),
                };
            }
            Err(e) => {
                warn!(
                    subsystem = "submit",
                    component = "workbench",
                    model = backend.model_name(),
                    error = %e,
                    "Image generation failed"
                );
                self.generation = GenerationState {
                    loading: false,
                    error: Some(e.to_string()),
                    result: None,
                };
            }
        }
        &self.generation
    }

    /// Reset the body to an empty prompt.
    pub fn clear(&mut self) {
        self.body = EMPTY_WORKBENCH_BODY.to_string();
    }

    /// Prefill for the submission form carrying the rendered image and body.
    pub fn post_to_directory(&self) -> Option<Prefill> {
        let image = self.generation.result.clone()?;
        Some(Prefill {
            body: Some(self.body.clone()),
            image_ref: Some(ImageRef::Inline(image)),
            ..Prefill::default()
        })
    }
}
