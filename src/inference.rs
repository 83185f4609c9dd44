//! Blocking client for the Hugging Face Inference API.
//!
//! Both collaborators (captioning and text generation) are hosted models
//! reached through `POST {base}/models/{model}`. Calls are single-shot: no
//! retries, no streaming.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use url::Url;

/// Failure of a collaborator call.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    /// The configured endpoint isn't a usable URL.
    #[error("invalid inference endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
    /// The HTTP exchange failed, including non-2xx statuses.
    #[error("inference request failed: {0}")]
    Transport(#[from] ureq::Error),
    /// The model answered with something we can't read.
    #[error("unexpected inference response: {0}")]
    Response(String),
    /// The model answered with nothing.
    #[error("model {0} returned an empty result")]
    EmptyOutput(String),
}

/// One entry of the `[{"generated_text": ...}]` response shape.
#[derive(Debug, Deserialize)]
pub struct GeneratedText {
    /// Text produced by the model.
    pub generated_text: String,
}

/// Parameters for text generation requests.
#[derive(Clone, Debug, Serialize)]
pub struct GenerationParameters {
    /// Upper bound on generated tokens.
    pub max_new_tokens: u32,
    /// Whether the model should echo the prompt.
    pub return_full_text: bool,
}

#[derive(Serialize)]
struct GenerationRequest<'a> {
    inputs: &'a str,
    parameters: &'a GenerationParameters,
}

/// Connection details shared by all hosted collaborators.
#[derive(Clone)]
pub struct InferenceClient {
    agent: ureq::Agent,
    api_base: Url,
    api_token: Option<String>,
}

impl fmt::Debug for InferenceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceClient")
            .field("api_base", &self.api_base.as_str())
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl InferenceClient {
    /// Builds a client for `api_base`; a trailing slash is added if missing.
    pub fn new(api_base: &str, api_token: Option<String>) -> Result<Self, InferenceError> {
        let api_base = if api_base.ends_with('/') {
            Url::parse(api_base)?
        } else {
            Url::parse(&format!("{api_base}/"))?
        };
        Ok(Self {
            agent: ureq::Agent::new_with_defaults(),
            api_base,
            api_token: api_token.filter(|token| !token.trim().is_empty()),
        })
    }

    /// Endpoint for a model id such as `Salesforce/blip-image-captioning-base`.
    pub fn model_url(&self, model: &str) -> Result<Url, InferenceError> {
        Ok(self.api_base.join(&format!("models/{model}"))?)
    }

    fn authorization(&self) -> Option<String> {
        self.api_token
            .as_ref()
            .map(|token| format!("Bearer {token}"))
    }

    /// Sends raw bytes (an image) to a model.
    pub fn post_bytes(
        &self,
        model: &str,
        content_type: &str,
        body: &[u8],
    ) -> Result<Vec<GeneratedText>, InferenceError> {
        let url = self.model_url(model)?;
        debug!("POST {} ({} bytes)", url, body.len());
        let mut request = self
            .agent
            .post(url.as_str())
            .header("Content-Type", content_type);
        if let Some(value) = self.authorization() {
            request = request.header("Authorization", value);
        }
        let mut response = request.send(body).map_err(|err| {
            error!("Inference call to {} failed: {}", model, err);
            InferenceError::from(err)
        })?;
        response
            .body_mut()
            .read_json::<Vec<GeneratedText>>()
            .map_err(|err| InferenceError::Response(err.to_string()))
    }

    /// Sends a text generation request to a model.
    pub fn post_generation(
        &self,
        model: &str,
        inputs: &str,
        parameters: &GenerationParameters,
    ) -> Result<Vec<GeneratedText>, InferenceError> {
        let url = self.model_url(model)?;
        debug!("POST {} ({} prompt chars)", url, inputs.chars().count());
        let mut request = self.agent.post(url.as_str());
        if let Some(value) = self.authorization() {
            request = request.header("Authorization", value);
        }
        let mut response = request
            .send_json(&GenerationRequest { inputs, parameters })
            .map_err(|err| {
                error!("Inference call to {} failed: {}", model, err);
                InferenceError::from(err)
            })?;
        response
            .body_mut()
            .read_json::<Vec<GeneratedText>>()
            .map_err(|err| InferenceError::Response(err.to_string()))
    }
}

/// First non-blank `generated_text`, trimmed.
pub fn first_text(model: &str, outputs: Vec<GeneratedText>) -> Result<String, InferenceError> {
    outputs
        .into_iter()
        .map(|output| output.generated_text.trim().to_string())
        .find(|text| !text.is_empty())
        .ok_or_else(|| InferenceError::EmptyOutput(model.to_string()))
}
