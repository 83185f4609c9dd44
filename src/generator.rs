//! Article generation.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::inference::{GenerationParameters, InferenceClient, InferenceError, first_text};
use crate::language::Language;
use crate::prompt::Prompt;

/// Matches a completion that opens with the chat envelope, up to and
/// including the last `[/INST]`.
static ECHOED_ENVELOPE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)\A\s*(?:<s>)?\s*\[INST\].*\[/INST\]").ok());

/// A text generation model.
///
/// One blocking call per article. Retry or timeout policy belongs in an
/// implementation, never in the callers.
pub trait TextGenerator: Send + Sync {
    /// Generates a completion for an already wrapped instruction.
    fn generate(&self, formatted_prompt: &str) -> Result<String, InferenceError>;
}

/// Generator backed by a hosted chat model.
#[derive(Clone, Debug)]
pub struct HostedGenerator {
    client: InferenceClient,
    model: String,
    parameters: GenerationParameters,
}

impl HostedGenerator {
    /// Uses `model` through `client`, capped at `max_new_tokens`.
    pub fn new(client: InferenceClient, model: impl Into<String>, max_new_tokens: u32) -> Self {
        Self {
            client,
            model: model.into(),
            parameters: GenerationParameters {
                max_new_tokens,
                return_full_text: false,
            },
        }
    }
}

impl TextGenerator for HostedGenerator {
    fn generate(&self, formatted_prompt: &str) -> Result<String, InferenceError> {
        let outputs = self
            .client
            .post_generation(&self.model, formatted_prompt, &self.parameters)?;
        first_text(&self.model, outputs)
    }
}

/// Wraps `prompt` in the Llama-2 chat envelope.
pub fn wrap_instruction(system_prompt: &str, prompt: &str) -> String {
    format!("<s>[INST] <<SYS>>\n{system_prompt}\n<</SYS>>\n\n{prompt} [/INST]")
}

/// Drops an echoed envelope from a completion.
pub fn strip_envelope(output: &str) -> &str {
    let rest = match ECHOED_ENVELOPE.as_ref().and_then(|regex| regex.find(output)) {
        Some(found) => &output[found.end()..],
        None => output,
    };
    rest.trim()
}

/// Turns prompts into articles using a [`TextGenerator`].
#[derive(Clone)]
pub struct ArticleGenerator {
    model: Arc<dyn TextGenerator>,
    system_prompt: Option<String>,
}

impl ArticleGenerator {
    /// Uses the per-language default system prompt.
    pub fn new(model: Arc<dyn TextGenerator>) -> Self {
        Self {
            model,
            system_prompt: None,
        }
    }

    /// Overrides the system-role instruction for every language.
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    /// The system-role instruction used for `language`.
    pub fn system_prompt(&self, language: Language) -> &str {
        self.system_prompt
            .as_deref()
            .unwrap_or_else(|| language.default_system_prompt())
    }

    /// Generates the article for `prompt`. Failures are returned untouched.
    pub fn generate(&self, prompt: &Prompt, language: Language) -> Result<String, InferenceError> {
        let formatted = wrap_instruction(self.system_prompt(language), prompt.as_str());
        let output = self.model.generate(&formatted)?;
        let article = strip_envelope(&output);
        if article.is_empty() {
            return Err(InferenceError::EmptyOutput("generator".to_string()));
        }
        Ok(article.to_string())
    }
}
