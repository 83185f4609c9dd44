//! CLI parser
use clap::{Args, Parser};
use std::num::NonZeroU16;

use crate::constants::{
    DEFAULT_CAPTION_MODEL, DEFAULT_INFERENCE_BASE, DEFAULT_MAX_NEW_TOKENS, DEFAULT_TEXT_MODEL,
};

#[derive(Args, Clone, Debug)]
/// Where the captioning and generation models live
pub struct ModelOptions {
    #[clap(long, default_value = DEFAULT_INFERENCE_BASE, env = "JURNALIS_HF_API_BASE")]
    /// Inference API base URL.
    /// Env: JURNALIS_HF_API_BASE
    pub hf_api_base: String,
    #[clap(long, env = "HF_API_TOKEN", hide_env_values = true)]
    /// Inference API token. Env: HF_API_TOKEN
    pub hf_api_token: Option<String>,
    #[clap(long, default_value = DEFAULT_CAPTION_MODEL, env = "JURNALIS_CAPTION_MODEL")]
    /// Image captioning model id. Env: JURNALIS_CAPTION_MODEL
    pub caption_model: String,
    #[clap(long, default_value = DEFAULT_TEXT_MODEL, env = "JURNALIS_TEXT_MODEL")]
    /// Text generation model id. Env: JURNALIS_TEXT_MODEL
    pub text_model: String,
    #[clap(long, default_value_t = DEFAULT_MAX_NEW_TOKENS, env = "JURNALIS_MAX_NEW_TOKENS")]
    /// Token budget per article. Env: JURNALIS_MAX_NEW_TOKENS
    pub max_new_tokens: u32,
    #[clap(long, env = "JURNALIS_SYSTEM_PROMPT")]
    /// Replaces the per-language system prompt. Env: JURNALIS_SYSTEM_PROMPT
    pub system_prompt: Option<String>,
}

#[derive(Parser, Debug)]
/// CLI Options
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "JURNALIS_DEBUG")]
    /// Enable debug logging. Env: JURNALIS_DEBUG
    pub debug: bool,
    #[clap(long, short, default_value = "9000", env = "JURNALIS_PORT")]
    /// http listener, defaults to `9000`.
    /// Env: JURNALIS_PORT
    pub port: NonZeroU16,
    #[clap(
        long,
        short,
        default_value = "127.0.0.1",
        env = "JURNALIS_LISTEN_ADDRESS"
    )]
    /// Listen address, defaults to `127.0.0.1`.
    /// Env: JURNALIS_LISTEN_ADDRESS
    pub listen_address: String,
    #[clap(long, default_value = "id", env = "JURNALIS_LANGUAGE")]
    /// Language preselected in the article form, `id` or `en`.
    /// Env: JURNALIS_LANGUAGE
    pub language: String,
    #[clap(flatten)]
    /// Model endpoints
    pub models: ModelOptions,
}
