//! Config handling

use std::sync::Arc;

use tracing::info;
use tracing::log::LevelFilter;

use crate::caption::{Captioner, HostedCaptioner};
use crate::cli::ModelOptions;
use crate::generator::{ArticleGenerator, HostedGenerator};
use crate::inference::{InferenceClient, InferenceError};

/// Sets up logging based on the debug flag
pub fn setup_logging(debug: bool) -> Result<(), Box<std::io::Error>> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut logger = simple_logger::SimpleLogger::new().with_level(level);
    if !debug {
        logger = logger
            .with_module_level("tracing", LevelFilter::Warn)
            .with_module_level("rustls", LevelFilter::Info)
            .with_module_level("hyper_util", LevelFilter::Info)
            .with_module_level("h2", LevelFilter::Info)
            .with_module_level("ureq", LevelFilter::Warn)
            .with_module_level("ureq_proto", LevelFilter::Warn)
            .with_module_level("tower_sessions", LevelFilter::Warn);
    }
    logger.init().map_err(|err| {
        eprintln!("Failed to initialize logger: {}", err);
        Box::new(std::io::Error::other(err))
    })
}

/// The two collaborators a desk talks to.
#[derive(Clone)]
pub struct Models {
    /// Image captioning.
    pub captioner: Arc<dyn Captioner>,
    /// Article writing.
    pub generator: ArticleGenerator,
}

impl Models {
    /// Builds hosted collaborators from command line options.
    pub fn hosted(options: &ModelOptions) -> Result<Self, InferenceError> {
        let client = InferenceClient::new(&options.hf_api_base, options.hf_api_token.clone())?;
        info!(
            "Using caption model {} and text model {} via {}",
            options.caption_model, options.text_model, options.hf_api_base
        );
        if options.hf_api_token.is_none() {
            info!("No inference token configured, requests are anonymous");
        }

        let captioner = HostedCaptioner::new(client.clone(), options.caption_model.clone());
        let generator = HostedGenerator::new(
            client,
            options.text_model.clone(),
            options.max_new_tokens,
        );
        let mut generator = ArticleGenerator::new(Arc::new(generator));
        if let Some(system_prompt) = options.system_prompt.as_deref() {
            generator = generator.with_system_prompt(system_prompt);
        }

        Ok(Self {
            captioner: Arc::new(captioner),
            generator,
        })
    }
}
