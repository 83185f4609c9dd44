use clap::Parser;
use jurnalis::config::{Models, setup_logging};
use jurnalis::language::Language;
use jurnalis::web::AppState;
use tracing::error;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = jurnalis::cli::CliOptions::parse();

    let _ = setup_logging(cli.debug);

    let language = match cli.language.parse::<Language>() {
        Ok(language) => language,
        Err(err) => {
            error!("Invalid default language: {}", err);
            return;
        }
    };

    let models = match Models::hosted(&cli.models) {
        Ok(models) => models,
        Err(err) => {
            error!("Model configuration error: {}", err);
            return;
        }
    };
    let model_summary = format!("{} + {}", cli.models.caption_model, cli.models.text_model);

    if let Err(err) = jurnalis::web::setup_server(
        &cli.listen_address,
        cli.port,
        AppState::new(models, language, model_summary),
    )
    .await
    {
        error!("Application error: {}", err);
    }
}
