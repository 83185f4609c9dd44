use super::prelude::*;
use super::flash::{EMPTY_INSTRUCTION, EMPTY_REFERENCE, MISSING_IMAGE, MISSING_REFERENCE};
use crate::constants::REFERENCE_CHAR_CAP;
use crate::history::{ArticleRecord, export_file_name};
use crate::language::Language;
use crate::metadata::ExifRecord;
use crate::pipeline::{
    ArticleRequest, ImageOutcome, analyze_image, load_reference, prepare_article, write_article,
};
use crate::reference::{DocumentKind, ReferenceDocument};
use crate::upload::UploadedImage;
use axum::body::Body;
use axum::http::StatusCode;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::Response;
use chrono::Utc;
use std::path::Path as StdPath;
use tracing::{instrument, warn};

#[derive(Clone, Debug)]
pub(crate) struct HistoryView {
    pub(crate) instruction: String,
    pub(crate) caption: String,
    pub(crate) result: String,
    pub(crate) language: String,
    pub(crate) created_at: String,
}

impl From<&ArticleRecord> for HistoryView {
    fn from(record: &ArticleRecord) -> Self {
        Self {
            instruction: record.instruction.clone(),
            caption: record.caption.clone(),
            result: record.result.clone(),
            language: record.language.label().to_string(),
            created_at: record.created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct LanguageOption {
    pub(crate) code: &'static str,
    pub(crate) label: &'static str,
    pub(crate) selected: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub(crate) struct HomeTemplate {
    csrf_token: String,
    notices: Vec<Notice>,
    has_caption: bool,
    caption: String,
    has_thumbnail: bool,
    thumbnail: String,
    metadata: Vec<(String, String)>,
    has_reference: bool,
    reference_name: String,
    reference_chars: usize,
    reference_cap: usize,
    has_plan: bool,
    goals: Vec<String>,
    steps: Vec<String>,
    questions: Vec<String>,
    latest: Option<HistoryView>,
    history: Vec<HistoryView>,
    languages: Vec<LanguageOption>,
    model_summary: String,
}

/// handles the / GET
pub(crate) async fn home_handler(
    State(state): State<AppState>,
    session: Session,
) -> Result<HomeTemplate, DeskError> {
    let desk = DeskSession::load(&session).await?;
    let csrf_token = csrf_token(&session).await?;
    let notices = flash::take_notices(&session).await?;

    let selected = desk
        .history
        .latest()
        .map(|record| record.language)
        .unwrap_or(state.default_language);
    let languages = Language::ALL
        .iter()
        .map(|language| LanguageOption {
            code: language.code(),
            label: language.label(),
            selected: *language == selected,
        })
        .collect();

    let plan = desk.last_plan.clone().unwrap_or_default();
    let history: Vec<HistoryView> = desk.history.newest_first().map(HistoryView::from).collect();
    let latest = history.first().cloned();

    Ok(HomeTemplate {
        csrf_token,
        notices,
        has_caption: desk.caption.is_some(),
        caption: desk.caption.clone().unwrap_or_default(),
        has_thumbnail: desk.thumbnail.is_some(),
        thumbnail: desk.thumbnail.clone().unwrap_or_default(),
        metadata: desk
            .metadata
            .as_ref()
            .map(ExifRecord::display_lines)
            .unwrap_or_default(),
        has_reference: desk.reference.is_some(),
        reference_name: desk
            .reference
            .as_ref()
            .map(|reference| reference.name.clone())
            .unwrap_or_default(),
        reference_chars: desk
            .reference
            .as_ref()
            .map(|reference| reference.char_count())
            .unwrap_or_default(),
        reference_cap: REFERENCE_CHAR_CAP,
        has_plan: desk.last_plan.is_some(),
        goals: plan.goals,
        steps: plan.steps,
        questions: plan.questions,
        latest,
        history,
        languages,
        model_summary: state.model_summary.clone(),
    })
}

/// Captions an uploaded image and keeps the caption on the desk.
#[instrument(skip_all)]
pub(crate) async fn upload_image_handler(
    State(state): State<AppState>,
    session: Session,
    mut multipart: Multipart,
) -> Result<Redirect, DeskError> {
    let mut csrf_token_value: Option<String> = None;
    let mut upload: Option<UploadedImage> = None;
    let mut with_metadata = false;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "csrf_token" => {
                csrf_token_value = Some(field.text().await?);
            }
            "image" => {
                let mime = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                upload = Some(UploadedImage::new(bytes.to_vec(), mime));
            }
            "with_metadata" => {
                with_metadata = true;
            }
            _ => {}
        }
    }

    validate_csrf(&session, csrf_token_value.as_deref().unwrap_or_default()).await?;

    let Some(upload) = upload.filter(|upload| !upload.is_empty()) else {
        flash::push_notice(&session, Notice::warning(MISSING_IMAGE)).await?;
        return Ok(Redirect::to("/"));
    };
    debug!("Received image upload of {} bytes", upload.len());

    let captioner = state.models.captioner.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        analyze_image(&upload, captioner.as_ref(), with_metadata)
    })
    .await??;

    let mut desk = DeskSession::load(&session).await?;
    match outcome {
        ImageOutcome::Described(analysis) => {
            info!("Image captioned ({} chars)", analysis.caption.chars().count());
            desk.set_image(analysis);
            flash::push_notice(&session, Notice::success("Gambar berhasil dideskripsikan.")).await?;
        }
        ImageOutcome::Rejected(err) => {
            desk.reset_image();
            flash::push_notice(&session, Notice::warning(err.to_string())).await?;
        }
    }
    desk.save(&session).await?;
    Ok(Redirect::to("/"))
}

/// Reads a style reference document onto the desk.
#[instrument(skip_all)]
pub(crate) async fn upload_reference_handler(
    session: Session,
    mut multipart: Multipart,
) -> Result<Redirect, DeskError> {
    let mut csrf_token_value: Option<String> = None;
    let mut document: Option<ReferenceDocument> = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "csrf_token" => {
                csrf_token_value = Some(field.text().await?);
            }
            "reference" => {
                let name = field.file_name().unwrap_or("referensi").to_string();
                let declared = field
                    .content_type()
                    .filter(|mime| DocumentKind::from_mime(mime).is_some())
                    .map(str::to_string);
                let mime = declared
                    .or_else(|| DocumentKind::mime_for_path(StdPath::new(&name)).map(str::to_string))
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let bytes = field.bytes().await?;
                document = Some(ReferenceDocument::new(name, mime, bytes.to_vec()));
            }
            _ => {}
        }
    }

    validate_csrf(&session, csrf_token_value.as_deref().unwrap_or_default()).await?;

    let Some(document) = document.filter(|document| !document.bytes.is_empty()) else {
        flash::push_notice(&session, Notice::warning(MISSING_REFERENCE)).await?;
        return Ok(Redirect::to("/"));
    };

    let name = document.name.clone();
    let extracted = tokio::task::spawn_blocking(move || load_reference(&document)).await?;

    let mut desk = DeskSession::load(&session).await?;
    match extracted {
        Ok(text) if text.trim().is_empty() => {
            desk.reset_reference();
            flash::push_notice(&session, Notice::warning(EMPTY_REFERENCE)).await?;
        }
        Ok(text) => {
            let chars = text.chars().count();
            info!("Loaded reference {} ({} chars)", name, chars);
            let notice = if chars > REFERENCE_CHAR_CAP {
                Notice::warning(format!(
                    "Referensi {name} berisi {chars} karakter, hanya {REFERENCE_CHAR_CAP} karakter pertama yang dipakai."
                ))
            } else {
                Notice::success(format!("Referensi {name} dimuat ({chars} karakter)."))
            };
            desk.set_reference(name, text);
            flash::push_notice(&session, notice).await?;
        }
        Err(err) => {
            desk.reset_reference();
            flash::push_notice(&session, Notice::warning(err.to_string())).await?;
        }
    }
    desk.save(&session).await?;
    Ok(Redirect::to("/"))
}

#[derive(Deserialize)]
pub(crate) struct ArticleForm {
    csrf_token: String,
    instruction: String,
    language: Option<String>,
    use_reference: Option<String>,
}

/// Plans, prompts and writes an article from what's on the desk.
#[instrument(skip_all)]
pub(crate) async fn write_article_handler(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ArticleForm>,
) -> Result<Redirect, DeskError> {
    validate_csrf(&session, &form.csrf_token).await?;

    let instruction = form.instruction.trim().to_string();
    if instruction.is_empty() {
        flash::push_notice(&session, Notice::warning(EMPTY_INSTRUCTION)).await?;
        return Ok(Redirect::to("/"));
    }

    let language = match form.language.as_deref().filter(|code| !code.is_empty()) {
        Some(code) => code
            .parse::<Language>()
            .map_err(|err| DeskError::BadRequest(err.to_string()))?,
        None => state.default_language,
    };

    let mut desk = DeskSession::load(&session).await?;
    let caption = desk.caption.clone();
    let reference = form
        .use_reference
        .is_some()
        .then(|| desk.reference.as_ref().map(|reference| reference.text.clone()))
        .flatten();

    let draft = prepare_article(&ArticleRequest {
        caption: caption.as_deref(),
        instruction: &instruction,
        language,
        reference: reference.as_deref(),
    });
    debug!("Plan for request: {:?}", draft.plan);
    desk.last_plan = Some(draft.plan.clone());
    desk.save(&session).await?;

    let generator = state.models.generator.clone();
    let record = tokio::task::spawn_blocking(move || {
        let request = ArticleRequest {
            caption: caption.as_deref(),
            instruction: &instruction,
            language,
            reference: reference.as_deref(),
        };
        write_article(&request, &draft, &generator)
    })
    .await?
    .inspect_err(|err| warn!("Article generation failed: {}", err))?;

    desk.record_article(record);
    desk.save(&session).await?;
    flash::push_notice(&session, Notice::success("Artikel selesai ditulis.")).await?;
    Ok(Redirect::to("/"))
}

#[derive(Deserialize)]
pub(crate) struct CsrfForm {
    csrf_token: String,
}

pub(crate) async fn clear_history_handler(
    session: Session,
    Form(form): Form<CsrfForm>,
) -> Result<Redirect, DeskError> {
    validate_csrf(&session, &form.csrf_token).await?;
    let mut desk = DeskSession::load(&session).await?;
    desk.clear_history();
    desk.save(&session).await?;
    flash::push_notice(&session, Notice::success("Riwayat artikel dihapus.")).await?;
    Ok(Redirect::to("/"))
}

/// Downloads the session history as a text file.
pub(crate) async fn export_history_handler(session: Session) -> Result<Response, DeskError> {
    let desk = DeskSession::load(&session).await?;
    let file_name = export_file_name(Utc::now().date_naive());
    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(
            CONTENT_DISPOSITION,
            format!("attachment; filename=\"{file_name}\""),
        )
        .body(Body::from(desk.history.export()))?)
}
