//! The browser desk: one page, four forms, history export.

use std::num::NonZeroU16;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::services::ServeDir;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};
use tracing::{error, info};

use crate::config::Models;
use crate::constants::{MAX_REQUEST_BYTES, SESSION_IDLE_MINUTES};
use crate::language::Language;

mod csrf;
mod desk;
pub(crate) mod flash;
mod prelude;
mod views;

use views::{
    clear_history_handler, export_history_handler, home_handler, upload_image_handler,
    upload_reference_handler, write_article_handler,
};

/// Shared by every request.
#[derive(Clone)]
pub struct AppState {
    models: Models,
    default_language: Language,
    model_summary: String,
}

impl AppState {
    /// Wraps the collaborators and the form's preselected language.
    pub fn new(models: Models, default_language: Language, model_summary: impl Into<String>) -> Self {
        Self {
            models,
            default_language,
            model_summary: model_summary.into(),
        }
    }
}

fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(home_handler))
        .route("/image", post(upload_image_handler))
        .route("/reference", post(upload_reference_handler))
        .route("/article", post(write_article_handler))
        .route("/history/clear", post(clear_history_handler))
        .route("/history/export", get(export_history_handler))
        .nest_service(
            "/static",
            ServeDir::new(concat!(env!("CARGO_MANIFEST_DIR"), "/static")),
        )
}

/// The full application with sessions and body limits applied.
pub fn build_app(state: AppState) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            SESSION_IDLE_MINUTES,
        )));

    create_router()
        .layer(session_layer)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
        .with_state(state)
}

/// Binds the listener and serves until the process is stopped.
pub async fn setup_server(
    listen_addr: &str,
    port: NonZeroU16,
    state: AppState,
) -> Result<(), anyhow::Error> {
    let app = build_app(state);

    let addr = format!("{}:{}", listen_addr, port);
    info!("Starting server on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", err);
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
    }
    info!("Shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::body::Body;
    use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::caption::Captioner;
    use crate::constants::MAX_IMAGE_BYTES;
    use crate::generator::{ArticleGenerator, TextGenerator};
    use crate::inference::InferenceError;
    use crate::upload::DecodedImage;

    const BOUNDARY: &str = "jurnalis-test-boundary";

    #[derive(Default)]
    struct FakeCaptioner {
        calls: AtomicUsize,
    }

    impl Captioner for FakeCaptioner {
        fn caption(&self, _image: &DecodedImage) -> Result<String, InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("a flooded street with a red bus".to_string())
        }
    }

    #[derive(Default)]
    struct FakeGenerator {
        fail: bool,
        prompts: std::sync::Mutex<Vec<String>>,
    }

    impl TextGenerator for FakeGenerator {
        fn generate(&self, formatted_prompt: &str) -> Result<String, InferenceError> {
            if let Ok(mut prompts) = self.prompts.lock() {
                prompts.push(formatted_prompt.to_string());
            }
            if self.fail {
                return Err(InferenceError::Response("model is overloaded".to_string()));
            }
            Ok("Judul: Banjir Rendam Jalan Utama".to_string())
        }
    }

    struct Harness {
        app: Router,
        captioner: Arc<FakeCaptioner>,
        generator: Arc<FakeGenerator>,
        cookie: Option<String>,
    }

    impl Harness {
        fn new(fail_generation: bool) -> Self {
            let captioner = Arc::new(FakeCaptioner::default());
            let generator = Arc::new(FakeGenerator {
                fail: fail_generation,
                ..Default::default()
            });
            let models = Models {
                captioner: captioner.clone(),
                generator: ArticleGenerator::new(generator.clone()),
            };
            let app = build_app(AppState::new(models, Language::Indonesian, "fake models"));
            Self {
                app,
                captioner,
                generator,
                cookie: None,
            }
        }

        async fn send(&mut self, builder: axum::http::request::Builder, body: Body) -> axum::response::Response {
            let builder = match self.cookie.as_deref() {
                Some(cookie) => builder.header(COOKIE, cookie),
                None => builder,
            };
            let response = self
                .app
                .clone()
                .oneshot(builder.body(body).unwrap())
                .await
                .unwrap();
            if let Some(value) = response.headers().get(SET_COOKIE) {
                let value = value.to_str().unwrap();
                self.cookie = value.split(';').next().map(str::to_string);
            }
            response
        }

        async fn home(&mut self) -> String {
            let response = self
                .send(Request::builder().method("GET").uri("/"), Body::empty())
                .await;
            assert_eq!(response.status(), StatusCode::OK);
            read_body(response).await
        }

        async fn csrf_token(&mut self) -> String {
            let body = self.home().await;
            let marker = "name=\"csrf_token\" value=\"";
            let start = body.find(marker).expect("csrf field") + marker.len();
            let end = body[start..].find('"').expect("closing quote") + start;
            body[start..end].to_string()
        }

        async fn post_form(&mut self, uri: &str, body: String) -> axum::response::Response {
            self.send(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded"),
                Body::from(body),
            )
            .await
        }

        async fn post_multipart(&mut self, uri: &str, body: Vec<u8>) -> axum::response::Response {
            self.send(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(
                        CONTENT_TYPE,
                        format!("multipart/form-data; boundary={BOUNDARY}"),
                    ),
                Body::from(body),
            )
            .await
        }
    }

    fn multipart_body(token: &str, file_field: &str, file_name: &str, mime: &str, bytes: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"csrf_token\"\r\n\r\n{token}\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{file_field}\"; filename=\"{file_name}\"\r\nContent-Type: {mime}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn png_bytes() -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        image::DynamicImage::new_rgb8(24, 16)
            .write_to(&mut bytes, image::ImageFormat::Png)
            .expect("encode png");
        bytes.into_inner()
    }

    async fn read_body(response: axum::response::Response) -> String {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        String::from_utf8_lossy(&bytes).to_string()
    }

    #[tokio::test]
    async fn home_page_renders_forms() {
        let mut harness = Harness::new(false);
        let body = harness.home().await;
        assert!(body.contains("action=\"/image\""));
        assert!(body.contains("action=\"/reference\""));
        assert!(body.contains("action=\"/article\""));
        assert!(body.contains("Bahasa Indonesia"));
        assert!(harness.cookie.is_some());
    }

    #[tokio::test]
    async fn post_without_token_is_unauthorized() {
        let mut harness = Harness::new(false);
        let response = harness
            .post_form("/article", "csrf_token=nope&instruction=Tulis".to_string())
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn image_then_article_is_recorded() {
        let mut harness = Harness::new(false);
        let token = harness.csrf_token().await;

        let body = multipart_body(&token, "image", "banjir.png", "image/png", &png_bytes());
        let response = harness.post_multipart("/image", body).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers().get(LOCATION).unwrap(), "/");
        assert_eq!(harness.captioner.calls.load(Ordering::SeqCst), 1);

        let response = harness
            .post_form(
                "/article",
                format!("csrf_token={token}&instruction=Tulis+investigasi&language=id"),
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let prompts = harness.generator.prompts.lock().unwrap().clone();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("a flooded street with a red bus"));

        let body = harness.home().await;
        assert!(body.contains("Judul: Banjir Rendam Jalan Utama"));
        assert!(body.contains("Tulis artikel investigatif dengan alur kronologis"));
        assert!(body.contains("Artikel selesai ditulis."));
    }

    #[tokio::test]
    async fn image_metadata_is_shown_on_the_desk() {
        let mut harness = Harness::new(false);
        let token = harness.csrf_token().await;

        let body = multipart_body(&token, "image", "banjir.png", "image/png", &png_bytes());
        let response = harness.post_multipart("/image", body).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let body = harness.home().await;
        assert!(body.contains("<h3>Metadata</h3>"));
        assert!(body.contains("Tidak ada metadata EXIF pada gambar."));
    }

    #[tokio::test]
    async fn oversized_image_warns_without_captioning() {
        let mut harness = Harness::new(false);
        let token = harness.csrf_token().await;

        let oversized = vec![0u8; MAX_IMAGE_BYTES + 1024 * 1024];
        let body = multipart_body(&token, "image", "besar.jpg", "image/jpeg", &oversized);
        let response = harness.post_multipart("/image", body).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(harness.captioner.calls.load(Ordering::SeqCst), 0);

        let body = harness.home().await;
        assert!(body.contains("File terlalu besar! Maksimal ukuran file adalah 10 MB."));
    }

    #[tokio::test]
    async fn blank_instruction_warns() {
        let mut harness = Harness::new(false);
        let token = harness.csrf_token().await;
        let response = harness
            .post_form("/article", format!("csrf_token={token}&instruction=+++"))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(harness.generator.prompts.lock().unwrap().is_empty());

        let body = harness.home().await;
        assert!(body.contains("Tolong masukkan perintah atau pertanyaan."));
    }

    #[tokio::test]
    async fn generator_failure_leaves_history_untouched() {
        let mut harness = Harness::new(true);
        let token = harness.csrf_token().await;
        let response = harness
            .post_form("/article", format!("csrf_token={token}&instruction=Tulis+berita"))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let response = harness
            .send(
                Request::builder().method("GET").uri("/history/export"),
                Body::empty(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(read_body(response).await.is_empty());
    }

    #[tokio::test]
    async fn reference_is_used_when_requested() {
        let mut harness = Harness::new(false);
        let token = harness.csrf_token().await;

        let body = multipart_body(
            &token,
            "reference",
            "gaya.txt",
            "text/plain",
            "Gaya tulisan yang santai dan lugas.".as_bytes(),
        );
        let response = harness.post_multipart("/reference", body).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let response = harness
            .post_form(
                "/article",
                format!(
                    "csrf_token={token}&instruction=Tulis+berita&language=en&use_reference=on"
                ),
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let prompts = harness.generator.prompts.lock().unwrap().clone();
        assert!(prompts[0].contains("Gaya tulisan yang santai dan lugas."));
        assert!(prompts[0].contains("No image."));
    }

    #[tokio::test]
    async fn export_and_clear_history() {
        let mut harness = Harness::new(false);
        let token = harness.csrf_token().await;
        harness
            .post_form(
                "/article",
                format!("csrf_token={token}&instruction=Tulis+berita"),
            )
            .await;

        let response = harness
            .send(
                Request::builder().method("GET").uri("/history/export"),
                Body::empty(),
            )
            .await;
        let disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\"riwayat_artikel_"));
        let body = read_body(response).await;
        assert!(body.contains("Pengguna: Tulis berita"));
        assert!(body.contains("Bahasa: Bahasa Indonesia"));
        assert!(body.contains("Caption: Tidak ada gambar."));
        assert!(body.contains("Hasil:\nJudul: Banjir Rendam Jalan Utama"));

        let response = harness
            .post_form("/history/clear", format!("csrf_token={token}"))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let response = harness
            .send(
                Request::builder().method("GET").uri("/history/export"),
                Body::empty(),
            )
            .await;
        assert!(read_body(response).await.is_empty());
    }

    #[tokio::test]
    async fn stylesheet_is_served() {
        let mut harness = Harness::new(false);
        let response = harness
            .send(
                Request::builder().method("GET").uri("/static/styles.css"),
                Body::empty(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
