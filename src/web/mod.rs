//! HTTP surface: the page, its static assets, and the session API that drives
//! the orchestrator.

pub mod page;
pub mod sessions;

use crate::config::AssetSettings;
use crate::image_source::{read_asset, DecodedImage, ImageSource};
use crate::orchestrator::{Interaction, InteractionReport, Notice, Orchestrator, PipelineState};
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use sessions::SessionStore;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

/// Phone photos routinely exceed axum's 2 MB default.
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub sessions: Arc<SessionStore>,
    pub assets: AssetSettings,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        assets: AssetSettings,
        session_idle: std::time::Duration,
    ) -> Self {
        Self {
            orchestrator,
            sessions: Arc::new(SessionStore::new(session_idle)),
            assets,
        }
    }
}

/// Create the router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/banner", get(banner))
        .route("/presets/:name", get(preset_image))
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session))
        .route("/api/sessions/:id/image", post(select_image))
        .route("/api/sessions/:id/classify", post(classify))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct ImageSummary {
    pub origin: String,
    pub width: u32,
    pub height: u32,
}

impl From<&DecodedImage> for ImageSummary {
    fn from(image: &DecodedImage) -> Self {
        Self {
            origin: image.origin.clone(),
            width: image.width(),
            height: image.height(),
        }
    }
}

/// What the page needs to render one session.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub state: PipelineState,
    pub can_classify: bool,
    pub image: Option<ImageSummary>,
    pub notices: Vec<Notice>,
    pub report: Option<InteractionReport>,
}

impl SessionView {
    fn of(session_id: Uuid, interaction: &Interaction) -> Self {
        Self {
            session_id,
            state: interaction.state(),
            can_classify: interaction.can_classify(),
            image: interaction.image().map(ImageSummary::from),
            notices: interaction.notices().to_vec(),
            report: interaction.report().cloned(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SessionCreated {
    session_id: Uuid,
}

async fn index(State(state): State<AppState>) -> Html<String> {
    let banner_path = state.assets.banner_path();
    let banner_present = banner_path.is_file();
    if !banner_present {
        warn!(path = %banner_path.display(), "Banner image not found");
    }

    let banner_name = state.assets.banner.display().to_string();
    Html(page::render_page(
        state.orchestrator.catalog().names(),
        (&banner_name, banner_present),
    ))
}

fn image_response(path: &std::path::Path) -> Response {
    match read_asset(path) {
        Some(bytes) => {
            let content_type = match image::guess_format(&bytes) {
                Ok(image::ImageFormat::Png) => "image/png",
                Ok(image::ImageFormat::Jpeg) => "image/jpeg",
                _ => "application/octet-stream",
            };
            ([(header::CONTENT_TYPE, content_type)], bytes).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn banner(State(state): State<AppState>) -> Response {
    image_response(&state.assets.banner_path())
}

async fn preset_image(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match state.orchestrator.catalog().path_for(&name) {
        Some(path) => image_response(&path),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn create_session(State(state): State<AppState>) -> impl IntoResponse {
    let session_id = state.sessions.create().await;
    (StatusCode::CREATED, Json(SessionCreated { session_id }))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, StatusCode> {
    let session = state.sessions.get(&id).await.ok_or(StatusCode::NOT_FOUND)?;
    let interaction = session.lock().await;
    Ok(Json(SessionView::of(id, &interaction)))
}

/// Accepts a `preset` text field and/or a `file` upload field.
async fn select_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<SessionView>, StatusCode> {
    let session = state.sessions.get(&id).await.ok_or(StatusCode::NOT_FOUND)?;

    let mut preset: Option<String> = None;
    let mut upload: Option<(Vec<u8>, Option<String>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!(session = %id, error = %e, "Malformed multipart body");
        StatusCode::BAD_REQUEST
    })? {
        match field.name() {
            Some("preset") => {
                preset = Some(field.text().await.map_err(|_| StatusCode::BAD_REQUEST)?);
            }
            Some("file") => {
                let filename = field.file_name().map(String::from);
                let bytes = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
                upload = Some((bytes.to_vec(), filename));
            }
            _ => {}
        }
    }

    let source = ImageSource::from_selection(preset.as_deref(), upload);
    let mut interaction = session.lock().await;
    let next = state.orchestrator.select_image(&mut interaction, source);
    info!(session = %id, state = ?next, "Image selection handled");

    Ok(Json(SessionView::of(id, &interaction)))
}

async fn classify(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, StatusCode> {
    let session = state.sessions.get(&id).await.ok_or(StatusCode::NOT_FOUND)?;
    let mut interaction = session.lock().await;

    match state.orchestrator.classify(&mut interaction).await {
        Ok(next) => {
            info!(session = %id, state = ?next, "Classification run finished");
            Ok(Json(SessionView::of(id, &interaction)).into_response())
        }
        Err(e) => {
            warn!(session = %id, error = %e, "Classification rejected");
            Ok((StatusCode::CONFLICT, Json(SessionView::of(id, &interaction))).into_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{ClassificationAdapter, IngredientAdapter, RecommendationAdapter};
    use crate::classifier::{ClassificationResult, ImageClassifier, Prediction};
    use crate::error::Result;
    use crate::image_source::tests::png_bytes;
    use crate::image_source::{ImageSourceResolver, PresetCatalog, DEFAULT_PRESETS};
    use crate::llm::{CompletionConfig, LlmBroker, LlmGateway, LlmGatewayResponse, LlmMessage};
    use crate::rag::RagGateway;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use std::path::PathBuf;
    use std::time::Duration;
    use tower::ServiceExt;

    struct Pizza;

    #[async_trait::async_trait]
    impl ImageClassifier for Pizza {
        async fn classify(&self, _image: &DecodedImage) -> Result<ClassificationResult> {
            Ok(ClassificationResult::new(vec![Prediction::new("pizza_margherita", 0.87)]))
        }
    }

    struct Chat;

    #[async_trait::async_trait]
    impl LlmGateway for Chat {
        async fn complete(
            &self,
            _model: &str,
            _messages: &[LlmMessage],
            _config: &CompletionConfig,
        ) -> Result<LlmGatewayResponse> {
            Ok(LlmGatewayResponse {
                content: Some("dough, tomato, mozzarella".to_string()),
                finish_reason: None,
            })
        }
    }

    struct Rag;

    #[async_trait::async_trait]
    impl RagGateway for Rag {
        async fn query(&self, _query: &str) -> Result<String> {
            Ok("Use a cauliflower crust.".to_string())
        }
    }

    fn app(assets: &std::path::Path) -> Router {
        app_with_idle(assets, Duration::from_secs(3600))
    }

    fn app_with_idle(assets: &std::path::Path, session_idle: Duration) -> Router {
        for (_, file) in DEFAULT_PRESETS {
            std::fs::write(assets.join(file), png_bytes()).unwrap();
        }
        let orchestrator = Orchestrator::new(
            ImageSourceResolver::new(PresetCatalog::new(assets)),
            ClassificationAdapter::new(Arc::new(Pizza)),
            IngredientAdapter::new(LlmBroker::new("qwen", Arc::new(Chat)), 50),
            RecommendationAdapter::new(Arc::new(Rag)),
        );
        create_router(AppState::new(
            Arc::new(orchestrator),
            AssetSettings {
                assets_dir: assets.to_path_buf(),
                banner: PathBuf::from("IR_IMAGE.png"),
            },
            session_idle,
        ))
    }

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn new_session(app: &Router) -> String {
        let response = app
            .clone()
            .oneshot(Request::post("/api/sessions").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        json_body(response).await["session_id"].as_str().unwrap().to_string()
    }

    fn preset_form(preset: &str) -> (String, Body) {
        let boundary = "platemate-test-boundary";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"preset\"\r\n\r\n{p}\r\n--{b}--\r\n",
            b = boundary,
            p = preset
        );
        (format!("multipart/form-data; boundary={}", boundary), Body::from(body))
    }

    fn upload_form(filename: &str, bytes: &[u8]) -> (String, Body) {
        let boundary = "platemate-test-boundary";
        let mut body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"preset\"\r\n\r\nNone\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n",
            b = boundary,
            f = filename
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
        (format!("multipart/form-data; boundary={}", boundary), Body::from(body))
    }

    async fn post_image(app: &Router, id: &str, (content_type, body): (String, Body)) -> Response {
        app.clone()
            .oneshot(
                Request::post(format!("/api/sessions/{}/image", id))
                    .header(header::CONTENT_TYPE, content_type)
                    .body(body)
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_index_renders_page_with_missing_banner_warning() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());

        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Banner image 'IR_IMAGE.png' not found."));
        assert!(html.contains(r#"<option value="Salad">"#));
    }

    #[tokio::test]
    async fn test_preset_and_banner_assets() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());

        let response = app
            .clone()
            .oneshot(Request::get("/presets/Pizza").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");

        let response = app
            .clone()
            .oneshot(Request::get("/presets/Tacos").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(Request::get("/banner").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_classify_before_selection_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        let id = new_session(&app).await;

        let response = app
            .oneshot(
                Request::post(format!("/api/sessions/{}/classify", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let view = json_body(response).await;
        assert_eq!(view["state"], "idle");
        assert_eq!(view["can_classify"], false);
    }

    #[tokio::test]
    async fn test_select_preset_then_classify() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        let id = new_session(&app).await;

        let (content_type, body) = preset_form("Pizza");
        let response = app
            .clone()
            .oneshot(
                Request::post(format!("/api/sessions/{}/image", id))
                    .header(header::CONTENT_TYPE, content_type)
                    .body(body)
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let view = json_body(response).await;
        assert_eq!(view["state"], "image_selected");
        assert_eq!(view["image"]["origin"], "Pizza");

        let response = app
            .oneshot(
                Request::post(format!("/api/sessions/{}/classify", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let view = json_body(response).await;
        assert_eq!(view["state"], "done");
        assert_eq!(
            view["report"]["header"],
            "🍽️ Food: pizza_margherita (87.00% confidence)"
        );
        assert_eq!(view["report"]["ingredients"]["text"], "dough, tomato, mozzarella");
        assert_eq!(view["report"]["recommendation"]["status"], "completed");
    }

    #[tokio::test]
    async fn test_select_missing_preset_reports_warning() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        std::fs::remove_file(dir.path().join("sample_salad.png")).unwrap();
        let id = new_session(&app).await;

        let (content_type, body) = preset_form("Salad");
        let response = app
            .oneshot(
                Request::post(format!("/api/sessions/{}/image", id))
                    .header(header::CONTENT_TYPE, content_type)
                    .body(body)
                    .unwrap(),
            )
            .await
            .unwrap();

        let view = json_body(response).await;
        assert_eq!(view["state"], "idle");
        assert_eq!(view["notices"][0]["level"], "warning");
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());

        let response = app
            .oneshot(
                Request::get(format!("/api/sessions/{}", Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_upload_selects_image() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        let id = new_session(&app).await;

        let response = post_image(&app, &id, upload_form("a.png", &png_bytes())).await;

        assert_eq!(response.status(), StatusCode::OK);
        let view = json_body(response).await;
        assert_eq!(view["state"], "image_selected");
        assert_eq!(view["can_classify"], true);
        assert_eq!(view["image"]["origin"], "a.png");
        assert_eq!(view["image"]["width"], 4);
        assert_eq!(view["image"]["height"], 3);
    }

    #[tokio::test]
    async fn test_undecodable_upload_reports_warning() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        let id = new_session(&app).await;

        let response = post_image(&app, &id, upload_form("notes.png", b"not an image")).await;

        assert_eq!(response.status(), StatusCode::OK);
        let view = json_body(response).await;
        assert_eq!(view["state"], "idle");
        assert_eq!(view["can_classify"], false);
        assert!(view["image"].is_null());
        assert_eq!(view["notices"][0]["level"], "warning");
    }

    #[tokio::test]
    async fn test_idle_session_expires() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_with_idle(dir.path(), Duration::from_millis(20));
        let stale = new_session(&app).await;

        tokio::time::sleep(Duration::from_millis(60)).await;
        let fresh = new_session(&app).await;

        for (id, expected) in [(stale, StatusCode::NOT_FOUND), (fresh, StatusCode::OK)] {
            let response = app
                .clone()
                .oneshot(
                    Request::get(format!("/api/sessions/{}", id))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), expected);
        }
    }
}
