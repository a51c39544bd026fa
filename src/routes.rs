use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, patch, post, put},
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use std::{str::FromStr, sync::Arc};
use tracing::{error, info};

use crate::{
    client::TryOnApi,
    controller::{Phase, SubmissionController},
    error::{PreferencesError, TryOnError, UnknownOption},
    history::History,
    models::{GarmentType, Gender, ImagePayload, LoginRequest, ModelType, Style, TryOnResult},
    notify::{Notifications, Toast},
    preferences::PreferenceStore,
    progress::ProgressIndicator,
    session::{AuthSession, AuthState},
    staging::{StagedInputs, StagedSummary},
};

/// Uploads above this are refused before they reach a handler.
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub staged: Arc<RwLock<StagedInputs>>,
    pub controller: Arc<SubmissionController>,
    pub history: Arc<History>,
    pub notices: Arc<Notifications>,
    pub prefs: Arc<PreferenceStore>,
    pub auth: Arc<AuthSession>,
    pub api: Arc<dyn TryOnApi>,
}

impl AppState {
    pub fn new(api: Arc<dyn TryOnApi>, progress: Arc<dyn ProgressIndicator>, prefs: PreferenceStore) -> Self {
        let history = Arc::new(History::default());
        let notices = Arc::new(Notifications::default());
        let controller = Arc::new(SubmissionController::new(api.clone(), progress, history.clone(), notices.clone()));
        Self {
            staged: Arc::default(),
            controller,
            history,
            notices,
            prefs: Arc::new(prefs),
            auth: Arc::default(),
            api,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing))
        .route("/try-on", get(try_on_view))
        .route("/try-on/person-image", put(stage_person_image))
        .route("/try-on/cloth-image", put(stage_cloth_image))
        .route("/try-on/options", patch(stage_options))
        .route("/try-on/submit", post(submit))
        .route("/theme/toggle", post(toggle_theme))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct LandingView {
    pub name: &'static str,
    pub tagline: &'static str,
    pub features: Vec<&'static str>,
    pub try_on_path: &'static str,
    pub dark_mode: bool,
}

pub async fn landing(State(state): State<AppState>) -> Json<LandingView> {
    Json(LandingView {
        name: "Virtual Try-On Studio",
        tagline: "See the outfit on you before you buy it.",
        features: vec![
            "Upload a photo of yourself and a photo of the garment",
            "Pick fit, gender, garment type and style",
            "Get AI-generated try-on images in seconds",
            "Compare every result from this session side by side",
        ],
        try_on_path: "/try-on",
        dark_mode: state.prefs.dark_mode(),
    })
}

/// Choices offered for each selector.
#[derive(Debug, Serialize)]
pub struct OptionCatalog {
    pub model_type: &'static [ModelType],
    pub gender: &'static [Gender],
    pub garment_type: &'static [GarmentType],
    pub style: &'static [Style],
}

#[derive(Debug, Serialize)]
pub struct TryOnView {
    pub staged: StagedSummary,
    pub phase: Phase,
    pub loading: bool,
    pub progress: u8,
    pub current_result: Option<TryOnResult>,
    pub history: Vec<TryOnResult>,
    pub history_count: usize,
    pub dark_mode: bool,
    pub toasts: Vec<Toast>,
    pub auth: AuthState,
    pub landing_path: &'static str,
    pub options: OptionCatalog,
}

/// Renders the workflow page. Pending toasts are shown once and then gone.
pub async fn try_on_view(State(state): State<AppState>) -> Json<TryOnView> {
    let staged = state.staged.read().summary();
    Json(TryOnView {
        staged,
        phase: state.controller.phase(),
        loading: state.controller.is_loading(),
        progress: state.controller.progress(),
        current_result: state.history.current_result(),
        history: state.history.entries(),
        history_count: state.history.len(),
        dark_mode: state.prefs.dark_mode(),
        toasts: state.notices.drain(),
        auth: state.auth.snapshot(),
        landing_path: "/",
        options: OptionCatalog {
            model_type: ModelType::ALL,
            gender: Gender::ALL,
            garment_type: GarmentType::ALL,
            style: Style::ALL,
        },
    })
}

fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
}

/// An empty body clears the slot.
fn payload_from(headers: &HeaderMap, body: Bytes, stem: &str) -> Option<ImagePayload> {
    let payload = ImagePayload::new(
        body,
        header_text(headers, "x-file-name"),
        header_text(headers, header::CONTENT_TYPE.as_str()),
        stem,
    );
    (!payload.is_empty()).then_some(payload)
}

fn log_staged(slot: &str, image: &Option<ImagePayload>) {
    match image {
        Some(i) => info!("🖼️ Staged {} image '{}' ({}, {} bytes)", slot, i.file_name, i.mime_type, i.len()),
        None => info!("🧹 Cleared {} image", slot),
    }
}

pub async fn stage_person_image(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Json<StagedSummary> {
    let image = payload_from(&headers, body, "person");
    log_staged("person", &image);
    let mut staged = state.staged.write();
    staged.set_person_image(image);
    Json(staged.summary())
}

pub async fn stage_cloth_image(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Json<StagedSummary> {
    let image = payload_from(&headers, body, "cloth");
    log_staged("cloth", &image);
    let mut staged = state.staged.write();
    staged.set_cloth_image(image);
    Json(staged.summary())
}

/// Partial update of the text and selector fields. A missing key leaves the
/// field alone; `null` or `""` unsets a selector.
#[derive(Debug, Default, Deserialize)]
pub struct OptionsPatch {
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default, with = "double_option")]
    pub model_type: Option<Option<String>>,
    #[serde(default, with = "double_option")]
    pub gender: Option<Option<String>>,
    #[serde(default, with = "double_option")]
    pub garment_type: Option<Option<String>>,
    #[serde(default, with = "double_option")]
    pub style: Option<Option<String>>,
}

fn selector<T: FromStr<Err = UnknownOption>>(raw: Option<Option<String>>) -> Result<Option<Option<T>>, UnknownOption> {
    raw.map(|value| value.filter(|v| !v.trim().is_empty()).map(|v| v.parse()).transpose())
        .transpose()
}

pub async fn stage_options(State(state): State<AppState>, Json(patch): Json<OptionsPatch>) -> Result<Json<StagedSummary>, UnknownOption> {
    // parse everything first so a bad value changes nothing
    let model_type = selector::<ModelType>(patch.model_type)?;
    let gender = selector::<Gender>(patch.gender)?;
    let garment_type = selector::<GarmentType>(patch.garment_type)?;
    let style = selector::<Style>(patch.style)?;

    let mut staged = state.staged.write();
    if let Some(instructions) = patch.instructions { staged.set_instructions(instructions); }
    if let Some(v) = model_type { staged.set_model_type(v); }
    if let Some(v) = gender { staged.set_gender(v); }
    if let Some(v) = garment_type { staged.set_garment_type(v); }
    if let Some(v) = style { staged.set_style(v); }
    Ok(Json(staged.summary()))
}

/// The submission runs on its own task: a caller that hangs up does not
/// cancel the upstream call, and the result still lands in History.
pub async fn submit(State(state): State<AppState>) -> Result<Json<TryOnResult>, TryOnError> {
    let staged = state.staged.read().clone();
    let controller = state.controller.clone();
    let outcome = tokio::spawn(async move { controller.submit(&staged).await })
        .await
        .map_err(|e| {
            error!("❌ Submission task died: {}", e);
            TryOnError::Transport(format!("submission task: {e}"))
        })?;
    outcome.map(Json)
}

#[derive(Debug, Serialize)]
pub struct ThemeView {
    pub dark_mode: bool,
}

pub async fn toggle_theme(State(state): State<AppState>) -> Result<Json<ThemeView>, PreferencesError> {
    // the file write blocks; keep it off the async workers
    let prefs = state.prefs.clone();
    let dark_mode = tokio::task::spawn_blocking(move || prefs.toggle_dark_mode()).await??;
    info!("🎨 Dark mode {}", if dark_mode { "on" } else { "off" });
    Ok(Json(ThemeView { dark_mode }))
}

#[derive(Debug, Serialize)]
pub struct LoginView {
    pub detail: String,
    pub username: String,
}

pub async fn login(State(state): State<AppState>, Json(body): Json<LoginRequest>) -> Result<Json<LoginView>, TryOnError> {
    let detail = state.auth.login(state.api.as_ref(), &body.username, &body.password).await?;
    Ok(Json(LoginView { detail, username: body.username }))
}

pub async fn logout(State(state): State<AppState>) -> StatusCode {
    state.auth.logout();
    StatusCode::NO_CONTENT
}
