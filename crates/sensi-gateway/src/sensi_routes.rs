//! Sensitivity generator routes: presets, suggestions, step flow, assistant, chat, speech.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use sensi_core::assistant::{self, GeneratedContext, PLAYSTYLES};
use sensi_core::device;
use sensi_core::{
    AssistantContext, ChatMessage, ChatSettings, Feature, ResolvedPreset, SensiError,
    SensiWizard, SensitivitySettings, WizardView,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api_error::ApiError;
use crate::state::AppState;

/// Assistant and chat need unlocked results; a session that never started has none.
fn not_started() -> ApiError {
    ApiError::Core(SensiError::InvalidStep {
        expected: "results",
        actual: "input",
    })
}

#[derive(Serialize)]
pub struct PresetEntry {
    pub ram: String,
    pub dpi: String,
    pub settings: SensitivitySettings,
}

pub async fn list_presets(State(state): State<Arc<AppState>>) -> Json<Vec<PresetEntry>> {
    let table = state.presets.read().await;
    Json(
        table
            .sorted_entries()
            .into_iter()
            .map(|(ram, preset)| PresetEntry {
                ram: ram.clone(),
                dpi: preset.dpi.clone(),
                settings: preset.settings,
            })
            .collect(),
    )
}

#[derive(Deserialize)]
pub struct ResolveRequest {
    ram: String,
}

pub async fn resolve_preset(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ResolveRequest>,
) -> Result<Json<ResolvedPreset>, ApiError> {
    Ok(Json(state.presets.read().await.resolve(&body.ram)?))
}

#[derive(Deserialize)]
pub struct SuggestionQuery {
    #[serde(default)]
    q: String,
}

pub async fn suggestions(Query(query): Query<SuggestionQuery>) -> Json<Value> {
    Json(serde_json::json!({ "suggestions": device::suggestions(&query.q) }))
}

pub async fn wizard_view(
    State(state): State<Arc<AppState>>,
    Path(session): Path<String>,
) -> Result<Json<WizardView>, ApiError> {
    match state.existing_session(&session)? {
        Some(session) => Ok(Json(session.lock().await.wizard.view())),
        None => Ok(Json(SensiWizard::new().view())),
    }
}

#[derive(Deserialize)]
pub struct DeviceRequest {
    #[serde(default)]
    model: String,
}

pub async fn submit_device(
    State(state): State<Arc<AppState>>,
    Path(session): Path<String>,
    Json(body): Json<DeviceRequest>,
) -> Result<Json<WizardView>, ApiError> {
    let session = state.session(&session)?;
    let mut guard = session.lock().await;
    guard
        .wizard
        .submit_device(&body.model, state.validator.as_ref())
        .await?;
    Ok(Json(guard.wizard.view()))
}

#[derive(Deserialize)]
pub struct RamRequest {
    ram: String,
}

pub async fn select_ram(
    State(state): State<Arc<AppState>>,
    Path(session): Path<String>,
    Json(body): Json<RamRequest>,
) -> Result<Json<WizardView>, ApiError> {
    let session = state.session(&session)?;
    let mut guard = session.lock().await;
    guard.wizard.select_ram(&body.ram)?;
    Ok(Json(guard.wizard.view()))
}

pub async fn generate(
    State(state): State<Arc<AppState>>,
    Path(session): Path<String>,
) -> Result<Json<WizardView>, ApiError> {
    let session = state.session(&session)?;
    let mut guard = session.lock().await;
    let presets = state.presets.read().await;
    guard.wizard.generate(&presets, &state.analytics).await?;
    Ok(Json(guard.wizard.view()))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockResponse {
    #[serde(flatten)]
    view: WizardView,
    channel_url: Option<String>,
}

pub async fn unlock(
    State(state): State<Arc<AppState>>,
    Path(session): Path<String>,
) -> Result<Json<UnlockResponse>, ApiError> {
    let session = state.session(&session)?;
    let mut guard = session.lock().await;
    guard.wizard.unlock()?;
    Ok(Json(UnlockResponse {
        view: guard.wizard.view(),
        channel_url: state.config.channel_url.clone(),
    }))
}

pub async fn reset(
    State(state): State<Arc<AppState>>,
    Path(session): Path<String>,
) -> Result<Json<WizardView>, ApiError> {
    let session = state.session(&session)?;
    let mut guard = session.lock().await;
    guard.wizard.reset();
    Ok(Json(guard.wizard.view()))
}

#[derive(Deserialize)]
pub struct AssistantRequest {
    session: String,
    #[serde(default)]
    playstyle: Option<String>,
    #[serde(default)]
    character: Option<String>,
}

#[derive(Serialize)]
pub struct AssistantResponse {
    feature: Feature,
    answer: Value,
    speech: String,
}

pub async fn run_assistant(
    State(state): State<Arc<AppState>>,
    Path(feature): Path<String>,
    Json(body): Json<AssistantRequest>,
) -> Result<Json<AssistantResponse>, ApiError> {
    let feature = Feature::parse(&feature).ok_or(ApiError::NotFound("Unknown assistant feature."))?;
    let playstyle = body.playstyle.unwrap_or_else(|| PLAYSTYLES[0].to_string());
    if !PLAYSTYLES.contains(&playstyle.as_str()) {
        return Err(ApiError::BadRequest(format!("Unknown playstyle {}.", playstyle)));
    }

    let ctx = {
        let session = state
            .existing_session(&body.session)?
            .ok_or_else(not_started)?;
        let guard = session.lock().await;
        let generated = guard.wizard.unlocked_settings()?;
        let view = guard.wizard.view();
        let characters = state.characters.read().await;
        let requested = body.character.as_deref().unwrap_or("Alok");
        AssistantContext {
            mobile_model: view.mobile_model.trim().to_string(),
            selected_ram: view.selected_ram.unwrap_or_default(),
            playstyle,
            character: Some(assistant::pick_character(requested, &characters)),
            generated: Some(GeneratedContext::from(generated)),
        }
    };

    let answer = assistant::run_feature(state.generator.as_ref(), feature, &ctx).await?;
    let speech = assistant::speech_text(feature, &answer);
    Ok(Json(AssistantResponse {
        feature,
        answer,
        speech,
    }))
}

#[derive(Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    reply: Option<ChatMessage>,
    messages: Vec<ChatMessage>,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Path(session): Path<String>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let session = state.existing_session(&session)?.ok_or_else(not_started)?;
    let mut guard = session.lock().await;
    let settings = {
        let generated = guard.wizard.unlocked_settings()?;
        ChatSettings {
            general: Some(generated.fixed_sensitivity.general),
            red_dot: Some(generated.fixed_sensitivity.red_dot),
            dpi: Some(generated.dpi.clone()),
        }
    };
    let reply =
        assistant::send_chat(state.generator.as_ref(), &mut guard.chat, &settings, &body.text).await;
    Ok(Json(ChatResponse {
        reply,
        messages: guard.chat.messages().to_vec(),
    }))
}

#[derive(Deserialize)]
pub struct SpeechRequest {
    #[serde(default)]
    text: String,
}

pub async fn speech(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SpeechRequest>,
) -> Result<Response, ApiError> {
    let text = body.text.trim();
    if text.is_empty() {
        return Err(ApiError::BadRequest("Nothing to read out.".to_string()));
    }
    let wav = state
        .speech
        .synthesize_speech(text)
        .await
        .map_err(|e| ApiError::Core(e.into()))?;
    Ok(([(header::CONTENT_TYPE, "audio/wav")], wav).into_response())
}
