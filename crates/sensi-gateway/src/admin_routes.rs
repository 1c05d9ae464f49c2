//! Owner panel: preset table, popular characters, usage analytics.
//!
//! Requests carry `x-admin-id` / `x-admin-key`. This keeps casual visitors out
//! of the panel; it is not an access-control boundary.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use sensi_core::content::{add_character, remove_character};
use sensi_core::{PresetDraft, SensitivitySettings, UsageStats};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api_error::ApiError;
use crate::state::AppState;

fn header<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    if state
        .config
        .admin_matches(header(headers, "x-admin-id"), header(headers, "x-admin-key"))
    {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    admin_id: String,
    admin_key: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    if !state.config.admin_matches(body.admin_id.trim(), body.admin_key.trim()) {
        tracing::warn!("[SENSI ADMIN] Rejected owner login");
        return Err(ApiError::Unauthorized);
    }
    tracing::info!("[SENSI ADMIN] Owner signed in");
    Ok(Json(json!({ "authenticated": true })))
}

#[derive(Serialize, Deserialize)]
pub struct PresetRow {
    ram: String,
    dpi: String,
    settings: SensitivitySettings,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetPanel {
    presets: Vec<PresetRow>,
    placeholders_added: bool,
}

fn panel(draft: &PresetDraft, placeholders_added: bool) -> PresetPanel {
    PresetPanel {
        presets: draft
            .sorted_entries()
            .into_iter()
            .map(|(ram, p)| PresetRow {
                ram: ram.clone(),
                dpi: p.dpi.clone(),
                settings: p.settings,
            })
            .collect(),
        placeholders_added,
    }
}

/// Write both documents and make the draft the live table.
async fn persist(state: &AppState, draft: PresetDraft, characters: Vec<String>) -> Result<PresetDraft, ApiError> {
    state.content.save(&draft, &characters)?;
    state.presets.write().await.replace(draft.clone().into_inner());
    *state.characters.write().await = characters;
    Ok(draft)
}

async fn current_draft(state: &AppState) -> (PresetDraft, bool) {
    let table = state.presets.read().await;
    let before = table.active().len();
    let draft = PresetDraft::from_table(&table);
    let added = draft.sorted_entries().len() > before;
    (draft, added)
}

pub async fn get_presets(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<PresetPanel>, ApiError> {
    require_admin(&state, &headers)?;
    let (draft, added) = current_draft(&state).await;
    Ok(Json(panel(&draft, added)))
}

/// Replace the whole table. Rows are normalized and checked one by one.
pub async fn put_presets(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(rows): Json<Vec<PresetRow>>,
) -> Result<Json<PresetPanel>, ApiError> {
    require_admin(&state, &headers)?;
    let mut draft = PresetDraft::default();
    for row in rows {
        draft.upsert(&row.ram, &row.dpi, row.settings)?;
    }
    let added = draft.ensure_required_sizes();
    let characters = state.characters.read().await.clone();
    let draft = persist(&state, draft, characters).await?;
    Ok(Json(panel(&draft, added)))
}

#[derive(Deserialize)]
pub struct FieldEdit {
    field: String,
    value: String,
}

pub async fn edit_preset_field(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(ram): Path<String>,
    Json(edit): Json<FieldEdit>,
) -> Result<Json<PresetPanel>, ApiError> {
    require_admin(&state, &headers)?;
    let (mut draft, added) = current_draft(&state).await;
    draft.set_field(&ram, &edit.field, &edit.value)?;
    let characters = state.characters.read().await.clone();
    let draft = persist(&state, draft, characters).await?;
    Ok(Json(panel(&draft, added)))
}

pub async fn delete_preset(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(ram): Path<String>,
) -> Result<Json<PresetPanel>, ApiError> {
    require_admin(&state, &headers)?;
    let (mut draft, _) = current_draft(&state).await;
    if draft.remove(&ram).is_none() {
        return Err(ApiError::NotFound("No preset for that RAM size."));
    }
    let characters = state.characters.read().await.clone();
    let draft = persist(&state, draft, characters).await?;
    Ok(Json(panel(&draft, false)))
}

#[derive(Serialize, Deserialize)]
pub struct CharacterList {
    characters: Vec<String>,
}

pub async fn get_characters(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<CharacterList>, ApiError> {
    require_admin(&state, &headers)?;
    Ok(Json(CharacterList {
        characters: state.characters.read().await.clone(),
    }))
}

/// Replace the list. Blank names are dropped.
pub async fn put_characters(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CharacterList>,
) -> Result<Json<CharacterList>, ApiError> {
    require_admin(&state, &headers)?;
    let mut characters = Vec::new();
    for name in &body.characters {
        add_character(&mut characters, name);
    }
    let (draft, _) = current_draft(&state).await;
    persist(&state, draft, characters.clone()).await?;
    Ok(Json(CharacterList { characters }))
}

#[derive(Deserialize)]
pub struct NewCharacter {
    name: String,
}

pub async fn add_character_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<NewCharacter>,
) -> Result<Json<CharacterList>, ApiError> {
    require_admin(&state, &headers)?;
    let mut characters = state.characters.read().await.clone();
    if !add_character(&mut characters, &body.name) {
        return Err(ApiError::BadRequest("Character name is required.".to_string()));
    }
    let (draft, _) = current_draft(&state).await;
    persist(&state, draft, characters.clone()).await?;
    Ok(Json(CharacterList { characters }))
}

pub async fn remove_character_route(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Result<Json<CharacterList>, ApiError> {
    require_admin(&state, &headers)?;
    let mut characters = state.characters.read().await.clone();
    remove_character(&mut characters, &name);
    let (draft, _) = current_draft(&state).await;
    persist(&state, draft, characters.clone()).await?;
    Ok(Json(CharacterList { characters }))
}

pub async fn analytics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    require_admin(&state, &headers)?;
    let stats: UsageStats = state.analytics.stats()?;
    let preset_count = state.presets.read().await.active().len();
    Ok(Json(json!({
        "usage": stats,
        "presetCount": preset_count,
        "activeSessions": state.session_count(),
        "contentReady": state.auth.is_ready(),
        "signedInAs": state.auth.identity(),
    })))
}
