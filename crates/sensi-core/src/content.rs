//! Remote content: preset overlay and the popular-character list.
//!
//! Loaded once the identity gate reports ready. Failures never leave the app
//! without presets; the fallback table is always underneath.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::presets::{PresetDraft, PresetTable, SensitivityPreset};
use crate::store::{DocumentPaths, DocumentStore};

/// Characters seeded into a fresh game-data document.
pub const DEFAULT_CHARACTERS: &[&str] = &["Alok", "Chrono", "Wukong", "Skyler", "K"];

/// Game-data document body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameData {
    #[serde(default)]
    pub popular_characters: Vec<String>,
}

pub fn default_characters() -> Vec<String> {
    DEFAULT_CHARACTERS.iter().map(|c| c.to_string()).collect()
}

/// Reads and writes the presets and game-data documents.
#[derive(Clone)]
pub struct ContentRepository {
    store: DocumentStore,
    paths: DocumentPaths,
}

impl ContentRepository {
    pub fn new(store: DocumentStore, paths: DocumentPaths) -> Self {
        Self { store, paths }
    }

    /// Overlay the remote presets document on `table`. A missing document keeps the fallback.
    pub fn load_presets(&self, table: &mut PresetTable) -> Result<(), StoreError> {
        let path = self.paths.presets();
        match self
            .store
            .get_as::<BTreeMap<String, SensitivityPreset>>(&path)
        {
            Ok(Some(remote)) => {
                tracing::info!("[SENSI CONTENT] {} remote presets merged over fallback", remote.len());
                table.overlay(remote);
                Ok(())
            }
            Ok(None) => {
                tracing::warn!("[SENSI CONTENT] No presets document; using local fallback data");
                *table = PresetTable::default();
                Ok(())
            }
            Err(e) => {
                *table = PresetTable::default();
                Err(e)
            }
        }
    }

    /// Popular characters; seeds the document with the defaults when absent.
    pub fn load_characters(&self) -> Result<Vec<String>, StoreError> {
        let path = self.paths.game_data();
        if let Some(data) = self.store.get_as::<GameData>(&path)? {
            return Ok(data.popular_characters);
        }
        let seeded = GameData {
            popular_characters: default_characters(),
        };
        self.store.set(&path, &seeded)?;
        tracing::info!("[SENSI CONTENT] Seeded game data with default characters");
        Ok(seeded.popular_characters)
    }

    /// Owner panel save: presets overwrite, characters shallow-merge into game data.
    pub fn save(&self, presets: &PresetDraft, characters: &[String]) -> Result<(), StoreError> {
        self.store.set(&self.paths.presets(), presets)?;
        let mut fields = Map::new();
        fields.insert(
            "popularCharacters".to_string(),
            Value::from(characters.to_vec()),
        );
        self.store.merge(&self.paths.game_data(), fields)?;
        tracing::info!(
            "[SENSI CONTENT] Saved {} presets and {} characters",
            presets.sorted_entries().len(),
            characters.len()
        );
        Ok(())
    }
}

/// Owner-panel character list edits.
pub fn add_character(characters: &mut Vec<String>, name: &str) -> bool {
    let name = name.trim();
    if name.is_empty() {
        return false;
    }
    characters.push(name.to_string());
    true
}

pub fn remove_character(characters: &mut Vec<String>, name: &str) {
    characters.retain(|c| c != name);
}
