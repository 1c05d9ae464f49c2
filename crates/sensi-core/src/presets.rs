//! Sensitivity presets: RAM tier -> DPI + six in-game sensitivity sliders.
//!
//! A [`PresetTable`] starts from the built-in fallback table and may be overlaid
//! once by the remote presets document. The overlay is key-wise: a remote
//! document that only carries `"6"` leaves every other tier untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{SensiError, SensiResult};

/// RAM tiers the owner panel always shows, even if the remote document lacks them.
pub const REQUIRED_RAM_SIZES: &[&str] = &["2", "3", "4", "6", "8", "12"];

/// DPI label used when a tier has no DPI recommendation.
pub const DEFAULT_DPI: &str = "Default";

/// The six sensitivity sliders. Every field is required on deserialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivitySettings {
    pub general: i64,
    pub red_dot: i64,
    pub two_x_scope: i64,
    pub four_x_scope: i64,
    pub sniper_scope: i64,
    pub free_look: i64,
}

impl SensitivitySettings {
    pub const fn new(
        general: i64,
        red_dot: i64,
        two_x_scope: i64,
        four_x_scope: i64,
        sniper_scope: i64,
        free_look: i64,
    ) -> Self {
        Self {
            general,
            red_dot,
            two_x_scope,
            four_x_scope,
            sniper_scope,
            free_look,
        }
    }

    /// All sliders at 100; the owner panel's blank row.
    pub const fn uniform_default() -> Self {
        Self::new(100, 100, 100, 100, 100, 100)
    }

    /// Set one slider by its document field name. Returns false for unknown names.
    pub fn set(&mut self, field: &str, value: i64) -> bool {
        let slot = match field {
            "general" => &mut self.general,
            "redDot" => &mut self.red_dot,
            "twoXScope" => &mut self.two_x_scope,
            "fourXScope" => &mut self.four_x_scope,
            "sniperScope" => &mut self.sniper_scope,
            "freeLook" => &mut self.free_look,
            _ => return false,
        };
        *slot = value;
        true
    }
}

/// One RAM tier's recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensitivityPreset {
    pub dpi: String,
    pub settings: SensitivitySettings,
}

impl SensitivityPreset {
    pub fn new(dpi: impl Into<String>, settings: SensitivitySettings) -> Self {
        Self {
            dpi: dpi.into(),
            settings,
        }
    }

    fn placeholder() -> Self {
        Self::new(DEFAULT_DPI, SensitivitySettings::uniform_default())
    }
}

/// Keep only the digits of a RAM label ("6GB" -> "6", "12 GB RAM" -> "12").
pub fn ram_key(label: &str) -> String {
    label.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Built-in presets used until (and underneath) the remote overlay.
pub fn fallback_presets() -> BTreeMap<String, SensitivityPreset> {
    [
        ("12", "400", SensitivitySettings::new(163, 150, 122, 165, 160, 165)),
        ("8", "420", SensitivitySettings::new(175, 160, 130, 145, 150, 140)),
        ("6", "430", SensitivitySettings::new(178, 150, 130, 145, 65, 60)),
        ("4", "480", SensitivitySettings::new(185, 151, 135, 145, 35, 66)),
        ("3", DEFAULT_DPI, SensitivitySettings::new(191, 181, 170, 155, 110, 126)),
        ("2", DEFAULT_DPI, SensitivitySettings::new(198, 185, 160, 165, 120, 130)),
    ]
    .into_iter()
    .map(|(ram, dpi, settings)| (ram.to_string(), SensitivityPreset::new(dpi, settings)))
    .collect()
}

/// A successfully resolved preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPreset {
    pub ram: String,
    pub dpi: String,
    pub settings: SensitivitySettings,
}

/// Merged view of fallback + remote presets.
#[derive(Debug, Clone)]
pub struct PresetTable {
    active: BTreeMap<String, SensitivityPreset>,
    fallback: BTreeMap<String, SensitivityPreset>,
}

impl Default for PresetTable {
    fn default() -> Self {
        Self::with_fallback(fallback_presets())
    }
}

impl PresetTable {
    pub fn with_fallback(fallback: BTreeMap<String, SensitivityPreset>) -> Self {
        Self {
            active: fallback.clone(),
            fallback,
        }
    }

    /// Merge a remote document over the fallback table; remote wins per RAM key.
    pub fn overlay(&mut self, remote: BTreeMap<String, SensitivityPreset>) {
        let mut merged = self.fallback.clone();
        merged.extend(remote);
        self.active = merged;
    }

    /// Replace the active table wholesale (owner panel save). Fallback stays as the safety net.
    pub fn replace(&mut self, presets: BTreeMap<String, SensitivityPreset>) {
        self.active = presets;
    }

    /// Look up a RAM selection: active table first, then the fallback.
    pub fn resolve(&self, ram_selection: &str) -> SensiResult<ResolvedPreset> {
        let key = ram_key(ram_selection);
        let preset = self
            .active
            .get(&key)
            .or_else(|| self.fallback.get(&key))
            .ok_or_else(|| SensiError::NoPreset(ram_selection.to_string()))?;
        Ok(ResolvedPreset {
            ram: key,
            dpi: preset.dpi.clone(),
            settings: preset.settings,
        })
    }

    pub fn active(&self) -> &BTreeMap<String, SensitivityPreset> {
        &self.active
    }

    /// Entries ordered by numeric RAM size rather than string order.
    pub fn sorted_entries(&self) -> Vec<(&String, &SensitivityPreset)> {
        sorted_entries(&self.active)
    }
}

fn sorted_entries(map: &BTreeMap<String, SensitivityPreset>) -> Vec<(&String, &SensitivityPreset)> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by_key(|(ram, _)| ram.parse::<u32>().unwrap_or(u32::MAX));
    entries
}

/// Owner-panel working copy. Edits stay local until saved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresetDraft {
    presets: BTreeMap<String, SensitivityPreset>,
}

impl PresetDraft {
    /// Start from the live table, filling any missing required tier with placeholders.
    pub fn from_table(table: &PresetTable) -> Self {
        let mut draft = Self {
            presets: table.active().clone(),
        };
        draft.ensure_required_sizes();
        draft
    }

    /// Returns true when at least one placeholder was added.
    pub fn ensure_required_sizes(&mut self) -> bool {
        let mut added = false;
        for ram in REQUIRED_RAM_SIZES {
            if !self.presets.contains_key(*ram) {
                self.presets
                    .insert((*ram).to_string(), SensitivityPreset::placeholder());
                added = true;
            }
        }
        added
    }

    /// Edit one field. `dpi` is stored verbatim; sliders parse as integers, non-numeric -> 0.
    pub fn set_field(&mut self, ram: &str, field: &str, value: &str) -> SensiResult<()> {
        let preset = self
            .presets
            .get_mut(ram)
            .ok_or_else(|| SensiError::NoPreset(ram.to_string()))?;
        if field == "dpi" {
            preset.dpi = value.to_string();
            return Ok(());
        }
        let parsed = value.trim().parse::<i64>().unwrap_or(0);
        if preset.settings.set(field, parsed) {
            Ok(())
        } else {
            Err(SensiError::Validation(format!("unknown setting {}", field)))
        }
    }

    /// Add or overwrite a tier. RAM label is normalized to digits.
    pub fn upsert(&mut self, ram: &str, dpi: &str, settings: SensitivitySettings) -> SensiResult<String> {
        let key = ram_key(ram);
        if key.is_empty() || dpi.trim().is_empty() {
            return Err(SensiError::Validation(
                "Please fill in RAM and DPI for the new preset.".to_string(),
            ));
        }
        self.presets
            .insert(key.clone(), SensitivityPreset::new(dpi.trim(), settings));
        Ok(key)
    }

    pub fn remove(&mut self, ram: &str) -> Option<SensitivityPreset> {
        self.presets.remove(ram)
    }

    pub fn sorted_entries(&self) -> Vec<(&String, &SensitivityPreset)> {
        sorted_entries(&self.presets)
    }

    pub fn into_inner(self) -> BTreeMap<String, SensitivityPreset> {
        self.presets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_fallback_key_resolves_without_overlay() {
        let table = PresetTable::default();
        for ram in REQUIRED_RAM_SIZES {
            let resolved = table.resolve(ram).unwrap();
            assert_eq!(resolved.ram, *ram);
        }
    }

    #[test]
    fn overlay_is_keywise() {
        let mut table = PresetTable::default();
        let remote: BTreeMap<String, SensitivityPreset> = serde_json::from_value(serde_json::json!({
            "6": { "dpi": "500", "settings": {
                "general": 1, "redDot": 2, "twoXScope": 3,
                "fourXScope": 4, "sniperScope": 5, "freeLook": 6
            }}
        }))
        .unwrap();
        table.overlay(remote);

        let fallback = fallback_presets();
        for ram in ["2", "3", "4", "8", "12"] {
            let resolved = table.resolve(ram).unwrap();
            assert_eq!(resolved.dpi, fallback[ram].dpi);
            assert_eq!(resolved.settings, fallback[ram].settings);
        }
        let six = table.resolve("6GB").unwrap();
        assert_eq!(six.dpi, "500");
        assert_eq!(six.settings.general, 1);
    }

    #[test]
    fn unknown_ram_is_not_found() {
        let table = PresetTable::default();
        assert!(matches!(table.resolve("16GB"), Err(SensiError::NoPreset(_))));
        assert!(matches!(table.resolve("GB"), Err(SensiError::NoPreset(_))));
    }

    #[test]
    fn replaced_table_still_falls_back() {
        let mut table = PresetTable::default();
        table.replace(BTreeMap::new());
        assert_eq!(table.resolve("12").unwrap().dpi, "400");
    }

    #[test]
    fn missing_setting_is_rejected() {
        let partial = serde_json::json!({
            "dpi": "400",
            "settings": { "general": 1, "redDot": 2 }
        });
        assert!(serde_json::from_value::<SensitivityPreset>(partial).is_err());
    }

    #[test]
    fn sorted_numerically() {
        let table = PresetTable::default();
        let keys: Vec<&str> = table
            .sorted_entries()
            .into_iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(keys, vec!["2", "3", "4", "6", "8", "12"]);
    }

    #[test]
    fn draft_fills_required_and_edits() {
        let mut table = PresetTable::default();
        table.replace(BTreeMap::new());
        let mut draft = PresetDraft::from_table(&table);
        assert_eq!(draft.sorted_entries().len(), REQUIRED_RAM_SIZES.len());

        draft.set_field("4", "redDot", "abc").unwrap();
        draft.set_field("4", "dpi", "520").unwrap();
        let snapshot = draft.clone().into_inner();
        let four = &snapshot["4"];
        assert_eq!(four.settings.red_dot, 0);
        assert_eq!(four.dpi, "520");

        assert!(draft.set_field("4", "bogus", "1").is_err());
        assert!(draft.upsert("", "400", SensitivitySettings::uniform_default()).is_err());
        assert_eq!(
            draft.upsert("16 GB", "380", SensitivitySettings::uniform_default()).unwrap(),
            "16"
        );
        assert!(draft.remove("16").is_some());
    }
}
