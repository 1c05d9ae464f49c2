//! Device check: model-name suggestions and AI-backed plausibility validation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::GenAiError;
use crate::genai::{strip_code_fences, TextGenerator};

/// Common phones offered as type-ahead suggestions.
pub const MOBILE_PHONE_MODELS: &[&str] = &[
    "iPhone 15 Pro Max",
    "iPhone 15",
    "iPhone 14 Pro",
    "iPhone 13",
    "iPhone SE",
    "Samsung Galaxy S24 Ultra",
    "Samsung Galaxy S23 FE",
    "Samsung Galaxy Z Fold 5",
    "Samsung Galaxy A54",
    "Google Pixel 8 Pro",
    "Google Pixel 7a",
    "Google Pixel Fold",
    "OnePlus 12",
    "OnePlus Open",
    "OnePlus Nord 3",
    "Xiaomi 14 Ultra",
    "Xiaomi 13T Pro",
    "Redmi Note 13 Pro+",
    "Poco X6 Pro",
    "Asus ROG Phone 8 Pro",
    "Asus Zenfone 10",
    "Realme GT 5 Pro",
    "Realme 12 Pro+",
    "Oppo Find X7 Ultra",
    "Vivo X100 Pro",
    "Nothing Phone (2)",
    "Motorola Razr+",
];

/// Case-insensitive substring matches once more than one character is typed.
pub fn suggestions(typed: &str) -> Vec<&'static str> {
    if typed.chars().count() <= 1 {
        return Vec::new();
    }
    let needle = typed.to_lowercase();
    MOBILE_PHONE_MODELS
        .iter()
        .copied()
        .filter(|phone| phone.to_lowercase().contains(&needle))
        .collect()
}

/// Validator verdict for a typed model name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCheck {
    #[serde(default)]
    pub is_model_valid: bool,
    #[serde(default)]
    pub model_name: String,
    #[serde(default)]
    pub specs_summary: String,
    #[serde(default)]
    pub ram_options: Vec<String>,
}

impl DeviceCheck {
    /// Plausible and offers at least one RAM option.
    pub fn is_usable(&self) -> bool {
        self.is_model_valid && !self.ram_options.is_empty()
    }
}

/// Decides whether a device name is plausible and which RAM options it ships with.
#[async_trait]
pub trait DeviceValidator: Send + Sync {
    async fn check_device(&self, model: &str) -> Result<DeviceCheck, GenAiError>;
}

fn device_prompt(model: &str) -> String {
    format!(
        r#"You are a mobile device expert. Analyze the following text: "{model}".
1. Determine if this is a known or plausible mobile phone model name.
2. If it is, provide a brief summary of its key specifications (like Processor, Display type).
3. List its common RAM configurations (e.g., 4GB, 6GB, 8GB). If RAM is fixed (like iPhones), list that single option.
Respond with a single JSON object with the following structure:
{{
  "isModelValid": boolean,
  "modelName": "string",
  "specsSummary": "string",
  "ramOptions": ["string"]
}}
If the model is not valid, set "isModelValid" to false and the other fields to empty strings or empty arrays."#
    )
}

/// Validator that asks the generative model.
pub struct AiDeviceValidator<G> {
    generator: G,
}

impl<G: TextGenerator> AiDeviceValidator<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl<G: TextGenerator> DeviceValidator for AiDeviceValidator<G> {
    async fn check_device(&self, model: &str) -> Result<DeviceCheck, GenAiError> {
        let text = self
            .generator
            .generate_text(
                &device_prompt(model),
                json!({ "responseMimeType": "application/json", "temperature": 0.0 }),
            )
            .await?;
        serde_json::from_str(&strip_code_fences(&text)).map_err(|e| GenAiError::Json(e.to_string()))
    }
}
