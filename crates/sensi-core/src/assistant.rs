//! AI assistant panel and the sensitivity chat box.
//!
//! Each assistant feature is a prompt plus the key its JSON answer must carry.
//! The chat keeps an append-only, in-memory conversation per session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{GenAiError, SensiError, SensiResult};
use crate::genai::{parse_json_answer, TextGenerator};
use crate::presets::SensitivitySettings;
use crate::wizard::GeneratedSettings;

pub const CHAT_GREETING: &str = "Ask me about Free Fire, sensitivity, or mobile optimization!";
pub const CHAT_NO_ANSWER: &str = "I couldn't process that. Please ask a relevant question.";
pub const CHAT_UNAVAILABLE: &str = "Sorry, I'm having trouble connecting. Please try again.";
pub const PLAYSTYLES: &[&str] = &["Rusher", "Sniper", "Support"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    Loadout,
    Training,
    Optimization,
    Strategy,
    Synergy,
}

impl Feature {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "loadout" => Some(Feature::Loadout),
            "training" => Some(Feature::Training),
            "optimization" => Some(Feature::Optimization),
            "strategy" => Some(Feature::Strategy),
            "synergy" => Some(Feature::Synergy),
            _ => None,
        }
    }

    /// Key whose absence marks the answer as malformed.
    pub fn required_key(self) -> &'static str {
        match self {
            Feature::Loadout => "loadoutName",
            Feature::Training => "day1",
            Feature::Optimization => "performanceTips",
            Feature::Strategy => "earlyGame",
            Feature::Synergy => "combinationName",
        }
    }
}

/// Player context fed into the feature prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantContext {
    pub mobile_model: String,
    pub selected_ram: String,
    #[serde(default = "default_playstyle")]
    pub playstyle: String,
    #[serde(default)]
    pub character: Option<String>,
    #[serde(default)]
    pub generated: Option<GeneratedContext>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContext {
    pub device_specs: String,
    pub fixed_sensitivity: SensitivitySettings,
}

impl From<&GeneratedSettings> for GeneratedContext {
    fn from(g: &GeneratedSettings) -> Self {
        Self {
            device_specs: g.device_specs.clone(),
            fixed_sensitivity: g.fixed_sensitivity,
        }
    }
}

fn default_playstyle() -> String {
    "Rusher".to_string()
}

/// Keep the chosen character if it is still listed, else the first listed one.
pub fn pick_character(current: &str, popular: &[String]) -> String {
    match popular.first() {
        Some(first) if !popular.iter().any(|c| c == current) => first.clone(),
        _ => current.to_string(),
    }
}

pub fn feature_prompt(feature: Feature, ctx: &AssistantContext) -> SensiResult<String> {
    let needs_generated = || {
        ctx.generated.as_ref().ok_or_else(|| {
            SensiError::Validation("Generate your settings before asking for this.".to_string())
        })
    };
    let prompt = match feature {
        Feature::Loadout => format!(
            "You are a Free Fire expert. A player is using a {} with {}. Their preferred playstyle is \"{}\". Suggest an optimal primary and secondary weapon loadout. Explain why this combination is effective. The output must be a valid JSON object with keys \"loadoutName\", \"primaryWeapon\", \"secondaryWeapon\", and \"rationale\".",
            ctx.mobile_model, ctx.selected_ram, ctx.playstyle
        ),
        Feature::Training => format!(
            "You are a professional Free Fire e-sports coach. Create a 3-day aim training plan for a player using a {} with {}. The plan should be concise and focus on improving headshot accuracy and reaction time. The output must be a valid JSON object with keys \"day1\", \"day2\", and \"day3\", where each key's value is a single string describing the training for that day.",
            ctx.mobile_model, ctx.selected_ram
        ),
        Feature::Optimization => format!(
            "You are a mobile gaming optimization expert. A user has a \"{}\" with these specs: \"{}\". Generate a concise, actionable guide to optimize their phone for Free Fire. The output must be a valid JSON object with three keys: \"performanceTips\", \"displayTips\", and \"networkTips\".",
            ctx.mobile_model,
            needs_generated()?.device_specs
        ),
        Feature::Strategy => {
            let generated = needs_generated()?;
            format!(
                "You are a professional Free Fire e-sports coach. A player is using a device with these specs: \"{}\". Their sensitivity settings are: General: {}, Red Dot: {}. Generate a concise, actionable strategy guide. The output must be a valid JSON object with three keys: \"earlyGame\", \"midGame\", and \"lateGame\".",
                generated.device_specs,
                generated.fixed_sensitivity.general,
                generated.fixed_sensitivity.red_dot
            )
        }
        Feature::Synergy => format!(
            "You are a Free Fire expert. A player's main character is {} and their playstyle is {}. Recommend the best combination of 3 passive skills and a pet to create the perfect synergy. Explain the strategy behind this combination. The output must be a valid JSON object with keys \"combinationName\", \"passiveSkills\" (an array of 3 strings), \"pet\", and \"synergyRationale\".",
            ctx.character.as_deref().unwrap_or("Alok"),
            ctx.playstyle
        ),
    };
    Ok(prompt)
}

/// Run one assistant feature and return its validated JSON answer.
pub async fn run_feature(
    generator: &dyn TextGenerator,
    feature: Feature,
    ctx: &AssistantContext,
) -> SensiResult<Value> {
    let prompt = feature_prompt(feature, ctx)?;
    let text = generator
        .generate_text(
            &prompt,
            json!({ "responseMimeType": "application/json", "temperature": 0.5 }),
        )
        .await?;
    parse_json_answer(&text, feature.required_key()).map_err(|e| {
        tracing::error!("[SENSI ASSISTANT] Error fetching {:?}: {}", feature, e);
        SensiError::GenAi(e)
    })
}

/// Sentence the speech button reads out for a feature answer.
pub fn speech_text(feature: Feature, answer: &Value) -> String {
    let s = |k: &str| answer.get(k).and_then(Value::as_str).unwrap_or_default().to_string();
    match feature {
        Feature::Loadout => format!(
            "Loadout: {}. Primary: {}. Secondary: {}. Rationale: {}",
            s("loadoutName"),
            s("primaryWeapon"),
            s("secondaryWeapon"),
            s("rationale")
        ),
        Feature::Training => format!(
            "Your 3-Day Aim Training Plan. Day 1: {}. Day 2: {}. Day 3: {}.",
            s("day1"),
            s("day2"),
            s("day3")
        ),
        Feature::Optimization => format!(
            "Device Optimization Tips. Performance: {}. Display: {}. Network: {}.",
            s("performanceTips"),
            s("displayTips"),
            s("networkTips")
        ),
        Feature::Strategy => format!(
            "AI Game Strategy. Early Game: {}. Mid Game: {}. Late Game: {}.",
            s("earlyGame"),
            s("midGame"),
            s("lateGame")
        ),
        Feature::Synergy => {
            let skills: Vec<&str> = answer
                .get("passiveSkills")
                .and_then(Value::as_array)
                .map(|a| a.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();
            format!(
                "Synergy: {}. Skills: {}. Pet: {}. Rationale: {}",
                s("combinationName"),
                skills.join(", "),
                s("pet"),
                s("synergyRationale")
            )
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Ai,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sender,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Append-only conversation.
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn with_greeting(greeting: &str) -> Self {
        Self {
            messages: vec![ChatMessage::new(Sender::Ai, greeting)],
        }
    }

    pub fn push(&mut self, sender: Sender, text: impl Into<String>) -> &ChatMessage {
        self.messages.push(ChatMessage::new(sender, text));
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }
}

/// Settings quoted into the chat prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSettings {
    #[serde(default)]
    pub general: Option<i64>,
    #[serde(default)]
    pub red_dot: Option<i64>,
    #[serde(default)]
    pub dpi: Option<String>,
}

fn opt<T: ToString>(v: &Option<T>) -> String {
    v.as_ref().map(|x| x.to_string()).unwrap_or_else(|| "undefined".to_string())
}

fn chat_prompt(settings: &ChatSettings, question: &str) -> String {
    format!(
        r#"You are a specialized AI assistant for the "Loading PC Free Sensi" application. Your purpose is to answer questions ONLY about the following topics: general Free Fire gameplay, Free Fire sensitivity settings, and mobile optimization for Android gaming. The user has these sensitivity settings: General: {}, Red Dot: {}, DPI: {}.
Analyze the user's question: "{}"
1. First, determine if the question is related to Free Fire gameplay, sensitivity settings (DPI, scopes, recoil), or Android mobile optimization for gaming.
2. If the question IS about one of these topics, provide a helpful and concise answer.
3. If the question is NOT about these topics (e.g., it's about other games, personal questions, or anything unrelated), you MUST respond with the exact phrase: "ask questions related to free fire sensitivity" and nothing else."#,
        opt(&settings.general),
        opt(&settings.red_dot),
        opt(&settings.dpi),
        question
    )
}

/// Send one question; the user line and the answer (or a fixed fallback) are appended.
/// Returns `None` for blank input, which appends nothing.
pub async fn send_chat(
    generator: &dyn TextGenerator,
    conversation: &mut Conversation,
    settings: &ChatSettings,
    input: &str,
) -> Option<ChatMessage> {
    let question = input.trim();
    if question.is_empty() {
        return None;
    }
    conversation.push(Sender::User, question);

    let answer = match generator
        .generate_text(&chat_prompt(settings, question), json!({ "temperature": 0.2 }))
        .await
    {
        Ok(text) if !text.trim().is_empty() => text.replace('*', ""),
        Ok(_) | Err(GenAiError::MissingField(_)) => CHAT_NO_ANSWER.to_string(),
        Err(e) => {
            tracing::error!("[SENSI CHAT] Chat API error: {}", e);
            CHAT_UNAVAILABLE.to_string()
        }
    };
    Some(conversation.push(Sender::Ai, answer).clone())
}
