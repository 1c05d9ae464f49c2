//! Generative-AI bridge: text and speech calls with retry and backoff.
//!
//! Requests follow the `generateContent` shape:
//! `{ contents: [{ role, parts: [{ text }] }], generationConfig }`.
//! Answers are read from `candidates[0].content.parts[0]`, tolerating absence at
//! every level. HTTP 429/5xx and transport errors are retried with a doubling
//! delay; any other non-success status fails at once.

use std::future::Future;
use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::GenAiError;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash-preview-05-20";
pub const DEFAULT_SPEECH_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;

static SAMPLE_RATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"rate=(\d+)").expect("static regex"));

/// Bounded exponential backoff: attempt `n` (0-based) waits `base * 2^n` before the next try.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or attempts run out.
/// `op` receives the 0-based attempt number. The last error is returned on exhaustion.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, GenAiError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, GenAiError>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_retryable() => {
                tracing::error!("[SENSI GENAI] Non-retriable error: {}", e);
                return Err(e);
            }
            Err(e) if attempt + 1 >= attempts => {
                tracing::error!("[SENSI GENAI] Giving up after {} attempts: {}", attempts, e);
                return Err(e);
            }
            Err(e) => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    "[SENSI GENAI] Attempt {}/{} failed ({}); retrying in {:?}",
                    attempt + 1,
                    attempts,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Endpoint and credential, injected at startup.
#[derive(Debug, Clone)]
pub struct GenAiSettings {
    pub endpoint: String,
    pub api_key: String,
    pub text_model: String,
    pub speech_model: String,
    pub retry: RetryPolicy,
    pub timeout: Duration,
}

impl Default for GenAiSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: String::new(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            speech_model: DEFAULT_SPEECH_MODEL.to_string(),
            retry: RetryPolicy::default(),
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: &'a Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    data: Option<String>,
    mime_type: Option<String>,
}

impl GenerateResponse {
    fn first_part(self) -> Option<ResponsePart> {
        self.candidates?
            .into_iter()
            .next()?
            .content?
            .parts?
            .into_iter()
            .next()
    }
}

/// First candidate's first text part of a raw response, if any.
pub fn extract_text(response: &Value) -> Option<&str> {
    response
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
}

/// Remove ```json / ``` fences some answers are wrapped in.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Parse a fenced or bare JSON answer and require `required_key` to be present and truthy.
pub fn parse_json_answer(text: &str, required_key: &str) -> Result<Value, GenAiError> {
    let parsed: Value = serde_json::from_str(&strip_code_fences(text))
        .map_err(|e| GenAiError::Json(e.to_string()))?;
    let present = match parsed.get(required_key) {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    };
    if present {
        Ok(parsed)
    } else {
        Err(GenAiError::Json(format!("invalid data structure: missing {}", required_key)))
    }
}

/// Sample rate from a mime type such as `audio/L16;codec=pcm;rate=24000`.
pub fn sample_rate_from_mime(mime: &str) -> u32 {
    SAMPLE_RATE
        .captures(mime)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(DEFAULT_SAMPLE_RATE)
}

/// Wrap little-endian signed 16-bit mono PCM into a WAV container.
pub fn pcm16_to_wav(pcm: &[u8], sample_rate: u32) -> Result<Vec<u8>, GenAiError> {
    if pcm.len() % 2 != 0 {
        return Err(GenAiError::Audio(format!(
            "PCM16 payload has odd length {}",
            pcm.len()
        )));
    }
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::with_capacity(44 + pcm.len()));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| GenAiError::Audio(e.to_string()))?;
        for chunk in pcm.chunks_exact(2) {
            writer
                .write_sample(i16::from_le_bytes([chunk[0], chunk[1]]))
                .map_err(|e| GenAiError::Audio(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| GenAiError::Audio(e.to_string()))?;
    }
    Ok(cursor.into_inner())
}

/// Text generation seam; the device check, assistant and chat depend on this.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_text(&self, prompt: &str, generation_config: Value) -> Result<String, GenAiError>;
}

/// HTTP client for the generative endpoint.
#[derive(Clone)]
pub struct GenAiClient {
    settings: GenAiSettings,
    client: reqwest::Client,
}

impl GenAiClient {
    pub fn new(settings: GenAiSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { settings, client }
    }

    fn url(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.settings.endpoint.trim_end_matches('/'),
            model,
            self.settings.api_key
        )
    }

    async fn post_once(&self, url: &str, body: &Value) -> Result<Value, GenAiError> {
        let res = self.client.post(url).json(body).send().await?;
        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            return Err(GenAiError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        serde_json::from_str(&text).map_err(|e| GenAiError::Json(e.to_string()))
    }

    /// Raw `generateContent` call with retry; returns the full JSON response.
    pub async fn generate(&self, prompt: &str, generation_config: Value) -> Result<Value, GenAiError> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: prompt }],
            }],
            generation_config: &generation_config,
            model: None,
        };
        let body = serde_json::to_value(&request)?;
        let url = self.url(&self.settings.text_model);
        with_retry(self.settings.retry, |_| self.post_once(&url, &body)).await
    }

    /// Text-to-speech: returns a WAV file.
    pub async fn synthesize_speech(&self, text: &str) -> Result<Vec<u8>, GenAiError> {
        let prompt = format!("Say in a clear, encouraging voice for a gamer: {}", text);
        let generation_config = json!({ "responseModalities": ["AUDIO"] });
        let request = GenerateRequest {
            contents: vec![Content {
                role: None,
                parts: vec![Part { text: &prompt }],
            }],
            generation_config: &generation_config,
            model: Some(&self.settings.speech_model),
        };
        let body = serde_json::to_value(&request)?;
        let url = self.url(&self.settings.speech_model);
        let raw = with_retry(self.settings.retry, |_| self.post_once(&url, &body)).await?;

        let parsed: GenerateResponse =
            serde_json::from_value(raw).map_err(|e| GenAiError::Json(e.to_string()))?;
        let inline = parsed
            .first_part()
            .and_then(|p| p.inline_data)
            .ok_or(GenAiError::MissingField("inlineData"))?;
        let mime = inline.mime_type.unwrap_or_default();
        let data = inline.data.ok_or(GenAiError::MissingField("inlineData.data"))?;
        if !mime.starts_with("audio/") {
            return Err(GenAiError::Audio(format!("unexpected mime type {:?}", mime)));
        }
        let pcm = BASE64
            .decode(data.as_bytes())
            .map_err(|e| GenAiError::Audio(e.to_string()))?;
        pcm16_to_wav(&pcm, sample_rate_from_mime(&mime))
    }
}

#[async_trait]
impl TextGenerator for GenAiClient {
    async fn generate_text(&self, prompt: &str, generation_config: Value) -> Result<String, GenAiError> {
        let raw = self.generate(prompt, generation_config).await?;
        extract_text(&raw)
            .map(str::to_string)
            .ok_or(GenAiError::MissingField("candidates[0].content.parts[0].text"))
    }
}
