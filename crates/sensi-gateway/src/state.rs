//! Shared gateway state and per-session state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use sensi_core::assistant::CHAT_GREETING;
use sensi_core::chatbot::SUPPORT_GREETING;
use sensi_core::{
    AuthGate, Cart, Catalog, ContentRepository, Conversation, DeviceValidator, DocumentPaths,
    DocumentStore, GenAiClient, PresetTable, PurchasedItem, SensiConfig, SensiWizard,
    TextGenerator, UsageAnalytics,
};
use tokio::sync::{Mutex, RwLock};

use crate::api_error::ApiError;

/// Everything one browser session owns.
pub struct Session {
    pub wizard: SensiWizard,
    pub chat: Conversation,
    pub cart: Cart,
    pub purchases: Vec<PurchasedItem>,
    pub support: Conversation,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            wizard: SensiWizard::new(),
            chat: Conversation::with_greeting(CHAT_GREETING),
            cart: Cart::default(),
            purchases: Vec::new(),
            support: Conversation::with_greeting(SUPPORT_GREETING),
        }
    }
}

const SESSION_SWEEP_SECS: u64 = 60;

struct SessionSlot {
    session: Arc<Mutex<Session>>,
    last_seen: Instant,
}

pub struct AppState {
    pub config: SensiConfig,
    pub auth: AuthGate,
    pub content: ContentRepository,
    pub analytics: UsageAnalytics,
    pub generator: Arc<dyn TextGenerator>,
    pub validator: Arc<dyn DeviceValidator>,
    pub speech: GenAiClient,
    pub presets: RwLock<PresetTable>,
    pub characters: RwLock<Vec<String>>,
    pub catalog: RwLock<Catalog>,
    sessions: DashMap<String, SessionSlot>,
}

impl AppState {
    pub fn new(
        config: SensiConfig,
        store: DocumentStore,
        generator: Arc<dyn TextGenerator>,
        validator: Arc<dyn DeviceValidator>,
    ) -> Self {
        let paths = DocumentPaths::new(config.app_id.clone());
        let speech = GenAiClient::new(config.genai_settings());
        Self {
            auth: AuthGate::new(),
            content: ContentRepository::new(store.clone(), paths.clone()),
            analytics: UsageAnalytics::new(store, &paths),
            generator,
            validator,
            speech,
            presets: RwLock::new(PresetTable::default()),
            characters: RwLock::new(sensi_core::content::default_characters()),
            catalog: RwLock::new(Catalog::default()),
            sessions: DashMap::new(),
            config,
        }
    }

    /// Session handle, created on first use. Ids are short client-chosen tokens.
    pub fn session(&self, id: &str) -> Result<Arc<Mutex<Session>>, ApiError> {
        check_session_id(id)?;
        let mut slot = self
            .sessions
            .entry(id.to_string())
            .or_insert_with(|| SessionSlot {
                session: Arc::new(Mutex::new(Session::default())),
                last_seen: Instant::now(),
            });
        slot.last_seen = Instant::now();
        Ok(slot.session.clone())
    }

    /// Session handle if one exists. Read-only routes use this so lookups never allocate.
    pub fn existing_session(&self, id: &str) -> Result<Option<Arc<Mutex<Session>>>, ApiError> {
        check_session_id(id)?;
        Ok(self.sessions.get_mut(id).map(|mut slot| {
            slot.last_seen = Instant::now();
            slot.session.clone()
        }))
    }

    /// Drops sessions idle for at least `max_idle` that no request is holding.
    pub fn sweep_idle(&self, max_idle: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, slot| {
            slot.last_seen.elapsed() < max_idle || Arc::strong_count(&slot.session) > 1
        });
        before.saturating_sub(self.sessions.len())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

fn check_session_id(id: &str) -> Result<(), ApiError> {
    let valid = !id.is_empty()
        && id.len() <= 64
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ApiError::BadRequest("Invalid session id.".to_string()))
    }
}

/// Periodically evicts idle sessions.
pub async fn sweep_sessions(state: Arc<AppState>) {
    let max_idle = state.config.session_idle();
    let mut interval = tokio::time::interval(Duration::from_secs(SESSION_SWEEP_SECS));
    loop {
        interval.tick().await;
        let dropped = state.sweep_idle(max_idle);
        if dropped > 0 {
            tracing::info!(
                "[SENSI SYSTEM] Dropped {} idle sessions, {} active",
                dropped,
                state.session_count()
            );
        }
    }
}

/// Waits for sign-in, then overlays remote presets and loads the character list.
/// Either failure leaves the built-in data in place.
pub async fn load_content(state: Arc<AppState>) {
    state.auth.ready().await;

    let mut table = PresetTable::default();
    if let Err(e) = state.content.load_presets(&mut table) {
        tracing::error!("[SENSI CONTENT] Error fetching presets: {}", e);
    }
    *state.presets.write().await = table;

    match state.content.load_characters() {
        Ok(characters) => *state.characters.write().await = characters,
        Err(e) => tracing::error!("[SENSI CONTENT] Error fetching game data: {}", e),
    }
    tracing::info!("[SENSI CONTENT] Content loaded");
}
