//! Identity gate: signs the service in once and exposes a ready flag.
//!
//! A configured custom token is decoded for its subject; a malformed token
//! falls back to anonymous sign-in. Content loading waits on [`AuthGate::ready`].

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignInMethod {
    Anonymous,
    CustomToken,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub method: SignInMethod,
}

#[derive(Deserialize)]
struct TokenClaims {
    #[serde(alias = "sub")]
    uid: String,
}

/// Subject of a `header.payload.signature` token, if it decodes.
fn token_subject(token: &str) -> Option<String> {
    let mut segments = token.split('.');
    let (_, payload, _) = (segments.next()?, segments.next()?, segments.next()?);
    if segments.next().is_some() {
        return None;
    }
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: TokenClaims = serde_json::from_slice(&bytes).ok()?;
    (!claims.uid.is_empty()).then_some(claims.uid)
}

pub struct AuthGate {
    ready_tx: watch::Sender<bool>,
    identity: std::sync::RwLock<Option<Identity>>,
}

impl Default for AuthGate {
    fn default() -> Self {
        let (ready_tx, _) = watch::channel(false);
        Self {
            ready_tx,
            identity: std::sync::RwLock::new(None),
        }
    }
}

impl AuthGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sign in with `custom_token` when given, else anonymously; flips the ready flag.
    pub fn sign_in(&self, custom_token: Option<&str>) -> Identity {
        let identity = match custom_token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(token) => match token_subject(token) {
                Some(uid) => Identity {
                    uid,
                    method: SignInMethod::CustomToken,
                },
                None => {
                    tracing::warn!("[SENSI AUTH] Custom token rejected; signing in anonymously");
                    anonymous()
                }
            },
            None => anonymous(),
        };
        tracing::info!("[SENSI AUTH] Signed in as {} ({:?})", identity.uid, identity.method);
        if let Ok(mut slot) = self.identity.write() {
            *slot = Some(identity.clone());
        }
        self.ready_tx.send_replace(true);
        identity
    }

    pub fn is_ready(&self) -> bool {
        *self.ready_tx.borrow()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.identity.read().ok().and_then(|slot| slot.clone())
    }

    /// Resolves once sign-in has completed.
    pub async fn ready(&self) {
        let mut rx = self.ready_tx.subscribe();
        let _ = rx.wait_for(|ready| *ready).await;
    }
}

fn anonymous() -> Identity {
    Identity {
        uid: uuid::Uuid::new_v4().to_string(),
        method: SignInMethod::Anonymous,
    }
}
