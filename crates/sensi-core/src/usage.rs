//! Usage analytics: counts how many times settings were generated.
//!
//! The increment is best-effort from the caller's point of view: the step flow
//! logs a failed increment and moves on.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::store::{DocumentPaths, DocumentStore};

/// Usage document body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    #[serde(default)]
    pub total_users: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

/// Sink for "settings generated" events.
#[async_trait]
pub trait UsageRecorder: Send + Sync {
    async fn record_usage(&self) -> Result<i64, StoreError>;
}

/// Recorder backed by the usage document.
#[derive(Clone)]
pub struct UsageAnalytics {
    store: DocumentStore,
    path: String,
}

impl UsageAnalytics {
    pub fn new(store: DocumentStore, paths: &DocumentPaths) -> Self {
        Self {
            store,
            path: paths.usage(),
        }
    }

    /// Current stats; a missing document reads as zero.
    pub fn stats(&self) -> Result<UsageStats, StoreError> {
        Ok(self.store.get_as::<UsageStats>(&self.path)?.unwrap_or_default())
    }
}

#[async_trait]
impl UsageRecorder for UsageAnalytics {
    async fn record_usage(&self) -> Result<i64, StoreError> {
        let total = self.store.increment(&self.path, "totalUsers", "lastUpdated")?;
        tracing::debug!("[SENSI USAGE] totalUsers = {}", total);
        Ok(total)
    }
}
