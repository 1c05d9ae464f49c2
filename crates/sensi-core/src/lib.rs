//! Loading PC Free Sensi core library.
//! Sensitivity presets, the generator step flow, the sensitivity-pack storefront
//! and the generative-AI bridge used by the gateway.

pub mod assistant;
pub mod cart;
pub mod catalog;
pub mod chatbot;
pub mod checkout;
pub mod config;
pub mod content;
pub mod device;
pub mod error;
pub mod genai;
pub mod identity;
pub mod presets;
pub mod store;
pub mod usage;
pub mod wizard;

pub use assistant::{AssistantContext, ChatMessage, ChatSettings, Conversation, Feature, Sender};
pub use cart::{Cart, CartItem, CartSummary};
pub use catalog::{Catalog, NewProduct, Platform, Product, ProductPatch, Tier};
pub use checkout::{has_legendary_access, place_order, CheckoutForm, Order, PaymentMethod, PurchasedItem};
pub use crate::config::SensiConfig;
pub use content::{ContentRepository, GameData};
pub use device::{AiDeviceValidator, DeviceCheck, DeviceValidator};
pub use error::{GenAiError, SensiError, SensiResult, StoreError};
pub use genai::{with_retry, GenAiClient, GenAiSettings, RetryPolicy, TextGenerator};
pub use identity::{AuthGate, Identity, SignInMethod};
pub use presets::{PresetDraft, PresetTable, ResolvedPreset, SensitivityPreset, SensitivitySettings};
pub use store::{DocumentPaths, DocumentStore};
pub use usage::{UsageAnalytics, UsageRecorder, UsageStats};
pub use wizard::{GeneratedSettings, SensiWizard, Step, WizardView};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
