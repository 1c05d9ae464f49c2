//! Sensitivity-pack storefront: catalog, cart, checkout, purchases, support chatbot.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use sensi_core::chatbot;
use sensi_core::{
    has_legendary_access, place_order, Cart, CartSummary, ChatMessage, CheckoutForm, NewProduct,
    Order, Product, ProductPatch, PurchasedItem, SensiError,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api_error::ApiError;
use crate::state::AppState;

fn require_owner(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let key = headers
        .get("x-owner-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if state.config.owner_matches(key) {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCard {
    #[serde(flatten)]
    product: Product,
    original_price: Option<f64>,
}

impl From<Product> for ProductCard {
    fn from(product: Product) -> Self {
        Self {
            original_price: product.original_price(),
            product,
        }
    }
}

pub async fn list_products(State(state): State<Arc<AppState>>) -> Json<Vec<ProductCard>> {
    let catalog = state.catalog.read().await;
    Json(catalog.sorted().into_iter().map(ProductCard::from).collect())
}

#[derive(Deserialize)]
pub struct OwnerLogin {
    key: String,
}

pub async fn owner_login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<OwnerLogin>,
) -> Result<Json<Value>, ApiError> {
    if !state.config.owner_matches(&body.key) {
        return Err(ApiError::Unauthorized);
    }
    Ok(Json(json!({ "authenticated": true })))
}

pub async fn add_product(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<NewProduct>,
) -> Result<(StatusCode, Json<ProductCard>), ApiError> {
    require_owner(&state, &headers)?;
    let product = state.catalog.write().await.add(body)?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

pub async fn update_product(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(patch): Json<ProductPatch>,
) -> Result<Json<ProductCard>, ApiError> {
    require_owner(&state, &headers)?;
    let product = state.catalog.write().await.update(&id, patch)?;
    Ok(Json(product.into()))
}

pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    require_owner(&state, &headers)?;
    state.catalog.write().await.remove(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_cart(
    State(state): State<Arc<AppState>>,
    Path(session): Path<String>,
) -> Result<Json<CartSummary>, ApiError> {
    match state.existing_session(&session)? {
        Some(session) => Ok(Json(session.lock().await.cart.summary())),
        None => Ok(Json(Cart::default().summary())),
    }
}

pub async fn add_to_cart(
    State(state): State<Arc<AppState>>,
    Path((session, product_id)): Path<(String, String)>,
) -> Result<Json<CartSummary>, ApiError> {
    let product = state
        .catalog
        .read()
        .await
        .get(&product_id)
        .cloned()
        .ok_or(ApiError::NotFound("Product not found."))?;
    let session = state.session(&session)?;
    let mut guard = session.lock().await;
    guard.cart.add(&product);
    tracing::info!("[SENSI STORE] {} has been added to a cart", product.name);
    Ok(Json(guard.cart.summary()))
}

pub async fn remove_from_cart(
    State(state): State<Arc<AppState>>,
    Path((session, product_id)): Path<(String, String)>,
) -> Result<Json<CartSummary>, ApiError> {
    let Some(session) = state.existing_session(&session)? else {
        return Ok(Json(Cart::default().summary()));
    };
    let mut guard = session.lock().await;
    guard.cart.remove(&product_id);
    Ok(Json(guard.cart.summary()))
}

pub async fn checkout(
    State(state): State<Arc<AppState>>,
    Path(session): Path<String>,
    Json(form): Json<CheckoutForm>,
) -> Result<Json<Order>, ApiError> {
    let session = state
        .existing_session(&session)?
        .ok_or_else(|| ApiError::Core(SensiError::Validation("Your cart is empty.".to_string())))?;
    let mut guard = session.lock().await;
    let order = place_order(&guard.cart, &form)?;
    guard.purchases.extend(order.items.iter().cloned());
    Ok(Json(order))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchases {
    items: Vec<PurchasedItem>,
    legendary_access: bool,
}

pub async fn purchases(
    State(state): State<Arc<AppState>>,
    Path(session): Path<String>,
) -> Result<Json<Purchases>, ApiError> {
    let Some(session) = state.existing_session(&session)? else {
        return Ok(Json(Purchases {
            items: Vec::new(),
            legendary_access: false,
        }));
    };
    let guard = session.lock().await;
    Ok(Json(Purchases {
        items: guard.purchases.clone(),
        legendary_access: has_legendary_access(&guard.purchases),
    }))
}

#[derive(Deserialize)]
pub struct SupportMessage {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
pub struct SupportReply {
    reply: Option<String>,
    messages: Vec<ChatMessage>,
}

pub async fn support_chat(
    State(state): State<Arc<AppState>>,
    Path(session): Path<String>,
    Json(body): Json<SupportMessage>,
) -> Result<Json<SupportReply>, ApiError> {
    let session = state
        .existing_session(&session)?
        .ok_or(ApiError::Core(SensiError::AccessDenied))?;
    let mut guard = session.lock().await;
    let legendary = has_legendary_access(&guard.purchases);
    let reply = chatbot::support_chat(&mut guard.support, legendary, &body.text)?;
    Ok(Json(SupportReply {
        reply,
        messages: guard.support.messages().to_vec(),
    }))
}
