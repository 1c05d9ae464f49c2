//! Loading PC Free Sensi gateway.
//! JSON API for the sensitivity generator, owner panel and storefront, plus the static bundle.

mod admin_routes;
mod api_error;
mod sensi_routes;
mod state;
mod store_routes;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::Request,
    middleware::Next,
    response::Response,
    routing::{delete, get, patch, post},
    Router,
};
use sensi_core::{AiDeviceValidator, DocumentStore, GenAiClient, SensiConfig};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tower_http::services::{ServeDir, ServeFile};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = SensiConfig::load()?;
    if config.genai.api_key.is_empty() {
        tracing::warn!("[SENSI SYSTEM] genai.api_key is not set; AI features will fail");
    }
    let store = DocumentStore::open(Some(&config.data_path))?;
    let client = GenAiClient::new(config.genai_settings());
    let state = Arc::new(AppState::new(
        config,
        store.clone(),
        Arc::new(client.clone()),
        Arc::new(AiDeviceValidator::new(client)),
    ));

    tokio::spawn(state::load_content(state.clone()));
    tokio::spawn(state::sweep_sessions(state.clone()));
    state.auth.sign_in(state.config.auth_token.as_deref());

    let addr = state.config.bind_addr();
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("[SENSI SYSTEM] Sensi v{} listening on {}", sensi_core::version(), addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    store.flush()?;
    tracing::info!("[SENSI SYSTEM] Document store flushed; bye");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("[SENSI SYSTEM] Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("[SENSI SYSTEM] Shutdown requested");
}

fn build_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();
    let index = Path::new(&static_dir).join("index.html");

    Router::new()
        .route("/health", get(health))
        .route("/api/v1/presets", get(sensi_routes::list_presets))
        .route("/api/v1/presets/resolve", post(sensi_routes::resolve_preset))
        .route("/api/v1/suggestions", get(sensi_routes::suggestions))
        .route("/api/v1/sensi/:session", get(sensi_routes::wizard_view))
        .route("/api/v1/sensi/:session/device", post(sensi_routes::submit_device))
        .route("/api/v1/sensi/:session/ram", post(sensi_routes::select_ram))
        .route("/api/v1/sensi/:session/generate", post(sensi_routes::generate))
        .route("/api/v1/sensi/:session/unlock", post(sensi_routes::unlock))
        .route("/api/v1/sensi/:session/reset", post(sensi_routes::reset))
        .route("/api/v1/assistant/:feature", post(sensi_routes::run_assistant))
        .route("/api/v1/chat/:session", post(sensi_routes::chat))
        .route("/api/v1/speech", post(sensi_routes::speech))
        .route("/api/v1/admin/login", post(admin_routes::login))
        .route(
            "/api/v1/admin/presets",
            get(admin_routes::get_presets).put(admin_routes::put_presets),
        )
        .route(
            "/api/v1/admin/presets/:ram",
            patch(admin_routes::edit_preset_field).delete(admin_routes::delete_preset),
        )
        .route(
            "/api/v1/admin/characters",
            get(admin_routes::get_characters)
                .put(admin_routes::put_characters)
                .post(admin_routes::add_character_route),
        )
        .route(
            "/api/v1/admin/characters/:name",
            delete(admin_routes::remove_character_route),
        )
        .route("/api/v1/admin/analytics", get(admin_routes::analytics))
        .route(
            "/api/v1/store/products",
            get(store_routes::list_products).post(store_routes::add_product),
        )
        .route(
            "/api/v1/store/products/:id",
            axum::routing::put(store_routes::update_product).delete(store_routes::delete_product),
        )
        .route("/api/v1/store/owner/login", post(store_routes::owner_login))
        .route("/api/v1/store/cart/:session", get(store_routes::get_cart))
        .route(
            "/api/v1/store/cart/:session/:product_id",
            post(store_routes::add_to_cart).delete(store_routes::remove_from_cart),
        )
        .route("/api/v1/store/checkout/:session", post(store_routes::checkout))
        .route("/api/v1/store/purchases/:session", get(store_routes::purchases))
        .route("/api/v1/store/chatbot/:session", post(store_routes::support_chat))
        .fallback_service(ServeDir::new(&static_dir).fallback(ServeFile::new(index)))
        .with_state(state)
        .layer(axum::middleware::from_fn(log_requests))
}

async fn log_requests(
    connect: Option<ConnectInfo<SocketAddr>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    let peer = connect
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());
    tracing::info!(
        "[SENSI SYSTEM] {} {} {} -> {} in {:?}",
        peer,
        method,
        path,
        response.status().as_u16(),
        started.elapsed()
    );
    response
}

async fn health() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use sensi_core::{GenAiError, TextGenerator};
    use serde_json::{json, Value};
    use std::path::Path as FsPath;
    use std::time::Duration;
    use tower::ServiceExt;

    /// Answers by prompt kind: device checks, loadouts, otherwise chat text.
    struct FakeGenerator;

    #[async_trait::async_trait]
    impl TextGenerator for FakeGenerator {
        async fn generate_text(&self, prompt: &str, _config: Value) -> Result<String, GenAiError> {
            let answer = if prompt.contains("mobile device expert") {
                json!({
                    "isModelValid": true,
                    "modelName": "Poco X6 Pro",
                    "specsSummary": "Dimensity 8300, AMOLED",
                    "ramOptions": ["8GB", "12GB"]
                })
                .to_string()
            } else if prompt.contains("loadoutName") {
                json!({
                    "loadoutName": "Close Quarters",
                    "primaryWeapon": "MP40",
                    "secondaryWeapon": "M1887",
                    "rationale": "fast"
                })
                .to_string()
            } else {
                "Keep **general** near 180.".to_string()
            };
            Ok(answer)
        }
    }

    fn test_state(dir: &FsPath) -> Arc<AppState> {
        test_state_with_endpoint(dir, None)
    }

    fn test_state_with_endpoint(dir: &FsPath, endpoint: Option<String>) -> Arc<AppState> {
        let mut config = SensiConfig::load_from(FsPath::new("/nonexistent/sensi.toml")).unwrap();
        if let Some(endpoint) = endpoint {
            config.genai.endpoint = endpoint;
            config.genai.base_delay_ms = 1;
        }
        config.static_dir = dir.join("static").to_string_lossy().into_owned();
        config.admin.id = "owner".into();
        config.admin.key = "secret".into();
        config.owner.key = "shop".into();
        config.channel_url = Some("https://youtube.com/@loadingsensi".into());
        let store = DocumentStore::open(Some(dir.join("db"))).unwrap();
        let state = Arc::new(AppState::new(
            config,
            store,
            Arc::new(FakeGenerator),
            Arc::new(AiDeviceValidator::new(FakeGenerator)),
        ));
        state.auth.sign_in(None);
        state
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        call_with(app, method, uri, body, &[]).await
    }

    async fn call_with(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        let req = match body {
            Some(b) => builder
                .header("content-type", "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn health_ok() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(dir.path()));
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn presets_resolve_from_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(dir.path()));
        let (status, body) = call(&app, "GET", "/api/v1/presets", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 6);
        assert_eq!(body[0]["ram"], "2");

        let (status, body) =
            call(&app, "POST", "/api/v1/presets/resolve", Some(json!({"ram": "6GB"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["dpi"], "430");
        assert_eq!(body["settings"]["sniperScope"], 65);

        let (status, body) =
            call(&app, "POST", "/api/v1/presets/resolve", Some(json!({"ram": "16GB"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("16GB"));
    }

    #[tokio::test]
    async fn wizard_flow_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let app = build_router(state.clone());

        let (status, body) =
            call(&app, "POST", "/api/v1/sensi/s1/device", Some(json!({"model": "  "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Please enter your mobile brand and model.");

        let (status, body) =
            call(&app, "POST", "/api/v1/sensi/s1/device", Some(json!({"model": "Poco X6 Pro"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["step"], "ram_selection");
        assert_eq!(body["selectedRam"], "8GB");

        let (status, _) =
            call(&app, "POST", "/api/v1/sensi/s1/ram", Some(json!({"ram": "12GB"}))).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(&app, "POST", "/api/v1/sensi/s1/generate", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["step"], "results");
        assert_eq!(body["requiresUnlock"], true);
        assert!(body["generatedSettings"].is_null());

        let (status, body) = call(&app, "POST", "/api/v1/sensi/s1/unlock", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["generatedSettings"]["dpi"], "400");
        assert_eq!(body["channelUrl"], "https://youtube.com/@loadingsensi");
        assert_eq!(state.analytics.stats().unwrap().total_users, 1);

        let (status, _) = call(&app, "POST", "/api/v1/sensi/s1/ram", Some(json!({"ram": "8GB"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, body) = call(&app, "POST", "/api/v1/sensi/s1/reset", None).await;
        assert_eq!(body["step"], "input");
        assert_eq!(body["mobileModel"], "");
    }

    #[tokio::test]
    async fn assistant_and_chat_wait_for_unlock() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(dir.path()));
        let loadout = json!({"session": "s2", "playstyle": "Rusher"});

        let (status, _) = call(&app, "POST", "/api/v1/assistant/loadout", Some(loadout.clone())).await;
        assert_eq!(status, StatusCode::CONFLICT);

        call(&app, "POST", "/api/v1/sensi/s2/device", Some(json!({"model": "Poco X6 Pro"}))).await;
        let (status, _) = call(&app, "POST", "/api/v1/assistant/loadout", Some(loadout.clone())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        let (status, _) =
            call(&app, "POST", "/api/v1/chat/s2", Some(json!({"text": "best dpi?"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);

        call(&app, "POST", "/api/v1/sensi/s2/generate", None).await;
        let (status, _) = call(&app, "POST", "/api/v1/assistant/loadout", Some(loadout.clone())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        let (status, body) =
            call(&app, "POST", "/api/v1/chat/s2", Some(json!({"text": "best dpi?"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body.get("reply").is_none());

        call(&app, "POST", "/api/v1/sensi/s2/unlock", None).await;
        let (status, body) = call(&app, "POST", "/api/v1/assistant/loadout", Some(loadout)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["answer"]["primaryWeapon"], "MP40");
        assert!(body["speech"].as_str().unwrap().starts_with("Loadout: Close Quarters."));

        let (status, _) = call(
            &app,
            "POST",
            "/api/v1/assistant/emotes",
            Some(json!({"session": "s2"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) =
            call(&app, "POST", "/api/v1/chat/s2", Some(json!({"text": "best dpi?"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"]["text"], "Keep general near 180.");
        assert_eq!(body["messages"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn reads_do_not_create_sessions_and_idle_ones_expire() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let app = build_router(state.clone());

        for i in 0..20 {
            let (status, cart) = call(&app, "GET", &format!("/api/v1/store/cart/junk-{}", i), None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(cart["itemCount"], 0);
        }
        let (_, view) = call(&app, "GET", "/api/v1/sensi/ghost", None).await;
        assert_eq!(view["step"], "input");
        let (_, bought) = call(&app, "GET", "/api/v1/store/purchases/ghost", None).await;
        assert_eq!(bought["legendaryAccess"], false);
        call(&app, "DELETE", "/api/v1/store/cart/ghost/android-gold", None).await;
        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/store/checkout/ghost",
            Some(json!({"paymentMethod": "netbanking"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Your cart is empty.");
        assert_eq!(state.session_count(), 0);

        call(&app, "POST", "/api/v1/store/cart/buyer/android-gold", None).await;
        assert_eq!(state.session_count(), 1);
        assert_eq!(state.sweep_idle(Duration::from_secs(3600)), 0);
        assert_eq!(state.sweep_idle(Duration::ZERO), 1);
        assert_eq!(state.session_count(), 0);
    }

    #[tokio::test]
    async fn admin_routes_need_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let app = build_router(state.clone());
        let creds = [("x-admin-id", "owner"), ("x-admin-key", "secret")];

        let (status, _) = call(&app, "GET", "/api/v1/admin/presets", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = call(
            &app,
            "POST",
            "/api/v1/admin/login",
            Some(json!({"adminId": "owner", "adminKey": "nope"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = call_with(
            &app,
            "PATCH",
            "/api/v1/admin/presets/6",
            Some(json!({"field": "general", "value": "abc"})),
            &creds,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let six = body["presets"]
            .as_array()
            .unwrap()
            .iter()
            .find(|row| row["ram"] == "6")
            .unwrap();
        assert_eq!(six["settings"]["general"], 0);
        assert_eq!(state.presets.read().await.resolve("6").unwrap().settings.general, 0);

        let (status, body) = call_with(
            &app,
            "POST",
            "/api/v1/admin/characters",
            Some(json!({"name": "  Kelly "})),
            &creds,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["characters"].as_array().unwrap().last().unwrap(), "Kelly");

        let (status, body) = call_with(&app, "GET", "/api/v1/admin/analytics", None, &creds).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["usage"]["totalUsers"], 0);
        assert_eq!(body["contentReady"], true);
        assert_eq!(body["signedInAs"]["method"], "anonymous");
    }

    #[tokio::test]
    async fn storefront_checkout_unlocks_chatbot() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(dir.path()));

        let (_, body) = call(&app, "GET", "/api/v1/store/products", None).await;
        assert_eq!(body[0]["id"], "android-silver");
        assert!(body[1]["originalPrice"].as_f64().is_some());

        call(&app, "POST", "/api/v1/store/cart/buyer/android-gold", None).await;
        let (_, cart) = call(&app, "POST", "/api/v1/store/cart/buyer/android-gold", None).await;
        assert_eq!(cart["itemCount"], 2);
        assert_eq!(cart["items"].as_array().unwrap().len(), 1);

        let (status, _) =
            call(&app, "POST", "/api/v1/store/chatbot/buyer", Some(json!({"text": "pc help"}))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        call(&app, "POST", "/api/v1/store/cart/buyer/pc-legendary", None).await;
        let (status, order) = call(
            &app,
            "POST",
            "/api/v1/store/checkout/buyer",
            Some(json!({
                "paymentMethod": "upi",
                "email": "p@example.com",
                "firstName": "Ana",
                "lastName": "Silva",
                "upiId": "ana@upi"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(order["total"], 4100.0);
        let (_, cart) = call(&app, "GET", "/api/v1/store/cart/buyer", None).await;
        assert_eq!(cart["itemCount"], 3);

        let (_, purchases) = call(&app, "GET", "/api/v1/store/purchases/buyer", None).await;
        assert_eq!(purchases["legendaryAccess"], true);

        let (status, body) = call(
            &app,
            "POST",
            "/api/v1/store/chatbot/buyer",
            Some(json!({"text": "my android keeps lagging"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["reply"].as_str().unwrap().starts_with("For Android setup:"));
    }

    #[tokio::test]
    async fn owner_product_crud() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(dir.path()));
        let owner = [("x-owner-key", "shop")];
        let new = json!({"name": "PC Macro Pack", "price": 700.0, "platform": "pc", "tier": "gold"});

        let (status, _) = call(&app, "POST", "/api/v1/store/products", Some(new.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, created) =
            call_with(&app, "POST", "/api/v1/store/products", Some(new), &owner).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();

        let uri = format!("/api/v1/store/products/{}", id);
        let (_, updated) =
            call_with(&app, "PUT", &uri, Some(json!({"discount": 10})), &owner).await;
        assert_eq!(updated["discount"], 10);
        assert_eq!(updated["name"], "PC Macro Pack");

        let (status, _) = call_with(&app, "DELETE", &uri, None, &owner).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call_with(&app, "DELETE", &uri, None, &owner).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn speech_route_returns_wav() {
        // Two zero samples: base64 of four zero bytes.
        let reply = json!({"candidates": [{"content": {"parts": [{"inlineData": {
            "mimeType": "audio/L16;codec=pcm;rate=24000",
            "data": "AAAAAA=="
        }}]}}]});
        let mock = Router::new().route(
            "/models/:call",
            post(move || {
                let reply = reply.clone();
                async move { axum::Json(reply) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, mock).await.unwrap();
        });

        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state_with_endpoint(dir.path(), Some(endpoint)));

        let (status, _) = call(&app, "POST", "/api/v1/speech", Some(json!({"text": "  "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let req = Request::builder()
            .method("POST")
            .uri("/api/v1/speech")
            .header("content-type", "application/json")
            .body(Body::from(json!({"text": "Loadout ready"}).to_string()))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()["content-type"], "audio/wav");
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(bytes.len(), 44 + 4);
    }

    #[tokio::test]
    async fn bad_session_id_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(dir.path()));
        let (status, _) = call(&app, "GET", "/api/v1/sensi/bad%20id", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
