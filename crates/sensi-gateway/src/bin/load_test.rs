//! Load test: concurrent players running the preset and storefront paths.
//! Exercises the shared preset table, per-session state and the usage counter.
//! Run with the gateway up: cargo run --bin load_test [base_url]

use reqwest::Client;
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:4000";
const CONCURRENT_PLAYERS: usize = 10;
const ROUNDS_PER_PLAYER: usize = 5;

const RAM_SIZES: &[&str] = &["2GB", "3GB", "4GB", "6GB", "8GB", "12GB"];
const PRODUCTS: &[&str] = &[
    "android-silver",
    "android-gold",
    "ios-diamond",
    "pc-legendary",
    "pc-gold",
];

#[tokio::main]
async fn main() {
    let base_url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    println!(
        "[LOAD TEST] Starting: {} players x {} rounds = {} rounds",
        CONCURRENT_PLAYERS,
        ROUNDS_PER_PLAYER,
        CONCURRENT_PLAYERS * ROUNDS_PER_PLAYER
    );
    println!("[LOAD TEST] Target: {} (ensure gateway is running)", base_url);

    let success = Arc::new(AtomicU32::new(0));
    let failure = Arc::new(AtomicU32::new(0));
    let latencies: Arc<RwLock<Vec<u64>>> = Arc::new(RwLock::new(Vec::new()));

    let client = Client::new();

    let mut handles = Vec::new();
    for player in 0..CONCURRENT_PLAYERS {
        let client = client.clone();
        let base_url = base_url.clone();
        let success = Arc::clone(&success);
        let failure = Arc::clone(&failure);
        let latencies = Arc::clone(&latencies);

        let h = tokio::spawn(async move {
            let session = format!("load-{}", player);
            for round in 0..ROUNDS_PER_PLAYER {
                let ram = RAM_SIZES[(player + round) % RAM_SIZES.len()];
                let product = PRODUCTS[(player + round) % PRODUCTS.len()];

                let start = Instant::now();
                let resolve = client
                    .post(format!("{}/api/v1/presets/resolve", base_url))
                    .json(&json!({ "ram": ram }))
                    .send()
                    .await;
                let cart = client
                    .post(format!("{}/api/v1/store/cart/{}/{}", base_url, session, product))
                    .send()
                    .await;
                let elapsed_ms = start.elapsed().as_millis() as u64;

                let ok = matches!(&resolve, Ok(r) if r.status().is_success())
                    && matches!(&cart, Ok(r) if r.status().is_success());
                if ok {
                    success.fetch_add(1, Ordering::Relaxed);
                    latencies.write().await.push(elapsed_ms);
                } else {
                    failure.fetch_add(1, Ordering::Relaxed);
                }
            }
        });
        handles.push(h);
    }

    for h in handles {
        let _ = h.await;
    }

    let s = success.load(Ordering::Relaxed);
    let f = failure.load(Ordering::Relaxed);
    let total = s + f;
    let success_rate = if total > 0 { (s as f64 / total as f64) * 100.0 } else { 0.0 };
    let latencies_guard = latencies.read().await;
    let avg_latency_ms = if latencies_guard.is_empty() {
        0.0
    } else {
        latencies_guard.iter().sum::<u64>() as f64 / latencies_guard.len() as f64
    };

    println!(
        "[LOAD TEST] Success rate: {:.1}% | Average round latency: {:.0}ms",
        success_rate, avg_latency_ms
    );
    println!("[LOAD TEST] Total: {} | Success: {} | Failure: {}", total, s, f);
    println!("[LOAD TEST] Check GET /api/v1/store/cart/load-0 for the accumulated cart.");
}
