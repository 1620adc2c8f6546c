//! Health check (C8): a cached probe of the vendor account so repeated
//! polling doesn't hammer the cloud with a devices-list call every second.

use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use parking_lot::Mutex;
use serde_json::Value;

use super::AppState;

const CACHE_TTL: Duration = Duration::from_secs(60);

struct CachedResponse {
    computed_at: Instant,
    status: StatusCode,
    body: Value,
}

/// Caches the last health probe result for a minute, keyed by nothing but
/// time: the check has no parameters, so one slot is all that's needed.
pub struct HealthCache {
    cached: Mutex<Option<CachedResponse>>,
}

impl HealthCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cached: Mutex::new(None),
        }
    }

    pub async fn get_or_compute(&self, vendor: &dyn crate::vendor::Vendor) -> (StatusCode, Value) {
        if let Some(cached) = self.cached.lock().as_ref() {
            if cached.computed_at.elapsed() < CACHE_TTL {
                return (cached.status, cached.body.clone());
            }
        }

        let (status, body) = match vendor.list_devices().await {
            Ok(devices) => (
                StatusCode::OK,
                serde_json::json!({"status": "ok", "devices": devices.devices.len()}),
            ),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({"status": "dead", "error": err.to_string()}),
            ),
        };

        *self.cached.lock() = Some(CachedResponse {
            computed_at: Instant::now(),
            status,
            body: body.clone(),
        });
        (status, body)
    }
}

impl Default for HealthCache {
    fn default() -> Self {
        Self::new()
    }
}

pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (status, body) = state.health_cache.get_or_compute(state.vendor.as_ref()).await;
    (status, Json(body))
}
