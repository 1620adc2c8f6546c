//! REST control-plane and skill-webhook handlers (C7), and the router that
//! wires them together with the auth/context middleware and health check.

use axum::body::Bytes;
use axum::extract::{Extension, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};
use crate::queue::Queue;
use crate::skill::RequestContext;
use crate::vendor::{build_text_command, build_volume, DeviceTarget};

use super::health;
use super::middleware::{api_key_auth, request_context, request_logging};
use super::AppState;

fn parse_json<T: DeserializeOwned>(bytes: &Bytes) -> Result<T> {
    serde_json::from_slice(bytes).map_err(BridgeError::from)
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeviceTuple {
    #[serde(default)]
    device_owner_customer_id: String,
    device_type: String,
    serial_number: String,
}

impl From<DeviceTuple> for DeviceTarget {
    fn from(d: DeviceTuple) -> Self {
        Self {
            device_type: d.device_type,
            device_serial_number: d.serial_number,
            customer_id: d.device_owner_customer_id,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeRequest {
    device: DeviceTuple,
    volume: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct VolumeProjection {
    device_serial_number: String,
    muted: bool,
    volume: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeviceProjection {
    name: String,
    device_owner_customer_id: String,
    device_type: String,
    serial_number: String,
}

pub async fn post_queue(State(state): State<AppState>, body: Bytes) -> Result<impl IntoResponse> {
    let new_queue: Queue = parse_json(&body)?;
    state.queue.write().replace(new_queue);
    Ok(Json(
        serde_json::json!({"status": "success", "message": "queue updated"}),
    ))
}

pub async fn get_queue(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.queue.read().clone())
}

pub async fn get_playing(State(state): State<AppState>) -> impl IntoResponse {
    let queue = state.queue.read();
    if queue.has_items() {
        Json(serde_json::json!({
            "state": queue.state,
            "song": queue.current(),
        }))
    } else {
        Json(serde_json::json!({"state": "IDLE"}))
    }
}

async fn execute_text_command(state: &AppState, verb: &str, body: &Bytes) -> Result<()> {
    let tuple: DeviceTuple = parse_json(body)?;
    let target: DeviceTarget = tuple.into();
    let command = build_text_command(
        &format!("ask {} to {}", state.config.alexa_skill_name, verb),
        "en-US",
        &target,
    );
    state.vendor.post_sequence(command).await?;
    Ok(())
}

fn verb_response(verb: &str) -> impl IntoResponse {
    Json(serde_json::json!({"status": "success", "message": format!("{verb} executed")}))
}

pub async fn post_play(State(state): State<AppState>, body: Bytes) -> Result<impl IntoResponse> {
    execute_text_command(&state, "play", &body).await?;
    Ok(verb_response("play"))
}

pub async fn post_stop(State(state): State<AppState>, body: Bytes) -> Result<impl IntoResponse> {
    execute_text_command(&state, "stop", &body).await?;
    Ok(verb_response("stop"))
}

pub async fn post_next(State(state): State<AppState>, body: Bytes) -> Result<impl IntoResponse> {
    execute_text_command(&state, "next", &body).await?;
    Ok(verb_response("next"))
}

pub async fn post_prev(State(state): State<AppState>, body: Bytes) -> Result<impl IntoResponse> {
    execute_text_command(&state, "previous", &body).await?;
    Ok(verb_response("previous"))
}

pub async fn post_volume(State(state): State<AppState>, body: Bytes) -> Result<impl IntoResponse> {
    let request: VolumeRequest = parse_json(&body)?;
    let target: DeviceTarget = request.device.into();
    let command = build_volume(request.volume, "en-US", &target);
    state.vendor.post_sequence(command).await?;
    Ok(Json(
        serde_json::json!({"status": "success", "message": "volume updated"}),
    ))
}

pub async fn get_volume(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let volumes = state.vendor.list_volumes().await?;
    let projected: Vec<VolumeProjection> = volumes
        .volumes
        .into_iter()
        .map(|v| VolumeProjection {
            device_serial_number: v.device_serial_number,
            muted: v.speaker_muted,
            volume: v.speaker_volume,
        })
        .collect();
    Ok(Json(serde_json::json!({"volumes": projected})))
}

pub async fn get_devices(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let devices = state.vendor.list_devices().await?;
    let projected: Vec<DeviceProjection> = devices
        .devices
        .into_iter()
        .filter(|d| d.is_eligible())
        .map(|d| DeviceProjection {
            name: d.account_name,
            device_owner_customer_id: d.device_owner_customer_id,
            device_type: d.device_type,
            serial_number: d.serial_number,
        })
        .collect();
    if projected.is_empty() {
        return Err(BridgeError::NotFound("No devices on the account".to_string()));
    }
    Ok(Json(serde_json::json!({"devices": projected})))
}

pub async fn post_skill(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let envelope: crate::skill::RequestEnvelope = parse_json(&body)?;
    if envelope.context.system.application.application_id != state.config.alexa_skill_id {
        return Err(BridgeError::SkillAuthError);
    }
    let response = state.dispatcher.handle(&envelope, &ctx);
    Ok(Json(response))
}


pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/queue", post(post_queue).get(get_queue))
        .route("/playing", get(get_playing))
        .route("/play", post(post_play))
        .route("/stop", post(post_stop))
        .route("/next", post(post_next))
        .route("/prev", post(post_prev))
        .route("/volume", post(post_volume).get(get_volume))
        .route("/devices", get(get_devices));

    Router::new()
        .nest("/api", api_routes)
        .route("/skill", post(post_skill))
        .route("/health", get(health::health_check))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            api_key_auth,
        ))
        .layer(axum::middleware::from_fn(request_context))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            request_logging,
        ))
        .with_state(state)
}
