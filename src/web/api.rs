//! Defines the Axum API routes and handlers.

use crate::bus::{BusError, Message};
use crate::device::SensorHandle;
use crate::web::bus_channel::BusRequest;
use crate::web::models::{
    DeviceListResponse, DeviceStatusResponse, ErrorResponse, MAX_READ_LEN, TemperatureRequest,
    TemperatureResponse, TransferMessage, TransferRequest, TransferResponse,
};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{mpsc::Sender, oneshot};

#[derive(Debug, Clone)]
pub struct AppState {
    pub bus_tx: Sender<BusRequest>,
    pub sensors: Arc<BTreeMap<u8, SensorHandle>>,
}

impl AppState {
    pub fn new(bus_tx: Sender<BusRequest>, sensors: BTreeMap<u8, SensorHandle>) -> Self {
        Self {
            bus_tx,
            sensors: Arc::new(sensors),
        }
    }

    fn sensor(&self, addr: &str) -> Result<(u8, &SensorHandle), ApiError> {
        let address = parse_address(addr)
            .ok_or_else(|| ApiError::BadRequest(format!("invalid address '{addr}'")))?;
        self.sensors
            .get(&address)
            .map(|sensor| (address, sensor))
            .ok_or_else(|| ApiError::NotFound(format!("no device at address 0x{address:02x}")))
    }
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal,
}

impl From<BusError> for ApiError {
    fn from(err: BusError) -> Self {
        match err {
            BusError::NoDevice(_) => ApiError::NotFound(err.to_string()),
            _ => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "bus task unavailable".to_string()),
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

/// Accepts `72` or `0x48`.
pub fn parse_address(s: &str) -> Option<u8> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

/// Creates the Axum router with all the API endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/devices", get(list_devices))
        .route(
            "/api/v1/devices/{addr}/temperature",
            get(get_temperature).put(put_temperature),
        )
        .route("/api/v1/devices/{addr}/status", get(get_status))
        .route("/api/v1/bus/transfer", post(transfer))
        .with_state(state)
}

async fn list_devices(State(state): State<AppState>) -> Result<Json<DeviceListResponse>, ApiError> {
    let (resp_tx, resp_rx) = oneshot::channel();
    if state
        .bus_tx
        .send(BusRequest::ListDevices { respond_to: resp_tx })
        .await
        .is_err()
    {
        return Err(ApiError::Internal);
    }
    let devices = resp_rx.await.map_err(|_| ApiError::Internal)?;
    Ok(Json(DeviceListResponse { devices }))
}

/// Shows the stored ambient temperature.
async fn get_temperature(
    State(state): State<AppState>,
    Path(addr): Path<String>,
) -> Result<Json<TemperatureResponse>, ApiError> {
    let (address, sensor) = state.sensor(&addr)?;
    Ok(Json(TemperatureResponse {
        address,
        milli_celsius: sensor.stored_temperature(),
    }))
}

/// Stores a new ambient temperature. Takes JSON, or a bare decimal integer
/// like the sysfs attribute does.
async fn put_temperature(
    State(state): State<AppState>,
    Path(addr): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<TemperatureResponse>, ApiError> {
    let (address, sensor) = state.sensor(&addr)?;
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));
    let value = if is_json {
        serde_json::from_slice::<TemperatureRequest>(&body)
            .map_err(|e| ApiError::BadRequest(e.to_string()))?
            .milli_celsius
    } else {
        std::str::from_utf8(&body)
            .ok()
            .and_then(|text| text.trim().parse::<i32>().ok())
            .ok_or_else(|| ApiError::BadRequest("expected an integer temperature".to_string()))?
    };
    tracing::debug!("Store temperature {} at 0x{:02x}", value, address);
    sensor.set_ambient_milli(value);
    Ok(Json(TemperatureResponse {
        address,
        milli_celsius: value,
    }))
}

async fn get_status(
    State(state): State<AppState>,
    Path(addr): Path<String>,
) -> Result<Json<DeviceStatusResponse>, ApiError> {
    let (address, sensor) = state.sensor(&addr)?;
    Ok(Json(DeviceStatusResponse::new(address, sensor.status())))
}

/// Runs a raw combined transfer on the bus.
async fn transfer(
    State(state): State<AppState>,
    Json(payload): Json<TransferRequest>,
) -> Result<Json<TransferResponse>, ApiError> {
    let too_long = payload.messages.iter().any(|message| {
        matches!(message, TransferMessage::Read { read, .. } if *read > MAX_READ_LEN)
    });
    if too_long {
        return Err(ApiError::BadRequest(format!(
            "reads are limited to {MAX_READ_LEN} bytes"
        )));
    }
    let messages: Vec<Message> = payload.messages.into_iter().map(Message::from).collect();

    let (resp_tx, resp_rx) = oneshot::channel();
    if state
        .bus_tx
        .send(BusRequest::Transfer {
            messages,
            respond_to: resp_tx,
        })
        .await
        .is_err()
    {
        return Err(ApiError::Internal);
    }
    let messages = resp_rx.await.map_err(|_| ApiError::Internal)??;
    let reads = messages
        .into_iter()
        .filter(Message::is_read)
        .map(Message::into_bytes)
        .collect();
    Ok(Json(TransferResponse { reads }))
}
