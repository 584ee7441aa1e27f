//! HTTP device service.
//!
//! Exposes sensor discovery, a single device connection, and readings from the
//! connected device over JSON. Sensors are synthetic: every catalog device
//! produces random-walk readings for the metrics of its role.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
};
use log::info;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use trainerlink_core::{
    ConnectResponse, Device, ErrorResponse, ReadingResponse, ReadingValue, SimulationProfile,
    SyntheticSensor, fixed_catalog,
};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, detail: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            detail: detail.into(),
        }),
    )
}

/// The device the service is currently linked to.
struct Connection {
    device: Device,
    sensor: SyntheticSensor,
}

/// Shared server state.
pub struct DeviceService {
    catalog: Vec<Device>,
    profile: SimulationProfile,
    connection: Mutex<Option<Connection>>,
}

impl Default for DeviceService {
    fn default() -> Self {
        Self::new(fixed_catalog())
    }
}

impl DeviceService {
    pub fn new(catalog: Vec<Device>) -> Self {
        Self {
            catalog,
            profile: SimulationProfile::default(),
            connection: Mutex::new(None),
        }
    }

    fn lookup(&self, address: &str) -> Option<&Device> {
        self.catalog
            .iter()
            .find(|d| d.address.eq_ignore_ascii_case(address))
    }
}

async fn handle_devices(State(service): State<Arc<DeviceService>>) -> Json<Vec<Device>> {
    Json(service.catalog.clone())
}

async fn handle_connect(
    State(service): State<Arc<DeviceService>>,
    Path(address): Path<String>,
) -> Result<Json<ConnectResponse>, ApiError> {
    let mut connection = service.connection.lock().await;
    if let Some(current) = connection.as_ref() {
        return Ok(Json(ConnectResponse {
            status: "already_connected".to_string(),
            device: Some(current.device.address.clone()),
        }));
    }

    let device = service.lookup(&address).ok_or_else(|| {
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Device {address} not found"),
        )
    })?;
    info!("Connected {} ({})", device.name, device.address);
    *connection = Some(Connection {
        device: device.clone(),
        sensor: SyntheticSensor::new(device.role, service.profile),
    });

    Ok(Json(ConnectResponse {
        status: "connected".to_string(),
        device: Some(device.address.clone()),
    }))
}

async fn handle_disconnect(State(service): State<Arc<DeviceService>>) -> Json<ConnectResponse> {
    let status = match service.connection.lock().await.take() {
        Some(previous) => {
            info!("Disconnected {}", previous.device.address);
            "disconnected"
        }
        None => "not_connected",
    };
    Json(ConnectResponse {
        status: status.to_string(),
        device: None,
    })
}

async fn handle_reading(
    State(service): State<Arc<DeviceService>>,
    Path(address): Path<String>,
) -> Result<Json<ReadingResponse>, ApiError> {
    let mut connection = service.connection.lock().await;
    let conn = connection
        .as_mut()
        .filter(|c| c.device.address.eq_ignore_ascii_case(&address))
        .ok_or_else(|| {
            api_error(
                StatusCode::NOT_FOUND,
                format!("Device {address} is not connected"),
            )
        })?;

    let values = conn
        .sensor
        .read(&mut rand::rng())
        .into_iter()
        .map(|(kind, value)| ReadingValue { kind, value })
        .collect();
    Ok(Json(ReadingResponse {
        address: conn.device.address.clone(),
        role: conn.device.role,
        values,
    }))
}

async fn handle_index(State(service): State<Arc<DeviceService>>) -> Json<serde_json::Value> {
    let connected = service
        .connection
        .lock()
        .await
        .as_ref()
        .map(|c| c.device.address.clone());

    Json(serde_json::json!({
        "name": "Trainerlink Device Service",
        "version": trainerlink_core::VERSION,
        "devices": service.catalog.len(),
        "connected": connected,
        "endpoints": {
            "/": "This API index",
            "/devices": "List available devices",
            "/connect/{address}": "Connect a device (one at a time)",
            "/disconnect": "Disconnect the current device",
            "/reading/{address}": "Latest readings from the connected device",
        },
    }))
}

/// Build the axum router.
pub fn build_router(service: DeviceService) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/devices", get(handle_devices))
        .route("/connect/{address}", get(handle_connect))
        .route("/disconnect", get(handle_disconnect))
        .route("/reading/{address}", get(handle_reading))
        .with_state(Arc::new(service))
}

/// Serve on an already-bound listener.
pub async fn serve(listener: TcpListener, service: DeviceService) -> std::io::Result<()> {
    axum::serve(listener, build_router(service)).await
}

/// Run the HTTP device service.
pub async fn run_server(host: &str, port: u16) -> std::io::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!("Device service listening on {}", listener.local_addr()?);
    serve(listener, DeviceService::default()).await
}
