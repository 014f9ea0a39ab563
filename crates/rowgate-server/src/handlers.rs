use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use rowgate_sheets::Row;
use serde::Serialize;
use serde_json::{Value, json};

use crate::error::GatewayError;
use crate::response::Envelope;
use crate::server::AppState;

type JsonBody = Result<Json<Value>, JsonRejection>;
type SheetName = Result<Path<String>, PathRejection>;
type RowResult<T> = Result<Json<Envelope<T>>, GatewayError>;

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    status: &'a str,
}

pub async fn root(State(state): State<AppState>) -> impl IntoResponse {
    let body = json!({
        "service": "RowGate",
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "backend": state.gateway.store().backend_name(),
    });
    (StatusCode::OK, Json(body))
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    if state.gateway.store().is_available() {
        (StatusCode::OK, Json(HealthResponse { status: "ready" }))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "not_ready",
            }),
        )
    }
}

// ---- Row operations ----

/// `POST /submit` with `{name, email}`.
pub async fn submit(State(state): State<AppState>, payload: JsonBody) -> RowResult<Value> {
    let Json(payload) = payload?;
    let data = state.gateway.submit_contact(&payload).await?;
    Ok(Json(Envelope::success(data)))
}

/// `POST /submit/{sheet_name}` with a row (or array of rows).
pub async fn submit_to_sheet(
    State(state): State<AppState>,
    sheet_name: SheetName,
    payload: JsonBody,
) -> RowResult<Value> {
    let Path(sheet_name) = sheet_name?;
    let Json(payload) = payload?;
    let data = state.gateway.append_rows(&sheet_name, &payload).await?;
    Ok(Json(Envelope::success(data)))
}

/// `GET /data`
pub async fn read_default(State(state): State<AppState>) -> RowResult<Vec<Row>> {
    let rows = state.gateway.read_rows(None).await?;
    Ok(Json(Envelope::success(rows)))
}

/// `GET /data/{sheet_name}`
pub async fn read_sheet(
    State(state): State<AppState>,
    sheet_name: SheetName,
) -> RowResult<Vec<Row>> {
    let Path(sheet_name) = sheet_name?;
    let rows = state.gateway.read_rows(Some(&sheet_name)).await?;
    Ok(Json(Envelope::success(rows)))
}

/// `POST /update` with `{index, updatedData}`.
pub async fn update_default(State(state): State<AppState>, payload: JsonBody) -> RowResult<Value> {
    let Json(payload) = payload?;
    let data = state.gateway.update_row(None, &payload).await?;
    Ok(Json(Envelope::success(data)))
}

/// `POST /update/{sheet_name}` with `{index, updatedData}`.
pub async fn update_sheet(
    State(state): State<AppState>,
    sheet_name: SheetName,
    payload: JsonBody,
) -> RowResult<Value> {
    let Path(sheet_name) = sheet_name?;
    let Json(payload) = payload?;
    let data = state.gateway.update_row(Some(&sheet_name), &payload).await?;
    Ok(Json(Envelope::success(data)))
}
