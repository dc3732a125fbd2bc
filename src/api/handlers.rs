//! API request handlers
//!
//! Every endpoint answers with the [`ApiResponse`] envelope. Failures are
//! reported in the envelope's `error` field.

use std::path::PathBuf;
use std::sync::{Arc, RwLockReadGuard, RwLockWriteGuard};

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::server::AppState;
use crate::core::consolidation::{SalesSummary, PRODUCT_GROSS_MARGIN};
use crate::core::report::{self, Kpis, DEFAULT_RANKING_LIMIT};
use crate::error::{BudgetError, BudgetResult};
use crate::session::Session;
use crate::types::SalesVector;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            request_id: Uuid::new_v4().to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            request_id: Uuid::new_v4().to_string(),
            data: None,
            error: Some(message.into()),
        }
    }
}

fn respond<T: Serialize>(result: BudgetResult<T>) -> Json<ApiResponse<T>> {
    match result {
        Ok(data) => Json(ApiResponse::ok(data)),
        Err(e) => {
            warn!(error = %e, "request failed");
            Json(ApiResponse::err(e.to_string()))
        }
    }
}

fn read_session(state: &AppState) -> BudgetResult<RwLockReadGuard<'_, Session>> {
    state
        .session
        .read()
        .map_err(|_| BudgetError::Validation("Session lock poisoned".to_string()))
}

fn write_session(state: &AppState) -> BudgetResult<RwLockWriteGuard<'_, Session>> {
    state
        .session
        .write()
        .map_err(|_| BudgetError::Validation("Session lock poisoned".to_string()))
}

/// Health check response
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub budget_loaded: bool,
}

/// GET /health - Health check
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    respond(read_session(&state).map(|session| HealthResponse {
        status: "healthy".to_string(),
        budget_loaded: session.budget().is_some(),
    }))
}

/// Version response
#[derive(Serialize)]
pub struct VersionResponse {
    pub version: String,
    pub endpoints: Vec<String>,
}

/// GET /version - Server version
pub async fn version(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ApiResponse::ok(VersionResponse {
        version: state.version.clone(),
        endpoints: [
            "budget",
            "import",
            "sales",
            "consolidated",
            "kpis",
            "rankings",
            "dashboard",
        ]
        .iter()
        .map(|e| format!("/api/v1/{}", e))
        .collect(),
    }))
}

/// GET /api/v1/budget - Current budget snapshot
pub async fn budget(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    respond(read_session(&state).and_then(|session| {
        session.snapshot().cloned().ok_or(BudgetError::NoBudget)
    }))
}

/// Import request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    pub file_path: String,
}

/// Import response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    pub file_path: String,
    pub saved_at: DateTime<Utc>,
    pub clients: usize,
    pub kpis: Kpis,
}

/// POST /api/v1/import - Import a workbook and make it the current budget
pub async fn import_budget(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ImportRequest>,
) -> impl IntoResponse {
    let path = PathBuf::from(&req.file_path);
    respond(write_session(&state).and_then(|mut session| {
        let snapshot = session.import_file(&path)?;
        Ok(ImportResponse {
            file_path: req.file_path.clone(),
            saved_at: snapshot.saved_at,
            clients: snapshot.model.revenue.clients.len(),
            kpis: Kpis::from_model(&snapshot.model),
        })
    }))
}

/// Sales request: twelve monthly values
#[derive(Debug, Deserialize)]
pub struct SalesRequest {
    pub values: Vec<f64>,
}

/// Sales vector plus its cost/margin split
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesResponse {
    pub values: SalesVector,
    pub summary: SalesSummary,
}

impl SalesResponse {
    fn new(sales: &SalesVector) -> Self {
        Self {
            values: *sales,
            summary: SalesSummary::new(sales, PRODUCT_GROSS_MARGIN),
        }
    }
}

/// GET /api/v1/sales - Current sales vector
pub async fn sales(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    respond(read_session(&state).map(|session| SalesResponse::new(session.sales())))
}

/// PUT /api/v1/sales - Replace the sales vector
pub async fn update_sales(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SalesRequest>,
) -> impl IntoResponse {
    respond(SalesVector::from_slice(&req.values).and_then(|sales| {
        let mut session = write_session(&state)?;
        session.set_sales(sales)?;
        Ok(SalesResponse::new(session.sales()))
    }))
}

/// GET /api/v1/consolidated - Budget blended with product sales
pub async fn consolidated(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    respond(read_session(&state).and_then(|session| session.consolidated()))
}

/// GET /api/v1/kpis
pub async fn kpis(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    respond(
        read_session(&state)
            .and_then(|session| session.require_budget().map(Kpis::from_model)),
    )
}

#[derive(Debug, Deserialize)]
pub struct RankingQuery {
    pub limit: Option<usize>,
}

/// GET /api/v1/rankings?limit=N
pub async fn rankings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RankingQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(DEFAULT_RANKING_LIMIT);
    respond(read_session(&state).and_then(|session| {
        session
            .require_budget()
            .map(|model| report::rankings(model, limit))
    }))
}

/// GET /api/v1/dashboard - Everything a dashboard needs in one call
pub async fn dashboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    respond(read_session(&state).and_then(|session| session.dashboard()))
}
