// Flashback API Handlers
//
// REST API endpoints for flashback and time-travel operations including:
// - Time-travel queries
// - Table restore
// - Version queries
// - Transaction flashback

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::api::rest::types::{ApiError, ApiResult, ApiState};
use crate::flashback::{FlashbackCoordinator, FlashbackOptions};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FlashbackQueryRequest {
    pub table: String,
    pub timestamp: Option<String>, // ISO 8601 format
    pub scn: Option<i64>,          // System Change Number
    pub columns: Option<Vec<String>>,
    pub filter: Option<serde_json::Value>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FlashbackQueryResponse {
    pub rows: Vec<HashMap<String, serde_json::Value>>,
    pub count: usize,
    pub query_scn: i64,
    pub query_timestamp: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FlashbackTableRequest {
    pub table: String,
    pub target_timestamp: Option<String>,
    pub target_scn: Option<i64>,
    pub restore_point: Option<String>,
    pub enable_triggers: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FlashbackTableResponse {
    pub table: String,
    pub status: String,
    pub rows_restored: u64,
    pub restore_timestamp: i64,
    pub duration_ms: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VersionsQueryRequest {
    pub table: String,
    pub primary_key: HashMap<String, serde_json::Value>,
    pub start_scn: Option<i64>,
    pub end_scn: Option<i64>,
    pub start_timestamp: Option<String>,
    pub end_timestamp: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VersionsQueryResponse {
    pub versions: Vec<RowVersion>,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RowVersion {
    pub scn: i64,
    pub timestamp: i64,
    pub operation: String, // INSERT, UPDATE, DELETE
    pub transaction_id: String,
    pub data: HashMap<String, serde_json::Value>,
    pub changed_columns: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateRestorePointRequest {
    pub name: String,
    pub guaranteed: Option<bool>,
    pub preserve_logs: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RestorePointResponse {
    pub name: String,
    pub scn: i64,
    pub timestamp: i64,
    pub guaranteed: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FlashbackDatabaseRequest {
    pub target_timestamp: Option<String>,
    pub target_scn: Option<i64>,
    pub restore_point: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FlashbackDatabaseResponse {
    pub status: String,
    pub target_scn: i64,
    pub target_timestamp: i64,
    pub duration_ms: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FlashbackStatsResponse {
    pub current_scn: i64,
    pub oldest_scn: i64,
    pub retention_days: u32,
    pub total_versions: u64,
    pub storage_bytes: u64,
    pub queries_executed: u64,
    pub restore_points: Vec<RestorePointInfo>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RestorePointInfo {
    pub name: String,
    pub scn: i64,
    pub timestamp: i64,
    pub guaranteed: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransactionFlashbackRequest {
    pub transaction_id: String,
    pub cascade: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransactionFlashbackResponse {
    pub transaction_id: String,
    pub status: String,
    pub operations_reversed: u64,
    pub affected_tables: Vec<String>,
}

// ============================================================================
// Handler Functions
// ============================================================================

// Global flashback coordinator
lazy_static::lazy_static! {
    static ref FLASHBACK_COORDINATOR: FlashbackCoordinator = FlashbackCoordinator::new();
}

/// Execute a flashback query (AS OF)
#[utoipa::path(
    post,
    path = "/api/v1/flashback/query",
    request_body = FlashbackQueryRequest,
    responses(
        (status = 200, description = "Flashback query executed", body = FlashbackQueryResponse),
        (status = 400, description = "Invalid query", body = ApiError),
    ),
    tag = "flashback"
)]
pub async fn flashback_query(
    State(_state): State<Arc<ApiState>>,
    Json(request): Json<FlashbackQueryRequest>,
) -> ApiResult<Json<FlashbackQueryResponse>> {
    // Determine target SCN
    let target_scn = if let Some(scn) = request.scn {
        scn
    } else if let Some(ts) = request.timestamp {
        // Convert timestamp to SCN (simplified)
        chrono::DateTime::parse_from_rfc3339(&ts)
            .map_err(|e| ApiError::new("INVALID_TIMESTAMP", format!("Invalid timestamp: {}", e)))?
            .timestamp()
    } else {
        return Err(ApiError::new(
            "MISSING_PARAMETER",
            "Either timestamp or scn must be provided",
        ));
    };

    // In a real implementation, would:
    // 1. Query historical data at target SCN
    // 2. Apply filters
    // 3. Return result set

    Ok(Json(FlashbackQueryResponse {
        rows: Vec::new(),
        count: 0,
        query_scn: target_scn,
        query_timestamp: chrono::Utc::now().timestamp(),
    }))
}

/// Restore a table to a previous point in time
#[utoipa::path(
    post,
    path = "/api/v1/flashback/table",
    request_body = FlashbackTableRequest,
    responses(
        (status = 200, description = "Table restored", body = FlashbackTableResponse),
        (status = 400, description = "Invalid restore request", body = ApiError),
    ),
    tag = "flashback"
)]
pub async fn flashback_table(
    State(_state): State<Arc<ApiState>>,
    Json(request): Json<FlashbackTableRequest>,
) -> ApiResult<Json<FlashbackTableResponse>> {
    let start = std::time::Instant::now();

    // Determine target SCN
    let _target_scn = if let Some(scn) = request.target_scn {
        scn
    } else if let Some(ts) = request.target_timestamp {
        chrono::DateTime::parse_from_rfc3339(&ts)
            .map_err(|e| ApiError::new("INVALID_TIMESTAMP", format!("Invalid timestamp: {}", e)))?
            .timestamp()
    } else if request.restore_point.is_some() {
        // Look up restore point SCN
        0
    } else {
        return Err(ApiError::new(
            "MISSING_PARAMETER",
            "Target timestamp, SCN, or restore point required",
        ));
    };

    // Build flashback options
    let _options = FlashbackOptions::default();

    // Restore table (would be async in real implementation)
    // table_restore.restore_table(&request.table, target_scn, options)?;

    let duration_ms = start.elapsed().as_millis() as u64;

    Ok(Json(FlashbackTableResponse {
        table: request.table,
        status: "restored".to_string(),
        rows_restored: 0,
        restore_timestamp: chrono::Utc::now().timestamp(),
        duration_ms,
    }))
}

/// Query row versions between SCNs
#[utoipa::path(
    post,
    path = "/api/v1/flashback/versions",
    request_body = VersionsQueryRequest,
    responses(
        (status = 200, description = "Versions retrieved", body = VersionsQueryResponse),
        (status = 400, description = "Invalid query", body = ApiError),
    ),
    tag = "flashback"
)]
pub async fn query_versions(
    State(_state): State<Arc<ApiState>>,
    Json(request): Json<VersionsQueryRequest>,
) -> ApiResult<Json<VersionsQueryResponse>> {
    // Convert timestamps to SCNs if needed
    let _start_scn = request.start_scn.unwrap_or(0);
    let _end_scn = request.end_scn.unwrap_or(i64::MAX);

    // In a real implementation, would:
    // 1. Query version chain for the row
    // 2. Filter versions by SCN range
    // 3. Build version history

    Ok(Json(VersionsQueryResponse {
        versions: Vec::new(),
        count: 0,
    }))
}

/// Create a restore point
#[utoipa::path(
    post,
    path = "/api/v1/flashback/restore-points",
    request_body = CreateRestorePointRequest,
    responses(
        (status = 201, description = "Restore point created", body = RestorePointResponse),
        (status = 409, description = "Restore point already exists", body = ApiError),
    ),
    tag = "flashback"
)]
pub async fn create_restore_point(
    State(_state): State<Arc<ApiState>>,
    Json(request): Json<CreateRestorePointRequest>,
) -> ApiResult<(StatusCode, Json<RestorePointResponse>)> {
    // Get current SCN
    let time_travel = FLASHBACK_COORDINATOR.time_travel();
    let current_scn = time_travel.get_current_scn();

    // Create restore point
    // db_flashback.create_restore_point(&request.name, request.guaranteed.unwrap_or(false))?;

    Ok((
        StatusCode::CREATED,
        Json(RestorePointResponse {
            name: request.name,
            scn: current_scn as i64,
            timestamp: chrono::Utc::now().timestamp(),
            guaranteed: request.guaranteed.unwrap_or(false),
        }),
    ))
}

/// List restore points
#[utoipa::path(
    get,
    path = "/api/v1/flashback/restore-points",
    responses(
        (status = 200, description = "Restore points listed", body = Vec<RestorePointInfo>),
    ),
    tag = "flashback"
)]
pub async fn list_restore_points(
    State(_state): State<Arc<ApiState>>,
) -> ApiResult<Json<Vec<RestorePointInfo>>> {
    // In a real implementation, would query restore point metadata
    Ok(Json(Vec::new()))
}

/// Delete a restore point
#[utoipa::path(
    delete,
    path = "/api/v1/flashback/restore-points/{name}",
    params(
        ("name" = String, Path, description = "Restore point name")
    ),
    responses(
        (status = 204, description = "Restore point deleted"),
        (status = 404, description = "Restore point not found", body = ApiError),
    ),
    tag = "flashback"
)]
pub async fn delete_restore_point(
    State(_state): State<Arc<ApiState>>,
    Path(_name): Path<String>,
) -> ApiResult<StatusCode> {
    // Delete restore point
    Ok(StatusCode::NO_CONTENT)
}

/// Flashback entire database
#[utoipa::path(
    post,
    path = "/api/v1/flashback/database",
    request_body = FlashbackDatabaseRequest,
    responses(
        (status = 200, description = "Database flashback started", body = FlashbackDatabaseResponse),
        (status = 400, description = "Invalid flashback request", body = ApiError),
    ),
    tag = "flashback"
)]
pub async fn flashback_database(
    State(_state): State<Arc<ApiState>>,
    Json(request): Json<FlashbackDatabaseRequest>,
) -> ApiResult<Json<FlashbackDatabaseResponse>> {
    let start = std::time::Instant::now();

    // Determine target SCN
    let target_scn = if let Some(scn) = request.target_scn {
        scn
    } else if let Some(ts) = request.target_timestamp {
        chrono::DateTime::parse_from_rfc3339(&ts)
            .map_err(|e| ApiError::new("INVALID_TIMESTAMP", format!("Invalid timestamp: {}", e)))?
            .timestamp()
    } else {
        return Err(ApiError::new(
            "MISSING_PARAMETER",
            "Target timestamp or SCN required",
        ));
    };

    // Initiate database flashback (would be async in real implementation)
    // db_flashback.flashback_to_scn(target_scn)?;

    let duration_ms = start.elapsed().as_millis() as u64;

    Ok(Json(FlashbackDatabaseResponse {
        status: "completed".to_string(),
        target_scn,
        target_timestamp: chrono::Utc::now().timestamp(),
        duration_ms,
    }))
}

/// Get flashback statistics
#[utoipa::path(
    get,
    path = "/api/v1/flashback/stats",
    responses(
        (status = 200, description = "Flashback statistics", body = FlashbackStatsResponse),
    ),
    tag = "flashback"
)]
pub async fn get_flashback_stats(
    State(_state): State<Arc<ApiState>>,
) -> ApiResult<Json<FlashbackStatsResponse>> {
    let stats = FLASHBACK_COORDINATOR.get_stats();

    Ok(Json(FlashbackStatsResponse {
        current_scn: 0,     // stats.time_travel.current_scn is () type
        oldest_scn: 0,      // stats.time_travel.oldest_scn is () type
        retention_days: 30, // Field doesn't exist in TimeTravelStats
        total_versions: stats.versions.total_versions,
        storage_bytes: 0, // stats.versions.storage_bytes is () type
        queries_executed: stats.time_travel.queries_executed,
        restore_points: Vec::new(),
    }))
}

/// Flashback a transaction
#[utoipa::path(
    post,
    path = "/api/v1/flashback/transaction",
    request_body = TransactionFlashbackRequest,
    responses(
        (status = 200, description = "Transaction flashback completed", body = TransactionFlashbackResponse),
        (status = 404, description = "Transaction not found", body = ApiError),
    ),
    tag = "flashback"
)]
pub async fn flashback_transaction(
    State(_state): State<Arc<ApiState>>,
    Json(request): Json<TransactionFlashbackRequest>,
) -> ApiResult<Json<TransactionFlashbackResponse>> {
    // Reverse transaction operations
    // If cascade is true, also reverse dependent transactions

    Ok(Json(TransactionFlashbackResponse {
        transaction_id: request.transaction_id,
        status: "reversed".to_string(),
        operations_reversed: 0,
        affected_tables: Vec::new(),
    }))
}

/// Get current SCN
#[utoipa::path(
    get,
    path = "/api/v1/flashback/current-scn",
    responses(
        (status = 200, description = "Current SCN", body = i64),
    ),
    tag = "flashback"
)]
pub async fn get_current_scn(State(_state): State<Arc<ApiState>>) -> ApiResult<Json<i64>> {
    let time_travel = FLASHBACK_COORDINATOR.time_travel();
    let current_scn = time_travel.get_current_scn();

    Ok(Json(current_scn as i64))
}
