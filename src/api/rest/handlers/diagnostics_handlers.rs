// Diagnostics Handlers
//
// REST API handlers for diagnostics, incidents, profiling, and ASH

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json as AxumJson,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;
use utoipa::ToSchema;

use super::super::types::*;

// Incident response types
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IncidentListResponse {
    pub incidents: Vec<IncidentSummary>,
    pub total_count: usize,
    pub page: usize,
    pub page_size: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IncidentSummary {
    pub id: String,
    pub severity: String, // critical, high, medium, low
    pub status: String,   // open, investigating, resolved, closed
    pub title: String,
    pub description: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub resolved_at: Option<i64>,
    pub affected_components: Vec<String>,
    pub assignee: Option<String>,
}

// Dump request/response types
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DumpRequest {
    pub dump_type: String,      // memory, thread, heap, query_plan, execution_stats
    pub target: Option<String>, // specific query ID, session ID, or component
    pub include_stacktrace: Option<bool>,
    pub format: Option<String>, // json, text, binary
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DumpResponse {
    pub dump_id: String,
    pub dump_type: String,
    pub status: String, // pending, in_progress, completed, failed
    pub created_at: i64,
    pub completed_at: Option<i64>,
    pub size_bytes: Option<u64>,
    pub download_url: Option<String>,
    pub expires_at: Option<i64>,
}

// Query profiling response types
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QueryProfilingResponse {
    pub profiles: Vec<QueryProfile>,
    pub total_count: usize,
    pub page: usize,
    pub page_size: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QueryProfile {
    pub query_id: String,
    pub query_text: String,
    pub execution_count: u64,
    pub total_time_ms: u64,
    pub avg_time_ms: f64,
    pub min_time_ms: u64,
    pub max_time_ms: u64,
    pub total_rows_returned: u64,
    pub avg_rows_returned: f64,
    pub cache_hit_ratio: f64,
    pub last_executed: i64,
    pub execution_plan: Option<String>,
}

// Active Session History (ASH) response types
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActiveSessionHistoryResponse {
    pub samples: Vec<ASHSample>,
    pub total_count: usize,
    pub sample_interval_seconds: u64,
    pub time_range: TimeRange,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ASHSample {
    pub sample_time: i64,
    pub session_id: u64,
    pub sql_id: Option<String>,
    pub sql_text: Option<String>,
    pub wait_event: Option<String>,
    pub wait_time_ms: Option<u64>,
    pub blocking_session: Option<u64>,
    pub cpu_time_ms: u64,
    pub user_name: String,
    pub program: Option<String>,
    pub module: Option<String>,
    pub action: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TimeRange {
    pub start: i64,
    pub end: i64,
}

/// GET /api/v1/diagnostics/incidents
///
/// Get list of incidents
#[utoipa::path(
    get,
    path = "/api/v1/diagnostics/incidents",
    tag = "diagnostics",
    params(
        ("page" = Option<usize>, Query, description = "Page number"),
        ("page_size" = Option<usize>, Query, description = "Page size"),
        ("severity" = Option<String>, Query, description = "Filter by severity"),
        ("status" = Option<String>, Query, description = "Filter by status"),
    ),
    responses(
        (status = 200, description = "List of incidents", body = IncidentListResponse),
    )
)]
pub async fn get_incidents(
    State(_state): State<Arc<ApiState>>,
    Query(params): Query<PaginationParams>,
) -> ApiResult<AxumJson<IncidentListResponse>> {
    // In a real implementation, this would fetch incidents from an incident tracking system
    let response = IncidentListResponse {
        incidents: vec![],
        total_count: 0,
        page: params.page,
        page_size: params.page_size,
    };

    Ok(AxumJson(response))
}

/// POST /api/v1/diagnostics/dump
///
/// Create a diagnostic dump
#[utoipa::path(
    post,
    path = "/api/v1/diagnostics/dump",
    tag = "diagnostics",
    request_body = DumpRequest,
    responses(
        (status = 202, description = "Dump creation started", body = DumpResponse),
    )
)]
pub async fn create_dump(
    State(_state): State<Arc<ApiState>>,
    axum::Json(request): axum::Json<DumpRequest>,
) -> ApiResult<(StatusCode, AxumJson<DumpResponse>)> {
    // In a real implementation, this would trigger dump creation
    let dump_id = uuid::Uuid::new_v4().to_string();
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let response = DumpResponse {
        dump_id: dump_id.clone(),
        dump_type: request.dump_type,
        status: "pending".to_string(),
        created_at: now,
        completed_at: None,
        size_bytes: None,
        download_url: Some(format!("/api/v1/diagnostics/dump/{}/download", dump_id)),
        expires_at: Some(now + 3600), // 1 hour expiration
    };

    Ok((StatusCode::ACCEPTED, AxumJson(response)))
}

/// GET /api/v1/profiling/queries
///
/// Get query profiling data
#[utoipa::path(
    get,
    path = "/api/v1/profiling/queries",
    tag = "diagnostics",
    params(
        ("page" = Option<usize>, Query, description = "Page number"),
        ("page_size" = Option<usize>, Query, description = "Page size"),
        ("sort_by" = Option<String>, Query, description = "Sort field: total_time, avg_time, execution_count"),
        ("min_time_ms" = Option<u64>, Query, description = "Minimum execution time filter"),
    ),
    responses(
        (status = 200, description = "Query profiling data", body = QueryProfilingResponse),
    )
)]
pub async fn get_query_profiling(
    State(_state): State<Arc<ApiState>>,
    Query(params): Query<PaginationParams>,
) -> ApiResult<AxumJson<QueryProfilingResponse>> {
    // In a real implementation, this would fetch query profiling data from the execution engine
    let response = QueryProfilingResponse {
        profiles: vec![],
        total_count: 0,
        page: params.page,
        page_size: params.page_size,
    };

    Ok(AxumJson(response))
}

/// GET /api/v1/monitoring/ash
///
/// Get Active Session History samples
#[utoipa::path(
    get,
    path = "/api/v1/monitoring/ash",
    tag = "diagnostics",
    params(
        ("start_time" = Option<i64>, Query, description = "Start time (Unix timestamp)"),
        ("end_time" = Option<i64>, Query, description = "End time (Unix timestamp)"),
        ("session_id" = Option<u64>, Query, description = "Filter by session ID"),
        ("wait_event" = Option<String>, Query, description = "Filter by wait event"),
    ),
    responses(
        (status = 200, description = "Active Session History data", body = ActiveSessionHistoryResponse),
    )
)]
pub async fn get_active_session_history(
    State(_state): State<Arc<ApiState>>,
    Query(_params): Query<HashMap<String, String>>,
) -> ApiResult<AxumJson<ActiveSessionHistoryResponse>> {
    // In a real implementation, this would fetch ASH data from the monitoring system
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let response = ActiveSessionHistoryResponse {
        samples: vec![],
        total_count: 0,
        sample_interval_seconds: 10,
        time_range: TimeRange {
            start: now - 3600, // Last hour
            end: now,
        },
    };

    Ok(AxumJson(response))
}

/// GET /api/v1/diagnostics/dump/{id}
///
/// Get dump status
#[utoipa::path(
    get,
    path = "/api/v1/diagnostics/dump/{id}",
    tag = "diagnostics",
    responses(
        (status = 200, description = "Dump status", body = DumpResponse),
        (status = 404, description = "Dump not found"),
    )
)]
pub async fn get_dump_status(
    State(_state): State<Arc<ApiState>>,
    Path(id): Path<String>,
) -> ApiResult<AxumJson<DumpResponse>> {
    // In a real implementation, this would fetch dump status
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;

    let response = DumpResponse {
        dump_id: id.clone(),
        dump_type: "memory".to_string(),
        status: "completed".to_string(),
        created_at: now - 300,              // 5 minutes ago
        completed_at: Some(now - 60),       // 1 minute ago
        size_bytes: Some(1024 * 1024 * 50), // 50 MB
        download_url: Some(format!("/api/v1/diagnostics/dump/{}/download", id)),
        expires_at: Some(now + 3300), // ~55 minutes remaining
    };

    Ok(AxumJson(response))
}

/// GET /api/v1/diagnostics/dump/{id}/download
///
/// Download a diagnostic dump
#[utoipa::path(
    get,
    path = "/api/v1/diagnostics/dump/{id}/download",
    tag = "diagnostics",
    responses(
        (status = 200, description = "Dump file"),
        (status = 404, description = "Dump not found"),
        (status = 410, description = "Dump expired"),
    )
)]
pub async fn download_dump(
    State(_state): State<Arc<ApiState>>,
    Path(_id): Path<String>,
) -> ApiResult<Vec<u8>> {
    // In a real implementation, this would return the actual dump file
    // For now, return empty data
    Ok(vec![])
}
