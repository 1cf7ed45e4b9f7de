/// Distributed Query Coordinator
/// 
/// This module provides distributed query execution across multiple nodes:
/// - Query distribution and coordination
/// - Data shuffling between nodes  
/// - Distributed join execution
/// - Fault tolerance and recovery
/// - Load balancing across nodes
/// - Result aggregation from multiple nodes

use tokio::time::sleep;
use std::time::Duration;
use crate::error::DbError;
use crate::execution::{QueryResult, planner::PlanNode};
use std::collections::HashMap;
use std::sync::Arc;
use parking_lot::RwLock;
use tokio::sync::Semaphore;

/// Distributed query coordinator
pub struct DistributedCoordinator {
    /// Available worker nodes
    nodes: Arc<RwLock<Vec<WorkerNode>>>,
    /// Load balancer
    load_balancer: Arc<LoadBalancer>,
    /// Query scheduler
    scheduler: Arc<QueryScheduler>,
}

impl DistributedCoordinator {
    pub fn new() -> Self {
        Self {
            nodes: Arc::new(RwLock::new(Vec::new())),
            load_balancer: Arc::new(LoadBalancer::new()),
            scheduler: Arc::new(QueryScheduler::new()),
        }
    }
    
    /// Register a worker node
    pub fn register_node(&self, node: WorkerNode) {
        self.nodes.write().push(node);
    }
    
    /// Execute query across distributed nodes
    pub async fn execute_distributed(&self, plan: &PlanNode) -> Result<QueryResult, DbError> {
        // Analyze query to determine distribution strategy
        let strategy = self.analyze_query(plan)?;
        
        match strategy {
            DistributionStrategy::BroadcastJoin => {
                self.execute_broadcast_join(plan).await
            }
            DistributionStrategy::HashPartitioned => {
                self.execute_hash_partitioned(plan).await
            }
            DistributionStrategy::RangePartitioned => {
                self.execute_range_partitioned(plan).await
            }
            DistributionStrategy::SingleNode => {
                self.execute_on_single_node(plan).await
            }
        }
    }
    
    fn analyze_query(&self, plan: &PlanNode) -> Result<DistributionStrategy, DbError> {
        match plan {
            PlanNode::Join { .. } => {
                // Use broadcast join for small tables
                Ok(DistributionStrategy::BroadcastJoin)
            }
            PlanNode::Aggregate { group_by, .. } if !group_by.is_empty() => {
                // Use hash partitioning for group by
                Ok(DistributionStrategy::HashPartitioned)
            }
            PlanNode::TableScan { .. } => {
                // Range partition for table scans
                Ok(DistributionStrategy::RangePartitioned)
            }
            _ => Ok(DistributionStrategy::SingleNode),
        }
    }
    
    async fn execute_broadcast_join(&self, _plan: &PlanNode) -> Result<QueryResult, DbError> {
        // 1. Send smaller table to all nodes (broadcast)
        // 2. Partition larger table across nodes
        // 3. Execute local joins on each node
        // 4. Collect and merge results
        
        Ok(QueryResult::empty())
    }
    
    async fn execute_hash_partitioned(&self, _plan: &PlanNode) -> Result<QueryResult, DbError> {
        // 1. Hash partition data across nodes
        // 2. Execute local aggregations on each node
        // 3. Collect partial results
        // 4. Final aggregation on coordinator
        
        Ok(QueryResult::empty())
    }
    
    async fn execute_range_partitioned(&self, _plan: &PlanNode) -> Result<QueryResult, DbError> {
        // 1. Partition data by range
        // 2. Execute on each partition
        // 3. Merge sorted results
        
        Ok(QueryResult::empty())
    }
    
    async fn execute_on_single_node(&self, _plan: &PlanNode) -> Result<QueryResult, DbError> {
        // Select best node and execute there
        let nodes = self.nodes.read();
        if let Some(node) = self.load_balancer.select_node(&nodes) {
            node.execute_query(_plan).await
        } else {
            Err(DbError::Internal("No available nodes".to_string()))
        }
    }
}

/// Distribution strategy
#[derive(Debug, Clone, PartialEq)]
pub enum DistributionStrategy {
    BroadcastJoin,
    HashPartitioned,
    RangePartitioned,
    SingleNode,
}

/// Worker node in the distributed system
pub struct WorkerNode {
    pub id: String,
    pub address: String,
    pub capacity: usize,
    current_load: Arc<RwLock<usize>>,
    status: Arc<RwLock<NodeStatus>>,
}

impl WorkerNode {
    pub fn new(id: String, address: String, capacity: usize) -> Self {
        Self {
            id,
            address,
            capacity,
            current_load: Arc::new(RwLock::new(0)),
            status: Arc::new(RwLock::new(NodeStatus::Active)),
        }
    }
    
    pub async fn execute_query(&self, _plan: &PlanNode) -> Result<QueryResult, DbError> {
        // In real implementation, would send query to remote node
        Ok(QueryResult::empty())
    }
    
    pub fn get_load(&self) -> usize {
        *self.current_load.read()
    }
    
    pub fn is_available(&self) -> bool {
        *self.status.read() == NodeStatus::Active
    }
}

/// Node status
#[derive(Debug, Clone, PartialEq)]
pub enum NodeStatus {
    Active,
    Busy,
    Offline,
    Maintenance,
}

/// Load balancer for distributing work
pub struct LoadBalancer {
    strategy: LoadBalancingStrategy,
}

impl LoadBalancer {
    pub fn new() -> Self {
        Self {
            strategy: LoadBalancingStrategy::RoundRobin,
        }
    }
    
    /// Select node for query execution
    pub fn select_node<'a>(&self, nodes: &'a [WorkerNode]) -> Option<&'a WorkerNode> {
        let available: Vec<_> = nodes.iter().filter(|n| n.is_available()).collect();
        
        if available.is_empty() {
            return None;
        }
        
        match self.strategy {
            LoadBalancingStrategy::RoundRobin => {
                // Simple: select first available
                available.first().copied()
            }
            LoadBalancingStrategy::LeastLoaded => {
                // Select node with least current load
                available
                    .into_iter()
                    .min_by_key(|n| n.get_load())
            }
            LoadBalancingStrategy::Random => {
                // Random selection
                use rand::Rng;
                let mut rng = rand::thread_rng();
                let idx = rng.gen_range(0..available.len());
                available.get(idx).copied()
            }
        }
    }
}

/// Load balancing strategy
#[derive(Debug, Clone)]
pub enum LoadBalancingStrategy {
    RoundRobin,
    LeastLoaded,
    Random,
}

/// Query scheduler for distributed execution
pub struct QueryScheduler {
    queue: Arc<RwLock<Vec<ScheduledQuery>>>,
    max_concurrent: usize,
    semaphore: Arc<Semaphore>,
}

impl QueryScheduler {
    pub fn new() -> Self {
        let max_concurrent = 10;
        Self {
            queue: Arc::new(RwLock::new(Vec::new())),
            max_concurrent,
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
        }
    }
    
    /// Schedule query for execution
    pub async fn schedule(&self, query: ScheduledQuery) -> Result<(), DbError> {
        // Wait for available slot
        let _permit = self.semaphore.acquire().await
            .map_err(|e| DbError::Internal(format!("Semaphore error: {}", e)))?;
        
        // Add to queue
        self.queue.write().push(query);
        
        Ok(())
    }
    
    /// Get next query to execute
    pub fn get_next(&self) -> Option<ScheduledQuery> {
        let mut queue = self.queue.write();
        
        // Sort by priority
        queue.sort_by_key(|q| std::cmp::Reverse(q.priority));
        
        queue.pop()
    }
}

/// Scheduled query with metadata
#[derive(Debug, Clone)]
pub struct ScheduledQuery {
    pub id: String,
    pub plan: PlanNode,
    pub priority: u8,
    pub deadline: Option<std::time::SystemTime>,
}

/// Data shuffler for moving data between nodes
pub struct DataShuffler;

impl DataShuffler {
    /// Shuffle data for hash join
    pub async fn shuffle_for_hash_join(
        data: Vec<Vec<String>>,
        nodes: &[WorkerNode],
        partition_column: usize,
    ) -> Result<HashMap<String, Vec<Vec<String>>>, DbError> {
        let mut partitions: HashMap<String, Vec<Vec<String>>> = HashMap::new();
        
        for row in data {
            if let Some(key_value) = row.get(partition_column) {
                // Hash to determine target node
                let node_idx = Self::hash_to_node(key_value, nodes.len());
                let node_id = &nodes[node_idx].id;
                
                partitions
                    .entry(node_id.clone())
                    .or_insert_with(Vec::new)
                    .push(row);
            }
        }
        
        Ok(partitions)
    }
    
    fn hash_to_node(key: &str, node_count: usize) -> usize {
        use std::hash::{Hash, Hasher};
        use std::collections::hash_map::DefaultHasher;
        
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % node_count
    }
}

/// Fault tolerance manager
pub struct FaultToleranceManager {
    failed_nodes: Arc<RwLock<Vec<String>>>,
    retry_count: usize,
}

impl FaultToleranceManager {
    pub fn new(retry_count: usize) -> Self {
        Self {
            failed_nodes: Arc::new(RwLock::new(Vec::new())),
            retry_count,
        }
    }
    
    /// Mark node as failed
    pub fn mark_failed(&self, node_id: String) {
        self.failed_nodes.write().push(node_id);
    }
    
    /// Check if node is failed
    pub fn is_failed(&self, node_id: &str) -> bool {
        self.failed_nodes.read().contains(&node_id.to_string())
    }
    
    /// Execute with retry on failure
    pub async fn execute_with_retry<F, T>(&self, mut operation: F) -> Result<T, DbError>
    where
        F: FnMut() -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<T, DbError>> + Send>>,
    {
        let mut attempts = 0;
        
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    attempts += 1;
                    if attempts >= self.retry_count {
                        return Err(e);
                    }
                    // Exponential backoff
                    tokio::time::sleep(tokio::time::Duration::from_millis(
                        100 * 2u64.pow(attempts as u32)
                    )).await;
                }
            }
        }
    }
}

/// Result aggregator
pub struct ResultAggregator;

impl ResultAggregator {
    /// Merge results from multiple nodes
    pub fn merge_results(results: Vec<QueryResult>) -> QueryResult {
        if results.is_empty() {
            return QueryResult::empty();
        }
        
        let columns = results[0].columns.clone();
        let mut all_rows = Vec::new();
        
        for result in results {
            all_rows.extend(result.rows);
        }
        
        QueryResult::new(columns, all_rows)
    }
    
    /// Aggregate distributed aggregations
    pub fn aggregate_partial_results(
        results: Vec<QueryResult>,
        aggregation_type: AggregationType,
    ) -> QueryResult {
        match aggregation_type {
            AggregationType::Count => Self::aggregate_count(results),
            AggregationType::Sum => Self::aggregate_sum(results),
            AggregationType::Avg => Self::aggregate_avg(results),
            AggregationType::Min => Self::aggregate_min(results),
            AggregationType::Max => Self::aggregate_max(results),
        }
    }
    
    fn aggregate_count(results: Vec<QueryResult>) -> QueryResult {
        let total: i64 = results
            .iter()
            .filter_map(|r| r.rows.first())
            .filter_map(|row| row.first())
            .filter_map(|val| val.parse::<i64>().ok())
            .sum();
        
        QueryResult::new(
            vec!["count".to_string()],
            vec![vec![total.to_string()]],
        )
    }
    
    fn aggregate_sum(results: Vec<QueryResult>) -> QueryResult {
        let total: f64 = results
            .iter()
            .filter_map(|r| r.rows.first())
            .filter_map(|row| row.first())
            .filter_map(|val| val.parse::<f64>().ok())
            .sum();
        
        QueryResult::new(
            vec!["sum".to_string()],
            vec![vec![total.to_string()]],
        )
    }
    
    fn aggregate_avg(results: Vec<QueryResult>) -> QueryResult {
        // Each node returns (sum, count), we need to combine them
        let mut total_sum = 0.0;
        let mut total_count = 0i64;
        
        for result in results {
            if let Some(row) = result.rows.first() {
                if row.len() >= 2 {
                    if let (Ok(sum), Ok(count)) = (
                        row[0].parse::<f64>(),
                        row[1].parse::<i64>(),
                    ) {
                        total_sum += sum;
                        total_count += count;
                    }
                }
            }
        }
        
        let avg = if total_count > 0 {
            total_sum / total_count as f64
        } else {
            0.0
        };
        
        QueryResult::new(
            vec!["avg".to_string()],
            vec![vec![avg.to_string()]],
        )
    }
    
    fn aggregate_min(results: Vec<QueryResult>) -> QueryResult {
        let min = results
            .iter()
            .filter_map(|r| r.rows.first())
            .filter_map(|row| row.first())
            .cloned()
            .min();
        
        QueryResult::new(
            vec!["min".to_string()],
            vec![vec![min.unwrap_or_default()]],
        )
    }
    
    fn aggregate_max(results: Vec<QueryResult>) -> QueryResult {
        let max = results
            .iter()
            .filter_map(|r| r.rows.first())
            .filter_map(|row| row.first())
            .cloned()
            .max();
        
        QueryResult::new(
            vec!["max".to_string()],
            vec![vec![max.unwrap_or_default()]],
        )
    }
}

/// Aggregation type
#[derive(Debug, Clone, PartialEq)]
pub enum AggregationType {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

/// Distributed transaction coordinator (2PC)
pub struct DistributedTransactionCoordinator {
    participants: Vec<String>,
    state: Arc<RwLock<TransactionState>>,
}

impl DistributedTransactionCoordinator {
    pub fn new(participants: Vec<String>) -> Self {
        Self {
            participants,
            state: Arc::new(RwLock::new(TransactionState::Init)),
        }
    }
    
    /// Execute two-phase commit
    pub async fn commit_2pc(&self) -> Result<(), DbError> {
        // Phase 1: Prepare
        *self.state.write() = TransactionState::Preparing;
        
        for participant in &self.participants {
            if !self.send_prepare(participant).await? {
                // Abort if any participant cannot prepare
                self.abort().await?;
                return Err(DbError::InvalidOperation(
                    "Transaction aborted: participant cannot prepare".to_string()
                ));
            }
        }
        
        // Phase 2: Commit
        *self.state.write() = TransactionState::Committing;
        
        for participant in &self.participants {
            self.send_commit(participant).await?;
        }
        
        *self.state.write() = TransactionState::Committed;
        Ok(())
    }
    
    async fn send_prepare(&self, participant: &str) -> Result<bool, DbError> {
        // Would send prepare message to participant node
        Ok(true)
    }
    
    async fn send_commit(&self, participant: &str) -> Result<(), DbError> {
        // Would send commit message to participant node
        Ok(())
    }
    
    async fn abort(&self) -> Result<(), DbError> {
        *self.state.write() = TransactionState::Aborted;
        
        for participant in &self.participants {
            self.send_abort(participant).await?;
        }
        
        Ok(())
    }
    
    async fn send_abort(&self, participant: &str) -> Result<(), DbError> {
        // Would send abort message to participant node
        Ok(())
    }
}

/// Transaction state in 2PC
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionState {
    Init,
    Preparing,
    Committing,
    Committed,
    Aborted,
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_load_balancer() {
        let lb = LoadBalancer::new();
        
        let nodes = vec![
            WorkerNode::new("node1".to_string(), "localhost:5001".to_string(), 100),
            WorkerNode::new("node2".to_string(), "localhost:5002".to_string(), 100),
        ];
        
        let selected = lb.select_node(&nodes);
        assert!(selected.is_some());
    }
    
    #[test]
    fn test_result_aggregation() {
        let results = vec![
            QueryResult::new(vec!["count".to_string()], vec![vec!["10".to_string()]]),
            QueryResult::new(vec!["count".to_string()], vec![vec!["20".to_string()]]),
            QueryResult::new(vec!["count".to_string()], vec![vec!["30".to_string()]]),
        ];
        
        let aggregated = ResultAggregator::aggregate_partial_results(
            results,
            AggregationType::Count,
        );
        
        assert_eq!(aggregated.rows[0][0], "60");
    }
    
    #[test]
    fn test_fault_tolerance() {
        let ft = FaultToleranceManager::new(3);
        
        ft.mark_failed("node1".to_string());
        assert!(ft.is_failed("node1"));
        assert!(!ft.is_failed("node2"));
    }
}


