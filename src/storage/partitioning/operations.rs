// Partition Operations - Auto-management, Partition-wise, Dynamic

use super::types::*;
use crate::error::{DbError, Result};
use std::collections::HashMap;
use std::time::{Duration, SystemTime};

// ============================================================================
// Automatic Partition Management
// ============================================================================

// Automatic partition creator
pub struct AutoPartitionCreator {
    config: AutoPartitionConfig,
    created_partitions: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct AutoPartitionConfig {
    pub partition_interval: PartitionInterval,
    pub advance_partitions: usize,
    pub retention_period: Option<Duration>,
}

#[derive(Debug, Clone)]
pub enum PartitionInterval {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    Custom(Duration),
}

impl AutoPartitionCreator {
    pub fn new(config: AutoPartitionConfig) -> Self {
        Self {
            config,
            created_partitions: HashMap::new(),
        }
    }

    pub fn create_partitions_for_range(
        &mut self,
        table: String,
        start_date: SystemTime,
        end_date: SystemTime,
    ) -> Result<Vec<String>> {
        let mut partitions = Vec::new();
        let mut current = start_date;

        while current < end_date {
            let partition_name = self.generate_partition_name(&table, current);
            partitions.push(partition_name.clone());
            current = self.advance_time(current);
        }

        self.created_partitions.insert(table, partitions.clone());
        Ok(partitions)
    }

    fn generate_partition_name(&self, table: &str, time: SystemTime) -> String {
        let duration_since_epoch = time.duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        let days = duration_since_epoch.as_secs() / 86400;

        match self.config.partition_interval {
            PartitionInterval::Daily => format!("{}_p_day_{}", table, days),
            PartitionInterval::Monthly => format!("{}_p_month_{}", table, days / 30),
            _ => format!("{}_p_{}", table, days),
        }
    }

    fn advance_time(&self, time: SystemTime) -> SystemTime {
        let advance_duration = match self.config.partition_interval {
            PartitionInterval::Daily => Duration::from_secs(86400),
            PartitionInterval::Weekly => Duration::from_secs(86400 * 7),
            PartitionInterval::Monthly => Duration::from_secs(86400 * 30),
            PartitionInterval::Yearly => Duration::from_secs(86400 * 365),
            PartitionInterval::Custom(d) => d,
        };

        time + advance_duration
    }

    pub fn archive_old_partitions(
        &mut self,
        table: &str,
        current_time: SystemTime,
    ) -> Vec<String> {
        let mut to_archive = Vec::new();

        if let Some(retention) = self.config.retention_period {
            if let Some(partitions) = self.created_partitions.get(table) {
                let cutoff_time = current_time - retention;

                for partition in partitions {
                    if self.partition_older_than(partition, cutoff_time) {
                        to_archive.push(partition.clone());
                    }
                }
            }
        }

        to_archive
    }

    fn partition_older_than(&self, _partition: &str, _cutoff: SystemTime) -> bool {
        false // Placeholder
    }
}

// Partition maintenance scheduler
pub struct PartitionMaintenanceScheduler {
    tasks: Vec<MaintenanceTask>,
    last_run: HashMap<String, SystemTime>,
}

#[derive(Debug, Clone)]
pub struct MaintenanceTask {
    pub task_type: MaintenanceTaskType,
    pub table: String,
    pub schedule: MaintenanceSchedule,
}

#[derive(Debug, Clone)]
pub enum MaintenanceTaskType {
    AnalyzeStatistics,
    VacuumPartition,
    ReindexPartition,
    ArchivePartition,
    CompactPartition,
}

#[derive(Debug, Clone)]
pub enum MaintenanceSchedule {
    Daily,
    Weekly,
    Monthly,
    Interval(Duration),
}

impl PartitionMaintenanceScheduler {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            last_run: HashMap::new(),
        }
    }

    pub fn add_task(&mut self, task: MaintenanceTask) {
        self.tasks.push(task);
    }

    pub fn get_due_tasks(&self, current_time: SystemTime) -> Vec<&MaintenanceTask> {
        self.tasks
            .iter()
            .filter(|task| self.is_task_due(task, current_time))
            .collect()
    }

    fn is_task_due(&self, task: &MaintenanceTask, current_time: SystemTime) -> bool {
        let task_key = format!("{}:{:?}", task.table, task.task_type);

        if let Some(&last_run) = self.last_run.get(&task_key) {
            let interval = match &task.schedule {
                MaintenanceSchedule::Daily => Duration::from_secs(86400),
                MaintenanceSchedule::Weekly => Duration::from_secs(86400 * 7),
                MaintenanceSchedule::Monthly => Duration::from_secs(86400 * 30),
                MaintenanceSchedule::Interval(d) => *d,
            };

            current_time.duration_since(last_run).unwrap_or(Duration::ZERO) >= interval
        } else {
            true
        }
    }

    pub fn mark_task_run(&mut self, task: &MaintenanceTask, run_time: SystemTime) {
        let task_key = format!("{}:{:?}", task.table, task.task_type);
        self.last_run.insert(task_key, run_time);
    }
}

impl Default for PartitionMaintenanceScheduler {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Partition-Wise Operations
// ============================================================================

pub struct PartitionWiseJoinExecutor {
    parallelism: usize,
}

impl PartitionWiseJoinExecutor {
    pub fn new(parallelism: usize) -> Self {
        Self { parallelism }
    }

    pub fn execute_join(
        &self,
        _left_table: &str,
        _right_table: &str,
        left_partitions: &[String],
        right_partitions: &[String],
        _join_condition: &str,
    ) -> Result<JoinResult> {
        if left_partitions.len() != right_partitions.len() {
            return Err(DbError::InvalidOperation(
                "Partition counts must match for partition-wise join".to_string()
            ));
        }

        let results = Vec::new();
        Ok(JoinResult {
            partition_results: results,
            total_rows: 0,
        })
    }
}

#[derive(Debug)]
pub struct JoinResult {
    pub partition_results: Vec<PartitionJoinResult>,
    pub total_rows: usize,
}

#[derive(Debug)]
pub struct PartitionJoinResult {
    pub rows: Vec<Vec<String>>,
}

pub struct PartitionWiseAggregator {
    buffer_size: usize,
}

impl PartitionWiseAggregator {
    pub fn new(buffer_size: usize) -> Self {
        Self { buffer_size }
    }

    pub fn aggregate(
        &self,
        _table: &str,
        _partitions: &[String],
        _aggregate_functions: &[AggregateFunction],
        _group_by: &[String],
    ) -> Result<AggregateResult> {
        Ok(AggregateResult {
            groups: HashMap::new(),
        })
    }
}

#[derive(Debug, Clone)]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

#[derive(Debug)]
pub struct PartitionAggregate {
    pub groups: HashMap<String, Vec<f64>>,
}

#[derive(Debug)]
pub struct AggregateResult {
    pub groups: HashMap<String, Vec<f64>>,
}

// ============================================================================
// Dynamic Partition Operations
// ============================================================================

pub struct DynamicPartitionSplitter;

impl DynamicPartitionSplitter {
    pub fn split_partition(
        table: &str,
        partition: &str,
        split_points: Vec<String>,
    ) -> Result<Vec<String>> {
        let mut new_partitions = Vec::new();

        for (i, _split_point) in split_points.iter().enumerate() {
            let new_partition_name = format!("{}_{}_split_{}", table, partition, i);
            new_partitions.push(new_partition_name);
        }

        Ok(new_partitions)
    }

    pub fn should_split(stats: &PartitionStatistics, max_size_mb: usize) -> bool {
        stats.data_size > max_size_mb * 1024 * 1024
    }
}

pub struct DynamicPartitionMerger;

impl DynamicPartitionMerger {
    pub fn merge_partitions(
        table: &str,
        partitions: &[String],
    ) -> Result<String> {
        let merged_name = format!("{}_merged_{}", table, partitions.len());
        Ok(merged_name)
    }

    pub fn should_merge(stats_list: &[&PartitionStatistics], min_size_mb: usize) -> bool {
        let total_size: usize = stats_list.iter().map(|s| s.data_size).sum();
        total_size < min_size_mb * 1024 * 1024
    }
}

pub struct PartitionReorganizer {
    target_partition_size: usize,
}

impl PartitionReorganizer {
    pub fn new(target_size_mb: usize) -> Self {
        Self {
            target_partition_size: target_size_mb * 1024 * 1024,
        }
    }

    pub fn reorganize(
        &self,
        _table: &str,
        current_partitions: &[(String, PartitionStatistics)],
    ) -> Result<ReorganizationPlan> {
        let mut plan = ReorganizationPlan {
            splits: Vec::new(),
            merges: Vec::new(),
            unchanged: Vec::new(),
        };

        for (partition, stats) in current_partitions {
            if stats.data_size > self.target_partition_size * 2 {
                plan.splits.push(partition.clone());
            } else if stats.data_size < self.target_partition_size / 2 {
                plan.merges.push(partition.clone());
            } else {
                plan.unchanged.push(partition.clone());
            }
        }

        Ok(plan)
    }
}

#[derive(Debug)]
pub struct ReorganizationPlan {
    pub splits: Vec<String>,
    pub merges: Vec<String>,
    pub unchanged: Vec<String>,
}
