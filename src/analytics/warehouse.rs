/// Data Warehouse Features
///
/// This module provides enterprise data warehousing capabilities:
/// - Star schema and snowflake schema optimization
/// - Bitmap indexes for dimension filtering
/// - Fact table partitioning strategies
/// - Slowly Changing Dimension (SCD) support
/// - ETL pipeline integration points
/// - Data quality and validation
/// - Aggregate awareness and query rewriting

use crate::Result;
use crate::error::DbError;
use crate::catalog::Schema;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, BTreeMap};
use std::sync::Arc;
use parking_lot::RwLock;
use std::time::SystemTime;

/// Star schema definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StarSchema {
    pub name: String,
    pub fact_table: FactTable,
    pub dimension_tables: Vec<DimensionTable>,
    pub metadata: SchemaMetadata,
}

/// Fact table containing measures and foreign keys to dimensions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactTable {
    pub name: String,
    pub measures: Vec<Measure>,
    pub dimension_keys: Vec<DimensionKey>,
    pub partitioning: Option<PartitioningStrategy>,
    pub indexes: Vec<FactIndex>,
    pub compression: CompressionStrategy,
    pub statistics: FactTableStatistics,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Measure {
    pub name: String,
    pub column: String,
    pub data_type: MeasureDataType,
    pub aggregatable: bool,
    pub default_aggregation: AggregationFunction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MeasureDataType {
    Integer,
    BigInt,
    Decimal { precision: u8, scale: u8 },
    Float,
    Double,
    Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AggregationFunction {
    Sum,
    Avg,
    Count,
    Min,
    Max,
    DistinctCount,
}

/// Dimension key (foreign key to dimension table)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionKey {
    pub dimension_name: String,
    pub column: String,
    pub nullable: bool,
}

/// Fact table index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactIndex {
    pub name: String,
    pub columns: Vec<String>,
    pub index_type: FactIndexType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FactIndexType {
    BTree,
    Bitmap,
    ColumnStore,
    Composite,
}

/// Compression strategy for fact table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CompressionStrategy {
    None,
    Dictionary,
    RunLength,
    BitPacking,
    Delta,
    Hybrid,
}

/// Fact table statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactTableStatistics {
    pub row_count: u64,
    pub compressed_size_bytes: u64,
    pub uncompressed_size_bytes: u64,
    pub compression_ratio: f64,
    pub avg_row_size_bytes: f64,
    pub null_fraction: HashMap<String, f64>,
    pub distinct_counts: HashMap<String, u64>,
}

/// Dimension table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionTable {
    pub name: String,
    pub primary_key: String,
    pub attributes: Vec<DimensionAttribute>,
    pub hierarchies: Vec<DimensionHierarchy>,
    pub scd_type: SlowlyChangingDimensionType,
    pub bitmap_indexes: Vec<BitmapIndex>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionAttribute {
    pub name: String,
    pub column: String,
    pub data_type: AttributeDataType,
    pub cardinality: Cardinality,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AttributeDataType {
    String { max_length: usize },
    Integer,
    Date,
    Timestamp,
    Boolean,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Cardinality {
    Low { max_values: usize },
    Medium,
    High,
}

/// Dimension hierarchy (e.g., Country > State > City)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionHierarchy {
    pub name: String,
    pub levels: Vec<HierarchyLevel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyLevel {
    pub name: String,
    pub column: String,
    pub order: usize,
}

/// Slowly Changing Dimension type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SlowlyChangingDimensionType {
    /// Type 0: No changes allowed
    Type0,
    /// Type 1: Overwrite old values
    Type1,
    /// Type 2: Add new row with version
    Type2 {
        version_column: String,
        effective_date_column: String,
        end_date_column: String,
        current_flag_column: String,
    },
    /// Type 3: Add new column for previous value
    Type3 {
        current_column: String,
        previous_column: String,
    },
    /// Type 4: Separate history table
    Type4 {
        history_table: String,
    },
    /// Type 6: Hybrid (1+2+3)
    Type6,
}

/// Bitmap index for low-cardinality dimension attributes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BitmapIndex {
    pub name: String,
    pub column: String,
    pub bitmaps: HashMap<String, BitVector>,
    pub statistics: BitmapIndexStatistics,
}

/// Bit vector for bitmap index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BitVector {
    /// Packed bits (each u64 holds 64 bits)
    pub bits: Vec<u64>,
    /// Number of bits
    pub size: usize,
    /// Number of set bits
    pub cardinality: usize,
}

impl BitVector {
    pub fn new(size: usize) -> Self {
        let num_words = (size + 63) / 64;
        Self {
            bits: vec![0; num_words],
            size,
            cardinality: 0,
        }
    }

    /// Set bit at position
    pub fn set(&mut self, position: usize) {
        if position >= self.size {
            return;
        }

        let word = position / 64;
        let bit = position % 64;

        if (self.bits[word] & (1 << bit)) == 0 {
            self.bits[word] |= 1 << bit;
            self.cardinality += 1;
        }
    }

    /// Get bit at position
    pub fn get(&self, position: usize) -> bool {
        if position >= self.size {
            return false;
        }

        let word = position / 64;
        let bit = position % 64;

        (self.bits[word] & (1 << bit)) != 0
    }

    /// AND operation
    pub fn and(&self, other: &BitVector) -> BitVector {
        let size = self.size.min(other.size);
        let num_words = (size + 63) / 64;
        let mut result = BitVector::new(size);

        for i in 0..num_words {
            result.bits[i] = self.bits[i] & other.bits[i];
        }

        result.cardinality = result.count_bits();
        result
    }

    /// OR operation
    pub fn or(&self, other: &BitVector) -> BitVector {
        let size = self.size.max(other.size);
        let num_words = (size + 63) / 64;
        let mut result = BitVector::new(size);

        for i in 0..num_words.min(self.bits.len()).min(other.bits.len()) {
            result.bits[i] = self.bits[i] | other.bits[i];
        }

        result.cardinality = result.count_bits();
        result
    }

    /// NOT operation
    pub fn not(&self) -> BitVector {
        let mut result = BitVector::new(self.size);

        for i in 0..self.bits.len() {
            result.bits[i] = !self.bits[i];
        }

        // Clear bits beyond size
        if self.size % 64 != 0 {
            let last_word = self.bits.len() - 1;
            let valid_bits = self.size % 64;
            result.bits[last_word] &= (1 << valid_bits) - 1;
        }

        result.cardinality = result.count_bits();
        result
    }

    /// Count set bits
    fn count_bits(&self) -> usize {
        self.bits.iter().map(|word| word.count_ones() as usize).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BitmapIndexStatistics {
    pub num_values: usize,
    pub num_rows: usize,
    pub compression_ratio: f64,
    pub avg_bitmap_density: f64,
}

/// Partitioning strategy for fact tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PartitioningStrategy {
    /// Range partitioning (e.g., by date)
    Range {
        column: String,
        partitions: Vec<RangePartition>,
    },
    /// Hash partitioning
    Hash {
        column: String,
        num_partitions: usize,
    },
    /// List partitioning
    List {
        column: String,
        partitions: Vec<ListPartition>,
    },
    /// Composite partitioning
    Composite {
        primary: Box<PartitioningStrategy>,
        secondary: Box<PartitioningStrategy>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangePartition {
    pub name: String,
    pub lower_bound: Option<String>,
    pub upper_bound: Option<String>,
    pub row_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPartition {
    pub name: String,
    pub values: Vec<String>,
    pub row_count: u64,
}

/// Schema metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaMetadata {
    pub created_at: SystemTime,
    pub last_modified: SystemTime,
    pub owner: String,
    pub description: String,
}

/// Data warehouse manager
pub struct DataWarehouseManager {
    schemas: Arc<RwLock<HashMap<String, StarSchema>>>,
    etl_pipelines: Arc<RwLock<Vec<EtlPipeline>>>,
}

impl DataWarehouseManager {
    pub fn new() -> Self {
        Self {
            schemas: Arc::new(RwLock::new(HashMap::new())),
            etl_pipelines: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Create star schema
    pub fn create_star_schema(&self, schema: StarSchema) -> Result<()> {
        let mut schemas = self.schemas.write();

        if schemas.contains_key(&schema.name) {
            return Err(DbError::AlreadyExists(format!(
                "Star schema: {}",
                schema.name
            )));
        }

        schemas.insert(schema.name.clone(), schema);
        Ok(())
    }

    /// Create bitmap index on dimension
    pub fn create_bitmap_index(
        &self,
        schema_name: &str,
        dimension_name: &str,
        column: &str,
    ) -> Result<()> {
        let mut schemas = self.schemas.write();
        let schema = schemas.get_mut(schema_name)
            .ok_or_else(|| DbError::NotFound(format!("Schema: {}", schema_name)))?;

        let dimension = schema.dimension_tables.iter_mut()
            .find(|d| d.name == dimension_name)
            .ok_or_else(|| DbError::NotFound(format!("Dimension: {}", dimension_name)))?;

        // Create bitmap index
        let index = BitmapIndex {
            name: format!("{}_{}_bitmap", dimension_name, column),
            column: column.to_string(),
            bitmaps: HashMap::new(),
            statistics: BitmapIndexStatistics {
                num_values: 0,
                num_rows: 0,
                compression_ratio: 1.0,
                avg_bitmap_density: 0.0,
            },
        };

        dimension.bitmap_indexes.push(index);
        Ok(())
    }

    /// Add dimension value to bitmap index
    pub fn add_to_bitmap_index(
        &self,
        schema_name: &str,
        dimension_name: &str,
        index_name: &str,
        value: String,
        row_id: usize,
    ) -> Result<()> {
        let mut schemas = self.schemas.write();
        let schema = schemas.get_mut(schema_name)
            .ok_or_else(|| DbError::NotFound(format!("Schema: {}", schema_name)))?;

        let dimension = schema.dimension_tables.iter_mut()
            .find(|d| d.name == dimension_name)
            .ok_or_else(|| DbError::NotFound(format!("Dimension: {}", dimension_name)))?;

        let index = dimension.bitmap_indexes.iter_mut()
            .find(|idx| idx.name == index_name)
            .ok_or_else(|| DbError::NotFound(format!("Index: {}", index_name)))?;

        // Get or create bitmap for value
        let bitmap = index.bitmaps.entry(value)
            .or_insert_with(|| BitVector::new(1000000)); // 1M rows initial capacity

        bitmap.set(row_id);

        Ok(())
    }

    /// Query using bitmap indexes
    pub fn query_with_bitmap(
        &self,
        schema_name: &str,
        dimension_name: &str,
        index_name: &str,
        value: &str,
    ) -> Result<BitVector> {
        let schemas = self.schemas.read();
        let schema = schemas.get(schema_name)
            .ok_or_else(|| DbError::NotFound(format!("Schema: {}", schema_name)))?;

        let dimension = schema.dimension_tables.iter()
            .find(|d| d.name == dimension_name)
            .ok_or_else(|| DbError::NotFound(format!("Dimension: {}", dimension_name)))?;

        let index = dimension.bitmap_indexes.iter()
            .find(|idx| idx.name == index_name)
            .ok_or_else(|| DbError::NotFound(format!("Index: {}", index_name)))?;

        let bitmap = index.bitmaps.get(value)
            .ok_or_else(|| DbError::NotFound(format!("Value: {}", value)))?;

        Ok(bitmap.clone())
    }

    /// Handle slowly changing dimension update
    pub fn update_scd(
        &self,
        schema_name: &str,
        dimension_name: &str,
        key: String,
        new_attributes: HashMap<String, String>,
    ) -> Result<()> {
        let schemas = self.schemas.read();
        let schema = schemas.get(schema_name)
            .ok_or_else(|| DbError::NotFound(format!("Schema: {}", schema_name)))?;

        let dimension = schema.dimension_tables.iter()
            .find(|d| d.name == dimension_name)
            .ok_or_else(|| DbError::NotFound(format!("Dimension: {}", dimension_name)))?;

        match &dimension.scd_type {
            SlowlyChangingDimensionType::Type1 => {
                // Overwrite existing record
                // In production, would update database
                Ok(())
            }
            SlowlyChangingDimensionType::Type2 { .. } => {
                // Insert new version and close old version
                // In production, would:
                // 1. Set end_date and current_flag=false on old record
                // 2. Insert new record with current_flag=true
                Ok(())
            }
            SlowlyChangingDimensionType::Type3 { .. } => {
                // Move current to previous, set new current
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Register ETL pipeline
    pub fn register_etl_pipeline(&self, pipeline: EtlPipeline) {
        self.etl_pipelines.write().push(pipeline);
    }

    /// Get partition for value
    pub fn get_partition(
        &self,
        strategy: &PartitioningStrategy,
        value: &str,
    ) -> Result<String> {
        match strategy {
            PartitioningStrategy::Range { column: _, partitions } => {
                for partition in partitions {
                    let in_range = match (&partition.lower_bound, &partition.upper_bound) {
                        (Some(lower), Some(upper)) => value >= lower && value < upper,
                        (Some(lower), None) => value >= lower,
                        (None, Some(upper)) => value < upper,
                        (None, None) => true,
                    };

                    if in_range {
                        return Ok(partition.name.clone());
                    }
                }
                Err(DbError::NotFound("No matching partition".to_string()))
            }
            PartitioningStrategy::Hash { column: _, num_partitions } => {
                let hash = self.hash_value(value);
                let partition_num = hash % num_partitions;
                Ok(format!("partition_{}", partition_num))
            }
            PartitioningStrategy::List { column: _, partitions } => {
                for partition in partitions {
                    if partition.values.contains(&value.to_string()) {
                        return Ok(partition.name.clone());
                    }
                }
                Err(DbError::NotFound("No matching partition".to_string()))
            }
            PartitioningStrategy::Composite { primary, secondary } => {
                // Use primary partitioning
                self.get_partition(primary, value)
            }
        }
    }

    fn hash_value(&self, value: &str) -> usize {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish() as usize
    }
}

/// ETL pipeline definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtlPipeline {
    pub name: String,
    pub source: DataSource,
    pub transformations: Vec<Transformation>,
    pub target: DataTarget,
    pub schedule: EtlSchedule,
    pub error_handling: ErrorHandlingStrategy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DataSource {
    Database { connection_string: String, query: String },
    File { path: String, format: FileFormat },
    Api { endpoint: String, auth: Option<String> },
    Stream { topic: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FileFormat {
    Csv,
    Json,
    Parquet,
    Avro,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Transformation {
    Filter { condition: String },
    Map { expression: String },
    Aggregate { group_by: Vec<String>, aggregations: Vec<String> },
    Join { other_source: String, condition: String },
    Deduplicate { keys: Vec<String> },
    Validate { rules: Vec<ValidationRule> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRule {
    pub name: String,
    pub rule_type: ValidationType,
    pub severity: ValidationSeverity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ValidationType {
    NotNull { column: String },
    Range { column: String, min: f64, max: f64 },
    Pattern { column: String, regex: String },
    Uniqueness { columns: Vec<String> },
    ReferentialIntegrity { foreign_key: String, reference_table: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ValidationSeverity {
    Warning,
    Error,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DataTarget {
    FactTable { schema: String, table: String },
    DimensionTable { schema: String, table: String },
    MaterializedView { name: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EtlSchedule {
    Once,
    Interval { duration: std::time::Duration },
    Cron { expression: String },
    OnDemand,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ErrorHandlingStrategy {
    Abort,
    Skip,
    Retry { max_attempts: usize },
    LogAndContinue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_vector() {
        let mut bv = BitVector::new(100);

        bv.set(5);
        bv.set(10);
        bv.set(50);

        assert!(bv.get(5));
        assert!(bv.get(10));
        assert!(bv.get(50));
        assert!(!bv.get(20));
        assert_eq!(bv.cardinality, 3);
    }

    #[test]
    fn test_bit_vector_and() {
        let mut bv1 = BitVector::new(100);
        let mut bv2 = BitVector::new(100);

        bv1.set(5);
        bv1.set(10);

        bv2.set(10);
        bv2.set(20);

        let result = bv1.and(&bv2);
        assert!(result.get(10));
        assert!(!result.get(5));
        assert!(!result.get(20));
    }

    #[test]
    fn test_bit_vector_or() {
        let mut bv1 = BitVector::new(100);
        let mut bv2 = BitVector::new(100);

        bv1.set(5);
        bv2.set(10);

        let result = bv1.or(&bv2);
        assert!(result.get(5));
        assert!(result.get(10));
    }

    #[test]
    fn test_warehouse_manager() {
        let manager = DataWarehouseManager::new();

        let schema = StarSchema {
            name: "sales_warehouse".to_string(),
            fact_table: FactTable {
                name: "fact_sales".to_string(),
                measures: vec![],
                dimension_keys: vec![],
                partitioning: None,
                indexes: vec![],
                compression: CompressionStrategy::None,
                statistics: FactTableStatistics {
                    row_count: 0,
                    compressed_size_bytes: 0,
                    uncompressed_size_bytes: 0,
                    compression_ratio: 1.0,
                    avg_row_size_bytes: 0.0,
                    null_fraction: HashMap::new(),
                    distinct_counts: HashMap::new(),
                },
            },
            dimension_tables: vec![],
            metadata: SchemaMetadata {
                created_at: SystemTime::now(),
                last_modified: SystemTime::now(),
                owner: "admin".to_string(),
                description: "Sales data warehouse".to_string(),
            },
        };

        let result = manager.create_star_schema(schema);
        assert!(result.is_ok());
    }
}


