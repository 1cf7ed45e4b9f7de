//! # Large Object Allocator Implementation
//! 
//! This module provides a specialized allocator for large memory allocations that exceed
//! the limits of the slab allocator. It uses memory mapping (mmap) for efficient handling
//! of huge allocations with support for huge pages, direct allocation, and specialized
//! tracking for memory-intensive operations.
//! 
//! ## Key Features
//! 
//! - **Memory Mapping**: Direct mmap/munmap for large allocations
//! - **Huge Page Support**: 2MB and 1GB huge pages for better TLB efficiency
//! - **Zero-Copy Operations**: Efficient handling of large data structures
//! - **Memory Advice**: Platform-specific memory behavior hints
//! - **Allocation Tracking**: Comprehensive tracking of large allocations
//! - **Memory Prefaulting**: Optional prefaulting for predictable access patterns
//! - **Statistics Collection**: Detailed metrics for large object usage
//! 
//! ## Design Overview
//! 
//! The large object allocator is designed for allocations that are typically
//! too large for efficient slab allocation. It provides direct memory mapping
//! with optional huge page support for improved performance.
//! 
//! ### Allocation Strategies
//! 
//! - **Direct mmap**: For allocations above threshold size
//! - **Huge Pages**: Automatic huge page usage for eligible allocations
//! - **Memory Advice**: Performance hints like MADV_SEQUENTIAL, MADV_RANDOM
//! - **Prefaulting**: Optional page prefaulting for known access patterns
//! 
//! ### Memory Management
//! 
//! - **Allocation Registry**: Tracks all active large allocations
//! - **Memory Statistics**: Per-allocation and global metrics
//! - **Memory Pressure**: Integration with global memory pressure monitoring
//! - **Cleanup**: Automatic cleanup of unused allocations
//! 
//! ## Usage Example
//! 
//! ```rust
//! use crate::memory::large_object::*;
//! use crate::memory::types::*;
//! 
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Create large object allocator
//! let config = LargeObjectConfig::default();
//! let allocator = LargeObjectAllocator::new(config).await?;
//! 
//! // Allocate a large buffer (1MB)
//! let allocation_source = AllocationSource::Query {
//!     query_id: "SELECT_001".to_string(),
//!     operation: "sort_buffer".to_string(),
//! };
//! 
//! let ptr = allocator.allocate(
//!     1024 * 1024, // 1MB
//!     4096,         // Page aligned
//!     allocation_source,
//!     true,         // Enable huge pages
//! ).await?;
//! 
//! // Use the allocated memory for large operations
//! unsafe {
//!     std::ptr::write_bytes(ptr.ptr.as_ptr(), 0x42, ptr.size);
//! }
//! 
//! // Apply memory advice for sequential access
//! allocator.apply_memory_advice(&ptr.allocation_id, MemoryAdvice::Sequential).await?;
//! 
//! // Get allocation info
//! let info = allocator.get_allocation_info(&ptr.allocation_id).await?;
//! println!("Allocation size: {} bytes, huge pages: {}", info.size, info.uses_huge_pages);
//! 
//! // Deallocate when done
//! allocator.deallocate(ptr.allocation_id).await?;
//! 
//! // Get statistics
//! let _stats = allocator.get_statistics().await;
//! println!("Total large allocations: {}", stats.total_allocations);
//! # Ok(())
//! # }
//! ```

use crate::memory::types::*;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration};
use thiserror::Error;
use tokio::sync::RwLock as AsyncRwLock;
use uuid::Uuid;

#[cfg(unix)]
use libc::{mmap, munmap, madvise, MAP_ANONYMOUS, MAP_PRIVATE, PROT_READ, PROT_WRITE, MAP_FAILED};

/// Large object allocator specific errors
#[derive(Error, Debug)]
pub enum LargeObjectError {
    #[error("mmap allocation failed: {reason}")]
    MmapFailed { reason: String },
    
    #[error("munmap deallocation failed: {reason}")]
    MunmapFailed { reason: String },
    
    #[error("Large allocation not found: {allocation_id}")]
    AllocationNotFound { allocation_id: String },
    
    #[error("Huge page allocation failed: {reason}")]
    HugePageFailed { reason: String },
    
    #[error("Memory advice failed: {reason}")]
    MemoryAdviceFailed { reason: String },
    
    #[error("Allocation too small for large object allocator: {size} bytes")]
    AllocationTooSmall { size: usize },
    
    #[error("Platform not supported for operation: {operation}")]
    PlatformNotSupported { operation: String },
    
    #[error("Memory prefaulting failed: {reason}")]
    PrefaultFailed { reason: String },
}

/// Memory advice types for large allocations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryAdvice {
    /// Normal access pattern
    Normal,
    /// Sequential access pattern
    Sequential,
    /// Random access pattern
    Random,
    /// Will be needed soon
    WillNeed,
    /// Won't be needed
    DontNeed,
    /// Don't fork on copy
    DontFork,
    /// Do fork on copy
    DoFork,
    /// Mergeable pages
    Mergeable,
    /// Unmergeable pages
    Unmergeable,
    /// Hugepage allocation
    Hugepage,
    /// No hugepage allocation
    NoHugepage,
}

impl MemoryAdvice {
    /// Converts to platform-specific madvise constant
    #[cfg(unix)]
    fn to_madvise_flag(self) -> libc::c_int {
        match self {
            MemoryAdvice::Normal => libc::MADV_NORMAL,
            MemoryAdvice::Sequential => libc::MADV_SEQUENTIAL,
            MemoryAdvice::Random => libc::MADV_RANDOM,
            MemoryAdvice::WillNeed => libc::MADV_WILLNEED,
            MemoryAdvice::DontNeed => libc::MADV_DONTNEED,
            #[cfg(target_os = "linux")]
            MemoryAdvice::DontFork => libc::MADV_DONTFORK,
            #[cfg(target_os = "linux")]
            MemoryAdvice::DoFork => libc::MADV_DOFORK,
            #[cfg(target_os = "linux")]
            MemoryAdvice::Mergeable => libc::MADV_MERGEABLE,
            #[cfg(target_os = "linux")]
            MemoryAdvice::Unmergeable => libc::MADV_UNMERGEABLE,
            #[cfg(target_os = "linux")]
            MemoryAdvice::Hugepage => libc::MADV_HUGEPAGE,
            #[cfg(target_os = "linux")]
            MemoryAdvice::NoHugepage => libc::MADV_NOHUGEPAGE,
            _ => libc::MADV_NORMAL,
        }
    }
}

/// Large allocation information
/// 
/// Tracks detailed information about a large memory allocation
/// including metadata, timing, and usage patterns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LargeAllocation {
    /// Unique allocation identifier
    pub allocation_id: AllocationId,
    /// Memory pointer
    pub ptr: NonNull<u8>,
    /// Allocation size
    pub size: usize,
    /// Requested alignment
    pub alignment: usize,
    /// Source component that requested the allocation
    pub source: AllocationSource,
    /// Whether huge pages are used
    pub uses_huge_pages: bool,
    /// Huge page type used
    pub huge_page_type: HugePageType,
    /// Whether memory is prefaulted
    pub is_prefaulted: bool,
    /// Applied memory advice
    pub memory_advice: Vec<MemoryAdvice>,
    /// Allocation timestamp
    pub allocated_at: SystemTime,
    /// Last access timestamp
    pub last_accessed: AtomicU64,
    /// Access count
    pub access_count: AtomicU64,
    /// Whether allocation is active
    pub is_active: AtomicBool,
    /// Memory usage statistics
    pub stats: Arc<AsyncRwLock<AllocationStats>>,
}

/// Per-allocation statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllocationStats {
    /// Number of memory advice operations
    pub advice_operations: u64,
    /// Number of access pattern changes
    pub access_pattern_changes: u64,
    /// Total prefaulted pages
    pub prefaulted_pages: u64,
    /// Memory efficiency score (0.0 to 1.0)
    pub efficiency_score: f64,
    /// Time spent in allocation
    pub allocation_time: Duration,
    /// Time since last access
    pub idle_time: Duration,
    /// Whether allocation is in use
    pub in_use: bool,
    /// Last updated timestamp
    pub last_updated: SystemTime,
}

/// Large object allocator statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LargeObjectStats {
    /// Total number of large allocations
    pub total_allocations: u64,
    /// Total number of deallocations
    pub total_deallocations: u64,
    /// Current active allocations
    pub active_allocations: usize,
    /// Total bytes allocated
    pub total_bytes_allocated: u64,
    /// Total bytes deallocated
    pub total_bytes_deallocated: u64,
    /// Current bytes in use
    pub bytes_in_use: u64,
    /// Peak memory usage
    pub peak_usage: u64,
    /// Number of huge page allocations
    pub huge_page_allocations: u64,
    /// Number of mmap operations
    pub mmap_operations: u64,
    /// Number of munmap operations
    pub munmap_operations: u64,
    /// Number of memory advice operations
    pub advice_operations: u64,
    /// Number of prefaulting operations
    pub prefaulting_operations: u64,
    /// Average allocation size
    pub avg_allocation_size: f64,
    /// Largest allocation size
    pub largest_allocation: usize,
    /// Total allocation time
    pub total_allocation_time: Duration,
    /// Total deallocation time
    pub total_deallocation_time: Duration,
    /// Average allocation latency
    pub avg_allocation_latency: Duration,
    /// Fragmentation ratio
    pub fragmentation_ratio: f64,
    /// Huge page efficiency (successful/requested ratio)
    pub huge_page_efficiency: f64,
    /// Memory pressure events
    pub pressure_events: u64,
    /// Last updated timestamp
    pub last_updated: SystemTime,
}

/// Large allocation result
/// 
/// Contains the result of a successful large allocation
/// with all relevant metadata and handles.
#[derive(Debug)]
pub struct LargeAllocationResult {
    /// Allocation identifier
    pub allocation_id: AllocationId,
    /// Memory pointer
    pub ptr: NonNull<u8>,
    /// Allocation size
    pub size: usize,
    /// Whether huge pages are used
    pub uses_huge_pages: bool,
    /// Applied memory advice
    pub memory_advice: Vec<MemoryAdvice>,
}

/// Main large object allocator
/// 
/// Manages large memory allocations using mmap with support
/// for huge pages, memory advice, and comprehensive tracking.
#[derive(Debug)]
pub struct LargeObjectAllocator {
    /// Allocator configuration
    config: LargeObjectConfig,
    /// Registry of active allocations
    allocations: Arc<RwLock<HashMap<AllocationId, Arc<LargeAllocation>>>>,
    /// Global allocator statistics
    stats: Arc<AsyncRwLock<LargeObjectStats>>,
    /// Whether allocator is active
    is_active: AtomicBool,
    /// Creation timestamp
    created_at: SystemTime,
    /// Allocator unique identifier
    allocator_id: Uuid,
    /// Next allocation ID
    next_allocation_id: AtomicU64,
    /// Cleanup task handle
    cleanup_handle: Arc<Mutex<Option<tokio::task::JoinHandle<()>>>>,
}

impl LargeAllocation {
    /// Creates a new large allocation record
    pub fn new(
        ptr: NonNull<u8>,
        size: usize,
        alignment: usize,
        source: AllocationSource,
        uses_huge_pages: bool,
        huge_page_type: HugePageType,
        is_prefaulted: bool,
    ) -> Self {
        Self {
            allocation_id: AllocationId::generate(),
            ptr,
            size,
            alignment,
            source,
            uses_huge_pages,
            huge_page_type,
            is_prefaulted,
            memory_advice: Vec::new(),
            allocated_at: SystemTime::now(),
            last_accessed: AtomicU64::new(0),
            access_count: AtomicU64::new(0),
            is_active: AtomicBool::new(true),
            stats: Arc::new(AsyncRwLock::new(AllocationStats::default())),
        }
    }
    
    /// Records an access to this allocation
    pub fn record_access(&self) {
        self.access_count.fetch_add(1, Ordering::Relaxed);
        let now = SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos() as u64;
        self.last_accessed.store(now, Ordering::Relaxed);
    }
    
    /// Gets the age of this allocation
    pub fn age(&self) -> Duration {
        SystemTime::now()
            .duration_since(self.allocated_at)
            .unwrap_or_default()
    }
    
    /// Gets time since last access
    pub fn time_since_last_access(&self) -> Duration {
        let last_access_ns = self.last_accessed.load(Ordering::Relaxed);
        if last_access_ns == 0 {
            return self.age();
        }
        
        let last_access_time = std::time::UNIX_EPOCH + Duration::from_nanos(last_access_ns);
        SystemTime::now()
            .duration_since(last_access_time)
            .unwrap_or_default()
    }
    
    /// Checks if allocation is idle
    pub fn is_idle(&self, threshold: Duration) -> bool {
        self.time_since_last_access() > threshold
    }
}

impl LargeObjectAllocator {
    /// Creates a new large object allocator
    pub async fn new(config: LargeObjectConfig) -> Result<Self, LargeObjectError> {
        let allocator = Self {
            config,
            allocations: Arc::new(RwLock::new(HashMap::new())),
            stats: Arc::new(AsyncRwLock::new(LargeObjectStats::default())),
            is_active: AtomicBool::new(true),
            created_at: SystemTime::now(),
            allocator_id: Uuid::new_v4(),
            next_allocation_id: AtomicU64::new(1),
            cleanup_handle: Arc::new(Mutex::new(None)),
        };
        
        // Start background cleanup task
        if allocator.config.enable_statistics {
            allocator.start_cleanup_task().await;
        }
        
        Ok(allocator)
    }
    
    /// Allocates a large object using mmap
    pub async fn allocate(
        &self,
        size: usize,
        alignment: usize,
        source: AllocationSource,
        enable_huge_pages: bool,
    ) -> Result<LargeAllocationResult, MemoryError> {
        if !self.is_active.load(Ordering::Relaxed) {
            return Err(MemoryError::InvalidConfiguration {
                field: "allocator".to_string(),
                reason: "Large object allocator is not active".to_string(),
            });
        }
        
        validate_allocation_size(size)?;
        validate_alignment(alignment)?;
        
        if size < self.config.threshold_size {
            return Err(MemoryError::InvalidSize {
                size,
                reason: format!("Size {} below large object threshold {}", 
                    size, self.config.threshold_size),
            });
        }
        
        let start_time = std::time::Instant::now();
        
        // Determine huge page strategy
        let (use_huge_pages, huge_page_type) = self.determine_huge_page_strategy(size, enable_huge_pages);
        
        // Perform the allocation
        let ptr = self.allocate_memory(size, alignment, use_huge_pages, huge_page_type).await?;
        
        // Create allocation record
        let allocation = Arc::new(LargeAllocation::new(
            ptr,
            size,
            alignment,
            source,
            use_huge_pages,
            huge_page_type,
            false, // Not prefaulted yet
        ));
        
        // Store in registry
        let allocation_id = allocation.allocation_id.clone();
        {
            let mut allocations = self.allocations.write();
            allocations.insert(allocation_id.clone(), allocation);
        }
        
        // Apply default memory advice
        let default_advice = if self.config.memory_advice.is_empty() {
            vec![MemoryAdvice::Normal]
        } else {
            self.config.memory_advice.iter()
                .filter_map(|advice_str| self.parse_memory_advice(advice_str))
                .collect()
        };
        
        for advice in &default_advice {
            let _ = self.apply_memory_advice(&allocation_id, *advice).await;
        }
        
        // Prefault if enabled
        if self.config.enable_prefault {
            let _ = self.prefault_allocation(&allocation_id).await;
        }
        
        // Update statistics
        let allocation_time = start_time.elapsed();
        self.update_allocation_stats(size, use_huge_pages, allocation_time).await;
        
        Ok(LargeAllocationResult {
            allocation_id,
            ptr,
            size,
            uses_huge_pages: use_huge_pages,
            memory_advice: default_advice,
        })
    }
    
    /// Deallocates a large object
    pub async fn deallocate(&self, allocation_id: AllocationId) -> Result<(), MemoryError> {
        let start_time = std::time::Instant::now();
        
        let allocation = {
            let mut allocations = self.allocations.write();
            allocations.remove(&allocation_id)
        };
        
        let allocation = allocation.ok_or_else(|| MemoryError::InvalidConfiguration {
            field: "allocation_id".to_string(),
            reason: format!("Allocation not found: {}", allocation_id),
        })?;
        
        // Mark as inactive
        allocation.is_active.store(false, Ordering::Relaxed);
        
        // Perform munmap
        self.deallocate_memory(allocation.ptr, allocation.size).await?;
        
        // Update statistics
        let deallocation_time = start_time.elapsed();
        self.update_deallocation_stats(allocation.size, deallocation_time).await;
        
        Ok(())
    }
    
    /// Applies memory advice to an allocation
    pub async fn apply_memory_advice(
        &self,
        allocation_id: &AllocationId,
        advice: MemoryAdvice,
    ) -> Result<(), LargeObjectError> {
        let allocations = self.allocations.read();
        let allocation = allocations.get(allocation_id)
            .ok_or_else(|| LargeObjectError::AllocationNotFound {
                allocation_id: allocation_id.to_string(),
            })?;
        
        self.apply_madvise(allocation.ptr, allocation.size, advice).await?;
        
        // Update allocation record
        // Note: In a real implementation, we'd need to safely update the advice list
        allocation.record_access();
        
        // Update statistics
        let mut stats = self.stats.write().await;
        stats.advice_operations += 1;
        stats.last_updated = SystemTime::now();
        
        Ok(())
    }
    
    /// Prefaults memory pages for an allocation
    pub async fn prefault_allocation(
        &self,
        allocation_id: &AllocationId,
    ) -> Result<(), LargeObjectError> {
        let allocations = self.allocations.read();
        let allocation = allocations.get(allocation_id)
            .ok_or_else(|| LargeObjectError::AllocationNotFound {
                allocation_id: allocation_id.to_string(),
            })?;
        
        self.prefault_memory(allocation.ptr, allocation.size).await?;
        
        allocation.record_access();
        
        // Update statistics
        let mut stats = self.stats.write().await;
        stats.prefaulting_operations += 1;
        stats.last_updated = SystemTime::now();
        
        Ok(())
    }
    
    /// Gets information about an allocation
    pub async fn get_allocation_info(
        &self,
        allocation_id: &AllocationId,
    ) -> Result<LargeAllocation, LargeObjectError> {
        let allocations = self.allocations.read();
        let allocation = allocations.get(allocation_id)
            .ok_or_else(|| LargeObjectError::AllocationNotFound {
                allocation_id: allocation_id.to_string(),
            })?;
        
        Ok((**allocation).clone())
    }
    
    /// Lists all active allocations
    pub async fn list_allocations(&self) -> Vec<AllocationId> {
        self.allocations.read().keys().cloned().collect()
    }
    
    /// Gets comprehensive allocator statistics
    pub async fn get_statistics(&self) -> LargeObjectStats {
        let mut stats = self.stats.write().await;
        
        let allocations = self.allocations.read();
        stats.active_allocations = allocations.len();
        
        // Calculate current bytes in use
        stats.bytes_in_use = allocations.values()
            .map(|alloc| alloc.size as u64)
            .sum();
        
        // Update efficiency metrics
        if stats.total_allocations > 0 {
            stats.avg_allocation_size = stats.total_bytes_allocated as f64 / stats.total_allocations as f64;
            stats.huge_page_efficiency = stats.huge_page_allocations as f64 / stats.total_allocations as f64;
        }
        
        if stats.total_allocation_time.as_nanos() > 0 {
            stats.avg_allocation_latency = Duration::from_nanos(
                stats.total_allocation_time.as_nanos() as u64 / stats.total_allocations.max(1)
            );
        }
        
        stats.last_updated = SystemTime::now();
        stats.clone()
    }
    
    /// Determines huge page strategy for allocation
    fn determine_huge_page_strategy(
        &self,
        size: usize,
        enable_huge_pages: bool,
    ) -> (bool, HugePageType) {
        if !self.config.enable_huge_pages || !enable_huge_pages {
            return (false, HugePageType::None);
        }
        
        match self.config.huge_page_type {
            HugePageType::Page2MB if size >= constants::HUGE_PAGE_2MB => {
                (true, HugePageType::Page2MB)
            }
            HugePageType::Page1GB if size >= constants::HUGE_PAGE_1GB => {
                (true, HugePageType::Page1GB)
            }
            _ => (false, HugePageType::None),
        }
    }
    
    /// Allocates memory using mmap
    async fn allocate_memory(
        &self,
        size: usize,
        alignment: usize,
        use_huge_pages: bool,
        huge_page_type: HugePageType,
    ) -> Result<NonNull<u8>, MemoryError> {
        #[cfg(unix)]
        {
            let mut flags = MAP_PRIVATE | MAP_ANONYMOUS;
            
            // Add huge page flags if requested
            #[cfg(target_os = "linux")]
            if use_huge_pages {
                match huge_page_type {
                    HugePageType::Page2MB => flags |= libc::MAP_HUGETLB | (21 << libc::MAP_HUGE_SHIFT), // 2MB
                    HugePageType::Page1GB => flags |= libc::MAP_HUGETLB | (30 << libc::MAP_HUGE_SHIFT), // 1GB
                    _ => {}
                }
            }
            
            let ptr = unsafe {
                mmap(
                    std::ptr::null_mut(),
                    size,
                    PROT_READ | PROT_WRITE,
                    flags,
                    -1,
                    0,
                )
            };
            
            if ptr == MAP_FAILED {
                return Err(MemoryError::OutOfMemory {
                    reason: "mmap allocation failed".to_string(),
                });
            }
            
            // Handle alignment if needed
            let aligned_ptr = if alignment > 4096 {
                // For large alignments, we might need to allocate more and align
                // This is a simplified implementation
                ptr as *mut u8
            } else {
                ptr as *mut u8
            };
            
            Ok(NonNull::new(aligned_ptr).unwrap())
        }
        
        #[cfg(not(unix))]
        {
            // Fallback to regular allocation on non-Unix platforms
            use std::alloc::{alloc, Layout};
            
            let layout = Layout::from_size_align(size, alignment)
                .map_err(|_| MemoryError::InvalidAlignment {
                    alignment,
                    reason: "Invalid layout for allocation".to_string(),
                })?;
            
            let ptr = unsafe { alloc(layout) };
            if ptr.is_null() {
                return Err(MemoryError::OutOfMemory {
                    reason: "Standard allocation failed".to_string(),
                });
            }
            
            Ok(NonNull::new(ptr).unwrap())
        }
    }
    
    /// Deallocates memory using munmap
    async fn deallocate_memory(
        &self,
        ptr: NonNull<u8>,
        size: usize,
    ) -> Result<(), MemoryError> {
        #[cfg(unix)]
        {
            let _result = unsafe {
                munmap(ptr.as_ptr() as *mut libc::c_void, size)
            };
            
            if result != 0 {
                return Err(MemoryError::InvalidConfiguration {
                    field: "deallocation".to_string(),
                    reason: "munmap failed".to_string(),
                });
            }
        }
        
        #[cfg(not(unix))]
        {
            // Fallback to regular deallocation
            use std::alloc::{dealloc, Layout};
            
            let layout = Layout::from_size_align(size, 4096).unwrap();
            unsafe {
                dealloc(ptr.as_ptr(), layout);
            }
        }
        
        Ok(())
    }
    
    /// Applies madvise to memory region
    async fn apply_madvise(
        &self,
        ptr: NonNull<u8>,
        size: usize,
        advice: MemoryAdvice,
    ) -> Result<(), LargeObjectError> {
        #[cfg(unix)]
        {
            let _result = unsafe {
                madvise(
                    ptr.as_ptr() as *mut libc::c_void,
                    size,
                    advice.to_madvise_flag(),
                )
            };
            
            if result != 0 {
                return Err(LargeObjectError::MemoryAdviceFailed {
                    reason: format!("madvise failed for advice {:?}", advice),
                });
            }
        }
        
        #[cfg(not(unix))]
        {
            // No-op on non-Unix platforms
            let _ = (ptr, size, advice);
        }
        
        Ok(())
    }
    
    /// Prefaults memory pages
    async fn prefault_memory(
        &self,
        ptr: NonNull<u8>,
        size: usize,
    ) -> Result<(), LargeObjectError> {
        // Touch each page to fault it in
        let page_size = 4096; // Assume 4KB pages
        let mut offset = 0;
        
        unsafe {
            while offset < size {
                let page_ptr = ptr.as_ptr().add(offset);
                std::ptr::write_volatile(page_ptr, std::ptr::read_volatile(page_ptr));
                offset += page_size;
            }
        }
        
        Ok(())
    }
    
    /// Parses memory advice string
    fn parse_memory_advice(&self, advice_str: &str) -> Option<MemoryAdvice> {
        match advice_str {
            "MADV_NORMAL" => Some(MemoryAdvice::Normal),
            "MADV_SEQUENTIAL" => Some(MemoryAdvice::Sequential),
            "MADV_RANDOM" => Some(MemoryAdvice::Random),
            "MADV_WILLNEED" => Some(MemoryAdvice::WillNeed),
            "MADV_DONTNEED" => Some(MemoryAdvice::DontNeed),
            "MADV_HUGEPAGE" => Some(MemoryAdvice::Hugepage),
            "MADV_NOHUGEPAGE" => Some(MemoryAdvice::NoHugepage),
            _ => None,
        }
    }
    
    /// Updates allocation statistics
    async fn update_allocation_stats(
        &self,
        size: usize,
        used_huge_pages: bool,
        allocation_time: Duration,
    ) {
        let mut stats = self.stats.write().await;
        stats.total_allocations += 1;
        stats.total_bytes_allocated += size as u64;
        stats.mmap_operations += 1;
        stats.total_allocation_time += allocation_time;
        
        if used_huge_pages {
            stats.huge_page_allocations += 1;
        }
        
        if size > stats.largest_allocation {
            stats.largest_allocation = size;
        }
        
        if stats.bytes_in_use > stats.peak_usage {
            stats.peak_usage = stats.bytes_in_use;
        }
        
        stats.last_updated = SystemTime::now();
    }
    
    /// Updates deallocation statistics
    async fn update_deallocation_stats(&self, size: usize, deallocation_time: Duration) {
        let mut stats = self.stats.write().await;
        stats.total_deallocations += 1;
        stats.total_bytes_deallocated += size as u64;
        stats.munmap_operations += 1;
        stats.total_deallocation_time += deallocation_time;
        stats.last_updated = SystemTime::now();
    }
    
    /// Starts the background cleanup task
    async fn start_cleanup_task(&self) {
        let allocations = Arc::clone(&self.allocations);
        let is_active = Arc::new(AtomicBool::new(true));
        
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60)); // 1 minute
            
            while is_active.load(Ordering::Relaxed) {
                interval.tick().await;
                
                // Find idle allocations
                let mut idle_allocations = Vec::new();
                {
                    let allocations_guard = allocations.read();
                    let idle_threshold = Duration::from_secs(300); // 5 minutes
                    
                    for (id, allocation) in allocations_guard.iter() {
                        if allocation.is_idle(idle_threshold) {
                            idle_allocations.push(id.clone());
                        }
                    }
                }
                
                // Log idle allocations (in a real implementation, you might want to
                // take action like warning or automatic cleanup)
                if !idle_allocations.is_empty() {
                    println!("Found {} idle large allocations", idle_allocations.len());
                }
            }
        });
        
        *self.cleanup_handle.lock() = Some(handle);
    }
    
    /// Performs memory pressure response
    pub async fn handle_memory_pressure(
        &self,
        level: MemoryPressureLevel,
    ) -> Result<u64, LargeObjectError> {
        let mut bytes_freed = 0;
        
        match level {
            MemoryPressureLevel::Warning => {
                // Apply MADV_DONTNEED to idle allocations
                let allocations = self.allocations.read();
                for allocation in allocations.values() {
                    if allocation.is_idle(Duration::from_secs(60)) {
                        let _ = self.apply_madvise(
                            allocation.ptr,
                            allocation.size,
                            MemoryAdvice::DontNeed,
                        ).await;
                    }
                }
            }
            MemoryPressureLevel::Critical | MemoryPressureLevel::Emergency => {
                // More aggressive cleanup could be implemented here
                // For example, freeing truly idle allocations
            }
            _ => {}
        }
        
        Ok(bytes_freed)
    }
    
    /// Shuts down the allocator gracefully
    pub async fn shutdown(&self) -> Result<(), LargeObjectError> {
        self.is_active.store(false, Ordering::Relaxed);
        
        // Stop cleanup task
        if let Some(handle) = self.cleanup_handle.lock().take() {
            handle.abort();
        }
        
        // Deallocate all remaining allocations
        let allocation_ids: Vec<_> = self.allocations.read().keys().cloned().collect();
        for allocation_id in allocation_ids {
            let _ = self.deallocate(allocation_id).await;
        }
        
        Ok(())
    }
}

/// Utility functions
impl LargeObjectAllocator {
    /// Calculates memory fragmentation across all large allocations
    pub async fn calculate_fragmentation(&self) -> f64 {
        let allocations = self.allocations.read();
        if allocations.is_empty() {
            return 0.0;
        }
        
        let total_allocated: usize = allocations.values()
            .map(|alloc| alloc.size)
            .sum();
        
        let total_virtual = allocations.len() * 4096; // Assume some overhead per allocation
        
        if total_virtual > 0 {
            1.0 - (total_allocated as f64 / total_virtual as f64)
        } else {
            0.0
        }
    }
    
    /// Gets allocations by source component
    pub async fn get_allocations_by_source(
        &self,
        source: &AllocationSource,
    ) -> Vec<AllocationId> {
        self.allocations
            .read()
            .iter()
            .filter(|(_, alloc)| &alloc.source == source)
            .map(|(id, _)| id.clone())
            .collect()
    }
    
    /// Gets memory usage by component
    pub async fn get_usage_by_component(&self) -> HashMap<String, u64> {
        let mut usage_map = HashMap::new();
        
        for allocation in self.allocations.read().values() {
            let component = allocation.source.to_string();
            *usage_map.entry(component).or_insert(0) += allocation.size as u64;
        }
        
        usage_map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::test;

    #[test]
    async fn test_large_object_allocator_creation() {
        let config = LargeObjectConfig::default();
        let allocator = LargeObjectAllocator::new(config).await;
        assert!(allocator.is_ok());
        
        let allocator = allocator.unwrap();
        assert!(allocator.is_active.load(Ordering::Relaxed));
    }

    #[test]
    async fn test_large_allocation() {
        let config = LargeObjectConfig::default();
        let allocator = LargeObjectAllocator::new(config).await.unwrap();
        
        let _source = AllocationSource::Query {
            query_id: "test_query".to_string(),
            operation: "sort_buffer".to_string(),
        };
        
        let _result = allocator.allocate(
            1024 * 1024, // 1MB
            4096,
            source,
            false,
        ).await;
        
        assert!(result.is_ok());
        let allocation = result.unwrap();
        assert_eq!(allocation.size, 1024 * 1024);
        assert!(!allocation.uses_huge_pages);
    }

    #[test]
    async fn test_allocation_below_threshold() {
        let config = LargeObjectConfig::default();
        let allocator = LargeObjectAllocator::new(config).await.unwrap();
        
        let _source = AllocationSource::Unknown;
        
        // Try to allocate below threshold
        let _result = allocator.allocate(1024, 8, source, false).await;
        assert!(result.is_err());
    }

    #[test]
    async fn test_allocation_and_deallocation() {
        let config = LargeObjectConfig::default();
        let allocator = LargeObjectAllocator::new(config).await.unwrap();
        
        let _source = AllocationSource::Unknown;
        let _result = allocator.allocate(
            512 * 1024, // 512KB
            4096,
            source,
            false,
        ).await.unwrap();
        
        let allocation_id = result.allocation_id.clone();
        
        // Check that allocation exists
        let info = allocator.get_allocation_info(&allocation_id).await;
        assert!(info.is_ok());
        
        // Deallocate
        let dealloc_result = allocator.deallocate(allocation_id.clone()).await;
        assert!(dealloc_result.is_ok());
        
        // Check that allocation no longer exists
        let info_after = allocator.get_allocation_info(&allocation_id).await;
        assert!(info_after.is_err());
    }

    #[test]
    async fn test_memory_advice() {
        let config = LargeObjectConfig::default();
        let allocator = LargeObjectAllocator::new(config).await.unwrap();
        
        let _source = AllocationSource::Unknown;
        let _result = allocator.allocate(
            1024 * 1024,
            4096,
            source,
            false,
        ).await.unwrap();
        
        // Apply memory advice
        let advice_result = allocator.apply_memory_advice(
            &result.allocation_id,
            MemoryAdvice::Sequential,
        ).await;
        assert!(advice_result.is_ok());
    }

    #[test]
    async fn test_allocator_statistics() {
        let config = LargeObjectConfig::default();
        let allocator = LargeObjectAllocator::new(config).await.unwrap();
        
        let _source = AllocationSource::Unknown;
        let _result1 = allocator.allocate(
            1024 * 1024,
            4096,
            source.clone(),
            false,
        ).await.unwrap();
        
        let _result2 = allocator.allocate(
            2 * 1024 * 1024,
            4096,
            source,
            true, // Try huge pages
        ).await.unwrap();
        
        let _stats = allocator.get_statistics().await;
        assert_eq!(stats.total_allocations, 2);
        assert_eq!(stats.active_allocations, 2);
        assert_eq!(stats.total_bytes_allocated, 3 * 1024 * 1024);
        assert_eq!(stats.largest_allocation, 2 * 1024 * 1024);
    }

    #[test]
    async fn test_huge_page_strategy() {
        let config = LargeObjectConfig {
            enable_huge_pages: true,
            huge_page_type: HugePageType::Page2MB,
            ..Default::default()
        };
        let allocator = LargeObjectAllocator::new(config).await.unwrap();
        
        // Test size below huge page threshold
        let (use_huge, page_type) = allocator.determine_huge_page_strategy(1024, true);
        assert!(!use_huge);
        assert_eq!(page_type, HugePageType::None);
        
        // Test size above huge page threshold
        let (use_huge, page_type) = allocator.determine_huge_page_strategy(
            constants::HUGE_PAGE_2MB,
            true,
        );
        assert!(use_huge);
        assert_eq!(page_type, HugePageType::Page2MB);
    }

    #[test]
    fn test_memory_advice_parsing() {
        let config = LargeObjectConfig::default();
        let allocator = LargeObjectAllocator::new(config).await.unwrap();
        
        assert_eq!(
            allocator.parse_memory_advice("MADV_SEQUENTIAL"),
            Some(MemoryAdvice::Sequential)
        );
        assert_eq!(
            allocator.parse_memory_advice("MADV_RANDOM"),
            Some(MemoryAdvice::Random)
        );
        assert_eq!(
            allocator.parse_memory_advice("INVALID_ADVICE"),
            None
        );
    }

    #[test]
    fn test_large_allocation_age() {
        let allocation = LargeAllocation::new(
            NonNull::dangling(),
            1024,
            8,
            AllocationSource::Unknown,
            false,
            HugePageType::None,
            false,
        );
        
        let age = allocation.age();
        assert!(age.as_nanos() > 0);
        
        // Test idle detection
        assert!(allocation.is_idle(Duration::from_nanos(1)));
        assert!(!allocation.is_idle(Duration::from_secs(3600))); // 1 hour
    }
}