// Enterprise Integration Module
//
// Part of the Enterprise Integration Layer for RustyDB

use std::collections::HashMap;
use std::sync::{Arc, RwLock, Mutex};
use std::time::{Duration, Instant, SystemTime};
use std::fmt;
use tokio::time::sleep;
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::error::DbError;

// ============================================================================
// SECTION 2: CROSS-CUTTING CONCERNS (600+ lines)
// ============================================================================

// Correlation ID for request tracing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Distributed tracing context
#[derive(Debug, Clone)]
pub struct TraceContext {
    pub trace_id: String,
    pub span_id: String,
    pub parent_span_id: Option<String>,
    pub correlation_id: CorrelationId,
    pub baggage: HashMap<String, String>,
    pub start_time: Instant,
}

impl TraceContext {
    pub fn new() -> Self {
        Self {
            trace_id: Uuid::new_v4().to_string(),
            span_id: Uuid::new_v4().to_string(),
            parent_span_id: None,
            correlation_id: CorrelationId::new(),
            baggage: HashMap::new(),
            start_time: Instant::now(),
        }
    }

    pub fn child_span(&self) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            span_id: Uuid::new_v4().to_string(),
            parent_span_id: Some(self.span_id.clone()),
            correlation_id: self.correlation_id.clone(),
            baggage: self.baggage.clone(),
            start_time: Instant::now(),
        }
    }
}

// Trace span
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    pub span_id: String,
    pub trace_id: String,
    pub parent_span_id: Option<String>,
    pub operation_name: String,
    pub start_time: SystemTime,
    pub end_time: Option<SystemTime>,
    pub duration: Option<Duration>,
    pub tags: HashMap<String, String>,
    pub logs: Vec<SpanLog>,
    pub status: SpanStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpanLog {
    pub timestamp: SystemTime,
    pub fields: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SpanStatus {
    Ok,
    Error,
    Cancelled,
}

// Distributed tracing manager
pub struct DistributedTracingManager {
    spans: Arc<RwLock<HashMap<String, Span>>>,
    exporters: Arc<RwLock<Vec<Box<dyn SpanExporter>>>>,
    sampling_rate: f32,
}

pub trait SpanExporter: Send + Sync {
    fn export(&self, spans: &[Span]) -> Result<(), DbError>;
}

impl DistributedTracingManager {
    pub fn new(sampling_rate: f32) -> Self {
        Self {
            spans: Arc::new(RwLock::new(HashMap::new())),
            exporters: Arc::new(RwLock::new(Vec::new())),
            sampling_rate,
        }
    }

    pub fn start_span(&self, operation_name: &str, context: &TraceContext) -> Span {
        let span = Span {
            span_id: context.span_id.clone(),
            trace_id: context.trace_id.clone(),
            parent_span_id: context.parent_span_id.clone(),
            operation_name: operation_name.to_string(),
            start_time: SystemTime::now(),
            end_time: None,
            duration: None,
            tags: HashMap::new(),
            logs: Vec::new(),
            status: SpanStatus::Ok,
        };

        let mut spans = self.spans.write().unwrap();
        spans.insert(span.span_id.clone(), span.clone());
        span
    }

    pub fn end_span(&self, span_id: &str, status: SpanStatus) {
        let mut spans = self.spans.write().unwrap();
        if let Some(span) = spans.get_mut(span_id) {
            let end_time = SystemTime::now();
            span.end_time = Some(end_time);
            span.duration = span.start_time.elapsed().ok();
            span.status = status;

            // Export if sampled
            if self.should_sample() {
                let exporters = self.exporters.read().unwrap();
                for exporter in exporters.iter() {
                    let _ = exporter.export(&[span.clone()]);
                }
            }
        }
    }

    pub fn add_tag(&self, span_id: &str, key: &str, value: &str) {
        let mut spans = self.spans.write().unwrap();
        if let Some(span) = spans.get_mut(span_id) {
            span.tags.insert(key.to_string(), value.to_string());
        }
    }

    pub fn add_log(&self, span_id: &str, fields: HashMap<String, String>) {
        let mut spans = self.spans.write().unwrap();
        if let Some(span) = spans.get_mut(span_id) {
            span.logs.push(SpanLog {
                timestamp: SystemTime::now(),
                fields,
            });
        }
    }

    pub fn register_exporter(&self, exporter: Box<dyn SpanExporter>) {
        let mut exporters = self.exporters.write().unwrap();
        exporters.push(exporter);
    }

    fn should_sample(&self) -> bool {
        use rand::Rng;
        let mut rng = rand::thread_rng();
        rng.gen::<f32>() < self.sampling_rate
    }
}

// Correlation ID propagator
pub struct CorrelationIdPropagator {
    context_storage: Arc<tokio::sync::RwLock<HashMap<std::thread::ThreadId, CorrelationId>>>,
}

impl CorrelationIdPropagator {
    pub fn new() -> Self {
        Self {
            context_storage: Arc::new(tokio::sync::RwLock::new(HashMap::new())),
        }
    }

    pub async fn set_correlation_id(&self, correlationid: CorrelationId) {
        let thread_id = std::thread::current().id();
        let mut storage = self.context_storage.write().await;
        storage.insert(thread_id, correlationid);
    }

    pub async fn get_correlation_id(&self) -> Option<CorrelationId> {
        let thread_id = std::thread::current().id();
        let storage = self.context_storage.read().await;
        storage.get(&thread_id).cloned()
    }

    pub async fn clear_correlation_id(&self) {
        let thread_id = std::thread::current().id();
        let mut storage = self.context_storage.write().await;
        storage.remove(&thread_id);
    }
}

// Centralized logging system
pub struct CentralizedLogger {
    log_sink: Arc<Mutex<Box<dyn LogSink>>>,
    log_level: Arc<RwLock<LogLevel>>,
    context_propagator: Arc<CorrelationIdPropagator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: SystemTime,
    pub level: LogLevel,
    pub correlation_id: Option<CorrelationId>,
    pub service: String,
    pub message: String,
    pub fields: HashMap<String, String>,
}

pub trait LogSink: Send {
    fn write(&mut self, entry: LogEntry);
    fn flush(&mut self);
}

impl CentralizedLogger {
    pub fn new(sink: Box<dyn LogSink>) -> Self {
        Self {
            log_sink: Arc::new(Mutex::new(sink)),
            log_level: Arc::new(RwLock::new(LogLevel::Info)),
            context_propagator: Arc::new(CorrelationIdPropagator::new()),
        }
    }

    pub async fn log(&self, level: LogLevel, service: &str, message: &str, fields: HashMap<String, String>) {
        let current_level = *self.log_level.read().unwrap();
        if level < current_level {
            return;
        }

        let correlation_id = self.context_propagator.get_correlation_id().await;

        let entry = LogEntry {
            timestamp: SystemTime::now(),
            level,
            correlation_id,
            service: service.to_string(),
            message: message.to_string(),
            fields,
        };

        let mut sink = self.log_sink.lock().unwrap();
        sink.write(entry);
    }

    pub fn set_level(&self, level: LogLevel) {
        let mut current = self.log_level.write().unwrap();
        *current = level;
    }

    pub fn flush(&self) {
        let mut sink = self.log_sink.lock().unwrap();
        sink.flush();
    }
}

// Error handling policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorHandlingPolicy {
    pub max_retries: usize,
    pub retry_delay: Duration,
    pub exponential_backoff: bool,
    pub circuit_breaker_threshold: usize,
    pub circuit_breaker_timeout: Duration,
    pub fallback_enabled: bool,
}

impl Default for ErrorHandlingPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_millis(100),
            exponential_backoff: true,
            circuit_breaker_threshold: 5,
            circuit_breaker_timeout: Duration::from_secs(60),
            fallback_enabled: true,
        }
    }
}

// Retry policy executor
pub struct RetryPolicyExecutor {
    policies: Arc<RwLock<HashMap<String, ErrorHandlingPolicy>>>,
}

impl RetryPolicyExecutor {
    pub fn new() -> Self {
        Self {
            policies: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn register_policy(&self, operation: &str, policy: ErrorHandlingPolicy) {
        let mut policies = self.policies.write().unwrap();
        policies.insert(operation.to_string(), policy);
    }

    pub async fn execute_with_retry<F, T, E>(&self, operation: &str, mut f: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
    {
        let policy = {
            let policies = self.policies.read().unwrap();
            policies.get(operation).cloned().unwrap_or_default()
        };

        let mut attempts = 0;
        let mut delay = policy.retry_delay;

        loop {
            match f() {
                Ok(result) => return Ok(result),
                Err(e) => {
                    attempts += 1;
                    if attempts >= policy.max_retries {
                        return Err(e);
                    }

                    sleep(delay).await;

                    if policy.exponential_backoff {
                        delay *= 2;
                    }
                }
            }
        }
    }
}

// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

// Circuit breaker
pub struct CircuitBreaker {
    state: Arc<RwLock<CircuitState>>,
    failure_count: Arc<RwLock<usize>>,
    last_failure_time: Arc<RwLock<Option<Instant>>>,
    threshold: usize,
    timeout: Duration,
}

impl CircuitBreaker {
    pub fn new(threshold: usize, timeout: Duration) -> Self {
        Self {
            state: Arc::new(RwLock::new(CircuitState::Closed)),
            failure_count: Arc::new(RwLock::new(0)),
            last_failure_time: Arc::new(RwLock::new(None)),
            threshold,
            timeout,
        }
    }

    pub fn is_open(&self) -> bool {
        let state = self.state.read().unwrap();
        matches!(*state, CircuitState::Open)
    }

    pub fn record_success(&self) {
        let mut state = self.state.write().unwrap();
        let mut failure_count = self.failure_count.write().unwrap();

        *state = CircuitState::Closed;
        *failure_count = 0;
    }

    pub fn record_failure(&self) {
        let mut state = self.state.write().unwrap();
        let mut failure_count = self.failure_count.write().unwrap();
        let mut last_failure = self.last_failure_time.write().unwrap();

        *failure_count += 1;
        *last_failure = Some(Instant::now());

        if *failure_count >= self.threshold {
            *state = CircuitState::Open;
        }
    }

    pub fn try_reset(&self) -> bool {
        let mut state = self.state.write().unwrap();
        let last_failure = self.last_failure_time.read().unwrap();

        if let Some(last) = *last_failure {
            if last.elapsed() > self.timeout {
                *state = CircuitState::HalfOpen;
                return true;
            }
        }

        false
    }
}

// Circuit breaker coordinator
pub struct CircuitBreakerCoordinator {
    breakers: Arc<RwLock<HashMap<String, Arc<CircuitBreaker>>>>,
    policies: Arc<RwLock<HashMap<String, ErrorHandlingPolicy>>>,
}

impl CircuitBreakerCoordinator {
    pub fn new() -> Self {
        Self {
            breakers: Arc::new(RwLock::new(HashMap::new())),
            policies: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn register_breaker(&self, name: &str, policy: ErrorHandlingPolicy) {
        let breaker = Arc::new(CircuitBreaker::new(
            policy.circuit_breaker_threshold,
            policy.circuit_breaker_timeout,
        ));

        let mut breakers = self.breakers.write().unwrap();
        breakers.insert(name.to_string(), breaker);

        let mut policies = self.policies.write().unwrap();
        policies.insert(name.to_string(), policy);
    }

    pub fn get_breaker(&self, name: &str) -> Option<Arc<CircuitBreaker>> {
        let breakers = self.breakers.read().unwrap();
        breakers.get(name).cloned()
    }

    pub async fn execute_with_breaker<F, T, E>(
        &self,
        name: &str,
        f: F,
    ) -> Result<T, String>
    where
        F: FnOnce() -> Result<T, E>,
        E: fmt::Display,
    {
        let breaker = self.get_breaker(name)
            .ok_or_else(|| format!("Circuit breaker not found: {}", name))?;

        if breaker.is_open() {
            breaker.try_reset();
            if breaker.is_open() {
                return Err(format!("Circuit breaker open for: {}", name));
            }
        }

        match f() {
            Ok(result) => {
                breaker.record_success();
                Ok(result)
            }
            Err(e) => {
                breaker.record_failure();
                Err(format!("Operation failed: {}", e))
            }
        }
    }
}
