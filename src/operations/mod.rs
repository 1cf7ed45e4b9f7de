pub mod resources;

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use crate::Result;

// Connection pool configuration
#[derive(Debug, Clone)]
pub struct ConnectionPoolConfig {
    pub min_connections: usize,
    pub max_connections: usize,
    pub connection_timeout_ms: u64,
}

impl Default for ConnectionPoolConfig {
    fn default() -> Self {
        Self {
            min_connections: 5,
            max_connections: 100,
            connection_timeout_ms: 5000,
        }
    }
}

// Connection pool for managing database connections
pub struct ConnectionPool {
    config: ConnectionPoolConfig,
    semaphore: Arc<Semaphore>,
    active_connections: Arc<RwLock<usize>>,
}

impl ConnectionPool {
    pub fn new(config: ConnectionPoolConfig) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(config.max_connections)),
            config,
            active_connections: Arc::new(RwLock::new(0)),
        }
    }

    pub async fn acquire(&self) -> Result<ConnectionHandle> {
        let permit = self.semaphore.clone().acquire_owned().await.unwrap();
        *self.active_connections.write() += 1;

        Ok(ConnectionHandle {
            _permit: permit,
            pool: self.active_connections.clone(),
        })
    }

    pub fn active_count(&self) -> usize {
        *self.active_connections.read()
    }
}

pub struct ConnectionHandle {
    _permit: tokio::sync::OwnedSemaphorePermit,
    pool: Arc<RwLock<usize>>,
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        *self.pool.write() -= 1;
    }
}

// Prepared statement
#[derive(Debug, Clone)]
pub struct PreparedStatement {
    pub id: u64,
    pub sql: String,
    pub parameter_count: usize,
}

// Prepared statement manager
pub struct PreparedStatementManager {
    statements: Arc<RwLock<HashMap<u64, PreparedStatement>>>,
    next_id: Arc<RwLock<u64>>,
}

impl PreparedStatementManager {
    pub fn new() -> Self {
        Self {
            statements: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(RwLock::new(1)),
        }
    }

    pub fn prepare(&self, sql: String) -> Result<u64> {
        let mut next_id = self.next_id.write();
        let id = *next_id;
        *next_id += 1;

        // Count parameters (placeholder)
        let parameter_count = sql.matches('?').count();

        let stmt = PreparedStatement {
            id,
            sql,
            parameter_count,
        };

        self.statements.write().insert(id, stmt);
        Ok(id)
    }

    pub fn get(&self, id: u64) -> Option<PreparedStatement> {
        self.statements.read().get(&id).cloned()
    }

    pub fn deallocate(&self, id: u64) {
        self.statements.write().remove(&id);
    }
}

impl Default for PreparedStatementManager {
    fn default() -> Self {
        Self::new()
    }
}

// Batch operation manager
pub struct BatchOperationManager {
    batch_size: usize,
}

impl BatchOperationManager {
    pub fn new(batch_size: usize) -> Self {
        Self { batch_size }
    }

    pub fn execute_batch(&self, operations: Vec<String>) -> Result<Vec<usize>> {
        let mut results = Vec::new();

        for chunk in operations.chunks(self.batch_size) {
            // Execute batch
            for _op in chunk {
                results.push(1); // Placeholder
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepared_statement() -> Result<()> {
        let psm = PreparedStatementManager::new();
        let id = psm.prepare("SELECT * FROM users WHERE id = ?".to_string())?;

        let stmt = psm.get(id).unwrap();
        assert_eq!(stmt.parameter_count, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_connection_pool() -> Result<()> {
        let pool = ConnectionPool::new(ConnectionPoolConfig::default());
        let _conn = pool.acquire().await?;
        assert_eq!(pool.active_count(), 1);
        Ok(())
    }
}
