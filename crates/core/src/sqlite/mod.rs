//! SQLite-backed work-queue store.
//!
//! SQLite has no row-level locks. Every unit of work runs in a
//! `BEGIN IMMEDIATE` transaction, which takes the database write lock up
//! front: a strictly stronger guarantee than the per-row locks the engine
//! asks for. Blocking locks therefore wait on the writer lock (bounded by
//! the busy timeout), and skip-locked scans never meet a row held by another
//! live transaction.

mod orders;
mod registry;
mod rows;
mod transaction;

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration as StdDuration;

use chrono::Duration;
use rusqlite::{Connection, TransactionBehavior};

use crate::assignment::{AssignmentError, WorkQueueStore, WorkQueueTx};
use crate::config::{AssignmentConfig, DatabaseConfig};
use transaction::SqliteTx;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS printers (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        model TEXT,
        material TEXT,
        status TEXT NOT NULL DEFAULT 'available'
            CHECK (status IN ('available', 'busy', 'maintenance', 'offline')),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_printers_status ON printers(status, created_at);

    CREATE TABLE IF NOT EXISTS orders (
        id TEXT PRIMARY KEY,
        status TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS printer_assignments (
        id TEXT PRIMARY KEY,
        order_id TEXT NOT NULL REFERENCES orders(id),
        printer_id TEXT REFERENCES printers(id) ON DELETE SET NULL,
        assigned_at TEXT NOT NULL,
        completed_at TEXT
    );

    CREATE UNIQUE INDEX IF NOT EXISTS idx_assignments_one_active_per_order
        ON printer_assignments(order_id) WHERE completed_at IS NULL;
    CREATE INDEX IF NOT EXISTS idx_assignments_active_by_printer
        ON printer_assignments(printer_id, assigned_at) WHERE completed_at IS NULL;
"#;

/// SQLite store holding printers, orders and the assignment ledger.
pub struct SqliteWorkQueue {
    conn: Mutex<Connection>,
    /// Used for the advisory completion time shown on printer listings.
    default_estimate: Duration,
}

impl SqliteWorkQueue {
    /// Open (or create) a database file with default settings.
    pub fn new(path: &Path) -> rusqlite::Result<Self> {
        Self::open(path, &DatabaseConfig::default())
    }

    /// Open the database described by the config.
    pub fn from_config(config: &DatabaseConfig) -> rusqlite::Result<Self> {
        Self::open(&config.path, config)
    }

    fn open(path: &Path, config: &DatabaseConfig) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(StdDuration::from_millis(config.busy_timeout_ms))?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        Self::initialize(conn)
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> rusqlite::Result<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> rusqlite::Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
            default_estimate: Duration::hours(4),
        })
    }

    /// Use the configured default job estimate for listing projections.
    pub fn with_assignment_config(mut self, config: &AssignmentConfig) -> Self {
        self.default_estimate =
            Duration::milliseconds((config.default_estimate_hours * 3_600_000.0).round() as i64);
        self
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>, String> {
        self.conn
            .lock()
            .map_err(|_| "connection mutex poisoned".to_string())
    }
}

impl WorkQueueStore for SqliteWorkQueue {
    fn with_transaction<T, F>(&self, work: F) -> Result<T, AssignmentError>
    where
        F: FnOnce(&mut dyn WorkQueueTx) -> Result<T, AssignmentError>,
    {
        let mut conn = self.connection().map_err(AssignmentError::Database)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut unit = SqliteTx::new(tx);

        // Dropping `unit` on the error path rolls the transaction back.
        let value = work(&mut unit)?;
        unit.commit()?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assignment::{AssignmentEngine, AutoAssignRequest};
    use crate::order::{OrderBook, OrderStatus};
    use crate::printer::{PrinterRegistry, PrinterStatus};
    use crate::testing::fixtures;
    use chrono::Utc;
    use std::sync::Arc;

    fn engine(store: &Arc<SqliteWorkQueue>) -> AssignmentEngine<SqliteWorkQueue> {
        AssignmentEngine::new(Arc::clone(store), AssignmentConfig::default())
    }

    #[test]
    fn test_schema_is_idempotent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("queue.db");

        let first = SqliteWorkQueue::new(&path).unwrap();
        fixtures::printer(&first, "P1", None, "available");
        drop(first);

        let second = SqliteWorkQueue::new(&path).unwrap();
        assert_eq!(
            second
                .list_printers(&crate::printer::PrinterFilter::new())
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_scenario_assign_conflict_complete() {
        let store = Arc::new(SqliteWorkQueue::in_memory().unwrap());
        let p1 = fixtures::printer(&store, "P1", Some("PLA"), "available");
        let o1 = fixtures::new_order(&store);
        let engine = engine(&store);

        let before = Utc::now();
        let result = engine
            .auto_assign(
                &AutoAssignRequest::new(o1.to_string())
                    .with_material("PLA")
                    .with_estimated_hours(2.0),
            )
            .unwrap();
        assert_eq!(result.printer_id, p1);
        assert_eq!(result.queue_position, 0);
        assert!(result.estimated_start >= before);
        assert_eq!(
            result.estimated_completion - result.estimated_start,
            Duration::hours(2)
        );
        assert_eq!(
            store.get_printer(p1).unwrap().unwrap().status,
            PrinterStatus::Busy
        );
        assert_eq!(
            store.get_order(o1).unwrap().unwrap().status,
            OrderStatus::Printing
        );

        let again = engine.auto_assign(&AutoAssignRequest::new(o1.to_string()));
        assert!(matches!(again, Err(AssignmentError::OrderAlreadyAssigned)));

        let released = engine.complete_assignment(&o1.to_string()).unwrap();
        assert_eq!(released.id, p1);
        assert_eq!(released.status, PrinterStatus::Available);
    }

    #[test]
    fn test_failed_assignment_leaves_no_rows() {
        let store = Arc::new(SqliteWorkQueue::in_memory().unwrap());
        fixtures::printer(&store, "Resin", Some("RESIN"), "available");
        let order = fixtures::new_order(&store);

        let result = engine(&store)
            .auto_assign(&AutoAssignRequest::new(order.to_string()).with_material("PLA"));
        assert!(matches!(result, Err(AssignmentError::NoCompatiblePrinter)));

        let conn = store.connection().unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM printer_assignments", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 0);
        drop(conn);
        assert_eq!(
            store.get_order(order).unwrap().unwrap().status,
            OrderStatus::New
        );
    }

    #[test]
    fn test_auto_prefers_idle_printer() {
        let store = Arc::new(SqliteWorkQueue::in_memory().unwrap());
        let engine = engine(&store);
        let loaded = fixtures::printer(&store, "Loaded", Some("PLA"), "available");
        for _ in 0..2 {
            let order = fixtures::new_order(&store);
            engine
                .auto_assign(
                    &AutoAssignRequest::new(order.to_string()).with_printer(loaded.to_string()),
                )
                .unwrap();
        }
        let idle = fixtures::printer(&store, "Idle", Some("PLA"), "available");

        let order = fixtures::new_order(&store);
        let result = engine
            .auto_assign(&AutoAssignRequest::new(order.to_string()).with_material("PLA"))
            .unwrap();
        assert_eq!(result.printer_id, idle);
        assert_eq!(result.queue_position, 0);
    }

    #[test]
    fn test_auto_queues_on_busy_printer() {
        let store = Arc::new(SqliteWorkQueue::in_memory().unwrap());
        let engine = engine(&store);
        let only = fixtures::printer(&store, "Only", Some("PETG"), "available");

        let first = fixtures::new_order(&store);
        engine
            .auto_assign(&AutoAssignRequest::new(first.to_string()))
            .unwrap();

        let second = fixtures::new_order(&store);
        let result = engine
            .auto_assign(
                &AutoAssignRequest::new(second.to_string())
                    .with_material("petg")
                    .with_estimated_hours(3.0),
            )
            .unwrap();
        assert_eq!(result.printer_id, only);
        assert_eq!(result.queue_position, 1);
        assert_eq!(
            result.estimated_start - Duration::hours(3),
            result.estimated_completion - Duration::hours(6)
        );
    }

    #[test]
    fn test_completion_targets_own_order() {
        let store = Arc::new(SqliteWorkQueue::in_memory().unwrap());
        let engine = engine(&store);
        let printer = fixtures::printer(&store, "P", None, "available");
        let a = fixtures::new_order(&store);
        let b = fixtures::new_order(&store);
        engine.auto_assign(&AutoAssignRequest::new(a.to_string())).unwrap();
        engine.auto_assign(&AutoAssignRequest::new(b.to_string())).unwrap();

        let released = engine.complete_assignment(&b.to_string()).unwrap();
        assert_eq!(released.status, PrinterStatus::Busy);

        let listed = store
            .list_printers(&crate::printer::PrinterFilter::new())
            .unwrap();
        let entry = listed.iter().find(|p| p.printer.id == printer).unwrap();
        assert_eq!(entry.current_job.as_ref().unwrap().order_id, a);
        assert_eq!(entry.queue_jobs, 0);

        let released = engine.complete_assignment(&a.to_string()).unwrap();
        assert_eq!(released.status, PrinterStatus::Available);
    }

    #[test]
    fn test_reprint_after_completion() {
        let store = Arc::new(SqliteWorkQueue::in_memory().unwrap());
        let engine = engine(&store);
        fixtures::printer(&store, "P", None, "available");
        let order = fixtures::new_order(&store);

        engine.auto_assign(&AutoAssignRequest::new(order.to_string())).unwrap();
        engine.complete_assignment(&order.to_string()).unwrap();

        let reprint = engine
            .auto_assign(&AutoAssignRequest::new(order.to_string()))
            .unwrap();
        assert_eq!(reprint.queue_position, 0);
        // Already past `new`, so the order status is untouched.
        assert_eq!(
            store.get_order(order).unwrap().unwrap().status,
            OrderStatus::Printing
        );
    }
}
