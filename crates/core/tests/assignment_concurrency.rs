//! Concurrency tests for the work queue.
//!
//! Each test opens two store handles (two connections) on the same database
//! file and races engines built on them from plain threads.

use std::collections::HashMap;
use std::sync::{Arc, Barrier};
use std::thread;

use tempfile::TempDir;
use uuid::Uuid;

use printqueue_core::{
    testing::fixtures, AssignmentConfig, AssignmentEngine, AssignmentError, AutoAssignRequest,
    AutoAssignResult, PrinterFilter, PrinterRegistry, PrinterStatus, SqliteWorkQueue,
};

struct TestHarness {
    stores: [Arc<SqliteWorkQueue>; 2],
    _temp_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("queue.db");

        let first = Arc::new(SqliteWorkQueue::new(&db_path).expect("Failed to open store"));
        let second = Arc::new(SqliteWorkQueue::new(&db_path).expect("Failed to open store"));

        Self {
            stores: [first, second],
            _temp_dir: temp_dir,
        }
    }

    fn store(&self) -> &SqliteWorkQueue {
        &self.stores[0]
    }

    fn engine(&self, i: usize) -> AssignmentEngine<SqliteWorkQueue> {
        AssignmentEngine::new(Arc::clone(&self.stores[i % 2]), AssignmentConfig::default())
    }

    /// Active jobs per printer as seen through the listing.
    fn active_jobs(&self) -> HashMap<Uuid, (PrinterStatus, u32)> {
        self.store()
            .list_printers(&PrinterFilter::new())
            .unwrap()
            .into_iter()
            .map(|p| {
                let active = p.queue_jobs + u32::from(p.current_job.is_some());
                (p.printer.id, (p.printer.status, active))
            })
            .collect()
    }

    /// Run `work(i)` on `threads` threads released together.
    fn race<T, F>(&self, threads: usize, work: F) -> Vec<T>
    where
        T: Send + 'static,
        F: Fn(usize, AssignmentEngine<SqliteWorkQueue>) -> T + Send + Sync + 'static,
    {
        let barrier = Arc::new(Barrier::new(threads));
        let work = Arc::new(work);
        let handles: Vec<_> = (0..threads)
            .map(|i| {
                let barrier = Arc::clone(&barrier);
                let work = Arc::clone(&work);
                let engine = self.engine(i);
                thread::spawn(move || {
                    barrier.wait();
                    work(i, engine)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("worker panicked"))
            .collect()
    }
}

#[test]
fn test_same_order_race_has_one_winner() {
    let harness = TestHarness::new();
    fixtures::printer(harness.store(), "A", None, "available");
    fixtures::printer(harness.store(), "B", None, "available");
    let order = fixtures::new_order(harness.store());

    let results = harness.race(8, move |_, engine| {
        engine.auto_assign(&AutoAssignRequest::new(order.to_string()))
    });

    let winners: Vec<&AutoAssignResult> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    for result in &results {
        if let Err(e) = result {
            assert!(
                matches!(e, AssignmentError::OrderAlreadyAssigned),
                "unexpected error: {}",
                e
            );
        }
    }

    let total_active: u32 = harness.active_jobs().values().map(|(_, n)| n).sum();
    assert_eq!(total_active, 1);
}

#[test]
fn test_distinct_orders_queue_consistently() {
    let harness = TestHarness::new();
    let printers: Vec<Uuid> = (0..3)
        .map(|i| fixtures::printer(harness.store(), &format!("P{}", i), None, "available"))
        .collect();
    let orders: Arc<Vec<Uuid>> =
        Arc::new((0..12).map(|_| fixtures::new_order(harness.store())).collect());

    let race_orders = Arc::clone(&orders);
    let results = harness.race(12, move |i, engine| {
        engine.auto_assign(&AutoAssignRequest::new(race_orders[i].to_string()))
    });

    let mut positions: HashMap<Uuid, Vec<u32>> = HashMap::new();
    for result in results {
        let assigned = result.expect("every distinct order should be assigned");
        positions
            .entry(assigned.printer_id)
            .or_default()
            .push(assigned.queue_position);
    }

    // Queue positions on each printer are exactly 0..n with no gaps or repeats.
    for (printer, mut seen) in positions.clone() {
        seen.sort_unstable();
        let expected: Vec<u32> = (0..seen.len() as u32).collect();
        assert_eq!(seen, expected, "queue positions for printer {}", printer);
    }

    // Least-loaded selection keeps the load balanced.
    let active = harness.active_jobs();
    for printer in &printers {
        let (status, jobs) = active[printer];
        assert_eq!(jobs, 4);
        assert_eq!(status, PrinterStatus::Busy);
        assert_eq!(positions[printer].len(), 4);
    }
}

#[test]
fn test_assign_and_complete_keep_occupancy_consistent() {
    let harness = TestHarness::new();
    fixtures::printer(harness.store(), "A", None, "available");
    fixtures::printer(harness.store(), "B", None, "available");

    // Half the orders are pre-assigned and get completed during the race
    // while the other half are being assigned.
    let engine = harness.engine(0);
    let assigned: Vec<Uuid> = (0..6)
        .map(|_| {
            let order = fixtures::new_order(harness.store());
            engine
                .auto_assign(&AutoAssignRequest::new(order.to_string()))
                .unwrap();
            order
        })
        .collect();
    let fresh: Vec<Uuid> = (0..6).map(|_| fixtures::new_order(harness.store())).collect();

    let work: Arc<Vec<(Uuid, bool)>> = Arc::new(
        assigned
            .iter()
            .map(|id| (*id, true))
            .chain(fresh.iter().map(|id| (*id, false)))
            .collect(),
    );
    let race_work = Arc::clone(&work);
    let results = harness.race(12, move |i, engine| {
        let (order, complete) = race_work[i];
        if complete {
            engine.complete_assignment(&order.to_string()).map(|_| ())
        } else {
            engine
                .auto_assign(&AutoAssignRequest::new(order.to_string()))
                .map(|_| ())
        }
    });
    for result in results {
        result.expect("no operation in the race should fail");
    }

    let active = harness.active_jobs();
    let total: u32 = active.values().map(|(_, n)| n).sum();
    assert_eq!(total, 6);
    for (status, jobs) in active.values() {
        assert_eq!(*status, PrinterStatus::from_active_jobs(*jobs));
    }

    // Completing everything leaves every printer idle.
    for order in &fresh {
        engine.complete_assignment(&order.to_string()).unwrap();
    }
    for (status, jobs) in harness.active_jobs().values() {
        assert_eq!(*jobs, 0);
        assert_eq!(*status, PrinterStatus::Available);
    }
}

#[test]
fn test_second_handle_sees_committed_assignment() {
    let harness = TestHarness::new();
    fixtures::printer(harness.store(), "A", Some("PLA"), "available");
    let order = fixtures::new_order(harness.store());

    harness
        .engine(0)
        .auto_assign(&AutoAssignRequest::new(order.to_string()).with_material("pla"))
        .unwrap();

    let err = harness
        .engine(1)
        .auto_assign(&AutoAssignRequest::new(order.to_string()))
        .unwrap_err();
    assert!(matches!(err, AssignmentError::OrderAlreadyAssigned));

    harness
        .engine(1)
        .complete_assignment(&order.to_string())
        .unwrap();
    let reassigned = harness
        .engine(0)
        .auto_assign(&AutoAssignRequest::new(order.to_string()))
        .unwrap();
    assert_eq!(reassigned.queue_position, 0);
}
