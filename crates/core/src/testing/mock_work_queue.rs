//! In-memory work-queue store with explicit row-lock simulation.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::assignment::{Assignment, AssignmentError, Candidate, WorkQueueStore, WorkQueueTx};
use crate::order::{OrderError, OrderStatus, OrderStatusTx};
use crate::printer::{Printer, PrinterStatus};

#[derive(Debug, Clone, Default)]
struct MockState {
    /// Insertion order doubles as age order.
    printers: Vec<Printer>,
    orders: HashMap<Uuid, OrderStatus>,
    assignments: Vec<Assignment>,
    /// Printer rows held by a simulated concurrent transaction.
    externally_locked: HashSet<Uuid>,
}

impl MockState {
    fn candidate(&self, printer: &Printer) -> Candidate {
        let active: Vec<&Assignment> = self
            .assignments
            .iter()
            .filter(|a| a.printer_id == printer.id && a.is_active())
            .collect();
        Candidate {
            printer: printer.clone(),
            active_jobs: active.len() as u32,
            last_assigned_at: active.iter().map(|a| a.assigned_at).max(),
        }
    }

    fn printer_mut(&mut self, id: Uuid) -> Option<&mut Printer> {
        self.printers.iter_mut().find(|p| p.id == id)
    }
}

/// Mock implementation of [`WorkQueueStore`].
///
/// Each transaction works on a copy of the state that is swapped in
/// only on commit, so a failed unit of work leaves no trace. Rows can be
/// marked as locked by another transaction to exercise skip-locked scans.
///
/// # Example
///
/// ```rust,ignore
/// let queue = MockWorkQueue::new();
/// let printer = queue.add_printer("P1", Some("PLA"), PrinterStatus::Available);
/// queue.lock_externally(printer);
/// let result = queue.run(|tx| select_auto(tx, "PLA"));
/// ```
#[derive(Debug, Default)]
pub struct MockWorkQueue {
    state: Mutex<MockState>,
    transactions: AtomicUsize,
}

impl MockWorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for [`WorkQueueStore::with_transaction`].
    pub fn run<T, F>(&self, work: F) -> Result<T, AssignmentError>
    where
        F: FnOnce(&mut dyn WorkQueueTx) -> Result<T, AssignmentError>,
    {
        self.with_transaction(work)
    }

    /// Add a printer. Each printer is one second younger than the previous.
    pub fn add_printer(&self, name: &str, material: Option<&str>, status: PrinterStatus) -> Uuid {
        let mut state = self.state.lock().unwrap();
        let created_at =
            Utc::now() - Duration::days(1) + Duration::seconds(state.printers.len() as i64);
        let printer = Printer {
            id: Uuid::new_v4(),
            name: name.to_string(),
            model: None,
            material: material.map(str::to_string),
            status,
            created_at,
            updated_at: created_at,
        };
        let id = printer.id;
        state.printers.push(printer);
        id
    }

    pub fn add_order(&self, status: OrderStatus) -> Uuid {
        let id = Uuid::new_v4();
        self.state.lock().unwrap().orders.insert(id, status);
        id
    }

    /// Queue `count` jobs for unrelated orders on the printer.
    pub fn add_active_jobs(&self, printer_id: Uuid, count: u32) {
        let mut state = self.state.lock().unwrap();
        let now = Utc::now();
        for i in 0..count {
            let order_id = Uuid::new_v4();
            state.orders.insert(order_id, OrderStatus::Printing);
            state.assignments.push(Assignment {
                id: Uuid::new_v4(),
                order_id,
                printer_id,
                assigned_at: now - Duration::minutes(i64::from(count - i)),
                completed_at: None,
            });
        }
    }

    /// Mark a printer row as held by another transaction.
    pub fn lock_externally(&self, printer_id: Uuid) {
        self.state
            .lock()
            .unwrap()
            .externally_locked
            .insert(printer_id);
    }

    /// Overwrite a printer status outside any transaction.
    pub fn force_status(&self, printer_id: Uuid, status: PrinterStatus) {
        if let Some(printer) = self.state.lock().unwrap().printer_mut(printer_id) {
            printer.status = status;
        }
    }

    pub fn printer_status(&self, printer_id: Uuid) -> PrinterStatus {
        self.state
            .lock()
            .unwrap()
            .printers
            .iter()
            .find(|p| p.id == printer_id)
            .map(|p| p.status)
            .expect("unknown printer")
    }

    pub fn order_status(&self, order_id: Uuid) -> OrderStatus {
        *self
            .state
            .lock()
            .unwrap()
            .orders
            .get(&order_id)
            .expect("unknown order")
    }

    pub fn active_assignments_for_order(&self, order_id: Uuid) -> usize {
        self.state
            .lock()
            .unwrap()
            .assignments
            .iter()
            .filter(|a| a.order_id == order_id && a.is_active())
            .count()
    }

    /// Number of transactions begun so far.
    pub fn transactions_started(&self) -> usize {
        self.transactions.load(Ordering::SeqCst)
    }
}

impl WorkQueueStore for MockWorkQueue {
    fn with_transaction<T, F>(&self, work: F) -> Result<T, AssignmentError>
    where
        F: FnOnce(&mut dyn WorkQueueTx) -> Result<T, AssignmentError>,
    {
        self.transactions.fetch_add(1, Ordering::SeqCst);
        let mut committed = self.state.lock().unwrap();
        let mut working = committed.clone();

        let result = work(&mut MockTx {
            state: &mut working,
        })?;

        *committed = working;
        Ok(result)
    }
}

struct MockTx<'a> {
    state: &'a mut MockState,
}

impl OrderStatusTx for MockTx<'_> {
    fn order_status_for_update(
        &mut self,
        order_id: Uuid,
    ) -> Result<Option<OrderStatus>, OrderError> {
        Ok(self.state.orders.get(&order_id).copied())
    }

    fn set_order_status(&mut self, order_id: Uuid, status: OrderStatus) -> Result<(), OrderError> {
        match self.state.orders.get_mut(&order_id) {
            Some(current) => {
                *current = status;
                Ok(())
            }
            None => Err(OrderError::NotFound(order_id)),
        }
    }
}

impl WorkQueueTx for MockTx<'_> {
    fn lock_printer(&mut self, printer_id: Uuid) -> Result<Option<Candidate>, AssignmentError> {
        if self.state.externally_locked.contains(&printer_id) {
            return Err(AssignmentError::Database(
                "lock wait timeout exceeded".to_string(),
            ));
        }
        Ok(self
            .state
            .printers
            .iter()
            .find(|p| p.id == printer_id)
            .map(|p| self.state.candidate(p)))
    }

    fn try_lock_printer(
        &mut self,
        printer_id: Uuid,
    ) -> Result<Option<Candidate>, AssignmentError> {
        if self.state.externally_locked.contains(&printer_id) {
            return Ok(None);
        }
        self.lock_printer(printer_id)
    }

    fn ranked_printers(
        &mut self,
        status: PrinterStatus,
    ) -> Result<Vec<Candidate>, AssignmentError> {
        let mut ranked: Vec<Candidate> = self
            .state
            .printers
            .iter()
            .filter(|p| p.status == status)
            .map(|p| self.state.candidate(p))
            .collect();
        ranked.sort_by_key(|c| (c.active_jobs, c.printer.created_at));
        Ok(ranked)
    }

    fn active_assignment_for_order(
        &mut self,
        order_id: Uuid,
    ) -> Result<Option<Uuid>, AssignmentError> {
        Ok(self
            .state
            .assignments
            .iter()
            .find(|a| a.order_id == order_id && a.is_active())
            .map(|a| a.id))
    }

    fn oldest_active_assignment_for_order(
        &mut self,
        order_id: Uuid,
    ) -> Result<Option<Assignment>, AssignmentError> {
        Ok(self
            .state
            .assignments
            .iter()
            .filter(|a| a.order_id == order_id && a.is_active())
            .min_by_key(|a| a.assigned_at)
            .cloned())
    }

    fn insert_assignment(&mut self, assignment: &Assignment) -> Result<(), AssignmentError> {
        self.state.assignments.push(assignment.clone());
        Ok(())
    }

    fn mark_completed(
        &mut self,
        assignment_id: Uuid,
        completed_at: DateTime<Utc>,
    ) -> Result<(), AssignmentError> {
        let assignment = self
            .state
            .assignments
            .iter_mut()
            .find(|a| a.id == assignment_id)
            .ok_or(AssignmentError::AssignmentNotFound)?;
        assignment.completed_at = Some(completed_at);
        Ok(())
    }

    fn count_active_for_printer(&mut self, printer_id: Uuid) -> Result<u32, AssignmentError> {
        Ok(self
            .state
            .assignments
            .iter()
            .filter(|a| a.printer_id == printer_id && a.is_active())
            .count() as u32)
    }

    fn get_printer(&mut self, printer_id: Uuid) -> Result<Option<Printer>, AssignmentError> {
        Ok(self
            .state
            .printers
            .iter()
            .find(|p| p.id == printer_id)
            .cloned())
    }

    fn set_printer_status(
        &mut self,
        printer_id: Uuid,
        status: PrinterStatus,
    ) -> Result<Printer, AssignmentError> {
        let printer = self
            .state
            .printer_mut(printer_id)
            .ok_or(AssignmentError::PrinterNotFound)?;
        printer.status = status;
        printer.updated_at = Utc::now();
        Ok(printer.clone())
    }
}
