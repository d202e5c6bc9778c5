//! Transactional access to the printer registry and assignment ledger.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Assignment, AssignmentError, Candidate};
use crate::order::OrderStatusTx;
use crate::printer::{Printer, PrinterStatus};

/// Operations available inside one work-queue transaction.
///
/// Implementations must give every read the lock semantics named on the
/// method and keep all writes invisible to other transactions until commit.
pub trait WorkQueueTx: OrderStatusTx {
    /// Lock one printer row, waiting for any transaction that holds it.
    fn lock_printer(&mut self, printer_id: Uuid) -> Result<Option<Candidate>, AssignmentError>;

    /// Lock one printer row without waiting. Returns `None` if the row is
    /// held by another transaction or no longer exists.
    fn try_lock_printer(&mut self, printer_id: Uuid)
        -> Result<Option<Candidate>, AssignmentError>;

    /// Printers in `status`, ranked by active job count then age (oldest
    /// first). Rows are not locked.
    fn ranked_printers(&mut self, status: PrinterStatus) -> Result<Vec<Candidate>, AssignmentError>;

    /// Id of the order's active assignment, if any.
    fn active_assignment_for_order(
        &mut self,
        order_id: Uuid,
    ) -> Result<Option<Uuid>, AssignmentError>;

    /// Lock and return the order's oldest active assignment.
    fn oldest_active_assignment_for_order(
        &mut self,
        order_id: Uuid,
    ) -> Result<Option<Assignment>, AssignmentError>;

    fn insert_assignment(&mut self, assignment: &Assignment) -> Result<(), AssignmentError>;

    fn mark_completed(
        &mut self,
        assignment_id: Uuid,
        completed_at: DateTime<Utc>,
    ) -> Result<(), AssignmentError>;

    fn count_active_for_printer(&mut self, printer_id: Uuid) -> Result<u32, AssignmentError>;

    fn get_printer(&mut self, printer_id: Uuid) -> Result<Option<Printer>, AssignmentError>;

    fn set_printer_status(
        &mut self,
        printer_id: Uuid,
        status: PrinterStatus,
    ) -> Result<Printer, AssignmentError>;
}

/// A store that can run a unit of work atomically.
pub trait WorkQueueStore: Send + Sync {
    /// Run `work` in a transaction. Commits when it returns `Ok`, rolls back
    /// otherwise; locks are released either way.
    fn with_transaction<T, F>(&self, work: F) -> Result<T, AssignmentError>
    where
        F: FnOnce(&mut dyn WorkQueueTx) -> Result<T, AssignmentError>;
}
