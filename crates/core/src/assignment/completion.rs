//! Completion: release a printer from a finished job.

use chrono::Utc;
use tracing::info;

use super::engine::parse_order_id;
use super::{AssignmentEngine, AssignmentError, WorkQueueStore};
use crate::metrics::COMPLETIONS_TOTAL;
use crate::printer::{Printer, PrinterStatus};

impl<S: WorkQueueStore> AssignmentEngine<S> {
    /// Complete the order's oldest active assignment and recompute the
    /// printer's occupancy.
    ///
    /// The printer returns to `available` when no active jobs remain and stays
    /// `busy` otherwise. A printer under a `maintenance`/`offline` override
    /// keeps its override.
    pub fn complete_assignment(&self, order_id: &str) -> Result<Printer, AssignmentError> {
        let result = self.complete_inner(order_id);
        let label = match &result {
            Ok(_) => "completed",
            Err(e) => e.kind(),
        };
        COMPLETIONS_TOTAL.with_label_values(&[label]).inc();
        result
    }

    fn complete_inner(&self, order_id: &str) -> Result<Printer, AssignmentError> {
        let order_id = parse_order_id(order_id)?;

        let (printer, remaining) = self.store().with_transaction(|tx| {
            let assignment = tx
                .oldest_active_assignment_for_order(order_id)?
                .ok_or(AssignmentError::AssignmentNotFound)?;

            tx.mark_completed(assignment.id, Utc::now())?;

            let remaining = tx.count_active_for_printer(assignment.printer_id)?;
            let current = tx
                .get_printer(assignment.printer_id)?
                .ok_or(AssignmentError::PrinterNotFound)?;

            let printer = if current.status.is_override() {
                current
            } else {
                tx.set_printer_status(
                    assignment.printer_id,
                    PrinterStatus::from_active_jobs(remaining),
                )?
            };

            Ok((printer, remaining))
        })?;

        info!(
            "Completed order {} on printer {} ({} job(s) remaining, now {})",
            order_id, printer.id, remaining, printer.status
        );

        Ok(printer)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::assignment::AutoAssignRequest;
    use crate::config::AssignmentConfig;
    use crate::order::OrderStatus;
    use crate::testing::MockWorkQueue;

    fn engine(queue: &Arc<MockWorkQueue>) -> AssignmentEngine<MockWorkQueue> {
        AssignmentEngine::new(Arc::clone(queue), AssignmentConfig::default())
    }

    #[test]
    fn test_complete_invalid_order_id() {
        let queue = Arc::new(MockWorkQueue::new());
        let result = engine(&queue).complete_assignment("not-a-uuid");
        assert!(matches!(result, Err(AssignmentError::InvalidOrderId(_))));
    }

    #[test]
    fn test_complete_without_assignment() {
        let queue = Arc::new(MockWorkQueue::new());
        let order = queue.add_order(OrderStatus::Printing);
        let result = engine(&queue).complete_assignment(&order.to_string());
        assert!(matches!(result, Err(AssignmentError::AssignmentNotFound)));
    }

    #[test]
    fn test_complete_last_job_frees_printer() {
        let queue = Arc::new(MockWorkQueue::new());
        let printer = queue.add_printer("P1", None, PrinterStatus::Available);
        let order = queue.add_order(OrderStatus::New);
        let engine = engine(&queue);

        engine
            .auto_assign(&AutoAssignRequest::new(order.to_string()))
            .unwrap();
        let released = engine.complete_assignment(&order.to_string()).unwrap();

        assert_eq!(released.id, printer);
        assert_eq!(released.status, PrinterStatus::Available);
        assert_eq!(queue.active_assignments_for_order(order), 0);
    }

    #[test]
    fn test_complete_keeps_busy_with_queue() {
        let queue = Arc::new(MockWorkQueue::new());
        let printer = queue.add_printer("P1", None, PrinterStatus::Available);
        let first = queue.add_order(OrderStatus::New);
        let second = queue.add_order(OrderStatus::New);
        let engine = engine(&queue);

        engine
            .auto_assign(&AutoAssignRequest::new(first.to_string()))
            .unwrap();
        engine
            .auto_assign(&AutoAssignRequest::new(second.to_string()))
            .unwrap();

        let released = engine.complete_assignment(&first.to_string()).unwrap();
        assert_eq!(released.id, printer);
        assert_eq!(released.status, PrinterStatus::Busy);
        assert_eq!(queue.active_assignments_for_order(second), 1);
    }

    #[test]
    fn test_complete_is_keyed_by_order() {
        let queue = Arc::new(MockWorkQueue::new());
        queue.add_printer("P1", None, PrinterStatus::Available);
        let first = queue.add_order(OrderStatus::New);
        let second = queue.add_order(OrderStatus::New);
        let engine = engine(&queue);

        engine
            .auto_assign(&AutoAssignRequest::new(first.to_string()))
            .unwrap();
        engine
            .auto_assign(&AutoAssignRequest::new(second.to_string()))
            .unwrap();

        engine.complete_assignment(&second.to_string()).unwrap();
        assert_eq!(queue.active_assignments_for_order(first), 1);
        assert_eq!(queue.active_assignments_for_order(second), 0);
    }

    #[test]
    fn test_complete_preserves_override() {
        let queue = Arc::new(MockWorkQueue::new());
        let printer = queue.add_printer("P1", None, PrinterStatus::Available);
        let order = queue.add_order(OrderStatus::New);
        let engine = engine(&queue);

        engine
            .auto_assign(&AutoAssignRequest::new(order.to_string()))
            .unwrap();
        queue.force_status(printer, PrinterStatus::Maintenance);

        let released = engine.complete_assignment(&order.to_string()).unwrap();
        assert_eq!(released.status, PrinterStatus::Maintenance);
    }

    #[test]
    fn test_complete_twice_fails_second_time() {
        let queue = Arc::new(MockWorkQueue::new());
        queue.add_printer("P1", None, PrinterStatus::Available);
        let order = queue.add_order(OrderStatus::New);
        let engine = engine(&queue);

        engine
            .auto_assign(&AutoAssignRequest::new(order.to_string()))
            .unwrap();
        engine.complete_assignment(&order.to_string()).unwrap();

        let result = engine.complete_assignment(&order.to_string());
        assert!(matches!(result, Err(AssignmentError::AssignmentNotFound)));
    }
}
