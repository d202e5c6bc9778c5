//! Assignment engine: binds an order to a printer in one transaction.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    estimated_duration, select_auto, select_preferred, Assignment, AssignmentError,
    AutoAssignRequest, AutoAssignResult, QueueEstimate, WorkQueueStore,
};
use crate::config::AssignmentConfig;
use crate::metrics::{ASSIGNMENTS_TOTAL, QUEUE_POSITION};
use crate::order::OrderStatus;
use crate::printer::{normalize_material, PrinterStatus};

/// Entry point for assigning and completing printer jobs.
pub struct AssignmentEngine<S> {
    store: Arc<S>,
    config: AssignmentConfig,
}

impl<S> Clone for AssignmentEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S: WorkQueueStore> AssignmentEngine<S> {
    pub fn new(store: Arc<S>, config: AssignmentConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &AssignmentConfig {
        &self.config
    }

    /// Bind an order to a printer.
    ///
    /// Fails with `OrderAlreadyAssigned` if the order already holds an active
    /// assignment. The order row lock serializes concurrent calls for the same
    /// order, so only one of them can pass that check. On any error nothing is
    /// written.
    pub fn auto_assign(
        &self,
        request: &AutoAssignRequest,
    ) -> Result<AutoAssignResult, AssignmentError> {
        let result = self.assign_inner(request);
        match &result {
            Ok(assigned) => {
                ASSIGNMENTS_TOTAL.with_label_values(&["assigned"]).inc();
                QUEUE_POSITION.observe(f64::from(assigned.queue_position));
            }
            Err(e) => {
                ASSIGNMENTS_TOTAL.with_label_values(&[e.kind()]).inc();
            }
        }
        result
    }

    fn assign_inner(
        &self,
        request: &AutoAssignRequest,
    ) -> Result<AutoAssignResult, AssignmentError> {
        let order_id = parse_order_id(&request.order_id)?;
        let preferred_printer = request
            .printer_id
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .map(|raw| {
                Uuid::parse_str(raw).map_err(|_| AssignmentError::InvalidPrinterId(raw.to_string()))
            })
            .transpose()?;
        let duration = estimated_duration(request.estimated_time_hours, &self.config)?;
        let material = normalize_material(request.material.as_deref());

        let (assignment, candidate) = self.store.with_transaction(|tx| {
            let order_status = tx
                .order_status_for_update(order_id)?
                .ok_or(AssignmentError::OrderNotFound)?;

            if let Some(existing) = tx.active_assignment_for_order(order_id)? {
                warn!(
                    "Order {} already has active assignment {}",
                    order_id, existing
                );
                return Err(AssignmentError::OrderAlreadyAssigned);
            }

            let candidate = match preferred_printer {
                Some(printer_id) => select_preferred(tx, printer_id, &material)?,
                None => select_auto(tx, &material)?,
            };

            // Keep assigned_at non-decreasing within the printer's active set
            // even if clocks disagree between writers.
            let now = Utc::now();
            let assigned_at = match candidate.last_assigned_at {
                Some(last) if last > now => last,
                _ => now,
            };

            let assignment = Assignment {
                id: Uuid::new_v4(),
                order_id,
                printer_id: candidate.printer.id,
                assigned_at,
                completed_at: None,
            };
            tx.insert_assignment(&assignment)?;

            if candidate.printer.status != PrinterStatus::Busy {
                tx.set_printer_status(candidate.printer.id, PrinterStatus::Busy)?;
            }

            if order_status == OrderStatus::New {
                tx.set_order_status(order_id, OrderStatus::Printing)?;
            }

            Ok((assignment, candidate))
        })?;

        let queue_position = candidate.active_jobs;
        let estimate = QueueEstimate::compute(assignment.assigned_at, queue_position, duration);

        info!(
            "Assigned order {} to printer {} ({}) at queue position {}",
            order_id, candidate.printer.name, candidate.printer.id, queue_position
        );

        Ok(AutoAssignResult {
            assignment_id: assignment.id,
            order_id,
            printer_id: candidate.printer.id,
            printer_name: candidate.printer.name,
            queue_position,
            estimated_start: estimate.start,
            estimated_completion: estimate.completion,
        })
    }
}

pub(super) fn parse_order_id(raw: &str) -> Result<Uuid, AssignmentError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AssignmentError::InvalidOrderId(raw.to_string()));
    }
    Uuid::parse_str(trimmed).map_err(|_| AssignmentError::InvalidOrderId(raw.to_string()))
}
