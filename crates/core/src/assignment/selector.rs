//! Printer selection under row locks.

use tracing::debug;
use uuid::Uuid;

use super::{AssignmentError, Candidate, WorkQueueTx};
use crate::printer::{material_supported, PrinterStatus};

/// Select a specific printer, waiting for its row lock.
///
/// The caller pinned this printer, so waiting behind a concurrent
/// transaction on the same row is acceptable.
pub fn select_preferred(
    tx: &mut dyn WorkQueueTx,
    printer_id: Uuid,
    material: &str,
) -> Result<Candidate, AssignmentError> {
    let candidate = tx
        .lock_printer(printer_id)?
        .ok_or(AssignmentError::PrinterNotFound)?;

    if candidate.printer.status.is_override() {
        debug!(
            "Preferred printer {} is {}",
            printer_id, candidate.printer.status
        );
        return Err(AssignmentError::PrinterUnavailable);
    }

    if !material_supported(candidate.printer.material.as_deref(), material) {
        debug!(
            "Preferred printer {} does not support material {:?}",
            printer_id, material
        );
        return Err(AssignmentError::NoCompatiblePrinter);
    }

    Ok(candidate)
}

/// Pick the least loaded compatible printer, preferring idle ones.
///
/// Phase one scans `available` printers, phase two falls back to queueing on
/// a `busy` one. Both phases walk candidates in (active jobs, age) order and
/// skip rows another transaction has locked rather than waiting on them.
///
/// A printer with no declared material list is unrestricted, so it remains a
/// candidate for any requested material, matching [`select_preferred`].
pub fn select_auto(
    tx: &mut dyn WorkQueueTx,
    material: &str,
) -> Result<Candidate, AssignmentError> {
    for status in [PrinterStatus::Available, PrinterStatus::Busy] {
        if let Some(candidate) = first_unlocked(tx, status, material)? {
            debug!(
                "Auto-selected {} printer {} with {} active job(s)",
                status, candidate.printer.id, candidate.active_jobs
            );
            return Ok(candidate);
        }
        debug!("No {} printer matches material {:?}", status, material);
    }

    Err(AssignmentError::NoCompatiblePrinter)
}

fn first_unlocked(
    tx: &mut dyn WorkQueueTx,
    status: PrinterStatus,
    material: &str,
) -> Result<Option<Candidate>, AssignmentError> {
    let ranked = tx.ranked_printers(status)?;

    for ranked_candidate in ranked {
        if !material_supported(ranked_candidate.printer.material.as_deref(), material) {
            continue;
        }

        // Re-check after locking: the row may have changed since the scan.
        let Some(locked) = tx.try_lock_printer(ranked_candidate.printer.id)? else {
            continue;
        };
        if locked.printer.status == status
            && material_supported(locked.printer.material.as_deref(), material)
        {
            return Ok(Some(locked));
        }
    }

    Ok(None)
}
