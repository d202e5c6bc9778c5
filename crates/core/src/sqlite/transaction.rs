//! One work-queue unit of work on SQLite.

use chrono::{DateTime, Utc};
use rusqlite::{ffi, params, OptionalExtension, Transaction};
use uuid::Uuid;

use super::rows::{
    format_ts, order_status_col, row_to_assignment, row_to_candidate, row_to_printer,
    ASSIGNMENT_COLUMNS, CANDIDATE_SELECT, PRINTER_COLUMNS,
};
use crate::assignment::{Assignment, AssignmentError, Candidate, WorkQueueTx};
use crate::order::{OrderError, OrderStatus, OrderStatusTx};
use crate::printer::{Printer, PrinterStatus};

pub(super) struct SqliteTx<'c> {
    tx: Transaction<'c>,
}

impl<'c> SqliteTx<'c> {
    pub(super) fn new(tx: Transaction<'c>) -> Self {
        Self { tx }
    }

    pub(super) fn commit(self) -> rusqlite::Result<()> {
        self.tx.commit()
    }

    fn candidate_by_id(&self, printer_id: Uuid) -> Result<Option<Candidate>, AssignmentError> {
        let sql = format!("{} WHERE p.id = ?1", CANDIDATE_SELECT);
        Ok(self
            .tx
            .query_row(&sql, params![printer_id.to_string()], row_to_candidate)
            .optional()?)
    }
}

impl OrderStatusTx for SqliteTx<'_> {
    fn order_status_for_update(
        &mut self,
        order_id: Uuid,
    ) -> Result<Option<OrderStatus>, OrderError> {
        self.tx
            .query_row(
                "SELECT status FROM orders WHERE id = ?1",
                params![order_id.to_string()],
                |row| order_status_col(row, 0),
            )
            .optional()
            .map_err(|e| OrderError::Database(e.to_string()))
    }

    fn set_order_status(&mut self, order_id: Uuid, status: OrderStatus) -> Result<(), OrderError> {
        let updated = self
            .tx
            .execute(
                "UPDATE orders SET status = ?1, updated_at = ?2 WHERE id = ?3",
                params![status.as_str(), format_ts(&Utc::now()), order_id.to_string()],
            )
            .map_err(|e| OrderError::Database(e.to_string()))?;
        if updated == 0 {
            return Err(OrderError::NotFound(order_id));
        }
        Ok(())
    }
}

impl WorkQueueTx for SqliteTx<'_> {
    fn lock_printer(&mut self, printer_id: Uuid) -> Result<Option<Candidate>, AssignmentError> {
        // The immediate transaction already holds the write lock.
        self.candidate_by_id(printer_id)
    }

    fn try_lock_printer(
        &mut self,
        printer_id: Uuid,
    ) -> Result<Option<Candidate>, AssignmentError> {
        // No other transaction can hold a row while we hold the write lock.
        self.candidate_by_id(printer_id)
    }

    fn ranked_printers(
        &mut self,
        status: PrinterStatus,
    ) -> Result<Vec<Candidate>, AssignmentError> {
        let sql = format!(
            "{} WHERE p.status = ?1 ORDER BY active_jobs ASC, p.created_at ASC, p.rowid ASC",
            CANDIDATE_SELECT
        );
        let mut stmt = self.tx.prepare(&sql)?;
        let rows = stmt.query_map(params![status.as_str()], row_to_candidate)?;

        let mut candidates = Vec::new();
        for row in rows {
            candidates.push(row?);
        }
        Ok(candidates)
    }

    fn active_assignment_for_order(
        &mut self,
        order_id: Uuid,
    ) -> Result<Option<Uuid>, AssignmentError> {
        let id: Option<String> = self
            .tx
            .query_row(
                "SELECT id FROM printer_assignments
                 WHERE order_id = ?1 AND completed_at IS NULL LIMIT 1",
                params![order_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        id.map(|raw| {
            Uuid::parse_str(&raw).map_err(|e| AssignmentError::Database(e.to_string()))
        })
        .transpose()
    }

    fn oldest_active_assignment_for_order(
        &mut self,
        order_id: Uuid,
    ) -> Result<Option<Assignment>, AssignmentError> {
        let sql = format!(
            "SELECT {} FROM printer_assignments
             WHERE order_id = ?1 AND completed_at IS NULL
             ORDER BY assigned_at ASC, rowid ASC LIMIT 1",
            ASSIGNMENT_COLUMNS
        );
        Ok(self
            .tx
            .query_row(&sql, params![order_id.to_string()], row_to_assignment)
            .optional()?)
    }

    fn insert_assignment(&mut self, assignment: &Assignment) -> Result<(), AssignmentError> {
        let result = self.tx.execute(
            "INSERT INTO printer_assignments (id, order_id, printer_id, assigned_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                assignment.id.to_string(),
                assignment.order_id.to_string(),
                assignment.printer_id.to_string(),
                format_ts(&assignment.assigned_at),
                assignment.completed_at.as_ref().map(format_ts),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            // The partial unique index enforces one active row per order.
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Err(AssignmentError::OrderAlreadyAssigned)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn mark_completed(
        &mut self,
        assignment_id: Uuid,
        completed_at: DateTime<Utc>,
    ) -> Result<(), AssignmentError> {
        let updated = self.tx.execute(
            "UPDATE printer_assignments SET completed_at = ?1
             WHERE id = ?2 AND completed_at IS NULL",
            params![format_ts(&completed_at), assignment_id.to_string()],
        )?;
        if updated == 0 {
            return Err(AssignmentError::AssignmentNotFound);
        }
        Ok(())
    }

    fn count_active_for_printer(&mut self, printer_id: Uuid) -> Result<u32, AssignmentError> {
        let count: i64 = self.tx.query_row(
            "SELECT COUNT(*) FROM printer_assignments
             WHERE printer_id = ?1 AND completed_at IS NULL",
            params![printer_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    fn get_printer(&mut self, printer_id: Uuid) -> Result<Option<Printer>, AssignmentError> {
        let sql = format!("SELECT {} FROM printers p WHERE p.id = ?1", PRINTER_COLUMNS);
        Ok(self
            .tx
            .query_row(&sql, params![printer_id.to_string()], row_to_printer)
            .optional()?)
    }

    fn set_printer_status(
        &mut self,
        printer_id: Uuid,
        status: PrinterStatus,
    ) -> Result<Printer, AssignmentError> {
        let updated = self.tx.execute(
            "UPDATE printers SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), format_ts(&Utc::now()), printer_id.to_string()],
        )?;
        if updated == 0 {
            return Err(AssignmentError::PrinterNotFound);
        }
        self.get_printer(printer_id)?
            .ok_or(AssignmentError::PrinterNotFound)
    }
}
