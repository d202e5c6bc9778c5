//! Administrative printer CRUD on the SQLite store.

use chrono::{Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use uuid::Uuid;

use super::rows::{format_ts, opt_ts_col, opt_uuid_col, row_to_printer, PRINTER_COLUMNS};
use super::SqliteWorkQueue;
use crate::printer::{
    parse_status, sanitize_optional, validate_name, CreatePrinterRequest, CurrentJob, Printer,
    PrinterError, PrinterFilter, PrinterRegistry, PrinterStatus, PrinterWithQueue,
    UpdatePrinterRequest,
};

fn db_err(e: rusqlite::Error) -> PrinterError {
    PrinterError::Database(e.to_string())
}

/// Status to store for an administrative write: overrides are kept as given,
/// occupancy statuses are re-derived from the ledger.
fn resolve_status(requested: PrinterStatus, active_jobs: u32) -> PrinterStatus {
    if requested.is_override() {
        requested
    } else {
        PrinterStatus::from_active_jobs(active_jobs)
    }
}

fn fetch_printer(conn: &Connection, id: Uuid) -> Result<Option<Printer>, PrinterError> {
    let sql = format!("SELECT {} FROM printers p WHERE p.id = ?1", PRINTER_COLUMNS);
    conn.query_row(&sql, params![id.to_string()], row_to_printer)
        .optional()
        .map_err(db_err)
}

fn active_jobs(conn: &Connection, id: Uuid) -> Result<u32, PrinterError> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM printer_assignments
             WHERE printer_id = ?1 AND completed_at IS NULL",
            params![id.to_string()],
            |row| row.get(0),
        )
        .map_err(db_err)?;
    Ok(u32::try_from(count).unwrap_or(u32::MAX))
}

fn row_to_printer_with_queue(
    row: &Row,
    default_estimate: Duration,
) -> rusqlite::Result<PrinterWithQueue> {
    let printer = row_to_printer(row)?;
    let active: i64 = row.get(7)?;
    let current_job = match (opt_uuid_col(row, 8)?, opt_ts_col(row, 9)?) {
        (Some(order_id), Some(assigned_at)) => Some(CurrentJob {
            order_id,
            assigned_at,
            estimated_completion: assigned_at.checked_add_signed(default_estimate),
        }),
        _ => None,
    };
    // The current job is not counted as queued.
    let mut queue_jobs = u32::try_from(active).unwrap_or(0);
    if current_job.is_some() {
        queue_jobs = queue_jobs.saturating_sub(1);
    }
    Ok(PrinterWithQueue {
        printer,
        queue_jobs,
        current_job,
    })
}

impl SqliteWorkQueue {
    fn write_printer(
        &self,
        id: Uuid,
        apply: impl FnOnce(&mut Printer, u32) -> Result<(), PrinterError>,
    ) -> Result<Printer, PrinterError> {
        let mut conn = self.connection().map_err(PrinterError::Database)?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(db_err)?;

        let mut printer = fetch_printer(&tx, id)?.ok_or(PrinterError::NotFound(id))?;
        let active = active_jobs(&tx, id)?;
        apply(&mut printer, active)?;
        printer.updated_at = Utc::now();

        tx.execute(
            "UPDATE printers SET name = ?1, model = ?2, material = ?3, status = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                printer.name,
                printer.model,
                printer.material,
                printer.status.as_str(),
                format_ts(&printer.updated_at),
                id.to_string(),
            ],
        )
        .map_err(db_err)?;
        tx.commit().map_err(db_err)?;

        Ok(printer)
    }
}

impl PrinterRegistry for SqliteWorkQueue {
    fn create_printer(&self, request: CreatePrinterRequest) -> Result<Printer, PrinterError> {
        let name = validate_name(&request.name)?;
        let requested = parse_status(request.status.as_deref().unwrap_or_default())?;
        let now = Utc::now();

        let printer = Printer {
            id: Uuid::new_v4(),
            name,
            model: sanitize_optional(request.model.as_deref()),
            material: sanitize_optional(request.material.as_deref()),
            // A fresh printer holds no jobs.
            status: resolve_status(requested, 0),
            created_at: now,
            updated_at: now,
        };

        let conn = self.connection().map_err(PrinterError::Database)?;
        conn.execute(
            "INSERT INTO printers (id, name, model, material, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                printer.id.to_string(),
                printer.name,
                printer.model,
                printer.material,
                printer.status.as_str(),
                format_ts(&printer.created_at),
                format_ts(&printer.updated_at),
            ],
        )
        .map_err(db_err)?;

        Ok(printer)
    }

    fn get_printer(&self, id: Uuid) -> Result<Option<Printer>, PrinterError> {
        let conn = self.connection().map_err(PrinterError::Database)?;
        fetch_printer(&conn, id)
    }

    fn list_printers(&self, filter: &PrinterFilter) -> Result<Vec<PrinterWithQueue>, PrinterError> {
        let conn = self.connection().map_err(PrinterError::Database)?;

        let where_clause = if filter.status.is_some() {
            "WHERE p.status = ?3"
        } else {
            ""
        };
        let sql = format!(
            "SELECT {},
                    (SELECT COUNT(*) FROM printer_assignments pa
                      WHERE pa.printer_id = p.id AND pa.completed_at IS NULL) AS active_jobs,
                    cj.order_id, cj.assigned_at
             FROM printers p
             LEFT JOIN printer_assignments cj ON cj.id = (
                 SELECT pa.id FROM printer_assignments pa
                  WHERE pa.printer_id = p.id AND pa.completed_at IS NULL
                  ORDER BY pa.assigned_at ASC, pa.rowid ASC LIMIT 1)
             {}
             ORDER BY p.created_at DESC, p.rowid DESC
             LIMIT ?1 OFFSET ?2",
            PRINTER_COLUMNS, where_clause
        );

        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let estimate = self.default_estimate;
        let printers: rusqlite::Result<Vec<PrinterWithQueue>> = match filter.status {
            Some(status) => stmt
                .query_map(
                    params![filter.limit, filter.offset, status.as_str()],
                    |row| row_to_printer_with_queue(row, estimate),
                )
                .and_then(|rows| rows.collect()),
            None => stmt
                .query_map(params![filter.limit, filter.offset], |row| {
                    row_to_printer_with_queue(row, estimate)
                })
                .and_then(|rows| rows.collect()),
        };
        printers.map_err(db_err)
    }

    fn count_by_status(&self) -> Result<Vec<(PrinterStatus, i64)>, PrinterError> {
        let conn = self.connection().map_err(PrinterError::Database)?;
        let mut counts = Vec::with_capacity(PrinterStatus::ALL.len());
        for status in PrinterStatus::ALL {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM printers WHERE status = ?1",
                    params![status.as_str()],
                    |row| row.get(0),
                )
                .map_err(db_err)?;
            counts.push((status, count));
        }
        Ok(counts)
    }

    fn update_printer(
        &self,
        id: Uuid,
        request: UpdatePrinterRequest,
    ) -> Result<Printer, PrinterError> {
        let name = request.name.as_deref().map(validate_name).transpose()?;
        let status = request.status.as_deref().map(parse_status).transpose()?;

        self.write_printer(id, |printer, active| {
            if let Some(name) = name {
                printer.name = name;
            }
            if let Some(model) = request.model.as_deref() {
                printer.model = sanitize_optional(Some(model));
            }
            if let Some(material) = request.material.as_deref() {
                printer.material = sanitize_optional(Some(material));
            }
            if let Some(status) = status {
                printer.status = resolve_status(status, active);
            }
            Ok(())
        })
    }

    fn update_printer_status(&self, id: Uuid, status: &str) -> Result<Printer, PrinterError> {
        let requested = parse_status(status)?;
        self.write_printer(id, |printer, active| {
            printer.status = resolve_status(requested, active);
            Ok(())
        })
    }

    fn delete_printer(&self, id: Uuid) -> Result<Printer, PrinterError> {
        let mut conn = self.connection().map_err(PrinterError::Database)?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(db_err)?;

        let printer = fetch_printer(&tx, id)?.ok_or(PrinterError::NotFound(id))?;
        let active = active_jobs(&tx, id)?;
        if active > 0 {
            return Err(PrinterError::PrinterInUse {
                printer_id: id,
                active_jobs: active,
            });
        }

        // Completed history stays; its printer reference is nulled by the schema.
        tx.execute("DELETE FROM printers WHERE id = ?1", params![id.to_string()])
            .map_err(db_err)?;
        tx.commit().map_err(db_err)?;

        Ok(printer)
    }
}
