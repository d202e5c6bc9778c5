//! Column encoding shared by the SQLite store.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::Row;
use uuid::Uuid;

use crate::assignment::{Assignment, Candidate};
use crate::order::{OrderRecord, OrderStatus};
use crate::printer::{Printer, PrinterStatus};

pub(super) const PRINTER_COLUMNS: &str =
    "p.id, p.name, p.model, p.material, p.status, p.created_at, p.updated_at";

/// Printer columns followed by the active job count and the newest active
/// `assigned_at`.
pub(super) const CANDIDATE_SELECT: &str = "
    SELECT p.id, p.name, p.model, p.material, p.status, p.created_at, p.updated_at,
           (SELECT COUNT(*) FROM printer_assignments pa
             WHERE pa.printer_id = p.id AND pa.completed_at IS NULL) AS active_jobs,
           (SELECT MAX(pa.assigned_at) FROM printer_assignments pa
             WHERE pa.printer_id = p.id AND pa.completed_at IS NULL) AS last_assigned_at
    FROM printers p";

pub(super) const ASSIGNMENT_COLUMNS: &str = "id, order_id, printer_id, assigned_at, completed_at";

/// Fixed-width RFC 3339 so that string order is time order.
pub(super) fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error(
    idx: usize,
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into())
}

pub(super) fn ts_col(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

pub(super) fn opt_ts_col(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(_) => ts_col(row, idx).map(Some),
        None => Ok(None),
    }
}

pub(super) fn uuid_col(row: &Row, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw).map_err(|e| conversion_error(idx, e))
}

pub(super) fn opt_uuid_col(row: &Row, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(_) => uuid_col(row, idx).map(Some),
        None => Ok(None),
    }
}

fn printer_status_col(row: &Row, idx: usize) -> rusqlite::Result<PrinterStatus> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e: String| conversion_error(idx, e))
}

pub(super) fn order_status_col(row: &Row, idx: usize) -> rusqlite::Result<OrderStatus> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e: String| conversion_error(idx, e))
}

/// Map the seven `PRINTER_COLUMNS` starting at column 0.
pub(super) fn row_to_printer(row: &Row) -> rusqlite::Result<Printer> {
    Ok(Printer {
        id: uuid_col(row, 0)?,
        name: row.get(1)?,
        model: row.get(2)?,
        material: row.get(3)?,
        status: printer_status_col(row, 4)?,
        created_at: ts_col(row, 5)?,
        updated_at: ts_col(row, 6)?,
    })
}

pub(super) fn row_to_candidate(row: &Row) -> rusqlite::Result<Candidate> {
    let active_jobs: i64 = row.get(7)?;
    Ok(Candidate {
        printer: row_to_printer(row)?,
        active_jobs: u32::try_from(active_jobs).unwrap_or(u32::MAX),
        last_assigned_at: opt_ts_col(row, 8)?,
    })
}

pub(super) fn row_to_assignment(row: &Row) -> rusqlite::Result<Assignment> {
    Ok(Assignment {
        id: uuid_col(row, 0)?,
        order_id: uuid_col(row, 1)?,
        printer_id: uuid_col(row, 2)?,
        assigned_at: ts_col(row, 3)?,
        completed_at: opt_ts_col(row, 4)?,
    })
}

pub(super) fn row_to_order(row: &Row) -> rusqlite::Result<OrderRecord> {
    Ok(OrderRecord {
        id: uuid_col(row, 0)?,
        status: order_status_col(row, 1)?,
        created_at: ts_col(row, 2)?,
        updated_at: ts_col(row, 3)?,
    })
}
