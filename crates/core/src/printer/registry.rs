//! Administrative printer storage trait and request types.

use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use super::{Printer, PrinterStatus, PrinterWithQueue};

/// Error type for administrative printer operations.
#[derive(Debug, Error)]
pub enum PrinterError {
    #[error("Printer not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid printer ID: {0}")]
    InvalidPrinterId(String),

    #[error("Invalid printer status: {0}")]
    InvalidStatus(String),

    #[error("Invalid printer name: {0}")]
    InvalidName(String),

    /// The printer still has active assignments.
    #[error("Printer {printer_id} has {active_jobs} active job(s)")]
    PrinterInUse { printer_id: Uuid, active_jobs: u32 },

    #[error("Database error: {0}")]
    Database(String),
}

impl PrinterError {
    /// Parse a printer id supplied by a caller.
    pub fn parse_id(raw: &str) -> Result<Uuid, PrinterError> {
        Uuid::parse_str(raw.trim()).map_err(|_| PrinterError::InvalidPrinterId(raw.to_string()))
    }
}

/// Request to register a printer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatePrinterRequest {
    pub name: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
    /// Raw status; empty or missing means `available`.
    #[serde(default)]
    pub status: Option<String>,
}

/// Partial update of a printer. `None` fields are left unchanged; a blank
/// `model` or `material` clears the column.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePrinterRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Filter for listing printers.
#[derive(Debug, Clone)]
pub struct PrinterFilter {
    pub status: Option<PrinterStatus>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for PrinterFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl PrinterFilter {
    pub fn new() -> Self {
        Self {
            status: None,
            limit: 100,
            offset: 0,
        }
    }

    pub fn with_status(mut self, status: PrinterStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Trait for printer registry backends.
///
/// Writes of `available`/`busy` through this trait are re-derived from the
/// assignment ledger so an operator cannot mark a printer idle while it still
/// holds jobs. `maintenance`/`offline` are stored as given.
pub trait PrinterRegistry: Send + Sync {
    /// Register a new printer.
    fn create_printer(&self, request: CreatePrinterRequest) -> Result<Printer, PrinterError>;

    /// Get a printer by ID.
    fn get_printer(&self, id: Uuid) -> Result<Option<Printer>, PrinterError>;

    /// List printers, newest first, with their queue.
    fn list_printers(&self, filter: &PrinterFilter) -> Result<Vec<PrinterWithQueue>, PrinterError>;

    /// Count printers per status.
    fn count_by_status(&self) -> Result<Vec<(PrinterStatus, i64)>, PrinterError>;

    /// Apply a partial update.
    fn update_printer(
        &self,
        id: Uuid,
        request: UpdatePrinterRequest,
    ) -> Result<Printer, PrinterError>;

    /// Change only the status.
    fn update_printer_status(&self, id: Uuid, status: &str) -> Result<Printer, PrinterError>;

    /// Delete a printer that has no active assignments. Its completed
    /// assignment rows are kept with the printer reference cleared.
    /// Returns the deleted printer.
    fn delete_printer(&self, id: Uuid) -> Result<Printer, PrinterError>;
}

/// Trim an optional string, mapping blank to `None`.
pub(crate) fn sanitize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Trimmed, non-empty printer name.
pub(crate) fn validate_name(raw: &str) -> Result<String, PrinterError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(PrinterError::InvalidName("name is required".to_string()));
    }
    Ok(name.to_string())
}

pub(crate) fn parse_status(raw: &str) -> Result<PrinterStatus, PrinterError> {
    PrinterStatus::normalize(raw).ok_or_else(|| PrinterError::InvalidStatus(raw.to_string()))
}
