//! Printer domain types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Printer occupancy / availability.
///
/// `Available` and `Busy` are a projection of the assignment ledger.
/// `Maintenance` and `Offline` are administrative overrides that take a
/// printer out of rotation regardless of how many jobs it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrinterStatus {
    Available,
    Busy,
    Maintenance,
    Offline,
}

impl PrinterStatus {
    pub const ALL: [PrinterStatus; 4] = [
        PrinterStatus::Available,
        PrinterStatus::Busy,
        PrinterStatus::Maintenance,
        PrinterStatus::Offline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PrinterStatus::Available => "available",
            PrinterStatus::Busy => "busy",
            PrinterStatus::Maintenance => "maintenance",
            PrinterStatus::Offline => "offline",
        }
    }

    /// Whether the status is an administrative override rather than occupancy.
    pub fn is_override(&self) -> bool {
        matches!(self, PrinterStatus::Maintenance | PrinterStatus::Offline)
    }

    /// Occupancy status implied by a count of active assignments.
    pub fn from_active_jobs(active_jobs: u32) -> Self {
        if active_jobs == 0 {
            PrinterStatus::Available
        } else {
            PrinterStatus::Busy
        }
    }

    /// Parse a user supplied status. Input is trimmed and case-folded and an
    /// empty string means `available`.
    pub fn normalize(raw: &str) -> Option<Self> {
        let status = raw.trim().to_ascii_lowercase();
        if status.is_empty() {
            return Some(PrinterStatus::Available);
        }
        status.parse().ok()
    }
}

impl fmt::Display for PrinterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrinterStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(PrinterStatus::Available),
            "busy" => Ok(PrinterStatus::Busy),
            "maintenance" => Ok(PrinterStatus::Maintenance),
            "offline" => Ok(PrinterStatus::Offline),
            other => Err(format!("invalid printer status: {}", other)),
        }
    }
}

/// A physical printer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Printer {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Comma separated capability list. `None` accepts any material.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    pub status: PrinterStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The job a printer is working on right now (its oldest active assignment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentJob {
    pub order_id: Uuid,
    pub assigned_at: DateTime<Utc>,
    /// Advisory only: `assigned_at` plus the default job estimate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_completion: Option<DateTime<Utc>>,
}

/// Printer plus its queue, as shown in listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrinterWithQueue {
    #[serde(flatten)]
    pub printer: Printer,
    /// Active jobs waiting behind the current one.
    pub queue_jobs: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_job: Option<CurrentJob>,
}
