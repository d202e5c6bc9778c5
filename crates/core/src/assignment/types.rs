//! Assignment ledger and request/response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::printer::Printer;

/// One job-to-printer binding. Active while `completed_at` is unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub printer_id: Uuid,
    pub assigned_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Assignment {
    pub fn is_active(&self) -> bool {
        self.completed_at.is_none()
    }
}

/// A locked printer row considered for a new job.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub printer: Printer,
    /// Active assignments on the printer at selection time.
    pub active_jobs: u32,
    /// Newest `assigned_at` among the printer's active assignments.
    pub last_assigned_at: Option<DateTime<Utc>>,
}

/// Request to bind an order to a printer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AutoAssignRequest {
    #[serde(default)]
    pub order_id: String,
    /// Required material; blank or missing means any printer will do.
    #[serde(default)]
    pub material: Option<String>,
    /// Per-job duration estimate. Missing or non-positive uses the default.
    #[serde(default)]
    pub estimated_time_hours: Option<f64>,
    /// Pin the job to this printer instead of auto-selecting.
    #[serde(default)]
    pub printer_id: Option<String>,
}

impl AutoAssignRequest {
    pub fn new(order_id: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            ..Self::default()
        }
    }

    pub fn with_material(mut self, material: impl Into<String>) -> Self {
        self.material = Some(material.into());
        self
    }

    pub fn with_estimated_hours(mut self, hours: f64) -> Self {
        self.estimated_time_hours = Some(hours);
        self
    }

    pub fn with_printer(mut self, printer_id: impl Into<String>) -> Self {
        self.printer_id = Some(printer_id.into());
        self
    }
}

/// Outcome of a successful assignment.
///
/// `estimated_start` and `estimated_completion` come from a linear queue
/// model and are advisory only. They are not a delivery commitment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoAssignResult {
    pub assignment_id: Uuid,
    pub order_id: Uuid,
    pub printer_id: Uuid,
    pub printer_name: String,
    pub queue_position: u32,
    pub estimated_start: DateTime<Utc>,
    pub estimated_completion: DateTime<Utc>,
}

/// Request to release the printer held by an order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompleteAssignmentRequest {
    #[serde(default)]
    pub order_id: String,
}
