//! Printer registry: identity, material capability and occupancy status.

mod material;
mod registry;
mod types;

pub use material::{material_supported, normalize_material};
pub use registry::{
    CreatePrinterRequest, PrinterError, PrinterFilter, PrinterRegistry, UpdatePrinterRequest,
};
pub(crate) use registry::{parse_status, sanitize_optional, validate_name};
pub use types::{CurrentJob, Printer, PrinterStatus, PrinterWithQueue};
