//! Testing utilities: an in-memory work-queue store and seeding helpers.

mod mock_work_queue;

pub use mock_work_queue::MockWorkQueue;

/// Seeding helpers for SQLite-backed tests.
pub mod fixtures {
    use uuid::Uuid;

    use crate::order::{OrderBook, OrderStatus};
    use crate::printer::{CreatePrinterRequest, PrinterRegistry};
    use crate::sqlite::SqliteWorkQueue;

    /// Register a printer with the given material list and status.
    pub fn printer(
        store: &SqliteWorkQueue,
        name: &str,
        material: Option<&str>,
        status: &str,
    ) -> Uuid {
        store
            .create_printer(CreatePrinterRequest {
                name: name.to_string(),
                model: None,
                material: material.map(str::to_string),
                status: Some(status.to_string()),
            })
            .expect("create printer")
            .id
    }

    /// Create an order in `new` status.
    pub fn new_order(store: &SqliteWorkQueue) -> Uuid {
        store.create_order(Some(OrderStatus::New)).expect("create order").id
    }
}
