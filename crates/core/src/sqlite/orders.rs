use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use super::rows::{format_ts, row_to_order};
use super::SqliteWorkQueue;
use crate::order::{OrderBook, OrderError, OrderRecord, OrderStatus};

impl OrderBook for SqliteWorkQueue {
    fn create_order(&self, status: Option<OrderStatus>) -> Result<OrderRecord, OrderError> {
        let now = Utc::now();
        let order = OrderRecord {
            id: Uuid::new_v4(),
            status: status.unwrap_or(OrderStatus::New),
            created_at: now,
            updated_at: now,
        };

        let conn = self.connection().map_err(OrderError::Database)?;
        conn.execute(
            "INSERT INTO orders (id, status, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                order.id.to_string(),
                order.status.as_str(),
                format_ts(&order.created_at),
                format_ts(&order.updated_at),
            ],
        )
        .map_err(|e| OrderError::Database(e.to_string()))?;

        Ok(order)
    }

    fn get_order(&self, id: Uuid) -> Result<Option<OrderRecord>, OrderError> {
        let conn = self.connection().map_err(OrderError::Database)?;
        conn.query_row(
            "SELECT id, status, created_at, updated_at FROM orders WHERE id = ?1",
            params![id.to_string()],
            row_to_order,
        )
        .optional()
        .map_err(|e| OrderError::Database(e.to_string()))
    }
}
