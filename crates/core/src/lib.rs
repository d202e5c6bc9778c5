pub mod assignment;
pub mod config;
pub mod metrics;
pub mod order;
pub mod printer;
pub mod sqlite;
pub mod testing;

pub use assignment::{
    AssignmentEngine, AssignmentError, AutoAssignRequest, AutoAssignResult,
    CompleteAssignmentRequest, QueueEstimate, WorkQueueStore, WorkQueueTx,
};
pub use config::{
    load_config, load_config_from_str, validate_config, AssignmentConfig, Config, ConfigError,
    DatabaseConfig, SanitizedConfig, ServerConfig,
};
pub use order::{OrderBook, OrderError, OrderRecord, OrderStatus};
pub use printer::{
    CreatePrinterRequest, CurrentJob, Printer, PrinterError, PrinterFilter, PrinterRegistry,
    PrinterStatus, PrinterWithQueue, UpdatePrinterRequest,
};
pub use sqlite::SqliteWorkQueue;
