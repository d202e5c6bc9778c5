pub mod error;
pub mod handlers;
pub mod middleware;
pub mod orders;
pub mod printers;
pub mod routes;

pub use routes::create_router;
