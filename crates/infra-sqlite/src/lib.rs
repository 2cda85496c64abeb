// Bayline Infrastructure - SQLite Adapter
// Implements: BookingRepository, TransactionalBookingStore, VehicleDirectory

mod booking_repository;
mod connection;
mod migration;
mod transaction;
mod vehicle_directory;

pub use booking_repository::SqliteBookingRepository;
pub use connection::create_pool;
pub use migration::run_migrations;
pub use transaction::SqliteBookingTransaction;
pub use vehicle_directory::SqliteVehicleDirectory;

// Note: sqlx::Error conversion is handled by wrapping in helper functions
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)
