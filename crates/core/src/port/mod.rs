// Port Layer - Interfaces for external dependencies

pub mod booking_repository;
pub mod clock;
pub mod transaction;
pub mod vehicle_directory;

// Re-exports
pub use booking_repository::BookingRepository;
pub use clock::{Clock, FixedClock, SystemClock};
pub use transaction::{BookingStoreTransaction, Transaction, TransactionalBookingStore};
pub use vehicle_directory::VehicleDirectory;
