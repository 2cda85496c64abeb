// Domain Layer - Pure business logic and entities

pub mod booking;
pub mod capacity;
pub mod error;
pub mod vehicle;

// Re-exports
pub use booking::{
    Booking, BookingId, BookingStatus, NewBooking, Plate, PostNumber, VehicleBookingCount,
};
pub use capacity::{CapacityPlan, DEFAULT_POSTS_PER_DAY};
pub use error::DomainError;
pub use vehicle::{Client, ClientId, NewClient, NewVehicle, Vehicle};
