// Application Layer - Use Cases and Business Logic

pub mod availability;
pub mod reporting;
pub mod scheduling;

// Re-exports
pub use reporting::{RangeReport, ReportingService, StatusCounts, VehicleReport};
pub use scheduling::{CreateBookingRequest, SchedulerConfig, SchedulerService};
