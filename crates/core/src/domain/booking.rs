// Booking Domain Model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Booking ID (store-assigned, monotonic)
pub type BookingId = i64;

/// Service bay number (1..=N)
pub type PostNumber = i64;

/// Vehicle plate identifier
pub type Plate = String;

/// Booking status (closed enumeration; free-form status strings are the
/// bug class this type removes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Planned,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// Terminal states accept no further transitions (only administrative
    /// deletion)
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PLANNED" => Some(BookingStatus::Planned),
            "IN_PROGRESS" => Some(BookingStatus::InProgress),
            "COMPLETED" => Some(BookingStatus::Completed),
            "CANCELLED" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingStatus::Planned => write!(f, "PLANNED"),
            BookingStatus::InProgress => write!(f, "IN_PROGRESS"),
            BookingStatus::Completed => write!(f, "COMPLETED"),
            BookingStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Booking entity: one scheduled service visit occupying one post on one day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub vehicle_plate: Plate,
    pub date: NaiveDate,
    pub post_number: PostNumber,
    pub service_description: String,
    pub status: BookingStatus,

    pub created_at: i64, // epoch ms
    pub started_at: Option<i64>,
    pub finished_at: Option<i64>,
}

/// Insert payload for a new booking; the store assigns the id
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub vehicle_plate: Plate,
    pub date: NaiveDate,
    pub post_number: PostNumber,
    pub service_description: String,
    pub created_at: i64,
}

impl Booking {
    /// Transition to InProgress with explicit timestamp
    pub fn start(&mut self, now_millis: i64) -> crate::domain::error::Result<()> {
        if self.status != BookingStatus::Planned {
            return Err(crate::domain::error::DomainError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: BookingStatus::InProgress.to_string(),
            });
        }
        self.status = BookingStatus::InProgress;
        self.started_at = Some(now_millis);
        Ok(())
    }

    /// Transition to Completed with explicit timestamp
    ///
    /// Allowed from both non-terminal states: admin callers mark a planned
    /// visit done without an explicit start step.
    pub fn complete(&mut self, now_millis: i64) -> crate::domain::error::Result<()> {
        if self.status.is_terminal() {
            return Err(crate::domain::error::DomainError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: BookingStatus::Completed.to_string(),
            });
        }
        self.status = BookingStatus::Completed;
        self.finished_at = Some(now_millis);
        Ok(())
    }

    /// Transition to Cancelled with explicit timestamp
    pub fn cancel(&mut self, now_millis: i64) -> crate::domain::error::Result<()> {
        if self.status.is_terminal() {
            return Err(crate::domain::error::DomainError::InvalidStatusTransition {
                from: self.status.to_string(),
                to: BookingStatus::Cancelled.to_string(),
            });
        }
        self.status = BookingStatus::Cancelled;
        self.finished_at = Some(now_millis);
        Ok(())
    }

    /// Whether this booking occupies a post on its date
    pub fn occupies_post(&self) -> bool {
        !self.status.is_terminal()
    }
}

/// Aggregated booking count per vehicle (reporting)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleBookingCount {
    pub plate: Plate,
    pub bookings: i64,
}
