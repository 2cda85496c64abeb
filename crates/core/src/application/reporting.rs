// Reporting - pure read operations over the booking store

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::{Booking, VehicleBookingCount};
use crate::error::{AppError, Result};
use crate::port::{BookingRepository, Clock};

/// Window for the per-vehicle trailing booking count
const VEHICLE_HISTORY_DAYS: u64 = 365;

/// Booking counts per status
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusCounts {
    pub planned: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub cancelled: i64,
}

impl StatusCounts {
    pub fn total(&self) -> i64 {
        self.planned + self.in_progress + self.completed + self.cancelled
    }
}

/// Bookings in a date range plus the most-booked vehicle among them.
///
/// Equal counts are broken lexicographically on plate; within one count
/// the rule is deterministic but otherwise arbitrary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeReport {
    pub from: NaiveDate,
    pub until: NaiveDate,
    pub bookings: Vec<Booking>,
    pub top_vehicle: Option<VehicleBookingCount>,
}

/// Bookings matching a plate pattern plus the trailing-year count for the
/// same pattern
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleReport {
    pub pattern: String,
    pub bookings: Vec<Booking>,
    pub last_year_count: i64,
}

/// Reporting Service
pub struct ReportingService {
    repo: Arc<dyn BookingRepository>,
    clock: Arc<dyn Clock>,
}

impl ReportingService {
    pub fn new(repo: Arc<dyn BookingRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// Counts by status over all history
    pub async fn status_counts(&self) -> Result<StatusCounts> {
        use crate::domain::BookingStatus::*;

        Ok(StatusCounts {
            planned: self.repo.count_by_status(Planned).await?,
            in_progress: self.repo.count_by_status(InProgress).await?,
            completed: self.repo.count_by_status(Completed).await?,
            cancelled: self.repo.count_by_status(Cancelled).await?,
        })
    }

    /// Bookings with date in `[from, until]` and the busiest vehicle there
    pub async fn range_report(&self, from: NaiveDate, until: NaiveDate) -> Result<RangeReport> {
        if from > until {
            return Err(AppError::Validation(format!(
                "range start {} is after end {}",
                from, until
            )));
        }

        let bookings = self.repo.find_in_range(from, until).await?;
        let top_vehicle = self.repo.top_vehicle_in_range(from, until).await?;

        Ok(RangeReport {
            from,
            until,
            bookings,
            top_vehicle,
        })
    }

    /// Bookings whose plate matches a LIKE-style pattern, with the count of
    /// matching bookings over the trailing 365 days
    pub async fn vehicle_report(&self, pattern: &str) -> Result<VehicleReport> {
        if pattern.trim().is_empty() {
            return Err(AppError::Validation("plate pattern is empty".to_string()));
        }

        let bookings = self.repo.find_by_plate_pattern(pattern).await?;
        let since = self
            .clock
            .today()
            .checked_sub_days(Days::new(VEHICLE_HISTORY_DAYS))
            .unwrap_or_else(|| self.clock.today());
        let last_year_count = self
            .repo
            .count_by_plate_pattern_since(pattern, since)
            .await?;

        Ok(VehicleReport {
            pattern: pattern.to_string(),
            bookings,
            last_year_count,
        })
    }

    /// Most-booked vehicle across all history
    pub async fn top_vehicle(&self) -> Result<Option<VehicleBookingCount>> {
        self.repo.top_vehicle().await
    }
}
