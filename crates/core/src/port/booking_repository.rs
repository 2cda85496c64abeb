// Booking Repository Port (Interface)

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{Booking, BookingId, BookingStatus, PostNumber, VehicleBookingCount};
use crate::error::Result;

/// Repository interface for Booking persistence
///
/// Read side plus single-row status updates. Multi-step allocation goes
/// through [`crate::port::TransactionalBookingStore`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Find booking by ID
    async fn find_by_id(&self, id: BookingId) -> Result<Option<Booking>>;

    /// Move a non-terminal booking to `to`, stamping started/finished time.
    ///
    /// Guarded: never overwrites a terminal status. Fails with NotFound for
    /// a missing id and InvalidState when the booking already reached a
    /// different terminal status. Setting the status it already has is a
    /// no-op success (idempotent cancel/complete).
    async fn set_status(&self, id: BookingId, to: BookingStatus, now_millis: i64) -> Result<()>;

    /// Administrative correction: remove the row regardless of status
    async fn delete(&self, id: BookingId) -> Result<()>;

    /// Post numbers occupied by non-terminal bookings on a date
    async fn occupied_posts(&self, date: NaiveDate) -> Result<Vec<PostNumber>>;

    /// Non-terminal booking count per date over `[from, until)`; dates with
    /// zero bookings are absent from the map
    async fn occupancy_by_date(
        &self,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<HashMap<NaiveDate, i64>>;

    /// Non-terminal bookings, date ascending, InProgress before Planned on
    /// the same date
    async fn list_active(&self) -> Result<Vec<Booking>>;

    /// Planned bookings only, date ascending
    async fn list_scheduled(&self) -> Result<Vec<Booking>>;

    /// Count bookings by status
    async fn count_by_status(&self, status: BookingStatus) -> Result<i64>;

    /// All bookings with date in `[from, until]`, date ascending
    async fn find_in_range(&self, from: NaiveDate, until: NaiveDate) -> Result<Vec<Booking>>;

    /// Most-booked vehicle within `[from, until]`; COUNT DESC, ties broken
    /// lexicographically on plate
    async fn top_vehicle_in_range(
        &self,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Option<VehicleBookingCount>>;

    /// Most-booked vehicle across all history (same ordering)
    async fn top_vehicle(&self) -> Result<Option<VehicleBookingCount>>;

    /// Bookings whose plate matches a LIKE-style pattern, date ascending
    async fn find_by_plate_pattern(&self, pattern: &str) -> Result<Vec<Booking>>;

    /// Count of bookings for matching plates on or after `since`
    async fn count_by_plate_pattern_since(&self, pattern: &str, since: NaiveDate) -> Result<i64>;
}
