// Availability Query
//
// A date is available while its non-terminal booking count sits below the
// configured post capacity. The horizon starts at "today": past dates are
// never produced. Reads tolerate snapshot staleness; slot assignment is
// re-validated at write time regardless.

use chrono::{Days, NaiveDate};

use crate::domain::{CapacityPlan, PostNumber};
use crate::error::Result;
use crate::port::{BookingRepository, Clock};

/// Dates in `[today, today + horizon_days)` with at least one free post
pub async fn available_dates(
    repo: &dyn BookingRepository,
    clock: &dyn Clock,
    capacity: &CapacityPlan,
    horizon_days: u32,
) -> Result<Vec<NaiveDate>> {
    let today = clock.today();
    let until = today
        .checked_add_days(Days::new(horizon_days as u64))
        .unwrap_or(today);

    // One grouped count query for the whole window; dates without bookings
    // are absent from the map and therefore always available
    let occupancy = repo.occupancy_by_date(today, until).await?;

    Ok(today
        .iter_days()
        .take(horizon_days as usize)
        .filter(|date| capacity.has_free_post(occupancy.get(date).copied().unwrap_or(0)))
        .collect())
}

/// Smallest free post on a date, or None when all posts are occupied
pub async fn free_post_for_date(
    repo: &dyn BookingRepository,
    capacity: &CapacityPlan,
    date: NaiveDate,
) -> Result<Option<PostNumber>> {
    let occupied = repo.occupied_posts(date).await?;
    Ok(capacity.lowest_free_post(&occupied))
}
