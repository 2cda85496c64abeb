// Create Booking Use Case
//
// Check-then-insert runs inside one store transaction per attempt. A
// concurrent writer that grabs the same post trips the store's unique
// slot constraint; the loser retries with a freshly computed free post,
// bounded by the post count.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{Booking, CapacityPlan, NewBooking};
use crate::error::{AppError, Result};
use crate::port::{Clock, TransactionalBookingStore, VehicleDirectory};

const MAX_DESCRIPTION_LEN: usize = 500;
const MAX_PLATE_LEN: usize = 16;

/// Create booking request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub vehicle_plate: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub service_description: String,
}

pub(crate) fn validate_request(req: &CreateBookingRequest, today: NaiveDate) -> Result<()> {
    if req.vehicle_plate.trim().is_empty() {
        return Err(AppError::Validation("vehicle plate is empty".to_string()));
    }
    if req.vehicle_plate.len() > MAX_PLATE_LEN {
        return Err(AppError::Validation(format!(
            "vehicle plate too long (max {} chars)",
            MAX_PLATE_LEN
        )));
    }
    if req.service_description.len() > MAX_DESCRIPTION_LEN {
        return Err(AppError::Validation(format!(
            "service description too long (max {} chars)",
            MAX_DESCRIPTION_LEN
        )));
    }
    if req.date < today {
        return Err(AppError::Validation(format!(
            "date {} is in the past",
            req.date
        )));
    }
    Ok(())
}

/// Execute create use case
///
/// Returns the stored booking with its assigned id and post, `NoCapacity`
/// when every post on the date is taken, and performs no mutation on any
/// failure path.
pub async fn execute(
    store: &dyn TransactionalBookingStore,
    directory: &dyn VehicleDirectory,
    clock: &dyn Clock,
    capacity: &CapacityPlan,
    req: CreateBookingRequest,
) -> Result<Booking> {
    validate_request(&req, clock.today())?;

    if directory.find_vehicle(&req.vehicle_plate).await?.is_none() {
        return Err(AppError::Validation(format!(
            "unknown vehicle plate: {}",
            req.vehicle_plate
        )));
    }

    // A couple of spare attempts absorb busy-retries that consume an
    // iteration without observing a full date.
    let attempts = capacity.posts_per_day() + 2;
    for attempt in 1..=attempts {
        let mut tx = store.begin_transaction().await?;

        let occupied = tx.occupied_posts(req.date, None).await?;
        let Some(post) = capacity.lowest_free_post(&occupied) else {
            tx.rollback().await?;
            return Err(AppError::NoCapacity { date: req.date });
        };

        let new_booking = NewBooking {
            vehicle_plate: req.vehicle_plate.clone(),
            date: req.date,
            post_number: post,
            service_description: req.service_description.clone(),
            created_at: clock.now_millis(),
        };

        match tx.insert(&new_booking).await {
            Ok(booking) => match tx.commit().await {
                Ok(()) => {
                    debug!(
                        booking_id = booking.id,
                        date = %booking.date,
                        post = booking.post_number,
                        "booking created"
                    );
                    return Ok(booking);
                }
                Err(e) if e.is_retryable_conflict() => {
                    warn!(
                        attempt,
                        date = %req.date,
                        post,
                        "commit lost to a concurrent writer, retrying"
                    );
                }
                Err(e) => return Err(e),
            },
            Err(e) if e.is_retryable_conflict() => {
                let _ = tx.rollback().await;
                warn!(
                    attempt,
                    date = %req.date,
                    post,
                    "post taken by a concurrent writer, retrying"
                );
            }
            Err(e) => {
                let _ = tx.rollback().await;
                return Err(e);
            }
        }
    }

    Err(AppError::StoreUnavailable(format!(
        "allocation conflict persisted after {} attempts on {}",
        attempts, req.date
    )))
}
