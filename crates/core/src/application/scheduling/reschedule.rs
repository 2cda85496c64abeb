// Reschedule Booking Use Case
//
// The whole move is one transaction around a single in-place UPDATE.
// A delete-then-insert move would open a window where the booking exists
// on neither date; an in-place swap never leaves the table.

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::domain::{Booking, BookingId, CapacityPlan};
use crate::error::{AppError, Result};
use crate::port::{Clock, TransactionalBookingStore};

/// Execute reschedule use case
///
/// On `NoCapacity` the original booking is left untouched; a terminal
/// booking cannot be moved.
pub async fn execute(
    store: &dyn TransactionalBookingStore,
    clock: &dyn Clock,
    capacity: &CapacityPlan,
    id: BookingId,
    new_date: NaiveDate,
) -> Result<Booking> {
    if new_date < clock.today() {
        return Err(AppError::Validation(format!(
            "date {} is in the past",
            new_date
        )));
    }

    let attempts = capacity.posts_per_day() + 2;
    for attempt in 1..=attempts {
        let mut tx = store.begin_transaction().await?;

        let Some(booking) = tx.find_by_id(id).await? else {
            tx.rollback().await?;
            return Err(AppError::NotFound(format!("booking {} not found", id)));
        };
        if booking.status.is_terminal() {
            tx.rollback().await?;
            return Err(AppError::InvalidState(format!(
                "cannot reschedule booking {} in status {}",
                id, booking.status
            )));
        }

        // The booking's own slot does not block a same-date move
        let occupied = tx.occupied_posts(new_date, Some(id)).await?;
        let Some(post) = capacity.lowest_free_post(&occupied) else {
            tx.rollback().await?;
            return Err(AppError::NoCapacity { date: new_date });
        };

        match tx.move_booking(id, new_date, post).await {
            Ok(()) => match tx.commit().await {
                Ok(()) => {
                    debug!(
                        booking_id = id,
                        from = %booking.date,
                        to = %new_date,
                        post,
                        "booking rescheduled"
                    );
                    return Ok(Booking {
                        date: new_date,
                        post_number: post,
                        ..booking
                    });
                }
                Err(e) if e.is_retryable_conflict() => {
                    warn!(
                        attempt,
                        booking_id = id,
                        date = %new_date,
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
                    booking_id = id,
                    date = %new_date,
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
        attempts, new_date
    )))
}
