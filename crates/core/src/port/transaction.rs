// Transaction port for atomic slot allocation
//
// create and reschedule must run count-occupied / pick-free / write as one
// atomic unit per date; the store's partial unique index on
// (date, post_number) is the backstop for writers racing past the read.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{Booking, BookingId, NewBooking, PostNumber};
use crate::error::Result;

/// Transaction trait for atomic multi-step operations
#[async_trait]
pub trait Transaction: Send {
    /// Commit the transaction
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Rollback the transaction
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Transactional booking store operations
#[async_trait]
pub trait TransactionalBookingStore: Send + Sync {
    /// Begin a new transaction
    async fn begin_transaction(&self) -> Result<Box<dyn BookingStoreTransaction>>;
}

/// Booking store operations within a transaction
#[async_trait]
pub trait BookingStoreTransaction: Transaction {
    /// Find booking by id (within transaction)
    async fn find_by_id(&mut self, id: BookingId) -> Result<Option<Booking>>;

    /// Occupied posts on a date, optionally ignoring one booking (within
    /// transaction). Reschedule excludes the booking being moved so that a
    /// same-date move does not collide with its own slot.
    async fn occupied_posts(
        &mut self,
        date: NaiveDate,
        exclude: Option<BookingId>,
    ) -> Result<Vec<PostNumber>>;

    /// Insert booking (within transaction); the store assigns the id
    async fn insert(&mut self, booking: &NewBooking) -> Result<Booking>;

    /// Move a booking to a new date and post in place (within transaction).
    /// The booking never disappears from both dates: the single UPDATE
    /// replaces the old slot with the new one.
    async fn move_booking(
        &mut self,
        id: BookingId,
        date: NaiveDate,
        post_number: PostNumber,
    ) -> Result<()>;
}
