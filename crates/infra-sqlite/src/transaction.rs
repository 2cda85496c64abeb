// SQLite Transaction Implementation
//
// Wraps the count-occupied / pick-free / write allocation steps so that
// create and reschedule are atomic per date.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Sqlite, Transaction as SqlxTransaction};

use bayline_core::domain::{Booking, BookingId, NewBooking, PostNumber};
use bayline_core::error::Result;
use bayline_core::port::{BookingStoreTransaction, Transaction};

use crate::booking_repository::{map_sqlx_error, BookingRow};

pub struct SqliteBookingTransaction<'a> {
    tx: SqlxTransaction<'a, Sqlite>,
}

impl<'a> SqliteBookingTransaction<'a> {
    pub fn new(tx: SqlxTransaction<'a, Sqlite>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl Transaction for SqliteBookingTransaction<'_> {
    async fn commit(mut self: Box<Self>) -> Result<()> {
        self.tx.commit().await.map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<()> {
        self.tx.rollback().await.map_err(map_sqlx_error)?;
        Ok(())
    }
}

#[async_trait]
impl BookingStoreTransaction for SqliteBookingTransaction<'_> {
    async fn find_by_id(&mut self, id: BookingId) -> Result<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>("SELECT * FROM bookings WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        row.map(BookingRow::into_booking).transpose()
    }

    async fn occupied_posts(
        &mut self,
        date: NaiveDate,
        exclude: Option<BookingId>,
    ) -> Result<Vec<PostNumber>> {
        let posts: Vec<i64> = sqlx::query_scalar(
            "SELECT post_number FROM bookings \
             WHERE date = ? AND status IN ('PLANNED', 'IN_PROGRESS') AND id != ? \
             ORDER BY post_number",
        )
        .bind(date)
        .bind(exclude.unwrap_or(-1))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        Ok(posts)
    }

    async fn insert(&mut self, booking: &NewBooking) -> Result<Booking> {
        let row = sqlx::query_as::<_, BookingRow>(
            "INSERT INTO bookings \
             (vehicle_plate, date, post_number, service_description, status, created_at) \
             VALUES (?, ?, ?, ?, 'PLANNED', ?) \
             RETURNING *",
        )
        .bind(&booking.vehicle_plate)
        .bind(booking.date)
        .bind(booking.post_number)
        .bind(&booking.service_description)
        .bind(booking.created_at)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        row.into_booking()
    }

    async fn move_booking(
        &mut self,
        id: BookingId,
        date: NaiveDate,
        post_number: PostNumber,
    ) -> Result<()> {
        // Single in-place UPDATE: the booking swaps slots without ever
        // leaving the table
        sqlx::query("UPDATE bookings SET date = ?, post_number = ? WHERE id = ?")
            .bind(date)
            .bind(post_number)
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }
}
