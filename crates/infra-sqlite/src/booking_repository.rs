// SQLite BookingRepository Implementation

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;

use bayline_core::domain::{Booking, BookingId, BookingStatus, PostNumber, VehicleBookingCount};
use bayline_core::error::{AppError, Result};
use bayline_core::port::{BookingRepository, BookingStoreTransaction, TransactionalBookingStore};

use crate::SqliteBookingTransaction;

const NON_TERMINAL: &str = "('PLANNED', 'IN_PROGRESS')";

// Helper to convert sqlx::Error to AppError with structured information
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => {
            if let Some(code) = db_err.code() {
                let code_str = code.as_ref();

                // SQLite error codes: https://www.sqlite.org/rescode.html
                match code_str {
                    "2067" | "1555" => {
                        // UNIQUE constraint failed: a concurrent writer holds
                        // the slot (or the phone/plate is taken)
                        AppError::Conflict(format!(
                            "Unique constraint violation: {} ({})",
                            db_err.message(),
                            code_str
                        ))
                    }
                    "787" | "3850" => {
                        // FOREIGN KEY constraint failed
                        AppError::Validation(format!(
                            "Foreign key constraint violation: {} ({})",
                            db_err.message(),
                            code_str
                        ))
                    }
                    "5" | "261" | "517" | "773" => {
                        // SQLITE_BUSY family - transient lock contention.
                        // sqlx reports the extended code, so BUSY_RECOVERY
                        // (261), BUSY_SNAPSHOT (517) and BUSY_TIMEOUT (773)
                        // must be listed alongside the primary code.
                        AppError::StoreUnavailable(format!(
                            "Database locked (SQLITE_BUSY): {} ({})",
                            db_err.message(),
                            code_str
                        ))
                    }
                    "13" => {
                        // SQLITE_FULL
                        AppError::Database(format!("Database full: {}", db_err.message()))
                    }
                    _ => AppError::Database(format!(
                        "Database error [{}]: {}",
                        code_str,
                        db_err.message()
                    )),
                }
            } else {
                AppError::Database(format!("Database error: {}", db_err.message()))
            }
        }
        sqlx::Error::RowNotFound => AppError::Database("Row not found".to_string()),
        sqlx::Error::ColumnNotFound(col) => {
            AppError::Database(format!("Column not found: {}", col))
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            AppError::StoreUnavailable(err.to_string())
        }
        _ => AppError::Database(err.to_string()),
    }
}

pub struct SqliteBookingRepository {
    pool: SqlitePool,
}

impl SqliteBookingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for SqliteBookingRepository {
    async fn find_by_id(&self, id: BookingId) -> Result<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>("SELECT * FROM bookings WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(BookingRow::into_booking).transpose()
    }

    async fn set_status(&self, id: BookingId, to: BookingStatus, now_millis: i64) -> Result<()> {
        // Conditional update: a terminal row is never overwritten, so a late
        // cancel cannot clobber a completed visit
        let query = match to {
            BookingStatus::InProgress => {
                "UPDATE bookings SET status = ?, started_at = ? \
                 WHERE id = ? AND status IN ('PLANNED', 'IN_PROGRESS')"
            }
            _ => {
                "UPDATE bookings SET status = ?, finished_at = ? \
                 WHERE id = ? AND status IN ('PLANNED', 'IN_PROGRESS')"
            }
        };

        let result = sqlx::query(query)
            .bind(to.to_string())
            .bind(now_millis)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        // Nothing updated: missing row, idempotent repeat, or a crossed
        // terminal state
        let current: Option<String> = sqlx::query_scalar("SELECT status FROM bookings WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        match current {
            None => Err(AppError::NotFound(format!("booking {} not found", id))),
            Some(status) if status == to.to_string() => Ok(()),
            Some(status) => Err(AppError::InvalidState(format!(
                "cannot move booking {} from {} to {}",
                id, status, to
            ))),
        }
    }

    async fn delete(&self, id: BookingId) -> Result<()> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("booking {} not found", id)));
        }
        Ok(())
    }

    async fn occupied_posts(&self, date: NaiveDate) -> Result<Vec<PostNumber>> {
        let posts: Vec<i64> = sqlx::query_scalar(&format!(
            "SELECT post_number FROM bookings \
             WHERE date = ? AND status IN {} ORDER BY post_number",
            NON_TERMINAL
        ))
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(posts)
    }

    async fn occupancy_by_date(
        &self,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<HashMap<NaiveDate, i64>> {
        let rows: Vec<(NaiveDate, i64)> = sqlx::query_as(&format!(
            "SELECT date, COUNT(*) FROM bookings \
             WHERE date >= ? AND date < ? AND status IN {} \
             GROUP BY date",
            NON_TERMINAL
        ))
        .bind(from)
        .bind(until)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().collect())
    }

    async fn list_active(&self) -> Result<Vec<Booking>> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT * FROM bookings WHERE status IN {} \
             ORDER BY date ASC, \
                      CASE status WHEN 'IN_PROGRESS' THEN 0 ELSE 1 END ASC, \
                      id ASC",
            NON_TERMINAL
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(BookingRow::into_booking).collect()
    }

    async fn list_scheduled(&self) -> Result<Vec<Booking>> {
        let rows: Vec<BookingRow> = sqlx::query_as(
            "SELECT * FROM bookings WHERE status = 'PLANNED' ORDER BY date ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(BookingRow::into_booking).collect()
    }

    async fn count_by_status(&self, status: BookingStatus) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE status = ?")
            .bind(status.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(count)
    }

    async fn find_in_range(&self, from: NaiveDate, until: NaiveDate) -> Result<Vec<Booking>> {
        let rows: Vec<BookingRow> = sqlx::query_as(
            "SELECT * FROM bookings WHERE date >= ? AND date <= ? ORDER BY date ASC, id ASC",
        )
        .bind(from)
        .bind(until)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(BookingRow::into_booking).collect()
    }

    async fn top_vehicle_in_range(
        &self,
        from: NaiveDate,
        until: NaiveDate,
    ) -> Result<Option<VehicleBookingCount>> {
        // COUNT DESC with lexicographic plate tie-break keeps the answer
        // deterministic when counts are equal
        let row: Option<(String, i64)> = sqlx::query_as(
            "SELECT vehicle_plate, COUNT(*) AS bookings FROM bookings \
             WHERE date >= ? AND date <= ? \
             GROUP BY vehicle_plate \
             ORDER BY bookings DESC, vehicle_plate ASC \
             LIMIT 1",
        )
        .bind(from)
        .bind(until)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|(plate, bookings)| VehicleBookingCount { plate, bookings }))
    }

    async fn top_vehicle(&self) -> Result<Option<VehicleBookingCount>> {
        let row: Option<(String, i64)> = sqlx::query_as(
            "SELECT vehicle_plate, COUNT(*) AS bookings FROM bookings \
             GROUP BY vehicle_plate \
             ORDER BY bookings DESC, vehicle_plate ASC \
             LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|(plate, bookings)| VehicleBookingCount { plate, bookings }))
    }

    async fn find_by_plate_pattern(&self, pattern: &str) -> Result<Vec<Booking>> {
        let rows: Vec<BookingRow> = sqlx::query_as(
            "SELECT * FROM bookings WHERE vehicle_plate LIKE ? ORDER BY date ASC, id ASC",
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(BookingRow::into_booking).collect()
    }

    async fn count_by_plate_pattern_since(&self, pattern: &str, since: NaiveDate) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings WHERE vehicle_plate LIKE ? AND date >= ?",
        )
        .bind(pattern)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(count)
    }
}

#[async_trait]
impl TransactionalBookingStore for SqliteBookingRepository {
    async fn begin_transaction(&self) -> Result<Box<dyn BookingStoreTransaction>> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(Box::new(SqliteBookingTransaction::new(tx)))
    }
}

/// SQLite row representation
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct BookingRow {
    id: i64,
    vehicle_plate: String,
    date: NaiveDate,
    post_number: i64,
    service_description: String,
    status: String,
    created_at: i64,
    started_at: Option<i64>,
    finished_at: Option<i64>,
}

impl BookingRow {
    pub(crate) fn into_booking(self) -> Result<Booking> {
        // The CHECK constraint keeps this from ever firing; a corrupted row
        // must not masquerade as a real status
        let status = BookingStatus::parse(&self.status).ok_or_else(|| {
            AppError::Database(format!(
                "booking {} has invalid status '{}'",
                self.id, self.status
            ))
        })?;

        Ok(Booking {
            id: self.id,
            vehicle_plate: self.vehicle_plate,
            date: self.date,
            post_number: self.post_number,
            service_description: self.service_description,
            status,
            created_at: self.created_at,
            started_at: self.started_at,
            finished_at: self.finished_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations, SqliteVehicleDirectory};
    use bayline_core::domain::{NewBooking, NewClient, NewVehicle};
    use bayline_core::port::VehicleDirectory;

    async fn setup_test_db() -> SqlitePool {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();

        // One registered client with one vehicle for FK targets
        let directory = SqliteVehicleDirectory::new(pool.clone());
        let client = directory
            .register_client(&NewClient {
                phone: "+79491234567".to_string(),
                name: "Ivan".to_string(),
                username: None,
                external_account: None,
            })
            .await
            .unwrap();
        directory
            .register_vehicle(&NewVehicle {
                plate: "A818BC".to_string(),
                client_id: client.id,
                model: "GLS 63".to_string(),
                year: Some(2022),
            })
            .await
            .unwrap();

        pool
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    async fn insert_booking(pool: &SqlitePool, date: NaiveDate, post: i64) -> Booking {
        let repo = SqliteBookingRepository::new(pool.clone());
        let mut tx = repo.begin_transaction().await.unwrap();
        let booking = tx
            .insert(&NewBooking {
                vehicle_plate: "A818BC".to_string(),
                date,
                post_number: post,
                service_description: "wash".to_string(),
                created_at: 1000,
            })
            .await
            .unwrap();
        tx.commit().await.unwrap();
        booking
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let pool = setup_test_db().await;
        let repo = SqliteBookingRepository::new(pool.clone());

        let booking = insert_booking(&pool, day(1), 1).await;
        assert!(booking.id >= 1);
        assert_eq!(booking.status, BookingStatus::Planned);

        let found = repo.find_by_id(booking.id).await.unwrap().unwrap();
        assert_eq!(found.post_number, 1);
        assert_eq!(found.date, day(1));
    }

    #[tokio::test]
    async fn test_ids_are_monotonic() {
        let pool = setup_test_db().await;

        let first = insert_booking(&pool, day(1), 1).await;
        let second = insert_booking(&pool, day(1), 2).await;
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn test_set_status_is_idempotent_on_repeat() {
        let pool = setup_test_db().await;
        let repo = SqliteBookingRepository::new(pool.clone());
        let booking = insert_booking(&pool, day(1), 1).await;

        repo.set_status(booking.id, BookingStatus::Cancelled, 2000)
            .await
            .unwrap();
        // Second cancel succeeds without error
        repo.set_status(booking.id, BookingStatus::Cancelled, 3000)
            .await
            .unwrap();

        let found = repo.find_by_id(booking.id).await.unwrap().unwrap();
        assert_eq!(found.status, BookingStatus::Cancelled);
        assert_eq!(found.finished_at, Some(2000));
    }

    #[tokio::test]
    async fn test_set_status_rejects_crossing_terminal_states() {
        let pool = setup_test_db().await;
        let repo = SqliteBookingRepository::new(pool.clone());
        let booking = insert_booking(&pool, day(1), 1).await;

        repo.set_status(booking.id, BookingStatus::Completed, 2000)
            .await
            .unwrap();

        let err = repo
            .set_status(booking.id, BookingStatus::Cancelled, 3000)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_set_status_not_found() {
        let pool = setup_test_db().await;
        let repo = SqliteBookingRepository::new(pool);

        let err = repo
            .set_status(999, BookingStatus::Cancelled, 1000)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_start_stamps_started_at() {
        let pool = setup_test_db().await;
        let repo = SqliteBookingRepository::new(pool.clone());
        let booking = insert_booking(&pool, day(1), 1).await;

        repo.set_status(booking.id, BookingStatus::InProgress, 2500)
            .await
            .unwrap();

        let found = repo.find_by_id(booking.id).await.unwrap().unwrap();
        assert_eq!(found.started_at, Some(2500));
        assert_eq!(found.finished_at, None);
    }

    #[tokio::test]
    async fn test_occupied_posts_ignores_terminal_bookings() {
        let pool = setup_test_db().await;
        let repo = SqliteBookingRepository::new(pool.clone());

        insert_booking(&pool, day(1), 1).await;
        let cancelled = insert_booking(&pool, day(1), 2).await;
        insert_booking(&pool, day(1), 3).await;
        repo.set_status(cancelled.id, BookingStatus::Cancelled, 2000)
            .await
            .unwrap();

        let posts = repo.occupied_posts(day(1)).await.unwrap();
        assert_eq!(posts, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_list_active_orders_in_progress_first() {
        let pool = setup_test_db().await;
        let repo = SqliteBookingRepository::new(pool.clone());

        let planned = insert_booking(&pool, day(1), 1).await;
        let started = insert_booking(&pool, day(1), 2).await;
        let later = insert_booking(&pool, day(2), 1).await;
        repo.set_status(started.id, BookingStatus::InProgress, 2000)
            .await
            .unwrap();

        let active = repo.list_active().await.unwrap();
        let ids: Vec<i64> = active.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![started.id, planned.id, later.id]);
    }

    #[tokio::test]
    async fn test_delete_removes_row() {
        let pool = setup_test_db().await;
        let repo = SqliteBookingRepository::new(pool.clone());
        let booking = insert_booking(&pool, day(1), 1).await;

        repo.delete(booking.id).await.unwrap();
        assert!(repo.find_by_id(booking.id).await.unwrap().is_none());

        let err = repo.delete(booking.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_top_vehicle_tie_breaks_lexicographically() {
        let pool = setup_test_db().await;
        let repo = SqliteBookingRepository::new(pool.clone());

        // Second vehicle, same owner
        let directory = SqliteVehicleDirectory::new(pool.clone());
        directory
            .register_vehicle(&NewVehicle {
                plate: "Z900ZZ".to_string(),
                client_id: 1,
                model: "Tayron".to_string(),
                year: None,
            })
            .await
            .unwrap();

        insert_booking(&pool, day(1), 1).await; // A818BC
        let mut tx = repo.begin_transaction().await.unwrap();
        tx.insert(&NewBooking {
            vehicle_plate: "Z900ZZ".to_string(),
            date: day(1),
            post_number: 2,
            service_description: String::new(),
            created_at: 1000,
        })
        .await
        .unwrap();
        tx.commit().await.unwrap();

        // One booking each: the lexicographically smaller plate wins
        let top = repo.top_vehicle().await.unwrap().unwrap();
        assert_eq!(top.plate, "A818BC");
        assert_eq!(top.bookings, 1);
    }

    /// A write from a stale WAL snapshot fails with SQLITE_BUSY_SNAPSHOT
    /// (extended code 517, not the primary 5) and must still be classified
    /// as retryable contention, not a terminal database error.
    #[tokio::test]
    async fn test_stale_snapshot_write_maps_to_store_unavailable() {
        let db_path = format!("/tmp/bayline_test_snapshot_{}.db", std::process::id());
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", db_path, suffix));
        }

        let pool = create_pool(&db_path).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let directory = SqliteVehicleDirectory::new(pool.clone());
        let client = directory
            .register_client(&NewClient {
                phone: "+79491234567".to_string(),
                name: "Ivan".to_string(),
                username: None,
                external_account: None,
            })
            .await
            .unwrap();
        directory
            .register_vehicle(&NewVehicle {
                plate: "A818BC".to_string(),
                client_id: client.id,
                model: "GLS 63".to_string(),
                year: Some(2022),
            })
            .await
            .unwrap();

        let repo = SqliteBookingRepository::new(pool.clone());

        // The losing transaction takes its read snapshot first
        let mut loser = repo.begin_transaction().await.unwrap();
        let _ = loser.occupied_posts(day(20), None).await.unwrap();

        // A competing writer commits behind that snapshot
        let mut winner = repo.begin_transaction().await.unwrap();
        winner
            .insert(&NewBooking {
                vehicle_plate: "A818BC".to_string(),
                date: day(20),
                post_number: 1,
                service_description: String::new(),
                created_at: 1000,
            })
            .await
            .unwrap();
        winner.commit().await.unwrap();

        // Upgrading the stale snapshot to a write cannot succeed; the error
        // must come back as transient so allocation loops retry it
        let err = loser
            .insert(&NewBooking {
                vehicle_plate: "A818BC".to_string(),
                date: day(20),
                post_number: 2,
                service_description: String::new(),
                created_at: 1000,
            })
            .await
            .unwrap_err();
        assert!(
            matches!(err, AppError::StoreUnavailable(_)),
            "expected StoreUnavailable, got: {}",
            err
        );
        assert!(err.is_retryable_conflict());
        loser.rollback().await.unwrap();

        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", db_path, suffix));
        }
    }
}
