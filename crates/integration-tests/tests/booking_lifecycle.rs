//! Booking Lifecycle Integration Tests
//!
//! Planned -> InProgress -> Completed / Cancelled against a real store,
//! including idempotent repeats, terminal-state protection, rescheduling
//! and administrative deletion.

use std::sync::Arc;

use bayline_core::application::scheduling::{
    CreateBookingRequest, SchedulerConfig, SchedulerService,
};
use bayline_core::domain::{BookingStatus, NewClient, NewVehicle};
use bayline_core::error::AppError;
use bayline_core::port::{FixedClock, VehicleDirectory};
use bayline_infra_sqlite::{
    create_pool, run_migrations, SqliteBookingRepository, SqliteVehicleDirectory,
};
use chrono::NaiveDate;

const NOW_MS: i64 = 1_780_000_000_000;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, d).unwrap()
}

async fn scheduler() -> (Arc<SchedulerService>, Arc<SqliteVehicleDirectory>) {
    let pool = create_pool(":memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();

    let clock = Arc::new(FixedClock {
        today: day(1),
        now_millis: NOW_MS,
    });
    let repo = Arc::new(SqliteBookingRepository::new(pool.clone()));
    let store = Arc::new(SqliteBookingRepository::new(pool.clone()));
    let directory = Arc::new(SqliteVehicleDirectory::new(pool));

    let scheduler = Arc::new(SchedulerService::new(
        store,
        repo,
        directory.clone(),
        clock,
        SchedulerConfig::default(),
    ));

    (scheduler, directory)
}

async fn register_vehicle(directory: &SqliteVehicleDirectory, plate: &str, phone_suffix: u32) {
    let client = directory
        .register_client(&NewClient {
            phone: format!("+7949{:07}", phone_suffix),
            name: format!("Client {}", phone_suffix),
            username: None,
            external_account: None,
        })
        .await
        .unwrap();

    directory
        .register_vehicle(&NewVehicle {
            plate: plate.to_string(),
            client_id: client.id,
            model: "Granta".to_string(),
            year: None,
        })
        .await
        .unwrap();
}

fn request(plate: &str, date: NaiveDate) -> CreateBookingRequest {
    CreateBookingRequest {
        vehicle_plate: plate.to_string(),
        date,
        service_description: "brake pads".to_string(),
    }
}

#[tokio::test]
async fn test_full_lifecycle_stamps_timestamps() {
    let (scheduler, directory) = scheduler().await;
    register_vehicle(&directory, "A818BC", 1).await;

    let booking = scheduler
        .create_booking(request("A818BC", day(5)))
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Planned);
    assert_eq!(booking.created_at, NOW_MS);
    assert!(booking.started_at.is_none());

    scheduler.start_booking(booking.id).await.unwrap();
    let started = scheduler.find_booking(booking.id).await.unwrap().unwrap();
    assert_eq!(started.status, BookingStatus::InProgress);
    assert_eq!(started.started_at, Some(NOW_MS));
    assert!(started.finished_at.is_none());

    scheduler.complete_booking(booking.id).await.unwrap();
    let completed = scheduler.find_booking(booking.id).await.unwrap().unwrap();
    assert_eq!(completed.status, BookingStatus::Completed);
    assert_eq!(completed.finished_at, Some(NOW_MS));
}

#[tokio::test]
async fn test_cancel_is_idempotent() {
    let (scheduler, directory) = scheduler().await;
    register_vehicle(&directory, "B202KX", 2).await;

    let booking = scheduler
        .create_booking(request("B202KX", day(5)))
        .await
        .unwrap();

    scheduler.cancel_booking(booking.id).await.unwrap();
    // Repeating the cancel is a no-op, not an error
    scheduler.cancel_booking(booking.id).await.unwrap();

    let cancelled = scheduler.find_booking(booking.id).await.unwrap().unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
}

#[tokio::test]
async fn test_terminal_states_do_not_cross() {
    let (scheduler, directory) = scheduler().await;
    register_vehicle(&directory, "C303OP", 3).await;

    let booking = scheduler
        .create_booking(request("C303OP", day(5)))
        .await
        .unwrap();
    scheduler.cancel_booking(booking.id).await.unwrap();

    // A cancelled booking cannot be completed or restarted
    let result = scheduler.complete_booking(booking.id).await;
    assert!(matches!(result, Err(AppError::InvalidState(_))));

    let result = scheduler.start_booking(booking.id).await;
    assert!(matches!(result, Err(AppError::InvalidState(_))));
}

#[tokio::test]
async fn test_lifecycle_on_missing_booking_is_not_found() {
    let (scheduler, _) = scheduler().await;

    let result = scheduler.cancel_booking(9999).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let result = scheduler.reschedule_booking(9999, day(5)).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_reschedule_moves_atomically() {
    let (scheduler, directory) = scheduler().await;
    register_vehicle(&directory, "E404TA", 4).await;
    register_vehicle(&directory, "E405TA", 5).await;

    // Target date already has post 1 taken
    scheduler
        .create_booking(request("E405TA", day(8)))
        .await
        .unwrap();

    let booking = scheduler
        .create_booking(request("E404TA", day(5)))
        .await
        .unwrap();

    let moved = scheduler.reschedule_booking(booking.id, day(8)).await.unwrap();
    assert_eq!(moved.id, booking.id);
    assert_eq!(moved.date, day(8));
    assert_eq!(moved.post_number, 2);
    assert_eq!(moved.status, BookingStatus::Planned);

    // The old slot is gone, not duplicated
    let stored = scheduler.find_booking(booking.id).await.unwrap().unwrap();
    assert_eq!(stored.date, day(8));
    assert_eq!(stored.post_number, 2);
}

#[tokio::test]
async fn test_reschedule_to_full_date_leaves_booking_untouched() {
    let (scheduler, directory) = scheduler().await;
    for i in 0..6 {
        register_vehicle(&directory, &format!("F{:03}YB", i), 10 + i).await;
    }

    // Fill day 9 completely
    for i in 0..5 {
        scheduler
            .create_booking(request(&format!("F{:03}YB", i), day(9)))
            .await
            .unwrap();
    }

    let booking = scheduler
        .create_booking(request("F005YB", day(5)))
        .await
        .unwrap();

    let result = scheduler.reschedule_booking(booking.id, day(9)).await;
    assert!(matches!(result, Err(AppError::NoCapacity { date }) if date == day(9)));

    // Nothing moved
    let stored = scheduler.find_booking(booking.id).await.unwrap().unwrap();
    assert_eq!(stored.date, day(5));
    assert_eq!(stored.post_number, 1);
    assert_eq!(stored.status, BookingStatus::Planned);
}

#[tokio::test]
async fn test_reschedule_rejects_terminal_booking() {
    let (scheduler, directory) = scheduler().await;
    register_vehicle(&directory, "H606EM", 20).await;

    let booking = scheduler
        .create_booking(request("H606EM", day(5)))
        .await
        .unwrap();
    scheduler.complete_booking(booking.id).await.unwrap();

    let result = scheduler.reschedule_booking(booking.id, day(6)).await;
    assert!(matches!(result, Err(AppError::InvalidState(_))));
}

#[tokio::test]
async fn test_delete_removes_any_status() {
    let (scheduler, directory) = scheduler().await;
    register_vehicle(&directory, "K707HP", 21).await;
    register_vehicle(&directory, "K708HP", 22).await;

    let planned = scheduler
        .create_booking(request("K707HP", day(5)))
        .await
        .unwrap();
    let completed = scheduler
        .create_booking(request("K708HP", day(5)))
        .await
        .unwrap();
    scheduler.complete_booking(completed.id).await.unwrap();

    scheduler.delete_booking(planned.id).await.unwrap();
    scheduler.delete_booking(completed.id).await.unwrap();

    assert!(scheduler.find_booking(planned.id).await.unwrap().is_none());
    assert!(scheduler.find_booking(completed.id).await.unwrap().is_none());

    // Deleting again reports NotFound
    let result = scheduler.delete_booking(planned.id).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_create_rejects_unknown_plate_and_past_date() {
    let (scheduler, directory) = scheduler().await;
    register_vehicle(&directory, "M909CT", 30).await;

    let result = scheduler.create_booking(request("UNSEEN1", day(5))).await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    // Clock is pinned to day 1
    let result = scheduler
        .create_booking(request("M909CT", NaiveDate::from_ymd_opt(2026, 5, 31).unwrap()))
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_list_active_orders_in_progress_first() {
    let (scheduler, directory) = scheduler().await;
    for i in 0..3 {
        register_vehicle(&directory, &format!("P{:03}XY", i), 40 + i).await;
    }

    let early = scheduler
        .create_booking(request("P000XY", day(3)))
        .await
        .unwrap();
    let late_started = scheduler
        .create_booking(request("P001XY", day(4)))
        .await
        .unwrap();
    let late_planned = scheduler
        .create_booking(request("P002XY", day(4)))
        .await
        .unwrap();
    scheduler.start_booking(late_started.id).await.unwrap();

    let active = scheduler.list_active().await.unwrap();
    let ids: Vec<i64> = active.iter().map(|b| b.id).collect();
    // Date ascending; within a date InProgress sorts before Planned
    assert_eq!(ids, vec![early.id, late_started.id, late_planned.id]);

    let scheduled = scheduler.list_scheduled().await.unwrap();
    let ids: Vec<i64> = scheduled.iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![early.id, late_planned.id]);
}
