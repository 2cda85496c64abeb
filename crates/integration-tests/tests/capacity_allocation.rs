//! Capacity Allocation Integration Tests
//!
//! Exercises the one-booking-per-post-per-day invariant end to end:
//! sequential fill-up, freeing a post, and a concurrent booking burst
//! against a real on-disk database.

use std::sync::Arc;

use bayline_core::application::scheduling::{
    CreateBookingRequest, SchedulerConfig, SchedulerService,
};
use bayline_core::domain::{NewClient, NewVehicle};
use bayline_core::error::AppError;
use bayline_core::port::{FixedClock, VehicleDirectory};
use bayline_infra_sqlite::{
    create_pool, run_migrations, SqliteBookingRepository, SqliteVehicleDirectory,
};
use chrono::NaiveDate;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, d).unwrap()
}

async fn scheduler_on(db: &str) -> (Arc<SchedulerService>, Arc<SqliteVehicleDirectory>) {
    let pool = create_pool(db).await.unwrap();
    run_migrations(&pool).await.unwrap();

    let clock = Arc::new(FixedClock {
        today: day(1),
        now_millis: 1_780_000_000_000,
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

/// Register a client and one vehicle so the plate resolves during create
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
            model: "Vesta".to_string(),
            year: Some(2021),
        })
        .await
        .unwrap();
}

fn request(plate: &str, date: NaiveDate) -> CreateBookingRequest {
    CreateBookingRequest {
        vehicle_plate: plate.to_string(),
        date,
        service_description: "oil change".to_string(),
    }
}

#[tokio::test]
async fn test_fills_posts_in_ascending_order_then_rejects() {
    let (scheduler, directory) = scheduler_on(":memory:").await;

    for i in 0..6 {
        register_vehicle(&directory, &format!("A{:03}BC", i), i).await;
    }

    // Five posts on one day, assigned 1..=5 in order
    for i in 0..5 {
        let booking = scheduler
            .create_booking(request(&format!("A{:03}BC", i), day(10)))
            .await
            .unwrap();
        assert_eq!(booking.date, day(10));
        assert_eq!(booking.post_number, i as i64 + 1);
    }

    // Sixth request on the same day is refused
    let result = scheduler
        .create_booking(request("A005BC", day(10)))
        .await;
    assert!(matches!(result, Err(AppError::NoCapacity { date }) if date == day(10)));

    // Another day is unaffected
    let booking = scheduler
        .create_booking(request("A005BC", day(11)))
        .await
        .unwrap();
    assert_eq!(booking.post_number, 1);
}

#[tokio::test]
async fn test_cancelling_frees_the_post_for_reuse() {
    let (scheduler, directory) = scheduler_on(":memory:").await;

    for i in 0..6 {
        register_vehicle(&directory, &format!("B{:03}KX", i), 100 + i).await;
    }

    let mut ids = Vec::new();
    for i in 0..5 {
        let booking = scheduler
            .create_booking(request(&format!("B{:03}KX", i), day(12)))
            .await
            .unwrap();
        ids.push(booking.id);
    }

    // Cancel the booking that holds post 3
    scheduler.cancel_booking(ids[2]).await.unwrap();

    // The freed post is the lowest available and gets reassigned
    let booking = scheduler
        .create_booking(request("B005KX", day(12)))
        .await
        .unwrap();
    assert_eq!(booking.post_number, 3);
}

#[tokio::test]
async fn test_completed_booking_keeps_no_claim_on_the_post() {
    let (scheduler, directory) = scheduler_on(":memory:").await;

    register_vehicle(&directory, "C001OP", 200).await;
    register_vehicle(&directory, "C002OP", 201).await;

    let first = scheduler
        .create_booking(request("C001OP", day(15)))
        .await
        .unwrap();
    scheduler.start_booking(first.id).await.unwrap();
    scheduler.complete_booking(first.id).await.unwrap();

    // A completed visit no longer occupies post 1
    let second = scheduler
        .create_booking(request("C002OP", day(15)))
        .await
        .unwrap();
    assert_eq!(second.post_number, 1);
}

/// Ten concurrent requests for the same five-post day: exactly five must
/// win, each with a distinct post, and the rest must be turned away.
#[tokio::test]
async fn test_concurrent_burst_never_overbooks() {
    let db_path = format!("/tmp/bayline_test_burst_{}.db", std::process::id());
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", db_path, suffix));
    }

    let (scheduler, directory) = scheduler_on(&db_path).await;

    for i in 0..10 {
        register_vehicle(&directory, &format!("K{:03}MH", i), 300 + i).await;
    }

    let mut handles = Vec::new();
    for i in 0..10 {
        let scheduler = scheduler.clone();
        handles.push(tokio::spawn(async move {
            scheduler
                .create_booking(request(&format!("K{:03}MH", i), day(20)))
                .await
        }));
    }

    let mut posts = Vec::new();
    let mut rejections = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(booking) => posts.push(booking.post_number),
            Err(AppError::NoCapacity { date }) => {
                assert_eq!(date, day(20));
                rejections += 1;
            }
            Err(e) => panic!("unexpected error from burst: {}", e),
        }
    }

    posts.sort_unstable();
    assert_eq!(posts, vec![1, 2, 3, 4, 5], "five winners, distinct posts");
    assert_eq!(rejections, 5);

    // Double-check against the store itself
    let active = scheduler.list_active().await.unwrap();
    assert_eq!(active.len(), 5);

    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", db_path, suffix));
    }
}
