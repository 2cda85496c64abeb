// Scheduling Service - booking lifecycle use cases

pub mod create;
pub mod reschedule;

pub use create::CreateBookingRequest;

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use crate::domain::{Booking, BookingId, BookingStatus, CapacityPlan};
use crate::error::Result;
use crate::port::{BookingRepository, Clock, TransactionalBookingStore, VehicleDirectory};

/// Scheduler configuration
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub capacity: CapacityPlan,
    /// Rolling availability window in days (observed default: 30)
    pub horizon_days: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            capacity: CapacityPlan::default(),
            horizon_days: 30,
        }
    }
}

/// Scheduler Service
///
/// Entry point for every booking mutation; reads sit on the repository,
/// allocation on the transactional store.
pub struct SchedulerService {
    store: Arc<dyn TransactionalBookingStore>,
    repo: Arc<dyn BookingRepository>,
    directory: Arc<dyn VehicleDirectory>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
}

impl SchedulerService {
    pub fn new(
        store: Arc<dyn TransactionalBookingStore>,
        repo: Arc<dyn BookingRepository>,
        directory: Arc<dyn VehicleDirectory>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            repo,
            directory,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Allocate the lowest free post on the requested date
    pub async fn create_booking(&self, req: CreateBookingRequest) -> Result<Booking> {
        create::execute(
            self.store.as_ref(),
            self.directory.as_ref(),
            self.clock.as_ref(),
            &self.config.capacity,
            req,
        )
        .await
    }

    /// Cancel a booking; idempotent when already cancelled
    pub async fn cancel_booking(&self, id: BookingId) -> Result<()> {
        self.repo
            .set_status(id, BookingStatus::Cancelled, self.clock.now_millis())
            .await?;
        info!(booking_id = id, "booking cancelled");
        Ok(())
    }

    /// Complete a booking; idempotent when already completed
    pub async fn complete_booking(&self, id: BookingId) -> Result<()> {
        self.repo
            .set_status(id, BookingStatus::Completed, self.clock.now_millis())
            .await?;
        info!(booking_id = id, "booking completed");
        Ok(())
    }

    /// Mark work as started (Planned -> InProgress)
    pub async fn start_booking(&self, id: BookingId) -> Result<()> {
        self.repo
            .set_status(id, BookingStatus::InProgress, self.clock.now_millis())
            .await
    }

    /// Atomically move a booking to a new date
    pub async fn reschedule_booking(&self, id: BookingId, new_date: NaiveDate) -> Result<Booking> {
        reschedule::execute(
            self.store.as_ref(),
            self.clock.as_ref(),
            &self.config.capacity,
            id,
            new_date,
        )
        .await
    }

    /// Administrative correction: remove a booking row regardless of status
    pub async fn delete_booking(&self, id: BookingId) -> Result<()> {
        self.repo.delete(id).await?;
        info!(booking_id = id, "booking deleted");
        Ok(())
    }

    pub async fn find_booking(&self, id: BookingId) -> Result<Option<Booking>> {
        self.repo.find_by_id(id).await
    }

    /// Non-terminal bookings, date ascending, InProgress first on a date
    pub async fn list_active(&self) -> Result<Vec<Booking>> {
        self.repo.list_active().await
    }

    /// Planned bookings only, date ascending
    pub async fn list_scheduled(&self) -> Result<Vec<Booking>> {
        self.repo.list_scheduled().await
    }

    /// Dates within the configured horizon that still have a free post
    pub async fn available_dates(&self) -> Result<Vec<NaiveDate>> {
        crate::application::availability::available_dates(
            self.repo.as_ref(),
            self.clock.as_ref(),
            &self.config.capacity,
            self.config.horizon_days,
        )
        .await
    }

    /// Advisory free-post lookup; the write path re-validates
    pub async fn free_post_for_date(
        &self,
        date: NaiveDate,
    ) -> Result<Option<crate::domain::PostNumber>> {
        crate::application::availability::free_post_for_date(
            self.repo.as_ref(),
            &self.config.capacity,
            date,
        )
        .await
    }
}
