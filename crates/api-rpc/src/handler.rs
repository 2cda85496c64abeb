//! RPC Method Handlers
//!
//! Thin adapters from JSON-RPC parameters onto the application services.

use crate::error::{code, to_rpc_error};
use crate::rate_limiter::RateLimiter;
use crate::types::{
    AvailableDatesRequest, AvailableDatesResponse, BookingIdRequest, BookingView, ClientView,
    CreateBookingRequest, DeleteResponse, FindOwnerRequest, FindOwnerResponse, FreePostRequest,
    FreePostResponse, ListRequest, ListResponse, RangeReportRequest, RangeReportResponse,
    RegisterClientRequest, RegisterVehicleRequest, RescheduleRequest, StatusChangeResponse,
    StatusCountsRequest, StatusCountsResponse, TopVehicleRequest, TopVehicleResponse,
    UpdatePhoneRequest, UpdatePhoneResponse, VehicleView, VehicleReportRequest,
    VehicleReportResponse,
};
use bayline_core::application::reporting::ReportingService;
use bayline_core::application::scheduling::{self, SchedulerService};
use bayline_core::domain::{NewClient, NewVehicle};
use bayline_core::port::VehicleDirectory;
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    scheduler: Arc<SchedulerService>,
    reporting: Arc<ReportingService>,
    directory: Arc<dyn VehicleDirectory>,
    rate_limiter: RateLimiter,
}

impl RpcHandler {
    pub fn new(
        scheduler: Arc<SchedulerService>,
        reporting: Arc<ReportingService>,
        directory: Arc<dyn VehicleDirectory>,
    ) -> Self {
        // Default: 200 burst, 100 req/sec (configurable via env)
        let max_burst: u32 = std::env::var("BAYLINE_RATE_LIMIT_BURST")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(200);

        let rate_per_sec: u32 = std::env::var("BAYLINE_RATE_LIMIT_RATE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(100);

        Self {
            scheduler,
            reporting,
            directory,
            rate_limiter: RateLimiter::new(max_burst, rate_per_sec),
        }
    }

    async fn throttle(&self) -> Result<(), ErrorObjectOwned> {
        if self.rate_limiter.check().await {
            Ok(())
        } else {
            Err(ErrorObjectOwned::owned(
                code::THROTTLED,
                "Rate limit exceeded. Please slow down.",
                None::<()>,
            ))
        }
    }

    /// booking.create.v1
    pub async fn create_booking(
        &self,
        params: CreateBookingRequest,
    ) -> Result<BookingView, ErrorObjectOwned> {
        self.throttle().await?;

        let booking = self
            .scheduler
            .create_booking(scheduling::CreateBookingRequest {
                vehicle_plate: params.vehicle_plate,
                date: params.date,
                service_description: params.service_description,
            })
            .await
            .map_err(to_rpc_error)?;

        Ok(booking.into())
    }

    /// booking.cancel.v1
    pub async fn cancel_booking(
        &self,
        params: BookingIdRequest,
    ) -> Result<StatusChangeResponse, ErrorObjectOwned> {
        self.throttle().await?;

        self.scheduler
            .cancel_booking(params.booking_id)
            .await
            .map_err(to_rpc_error)?;

        Ok(StatusChangeResponse {
            booking_id: params.booking_id,
            status: "CANCELLED".to_string(),
        })
    }

    /// booking.start.v1
    pub async fn start_booking(
        &self,
        params: BookingIdRequest,
    ) -> Result<StatusChangeResponse, ErrorObjectOwned> {
        self.throttle().await?;

        self.scheduler
            .start_booking(params.booking_id)
            .await
            .map_err(to_rpc_error)?;

        Ok(StatusChangeResponse {
            booking_id: params.booking_id,
            status: "IN_PROGRESS".to_string(),
        })
    }

    /// booking.complete.v1
    pub async fn complete_booking(
        &self,
        params: BookingIdRequest,
    ) -> Result<StatusChangeResponse, ErrorObjectOwned> {
        self.throttle().await?;

        self.scheduler
            .complete_booking(params.booking_id)
            .await
            .map_err(to_rpc_error)?;

        Ok(StatusChangeResponse {
            booking_id: params.booking_id,
            status: "COMPLETED".to_string(),
        })
    }

    /// booking.reschedule.v1
    pub async fn reschedule_booking(
        &self,
        params: RescheduleRequest,
    ) -> Result<BookingView, ErrorObjectOwned> {
        self.throttle().await?;

        let booking = self
            .scheduler
            .reschedule_booking(params.booking_id, params.new_date)
            .await
            .map_err(to_rpc_error)?;

        Ok(booking.into())
    }

    /// booking.delete.v1
    pub async fn delete_booking(
        &self,
        params: BookingIdRequest,
    ) -> Result<DeleteResponse, ErrorObjectOwned> {
        self.throttle().await?;

        self.scheduler
            .delete_booking(params.booking_id)
            .await
            .map_err(to_rpc_error)?;

        Ok(DeleteResponse {
            booking_id: params.booking_id,
            deleted: true,
        })
    }

    /// schedule.available_dates.v1
    pub async fn available_dates(
        &self,
        _params: AvailableDatesRequest,
    ) -> Result<AvailableDatesResponse, ErrorObjectOwned> {
        self.throttle().await?;

        let dates = self
            .scheduler
            .available_dates()
            .await
            .map_err(to_rpc_error)?;

        Ok(AvailableDatesResponse { dates })
    }

    /// schedule.free_post.v1
    pub async fn free_post(
        &self,
        params: FreePostRequest,
    ) -> Result<FreePostResponse, ErrorObjectOwned> {
        self.throttle().await?;

        let post_number = self
            .scheduler
            .free_post_for_date(params.date)
            .await
            .map_err(to_rpc_error)?;

        Ok(FreePostResponse {
            date: params.date,
            post_number,
        })
    }

    /// schedule.list_active.v1
    pub async fn list_active(&self, _params: ListRequest) -> Result<ListResponse, ErrorObjectOwned> {
        self.throttle().await?;

        let bookings = self.scheduler.list_active().await.map_err(to_rpc_error)?;

        Ok(ListResponse {
            bookings: bookings.into_iter().map(BookingView::from).collect(),
        })
    }

    /// schedule.list_scheduled.v1
    pub async fn list_scheduled(
        &self,
        _params: ListRequest,
    ) -> Result<ListResponse, ErrorObjectOwned> {
        self.throttle().await?;

        let bookings = self
            .scheduler
            .list_scheduled()
            .await
            .map_err(to_rpc_error)?;

        Ok(ListResponse {
            bookings: bookings.into_iter().map(BookingView::from).collect(),
        })
    }

    /// report.status_counts.v1
    pub async fn status_counts(
        &self,
        _params: StatusCountsRequest,
    ) -> Result<StatusCountsResponse, ErrorObjectOwned> {
        self.throttle().await?;

        let counts = self
            .reporting
            .status_counts()
            .await
            .map_err(to_rpc_error)?;

        Ok(StatusCountsResponse {
            total: counts.total(),
            planned: counts.planned,
            in_progress: counts.in_progress,
            completed: counts.completed,
            cancelled: counts.cancelled,
        })
    }

    /// report.range.v1
    pub async fn range_report(
        &self,
        params: RangeReportRequest,
    ) -> Result<RangeReportResponse, ErrorObjectOwned> {
        self.throttle().await?;

        let report = self
            .reporting
            .range_report(params.from, params.until)
            .await
            .map_err(to_rpc_error)?;

        Ok(RangeReportResponse {
            from: report.from,
            until: report.until,
            bookings: report.bookings.into_iter().map(BookingView::from).collect(),
            top_vehicle: report.top_vehicle.map(Into::into),
        })
    }

    /// report.vehicle.v1
    pub async fn vehicle_report(
        &self,
        params: VehicleReportRequest,
    ) -> Result<VehicleReportResponse, ErrorObjectOwned> {
        self.throttle().await?;

        let report = self
            .reporting
            .vehicle_report(&params.pattern)
            .await
            .map_err(to_rpc_error)?;

        Ok(VehicleReportResponse {
            pattern: report.pattern,
            bookings: report.bookings.into_iter().map(BookingView::from).collect(),
            last_year_count: report.last_year_count,
        })
    }

    /// report.top_vehicle.v1
    pub async fn top_vehicle(
        &self,
        _params: TopVehicleRequest,
    ) -> Result<TopVehicleResponse, ErrorObjectOwned> {
        self.throttle().await?;

        let top_vehicle = self.reporting.top_vehicle().await.map_err(to_rpc_error)?;

        Ok(TopVehicleResponse {
            top_vehicle: top_vehicle.map(Into::into),
        })
    }

    /// directory.register_client.v1
    pub async fn register_client(
        &self,
        params: RegisterClientRequest,
    ) -> Result<ClientView, ErrorObjectOwned> {
        self.throttle().await?;

        let client = self
            .directory
            .register_client(&NewClient {
                phone: params.phone,
                name: params.name,
                username: params.username,
                external_account: params.external_account,
            })
            .await
            .map_err(to_rpc_error)?;

        Ok(client.into())
    }

    /// directory.update_phone.v1
    pub async fn update_phone(
        &self,
        params: UpdatePhoneRequest,
    ) -> Result<UpdatePhoneResponse, ErrorObjectOwned> {
        self.throttle().await?;

        self.directory
            .update_phone(params.client_id, &params.phone)
            .await
            .map_err(to_rpc_error)?;

        Ok(UpdatePhoneResponse {
            client_id: params.client_id,
            phone: params.phone,
        })
    }

    /// directory.register_vehicle.v1
    pub async fn register_vehicle(
        &self,
        params: RegisterVehicleRequest,
    ) -> Result<VehicleView, ErrorObjectOwned> {
        self.throttle().await?;

        let vehicle = self
            .directory
            .register_vehicle(&NewVehicle {
                plate: params.plate,
                client_id: params.client_id,
                model: params.model,
                year: params.year,
            })
            .await
            .map_err(to_rpc_error)?;

        Ok(vehicle.into())
    }

    /// directory.find_owner.v1
    pub async fn find_owner(
        &self,
        params: FindOwnerRequest,
    ) -> Result<FindOwnerResponse, ErrorObjectOwned> {
        self.throttle().await?;

        let owner = self
            .directory
            .owner_of(&params.plate)
            .await
            .map_err(to_rpc_error)?;

        Ok(FindOwnerResponse {
            plate: params.plate,
            owner: owner.map(Into::into),
        })
    }
}
