//! JSON-RPC Server
//!
//! Implements the JSON-RPC 2.0 server over TCP on localhost.

use crate::handler::RpcHandler;
use crate::types::{
    AvailableDatesRequest, BookingIdRequest, CreateBookingRequest, FindOwnerRequest,
    FreePostRequest, ListRequest, RangeReportRequest, RegisterClientRequest,
    RegisterVehicleRequest, RescheduleRequest, StatusCountsRequest, TopVehicleRequest,
    UpdatePhoneRequest, VehicleReportRequest,
};
use bayline_core::application::reporting::ReportingService;
use bayline_core::application::scheduling::SchedulerService;
use bayline_core::port::VehicleDirectory;
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use std::sync::Arc;
use tracing::info;

// jsonrpsee rides on hyper, which has no Unix-socket transport, so the
// server binds TCP on the loopback interface only (no external access).
const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9630;

/// RPC Server Configuration
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(
        config: RpcServerConfig,
        scheduler: Arc<SchedulerService>,
        reporting: Arc<ReportingService>,
        directory: Arc<dyn VehicleDirectory>,
    ) -> Self {
        Self {
            config,
            handler: Arc::new(RpcHandler::new(scheduler, reporting, directory)),
        }
    }

    /// Start the JSON-RPC server
    ///
    /// Security: only binds to 127.0.0.1 (no external access)
    pub async fn start(self) -> Result<ServerHandle, String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = %self.config.port,
            "Starting JSON-RPC server on TCP (localhost only)"
        );

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;

        let mut module = RpcModule::new(());

        // Booking lifecycle
        let handler = self.handler.clone();
        module
            .register_async_method("booking.create.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: CreateBookingRequest = params.parse()?;
                    handler.create_booking(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("booking.cancel.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: BookingIdRequest = params.parse()?;
                    handler.cancel_booking(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("booking.start.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: BookingIdRequest = params.parse()?;
                    handler.start_booking(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("booking.complete.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: BookingIdRequest = params.parse()?;
                    handler.complete_booking(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("booking.reschedule.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: RescheduleRequest = params.parse()?;
                    handler.reschedule_booking(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("booking.delete.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: BookingIdRequest = params.parse()?;
                    handler.delete_booking(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        // Schedule queries
        let handler = self.handler.clone();
        module
            .register_async_method("schedule.available_dates.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: AvailableDatesRequest = params.parse()?;
                    handler.available_dates(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("schedule.free_post.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: FreePostRequest = params.parse()?;
                    handler.free_post(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("schedule.list_active.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: ListRequest = params.parse()?;
                    handler.list_active(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("schedule.list_scheduled.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: ListRequest = params.parse()?;
                    handler.list_scheduled(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        // Reporting
        let handler = self.handler.clone();
        module
            .register_async_method("report.status_counts.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: StatusCountsRequest = params.parse()?;
                    handler.status_counts(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("report.range.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: RangeReportRequest = params.parse()?;
                    handler.range_report(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("report.vehicle.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: VehicleReportRequest = params.parse()?;
                    handler.vehicle_report(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("report.top_vehicle.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: TopVehicleRequest = params.parse()?;
                    handler.top_vehicle(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        // Directory
        let handler = self.handler.clone();
        module
            .register_async_method("directory.register_client.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: RegisterClientRequest = params.parse()?;
                    handler.register_client(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("directory.update_phone.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: UpdatePhoneRequest = params.parse()?;
                    handler.update_phone(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("directory.register_vehicle.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: RegisterVehicleRequest = params.parse()?;
                    handler.register_vehicle(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("directory.find_owner.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: FindOwnerRequest = params.parse()?;
                    handler.find_owner(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        info!("JSON-RPC server started successfully");

        let handle = server.start(module);
        Ok(handle)
    }
}
