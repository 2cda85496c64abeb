//! RPC Request/Response Types
//!
//! Defines the JSON-RPC method parameters and results. Dates travel as
//! ISO-8601 calendar dates ("2026-06-01"), timestamps as epoch milliseconds.

use bayline_core::domain::{Booking, Client, Vehicle, VehicleBookingCount};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Booking as seen by RPC clients
#[derive(Debug, Clone, Serialize)]
pub struct BookingView {
    pub booking_id: i64,
    pub vehicle_plate: String,
    pub date: NaiveDate,
    pub post_number: i64,
    pub service_description: String,
    pub status: String,
    pub created_at: i64,
    pub started_at: Option<i64>,
    pub finished_at: Option<i64>,
}

impl From<Booking> for BookingView {
    fn from(b: Booking) -> Self {
        Self {
            booking_id: b.id,
            vehicle_plate: b.vehicle_plate,
            date: b.date,
            post_number: b.post_number,
            service_description: b.service_description,
            status: b.status.to_string(),
            created_at: b.created_at,
            started_at: b.started_at,
            finished_at: b.finished_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VehicleCountView {
    pub plate: String,
    pub bookings: i64,
}

impl From<VehicleBookingCount> for VehicleCountView {
    fn from(v: VehicleBookingCount) -> Self {
        Self {
            plate: v.plate,
            bookings: v.bookings,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientView {
    pub client_id: i64,
    pub phone: String,
    pub name: String,
    pub username: Option<String>,
    pub external_account: Option<i64>,
}

impl From<Client> for ClientView {
    fn from(c: Client) -> Self {
        Self {
            client_id: c.id,
            phone: c.phone,
            name: c.name,
            username: c.username,
            external_account: c.external_account,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VehicleView {
    pub plate: String,
    pub client_id: i64,
    pub model: String,
    pub year: Option<i64>,
}

impl From<Vehicle> for VehicleView {
    fn from(v: Vehicle) -> Self {
        Self {
            plate: v.plate,
            client_id: v.client_id,
            model: v.model,
            year: v.year,
        }
    }
}

/// booking.create.v1 - Book the lowest free post on a date
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub vehicle_plate: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub service_description: String,
}

/// booking.cancel.v1 / booking.start.v1 / booking.complete.v1 /
/// booking.delete.v1 - all address a booking by id
#[derive(Debug, Deserialize)]
pub struct BookingIdRequest {
    pub booking_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusChangeResponse {
    pub booking_id: i64,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub booking_id: i64,
    pub deleted: bool,
}

/// booking.reschedule.v1 - Move a booking to a new date
#[derive(Debug, Deserialize)]
pub struct RescheduleRequest {
    pub booking_id: i64,
    pub new_date: NaiveDate,
}

/// schedule.available_dates.v1 - Dates in the horizon with a free post
#[derive(Debug, Deserialize)]
pub struct AvailableDatesRequest {
    // No parameters needed
}

#[derive(Debug, Clone, Serialize)]
pub struct AvailableDatesResponse {
    pub dates: Vec<NaiveDate>,
}

/// schedule.free_post.v1 - Advisory lowest free post for one date
#[derive(Debug, Deserialize)]
pub struct FreePostRequest {
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct FreePostResponse {
    pub date: NaiveDate,
    pub post_number: Option<i64>,
}

/// schedule.list_active.v1 / schedule.list_scheduled.v1
#[derive(Debug, Deserialize)]
pub struct ListRequest {
    // No parameters needed
}

#[derive(Debug, Clone, Serialize)]
pub struct ListResponse {
    pub bookings: Vec<BookingView>,
}

/// report.status_counts.v1 - Booking counts per lifecycle status
#[derive(Debug, Deserialize)]
pub struct StatusCountsRequest {
    // No parameters needed
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusCountsResponse {
    pub planned: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub total: i64,
}

/// report.range.v1 - Bookings in an inclusive date range
#[derive(Debug, Deserialize)]
pub struct RangeReportRequest {
    pub from: NaiveDate,
    pub until: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct RangeReportResponse {
    pub from: NaiveDate,
    pub until: NaiveDate,
    pub bookings: Vec<BookingView>,
    pub top_vehicle: Option<VehicleCountView>,
}

/// report.vehicle.v1 - History for plates matching a LIKE pattern
#[derive(Debug, Deserialize)]
pub struct VehicleReportRequest {
    pub pattern: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VehicleReportResponse {
    pub pattern: String,
    pub bookings: Vec<BookingView>,
    pub last_year_count: i64,
}

/// report.top_vehicle.v1 - Most-booked vehicle over all history
#[derive(Debug, Deserialize)]
pub struct TopVehicleRequest {
    // No parameters needed
}

#[derive(Debug, Clone, Serialize)]
pub struct TopVehicleResponse {
    pub top_vehicle: Option<VehicleCountView>,
}

/// directory.register_client.v1
#[derive(Debug, Deserialize)]
pub struct RegisterClientRequest {
    pub phone: String,
    pub name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub external_account: Option<i64>,
}

/// directory.update_phone.v1 - Change a client's contact number
#[derive(Debug, Deserialize)]
pub struct UpdatePhoneRequest {
    pub client_id: i64,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdatePhoneResponse {
    pub client_id: i64,
    pub phone: String,
}

/// directory.register_vehicle.v1
#[derive(Debug, Deserialize)]
pub struct RegisterVehicleRequest {
    pub plate: String,
    pub client_id: i64,
    pub model: String,
    #[serde(default)]
    pub year: Option<i64>,
}

/// directory.find_owner.v1 - Resolve a plate to its owner
#[derive(Debug, Deserialize)]
pub struct FindOwnerRequest {
    pub plate: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FindOwnerResponse {
    pub plate: String,
    pub owner: Option<ClientView>,
}
