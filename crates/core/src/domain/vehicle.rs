// Vehicle and Client Reference Data
//
// The scheduler reads these, never owns them: bookings reference a vehicle
// plate, vehicles belong to exactly one client.

use serde::{Deserialize, Serialize};

use crate::domain::booking::Plate;

/// Client identifier (store-assigned)
pub type ClientId = i64;

/// Client: owns zero or more vehicles, identified by a unique phone number
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub phone: String,
    pub name: String,
    pub username: Option<String>,
    /// External messenger account id, when the client registered via the bot
    pub external_account: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewClient {
    pub phone: String,
    pub name: String,
    pub username: Option<String>,
    pub external_account: Option<i64>,
}

/// Vehicle: identified by a unique plate, owned by one client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub plate: Plate,
    pub client_id: ClientId,
    pub model: String,
    pub year: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub plate: Plate,
    pub client_id: ClientId,
    pub model: String,
    pub year: Option<i64>,
}

/// Phone format accepted at registration: optional '+', then 11-15 digits
pub fn is_valid_phone(phone: &str) -> bool {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    (11..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}
