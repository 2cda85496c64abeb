// Vehicle Directory Port (Interface)
//
// Client/vehicle reference data. The scheduler resolves plates and owners
// here but never mutates bookings through it.

use async_trait::async_trait;

use crate::domain::{Client, ClientId, NewClient, NewVehicle, Plate, Vehicle};
use crate::error::Result;

#[async_trait]
pub trait VehicleDirectory: Send + Sync {
    /// Register a client; duplicate phone fails with Conflict
    async fn register_client(&self, client: &NewClient) -> Result<Client>;

    /// Find client by unique phone number
    async fn find_client_by_phone(&self, phone: &str) -> Result<Option<Client>>;

    /// Find client by id
    async fn find_client(&self, id: ClientId) -> Result<Option<Client>>;

    /// Change a client's phone; the new number must not be in use
    async fn update_phone(&self, id: ClientId, new_phone: &str) -> Result<()>;

    /// Register a vehicle; duplicate plate fails with Conflict, unknown
    /// owner with Validation
    async fn register_vehicle(&self, vehicle: &NewVehicle) -> Result<Vehicle>;

    /// Find vehicle by plate
    async fn find_vehicle(&self, plate: &str) -> Result<Option<Vehicle>>;

    /// All vehicles of one client, plate ascending
    async fn vehicles_of(&self, client_id: ClientId) -> Result<Vec<Vehicle>>;

    /// Resolve plate to owner
    async fn owner_of(&self, plate: &Plate) -> Result<Option<Client>>;
}
