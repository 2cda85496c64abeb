// SQLite VehicleDirectory Implementation
//
// Client and vehicle reference data: unique phone per client, unique plate
// per vehicle, plate -> owner resolution.

use async_trait::async_trait;
use sqlx::SqlitePool;

use bayline_core::domain::vehicle::is_valid_phone;
use bayline_core::domain::{Client, ClientId, NewClient, NewVehicle, Plate, Vehicle};
use bayline_core::error::{AppError, Result};
use bayline_core::port::VehicleDirectory;

use crate::booking_repository::map_sqlx_error;

pub struct SqliteVehicleDirectory {
    pool: SqlitePool,
}

impl SqliteVehicleDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VehicleDirectory for SqliteVehicleDirectory {
    async fn register_client(&self, client: &NewClient) -> Result<Client> {
        if !is_valid_phone(&client.phone) {
            return Err(AppError::Validation(format!(
                "invalid phone number: {}",
                client.phone
            )));
        }
        if client.name.trim().is_empty() {
            return Err(AppError::Validation("client name is empty".to_string()));
        }

        let row = sqlx::query_as::<_, ClientRow>(
            "INSERT INTO clients (phone, name, username, external_account) \
             VALUES (?, ?, ?, ?) RETURNING *",
        )
        .bind(&client.phone)
        .bind(&client.name)
        .bind(&client.username)
        .bind(client.external_account)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match map_sqlx_error(e) {
            AppError::Conflict(_) => {
                AppError::Conflict(format!("phone {} already registered", client.phone))
            }
            other => other,
        })?;

        Ok(row.into_client())
    }

    async fn find_client_by_phone(&self, phone: &str) -> Result<Option<Client>> {
        let row = sqlx::query_as::<_, ClientRow>("SELECT * FROM clients WHERE phone = ?")
            .bind(phone)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(ClientRow::into_client))
    }

    async fn find_client(&self, id: ClientId) -> Result<Option<Client>> {
        let row = sqlx::query_as::<_, ClientRow>("SELECT * FROM clients WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(ClientRow::into_client))
    }

    async fn update_phone(&self, id: ClientId, new_phone: &str) -> Result<()> {
        if !is_valid_phone(new_phone) {
            return Err(AppError::Validation(format!(
                "invalid phone number: {}",
                new_phone
            )));
        }

        // Pre-check mirrors the UNIQUE constraint for a friendlier error;
        // the constraint still backstops a racing registration
        let taken: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM clients WHERE phone = ? AND id != ?")
                .bind(new_phone)
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_sqlx_error)?;
        if taken.is_some() {
            return Err(AppError::Conflict(format!(
                "phone {} already registered",
                new_phone
            )));
        }

        let result = sqlx::query("UPDATE clients SET phone = ? WHERE id = ?")
            .bind(new_phone)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("client {} not found", id)));
        }
        Ok(())
    }

    async fn register_vehicle(&self, vehicle: &NewVehicle) -> Result<Vehicle> {
        if vehicle.plate.trim().is_empty() {
            return Err(AppError::Validation("vehicle plate is empty".to_string()));
        }

        let row = sqlx::query_as::<_, VehicleRow>(
            "INSERT INTO vehicles (plate, client_id, model, year) \
             VALUES (?, ?, ?, ?) RETURNING *",
        )
        .bind(&vehicle.plate)
        .bind(vehicle.client_id)
        .bind(&vehicle.model)
        .bind(vehicle.year)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match map_sqlx_error(e) {
            AppError::Conflict(_) => {
                AppError::Conflict(format!("plate {} already registered", vehicle.plate))
            }
            AppError::Validation(_) => {
                AppError::Validation(format!("unknown client: {}", vehicle.client_id))
            }
            other => other,
        })?;

        Ok(row.into_vehicle())
    }

    async fn find_vehicle(&self, plate: &str) -> Result<Option<Vehicle>> {
        let row = sqlx::query_as::<_, VehicleRow>("SELECT * FROM vehicles WHERE plate = ?")
            .bind(plate)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(VehicleRow::into_vehicle))
    }

    async fn vehicles_of(&self, client_id: ClientId) -> Result<Vec<Vehicle>> {
        let rows: Vec<VehicleRow> =
            sqlx::query_as("SELECT * FROM vehicles WHERE client_id = ? ORDER BY plate")
                .bind(client_id)
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(VehicleRow::into_vehicle).collect())
    }

    async fn owner_of(&self, plate: &Plate) -> Result<Option<Client>> {
        let row = sqlx::query_as::<_, ClientRow>(
            "SELECT c.* FROM clients c \
             JOIN vehicles v ON v.client_id = c.id \
             WHERE v.plate = ?",
        )
        .bind(plate)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(ClientRow::into_client))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ClientRow {
    id: i64,
    phone: String,
    name: String,
    username: Option<String>,
    external_account: Option<i64>,
}

impl ClientRow {
    fn into_client(self) -> Client {
        Client {
            id: self.id,
            phone: self.phone,
            name: self.name,
            username: self.username,
            external_account: self.external_account,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct VehicleRow {
    plate: String,
    client_id: i64,
    model: String,
    year: Option<i64>,
}

impl VehicleRow {
    fn into_vehicle(self) -> Vehicle {
        Vehicle {
            plate: self.plate,
            client_id: self.client_id,
            model: self.model,
            year: self.year,
        }
    }
}
