//! Bayline CLI - Command-line client for the Bayline bay scheduler
//!
//! Talks JSON-RPC to the daemon; every subcommand is one RPC method.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9630";

#[derive(Parser)]
#[command(name = "bayline")]
#[command(about = "Bayline bay scheduler CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "BAYLINE_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Book the lowest free post on a date
    Book {
        /// Vehicle plate
        #[arg(short, long)]
        plate: String,

        /// Service date (YYYY-MM-DD)
        #[arg(short, long)]
        date: NaiveDate,

        /// What the visit is for
        #[arg(short, long, default_value = "")]
        service: String,
    },

    /// Cancel a booking
    Cancel {
        /// Booking ID
        booking_id: i64,
    },

    /// Mark work on a booking as started
    Start {
        /// Booking ID
        booking_id: i64,
    },

    /// Mark a booking as completed
    Complete {
        /// Booking ID
        booking_id: i64,
    },

    /// Move a booking to a new date
    Reschedule {
        /// Booking ID
        booking_id: i64,

        /// New service date (YYYY-MM-DD)
        #[arg(short, long)]
        date: NaiveDate,
    },

    /// Remove a booking record entirely (administrative)
    Delete {
        /// Booking ID
        booking_id: i64,
    },

    /// Show dates with a free post
    Dates,

    /// List bookings
    List {
        /// Only planned bookings (default: all non-terminal)
        #[arg(long)]
        scheduled: bool,
    },

    /// Show booking counts per status
    Status,

    /// Report bookings in a date range
    Range {
        /// Range start (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,

        /// Range end, inclusive (YYYY-MM-DD)
        #[arg(long)]
        until: NaiveDate,
    },

    /// Report booking history for plates matching a pattern
    Vehicle {
        /// Plate pattern (SQL LIKE syntax, e.g. "A123%")
        pattern: String,
    },

    /// Show the most-booked vehicle
    TopVehicle,

    /// Register a client
    RegisterClient {
        /// Phone number (optional '+', 11-15 digits)
        #[arg(short, long)]
        phone: String,

        /// Client name
        #[arg(short, long)]
        name: String,
    },

    /// Change a client's phone number
    UpdatePhone {
        /// Client ID
        client: i64,

        /// New phone number (optional '+', 11-15 digits)
        #[arg(short, long)]
        phone: String,
    },

    /// Register a vehicle for an existing client
    RegisterVehicle {
        /// Vehicle plate
        #[arg(short, long)]
        plate: String,

        /// Owning client ID
        #[arg(short, long)]
        client: i64,

        /// Vehicle model
        #[arg(short, long)]
        model: String,

        /// Model year
        #[arg(short, long)]
        year: Option<i64>,
    },

    /// Resolve a plate to its owner
    Owner {
        /// Vehicle plate
        plate: String,
    },
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Deserialize, Tabled)]
struct BookingRow {
    booking_id: i64,
    vehicle_plate: String,
    date: String,
    post_number: i64,
    status: String,
    #[tabled(skip)]
    #[serde(default)]
    #[allow(dead_code)]
    service_description: String,
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

fn print_booking_table(bookings: &serde_json::Value) -> Result<()> {
    let rows: Vec<BookingRow> = serde_json::from_value(bookings.clone())?;
    if rows.is_empty() {
        println!("{}", "No bookings".yellow());
    } else {
        println!("{}", Table::new(rows));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Book {
            plate,
            date,
            service,
        } => {
            let params = json!({
                "vehicle_plate": plate,
                "date": date,
                "service_description": service,
            });

            let result = call_rpc(&cli.rpc_url, "booking.create.v1", params).await?;
            let booking: BookingRow = serde_json::from_value(result)?;

            println!("{}", "✓ Booking created".green().bold());
            println!();
            println!("{}", Table::new(vec![booking]));
        }

        Commands::Cancel { booking_id } => {
            call_rpc(
                &cli.rpc_url,
                "booking.cancel.v1",
                json!({ "booking_id": booking_id }),
            )
            .await?;

            println!(
                "{}",
                format!("✓ Booking {} cancelled", booking_id).green().bold()
            );
        }

        Commands::Start { booking_id } => {
            call_rpc(
                &cli.rpc_url,
                "booking.start.v1",
                json!({ "booking_id": booking_id }),
            )
            .await?;

            println!(
                "{}",
                format!("✓ Booking {} in progress", booking_id)
                    .green()
                    .bold()
            );
        }

        Commands::Complete { booking_id } => {
            call_rpc(
                &cli.rpc_url,
                "booking.complete.v1",
                json!({ "booking_id": booking_id }),
            )
            .await?;

            println!(
                "{}",
                format!("✓ Booking {} completed", booking_id).green().bold()
            );
        }

        Commands::Reschedule { booking_id, date } => {
            let params = json!({
                "booking_id": booking_id,
                "new_date": date,
            });

            let result = call_rpc(&cli.rpc_url, "booking.reschedule.v1", params).await?;
            let booking: BookingRow = serde_json::from_value(result)?;

            println!("{}", "✓ Booking rescheduled".green().bold());
            println!();
            println!("{}", Table::new(vec![booking]));
        }

        Commands::Delete { booking_id } => {
            call_rpc(
                &cli.rpc_url,
                "booking.delete.v1",
                json!({ "booking_id": booking_id }),
            )
            .await?;

            println!(
                "{}",
                format!("✓ Booking {} deleted", booking_id).green().bold()
            );
        }

        Commands::Dates => {
            let result = call_rpc(&cli.rpc_url, "schedule.available_dates.v1", json!({})).await?;

            let dates = result["dates"].as_array().cloned().unwrap_or_default();
            if dates.is_empty() {
                println!("{}", "No free dates in the booking window".yellow());
            } else {
                println!("{}", "Dates with a free post:".cyan().bold());
                for date in dates {
                    println!("  {}", date.as_str().unwrap_or_default());
                }
            }
        }

        Commands::List { scheduled } => {
            let method = if scheduled {
                "schedule.list_scheduled.v1"
            } else {
                "schedule.list_active.v1"
            };

            let result = call_rpc(&cli.rpc_url, method, json!({})).await?;
            print_booking_table(&result["bookings"])?;
        }

        Commands::Status => {
            println!("{}", "Booking Status".cyan().bold());
            println!();

            match call_rpc(&cli.rpc_url, "report.status_counts.v1", json!({})).await {
                Ok(counts) => {
                    println!("  {} {}", "RPC URL:".bold(), cli.rpc_url);
                    println!("  {} {}", "Status:".bold(), "ONLINE".green());
                    println!();
                    println!("  {} {}", "Planned:".bold(), counts["planned"]);
                    println!("  {} {}", "In Progress:".bold(), counts["in_progress"]);
                    println!("  {} {}", "Completed:".bold(), counts["completed"]);
                    println!("  {} {}", "Cancelled:".bold(), counts["cancelled"]);
                    println!();
                    println!("  {} {}", "Total:".bold(), counts["total"]);
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }

        Commands::Range { from, until } => {
            let params = json!({ "from": from, "until": until });
            let result = call_rpc(&cli.rpc_url, "report.range.v1", params).await?;

            println!(
                "{}",
                format!("Bookings {} .. {}", from, until).cyan().bold()
            );
            println!();
            print_booking_table(&result["bookings"])?;

            if let Some(top) = result["top_vehicle"].as_object() {
                println!();
                println!(
                    "  {} {} ({} bookings)",
                    "Top vehicle:".bold(),
                    top["plate"].as_str().unwrap_or_default(),
                    top["bookings"]
                );
            }
        }

        Commands::Vehicle { pattern } => {
            let params = json!({ "pattern": pattern });
            let result = call_rpc(&cli.rpc_url, "report.vehicle.v1", params).await?;

            println!(
                "{}",
                format!("Bookings for plates matching {}", pattern)
                    .cyan()
                    .bold()
            );
            println!();
            print_booking_table(&result["bookings"])?;
            println!();
            println!(
                "  {} {}",
                "Bookings in the last year:".bold(),
                result["last_year_count"]
            );
        }

        Commands::TopVehicle => {
            let result = call_rpc(&cli.rpc_url, "report.top_vehicle.v1", json!({})).await?;

            match result["top_vehicle"].as_object() {
                Some(top) => {
                    println!(
                        "{} {} ({} bookings)",
                        "Top vehicle:".cyan().bold(),
                        top["plate"].as_str().unwrap_or_default(),
                        top["bookings"]
                    );
                }
                None => println!("{}", "No bookings yet".yellow()),
            }
        }

        Commands::RegisterClient { phone, name } => {
            let params = json!({ "phone": phone, "name": name });
            let result = call_rpc(&cli.rpc_url, "directory.register_client.v1", params).await?;

            println!(
                "{}",
                format!("✓ Client {} registered", result["client_id"])
                    .green()
                    .bold()
            );
        }

        Commands::UpdatePhone { client, phone } => {
            let params = json!({ "client_id": client, "phone": phone });
            call_rpc(&cli.rpc_url, "directory.update_phone.v1", params).await?;

            println!(
                "{}",
                format!("✓ Phone updated for client {}", client).green().bold()
            );
        }

        Commands::RegisterVehicle {
            plate,
            client,
            model,
            year,
        } => {
            let params = json!({
                "plate": plate,
                "client_id": client,
                "model": model,
                "year": year,
            });

            let result = call_rpc(&cli.rpc_url, "directory.register_vehicle.v1", params).await?;

            println!(
                "{}",
                format!("✓ Vehicle {} registered", result["plate"].as_str().unwrap_or_default())
                    .green()
                    .bold()
            );
        }

        Commands::Owner { plate } => {
            let params = json!({ "plate": plate });
            let result = call_rpc(&cli.rpc_url, "directory.find_owner.v1", params).await?;

            match result["owner"].as_object() {
                Some(owner) => {
                    println!("{}", format!("Owner of {}", plate).cyan().bold());
                    println!("  {} {}", "Name:".bold(), owner["name"].as_str().unwrap_or_default());
                    println!("  {} {}", "Phone:".bold(), owner["phone"].as_str().unwrap_or_default());
                }
                None => println!("{}", format!("No owner on file for {}", plate).yellow()),
            }
        }
    }

    Ok(())
}
