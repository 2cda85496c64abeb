//! JSON-RPC API Layer
//!
//! Exposes the Bayline scheduler over JSON-RPC 2.0 on localhost TCP.

pub mod error;
pub mod handler;
pub mod rate_limiter;
pub mod server;
pub mod types;

pub use server::{RpcServer, RpcServerConfig};
