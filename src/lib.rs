pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod domain;
pub mod error;
pub mod extract;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod schema;
pub mod transform;
pub mod validator;
pub mod warehouse;

pub use error::EtlError;
pub use warehouse::{MemoryWarehouse, PgWarehouse, Warehouse};
