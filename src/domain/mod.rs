//! Domain layer: models, failure taxonomy, and collaborator ports.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{Error, Result};
