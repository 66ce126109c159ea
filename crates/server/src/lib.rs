pub mod api;
pub mod auth;
pub mod blob_factory;
pub mod config;
pub mod error;
pub mod state_factory;

pub use error::ServerError;
