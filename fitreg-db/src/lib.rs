pub mod account;
pub mod connection;
pub mod error;
pub mod photo;
pub mod profile;

pub use error::{Error, Result};
