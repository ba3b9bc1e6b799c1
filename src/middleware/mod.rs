pub mod auth;
pub mod logger;

pub use logger::{REQUEST_ID_HEADER, logger};
