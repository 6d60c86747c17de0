//! HTTP inbound adapter exposing REST endpoints.

pub mod entries;
pub mod error;
pub mod health;
pub mod identity;
pub mod media;
pub mod session;
pub mod social;
pub mod state;
#[cfg(test)]
pub mod test_utils;

pub use error::ApiResult;
