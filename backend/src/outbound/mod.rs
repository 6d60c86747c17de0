//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL repositories using Diesel ORM
//! - **cache**: in-process TTL cache for entry read paths
//! - **oauth**: Google ID token verification over HTTP
//!
//! Adapters translate between domain types and infrastructure
//! representations; they contain no business logic.

pub mod cache;
pub mod oauth;
pub mod persistence;
