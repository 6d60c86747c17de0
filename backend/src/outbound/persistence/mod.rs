//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Thin adapters translating between Diesel rows and domain types; no
//! business logic lives here. Row structs (`models.rs`) and the schema
//! (`schema.rs`) stay internal to this module. Connections come from a
//! `bb8` pool with native async support through `diesel-async`.

mod diesel_entry_repository;
mod diesel_friendship_repository;
mod diesel_picture_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_entry_repository::DieselEntryRepository;
pub use diesel_friendship_repository::DieselFriendshipRepository;
pub use diesel_picture_repository::DieselPictureRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{run_migrations, MigrationError};
pub use pool::{DbPool, PoolConfig, PoolError};
