// storefront/src/db/mod.rs

pub mod pg_store;
mod rows;

pub use pg_store::PgStore;
