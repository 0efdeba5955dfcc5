// lustre/src/auth/mod.rs

//! Admin authorization. A user is an admin iff they have a row in the admin
//! directory; everyone else is a customer.

pub mod cache;
pub mod gate;
pub mod role;

pub use cache::RoleCache;
pub use gate::{AdminGate, Principal};
pub use role::{AdminAction, AdminRole};
