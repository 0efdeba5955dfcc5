// lustre/src/notify/mod.rs

//! Web Push fan-out. Business transitions call `notify_quietly`, so a
//! notification problem can never fail the operation that triggered it.

pub mod dispatcher;
pub mod templates;

pub use dispatcher::{DispatchReport, NotificationDispatcher};
pub use templates::Templates;
