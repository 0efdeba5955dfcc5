// lustre/src/lib.rs

//! Lustre: order lifecycle and return workflows for a jewelry storefront.
//!
//! The crate holds the domain model with its status transition tables, the
//! admin authorization gate, the push notification dispatcher and the
//! workflows themselves, each expressed as a named step pipeline. Storage,
//! payment gateways, the shipping carrier and the push relay sit behind the
//! traits in [`ports`]; [`memory`] and [`sandbox`] provide in-process
//! implementations for tests and local development.
//!
//! ```text
//!   Commerce::create_order ──► checkout pipeline
//!            ::verify_payment ──► verify_payment pipeline
//!            ::update_order_status ──► fulfillment pipeline
//!            ::update_return_status ──► return_transition pipeline
//! ```

pub mod audit;
pub mod auth;
pub mod error;
pub mod memory;
pub mod model;
pub mod notify;
pub mod pipeline;
pub mod ports;
pub mod pricing;
pub mod sandbox;
pub mod service;
pub mod settings;
pub mod signature;
pub mod workflows;

pub use crate::auth::{AdminAction, AdminGate, AdminRole, Principal, RoleCache};
pub use crate::error::{PipelineError, StoreError, StoreResult, UpstreamError, WorkflowError, WorkflowResult};
pub use crate::notify::{DispatchReport, NotificationDispatcher};
pub use crate::pipeline::{ContextData, Pipeline, PipelineControl, PipelineResult};
pub use crate::ports::Backends;
pub use crate::service::Commerce;
pub use crate::settings::StoreSettings;
pub use crate::workflows::checkout::CheckoutRequest;
pub use crate::workflows::fulfillment::StatusUpdate;
pub use crate::workflows::payment::{PaymentRouter, VerifyOutcome};
pub use crate::workflows::returns::{ReturnClaim, ReturnUpdate};
pub use crate::workflows::WorkflowEnv;
