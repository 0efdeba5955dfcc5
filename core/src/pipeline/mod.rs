// lustre/src/pipeline/mod.rs

//! A small step engine: named steps run in order against a shared
//! `ContextData<T>`, each step with `before`/`on`/`after` handlers that can
//! stop the run early. Every workflow in `crate::workflows` is one of these.

pub mod context_data;
pub mod control;
pub mod definition;
pub mod execution;
pub mod hooks;
pub mod step;

pub use context_data::ContextData;
pub use control::{PipelineControl, PipelineResult};
pub use definition::{Handler, Pipeline};
pub use step::{SkipCondition, StepDef};
