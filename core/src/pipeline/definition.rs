// lustre/src/pipeline/definition.rs

//! The `Pipeline<T, Err>` type and its construction.

use super::context_data::ContextData;
use super::control::PipelineControl;
use super::step::{SkipCondition, StepDef};
use crate::error::PipelineError;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

/// A boxed step handler. It receives a clone of the run's `ContextData<T>`.
pub type Handler<T, Err> =
  Box<dyn Fn(ContextData<T>) -> Pin<Box<dyn Future<Output = Result<PipelineControl, Err>> + Send>> + Send + Sync>;

/// Ordered named steps over context `T`. Handlers fail with `Err`; engine
/// failures are converted through `From<PipelineError>`.
pub struct Pipeline<T, Err>
where
  T: 'static + Send + Sync,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  pub(crate) name: &'static str,
  pub(crate) steps: Vec<StepDef<T>>,
  pub(crate) before: HashMap<String, Vec<Handler<T, Err>>>,
  pub(crate) on: HashMap<String, Vec<Handler<T, Err>>>,
  pub(crate) after: HashMap<String, Vec<Handler<T, Err>>>,
}

impl<T, Err> Pipeline<T, Err>
where
  T: 'static + Send + Sync,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  /// `step_defs` are `(name, optional, skip_if)` in execution order.
  pub fn new(name: &'static str, step_defs: &[(&str, bool, Option<SkipCondition<T>>)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|(step_name, optional, skip_if)| StepDef::new(*step_name, *optional, skip_if.clone()))
      .collect();

    Self {
      name,
      steps,
      before: HashMap::new(),
      on: HashMap::new(),
      after: HashMap::new(),
    }
  }

  pub fn name(&self) -> &'static str {
    self.name
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  /// Panics on an unknown step: a typo in a step name is a wiring bug, not a runtime condition.
  pub(crate) fn ensure_step_exists(&self, step_name: &str) {
    if !self.steps.iter().any(|s| s.name == step_name) {
      panic!(
        "pipeline '{}' setup error: step '{}' is not defined",
        self.name, step_name
      );
    }
  }

  pub fn set_skip_condition(&mut self, step_name: &str, skip_if: Option<SkipCondition<T>>) {
    self.ensure_step_exists(step_name);
    if let Some(step) = self.steps.iter_mut().find(|s| s.name == step_name) {
      step.skip_if = skip_if;
    }
  }
}
