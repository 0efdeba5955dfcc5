// lustre/src/pipeline/hooks.rs

//! Registration of `before`, `on` and `after` handlers.

use super::context_data::ContextData;
use super::control::PipelineControl;
use super::definition::{Handler, Pipeline};
use crate::error::PipelineError;
use std::future::Future;

impl<T, Err> Pipeline<T, Err>
where
  T: 'static + Send + Sync,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  fn wrap<F, HandlerErr>(handler_fn: impl Fn(ContextData<T>) -> F + Send + Sync + 'static) -> Handler<T, Err>
  where
    F: Future<Output = Result<PipelineControl, HandlerErr>> + Send + 'static,
    HandlerErr: Into<Err> + Send + Sync + 'static,
  {
    Box::new(move |ctx| {
      let fut = handler_fn(ctx);
      Box::pin(async move { fut.await.map_err(Into::into) })
    })
  }

  pub fn before<F, HandlerErr>(&mut self, step_name: &str, handler_fn: impl Fn(ContextData<T>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<PipelineControl, HandlerErr>> + Send + 'static,
    HandlerErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    let handler = Self::wrap(handler_fn);
    self.before.entry(step_name.to_string()).or_default().push(handler);
  }

  pub fn on<F, HandlerErr>(&mut self, step_name: &str, handler_fn: impl Fn(ContextData<T>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<PipelineControl, HandlerErr>> + Send + 'static,
    HandlerErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    let handler = Self::wrap(handler_fn);
    self.on.entry(step_name.to_string()).or_default().push(handler);
  }

  pub fn after<F, HandlerErr>(&mut self, step_name: &str, handler_fn: impl Fn(ContextData<T>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<PipelineControl, HandlerErr>> + Send + 'static,
    HandlerErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    let handler = Self::wrap(handler_fn);
    self.after.entry(step_name.to_string()).or_default().push(handler);
  }
}
