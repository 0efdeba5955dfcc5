// tests/pipeline_tests.rs
mod common;

use common::setup_tracing;
use lustre::pipeline::SkipCondition;
use lustre::{ContextData, Pipeline, PipelineControl, PipelineError, PipelineResult};
use std::sync::Arc;

#[derive(Debug, Default)]
struct StepLog {
  steps: Vec<String>,
  stop_at: Option<&'static str>,
}

#[derive(Debug, thiserror::Error)]
enum TestError {
  #[error("engine: {0}")]
  Engine(#[from] PipelineError),
  #[error("handler failed: {0}")]
  Handler(String),
}

fn record(name: &'static str) -> impl Fn(ContextData<StepLog>) -> std::future::Ready<Result<PipelineControl, TestError>> {
  move |ctx| {
    let mut guard = ctx.write();
    guard.steps.push(name.to_string());
    let control = if guard.stop_at == Some(name) {
      PipelineControl::Stop
    } else {
      PipelineControl::Continue
    };
    std::future::ready(Ok(control))
  }
}

fn three_steps() -> Pipeline<StepLog, TestError> {
  let mut p = Pipeline::new("three", &[("one", false, None), ("two", false, None), ("three", false, None)]);
  p.on("one", record("one"));
  p.on("two", record("two"));
  p.on("three", record("three"));
  p
}

#[tokio::test]
async fn steps_run_in_declaration_order() {
  setup_tracing();
  let pipeline = three_steps();
  assert_eq!(pipeline.step_names(), vec!["one", "two", "three"]);

  let ctx = ContextData::new(StepLog::default());
  let result = pipeline.run(ctx.clone()).await.unwrap();
  assert_eq!(result, PipelineResult::Completed);
  assert_eq!(ctx.read().steps, vec!["one", "two", "three"]);
}

#[tokio::test]
async fn stop_ends_the_run_early() {
  setup_tracing();
  let pipeline = three_steps();
  let ctx = ContextData::new(StepLog {
    stop_at: Some("two"),
    ..StepLog::default()
  });
  let result = pipeline.run(ctx.clone()).await.unwrap();
  assert_eq!(result, PipelineResult::Stopped);
  assert_eq!(ctx.read().steps, vec!["one", "two"]);
}

#[tokio::test]
async fn handler_error_propagates_and_halts() {
  setup_tracing();
  let mut pipeline = Pipeline::<StepLog, TestError>::new("failing", &[("ok", false, None), ("bad", false, None), ("never", false, None)]);
  pipeline.on("ok", record("ok"));
  pipeline.on("bad", |_ctx: ContextData<StepLog>| async { Err::<PipelineControl, _>(TestError::Handler("boom".to_string())) });
  pipeline.on("never", record("never"));

  let ctx = ContextData::new(StepLog::default());
  let err = pipeline.run(ctx.clone()).await.unwrap_err();
  assert!(matches!(err, TestError::Handler(ref m) if m == "boom"));
  assert_eq!(ctx.read().steps, vec!["ok"]);
}

fn after_first(ctx: &ContextData<StepLog>) -> bool {
  !ctx.read().steps.is_empty()
}

#[tokio::test]
async fn skip_condition_is_evaluated_at_run_time() {
  setup_tracing();
  let skip: SkipCondition<StepLog> = Arc::new(after_first);
  let mut pipeline = Pipeline::<StepLog, TestError>::new(
    "skipping",
    &[("first", false, None), ("maybe", false, Some(skip)), ("last", false, None)],
  );
  pipeline.on("first", record("first"));
  pipeline.on("maybe", record("maybe"));
  pipeline.on("last", record("last"));

  let ctx = ContextData::new(StepLog::default());
  pipeline.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().steps, vec!["first", "last"]);
}

#[tokio::test]
async fn missing_handler_fails_only_for_required_steps() {
  setup_tracing();
  let required = Pipeline::<StepLog, TestError>::new("required", &[("unwired", false, None)]);
  let err = required.run(ContextData::new(StepLog::default())).await.unwrap_err();
  assert!(matches!(
    err,
    TestError::Engine(PipelineError::HandlerMissing { ref step_name }) if step_name == "unwired"
  ));

  let optional = Pipeline::<StepLog, TestError>::new("optional", &[("unwired", true, None)]);
  let result = optional.run(ContextData::new(StepLog::default())).await.unwrap();
  assert_eq!(result, PipelineResult::Completed);
}

#[tokio::test]
async fn before_on_after_run_in_phase_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<StepLog, TestError>::new("phases", &[("main", false, None)]);
  pipeline.after("main", record("after"));
  pipeline.on("main", record("on"));
  pipeline.before("main", record("before"));

  let ctx = ContextData::new(StepLog::default());
  pipeline.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().steps, vec!["before", "on", "after"]);
}

#[test]
#[should_panic(expected = "step 'typo' is not defined")]
fn registering_an_unknown_step_panics() {
  let mut pipeline = Pipeline::<StepLog, TestError>::new("strict", &[("real", false, None)]);
  pipeline.on("typo", record("typo"));
}
