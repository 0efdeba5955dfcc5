// lustre/src/pipeline/execution.rs

//! `Pipeline::run`.

use super::context_data::ContextData;
use super::control::{PipelineControl, PipelineResult};
use super::definition::{Handler, Pipeline};
use crate::error::PipelineError;
use tracing::{event, Instrument, Level};

impl<T, Err> Pipeline<T, Err>
where
  T: 'static + Send + Sync,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  /// Runs every step in order against `ctx_data`.
  pub async fn run(&self, ctx_data: ContextData<T>) -> Result<PipelineResult, Err> {
    event!(Level::DEBUG, pipeline = self.name, "Pipeline run starting.");

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();

      if step_def.is_skipped(&ctx_data) {
        event!(Level::DEBUG, pipeline = self.name, step = step_name, "Step skipped.");
        continue;
      }

      let has_handlers = [&self.before, &self.on, &self.after]
        .iter()
        .any(|phase| phase.get(step_name).map_or(false, |v| !v.is_empty()));
      if !has_handlers {
        if step_def.optional {
          continue;
        }
        event!(Level::ERROR, pipeline = self.name, step = step_name, "Required step has no handlers.");
        return Err(Err::from(PipelineError::HandlerMissing {
          step_name: step_def.name.clone(),
        }));
      }

      let span = tracing::info_span!("pipeline_step", pipeline = self.name, step = step_name, step_index = step_idx);
      let control = async {
        for (phase_name, phase) in [("before", &self.before), ("on", &self.on), ("after", &self.after)] {
          if let Some(handlers) = phase.get(step_name) {
            if run_phase(phase_name, handlers, &ctx_data).await?.is_stop() {
              return Ok::<_, Err>(PipelineControl::Stop);
            }
          }
        }
        Ok(PipelineControl::Continue)
      }
      .instrument(span)
      .await?;

      if control.is_stop() {
        event!(Level::INFO, pipeline = self.name, step = step_name, "Pipeline stopped by handler.");
        return Ok(control.into());
      }
    }

    event!(Level::DEBUG, pipeline = self.name, "Pipeline run completed.");
    Ok(PipelineResult::Completed)
  }
}

async fn run_phase<T, Err>(
  phase_name: &'static str,
  handlers: &[Handler<T, Err>],
  ctx_data: &ContextData<T>,
) -> Result<PipelineControl, Err>
where
  T: 'static + Send + Sync,
  Err: std::error::Error + Send + Sync + 'static,
{
  for handler in handlers {
    match handler(ctx_data.clone()).await {
      Ok(PipelineControl::Continue) => {}
      Ok(PipelineControl::Stop) => return Ok(PipelineControl::Stop),
      Err(e) => {
        event!(Level::WARN, phase = phase_name, error = %e, "Step handler failed.");
        return Err(e);
      }
    }
  }
  Ok(PipelineControl::Continue)
}
