// lustre/src/pipeline/control.rs

/// What a handler tells the engine after it returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineControl {
  Continue,
  /// Remaining handlers of this step and all later steps are skipped.
  Stop,
}

impl PipelineControl {
  pub fn is_stop(self) -> bool {
    matches!(self, PipelineControl::Stop)
  }
}

/// Outcome of a run that did not error. `Stopped` means a handler ended the
/// run early (an idempotent replay, nothing left to do), never a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineResult {
  Completed,
  Stopped,
}

impl PipelineResult {
  pub fn is_completed(self) -> bool {
    matches!(self, PipelineResult::Completed)
  }
}

impl From<PipelineControl> for PipelineResult {
  fn from(control: PipelineControl) -> Self {
    match control {
      PipelineControl::Continue => PipelineResult::Completed,
      PipelineControl::Stop => PipelineResult::Stopped,
    }
  }
}
