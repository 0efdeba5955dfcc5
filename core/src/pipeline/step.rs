// lustre/src/pipeline/step.rs
use super::ContextData;
use std::fmt;
use std::sync::Arc;

/// Evaluated right before a step runs; `true` skips the step.
pub type SkipCondition<T> = Arc<dyn Fn(&ContextData<T>) -> bool + Send + Sync + 'static>;

/// One declared step. Handlers are stored on the pipeline, keyed by `name`.
#[derive(Clone)]
pub struct StepDef<T: 'static + Send + Sync> {
  pub name: String,
  /// Optional steps may have no handlers at all; required ones must have at least one.
  pub optional: bool,
  pub skip_if: Option<SkipCondition<T>>,
}

impl<T: 'static + Send + Sync> StepDef<T> {
  pub fn new(name: impl Into<String>, optional: bool, skip_if: Option<SkipCondition<T>>) -> Self {
    Self {
      name: name.into(),
      optional,
      skip_if,
    }
  }

  pub fn is_skipped(&self, ctx: &ContextData<T>) -> bool {
    self.skip_if.as_ref().is_some_and(|cond| cond(ctx))
  }
}

impl<T: 'static + Send + Sync> fmt::Debug for StepDef<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name)?;
    if self.optional {
      f.write_str("?")?;
    }
    if self.skip_if.is_some() {
      f.write_str(" [conditional]")?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn debug_marks_optional_and_conditional_steps() {
    let plain: StepDef<()> = StepDef::new("load_cart", false, None);
    let cond: SkipCondition<()> = Arc::new(|_| true);
    let flagged: StepDef<()> = StepDef::new("clear_cart", true, Some(cond));
    assert_eq!(format!("{plain:?}"), "load_cart");
    assert_eq!(format!("{flagged:?}"), "clear_cart? [conditional]");
  }

  #[test]
  fn skip_condition_sees_the_context() {
    let cond: SkipCondition<u32> = Arc::new(|ctx| *ctx.read() > 3);
    let step = StepDef::new("confirm", false, Some(cond));
    assert!(!step.is_skipped(&ContextData::new(1)));
    assert!(step.is_skipped(&ContextData::new(7)));
  }
}
