//! The seam to the external execution engine.
//!
//! The engine acquires and patches sources, compiles, and runs. This crate
//! only decides what each build looks like and in which order the pairs are
//! handed over.

use thiserror::Error;
use tracing::{info, info_span};

use crate::build::{BuildCtx, ComposeError};
use crate::matrix::Setup;
use crate::target::TargetDescriptor;

/// Operations the execution engine provides.
pub trait Engine {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Locate or fetch the suite sources and apply its patches in list order.
  fn acquire(&mut self, target: &TargetDescriptor) -> Result<(), Self::Error>;

  /// Compile the suite with a configured context.
  fn build(&mut self, ctx: &BuildCtx, target: &TargetDescriptor) -> Result<(), Self::Error>;

  /// Run the built suite with the context's runtime environment and CPU
  /// placement applied.
  fn run(&mut self, ctx: &BuildCtx, target: &TargetDescriptor) -> Result<(), Self::Error>;
}

#[derive(Debug, Error)]
pub enum DriveError<E: std::error::Error + 'static> {
  #[error(transparent)]
  Compose(#[from] ComposeError),

  #[error("engine failed on {variant} x {suite}: {source}")]
  Engine {
    variant: String,
    suite: String,
    #[source]
    source: E,
  },
}

/// Walk the matrix serially: configure, acquire, build, prepare the run,
/// run. A composition error stops before the engine sees that pair.
pub fn drive<E: Engine>(setup: &Setup, engine: &mut E) -> Result<usize, DriveError<E::Error>> {
  let mut completed = 0;
  for entry in setup.matrix() {
    let variant = entry.variant.name();
    let suite = entry.target.suite();
    let _span = info_span!("pair", variant, suite).entered();

    let mut ctx = entry.configure()?;
    let wrap = |source| DriveError::Engine {
      variant: variant.to_string(),
      suite: suite.to_string(),
      source,
    };

    engine.acquire(entry.target).map_err(wrap)?;
    engine.build(&ctx, entry.target).map_err(wrap)?;
    entry.prepare_run(&mut ctx);
    engine.run(&ctx, entry.target).map_err(wrap)?;

    completed += 1;
    info!(completed, total = setup.len(), "pair finished");
  }
  Ok(completed)
}
