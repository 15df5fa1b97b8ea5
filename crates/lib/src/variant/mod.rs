//! Build variants and the layers they are composed from.
//!
//! A variant is a named stack of [`Configure`] layers. Its own `configure`
//! first delegates to an optional parent layer, then sets the compiler, then
//! appends its flags. Layers never remove or reorder what an earlier layer
//! appended; [`BuildCtx`] only offers appends.
//!
//! # Submodules
//!
//! - [`layers`] - reusable layers: toolchain base, extra flags, OpenMP workloads
//! - [`clang`] - the clang-family variants (plain and AddressSanitizer)

pub mod clang;
pub mod layers;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::build::{BuildCtx, ComposeError};
use crate::config::ConfigError;

pub use clang::{AsanOptions, AsanVariant, ClangVariant};
pub use layers::{OpenMp, StageFlags, Toolchain};

/// One layer of build configuration.
pub trait Configure: fmt::Debug + Send + Sync {
  fn configure(&self, ctx: &mut BuildCtx) -> Result<(), ComposeError>;
}

/// A named, registrable build configuration.
pub trait Variant: Configure {
  /// Unique name within a [`Setup`](crate::matrix::Setup).
  fn name(&self) -> &str;

  /// Shape the runtime environment before the built benchmark runs.
  ///
  /// Variants without runtime requirements inherit this no-op.
  fn prepare_run(&self, _ctx: &mut BuildCtx) {}
}

/// Shared, optional parent layer.
pub type Parent = Option<Arc<dyn Configure>>;

pub(crate) fn configure_parent(parent: &Parent, ctx: &mut BuildCtx) -> Result<(), ComposeError> {
  match parent {
    Some(layer) => layer.configure(ctx),
    None => Ok(()),
  }
}

/// Optimization level passed to the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptLevel {
  O0,
  O1,
  O2,
  O3,
  Os,
}

impl OptLevel {
  pub fn as_str(&self) -> &'static str {
    match self {
      OptLevel::O0 => "O0",
      OptLevel::O1 => "O1",
      OptLevel::O2 => "O2",
      OptLevel::O3 => "O3",
      OptLevel::Os => "Os",
    }
  }

  /// The compiler flag, e.g. `-O2`.
  pub fn flag(&self) -> String {
    format!("-{}", self.as_str())
  }
}

impl fmt::Display for OptLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OptLevel {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.strip_prefix('-').unwrap_or(s) {
      "O0" => Ok(OptLevel::O0),
      "O1" => Ok(OptLevel::O1),
      "O2" => Ok(OptLevel::O2),
      "O3" => Ok(OptLevel::O3),
      "Os" => Ok(OptLevel::Os),
      _ => Err(ConfigError::UnknownOptLevel(s.to_string())),
    }
  }
}
