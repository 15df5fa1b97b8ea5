//! Reusable configuration layers.

use std::sync::Arc;

use tracing::debug;

use super::{Configure, Parent, configure_parent};
use crate::build::{BuildCtx, ComposeError};
use crate::config::CompilerPath;
use crate::flags::Stage;

/// Compiler-family base layer: a selector and the compiler it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
  selector: String,
  compiler: CompilerPath,
}

impl Toolchain {
  pub fn new(selector: impl Into<String>, compiler: CompilerPath) -> Self {
    Self {
      selector: selector.into(),
      compiler,
    }
  }

  pub fn selector(&self) -> &str {
    &self.selector
  }

  pub fn compiler(&self) -> &CompilerPath {
    &self.compiler
  }
}

impl Configure for Toolchain {
  fn configure(&self, ctx: &mut BuildCtx) -> Result<(), ComposeError> {
    ctx.set_compiler(&self.compiler);
    Ok(())
  }
}

/// Fixed extra flags per stage, optionally on top of a parent layer.
#[derive(Debug, Clone, Default)]
pub struct StageFlags {
  parent: Parent,
  cflags: Vec<String>,
  cxxflags: Vec<String>,
  ldflags: Vec<String>,
}

impl StageFlags {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_parent(mut self, parent: Arc<dyn Configure>) -> Self {
    self.parent = Some(parent);
    self
  }

  pub fn with(mut self, stage: Stage, flags: impl IntoIterator<Item = impl Into<String>>) -> Self {
    let target = match stage {
      Stage::C => &mut self.cflags,
      Stage::Cxx => &mut self.cxxflags,
      Stage::Link => &mut self.ldflags,
    };
    target.extend(flags.into_iter().map(Into::into));
    self
  }

  pub fn is_empty(&self) -> bool {
    self.cflags.is_empty() && self.cxxflags.is_empty() && self.ldflags.is_empty()
  }
}

impl Configure for StageFlags {
  fn configure(&self, ctx: &mut BuildCtx) -> Result<(), ComposeError> {
    configure_parent(&self.parent, ctx)?;
    for (stage, flags) in [
      (Stage::C, &self.cflags),
      (Stage::Cxx, &self.cxxflags),
      (Stage::Link, &self.ldflags),
    ] {
      if !flags.is_empty() {
        ctx.append(stage, flags.iter().cloned())?;
      }
    }
    Ok(())
  }
}

/// OpenMP-parallel workloads (SPEC CPU2017 speed benchmarks).
///
/// The thread count is recorded as a separate field so the engine never has
/// to parse it back out of the flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenMp {
  pub threads: u32,
}

impl OpenMp {
  pub const CFLAGS: [&'static str; 3] = ["-DSPEC_OPENMP", "-fopenmp", "-Wno-deprecated-non-prototype"];
  pub const LDFLAGS: [&'static str; 1] = ["-fopenmp"];

  pub fn new(threads: u32) -> Self {
    Self { threads }
  }
}

impl Configure for OpenMp {
  fn configure(&self, ctx: &mut BuildCtx) -> Result<(), ComposeError> {
    ctx.append(Stage::C, Self::CFLAGS)?;
    ctx.append(Stage::Link, Self::LDFLAGS)?;
    ctx.set_openmp_cores(self.threads);
    debug!(threads = self.threads, "enabled openmp");
    Ok(())
  }
}
