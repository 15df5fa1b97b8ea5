use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::CompilerPath;
use crate::flags::{FlagSet, Stage};
use crate::target::CpuAffinity;

/// Errors raised while a variant's layers compose a build context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
  /// A layer tried to append flags before any layer set a compiler.
  #[error("no compiler established before appending {stage}")]
  CompilerUnset { stage: Stage },

  #[error("variant '{variant}': {source}")]
  Variant {
    variant: String,
    #[source]
    source: Box<ComposeError>,
  },
}

impl ComposeError {
  /// Attach the name of the variant whose chain failed. Already-attributed
  /// errors keep their original variant.
  pub fn in_variant(self, variant: &str) -> Self {
    match self {
      ComposeError::Variant { .. } => self,
      other => ComposeError::Variant {
        variant: variant.to_string(),
        source: Box::new(other),
      },
    }
  }

  pub fn variant(&self) -> Option<&str> {
    match self {
      ComposeError::Variant { variant, .. } => Some(variant),
      _ => None,
    }
  }
}

/// The in-progress configuration of a single build.
///
/// Flag sets can only be appended to. The compiler pair, by contrast, is
/// overwritten by whichever layer sets it last.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildCtx {
  cc: Option<PathBuf>,
  cxx: Option<PathBuf>,
  cflags: FlagSet,
  cxxflags: FlagSet,
  ldflags: FlagSet,
  runenv: BTreeMap<String, String>,
  openmp_cores: Option<u32>,
  affinity: Option<CpuAffinity>,
}

impl BuildCtx {
  pub fn new() -> Self {
    Self::default()
  }

  /// Select the compiler, deriving the C++ companion from the C path.
  pub fn set_compiler(&mut self, compiler: &CompilerPath) {
    self.cc = Some(compiler.cc().to_path_buf());
    self.cxx = Some(compiler.cxx());
  }

  pub fn has_compiler(&self) -> bool {
    self.cc.is_some()
  }

  pub fn cc(&self) -> Option<&Path> {
    self.cc.as_deref()
  }

  pub fn cxx(&self) -> Option<&Path> {
    self.cxx.as_deref()
  }

  /// Append flags to one stage.
  pub fn append<I, S>(&mut self, stage: Stage, flags: I) -> Result<(), ComposeError>
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    if !self.has_compiler() {
      return Err(ComposeError::CompilerUnset { stage });
    }
    self.flags_mut(stage).extend(flags);
    Ok(())
  }

  /// Append the same flags to every stage in `stages`, in order.
  pub fn append_all<S>(&mut self, stages: &[Stage], flags: &[S]) -> Result<(), ComposeError>
  where
    S: AsRef<str>,
  {
    for stage in stages {
      self.append(*stage, flags.iter().map(|f| f.as_ref().to_string()))?;
    }
    Ok(())
  }

  pub fn flags(&self, stage: Stage) -> &FlagSet {
    match stage {
      Stage::C => &self.cflags,
      Stage::Cxx => &self.cxxflags,
      Stage::Link => &self.ldflags,
    }
  }

  fn flags_mut(&mut self, stage: Stage) -> &mut FlagSet {
    match stage {
      Stage::C => &mut self.cflags,
      Stage::Cxx => &mut self.cxxflags,
      Stage::Link => &mut self.ldflags,
    }
  }

  pub fn runenv(&self) -> &BTreeMap<String, String> {
    &self.runenv
  }

  pub fn set_env(&mut self, key: impl Into<String>, value: impl Into<String>) {
    self.runenv.insert(key.into(), value.into());
  }

  /// Number of worker threads the workload should launch, if it is parallel.
  pub fn openmp_cores(&self) -> Option<u32> {
    self.openmp_cores
  }

  pub fn set_openmp_cores(&mut self, cores: u32) {
    self.openmp_cores = Some(cores);
  }

  pub fn affinity(&self) -> Option<CpuAffinity> {
    self.affinity
  }

  pub fn set_affinity(&mut self, affinity: CpuAffinity) {
    self.affinity = Some(affinity);
  }
}
