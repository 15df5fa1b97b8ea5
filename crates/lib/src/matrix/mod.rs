//! The experiment matrix.
//!
//! [`Setup`] collects variants and targets and exposes their cross product.
//! Iteration is variant-major and follows registration order, so a serial
//! engine schedules builds the same way on every invocation.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::build::{BuildCtx, ComposeError};
use crate::config::ConfigError;
use crate::target::TargetDescriptor;
use crate::util::hash::Hashable;
use crate::variant::Variant;

/// Registry of variants and targets.
#[derive(Debug, Default, Clone)]
pub struct Setup {
  variants: Vec<Arc<dyn Variant>>,
  targets: Vec<TargetDescriptor>,
}

impl Setup {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a variant. Names must be unique; on a duplicate the registry
  /// is left untouched.
  pub fn add_instance(&mut self, variant: impl Variant + 'static) -> Result<(), ConfigError> {
    self.add_shared_instance(Arc::new(variant))
  }

  pub fn add_shared_instance(&mut self, variant: Arc<dyn Variant>) -> Result<(), ConfigError> {
    if self.variant(variant.name()).is_some() {
      return Err(ConfigError::DuplicateVariant(variant.name().to_string()));
    }
    info!(variant = variant.name(), "registered variant");
    self.variants.push(variant);
    Ok(())
  }

  /// Register a target. The same suite may appear more than once, e.g. with
  /// different patch sets.
  pub fn add_target(&mut self, target: TargetDescriptor) {
    info!(suite = target.suite(), patches = target.patches().len(), "registered target");
    self.targets.push(target);
  }

  pub fn variants(&self) -> impl Iterator<Item = &dyn Variant> {
    self.variants.iter().map(|v| v.as_ref())
  }

  pub fn variant(&self, name: &str) -> Option<&dyn Variant> {
    self.variants().find(|v| v.name() == name)
  }

  pub fn targets(&self) -> &[TargetDescriptor] {
    &self.targets
  }

  /// Every (variant, target) pair, variant-major.
  pub fn matrix(&self) -> impl Iterator<Item = MatrixEntry<'_>> {
    self.variants.iter().flat_map(move |variant| {
      self.targets.iter().map(move |target| MatrixEntry {
        variant: variant.as_ref(),
        target,
      })
    })
  }

  /// Number of pairs in the matrix.
  pub fn len(&self) -> usize {
    self.variants.len() * self.targets.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// A copy restricted to one variant and/or one suite. Registration order is
  /// kept.
  pub fn filter(&self, variant: Option<&str>, suite: Option<&str>) -> Setup {
    Setup {
      variants: self
        .variants
        .iter()
        .filter(|v| variant.is_none_or(|name| v.name() == name))
        .cloned()
        .collect(),
      targets: self
        .targets
        .iter()
        .filter(|t| suite.is_none_or(|s| t.suite() == s))
        .cloned()
        .collect(),
    }
  }

  /// Configure and prepare every pair. Stops at the first composition error.
  pub fn resolve(&self) -> Result<ResolvedMatrix, ComposeError> {
    let builds = self.matrix().map(|entry| entry.resolve()).collect::<Result<Vec<_>, _>>()?;
    Ok(ResolvedMatrix { builds })
  }
}

/// One (variant, target) pair.
#[derive(Clone, Copy)]
pub struct MatrixEntry<'a> {
  pub variant: &'a dyn Variant,
  pub target: &'a TargetDescriptor,
}

impl MatrixEntry<'_> {
  /// A fresh build context configured by the variant, with the target's CPU
  /// placement attached.
  pub fn configure(&self) -> Result<BuildCtx, ComposeError> {
    let mut ctx = BuildCtx::new();
    self
      .variant
      .configure(&mut ctx)
      .map_err(|e| e.in_variant(self.variant.name()))?;
    if let Some(affinity) = self.target.affinity() {
      ctx.set_affinity(affinity);
    }
    debug!(
      variant = self.variant.name(),
      suite = self.target.suite(),
      "configured build context"
    );
    Ok(ctx)
  }

  pub fn prepare_run(&self, ctx: &mut BuildCtx) {
    self.variant.prepare_run(ctx);
  }

  /// Configure, then prepare the run environment.
  pub fn resolve(&self) -> Result<ResolvedBuild, ComposeError> {
    let mut context = self.configure()?;
    self.prepare_run(&mut context);
    Ok(ResolvedBuild {
      variant: self.variant.name().to_string(),
      target: self.target.clone(),
      context,
    })
  }
}

impl fmt::Debug for MatrixEntry<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MatrixEntry")
      .field("variant", &self.variant.name())
      .field("suite", &self.target.suite())
      .finish()
  }
}

/// A fully resolved pair, ready to hand to an engine or print.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedBuild {
  pub variant: String,
  pub target: TargetDescriptor,
  pub context: BuildCtx,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedMatrix {
  pub builds: Vec<ResolvedBuild>,
}

impl Hashable for ResolvedMatrix {}
