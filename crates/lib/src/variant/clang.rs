//! Clang-family variants.
//!
//! [`ClangVariant`] covers both the baseline compiler and the custom
//! instrumentation compiler: they only differ in which toolchain is plugged in.
//! [`AsanVariant`] adds AddressSanitizer instrumentation and shapes the
//! sanitizer runtime before each run.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::{Configure, OpenMp, OptLevel, Parent, Toolchain, Variant, configure_parent};
use crate::build::{BuildCtx, ComposeError};
use crate::flags::Stage;

const COMMON_WARNINGS: &str = "-Wno-int-conversion";

/// Disables lazy symbol binding. The custom instrumentation checks memory
/// adjacent to the stack, and the lazy-binding trampoline spills vector
/// registers there, which shows up as false positives.
const EAGER_BINDING: &str = "-Wl,-z,now";

const ASAN_FLAGS: [&str; 3] = [
  "-fsanitize=address",
  "-fno-sanitize-address-use-after-scope",
  "-fsanitize-address-use-after-return=never",
];

fn variant_name(prefix: &str, opt_level: OptLevel) -> String {
  format!("{}_{}", prefix, opt_level)
}

/// Compiler selection plus optimization flags, shared by every clang variant.
#[derive(Debug, Clone)]
struct ClangBase {
  toolchain: Toolchain,
  opt_level: OptLevel,
}

impl ClangBase {
  fn configure(&self, ctx: &mut BuildCtx) -> Result<(), ComposeError> {
    ctx.set_compiler(self.toolchain.compiler());
    let flags = [self.opt_level.flag(), COMMON_WARNINGS.to_string()];
    ctx.append_all(&[Stage::C, Stage::Cxx], &flags)
  }
}

/// A clang build without sanitizer instrumentation.
#[derive(Debug, Clone)]
pub struct ClangVariant {
  name: String,
  base: ClangBase,
  parent: Parent,
  openmp: Option<OpenMp>,
  eager_binding: bool,
}

impl ClangVariant {
  /// Named `<prefix>_<opt_level>`, e.g. `default_O2`.
  pub fn new(prefix: &str, toolchain: Toolchain, opt_level: OptLevel) -> Self {
    Self {
      name: variant_name(prefix, opt_level),
      base: ClangBase { toolchain, opt_level },
      parent: None,
      openmp: None,
      eager_binding: true,
    }
  }

  pub fn with_parent(mut self, parent: Arc<dyn Configure>) -> Self {
    self.parent = Some(parent);
    self
  }

  pub fn with_openmp(mut self, openmp: OpenMp) -> Self {
    self.openmp = Some(openmp);
    self
  }

  pub fn with_eager_binding(mut self, enabled: bool) -> Self {
    self.eager_binding = enabled;
    self
  }

  pub fn toolchain(&self) -> &Toolchain {
    &self.base.toolchain
  }

  pub fn opt_level(&self) -> OptLevel {
    self.base.opt_level
  }
}

impl Configure for ClangVariant {
  fn configure(&self, ctx: &mut BuildCtx) -> Result<(), ComposeError> {
    debug!(variant = %self.name, selector = self.base.toolchain.selector(), "configuring");
    configure_parent(&self.parent, ctx)?;
    self.base.configure(ctx)?;
    if self.eager_binding {
      ctx.append(Stage::Link, [EAGER_BINDING])?;
    }
    if let Some(openmp) = &self.openmp {
      openmp.configure(ctx)?;
    }
    Ok(())
  }
}

impl Variant for ClangVariant {
  fn name(&self) -> &str {
    &self.name
  }
}

/// `ASAN_OPTIONS` for a sanitizer that is being evaluated rather than used
/// as a bug finder.
///
/// The defaults switch off the checks that the benchmark workloads would
/// otherwise trip over (leaks, stack use after return/scope, new/free
/// mismatches, ODR violations).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsanOptions {
  options: Vec<(String, String)>,
}

impl AsanOptions {
  pub const ENV_VAR: &'static str = "ASAN_OPTIONS";

  pub fn evaluation() -> Self {
    Self {
      options: [
        "detect_leaks",
        "detect_stack_use_after_return",
        "detect_stack_use_after_scope",
        "alloc_dealloc_mismatch",
        "detect_odr_violation",
      ]
      .into_iter()
      .map(|key| (key.to_string(), "0".to_string()))
      .collect(),
    }
  }

  /// Set an option, replacing an existing value in place.
  pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    let key = key.into();
    let value = value.into();
    match self.options.iter_mut().find(|(k, _)| *k == key) {
      Some(entry) => entry.1 = value,
      None => self.options.push((key, value)),
    }
    self
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.options.iter().map(|(k, _)| k.as_str())
  }
}

impl Default for AsanOptions {
  fn default() -> Self {
    Self::evaluation()
  }
}

impl fmt::Display for AsanOptions {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let rendered: Vec<String> = self.options.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    f.write_str(&rendered.join(":"))
  }
}

/// A clang build instrumented with AddressSanitizer.
#[derive(Debug, Clone)]
pub struct AsanVariant {
  name: String,
  base: ClangBase,
  parent: Parent,
  openmp: Option<OpenMp>,
  options: AsanOptions,
}

impl AsanVariant {
  pub fn new(prefix: &str, toolchain: Toolchain, opt_level: OptLevel) -> Self {
    Self {
      name: variant_name(prefix, opt_level),
      base: ClangBase { toolchain, opt_level },
      parent: None,
      openmp: None,
      options: AsanOptions::evaluation(),
    }
  }

  pub fn with_parent(mut self, parent: Arc<dyn Configure>) -> Self {
    self.parent = Some(parent);
    self
  }

  pub fn with_openmp(mut self, openmp: OpenMp) -> Self {
    self.openmp = Some(openmp);
    self
  }

  pub fn with_options(mut self, options: AsanOptions) -> Self {
    self.options = options;
    self
  }

  pub fn toolchain(&self) -> &Toolchain {
    &self.base.toolchain
  }

  pub fn opt_level(&self) -> OptLevel {
    self.base.opt_level
  }

  pub fn options(&self) -> &AsanOptions {
    &self.options
  }
}

impl Configure for AsanVariant {
  fn configure(&self, ctx: &mut BuildCtx) -> Result<(), ComposeError> {
    debug!(variant = %self.name, selector = self.base.toolchain.selector(), "configuring");
    configure_parent(&self.parent, ctx)?;
    self.base.configure(ctx)?;
    // The link stage needs the flags too, to pull in the sanitizer runtime.
    ctx.append_all(&[Stage::C, Stage::Cxx, Stage::Link], &ASAN_FLAGS)?;
    if let Some(openmp) = &self.openmp {
      openmp.configure(ctx)?;
    }
    Ok(())
  }
}

impl Variant for AsanVariant {
  fn name(&self) -> &str {
    &self.name
  }

  fn prepare_run(&self, ctx: &mut BuildCtx) {
    debug!(variant = %self.name, options = %self.options, "shaping sanitizer runtime");
    ctx.set_env(AsanOptions::ENV_VAR, self.options.to_string());
  }
}
