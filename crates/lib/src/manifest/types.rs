//! Manifest file types.
//!
//! ```toml
//! [[variant]]
//! prefix = "asan"
//! kind = "asan"
//! compiler = "default"
//! opt_levels = ["O0", "O2"]
//! openmp = true
//!
//! [[target]]
//! suite = "spec2006"
//! source = "$FLOATZONE_SPEC06"
//! source_kind = "installed"
//! patches = ["asan", "libcxx"]
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::config::{ConfigError, EnvConfig, check_threads};
use crate::flags::Stage;
use crate::matrix::Setup;
use crate::target::{SourceKind, TargetDescriptor};
use crate::variant::{AsanOptions, AsanVariant, ClangVariant, Configure, OpenMp, OptLevel, StageFlags, Variant};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MatrixManifest {
  #[serde(default, rename = "variant")]
  pub variants: Vec<VariantDecl>,
  #[serde(default, rename = "target")]
  pub targets: Vec<TargetDecl>,
}

/// One `[[variant]]` table. Expands to one variant per optimization level.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariantDecl {
  pub prefix: String,
  /// `clang` or `asan`.
  pub kind: String,
  /// Compiler selector, e.g. `default` or `floatzone`.
  pub compiler: String,
  pub opt_levels: Vec<String>,
  #[serde(default)]
  pub openmp: bool,
  /// Overrides the configured OpenMP thread count.
  #[serde(default)]
  pub threads: Option<u32>,
  /// Only accepted on `clang` variants.
  #[serde(default)]
  pub eager_binding: Option<bool>,
  /// Extra `ASAN_OPTIONS` entries. Only accepted on `asan` variants.
  #[serde(default)]
  pub asan_options: BTreeMap<String, String>,
  /// Extra flags, applied in a layer below the variant's own.
  #[serde(default)]
  pub cflags: Vec<String>,
  #[serde(default)]
  pub cxxflags: Vec<String>,
  #[serde(default)]
  pub ldflags: Vec<String>,
}

/// One `[[target]]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetDecl {
  pub suite: String,
  /// A path or URL, or `$VAR` to read it from the environment.
  #[serde(default)]
  pub source: Option<String>,
  #[serde(default)]
  pub source_kind: Option<String>,
  #[serde(default)]
  pub patches: Vec<String>,
  #[serde(default)]
  pub affinity: Option<i32>,
  #[serde(default)]
  pub params: BTreeMap<String, String>,
}

impl MatrixManifest {
  pub fn parse(content: &str) -> Result<Self, ConfigError> {
    Ok(toml::from_str(content)?)
  }

  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ManifestRead {
      path: path.to_path_buf(),
      source,
    })?;
    debug!(path = ?path, "loaded matrix manifest");
    Self::parse(&content)
  }

  /// Validate every declaration and register it, in file order.
  pub fn into_setup(&self, config: &EnvConfig) -> Result<Setup, ConfigError> {
    let mut setup = Setup::new();
    for decl in &self.variants {
      for variant in decl.expand(config)? {
        setup.add_shared_instance(variant)?;
      }
    }
    for decl in &self.targets {
      setup.add_target(decl.resolve(config)?);
    }
    Ok(setup)
  }
}

/// The `kind` of a `[[variant]]` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantKind {
  Clang,
  Asan,
}

impl FromStr for VariantKind {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "clang" => Ok(VariantKind::Clang),
      "asan" => Ok(VariantKind::Asan),
      other => Err(ConfigError::UnknownVariantKind(other.to_string())),
    }
  }
}

impl VariantDecl {
  fn invalid(&self, field: &str, value: impl ToString, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
      var: format!("variant '{}' {}", self.prefix, field),
      value: value.to_string(),
      message: message.to_string(),
    }
  }

  /// Check everything that does not depend on the opt level.
  fn validate(&self) -> Result<VariantKind, ConfigError> {
    let kind: VariantKind = self.kind.parse()?;
    if self.opt_levels.is_empty() {
      return Err(self.invalid("opt_levels", "[]", "at least one level is required"));
    }
    if let Some(threads) = self.threads {
      check_threads("threads", threads).map_err(|_| self.invalid("threads", threads, "must be in 1..=2147483647"))?;
    }
    if let (VariantKind::Asan, Some(eager)) = (kind, self.eager_binding) {
      return Err(self.invalid("eager_binding", eager, "only applies to clang variants"));
    }
    if kind == VariantKind::Clang && !self.asan_options.is_empty() {
      return Err(self.invalid(
        "asan_options",
        self.asan_options.keys().cloned().collect::<Vec<_>>().join(","),
        "only applies to asan variants",
      ));
    }
    Ok(kind)
  }

  fn expand(&self, config: &EnvConfig) -> Result<Vec<Arc<dyn Variant>>, ConfigError> {
    let kind = self.validate()?;
    let opt_levels = self
      .opt_levels
      .iter()
      .map(|raw| raw.parse::<OptLevel>())
      .collect::<Result<Vec<_>, _>>()?;

    let toolchain = config.toolchain(&self.compiler)?;
    let openmp = self
      .openmp
      .then(|| OpenMp::new(self.threads.unwrap_or(config.openmp_threads)));
    let extra = StageFlags::new()
      .with_parent(Arc::new(toolchain.clone()))
      .with(Stage::C, self.cflags.iter().cloned())
      .with(Stage::Cxx, self.cxxflags.iter().cloned())
      .with(Stage::Link, self.ldflags.iter().cloned());
    let parent: Option<Arc<dyn Configure>> = (!extra.is_empty()).then(|| Arc::new(extra) as Arc<dyn Configure>);

    let mut variants: Vec<Arc<dyn Variant>> = Vec::with_capacity(opt_levels.len());
    for opt_level in opt_levels {
      let variant: Arc<dyn Variant> = match kind {
        VariantKind::Clang => {
          let mut v = ClangVariant::new(&self.prefix, toolchain.clone(), opt_level);
          if let Some(parent) = &parent {
            v = v.with_parent(parent.clone());
          }
          if let Some(openmp) = openmp {
            v = v.with_openmp(openmp);
          }
          if let Some(eager) = self.eager_binding {
            v = v.with_eager_binding(eager);
          }
          Arc::new(v)
        }
        VariantKind::Asan => {
          let options = self
            .asan_options
            .iter()
            .fold(AsanOptions::evaluation(), |opts, (k, v)| opts.set(k, v));
          let mut v = AsanVariant::new(&self.prefix, toolchain.clone(), opt_level).with_options(options);
          if let Some(parent) = &parent {
            v = v.with_parent(parent.clone());
          }
          if let Some(openmp) = openmp {
            v = v.with_openmp(openmp);
          }
          Arc::new(v)
        }
      };
      variants.push(variant);
    }
    Ok(variants)
  }
}

impl TargetDecl {
  fn resolve(&self, config: &EnvConfig) -> Result<TargetDescriptor, ConfigError> {
    let target = match &self.source {
      Some(raw) => {
        let location = resolve_value(raw, config)?;
        let kind: SourceKind = self.source_kind.as_deref().unwrap_or("installed").parse()?;
        TargetDescriptor::with_source(&self.suite, location, kind)
      }
      None => {
        // Still validate a kind that was given without a location.
        if let Some(kind) = &self.source_kind {
          kind.parse::<SourceKind>()?;
        }
        TargetDescriptor::bundled(&self.suite)
      }
    };

    let mut target = target.with_patches(self.patches.iter().cloned());
    if let Some(directive) = self.affinity {
      target = target.with_affinity(directive)?;
    }
    for (key, value) in &self.params {
      target = target.with_param(key, value);
    }
    Ok(target)
  }
}

fn resolve_value(raw: &str, config: &EnvConfig) -> Result<String, ConfigError> {
  match raw.strip_prefix('$') {
    Some(var) => Ok(config.require_var(var)?.to_string()),
    None => Ok(raw.to_string()),
  }
}
