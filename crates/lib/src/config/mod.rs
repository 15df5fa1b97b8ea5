//! Environment-derived configuration.
//!
//! Compiler locations and benchmark source trees are supplied through process
//! environment variables. They are read exactly once, when an [`EnvConfig`] is
//! built, and passed explicitly into variant and target constructors from then
//! on. A missing required variable is reported here, before any matrix exists.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::consts::{
  CXX_SUFFIX, DEFAULT_OPENMP_THREADS, ENV_ASANMM_CC, ENV_DEFAULT_CC, ENV_FLOATZONE_CC, ENV_INFRA, ENV_OPENMP_THREADS,
  ENV_SPEC06, ENV_SPEC17,
};
use crate::variant::Toolchain;

/// Errors raised while assembling the experiment matrix.
///
/// All of these are fatal: they surface before the execution engine is
/// handed anything.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("variant '{0}' is already registered")]
  DuplicateVariant(String),

  #[error("required environment variable {0} is not set")]
  MissingEnv(String),

  #[error("invalid value for {var}: '{value}' ({message})")]
  InvalidValue {
    var: String,
    value: String,
    message: String,
  },

  #[error("unrecognized source kind '{0}' (expected installed, tarfile or git)")]
  UnknownSourceKind(String),

  #[error("invalid cpu affinity directive {0}: must be non-zero and greater than {min}", min = i32::MIN)]
  InvalidAffinity(i32),

  #[error("unknown optimization level '{0}'")]
  UnknownOptLevel(String),

  #[error("unknown compiler selector '{0}'")]
  UnknownCompiler(String),

  #[error("unknown variant kind '{0}' (expected clang or asan)")]
  UnknownVariantKind(String),

  #[error("compiler path for '{0}' is empty")]
  EmptyCompilerPath(String),

  #[error("failed to read manifest {}: {source}", path.display())]
  ManifestRead {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse manifest: {0}")]
  Manifest(#[from] toml::de::Error),
}

/// Absolute path of a C compiler executable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompilerPath(PathBuf);

impl CompilerPath {
  pub fn new(selector: &str, path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
    let path = path.into();
    if path.as_os_str().is_empty() {
      return Err(ConfigError::EmptyCompilerPath(selector.to_string()));
    }
    Ok(Self(path))
  }

  pub fn cc(&self) -> &Path {
    &self.0
  }

  /// The companion C++ compiler (`clang` -> `clang++`).
  pub fn cxx(&self) -> PathBuf {
    let mut s = OsString::from(self.0.as_os_str());
    s.push(CXX_SUFFIX);
    PathBuf::from(s)
  }
}

impl fmt::Display for CompilerPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.display())
  }
}

/// Compiler selectors understood by [`EnvConfig::compiler`].
pub mod selector {
  pub const DEFAULT: &str = "default";
  pub const FLOATZONE: &str = "floatzone";
  pub const ASANMM_14: &str = "asanmm-14";
}

/// Configuration resolved from the environment at setup time.
#[derive(Debug, Clone)]
pub struct EnvConfig {
  pub default_cc: CompilerPath,
  pub floatzone_cc: CompilerPath,
  pub asanmm_cc: Option<CompilerPath>,
  pub spec06_source: PathBuf,
  pub spec17_source: Option<PathBuf>,
  pub infra_dir: Option<PathBuf>,
  pub openmp_threads: u32,
  vars: BTreeMap<String, String>,
}

impl EnvConfig {
  /// Snapshot the process environment.
  pub fn from_env() -> Result<Self, ConfigError> {
    Self::from_os_vars(std::env::vars_os())
  }

  /// Like [`EnvConfig::from_vars`], for raw OS strings. Variables this crate
  /// reads must be valid UTF-8; unrelated ones that are not are skipped.
  pub fn from_os_vars<I>(vars: I) -> Result<Self, ConfigError>
  where
    I: IntoIterator<Item = (OsString, OsString)>,
  {
    let mut utf8 = Vec::new();
    for (key, value) in vars {
      let Ok(key) = key.into_string() else {
        continue;
      };
      match value.into_string() {
        Ok(value) => utf8.push((key, value)),
        Err(raw) if KNOWN_VARS.contains(&key.as_str()) => {
          return Err(ConfigError::InvalidValue {
            var: key,
            value: raw.to_string_lossy().into_owned(),
            message: "not valid UTF-8".to_string(),
          });
        }
        Err(_) => {}
      }
    }
    Self::from_vars(utf8)
  }

  /// Build from an explicit set of variables. Empty values count as unset.
  pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
  {
    let vars: BTreeMap<String, String> = vars
      .into_iter()
      .map(|(k, v)| (k.into(), v.into()))
      .filter(|(_, v)| !v.is_empty())
      .collect();

    let default_cc = CompilerPath::new(selector::DEFAULT, required(&vars, ENV_DEFAULT_CC)?)?;
    let floatzone_cc = CompilerPath::new(selector::FLOATZONE, required(&vars, ENV_FLOATZONE_CC)?)?;
    let asanmm_cc = vars
      .get(ENV_ASANMM_CC)
      .map(|p| CompilerPath::new(selector::ASANMM_14, p.as_str()))
      .transpose()?;
    let spec06_source = PathBuf::from(required(&vars, ENV_SPEC06)?);
    let spec17_source = vars.get(ENV_SPEC17).map(PathBuf::from);
    let infra_dir = vars.get(ENV_INFRA).map(PathBuf::from);

    if spec17_source.is_none() {
      warn!(var = ENV_SPEC17, "not set, spec2017 target will not be registered");
    }

    let openmp_threads = match vars.get(ENV_OPENMP_THREADS) {
      Some(raw) => parse_threads(raw)?,
      None => DEFAULT_OPENMP_THREADS,
    };

    debug!(
      default_cc = %default_cc,
      floatzone_cc = %floatzone_cc,
      openmp_threads,
      "resolved environment configuration"
    );

    Ok(Self {
      default_cc,
      floatzone_cc,
      asanmm_cc,
      spec06_source,
      spec17_source,
      infra_dir,
      openmp_threads,
      vars,
    })
  }

  /// Resolve an opaque compiler selector to its executable.
  pub fn compiler(&self, name: &str) -> Result<&CompilerPath, ConfigError> {
    match name {
      selector::DEFAULT => Ok(&self.default_cc),
      selector::FLOATZONE => Ok(&self.floatzone_cc),
      selector::ASANMM_14 => self
        .asanmm_cc
        .as_ref()
        .ok_or_else(|| ConfigError::MissingEnv(ENV_ASANMM_CC.to_string())),
      other => Err(ConfigError::UnknownCompiler(other.to_string())),
    }
  }

  pub fn toolchain(&self, name: &str) -> Result<Toolchain, ConfigError> {
    Ok(Toolchain::new(name, self.compiler(name)?.clone()))
  }

  /// Look up a variable from the snapshot taken at construction.
  pub fn var(&self, name: &str) -> Option<&str> {
    self.vars.get(name).map(String::as_str)
  }

  /// Like [`EnvConfig::var`], but unset is an error.
  pub fn require_var(&self, name: &str) -> Result<&str, ConfigError> {
    self.var(name).ok_or_else(|| ConfigError::MissingEnv(name.to_string()))
  }
}

fn required<'a>(vars: &'a BTreeMap<String, String>, name: &str) -> Result<&'a str, ConfigError> {
  vars
    .get(name)
    .map(String::as_str)
    .ok_or_else(|| ConfigError::MissingEnv(name.to_string()))
}

const KNOWN_VARS: [&str; 7] = [
  ENV_DEFAULT_CC,
  ENV_FLOATZONE_CC,
  ENV_ASANMM_CC,
  ENV_SPEC06,
  ENV_SPEC17,
  ENV_INFRA,
  ENV_OPENMP_THREADS,
];

/// A thread count must be at least 1 and small enough that `-(threads - 1)`
/// is a valid affinity directive.
pub(crate) fn check_threads(var: &str, threads: u32) -> Result<u32, ConfigError> {
  let invalid = |message: &str| ConfigError::InvalidValue {
    var: var.to_string(),
    value: threads.to_string(),
    message: message.to_string(),
  };
  if threads == 0 {
    return Err(invalid("must be at least 1"));
  }
  if i32::try_from(threads).is_err() {
    return Err(invalid("too large"));
  }
  Ok(threads)
}

fn parse_threads(raw: &str) -> Result<u32, ConfigError> {
  let invalid = |message: &str| ConfigError::InvalidValue {
    var: ENV_OPENMP_THREADS.to_string(),
    value: raw.to_string(),
    message: message.to_string(),
  };
  let threads: u32 = raw.trim().parse().map_err(|_| invalid("not a number"))?;
  check_threads(ENV_OPENMP_THREADS, threads)
}
