use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{JULIET, SPEC2006, SPEC2017};
use crate::config::ConfigError;

/// How the engine obtains a suite's sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
  /// An already unpacked tree on local disk.
  Installed,
  /// A tarball to unpack.
  Archive,
  /// A repository checkout.
  Git,
}

impl SourceKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      SourceKind::Installed => "installed",
      SourceKind::Archive => "tarfile",
      SourceKind::Git => "git",
    }
  }
}

impl fmt::Display for SourceKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for SourceKind {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "installed" => Ok(SourceKind::Installed),
      "tarfile" | "archive" => Ok(SourceKind::Archive),
      "git" | "repository" => Ok(SourceKind::Git),
      other => Err(ConfigError::UnknownSourceKind(other.to_string())),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
  pub location: String,
  pub kind: SourceKind,
}

/// CPU placement requested by a target.
///
/// Written in configuration as a signed directive: `n > 0` pins the run to
/// cores `0..n`; `-m` lets a parallel workload spread over cores `0..=m` while
/// the control thread stays on core 0 (a binary that is not parallel just
/// runs on core 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum CpuAffinity {
  Pin { cores: u32 },
  Parallel { last_core: u32 },
}

impl CpuAffinity {
  pub fn from_directive(directive: i32) -> Result<Self, ConfigError> {
    match directive {
      0 | i32::MIN => Err(ConfigError::InvalidAffinity(directive)),
      n if n > 0 => Ok(CpuAffinity::Pin { cores: n as u32 }),
      n => Ok(CpuAffinity::Parallel {
        last_core: n.unsigned_abs(),
      }),
    }
  }

  /// The signed form this affinity was written as.
  pub fn directive(&self) -> i32 {
    match *self {
      // Values past i32::MAX only arrive through deserialization; clamp them.
      CpuAffinity::Pin { cores } => i32::try_from(cores).unwrap_or(i32::MAX),
      CpuAffinity::Parallel { last_core } => -i32::try_from(last_core).unwrap_or(i32::MAX),
    }
  }

  /// Cores the workload may occupy.
  pub fn core_range(&self) -> RangeInclusive<u32> {
    match *self {
      CpuAffinity::Pin { cores } => 0..=cores.saturating_sub(1),
      CpuAffinity::Parallel { last_core } => 0..=last_core,
    }
  }

  pub fn control_core(&self) -> u32 {
    0
  }

  pub fn worker_count(&self) -> u32 {
    match *self {
      CpuAffinity::Pin { cores } => cores,
      CpuAffinity::Parallel { last_core } => last_core.saturating_add(1),
    }
  }
}

impl fmt::Display for CpuAffinity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let range = self.core_range();
    match self {
      CpuAffinity::Pin { .. } => write!(f, "pin cores {}-{}", range.start(), range.end()),
      CpuAffinity::Parallel { .. } => write!(f, "parallel cores {}-{} (control on 0)", range.start(), range.end()),
    }
  }
}

/// A benchmark suite plus the metadata needed to acquire and patch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDescriptor {
  suite: String,
  source: Option<Source>,
  patches: Vec<String>,
  affinity: Option<CpuAffinity>,
  params: BTreeMap<String, String>,
}

impl TargetDescriptor {
  /// A target whose sources are at `location`. `kind` must name a known
  /// [`SourceKind`].
  pub fn new(suite: impl Into<String>, location: impl Into<String>, kind: &str) -> Result<Self, ConfigError> {
    let kind = kind.parse::<SourceKind>()?;
    Ok(Self::with_source(suite, location, kind))
  }

  pub fn with_source(suite: impl Into<String>, location: impl Into<String>, kind: SourceKind) -> Self {
    Self {
      suite: suite.into(),
      source: Some(Source {
        location: location.into(),
        kind,
      }),
      patches: Vec::new(),
      affinity: None,
      params: BTreeMap::new(),
    }
  }

  /// A target the engine knows how to obtain on its own.
  pub fn bundled(suite: impl Into<String>) -> Self {
    Self {
      suite: suite.into(),
      source: None,
      patches: Vec::new(),
      affinity: None,
      params: BTreeMap::new(),
    }
  }

  pub fn spec2006(location: impl Into<String>) -> Self {
    Self::with_source(SPEC2006, location, SourceKind::Installed)
  }

  pub fn spec2017(location: impl Into<String>) -> Self {
    Self::with_source(SPEC2017, location, SourceKind::Installed)
  }

  /// The Juliet test suite. `mitigation_return_code` is the exit status the
  /// instrumentation uses when it stops an attack.
  pub fn juliet(mitigation_return_code: i32) -> Self {
    Self::bundled(JULIET).with_param("mitigation_return_code", mitigation_return_code.to_string())
  }

  pub fn with_patches<I, S>(mut self, patches: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.patches.extend(patches.into_iter().map(Into::into));
    self
  }

  pub fn with_affinity(mut self, directive: i32) -> Result<Self, ConfigError> {
    self.affinity = Some(CpuAffinity::from_directive(directive)?);
    Ok(self)
  }

  pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
    self.params.insert(key.into(), value.into());
    self
  }

  pub fn suite(&self) -> &str {
    &self.suite
  }

  pub fn source(&self) -> Option<&Source> {
    self.source.as_ref()
  }

  /// Patches to apply, in order.
  pub fn patches(&self) -> &[String] {
    &self.patches
  }

  pub fn affinity(&self) -> Option<CpuAffinity> {
    self.affinity
  }

  pub fn params(&self) -> &BTreeMap<String, String> {
    &self.params
  }
}
