//! Ordered compiler and linker flag sets.
//!
//! A [`FlagSet`] only grows. Layers of a variant append to it in the order they
//! run, and nothing downstream may reorder, deduplicate or drop entries: some
//! flags have to appear once per stage and a deduplicating consumer would lose
//! them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A compilation stage that owns its own flag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
  C,
  Cxx,
  Link,
}

impl Stage {
  pub const ALL: [Stage; 3] = [Stage::C, Stage::Cxx, Stage::Link];

  /// The conventional variable name for this stage's flags.
  pub fn as_str(&self) -> &'static str {
    match self {
      Stage::C => "cflags",
      Stage::Cxx => "cxxflags",
      Stage::Link => "ldflags",
    }
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Stage {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "c" | "cflags" => Ok(Stage::C),
      "cxx" | "cxxflags" => Ok(Stage::Cxx),
      "link" | "ldflags" => Ok(Stage::Link),
      other => Err(format!("unknown stage: {}", other)),
    }
  }
}

/// An append-only, ordered sequence of flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlagSet(Vec<String>);

impl FlagSet {
  pub fn new() -> Self {
    Self(Vec::new())
  }

  pub fn push(&mut self, flag: impl Into<String>) {
    self.0.push(flag.into());
  }

  pub fn extend<I, S>(&mut self, flags: I)
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.0.extend(flags.into_iter().map(Into::into));
  }

  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.0.iter().map(String::as_str)
  }

  pub fn contains(&self, flag: &str) -> bool {
    self.0.iter().any(|f| f == flag)
  }

  /// Number of times `flag` occurs.
  pub fn count(&self, flag: &str) -> usize {
    self.0.iter().filter(|f| *f == flag).count()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn as_slice(&self) -> &[String] {
    &self.0
  }

  /// Whether `prefix` is an ordered prefix of this set.
  pub fn starts_with(&self, prefix: &FlagSet) -> bool {
    self.0.starts_with(&prefix.0)
  }
}

impl fmt::Display for FlagSet {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.join(" "))
  }
}

impl<S: Into<String>> FromIterator<S> for FlagSet {
  fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
    Self(iter.into_iter().map(Into::into).collect())
  }
}
