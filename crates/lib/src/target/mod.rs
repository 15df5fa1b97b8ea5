//! Benchmark target descriptors.
//!
//! A target says where a benchmark suite's sources live and which patches the
//! engine must apply before building. Nothing here touches the filesystem:
//! whether the source location exists is the engine's problem at build time.

mod types;

pub use types::*;

pub const SPEC2006: &str = "spec2006";
pub const SPEC2017: &str = "spec2017";
pub const JULIET: &str = "juliet";
