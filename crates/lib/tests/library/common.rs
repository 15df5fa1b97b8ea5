//! Shared helpers for library integration tests.

use sanmatrix_lib::config::{CompilerPath, EnvConfig};
use sanmatrix_lib::variant::Toolchain;

pub fn vars() -> Vec<(&'static str, &'static str)> {
  vec![
    ("DEFAULT_C", "/opt/llvm/bin/clang"),
    ("FLOATZONE_C", "/opt/floatzone/bin/clang"),
    ("FLOATZONE_SPEC06", "/data/spec2006"),
  ]
}

pub fn config() -> EnvConfig {
  EnvConfig::from_vars(vars()).unwrap()
}

pub fn toolchain(path: &str) -> Toolchain {
  Toolchain::new("test", CompilerPath::new("test", path).unwrap())
}
