//! The built-in evaluation matrix: baseline clang, AddressSanitizer and the
//! FloatZone instrumentation at `-O0` and `-O2`, against SPEC CPU and Juliet.

use tracing::info;

use crate::config::{ConfigError, EnvConfig, check_threads, selector};
use crate::consts::ENV_OPENMP_THREADS;
use crate::matrix::Setup;
use crate::target::TargetDescriptor;
use crate::variant::{AsanVariant, ClangVariant, OpenMp, OptLevel};

pub const SPEC2006_PATCHES: [&str; 4] = ["dealII-stddef", "asan", "omnetpp-invalid-ptrcheck", "libcxx"];
pub const SPEC2017_PATCHES: [&str; 1] = ["asan"];

/// Exit status the FloatZone runtime uses when it detects a violation.
pub const JULIET_MITIGATION_RETURN_CODE: i32 = 1;

pub fn floatzone_setup(config: &EnvConfig) -> Result<Setup, ConfigError> {
  let threads = check_threads(ENV_OPENMP_THREADS, config.openmp_threads)?;
  let openmp = OpenMp::new(threads);
  let default = config.toolchain(selector::DEFAULT)?;
  let floatzone = config.toolchain(selector::FLOATZONE)?;

  let mut setup = Setup::new();
  for opt_level in [OptLevel::O2, OptLevel::O0] {
    setup.add_instance(ClangVariant::new("default", default.clone(), opt_level).with_openmp(openmp))?;
  }
  for opt_level in [OptLevel::O0, OptLevel::O2] {
    setup.add_instance(AsanVariant::new("asan", default.clone(), opt_level).with_openmp(openmp))?;
  }
  for opt_level in [OptLevel::O2, OptLevel::O0] {
    setup.add_instance(ClangVariant::new("floatzone", floatzone.clone(), opt_level).with_openmp(openmp))?;
  }

  setup.add_target(
    TargetDescriptor::spec2006(config.spec06_source.to_string_lossy()).with_patches(SPEC2006_PATCHES),
  );

  if let Some(spec17) = &config.spec17_source {
    // Workers on cores 0..threads-1, control thread pinned to core 0.
    // check_threads keeps threads in 1..=i32::MAX, so the negation cannot overflow.
    let last_core = i32::try_from(threads - 1).map_err(|_| ConfigError::InvalidValue {
      var: ENV_OPENMP_THREADS.to_string(),
      value: threads.to_string(),
      message: "too large".to_string(),
    })?;
    let target = TargetDescriptor::spec2017(spec17.to_string_lossy()).with_patches(SPEC2017_PATCHES);
    // A single thread leaves nothing to spread over; pin instead.
    let target = if last_core == 0 {
      target.with_affinity(1)?
    } else {
      target.with_affinity(-last_core)?
    };
    setup.add_target(target);
  }

  setup.add_target(TargetDescriptor::juliet(JULIET_MITIGATION_RETURN_CODE));

  info!(
    variants = setup.variants().count(),
    targets = setup.targets().len(),
    "assembled floatzone matrix"
  );
  Ok(setup)
}
