use sanmatrix_lib::config::ConfigError;
use sanmatrix_lib::flags::Stage;
use sanmatrix_lib::matrix::Setup;
use sanmatrix_lib::preset::floatzone_setup;
use sanmatrix_lib::target::TargetDescriptor;
use sanmatrix_lib::util::hash::Hashable;
use sanmatrix_lib::variant::{AsanVariant, ClangVariant, OptLevel};

use super::common::{config, toolchain};

#[test]
fn baseline_and_instrumented_against_one_suite() {
  let mut setup = Setup::new();
  setup
    .add_instance(ClangVariant::new("baseline", toolchain("/opt/llvm/bin/clang"), OptLevel::O2))
    .unwrap();
  setup
    .add_instance(AsanVariant::new("instrumented", toolchain("/opt/llvm/bin/clang"), OptLevel::O2))
    .unwrap();
  setup.add_target(TargetDescriptor::new("suiteA", "/data/suiteA", "installed").unwrap());

  let entries: Vec<_> = setup.matrix().collect();
  assert_eq!(entries.len(), 2);
  assert_eq!(entries[0].variant.name(), "baseline_O2");
  assert_eq!(entries[1].variant.name(), "instrumented_O2");
  assert!(entries.iter().all(|e| e.target.suite() == "suiteA"));

  let baseline = entries[0].configure().unwrap();
  let instrumented = entries[1].configure().unwrap();
  assert!(!baseline.flags(Stage::Link).contains("-fsanitize=address"));
  assert!(instrumented.flags(Stage::Link).contains("-fsanitize=address"));
}

#[test]
fn n_by_m_pairs() {
  let mut setup = Setup::new();
  for level in [OptLevel::O0, OptLevel::O1, OptLevel::O2] {
    setup
      .add_instance(ClangVariant::new("v", toolchain("/usr/bin/clang"), level))
      .unwrap();
  }
  for suite in ["a", "b", "c", "d"] {
    setup.add_target(TargetDescriptor::bundled(suite));
  }

  let first: Vec<_> = setup
    .matrix()
    .map(|e| format!("{}/{}", e.variant.name(), e.target.suite()))
    .collect();
  let second: Vec<_> = setup
    .matrix()
    .map(|e| format!("{}/{}", e.variant.name(), e.target.suite()))
    .collect();

  assert_eq!(first.len(), 12);
  assert_eq!(first[..4], ["v_O0/a", "v_O0/b", "v_O0/c", "v_O0/d"]);
  assert_eq!(first[11], "v_O2/d");
  assert_eq!(first, second);
}

#[test]
fn unrecognized_source_kind_never_reaches_registration() {
  let setup = Setup::new();
  let result = TargetDescriptor::new("suiteA", "/data/suiteA", "ftp").map(|target| {
    let mut setup = setup.clone();
    setup.add_target(target);
    setup
  });

  assert!(matches!(result, Err(ConfigError::UnknownSourceKind(_))));
  assert!(setup.targets().is_empty());
}

#[test]
fn asan_environment_holds_exactly_the_suppressions() {
  let setup = floatzone_setup(&config()).unwrap();
  let resolved = setup.resolve().unwrap();

  for build in &resolved.builds {
    if build.variant.starts_with("asan_") {
      let env = build.context.runenv();
      assert_eq!(env.keys().collect::<Vec<_>>(), ["ASAN_OPTIONS"]);
      let options: Vec<_> = env["ASAN_OPTIONS"].split(':').collect();
      assert_eq!(
        options,
        [
          "detect_leaks=0",
          "detect_stack_use_after_return=0",
          "detect_stack_use_after_scope=0",
          "alloc_dealloc_mismatch=0",
          "detect_odr_violation=0",
        ]
      );
    } else {
      assert!(build.context.runenv().is_empty(), "{}", build.variant);
    }
  }
}

#[test]
fn preset_fingerprint_is_reproducible() {
  let a = floatzone_setup(&config()).unwrap().resolve().unwrap();
  let b = floatzone_setup(&config()).unwrap().resolve().unwrap();
  assert_eq!(a.compute_hash().unwrap(), b.compute_hash().unwrap());
}
