use std::sync::Arc;

use proptest::prelude::*;
use sanmatrix_lib::build::BuildCtx;
use sanmatrix_lib::flags::{FlagSet, Stage};
use sanmatrix_lib::variant::{AsanVariant, ClangVariant, Configure, OpenMp, OptLevel, StageFlags, Variant};

use super::common::toolchain;

fn opt_level() -> impl Strategy<Value = OptLevel> {
  prop_oneof![
    Just(OptLevel::O0),
    Just(OptLevel::O1),
    Just(OptLevel::O2),
    Just(OptLevel::O3),
    Just(OptLevel::Os),
  ]
}

fn flag_list() -> impl Strategy<Value = Vec<String>> {
  prop::collection::vec("-[a-zA-Z][a-zA-Z0-9=_-]{0,12}", 0..6)
}

/// Flags a parent layer contributes on its own, starting from an empty context.
fn parent_only(parent: &StageFlags) -> BuildCtx {
  let mut ctx = BuildCtx::new();
  parent.configure(&mut ctx).unwrap();
  ctx
}

proptest! {
  #[test]
  fn clang_chain_is_append_only(
    c in flag_list(),
    cxx in flag_list(),
    link in flag_list(),
    level in opt_level(),
    threads in 1u32..64,
  ) {
    let parent = StageFlags::new()
      .with_parent(Arc::new(toolchain("/usr/bin/clang")))
      .with(Stage::C, c)
      .with(Stage::Cxx, cxx)
      .with(Stage::Link, link);
    let before = parent_only(&parent);

    let variant = ClangVariant::new("default", toolchain("/usr/bin/clang"), level)
      .with_parent(Arc::new(parent))
      .with_openmp(OpenMp::new(threads));
    let mut ctx = BuildCtx::new();
    variant.configure(&mut ctx).unwrap();

    for stage in Stage::ALL {
      prop_assert!(ctx.flags(stage).starts_with(before.flags(stage)));
    }
    let own: FlagSet = ctx.flags(Stage::Cxx).as_slice()[before.flags(Stage::Cxx).len()..].iter().cloned().collect();
    prop_assert_eq!(own.as_slice(), [level.flag(), "-Wno-int-conversion".to_string()]);
    prop_assert_eq!(ctx.openmp_cores(), Some(threads));
  }

  #[test]
  fn asan_chain_is_append_only(c in flag_list(), link in flag_list(), level in opt_level()) {
    let parent = StageFlags::new()
      .with_parent(Arc::new(toolchain("/usr/bin/clang")))
      .with(Stage::C, c)
      .with(Stage::Link, link);
    let before = parent_only(&parent);

    let variant = AsanVariant::new("asan", toolchain("/usr/bin/clang"), level).with_parent(Arc::new(parent));
    let mut ctx = BuildCtx::new();
    variant.configure(&mut ctx).unwrap();

    for stage in Stage::ALL {
      prop_assert!(ctx.flags(stage).starts_with(before.flags(stage)));
      prop_assert!(ctx.flags(stage).contains("-fsanitize=address"));
    }
  }
}

#[test]
fn configure_twice_on_fresh_contexts_is_identical() {
  let variant = AsanVariant::new("asan", toolchain("/usr/bin/clang"), OptLevel::O2).with_openmp(OpenMp::new(16));
  let mut a = BuildCtx::new();
  let mut b = BuildCtx::new();
  variant.configure(&mut a).unwrap();
  variant.configure(&mut b).unwrap();
  assert_eq!(a, b);
}

#[test]
fn default_prepare_run_is_a_no_op() {
  let variant: Box<dyn Variant> = Box::new(ClangVariant::new("default", toolchain("/usr/bin/clang"), OptLevel::O0));
  let mut ctx = BuildCtx::new();
  variant.configure(&mut ctx).unwrap();
  let before = ctx.clone();
  variant.prepare_run(&mut ctx);
  assert_eq!(ctx, before);
}
