//! Per-build configuration state.
//!
//! A [`BuildCtx`] accumulates everything one (variant, target) build needs:
//! the compiler pair, the per-stage flag sets, the runtime environment and the
//! parallelism hints. The execution engine owns it; variants only borrow it
//! mutably while `configure` or `prepare_run` runs.

mod types;

pub use types::*;
