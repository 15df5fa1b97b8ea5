use std::path::Path;

use anyhow::{Result, anyhow};
use sanmatrix_lib::build::BuildCtx;

use crate::output::shell_quote;

/// Print `export` lines for the environment a variant's runs need, so a
/// manual run can be reproduced with `eval "$(sanmatrix env asan_O2)"`.
pub fn cmd_env(manifest: Option<&Path>, name: &str) -> Result<()> {
  let setup = super::load_setup(manifest)?;
  let variant = setup
    .variant(name)
    .ok_or_else(|| anyhow!("unknown variant: {}", name))?;

  let mut ctx = BuildCtx::new();
  variant.prepare_run(&mut ctx);
  for (key, value) in ctx.runenv() {
    println!("export {}={}", key, shell_quote(value));
  }
  Ok(())
}
