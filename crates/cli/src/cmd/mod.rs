mod env;
mod list;
mod plan;

pub use env::cmd_env;
pub use list::cmd_list;
pub use plan::cmd_plan;

use std::path::Path;

use anyhow::{Context, Result};
use sanmatrix_lib::config::EnvConfig;
use sanmatrix_lib::manifest::MatrixManifest;
use sanmatrix_lib::matrix::Setup;
use sanmatrix_lib::preset;

/// Build the registry from a manifest if one was given, otherwise from the
/// built-in preset.
fn load_setup(manifest: Option<&Path>) -> Result<Setup> {
  let config = EnvConfig::from_env().context("Failed to read environment configuration")?;
  match manifest {
    Some(path) => {
      let manifest = MatrixManifest::load(path)?;
      manifest
        .into_setup(&config)
        .with_context(|| format!("Invalid matrix manifest: {}", path.display()))
    }
    None => preset::floatzone_setup(&config).context("Failed to assemble built-in matrix"),
  }
}
