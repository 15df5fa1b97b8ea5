use std::path::Path;

use anyhow::{Result, bail};
use owo_colors::{OwoColorize, Stream};
use sanmatrix_lib::flags::Stage;
use sanmatrix_lib::matrix::ResolvedBuild;
use sanmatrix_lib::util::hash::Hashable;
use serde::Serialize;
use tracing::info;

use crate::output::{OutputFormat, print_json, print_stat, print_success, symbols, truncate_hash};

#[derive(Serialize)]
struct PlanOutput<'a> {
  fingerprint: String,
  builds: &'a [ResolvedBuild],
}

pub fn cmd_plan(
  manifest: Option<&Path>,
  variant: Option<&str>,
  suite: Option<&str>,
  verbose: bool,
  output: OutputFormat,
) -> Result<()> {
  let setup = super::load_setup(manifest)?.filter(variant, suite);
  if setup.is_empty() {
    bail!("no (variant, target) pairs match the given filters");
  }

  let resolved = setup.resolve()?;
  let fingerprint = resolved.compute_hash()?;
  info!(pairs = resolved.builds.len(), fingerprint = %fingerprint, "resolved matrix");

  if output.is_json() {
    return print_json(&PlanOutput {
      fingerprint: fingerprint.0,
      builds: &resolved.builds,
    });
  }

  for build in &resolved.builds {
    print_build(build, verbose);
  }

  print_success(&format!(
    "{} builds planned (fingerprint {})",
    resolved.builds.len(),
    if verbose {
      fingerprint.0.as_str()
    } else {
      truncate_hash(&fingerprint.0)
    }
  ));
  Ok(())
}

fn print_build(build: &ResolvedBuild, verbose: bool) {
  println!(
    "{} {} {}",
    build.variant.if_supports_color(Stream::Stdout, |s| s.bold()),
    symbols::ARROW,
    build.target.suite().if_supports_color(Stream::Stdout, |s| s.cyan())
  );

  let ctx = &build.context;
  if let Some(cc) = ctx.cc() {
    print_stat("CC", &cc.display().to_string());
  }
  if let Some(cxx) = ctx.cxx() {
    print_stat("CXX", &cxx.display().to_string());
  }
  for stage in Stage::ALL {
    let flags = ctx.flags(stage);
    if !flags.is_empty() {
      print_stat(stage.as_str(), &flags.to_string());
    }
  }
  for (key, value) in ctx.runenv() {
    print_stat("env", &format!("{}={}", key, value));
  }
  if let Some(cores) = ctx.openmp_cores() {
    print_stat("openmp", &format!("{} threads", cores));
  }
  if let Some(affinity) = ctx.affinity() {
    print_stat("affinity", &affinity.to_string());
  }
  if verbose {
    let target = &build.target;
    if let Some(source) = target.source() {
      print_stat("source", &format!("{} ({})", source.location, source.kind));
    }
    if !target.patches().is_empty() {
      print_stat("patches", &target.patches().join(", "));
    }
    for (key, value) in target.params() {
      print_stat("param", &format!("{}={}", key, value));
    }
  }
  println!();
}
