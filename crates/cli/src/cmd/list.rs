use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use crate::output::{OutputFormat, print_info, print_json, print_stat};

#[derive(Serialize)]
struct ListOutput<'a> {
  variants: Vec<&'a str>,
  targets: Vec<TargetSummary<'a>>,
  pairs: usize,
}

#[derive(Serialize)]
struct TargetSummary<'a> {
  suite: &'a str,
  source: Option<&'a str>,
  patches: &'a [String],
}

pub fn cmd_list(manifest: Option<&Path>, output: OutputFormat) -> Result<()> {
  let setup = super::load_setup(manifest)?;

  let summary = ListOutput {
    variants: setup.variants().map(|v| v.name()).collect(),
    targets: setup
      .targets()
      .iter()
      .map(|t| TargetSummary {
        suite: t.suite(),
        source: t.source().map(|s| s.location.as_str()),
        patches: t.patches(),
      })
      .collect(),
    pairs: setup.len(),
  };

  if output.is_json() {
    return print_json(&summary);
  }

  print_info(&format!("Variants ({})", summary.variants.len()));
  for name in &summary.variants {
    println!("  {}", name);
  }

  print_info(&format!("Targets ({})", summary.targets.len()));
  for target in &summary.targets {
    println!("  {}", target.suite);
    match target.source {
      Some(location) => print_stat("  source", location),
      None => print_stat("  source", "bundled"),
    }
    if !target.patches.is_empty() {
      print_stat("  patches", &target.patches.join(", "));
    }
  }

  println!();
  print_stat("Pairs", &summary.pairs.to_string());
  Ok(())
}
