//! sanmatrix-lib: build-variant composition for sanitizer evaluation
//!
//! This crate turns a handful of declarative build variants and benchmark
//! targets into a reproducible experiment matrix:
//! - `Variant`: a named stack of configuration layers (compiler, optimization,
//!   instrumentation) that fills in a `BuildCtx`
//! - `TargetDescriptor`: where a benchmark suite comes from and how to patch it
//! - `Setup`: the registry whose variant x target product is handed to an
//!   execution engine

pub mod build;
pub mod config;
pub mod consts;
pub mod engine;
pub mod flags;
pub mod manifest;
pub mod matrix;
pub mod preset;
pub mod target;
pub mod util;
pub mod variant;
