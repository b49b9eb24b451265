//! Transformation passes over lowered functions.
//!
//! - `use_def`: free-variable discovery and unreferenced-let removal
//! - `inline`: substitute a single-output producer at its call sites
//! - `split_host_device`: carve device kernels out of a mixed function

pub mod inline;
pub mod split_host_device;
pub mod use_def;

pub use inline::{inline, inline_with};
pub use split_host_device::{split_host_device, split_host_device_all, HostDeviceSplitter};
pub use use_def::{analyze_use_def, free_variables, UseDefAnalysis, UseDefResult};
