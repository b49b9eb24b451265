//! Late-stage passes over lowered loop-level tensor IR.
//!
//! The IR is immutable and `Arc`-shared: a pass that changes nothing hands
//! back the very tree it was given, and callers compare with `same_as` to
//! detect that. On top of it sit three passes: use/def analysis, call
//! inlining, and host/device splitting.

pub mod config;
pub mod error;
pub mod ir;
pub mod pass;

// Re-exports for drivers
pub use config::SplitConfig;
pub use error::PassError;
pub use ir::{FuncKind, LoweredFunc};
pub use pass::{
    analyze_use_def, free_variables, inline, inline_with, split_host_device,
    split_host_device_all, HostDeviceSplitter, UseDefAnalysis, UseDefResult,
};
