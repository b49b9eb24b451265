//! Splitter configuration.

use serde::{Deserialize, Serialize};

use crate::ir::CALL_PACKED;

/// Naming and calling conventions for extracted kernels.
///
/// Deserializable so drivers can carry it in their own config files;
/// missing fields fall back to the defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Appended to the host name, followed by the extraction index.
    pub kernel_suffix: String,
    /// Intrinsic the host calls to launch a kernel by name.
    pub packed_call: String,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            kernel_suffix: "_kernel".to_string(),
            packed_call: CALL_PACKED.to_string(),
        }
    }
}

impl SplitConfig {
    pub fn with_kernel_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.kernel_suffix = suffix.into();
        self
    }

    pub fn with_packed_call(mut self, name: impl Into<String>) -> Self {
        self.packed_call = name.into();
        self
    }

    /// Name of the `index`-th kernel extracted from `host`.
    pub fn kernel_name(&self, host: &str, index: usize) -> String {
        format!("{}{}{}", host, self.kernel_suffix, index)
    }
}
