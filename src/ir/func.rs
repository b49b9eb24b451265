//! Lowered functions: the unit the splitter consumes and produces.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::stmt::Stmt;
use super::types::DataType;
use super::var::{IterVar, Var};

/// Where a lowered function runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FuncKind {
    /// Host code with device regions still embedded.
    Mixed,
    Host,
    Device,
}

impl fmt::Display for FuncKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FuncKind::Mixed => "mixed",
            FuncKind::Host => "host",
            FuncKind::Device => "device",
        };
        f.write_str(s)
    }
}

/// A function after scheduling and lowering.
#[derive(Clone, Debug)]
pub struct LoweredFunc {
    pub name: String,
    /// Formal parameters in calling order.
    pub args: Vec<Var>,
    /// Thread axes the body is launched over, in first-definition order.
    pub thread_axis: Vec<IterVar>,
    /// Best-known element type behind each handle parameter.
    pub handle_data_type: IndexMap<Var, DataType>,
    pub kind: FuncKind,
    pub body: Stmt,
}

impl LoweredFunc {
    /// A fresh `Mixed` function, ready for splitting.
    pub fn mixed(name: impl Into<String>, args: Vec<Var>, body: Stmt) -> Self {
        Self {
            name: name.into(),
            args,
            thread_axis: Vec::new(),
            handle_data_type: IndexMap::new(),
            kind: FuncKind::Mixed,
            body,
        }
    }

    pub fn with_handle_type(mut self, var: &Var, dtype: DataType) -> Self {
        self.handle_data_type.insert(var.clone(), dtype);
        self
    }
}
