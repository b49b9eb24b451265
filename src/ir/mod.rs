//! Lowered loop-level IR.
//!
//! The IR is a tree of immutable, reference-counted statement and
//! expression nodes produced after scheduling and before code generation.
//! Passes never mutate a node in place: a rewrite returns a new tree that
//! shares every unmodified subtree with its input, and callers detect
//! "nothing changed" by reference identity (`same_as`).
//!
//! ```text
//! LoweredFunc (Mixed)
//!   └─ Stmt tree ── AttrStmt thread_extent / device_scope ── device region
//!                └─ host statements
//! ```

mod display;
pub mod effect;
pub mod expr;
pub mod func;
pub mod mutator;
pub mod ssa;
pub mod stmt;
pub mod substitute;
pub mod types;
pub mod var;

pub use effect::has_side_effect;
pub use expr::{BinaryOp, CallKind, Expr, ExprNode};
pub use func::{FuncKind, LoweredFunc};
pub use mutator::{infallible, visit_stmts, walk_expr, walk_exprs, walk_stmt, Mutator};
pub use ssa::{convert_ssa, ConvertSsa, SsaConverter};
pub use stmt::{AttrNode, ForKind, Stmt, StmtNode};
pub use substitute::{substitute, substitute_stmt};
pub use types::{DataType, TypeCode};
pub use var::{FunctionRef, IterVar, Var};

/// Annotation keys understood by the passes.
pub mod attr {
    /// Binds an `IterVar` to a hardware thread index; value is the extent.
    pub const THREAD_EXTENT: &str = "thread_extent";
    /// Marks a region executed by a device pipeline.
    pub const PIPELINE_EXEC_SCOPE: &str = "pipeline_exec_scope";
    /// Marks a region that must run on the accelerator.
    pub const DEVICE_SCOPE: &str = "device_scope";

    /// Keys that start a device region for the host/device splitter.
    pub const DEVICE_BOUNDARIES: [&str; 3] = [THREAD_EXTENT, PIPELINE_EXEC_SCOPE, DEVICE_SCOPE];

    pub fn is_device_boundary(key: &str) -> bool {
        DEVICE_BOUNDARIES.contains(&key)
    }
}

/// Name of the packed-call intrinsic the splitter emits by default.
pub const CALL_PACKED: &str = "tvm_call_packed";
