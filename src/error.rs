//! Errors raised by the IR passes.
//!
//! Every variant is a compiler-internal invariant violation: the pass
//! aborts and the compilation attempt should stop.

use thiserror::Error;

use crate::ir::FuncKind;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PassError {
    /// The function to inline declares more or fewer than one output.
    #[error("can only inline single-output operations, `{func}` has {outputs} outputs")]
    MultiOutputInline { func: String, outputs: usize },

    /// A call site passes a different number of arguments than the body
    /// being inlined declares.
    #[error("call to `{func}` passes {found} arguments, inlined body expects {expected}")]
    ArityMismatch {
        func: String,
        expected: usize,
        found: usize,
    },

    /// A call site reads an output other than the first.
    #[error("call to `{func}` reads output {index}, only output 0 can be inlined")]
    InvalidOutputIndex { func: String, index: usize },

    /// A variable is bound twice.
    #[error("variable `{var}` has already been defined, the statement is not SSA")]
    Redefinition { var: String },

    /// A variable is bound after it was already recorded as used.
    #[error("variable `{var}` has been used before definition")]
    UseBeforeDef { var: String },

    /// Splitting a function that is not `Mixed`.
    #[error("function `{func}` is already split (kind: {kind})")]
    AlreadySplit { func: String, kind: FuncKind },

    /// A `thread_extent` axis without a thread tag.
    #[error("thread axis `{var}` has an empty thread tag")]
    UntaggedThreadAxis { var: String },

    /// A `thread_extent` annotation attached to something other than an
    /// iteration variable.
    #[error("thread_extent annotation is not attached to a thread axis")]
    ThreadExtentWithoutAxis,
}
