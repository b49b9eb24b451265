//! Identity-carrying IR handles: variables, thread axes, function references.
//!
//! Every handle wraps an `Arc`; equality and hashing go through the pointer,
//! never through the name. Two variables printed as `i` are different
//! variables unless they come from the same binding site.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::types::DataType;

// ─── Var ──────────────────────────────────────────────────────────

#[derive(Debug)]
struct VarNode {
    name_hint: String,
    dtype: DataType,
}

/// A variable. Cloning shares the identity.
#[derive(Clone)]
pub struct Var(Arc<VarNode>);

impl Var {
    pub fn new(name_hint: impl Into<String>, dtype: DataType) -> Self {
        Self(Arc::new(VarNode {
            name_hint: name_hint.into(),
            dtype,
        }))
    }

    /// A fresh variable with the same name hint and type.
    pub fn copy_fresh(&self) -> Self {
        Self::new(self.0.name_hint.clone(), self.0.dtype)
    }

    pub fn name_hint(&self) -> &str {
        &self.0.name_hint
    }

    pub fn dtype(&self) -> DataType {
        self.0.dtype
    }

    pub fn same_as(&self, other: &Var) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Var {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for Var {}

impl Hash for Var {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.0).hash(state);
    }
}

impl fmt::Debug for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} @{:p}", self.0.name_hint, self.0.dtype, Arc::as_ptr(&self.0))
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name_hint)
    }
}

// ─── IterVar ──────────────────────────────────────────────────────

#[derive(Debug)]
struct IterVarNode {
    var: Var,
    thread_tag: String,
}

/// A hardware-parallel iteration axis: the loop variable plus the tag of
/// the thread index it is bound to (`blockIdx.x`, `threadIdx.y`, ...).
#[derive(Clone, Debug)]
pub struct IterVar(Arc<IterVarNode>);

impl IterVar {
    pub fn new(var: Var, thread_tag: impl Into<String>) -> Self {
        Self(Arc::new(IterVarNode {
            var,
            thread_tag: thread_tag.into(),
        }))
    }

    /// Convenience: a thread axis over a fresh `int32` variable.
    pub fn thread_axis(name: &str, thread_tag: &str) -> Self {
        Self::new(Var::new(name, DataType::int(32)), thread_tag)
    }

    pub fn var(&self) -> &Var {
        &self.0.var
    }

    pub fn thread_tag(&self) -> &str {
        &self.0.thread_tag
    }

    pub fn same_as(&self, other: &IterVar) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Display for IterVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "iter_var({}, \"{}\")", self.0.var, self.0.thread_tag)
    }
}

// ─── FunctionRef ──────────────────────────────────────────────────

#[derive(Debug)]
struct OperationNode {
    name: String,
    num_outputs: usize,
}

/// Reference to a producer operation that `Halide` calls read from.
#[derive(Clone, Debug)]
pub struct FunctionRef(Arc<OperationNode>);

impl FunctionRef {
    pub fn new(name: impl Into<String>, num_outputs: usize) -> Self {
        Self(Arc::new(OperationNode {
            name: name.into(),
            num_outputs,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn num_outputs(&self) -> usize {
        self.0.num_outputs
    }

    pub fn same_as(&self, other: &FunctionRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for FunctionRef {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for FunctionRef {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_var_identity_not_name() {
        let a = Var::new("x", DataType::int(32));
        let b = Var::new("x", DataType::int(32));
        assert_ne!(a, b);
        assert_eq!(a, a.clone());

        let set: HashSet<Var> = [a.clone(), b.clone(), a.clone()].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_copy_fresh_keeps_name_and_type() {
        let a = Var::new("buf", DataType::handle());
        let b = a.copy_fresh();
        assert_ne!(a, b);
        assert_eq!(b.name_hint(), "buf");
        assert!(b.dtype().is_handle());
    }

    #[test]
    fn test_function_ref_identity() {
        let f = FunctionRef::new("compute", 1);
        let g = FunctionRef::new("compute", 1);
        assert_eq!(f, f.clone());
        assert_ne!(f, g);
    }
}
