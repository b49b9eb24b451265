//! Use/def analysis with unreferenced-let elimination.
//!
//! One forward walk over a statement records, for every variable, whether
//! it is bound inside the tree and how often it is read. Variables read
//! but never bound are *free*: they must be supplied from outside, and
//! they are reported in first-encounter order. The same walk drops `let`
//! bindings whose variable ends up unread and whose value is pure.
//!
//! The walk is order sensitive. A binding registers its variable before
//! the body is visited; the bound value of a `let` is visited only after
//! its body, and only if the binding survives.

use std::collections::{HashMap, HashSet};

use crate::error::PassError;
use crate::ir::{
    attr, has_side_effect, walk_expr, walk_stmt, AttrNode, Expr, ExprNode, IterVar, Mutator,
    Stmt, StmtNode, Var,
};


/// How a variable has been seen so far.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum VarUsage {
    /// Bound in the tree, or seeded from outside; counts the reads.
    Bound(usize),
    /// Read without a binding; already in the free list.
    Free,
}

/// Outcome of one analysis run.
#[derive(Debug)]
pub struct UseDefResult {
    /// The input with unreferenced pure lets removed.
    pub body: Stmt,
    /// Variables read but not bound, in first-encounter order.
    pub undefined: Vec<Var>,
    /// Thread axes defined by `thread_extent` annotations, in order.
    pub thread_axis: Vec<IterVar>,
    /// Extent of each entry of `thread_axis`.
    pub thread_extent: Vec<Expr>,
    usage: HashMap<Var, VarUsage>,
}

impl UseDefResult {
    /// Number of reads of a bound or seeded variable. `None` for free or
    /// unseen variables.
    pub fn use_count(&self, var: &Var) -> Option<usize> {
        match self.usage.get(var) {
            Some(VarUsage::Bound(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn is_free(&self, var: &Var) -> bool {
        self.usage.get(var) == Some(&VarUsage::Free)
    }
}

/// The analyzer. Configure, then consume with [`UseDefAnalysis::analyze`].
pub struct UseDefAnalysis {
    /// Whether `thread_extent` values are analyzed too. Off when the
    /// extents are supplied by the launching call rather than the body.
    visit_thread_extent: bool,
    usage: HashMap<Var, VarUsage>,
    defined: HashSet<Var>,
    undefined: Vec<Var>,
    thread_axis: Vec<IterVar>,
    thread_extent: Vec<Expr>,
}

impl Default for UseDefAnalysis {
    fn default() -> Self {
        Self::new()
    }
}

impl UseDefAnalysis {
    pub fn new() -> Self {
        Self {
            visit_thread_extent: true,
            usage: HashMap::new(),
            defined: HashSet::new(),
            undefined: Vec::new(),
            thread_axis: Vec::new(),
            thread_extent: Vec::new(),
        }
    }

    /// Treat `vars` as supplied from outside: their reads are counted and
    /// they are never reported free.
    pub fn with_seeds(mut self, vars: &[Var]) -> Self {
        for v in vars {
            self.usage.insert(v.clone(), VarUsage::Bound(0));
        }
        self
    }

    pub fn with_thread_extent_visit(mut self, visit: bool) -> Self {
        self.visit_thread_extent = visit;
        self
    }

    pub fn analyze(mut self, stmt: &Stmt) -> Result<UseDefResult, PassError> {
        let body = self.visit_stmt(stmt)?;
        Ok(UseDefResult {
            body,
            undefined: self.undefined,
            thread_axis: self.thread_axis,
            thread_extent: self.thread_extent,
            usage: self.usage,
        })
    }

    fn handle_def(&mut self, var: &Var) -> Result<(), PassError> {
        if self.defined.contains(var) {
            return Err(PassError::Redefinition {
                var: var.name_hint().to_string(),
            });
        }
        if self.usage.contains_key(var) {
            return Err(PassError::UseBeforeDef {
                var: var.name_hint().to_string(),
            });
        }
        self.usage.insert(var.clone(), VarUsage::Bound(0));
        self.defined.insert(var.clone());
        Ok(())
    }

    fn handle_use(&mut self, var: &Var) {
        match self.usage.get_mut(var) {
            Some(VarUsage::Bound(n)) => *n += 1,
            Some(VarUsage::Free) => {}
            None => {
                self.undefined.push(var.clone());
                self.usage.insert(var.clone(), VarUsage::Free);
            }
        }
    }

    /// True once `var` is bound and nothing has read it.
    fn unreferenced(&self, var: &Var) -> bool {
        self.usage.get(var) == Some(&VarUsage::Bound(0))
    }

    fn visit_thread_extent_attr(
        &mut self,
        stmt: &Stmt,
        node: &AttrNode,
        value: &Expr,
        body: &Stmt,
    ) -> Result<Stmt, PassError> {
        let AttrNode::IterVar(iv) = node else {
            return Err(PassError::ThreadExtentWithoutAxis);
        };
        if iv.thread_tag().is_empty() {
            return Err(PassError::UntaggedThreadAxis {
                var: iv.var().name_hint().to_string(),
            });
        }
        // The same axis may be annotated again; the first one defines it.
        if !self.usage.contains_key(iv.var()) {
            self.handle_def(iv.var())?;
            self.thread_axis.push(iv.clone());
            self.thread_extent.push(value.clone());
        }

        let new_value = if self.visit_thread_extent {
            self.visit_expr(value)?
        } else {
            value.clone()
        };
        let new_body = self.visit_stmt(body)?;
        if new_value.same_as(value) && new_body.same_as(body) {
            return Ok(stmt.clone());
        }
        Ok(Stmt::thread_extent(iv, new_value, new_body))
    }
}

impl Mutator for UseDefAnalysis {
    type Error = PassError;

    fn visit_stmt(&mut self, stmt: &Stmt) -> Result<Stmt, PassError> {
        match stmt.node() {
            StmtNode::AttrStmt {
                node,
                key,
                value,
                body,
            } if key == attr::THREAD_EXTENT => {
                self.visit_thread_extent_attr(stmt, node, value, body)
            }
            StmtNode::LetStmt { var, value, body } => {
                self.handle_def(var)?;
                let new_body = self.visit_stmt(body)?;
                if self.unreferenced(var) && !has_side_effect(value) {
                    tracing::trace!(var = %var, "dropping unreferenced let");
                    return Ok(new_body);
                }
                let new_value = self.visit_expr(value)?;
                if new_body.same_as(body) && new_value.same_as(value) {
                    return Ok(stmt.clone());
                }
                Ok(Stmt::let_stmt(var, new_value, new_body))
            }
            StmtNode::For { loop_var, .. } => {
                self.handle_def(loop_var)?;
                walk_stmt(self, stmt)
            }
            StmtNode::Allocate { buffer_var, .. } => {
                self.handle_def(buffer_var)?;
                walk_stmt(self, stmt)
            }
            StmtNode::Store { buffer_var, .. } => {
                self.handle_use(buffer_var);
                walk_stmt(self, stmt)
            }
            _ => walk_stmt(self, stmt),
        }
    }

    fn visit_expr(&mut self, expr: &Expr) -> Result<Expr, PassError> {
        match expr.node() {
            ExprNode::Let { var, value, body } => {
                self.handle_def(var)?;
                let new_body = self.visit_expr(body)?;
                if self.unreferenced(var) && !has_side_effect(value) {
                    tracing::trace!(var = %var, "dropping unreferenced let");
                    return Ok(new_body);
                }
                let new_value = self.visit_expr(value)?;
                if new_body.same_as(body) && new_value.same_as(value) {
                    return Ok(expr.clone());
                }
                Ok(Expr::let_in(var, new_value, new_body))
            }
            ExprNode::Var(v) => {
                self.handle_use(v);
                Ok(expr.clone())
            }
            ExprNode::Load { buffer_var, .. } => {
                self.handle_use(buffer_var);
                walk_expr(self, expr)
            }
            _ => walk_expr(self, expr),
        }
    }
}

/// Analyze `stmt` with `seeds` treated as externally supplied.
pub fn analyze_use_def(stmt: &Stmt, seeds: &[Var]) -> Result<UseDefResult, PassError> {
    UseDefAnalysis::new().with_seeds(seeds).analyze(stmt)
}

/// Variables `stmt` reads that are neither bound in it nor in `args`.
///
/// `thread_extent` values are not counted: a launch evaluates them on the
/// caller's side, so a kernel body is closed over its own parameters even
/// when an extent names a host variable.
pub fn free_variables(stmt: &Stmt, args: &[Var]) -> Result<Vec<Var>, PassError> {
    let result = UseDefAnalysis::new()
        .with_seeds(args)
        .with_thread_extent_visit(false)
        .analyze(stmt)?;
    Ok(result.undefined)
}
