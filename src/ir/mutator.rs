//! Post-order tree rewriter with identity-preserving short-circuit.
//!
//! A pass implements [`Mutator`], overrides `visit_expr` / `visit_stmt`,
//! matches the variants it cares about and hands everything else to
//! [`walk_expr`] / [`walk_stmt`]. The walkers rewrite children first and
//! rebuild a node only when at least one child came back as a different
//! object; otherwise the original `Arc` is returned. Callers compare
//! results with `same_as` to learn whether anything changed.

use std::convert::Infallible;

use super::expr::{Expr, ExprNode};
use super::stmt::{Stmt, StmtNode};

pub trait Mutator {
    /// Error raised by the pass hooks. The walkers themselves never fail.
    type Error;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Expr, Self::Error> {
        walk_expr(self, expr)
    }

    fn visit_stmt(&mut self, stmt: &Stmt) -> Result<Stmt, Self::Error> {
        walk_stmt(self, stmt)
    }
}

/// Unwrap the result of a mutator whose hooks cannot fail.
pub fn infallible<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}

// ─── Expressions ──────────────────────────────────────────────────

/// Rewrite every child of `expr` through `m`, rebuilding only on change.
pub fn walk_expr<M: Mutator + ?Sized>(m: &mut M, expr: &Expr) -> Result<Expr, M::Error> {
    let out = match expr.node() {
        ExprNode::IntImm { .. }
        | ExprNode::FloatImm { .. }
        | ExprNode::StringImm(_)
        | ExprNode::Var(_) => return Ok(expr.clone()),
        ExprNode::Binary { op, a, b } => {
            let na = m.visit_expr(a)?;
            let nb = m.visit_expr(b)?;
            if na.same_as(a) && nb.same_as(b) {
                return Ok(expr.clone());
            }
            Expr::binary(*op, na, nb)
        }
        ExprNode::Not(a) => {
            let na = m.visit_expr(a)?;
            if na.same_as(a) {
                return Ok(expr.clone());
            }
            Expr::not(na)
        }
        ExprNode::Select {
            cond,
            true_value,
            false_value,
        } => {
            let nc = m.visit_expr(cond)?;
            let nt = m.visit_expr(true_value)?;
            let nf = m.visit_expr(false_value)?;
            if nc.same_as(cond) && nt.same_as(true_value) && nf.same_as(false_value) {
                return Ok(expr.clone());
            }
            Expr::select(nc, nt, nf)
        }
        ExprNode::Cast { dtype, value } => {
            let nv = m.visit_expr(value)?;
            if nv.same_as(value) {
                return Ok(expr.clone());
            }
            Expr::cast(*dtype, nv)
        }
        ExprNode::Load {
            dtype,
            buffer_var,
            index,
            predicate,
        } => {
            let ni = m.visit_expr(index)?;
            let np = m.visit_expr(predicate)?;
            if ni.same_as(index) && np.same_as(predicate) {
                return Ok(expr.clone());
            }
            Expr::from_node(ExprNode::Load {
                dtype: *dtype,
                buffer_var: buffer_var.clone(),
                index: ni,
                predicate: np,
            })
        }
        ExprNode::Let { var, value, body } => {
            let nv = m.visit_expr(value)?;
            let nb = m.visit_expr(body)?;
            if nv.same_as(value) && nb.same_as(body) {
                return Ok(expr.clone());
            }
            Expr::let_in(var, nv, nb)
        }
        ExprNode::Call {
            dtype,
            name,
            args,
            call_kind,
            func,
            value_index,
        } => match walk_exprs(m, args)? {
            None => return Ok(expr.clone()),
            Some(new_args) => Expr::from_node(ExprNode::Call {
                dtype: *dtype,
                name: name.clone(),
                args: new_args,
                call_kind: *call_kind,
                func: func.clone(),
                value_index: *value_index,
            }),
        },
    };
    Ok(out)
}

/// Rewrite a list of expressions. `None` means every element came back
/// unchanged.
pub fn walk_exprs<M: Mutator + ?Sized>(
    m: &mut M,
    exprs: &[Expr],
) -> Result<Option<Vec<Expr>>, M::Error> {
    let mut out = Vec::with_capacity(exprs.len());
    let mut changed = false;
    for e in exprs {
        let ne = m.visit_expr(e)?;
        changed |= !ne.same_as(e);
        out.push(ne);
    }
    Ok(if changed { Some(out) } else { None })
}

// ─── Statements ───────────────────────────────────────────────────

/// Rewrite every child of `stmt` through `m`, rebuilding only on change.
pub fn walk_stmt<M: Mutator + ?Sized>(m: &mut M, stmt: &Stmt) -> Result<Stmt, M::Error> {
    let out = match stmt.node() {
        StmtNode::LetStmt { var, value, body } => {
            let nv = m.visit_expr(value)?;
            let nb = m.visit_stmt(body)?;
            if nv.same_as(value) && nb.same_as(body) {
                return Ok(stmt.clone());
            }
            Stmt::let_stmt(var, nv, nb)
        }
        StmtNode::AttrStmt {
            node,
            key,
            value,
            body,
        } => {
            let nv = m.visit_expr(value)?;
            let nb = m.visit_stmt(body)?;
            if nv.same_as(value) && nb.same_as(body) {
                return Ok(stmt.clone());
            }
            Stmt::attr(node.clone(), key.clone(), nv, nb)
        }
        StmtNode::AssertStmt {
            condition,
            message,
            body,
        } => {
            let nc = m.visit_expr(condition)?;
            let nm = m.visit_expr(message)?;
            let nb = m.visit_stmt(body)?;
            if nc.same_as(condition) && nm.same_as(message) && nb.same_as(body) {
                return Ok(stmt.clone());
            }
            Stmt::from_node(StmtNode::AssertStmt {
                condition: nc,
                message: nm,
                body: nb,
            })
        }
        StmtNode::For {
            loop_var,
            min,
            extent,
            kind,
            body,
        } => {
            let nmin = m.visit_expr(min)?;
            let next = m.visit_expr(extent)?;
            let nb = m.visit_stmt(body)?;
            if nmin.same_as(min) && next.same_as(extent) && nb.same_as(body) {
                return Ok(stmt.clone());
            }
            Stmt::from_node(StmtNode::For {
                loop_var: loop_var.clone(),
                min: nmin,
                extent: next,
                kind: *kind,
                body: nb,
            })
        }
        StmtNode::Allocate {
            buffer_var,
            dtype,
            extents,
            condition,
            body,
        } => {
            let new_extents = walk_exprs(m, extents)?;
            let nc = m.visit_expr(condition)?;
            let nb = m.visit_stmt(body)?;
            if new_extents.is_none() && nc.same_as(condition) && nb.same_as(body) {
                return Ok(stmt.clone());
            }
            Stmt::from_node(StmtNode::Allocate {
                buffer_var: buffer_var.clone(),
                dtype: *dtype,
                extents: new_extents.unwrap_or_else(|| extents.clone()),
                condition: nc,
                body: nb,
            })
        }
        StmtNode::Store {
            buffer_var,
            value,
            index,
            predicate,
        } => {
            let nv = m.visit_expr(value)?;
            let ni = m.visit_expr(index)?;
            let np = m.visit_expr(predicate)?;
            if nv.same_as(value) && ni.same_as(index) && np.same_as(predicate) {
                return Ok(stmt.clone());
            }
            Stmt::from_node(StmtNode::Store {
                buffer_var: buffer_var.clone(),
                value: nv,
                index: ni,
                predicate: np,
            })
        }
        StmtNode::IfThenElse {
            condition,
            then_case,
            else_case,
        } => {
            let nc = m.visit_expr(condition)?;
            let nt = m.visit_stmt(then_case)?;
            let ne = match else_case {
                Some(e) => Some(m.visit_stmt(e)?),
                None => None,
            };
            let else_same = match (&ne, else_case) {
                (Some(a), Some(b)) => a.same_as(b),
                _ => true,
            };
            if nc.same_as(condition) && nt.same_as(then_case) && else_same {
                return Ok(stmt.clone());
            }
            Stmt::if_then_else(nc, nt, ne)
        }
        StmtNode::Seq(stmts) => {
            let mut out = Vec::with_capacity(stmts.len());
            let mut changed = false;
            for s in stmts {
                let ns = m.visit_stmt(s)?;
                changed |= !ns.same_as(s);
                out.push(ns);
            }
            if !changed {
                return Ok(stmt.clone());
            }
            Stmt::seq(out)
        }
        StmtNode::Evaluate(value) => {
            let nv = m.visit_expr(value)?;
            if nv.same_as(value) {
                return Ok(stmt.clone());
            }
            Stmt::evaluate(nv)
        }
    };
    Ok(out)
}

// ─── Read-only walk ───────────────────────────────────────────────

struct StmtVisitor<F> {
    f: F,
}

impl<F: FnMut(&Stmt)> Mutator for StmtVisitor<F> {
    type Error = Infallible;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Expr, Infallible> {
        Ok(expr.clone())
    }

    fn visit_stmt(&mut self, stmt: &Stmt) -> Result<Stmt, Infallible> {
        (self.f)(stmt);
        walk_stmt(self, stmt)
    }
}

/// Call `f` on every statement of `stmt`, parents before children.
pub fn visit_stmts(stmt: &Stmt, f: impl FnMut(&Stmt)) {
    let mut visitor = StmtVisitor { f };
    infallible(visitor.visit_stmt(stmt));
}
