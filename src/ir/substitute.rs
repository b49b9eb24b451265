//! Variable substitution.

use std::collections::HashMap;
use std::convert::Infallible;

use super::expr::{Expr, ExprNode};
use super::mutator::{infallible, walk_expr, walk_stmt, Mutator};
use super::stmt::{Stmt, StmtNode};
use super::var::Var;

struct Substituter<'a> {
    vmap: &'a HashMap<Var, Expr>,
}

impl Substituter<'_> {
    /// Buffer operands can only be replaced by another variable.
    fn buffer(&self, var: &Var) -> Option<Var> {
        self.vmap.get(var).and_then(|e| e.as_var()).cloned()
    }
}

impl Mutator for Substituter<'_> {
    type Error = Infallible;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Expr, Infallible> {
        match expr.node() {
            ExprNode::Var(v) => Ok(self.vmap.get(v).cloned().unwrap_or_else(|| expr.clone())),
            ExprNode::Load {
                dtype,
                buffer_var,
                ..
            } => {
                let out = walk_expr(self, expr)?;
                let Some(new_buffer) = self.buffer(buffer_var) else {
                    return Ok(out);
                };
                let ExprNode::Load {
                    index, predicate, ..
                } = out.node()
                else {
                    return Ok(out);
                };
                Ok(Expr::from_node(ExprNode::Load {
                    dtype: *dtype,
                    buffer_var: new_buffer,
                    index: index.clone(),
                    predicate: predicate.clone(),
                }))
            }
            _ => walk_expr(self, expr),
        }
    }

    fn visit_stmt(&mut self, stmt: &Stmt) -> Result<Stmt, Infallible> {
        let out = walk_stmt(self, stmt)?;
        if let StmtNode::Store {
            buffer_var,
            value,
            index,
            predicate,
        } = out.node()
        {
            if let Some(new_buffer) = self.buffer(buffer_var) {
                return Ok(Stmt::from_node(StmtNode::Store {
                    buffer_var: new_buffer,
                    value: value.clone(),
                    index: index.clone(),
                    predicate: predicate.clone(),
                }));
            }
        }
        Ok(out)
    }
}

/// Replace every reference to a key of `vmap` in `expr` by its value.
/// Returns `expr` itself when nothing matched.
pub fn substitute(expr: &Expr, vmap: &HashMap<Var, Expr>) -> Expr {
    if vmap.is_empty() {
        return expr.clone();
    }
    infallible(Substituter { vmap }.visit_expr(expr))
}

/// Statement form of [`substitute`].
pub fn substitute_stmt(stmt: &Stmt, vmap: &HashMap<Var, Expr>) -> Stmt {
    if vmap.is_empty() {
        return stmt.clone();
    }
    infallible(Substituter { vmap }.visit_stmt(stmt))
}
