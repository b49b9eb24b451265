//! SSA repair: give every rebinding of an already-bound variable a fresh
//! identity.
//!
//! Passes that duplicate subtrees (inlining the same body at two call
//! sites, unrolling) produce trees where one `Var` is bound more than once.
//! The converter walks the tree in evaluation order, keeps the first
//! binding of each variable, and for every later binding allocates a fresh
//! variable with the same name hint and type. References inside the scope
//! of the rebinding are redirected to the fresh variable.
//!
//! Thread axes are left alone: a `thread_extent` annotation may legally
//! repeat for the same axis.

use std::collections::{HashMap, HashSet};
use std::convert::Infallible;

use super::expr::{Expr, ExprNode};
use super::mutator::{infallible, walk_expr, walk_stmt, Mutator};
use super::stmt::{AttrNode, Stmt, StmtNode};
use super::var::Var;

/// Collaborator that restores the single-binding invariant after a
/// rewrite. Must be identity-preserving on trees that are already SSA.
pub trait SsaConverter {
    fn convert(&self, stmt: Stmt) -> Stmt;
}

/// Default converter.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConvertSsa;

impl SsaConverter for ConvertSsa {
    fn convert(&self, stmt: Stmt) -> Stmt {
        convert_ssa(&stmt)
    }
}

/// Run SSA repair over `stmt`.
pub fn convert_ssa(stmt: &Stmt) -> Stmt {
    infallible(SsaRenamer::default().visit_stmt(stmt))
}

#[derive(Default)]
struct SsaRenamer {
    defined: HashSet<Var>,
    /// Active renamings, innermost last.
    scope: HashMap<Var, Vec<Var>>,
}

impl SsaRenamer {
    fn lookup(&self, var: &Var) -> Option<&Var> {
        self.scope.get(var).and_then(|stack| stack.last())
    }

    /// Record a binding. Returns the fresh variable when `var` was
    /// already bound, after pushing the renaming.
    fn bind(&mut self, var: &Var) -> Option<Var> {
        if self.defined.insert(var.clone()) {
            return None;
        }
        let fresh = var.copy_fresh();
        tracing::trace!(var = %var, "renaming rebound variable");
        self.scope.entry(var.clone()).or_default().push(fresh.clone());
        Some(fresh)
    }

    fn unbind(&mut self, var: &Var) {
        if let Some(stack) = self.scope.get_mut(var) {
            stack.pop();
        }
    }

    fn buffer(&self, var: &Var) -> Var {
        self.lookup(var).cloned().unwrap_or_else(|| var.clone())
    }
}

impl Mutator for SsaRenamer {
    type Error = Infallible;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Expr, Infallible> {
        match expr.node() {
            ExprNode::Var(v) => Ok(match self.lookup(v) {
                Some(renamed) => Expr::var(renamed),
                None => expr.clone(),
            }),
            ExprNode::Load {
                dtype,
                buffer_var,
                index,
                predicate,
            } => {
                let ni = self.visit_expr(index)?;
                let np = self.visit_expr(predicate)?;
                let nbuf = self.buffer(buffer_var);
                if ni.same_as(index) && np.same_as(predicate) && nbuf == *buffer_var {
                    return Ok(expr.clone());
                }
                Ok(Expr::from_node(ExprNode::Load {
                    dtype: *dtype,
                    buffer_var: nbuf,
                    index: ni,
                    predicate: np,
                }))
            }
            ExprNode::Let { var, value, body } => {
                let nv = self.visit_expr(value)?;
                match self.bind(var) {
                    Some(fresh) => {
                        let nb = self.visit_expr(body)?;
                        self.unbind(var);
                        Ok(Expr::let_in(&fresh, nv, nb))
                    }
                    None => {
                        let nb = self.visit_expr(body)?;
                        if nv.same_as(value) && nb.same_as(body) {
                            return Ok(expr.clone());
                        }
                        Ok(Expr::let_in(var, nv, nb))
                    }
                }
            }
            _ => walk_expr(self, expr),
        }
    }

    fn visit_stmt(&mut self, stmt: &Stmt) -> Result<Stmt, Infallible> {
        match stmt.node() {
            StmtNode::LetStmt { var, value, body } => {
                let nv = self.visit_expr(value)?;
                match self.bind(var) {
                    Some(fresh) => {
                        let nb = self.visit_stmt(body)?;
                        self.unbind(var);
                        Ok(Stmt::let_stmt(&fresh, nv, nb))
                    }
                    None => {
                        let nb = self.visit_stmt(body)?;
                        if nv.same_as(value) && nb.same_as(body) {
                            return Ok(stmt.clone());
                        }
                        Ok(Stmt::let_stmt(var, nv, nb))
                    }
                }
            }
            StmtNode::For {
                loop_var,
                min,
                extent,
                kind,
                body,
            } => {
                let nmin = self.visit_expr(min)?;
                let next = self.visit_expr(extent)?;
                let fresh = self.bind(loop_var);
                let nb = self.visit_stmt(body)?;
                let out_var = match &fresh {
                    Some(v) => {
                        self.unbind(loop_var);
                        v.clone()
                    }
                    None => {
                        if nmin.same_as(min) && next.same_as(extent) && nb.same_as(body) {
                            return Ok(stmt.clone());
                        }
                        loop_var.clone()
                    }
                };
                Ok(Stmt::from_node(StmtNode::For {
                    loop_var: out_var,
                    min: nmin,
                    extent: next,
                    kind: *kind,
                    body: nb,
                }))
            }
            StmtNode::Allocate {
                buffer_var,
                dtype,
                extents,
                condition,
                body,
            } => {
                let mut new_extents = Vec::with_capacity(extents.len());
                for e in extents {
                    new_extents.push(self.visit_expr(e)?);
                }
                let nc = self.visit_expr(condition)?;
                let fresh = self.bind(buffer_var);
                let nb = self.visit_stmt(body)?;
                let out_var = match &fresh {
                    Some(v) => {
                        self.unbind(buffer_var);
                        v.clone()
                    }
                    None => {
                        let extents_same =
                            new_extents.iter().zip(extents).all(|(a, b)| a.same_as(b));
                        if extents_same && nc.same_as(condition) && nb.same_as(body) {
                            return Ok(stmt.clone());
                        }
                        buffer_var.clone()
                    }
                };
                Ok(Stmt::from_node(StmtNode::Allocate {
                    buffer_var: out_var,
                    dtype: *dtype,
                    extents: new_extents,
                    condition: nc,
                    body: nb,
                }))
            }
            StmtNode::Store {
                buffer_var,
                value,
                index,
                predicate,
            } => {
                let nv = self.visit_expr(value)?;
                let ni = self.visit_expr(index)?;
                let np = self.visit_expr(predicate)?;
                let nbuf = self.buffer(buffer_var);
                if nv.same_as(value)
                    && ni.same_as(index)
                    && np.same_as(predicate)
                    && nbuf == *buffer_var
                {
                    return Ok(stmt.clone());
                }
                Ok(Stmt::from_node(StmtNode::Store {
                    buffer_var: nbuf,
                    value: nv,
                    index: ni,
                    predicate: np,
                }))
            }
            StmtNode::AttrStmt {
                node: AttrNode::Var(v),
                key,
                ..
            } => {
                let out = walk_stmt(self, stmt)?;
                let Some(renamed) = self.lookup(v).cloned() else {
                    return Ok(out);
                };
                match out.node() {
                    StmtNode::AttrStmt { value, body, .. } => Ok(Stmt::attr(
                        AttrNode::Var(renamed),
                        key.clone(),
                        value.clone(),
                        body.clone(),
                    )),
                    _ => Ok(out),
                }
            }
            _ => walk_stmt(self, stmt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::DataType;

    #[test]
    fn test_ssa_tree_is_untouched() {
        let x = Var::new("x", DataType::int(32));
        let buf = Var::new("buf", DataType::handle());
        let stmt = Stmt::let_stmt(
            &x,
            Expr::int(1),
            Stmt::store(&buf, Expr::var(&x), Expr::int(0)),
        );
        assert!(convert_ssa(&stmt).same_as(&stmt));
    }

    #[test]
    fn test_rebinding_gets_fresh_var() {
        let x = Var::new("x", DataType::int(32));
        let buf = Var::new("buf", DataType::handle());
        let first = Stmt::let_stmt(
            &x,
            Expr::int(1),
            Stmt::store(&buf, Expr::var(&x), Expr::int(0)),
        );
        let second = Stmt::let_stmt(
            &x,
            Expr::int(2),
            Stmt::store(&buf, Expr::var(&x), Expr::int(1)),
        );
        let stmt = Stmt::seq(vec![first.clone(), second]);

        let out = convert_ssa(&stmt);
        let StmtNode::Seq(parts) = out.node() else {
            panic!("expected Seq");
        };
        assert!(parts[0].same_as(&first));
        let StmtNode::LetStmt { var, body, .. } = parts[1].node() else {
            panic!("expected LetStmt");
        };
        assert_ne!(var, &x);
        assert_eq!(var.name_hint(), "x");
        let StmtNode::Store { value, .. } = body.node() else {
            panic!("expected Store");
        };
        assert_eq!(value.as_var(), Some(var));
    }

    #[test]
    fn test_renaming_is_scoped() {
        // let x = 1 in (let x = 2 in x) + x
        let x = Var::new("x", DataType::int(32));
        let inner = Expr::let_in(&x, Expr::int(2), Expr::var(&x));
        let e = Expr::let_in(&x, Expr::int(1), Expr::add(inner, Expr::var(&x)));
        let out = convert_ssa(&Stmt::evaluate(e));

        let StmtNode::Evaluate(e) = out.node() else {
            panic!("expected Evaluate");
        };
        let ExprNode::Let { var: outer, body, .. } = e.node() else {
            panic!("expected Let");
        };
        assert_eq!(outer, &x);
        let ExprNode::Binary { a, b, .. } = body.node() else {
            panic!("expected Binary");
        };
        let ExprNode::Let { var: renamed, body: inner_body, .. } = a.node() else {
            panic!("expected Let");
        };
        assert_ne!(renamed, &x);
        assert_eq!(inner_body.as_var(), Some(renamed));
        assert_eq!(b.as_var(), Some(&x));
    }
}
