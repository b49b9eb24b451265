//! Inline calls to a single-output producer.
//!
//! Every `Halide` call that reads `func` is replaced by the producer's
//! body with the call's arguments bound to the body's parameters. When all
//! arguments are pure they are substituted straight into the body; a pure
//! expression may be evaluated any number of times. When any argument has a
//! side effect, the parameters are bound with nested `let`s instead, so
//! each argument is evaluated exactly once and in argument order.
//!
//! Inlining the same body twice duplicates its bindings, so a changed tree
//! goes through SSA repair before it is returned.

use std::collections::HashMap;

use crate::error::PassError;
use crate::ir::{
    has_side_effect, substitute, walk_expr, ConvertSsa, Expr, ExprNode, FunctionRef, Mutator,
    SsaConverter, Stmt, Var,
};

#[cfg(test)]
mod tests;

struct Inliner<'a> {
    func: &'a FunctionRef,
    params: &'a [Var],
    body: &'a Expr,
    sites: usize,
}

impl Inliner<'_> {
    fn expand(&self, args: &[Expr]) -> Expr {
        if args.iter().any(has_side_effect) {
            // Outermost let binds the first argument.
            return self
                .params
                .iter()
                .zip(args)
                .rev()
                .fold(self.body.clone(), |acc, (param, arg)| {
                    Expr::let_in(param, arg.clone(), acc)
                });
        }
        let vmap: HashMap<Var, Expr> = self
            .params
            .iter()
            .cloned()
            .zip(args.iter().cloned())
            .collect();
        substitute(self.body, &vmap)
    }
}

impl Mutator for Inliner<'_> {
    type Error = PassError;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Expr, PassError> {
        let expr = walk_expr(self, expr)?;
        let ExprNode::Call {
            func: Some(callee),
            args,
            value_index,
            ..
        } = expr.node()
        else {
            return Ok(expr);
        };
        if callee != self.func {
            return Ok(expr);
        }
        if *value_index != 0 {
            return Err(PassError::InvalidOutputIndex {
                func: callee.name().to_string(),
                index: *value_index,
            });
        }
        if args.len() != self.params.len() {
            return Err(PassError::ArityMismatch {
                func: callee.name().to_string(),
                expected: self.params.len(),
                found: args.len(),
            });
        }
        self.sites += 1;
        Ok(self.expand(args))
    }
}

/// Inline every call to `func` in `stmt`, repairing SSA with the default
/// converter.
pub fn inline(
    stmt: &Stmt,
    func: &FunctionRef,
    params: &[Var],
    body: &Expr,
) -> Result<Stmt, PassError> {
    inline_with(stmt, func, params, body, &ConvertSsa)
}

/// [`inline`] with a caller-supplied SSA converter.
pub fn inline_with(
    stmt: &Stmt,
    func: &FunctionRef,
    params: &[Var],
    body: &Expr,
    ssa: &dyn SsaConverter,
) -> Result<Stmt, PassError> {
    if func.num_outputs() != 1 {
        return Err(PassError::MultiOutputInline {
            func: func.name().to_string(),
            outputs: func.num_outputs(),
        });
    }
    let mut inliner = Inliner {
        func,
        params,
        body,
        sites: 0,
    };
    let out = inliner.visit_stmt(stmt)?;
    if out.same_as(stmt) {
        return Ok(out);
    }
    tracing::debug!(func = func.name(), sites = inliner.sites, "inlined call sites");
    Ok(ssa.convert(out))
}
