//! Side-effect query.

use super::expr::{Expr, ExprNode};

/// True if evaluating `expr` may have an observable effect, i.e. it
/// reaches a call whose kind is not pure. Loads are not effects.
pub fn has_side_effect(expr: &Expr) -> bool {
    match expr.node() {
        ExprNode::IntImm { .. }
        | ExprNode::FloatImm { .. }
        | ExprNode::StringImm(_)
        | ExprNode::Var(_) => false,
        ExprNode::Binary { a, b, .. } => has_side_effect(a) || has_side_effect(b),
        ExprNode::Not(a) | ExprNode::Cast { value: a, .. } => has_side_effect(a),
        ExprNode::Select {
            cond,
            true_value,
            false_value,
        } => has_side_effect(cond) || has_side_effect(true_value) || has_side_effect(false_value),
        ExprNode::Load {
            index, predicate, ..
        } => has_side_effect(index) || has_side_effect(predicate),
        ExprNode::Let { value, body, .. } => has_side_effect(value) || has_side_effect(body),
        ExprNode::Call {
            call_kind, args, ..
        } => !call_kind.is_pure() || args.iter().any(has_side_effect),
    }
}
