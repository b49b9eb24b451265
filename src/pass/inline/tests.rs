use std::cell::Cell;

use super::*;
use crate::ir::{CallKind, DataType, StmtNode};

fn int_var(name: &str) -> Var {
    Var::new(name, DataType::int(32))
}

fn rand_call() -> Expr {
    Expr::call(DataType::int(32), "rand", vec![], CallKind::Extern)
}

/// `f(x, y) = x * y`
fn producer() -> (FunctionRef, Vec<Var>, Expr) {
    let f = FunctionRef::new("f", 1);
    let x = int_var("x");
    let y = int_var("y");
    let body = Expr::mul(Expr::var(&x), Expr::var(&y));
    (f, vec![x, y], body)
}

fn call_f(f: &FunctionRef, args: Vec<Expr>) -> Expr {
    Expr::call_func(DataType::int(32), f, 0, args)
}

fn store_value(stmt: &Stmt) -> &Expr {
    match stmt.node() {
        StmtNode::Store { value, .. } => value,
        other => panic!("expected Store, got {:?}", other),
    }
}

struct CountingSsa {
    calls: Cell<usize>,
}

impl SsaConverter for CountingSsa {
    fn convert(&self, stmt: Stmt) -> Stmt {
        self.calls.set(self.calls.get() + 1);
        stmt
    }
}

// ── No-op ──

#[test]
fn test_tree_without_target_call_is_returned_as_is() {
    let (f, params, body) = producer();
    let other = FunctionRef::new("f", 1);
    let b = Var::new("B", DataType::handle());
    let i = int_var("i");
    let stmt = Stmt::store(&b, call_f(&other, vec![Expr::var(&i), Expr::int(2)]), Expr::var(&i));

    let ssa = CountingSsa { calls: Cell::new(0) };
    let out = inline_with(&stmt, &f, &params, &body, &ssa).unwrap();
    assert!(out.same_as(&stmt));
    assert_eq!(ssa.calls.get(), 0);
}

// ── Substitution strategies ──

#[test]
fn test_pure_arguments_are_substituted() {
    let (f, params, body) = producer();
    let b = Var::new("B", DataType::handle());
    let i = int_var("i");
    let stmt = Stmt::store(&b, call_f(&f, vec![Expr::var(&i), Expr::int(2)]), Expr::var(&i));

    let out = inline(&stmt, &f, &params, &body).unwrap();
    assert!(!out.same_as(&stmt));
    let value = store_value(&out);
    assert!(!matches!(value.node(), ExprNode::Let { .. }));
    assert_eq!(value.to_string(), "(i * 2)");
}

#[test]
fn test_side_effecting_arguments_bind_in_order() {
    let (f, params, body) = producer();
    let b = Var::new("B", DataType::handle());
    let i = int_var("i");
    let stmt = Stmt::store(&b, call_f(&f, vec![rand_call(), Expr::var(&i)]), Expr::int(0));

    let out = inline(&stmt, &f, &params, &body).unwrap();
    let value = store_value(&out);
    let ExprNode::Let {
        var: first,
        value: first_value,
        body: inner,
    } = value.node()
    else {
        panic!("expected outer Let, got {}", value);
    };
    assert_eq!(first, &params[0]);
    assert_eq!(first_value.to_string(), "rand()");
    let ExprNode::Let {
        var: second,
        value: second_value,
        body: innermost,
    } = inner.node()
    else {
        panic!("expected inner Let, got {}", inner);
    };
    assert_eq!(second, &params[1]);
    assert_eq!(second_value.as_var(), Some(&i));
    assert!(innermost.same_as(&body));
    assert_eq!(value.to_string(), "(let x = rand() in (let y = i in (x * y)))");
}

#[test]
fn test_nested_calls_inline_inside_out() {
    let f = FunctionRef::new("inc", 1);
    let x = int_var("x");
    let body = Expr::add(Expr::var(&x), Expr::int(1));
    let i = int_var("i");
    let nested = call_f(&f, vec![call_f(&f, vec![Expr::var(&i)])]);
    let stmt = Stmt::evaluate(nested);

    let out = inline(&stmt, &f, &[x], &body).unwrap();
    assert_eq!(out.to_string(), "((i + 1) + 1)\n");
}

// ── SSA repair ──

#[test]
fn test_two_sites_get_distinct_bindings() {
    let f = FunctionRef::new("inc", 1);
    let x = int_var("x");
    let body = Expr::add(Expr::var(&x), Expr::int(1));
    let b = Var::new("B", DataType::handle());
    let stmt = Stmt::seq(vec![
        Stmt::store(&b, call_f(&f, vec![rand_call()]), Expr::int(0)),
        Stmt::store(&b, call_f(&f, vec![rand_call()]), Expr::int(1)),
    ]);

    let out = inline(&stmt, &f, &[x.clone()], &body).unwrap();
    let StmtNode::Seq(parts) = out.node() else {
        panic!("expected Seq");
    };
    let bound: Vec<Var> = parts
        .iter()
        .map(|s| match store_value(s).node() {
            ExprNode::Let { var, body, .. } => {
                // The body must read the binding it sits under.
                let ExprNode::Binary { a, .. } = body.node() else {
                    panic!("expected Binary");
                };
                assert_eq!(a.as_var(), Some(var));
                var.clone()
            }
            _ => panic!("expected Let"),
        })
        .collect();
    assert_eq!(bound[0], x);
    assert_ne!(bound[1], x);
    assert_eq!(bound[1].name_hint(), "x");
    assert_eq!(bound[0].to_string(), bound[1].to_string());
}

#[test]
fn test_changed_tree_goes_through_converter() {
    let (f, params, body) = producer();
    let stmt = Stmt::evaluate(call_f(&f, vec![Expr::int(3), Expr::int(4)]));
    let ssa = CountingSsa { calls: Cell::new(0) };
    let out = inline_with(&stmt, &f, &params, &body, &ssa).unwrap();
    assert_eq!(ssa.calls.get(), 1);
    assert_eq!(out.to_string(), "(3 * 4)\n");
}

// ── Errors ──

#[test]
fn test_multi_output_function_is_rejected() {
    let f = FunctionRef::new("pair", 2);
    let stmt = Stmt::no_op();
    let err = inline(&stmt, &f, &[], &Expr::int(0)).unwrap_err();
    assert_eq!(
        err,
        PassError::MultiOutputInline {
            func: "pair".into(),
            outputs: 2
        }
    );
}

#[test]
fn test_wrong_output_index_is_rejected() {
    let (f, params, body) = producer();
    let call = Expr::call_func(DataType::int(32), &f, 1, vec![Expr::int(1), Expr::int(2)]);
    let err = inline(&Stmt::evaluate(call), &f, &params, &body).unwrap_err();
    assert_eq!(
        err,
        PassError::InvalidOutputIndex {
            func: "f".into(),
            index: 1
        }
    );
}

#[test]
fn test_arity_mismatch_is_rejected() {
    let (f, params, body) = producer();
    let call = call_f(&f, vec![Expr::int(1)]);
    let err = inline(&Stmt::evaluate(call), &f, &params, &body).unwrap_err();
    assert_eq!(
        err,
        PassError::ArityMismatch {
            func: "f".into(),
            expected: 2,
            found: 1
        }
    );
}
