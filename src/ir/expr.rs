//! Expression nodes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::types::DataType;
use super::var::{FunctionRef, Var};

// ─── Operators ────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Min,
    Max,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Min => "min",
            BinaryOp::Max => "max",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    /// Operators printed in call form, `min(a, b)`.
    pub fn is_function_style(self) -> bool {
        matches!(self, BinaryOp::Min | BinaryOp::Max)
    }

    /// Operators whose result is boolean regardless of operand type.
    pub fn is_predicate(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::Ne
                | BinaryOp::Lt
                | BinaryOp::Le
                | BinaryOp::Gt
                | BinaryOp::Ge
                | BinaryOp::And
                | BinaryOp::Or
        )
    }
}

/// How a call is resolved. Only the pure kinds are free of side effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallKind {
    Extern,
    PureExtern,
    /// Call into a producer operation (`func` is set).
    Halide,
    Intrinsic,
    PureIntrinsic,
}

impl CallKind {
    pub fn is_pure(self) -> bool {
        matches!(
            self,
            CallKind::PureExtern | CallKind::PureIntrinsic | CallKind::Halide
        )
    }
}

// ─── Expr ─────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ExprNode {
    IntImm {
        dtype: DataType,
        value: i64,
    },
    FloatImm {
        dtype: DataType,
        value: f64,
    },
    StringImm(String),
    Var(Var),
    Binary {
        op: BinaryOp,
        a: Expr,
        b: Expr,
    },
    Not(Expr),
    Select {
        cond: Expr,
        true_value: Expr,
        false_value: Expr,
    },
    Cast {
        dtype: DataType,
        value: Expr,
    },
    Load {
        dtype: DataType,
        buffer_var: Var,
        index: Expr,
        predicate: Expr,
    },
    Let {
        var: Var,
        value: Expr,
        body: Expr,
    },
    Call {
        dtype: DataType,
        name: String,
        args: Vec<Expr>,
        call_kind: CallKind,
        /// Producer operation for `Halide` calls.
        func: Option<FunctionRef>,
        /// Which output of `func` is read.
        value_index: usize,
    },
}

/// An immutable, structurally shared expression.
#[derive(Clone, Debug)]
pub struct Expr(Arc<ExprNode>);

impl Expr {
    pub fn from_node(node: ExprNode) -> Self {
        Self(Arc::new(node))
    }

    pub fn node(&self) -> &ExprNode {
        &self.0
    }

    /// Reference identity, not structural equality.
    pub fn same_as(&self, other: &Expr) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn dtype(&self) -> DataType {
        match self.node() {
            ExprNode::IntImm { dtype, .. }
            | ExprNode::FloatImm { dtype, .. }
            | ExprNode::Cast { dtype, .. }
            | ExprNode::Load { dtype, .. }
            | ExprNode::Call { dtype, .. } => *dtype,
            ExprNode::StringImm(_) => DataType::handle(),
            ExprNode::Var(v) => v.dtype(),
            ExprNode::Binary { op, a, .. } => {
                if op.is_predicate() {
                    DataType::bool().with_lanes(a.dtype().lanes)
                } else {
                    a.dtype()
                }
            }
            ExprNode::Not(a) => a.dtype(),
            ExprNode::Select { true_value, .. } => true_value.dtype(),
            ExprNode::Let { body, .. } => body.dtype(),
        }
    }

    /// The variable this expression names, if it is a bare reference.
    pub fn as_var(&self) -> Option<&Var> {
        match self.node() {
            ExprNode::Var(v) => Some(v),
            _ => None,
        }
    }

    // ── Constructors ──────────────────────────────────────────────

    pub fn int(value: i64) -> Self {
        Self::int_typed(DataType::int(32), value)
    }

    pub fn int_typed(dtype: DataType, value: i64) -> Self {
        Self::from_node(ExprNode::IntImm { dtype, value })
    }

    pub fn const_true() -> Self {
        Self::int_typed(DataType::bool(), 1)
    }

    pub fn float(value: f64) -> Self {
        Self::from_node(ExprNode::FloatImm {
            dtype: DataType::float(32),
            value,
        })
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::from_node(ExprNode::StringImm(value.into()))
    }

    pub fn var(var: &Var) -> Self {
        Self::from_node(ExprNode::Var(var.clone()))
    }

    pub fn binary(op: BinaryOp, a: Expr, b: Expr) -> Self {
        Self::from_node(ExprNode::Binary { op, a, b })
    }

    pub fn add(a: Expr, b: Expr) -> Self {
        Self::binary(BinaryOp::Add, a, b)
    }

    pub fn sub(a: Expr, b: Expr) -> Self {
        Self::binary(BinaryOp::Sub, a, b)
    }

    pub fn mul(a: Expr, b: Expr) -> Self {
        Self::binary(BinaryOp::Mul, a, b)
    }

    pub fn lt(a: Expr, b: Expr) -> Self {
        Self::binary(BinaryOp::Lt, a, b)
    }

    pub fn not(a: Expr) -> Self {
        Self::from_node(ExprNode::Not(a))
    }

    pub fn select(cond: Expr, true_value: Expr, false_value: Expr) -> Self {
        Self::from_node(ExprNode::Select {
            cond,
            true_value,
            false_value,
        })
    }

    pub fn cast(dtype: DataType, value: Expr) -> Self {
        Self::from_node(ExprNode::Cast { dtype, value })
    }

    /// Unpredicated load of `dtype` from `buffer_var[index]`.
    pub fn load(dtype: DataType, buffer_var: &Var, index: Expr) -> Self {
        Self::from_node(ExprNode::Load {
            dtype,
            buffer_var: buffer_var.clone(),
            index,
            predicate: Expr::const_true(),
        })
    }

    pub fn let_in(var: &Var, value: Expr, body: Expr) -> Self {
        Self::from_node(ExprNode::Let {
            var: var.clone(),
            value,
            body,
        })
    }

    pub fn call(
        dtype: DataType,
        name: impl Into<String>,
        args: Vec<Expr>,
        call_kind: CallKind,
    ) -> Self {
        Self::from_node(ExprNode::Call {
            dtype,
            name: name.into(),
            args,
            call_kind,
            func: None,
            value_index: 0,
        })
    }

    /// Read output `value_index` of producer `func` at `args`.
    pub fn call_func(
        dtype: DataType,
        func: &FunctionRef,
        value_index: usize,
        args: Vec<Expr>,
    ) -> Self {
        Self::from_node(ExprNode::Call {
            dtype,
            name: func.name().to_string(),
            args,
            call_kind: CallKind::Halide,
            func: Some(func.clone()),
            value_index,
        })
    }
}

impl From<&Var> for Expr {
    fn from(var: &Var) -> Self {
        Expr::var(var)
    }
}
