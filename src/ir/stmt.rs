//! Statement nodes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::expr::Expr;
use super::types::DataType;
use super::var::{IterVar, Var};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ForKind {
    Serial,
    Parallel,
    Vectorized,
    Unrolled,
}

/// The object an `AttrStmt` annotates.
#[derive(Clone, Debug)]
pub enum AttrNode {
    IterVar(IterVar),
    Var(Var),
    Str(String),
    None,
}

#[derive(Debug)]
pub enum StmtNode {
    LetStmt {
        var: Var,
        value: Expr,
        body: Stmt,
    },
    AttrStmt {
        node: AttrNode,
        key: String,
        value: Expr,
        body: Stmt,
    },
    AssertStmt {
        condition: Expr,
        message: Expr,
        body: Stmt,
    },
    For {
        loop_var: Var,
        min: Expr,
        extent: Expr,
        kind: ForKind,
        body: Stmt,
    },
    Allocate {
        buffer_var: Var,
        dtype: DataType,
        extents: Vec<Expr>,
        condition: Expr,
        body: Stmt,
    },
    Store {
        buffer_var: Var,
        value: Expr,
        index: Expr,
        predicate: Expr,
    },
    IfThenElse {
        condition: Expr,
        then_case: Stmt,
        else_case: Option<Stmt>,
    },
    Seq(Vec<Stmt>),
    Evaluate(Expr),
}

/// An immutable, structurally shared statement.
#[derive(Clone, Debug)]
pub struct Stmt(Arc<StmtNode>);

impl Stmt {
    pub fn from_node(node: StmtNode) -> Self {
        Self(Arc::new(node))
    }

    pub fn node(&self) -> &StmtNode {
        &self.0
    }

    /// Reference identity, not structural equality.
    pub fn same_as(&self, other: &Stmt) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    // ── Constructors ──────────────────────────────────────────────

    pub fn let_stmt(var: &Var, value: Expr, body: Stmt) -> Self {
        Self::from_node(StmtNode::LetStmt {
            var: var.clone(),
            value,
            body,
        })
    }

    pub fn attr(node: AttrNode, key: impl Into<String>, value: Expr, body: Stmt) -> Self {
        Self::from_node(StmtNode::AttrStmt {
            node,
            key: key.into(),
            value,
            body,
        })
    }

    /// Bind `axis` to a hardware thread index ranging over `extent`.
    pub fn thread_extent(axis: &IterVar, extent: Expr, body: Stmt) -> Self {
        Self::attr(
            AttrNode::IterVar(axis.clone()),
            super::attr::THREAD_EXTENT,
            extent,
            body,
        )
    }

    pub fn assert(condition: Expr, message: impl Into<String>, body: Stmt) -> Self {
        Self::from_node(StmtNode::AssertStmt {
            condition,
            message: Expr::string(message),
            body,
        })
    }

    /// Serial loop over `[min, min + extent)`.
    pub fn for_loop(loop_var: &Var, min: Expr, extent: Expr, body: Stmt) -> Self {
        Self::from_node(StmtNode::For {
            loop_var: loop_var.clone(),
            min,
            extent,
            kind: ForKind::Serial,
            body,
        })
    }

    pub fn allocate(buffer_var: &Var, dtype: DataType, extents: Vec<Expr>, body: Stmt) -> Self {
        Self::from_node(StmtNode::Allocate {
            buffer_var: buffer_var.clone(),
            dtype,
            extents,
            condition: Expr::const_true(),
            body,
        })
    }

    pub fn store(buffer_var: &Var, value: Expr, index: Expr) -> Self {
        Self::from_node(StmtNode::Store {
            buffer_var: buffer_var.clone(),
            value,
            index,
            predicate: Expr::const_true(),
        })
    }

    pub fn if_then_else(condition: Expr, then_case: Stmt, else_case: Option<Stmt>) -> Self {
        Self::from_node(StmtNode::IfThenElse {
            condition,
            then_case,
            else_case,
        })
    }

    pub fn seq(stmts: Vec<Stmt>) -> Self {
        Self::from_node(StmtNode::Seq(stmts))
    }

    pub fn evaluate(value: Expr) -> Self {
        Self::from_node(StmtNode::Evaluate(value))
    }

    /// `Evaluate(0)`, the empty statement.
    pub fn no_op() -> Self {
        Self::evaluate(Expr::int(0))
    }
}
