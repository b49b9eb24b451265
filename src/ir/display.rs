//! Textual IR dump.
//!
//! Expressions print on one line; statements print one per line with two
//! spaces of indentation per nesting level. Used in trace logs and tests,
//! not meant to be parsed back.

use std::fmt::{self, Write};

use super::expr::{Expr, ExprNode};
use super::func::LoweredFunc;
use super::stmt::{AttrNode, ForKind, Stmt, StmtNode};
use super::types::DataType;

// ─── Expressions ──────────────────────────────────────────────────

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node() {
            ExprNode::IntImm { dtype, value } => {
                if *dtype == DataType::int(32) {
                    write!(f, "{}", value)
                } else {
                    write!(f, "({}){}", dtype, value)
                }
            }
            ExprNode::FloatImm { value, .. } => write!(f, "{}f", value),
            ExprNode::StringImm(s) => write!(f, "{:?}", s),
            ExprNode::Var(v) => write!(f, "{}", v),
            ExprNode::Binary { op, a, b } => {
                if op.is_function_style() {
                    write!(f, "{}({}, {})", op.symbol(), a, b)
                } else {
                    write!(f, "({} {} {})", a, op.symbol(), b)
                }
            }
            ExprNode::Not(a) => write!(f, "!{}", a),
            ExprNode::Select {
                cond,
                true_value,
                false_value,
            } => write!(f, "select({}, {}, {})", cond, true_value, false_value),
            ExprNode::Cast { dtype, value } => write!(f, "{}({})", dtype, value),
            ExprNode::Load {
                buffer_var,
                index,
                predicate,
                ..
            } => {
                write!(f, "{}[{}]", buffer_var, index)?;
                if !is_const_true(predicate) {
                    write!(f, " if {}", predicate)?;
                }
                Ok(())
            }
            ExprNode::Let { var, value, body } => {
                write!(f, "(let {} = {} in {})", var, value, body)
            }
            ExprNode::Call { name, args, .. } => {
                write!(f, "{}(", name)?;
                write_list(f, args)?;
                write!(f, ")")
            }
        }
    }
}

fn is_const_true(expr: &Expr) -> bool {
    matches!(expr.node(), ExprNode::IntImm { dtype, value: 1 } if dtype.is_bool())
}

fn write_list<T: fmt::Display>(f: &mut impl Write, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

// ─── Statements ───────────────────────────────────────────────────

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        print_stmt(f, self, 0)
    }
}

fn pad(f: &mut impl Write, indent: usize) -> fmt::Result {
    for _ in 0..indent {
        f.write_str("  ")?;
    }
    Ok(())
}

fn print_stmt(f: &mut impl Write, stmt: &Stmt, indent: usize) -> fmt::Result {
    match stmt.node() {
        StmtNode::LetStmt { var, value, body } => {
            pad(f, indent)?;
            writeln!(f, "let {} = {}", var, value)?;
            print_stmt(f, body, indent)
        }
        StmtNode::AttrStmt {
            node,
            key,
            value,
            body,
        } => {
            pad(f, indent)?;
            match node {
                AttrNode::IterVar(iv) => writeln!(f, "// attr [{}] {} = {}", iv, key, value)?,
                AttrNode::Var(v) => writeln!(f, "// attr [{}] {} = {}", v, key, value)?,
                AttrNode::Str(s) => writeln!(f, "// attr [{:?}] {} = {}", s, key, value)?,
                AttrNode::None => writeln!(f, "// attr {} = {}", key, value)?,
            }
            print_stmt(f, body, indent)
        }
        StmtNode::AssertStmt {
            condition,
            message,
            body,
        } => {
            pad(f, indent)?;
            writeln!(f, "assert({}, {})", condition, message)?;
            print_stmt(f, body, indent)
        }
        StmtNode::For {
            loop_var,
            min,
            extent,
            kind,
            body,
        } => {
            let keyword = match kind {
                ForKind::Serial => "for",
                ForKind::Parallel => "parallel",
                ForKind::Vectorized => "vectorized",
                ForKind::Unrolled => "unrolled",
            };
            pad(f, indent)?;
            writeln!(f, "{} ({}, {}, {}) {{", keyword, loop_var, min, extent)?;
            print_stmt(f, body, indent + 1)?;
            pad(f, indent)?;
            writeln!(f, "}}")
        }
        StmtNode::Allocate {
            buffer_var,
            dtype,
            extents,
            body,
            ..
        } => {
            pad(f, indent)?;
            write!(f, "allocate {}[{}", buffer_var, dtype)?;
            for e in extents {
                write!(f, " * {}", e)?;
            }
            writeln!(f, "]")?;
            print_stmt(f, body, indent)
        }
        StmtNode::Store {
            buffer_var,
            value,
            index,
            predicate,
        } => {
            pad(f, indent)?;
            write!(f, "{}[{}] = {}", buffer_var, index, value)?;
            if !is_const_true(predicate) {
                write!(f, " if {}", predicate)?;
            }
            writeln!(f)
        }
        StmtNode::IfThenElse {
            condition,
            then_case,
            else_case,
        } => {
            pad(f, indent)?;
            writeln!(f, "if ({}) {{", condition)?;
            print_stmt(f, then_case, indent + 1)?;
            if let Some(else_case) = else_case {
                pad(f, indent)?;
                writeln!(f, "}} else {{")?;
                print_stmt(f, else_case, indent + 1)?;
            }
            pad(f, indent)?;
            writeln!(f, "}}")
        }
        StmtNode::Seq(stmts) => {
            for s in stmts {
                print_stmt(f, s, indent)?;
            }
            Ok(())
        }
        StmtNode::Evaluate(value) => {
            pad(f, indent)?;
            writeln!(f, "{}", value)
        }
    }
}

// ─── Functions ────────────────────────────────────────────────────

impl fmt::Display for LoweredFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} func {}(", self.kind, self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", arg, arg.dtype())?;
        }
        write!(f, ")")?;
        if !self.thread_axis.is_empty() {
            write!(f, " launch [")?;
            for (i, iv) in self.thread_axis.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", iv.thread_tag())?;
            }
            write!(f, "]")?;
        }
        writeln!(f, " {{")?;
        print_stmt(f, &self.body, 1)?;
        writeln!(f, "}}")
    }
}
