//! Split device kernels out of a mixed host/device function.
//!
//! The splitter walks the host body top-down. The first `thread_extent`,
//! `pipeline_exec_scope` or `device_scope` annotation met on any path
//! starts a device region: the whole annotated subtree becomes the body of
//! a new device function and is replaced in the host by a packed call that
//! launches it by name. Regions are never nested; the walk does not look
//! inside a region once it has been taken.
//!
//! Kernel parameters are the region's free variables: handles first, then
//! scalars, each group in first-use order. The launch call passes the
//! kernel name, the parameters in the same order, then one extent per
//! thread axis.

use indexmap::IndexMap;
use rayon::prelude::*;

use crate::config::SplitConfig;
use crate::error::PassError;
use crate::ir::{
    attr, visit_stmts, walk_stmt, CallKind, DataType, Expr, FuncKind, LoweredFunc, Mutator, Stmt,
    StmtNode, Var,
};
use crate::pass::use_def::UseDefAnalysis;


/// Splits one `Mixed` function per call to [`HostDeviceSplitter::split`].
pub struct HostDeviceSplitter {
    config: SplitConfig,
    /// Host function name; kernel names derive from it.
    name: String,
    device_funcs: Vec<LoweredFunc>,
    /// Element type behind each known buffer handle.
    handle_data_type: IndexMap<Var, DataType>,
}

impl HostDeviceSplitter {
    pub fn new(config: SplitConfig) -> Self {
        Self {
            config,
            name: String::new(),
            device_funcs: Vec::new(),
            handle_data_type: IndexMap::new(),
        }
    }

    /// Returns the host function followed by the extracted kernels in
    /// extraction order.
    pub fn split(mut self, func: &LoweredFunc) -> Result<Vec<LoweredFunc>, PassError> {
        if func.kind != FuncKind::Mixed {
            return Err(PassError::AlreadySplit {
                func: func.name.clone(),
                kind: func.kind,
            });
        }
        self.name = func.name.clone();
        self.handle_data_type = func.handle_data_type.clone();
        visit_stmts(&func.body, |s| {
            if let StmtNode::Allocate {
                buffer_var, dtype, ..
            } = s.node()
            {
                self.handle_data_type.insert(buffer_var.clone(), *dtype);
            }
        });

        let body = self.visit_stmt(&func.body)?;
        tracing::debug!(
            func = %func.name,
            kernels = self.device_funcs.len(),
            "split host function"
        );

        let host = LoweredFunc {
            kind: FuncKind::Host,
            body,
            ..func.clone()
        };
        let mut out = Vec::with_capacity(1 + self.device_funcs.len());
        out.push(host);
        out.append(&mut self.device_funcs);
        Ok(out)
    }

    fn split_device_func(&mut self, region: &Stmt) -> Result<Stmt, PassError> {
        let name = self.config.kernel_name(&self.name, self.device_funcs.len());

        // Isolate the region: its extents come from the launch, not the body.
        let analysis = UseDefAnalysis::new()
            .with_thread_extent_visit(false)
            .analyze(region)?;

        let (handles, scalars): (Vec<Var>, Vec<Var>) = analysis
            .undefined
            .iter()
            .cloned()
            .partition(|v| v.dtype().is_handle());
        let mut handle_data_type = IndexMap::new();
        for v in &handles {
            if let Some(dtype) = self.handle_data_type.get(v) {
                handle_data_type.insert(v.clone(), *dtype);
            }
        }
        let args: Vec<Var> = handles.into_iter().chain(scalars).collect();

        let mut call_args = Vec::with_capacity(1 + args.len() + analysis.thread_extent.len());
        call_args.push(Expr::string(name.clone()));
        call_args.extend(args.iter().map(Expr::var));
        call_args.extend(analysis.thread_extent.iter().cloned());

        tracing::debug!(
            kernel = %name,
            args = args.len(),
            thread_axes = analysis.thread_axis.len(),
            "extracted device function"
        );

        self.device_funcs.push(LoweredFunc {
            name,
            args,
            thread_axis: analysis.thread_axis,
            handle_data_type,
            kind: FuncKind::Device,
            body: analysis.body,
        });

        Ok(Stmt::evaluate(Expr::call(
            DataType::int(32),
            self.config.packed_call.clone(),
            call_args,
            CallKind::Intrinsic,
        )))
    }
}

impl Mutator for HostDeviceSplitter {
    type Error = PassError;

    // Statement-level walk only.
    fn visit_expr(&mut self, expr: &Expr) -> Result<Expr, PassError> {
        Ok(expr.clone())
    }

    fn visit_stmt(&mut self, stmt: &Stmt) -> Result<Stmt, PassError> {
        match stmt.node() {
            StmtNode::AttrStmt { key, .. } if attr::is_device_boundary(key) => {
                self.split_device_func(stmt)
            }
            _ => walk_stmt(self, stmt),
        }
    }
}

/// Split `func` with the default configuration.
pub fn split_host_device(func: &LoweredFunc) -> Result<Vec<LoweredFunc>, PassError> {
    HostDeviceSplitter::new(SplitConfig::default()).split(func)
}

/// Split independent functions in parallel. Results keep input order.
pub fn split_host_device_all(
    funcs: &[LoweredFunc],
    config: &SplitConfig,
) -> Result<Vec<Vec<LoweredFunc>>, PassError> {
    funcs
        .par_iter()
        .map(|f| HostDeviceSplitter::new(config.clone()).split(f))
        .collect()
}
