//! 编译集成：把编译服务的诊断挂到节点上

use crate::kernel::services::ports::{CompileError, CompileRequest, CompileService, Language};
use crate::models::{Diagnostic, FileData, NodeId, Problem, ProjectTree, TreeError};

/// Compiles the persisted content of `node` and returns the payload.
///
/// Diagnostics returned by the service, on success or failure, replace the
/// node's markers and problems when there are any.
pub async fn compile_file(
    tree: &mut ProjectTree,
    node: NodeId,
    service: &dyn CompileService,
    from: Language,
    to: Language,
    options: &str,
) -> Result<FileData, CompileError> {
    let source = tree
        .content(node)
        .cloned()
        .ok_or_else(|| CompileError::Transport(format!("node {:?} does not exist", node)))?;

    tracing::info!(
        node = ?node,
        from = from.as_str(),
        to = to.as_str(),
        "compiling file"
    );
    let result = service
        .compile(CompileRequest {
            source,
            from,
            to,
            options: options.to_string(),
        })
        .await;

    let diagnostics = match &result {
        Ok(output) => output.diagnostics.as_slice(),
        Err(err) => err.diagnostics(),
    };
    attach_diagnostics(tree, node, diagnostics).map_err(|err| {
        tracing::error!(node = ?node, error = %err, "cannot attach diagnostics");
        CompileError::Transport(err.to_string())
    })?;

    match result {
        Ok(output) => Ok(output.payload),
        Err(err) => {
            tracing::warn!(node = ?node, error = %err, "compilation failed");
            Err(err)
        }
    }
}

fn attach_diagnostics(
    tree: &mut ProjectTree,
    node: NodeId,
    diagnostics: &[Diagnostic],
) -> Result<(), TreeError> {
    if diagnostics.is_empty() {
        return Ok(());
    }
    let problems = diagnostics
        .iter()
        .cloned()
        .map(Problem::from_diagnostic)
        .collect();
    tree.set_markers(node, diagnostics.to_vec())?;
    tree.set_problems(node, problems)
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/compile.rs"]
mod tests;
