//! Final argument assembly and hand-off to the real tool.

use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::error::InterceptError;

/// Replaces the trailing file-list slice of `argv` with `new_files`.
///
/// Everything before `splice_index` (the original flags, including the
/// file-list marker) is kept; replacing m files with m paths preserves the
/// total argument count.
pub fn splice_args(argv: &[String], splice_index: usize, new_files: &[String]) -> Vec<String> {
    let mut out = argv[..splice_index.min(argv.len())].to_vec();
    out.extend_from_slice(new_files);
    out
}

/// Executes the real tool with standard streams connected to the parent's
/// and returns its exit code.
///
/// A launch failure is an [`InterceptError::ExternalQuery`]; the top-level
/// handler maps it to exit code 1. Termination by signal reports as code 1.
/// No retry in either case.
pub fn run_tool(tool: &Path, args: &[String]) -> Result<i32, InterceptError> {
    debug!(tool = %tool.display(), args = args.len(), "dispatching real tool");
    let status = Command::new(tool)
        .args(args)
        .status()
        .map_err(|e| InterceptError::ExternalQuery {
            command: tool.display().to_string(),
            reason: e.to_string(),
        })?;
    Ok(status.code().unwrap_or(1))
}
