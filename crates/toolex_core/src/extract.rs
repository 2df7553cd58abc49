//! Recovery of the trailing source-file list from the compile argument
//! vector.
//!
//! The per-file compile step lists every source file at the very end of its
//! arguments, immediately after the `-pack` flag. The splice index computed
//! here is argv-absolute: it is where rewritten paths are put back when the
//! final command is assembled.

use crate::error::InterceptError;
use crate::invocation::FILE_LIST_MARKER;

/// Extracts the source-file list and the argv-absolute splice index.
///
/// `args_offset` is the index of the first tool argument within the full
/// argument vector (it differs between the bare and working-directory launch
/// variants). A missing marker is fatal: the invocation shape is not
/// understood and cannot be safely rewritten. An empty list after the marker
/// is valid and yields a no-op rewrite.
pub fn compile_file_list(
    args: &[String],
    args_offset: usize,
) -> Result<(Vec<String>, usize), InterceptError> {
    let marker_idx = args
        .iter()
        .position(|a| a == FILE_LIST_MARKER)
        .ok_or_else(|| {
            InterceptError::protocol(format!("{FILE_LIST_MARKER} flag is not found"))
        })?;

    let files = args[marker_idx + 1..].to_vec();
    let splice_index = args_offset + marker_idx + 1;
    Ok((files, splice_index))
}
