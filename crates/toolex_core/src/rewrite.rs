//! The per-file parse-modify-reserialize pipeline.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::debug;

use toolex_ast::{parse_file, restore, ImportSpec, RewriteContext};

use crate::error::InterceptError;
use crate::modify::Modifier;

/// The result of rewriting one source file.
#[derive(Debug, Clone)]
pub struct RewrittenFile {
    /// Path of the rewritten copy inside the invocation's temp directory.
    pub new_path: PathBuf,
    /// The authoritative post-modification import set, recovered by
    /// re-parsing the written file.
    pub imports: Vec<ImportSpec>,
}

/// Rewrites a single file into `tmp_dir`.
///
/// Steps, strictly ordered: parse the original, run the modifier with a
/// fresh context, restore with import auto-insertion, prepend the line
/// directive mapping the output back to the original path, write to
/// `tmp_dir/<basename>`, then re-parse the written file. The final parse is
/// required for correctness: imports inserted during restore are not
/// observable on the in-memory unit.
pub fn rewrite_file<M: Modifier + ?Sized>(
    tmp_dir: &Path,
    path: &Path,
    modifier: &M,
) -> Result<RewrittenFile, InterceptError> {
    let rewrite_err = |source| InterceptError::Rewrite {
        path: path.to_path_buf(),
        source,
    };

    let unit = parse_file(path).map_err(rewrite_err)?;
    let mut ctx = RewriteContext::new();
    let unit = modifier.modify(unit, &mut ctx);
    let text = restore(&unit, &ctx);

    // The directive must precede the first byte of the restored text so the
    // real compiler reports diagnostics against the original file, not the
    // temporary copy that is deleted when the invocation ends.
    let output = format!("/*line {}:1:1*/{}", path.display(), text);

    let file_name = path
        .file_name()
        .ok_or_else(|| InterceptError::protocol(format!("{} has no file name", path.display())))?;
    let new_path = tmp_dir.join(file_name);
    std::fs::write(&new_path, output).map_err(|e| InterceptError::io(&new_path, e))?;

    let written = parse_file(&new_path).map_err(rewrite_err)?;
    debug!(
        original = %path.display(),
        rewritten = %new_path.display(),
        imports = written.imports().len(),
        "rewrote file"
    );

    Ok(RewrittenFile {
        new_path,
        imports: written.imports().to_vec(),
    })
}

/// Rewrites a batch of files in parallel.
///
/// Each file runs as an independent task; results are collected positionally
/// so the output order matches `files`, and the first failing task aborts
/// the whole batch. Collection is the join barrier: the caller only sees the
/// results after every task has finished.
pub fn rewrite_batch<M: Modifier + Sync + ?Sized>(
    tmp_dir: &Path,
    files: &[String],
    modifier: &M,
) -> Result<Vec<RewrittenFile>, InterceptError> {
    files
        .par_iter()
        .map(|file| rewrite_file(tmp_dir, Path::new(file), modifier))
        .collect()
}
