//! Top-level orchestration of one intercepted invocation.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::dispatch;
use crate::error::InterceptError;
use crate::extract;
use crate::identity;
use crate::importcfg;
use crate::invocation::{classify, Invocation, ToolStage};
use crate::modify::Modifier;
use crate::queries;
use crate::rewrite;

/// Flag marking a standard-library compilation batch.
const STD_FLAG: &str = "-std";

/// Extension of source files eligible for rewriting.
const SOURCE_EXTENSION: &str = "go";

/// Behavior knobs for an interception run.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Skip imports that cannot be resolved to an artifact instead of
    /// failing the invocation. Off by default: an unresolvable import means
    /// the rewritten code cannot compile, and guessing is worse than
    /// aborting.
    pub skip_unresolved: bool,
}

/// Runs one intercepted invocation to completion and returns the process
/// exit code to terminate with.
///
/// Every fatal condition propagates here as an error; the caller prints it
/// and exits non-zero. Cleanup of the invocation's temporary directory is
/// tied to scope exit, so it runs on the success and error paths alike.
pub fn run<M: Modifier + Sync + ?Sized>(
    invocation: &Invocation,
    modifier: &M,
    options: &Options,
) -> Result<i32, InterceptError> {
    match classify(invocation) {
        ToolStage::VersionProbe => {
            debug!(tool = %invocation.tool().display(), "version probe");
            let line = identity::forged_version_line(invocation.tool(), invocation.tool_args())?;
            println!("{line}");
            Ok(0)
        }
        ToolStage::OtherStage => {
            debug!(tool = %invocation.tool().display(), "pass-through stage");
            dispatch::run_tool(invocation.tool(), invocation.tool_args())
        }
        ToolStage::CompileStep => run_compile(invocation, modifier, options),
    }
}

/// Handles a per-file compile step: extract, guard, rewrite, patch, dispatch.
fn run_compile<M: Modifier + Sync + ?Sized>(
    invocation: &Invocation,
    modifier: &M,
    options: &Options,
) -> Result<i32, InterceptError> {
    let args = invocation.tool_args();
    let (files, splice_index) = extract::compile_file_list(args, invocation.args_offset())?;

    if !files.is_empty() {
        if !extension_and_std_guards_pass(&files, args) {
            info!("batch not eligible for rewriting, passing through");
            return dispatch::run_tool(invocation.tool(), args);
        }
        let root = project_root(invocation)?;
        if !all_under_root(&files, &root) {
            info!(root = %root.display(), "batch has files outside the project, passing through");
            return dispatch::run_tool(invocation.tool(), args);
        }
    }

    // Owns every rewritten copy for the rest of the invocation; removed on
    // drop whether dispatch is reached or an error unwinds first.
    let tmp_dir = tempfile::Builder::new()
        .prefix("toolex")
        .tempdir()
        .map_err(|e| InterceptError::io(std::env::temp_dir(), e))?;

    let new_argv = rewrite_and_patch(
        tmp_dir.path(),
        invocation,
        &files,
        splice_index,
        modifier,
        options,
        queries::list_export_artifacts,
    )?;

    dispatch::run_tool(
        Path::new(&new_argv[invocation.tool_index()]),
        &new_argv[invocation.tool_index() + 1..],
    )
}

/// Rewrites the batch, patches the manifest with the union of the recovered
/// import sets, and splices the rewritten paths into the argument vector.
fn rewrite_and_patch<M, R>(
    tmp_dir: &Path,
    invocation: &Invocation,
    files: &[String],
    splice_index: usize,
    modifier: &M,
    options: &Options,
    resolve: R,
) -> Result<Vec<String>, InterceptError>
where
    M: Modifier + Sync + ?Sized,
    R: Fn(&str) -> Result<std::collections::HashMap<String, String>, InterceptError>,
{
    let rewritten = rewrite::rewrite_batch(tmp_dir, files, modifier)?;

    // Deduplicated union across the batch; manifest writes happen strictly
    // after the rewrite join barrier so an import shared by two files is
    // appended once.
    let import_union: BTreeSet<&str> = rewritten
        .iter()
        .flat_map(|r| r.imports.iter().map(|i| i.path.as_str()))
        .collect();

    if !import_union.is_empty() {
        let manifest = importcfg::importcfg_path(invocation.tool_args())?;
        importcfg::patch(&manifest, import_union, resolve, options)?;
    }

    let new_files: Vec<String> = rewritten
        .iter()
        .map(|r| r.new_path.display().to_string())
        .collect();
    Ok(dispatch::splice_args(invocation.argv(), splice_index, &new_files))
}

/// Cheap per-batch guards: source extension and the standard-library flag.
fn extension_and_std_guards_pass(files: &[String], args: &[String]) -> bool {
    if args.iter().any(|a| a == STD_FLAG) {
        return false;
    }
    files.iter().all(|f| {
        Path::new(f)
            .extension()
            .is_some_and(|ext| ext == SOURCE_EXTENSION)
    })
}

/// Returns `true` if every file in the batch lives under the project root.
fn all_under_root(files: &[String], root: &Path) -> bool {
    files.iter().all(|f| Path::new(f).starts_with(root))
}

/// Resolves the project root: the explicit working-directory argument when
/// present, otherwise the build system's module root.
fn project_root(invocation: &Invocation) -> Result<PathBuf, InterceptError> {
    match invocation.project_root_arg() {
        Some(root) => Ok(root.to_path_buf()),
        None => queries::module_root(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modify::Unchanged;
    use std::collections::HashMap;
    use toolex_ast::{RewriteContext, SourceUnit};

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn guards_reject_non_source_extension() {
        let files = strings(&["/p/a.go", "/p/b.txt"]);
        assert!(!extension_and_std_guards_pass(&files, &[]));
    }

    #[test]
    fn guards_reject_std_batches() {
        let files = strings(&["/p/a.go"]);
        assert!(!extension_and_std_guards_pass(&files, &strings(&["-std"])));
    }

    #[test]
    fn guards_accept_source_files() {
        let files = strings(&["/p/a.go", "/p/sub/b.go"]);
        assert!(extension_and_std_guards_pass(
            &files,
            &strings(&["-o", "x.a", "-pack"])
        ));
    }

    #[test]
    fn root_guard_rejects_outside_files() {
        let files = strings(&["/project/a.go", "/gocache/dep/b.go"]);
        assert!(!all_under_root(&files, Path::new("/project")));
    }

    #[test]
    fn root_guard_accepts_nested_files() {
        let files = strings(&["/project/a.go", "/project/internal/b.go"]);
        assert!(all_under_root(&files, Path::new("/project")));
    }

    #[test]
    fn ineligible_batch_dispatches_original_invocation() {
        // `true` stands in for the real tool; the batch has a non-source
        // file, so nothing is rewritten and nothing external is queried.
        let inv = Invocation::parse(strings(&[
            "toolex", "true", "-o", "x.a", "-pack", "/p/a.go", "/p/b.txt",
        ]))
        .unwrap();
        let code = run_compile(&inv, &Unchanged, &Options::default()).unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn other_stage_passes_through() {
        let inv = Invocation::parse(strings(&["toolex", "true", "whatever"])).unwrap();
        let code = run(&inv, &Unchanged, &Options::default()).unwrap();
        assert_eq!(code, 0);
    }

    /// Adds a `pkgx`-referencing declaration to files whose package is `a`.
    struct InjectIntoPackageA;

    impl Modifier for InjectIntoPackageA {
        fn modify(&self, mut unit: SourceUnit, ctx: &mut RewriteContext) -> SourceUnit {
            if unit.package_name() == "a" {
                let ident = ctx.require_import("example.com/pkgx");
                unit.body_mut().push_str(&format!("\nvar _ = {ident}.X\n"));
            }
            unit
        }
    }

    #[test]
    fn two_file_batch_patches_only_the_introduced_import() {
        let project = tempfile::tempdir().unwrap();
        let tmp = tempfile::tempdir().unwrap();

        let file_a = project.path().join("a.go");
        std::fs::write(&file_a, "package a\n\nfunc A() {}\n").unwrap();
        let file_b = project.path().join("b.go");
        std::fs::write(&file_b, "package b\n\nimport \"fmt\"\n\nvar _ = fmt.Sprint(1)\n").unwrap();

        let manifest = project.path().join("importcfg");
        std::fs::write(&manifest, "packagefile fmt=/cache/b002/_pkg_.a\n").unwrap();

        let argv = strings(&[
            "toolex",
            "/go/pkg/tool/compile",
            "-o",
            "x.a",
            "-importcfg",
            manifest.to_str().unwrap(),
            "-pack",
            file_a.to_str().unwrap(),
            file_b.to_str().unwrap(),
        ]);
        let inv = Invocation::parse(argv.clone()).unwrap();
        let (files, splice_index) =
            extract::compile_file_list(inv.tool_args(), inv.args_offset()).unwrap();

        let resolve = |_: &str| -> Result<HashMap<String, String>, InterceptError> {
            Ok(HashMap::from([(
                "example.com/pkgx".to_string(),
                "/cache/b031/_pkg_.a".to_string(),
            )]))
        };
        let new_argv = rewrite_and_patch(
            tmp.path(),
            &inv,
            &files,
            splice_index,
            &InjectIntoPackageA,
            &Options::default(),
            resolve,
        )
        .unwrap();

        // The manifest gains exactly the introduced import; file B's
        // untouched import set produces no changes.
        let content = std::fs::read_to_string(&manifest).unwrap();
        assert_eq!(
            content,
            "packagefile fmt=/cache/b002/_pkg_.a\npackagefile example.com/pkgx=/cache/b031/_pkg_.a\n"
        );

        // Argument count is preserved and the trailing paths now point at
        // the rewritten copies.
        assert_eq!(new_argv.len(), argv.len());
        assert_eq!(new_argv[..splice_index], argv[..splice_index]);
        assert_eq!(
            Path::new(&new_argv[splice_index]),
            tmp.path().join("a.go")
        );
        assert_eq!(
            Path::new(&new_argv[splice_index + 1]),
            tmp.path().join("b.go")
        );

        // The rewritten copy of A actually references the new import.
        let rewritten_a = std::fs::read_to_string(tmp.path().join("a.go")).unwrap();
        assert!(rewritten_a.contains("example.com/pkgx"));
        assert!(rewritten_a.starts_with(&format!("/*line {}:1:1*/", file_a.display())));
    }

    #[test]
    fn empty_file_list_dispatches_unchanged_arguments() {
        let inv = Invocation::parse(strings(&["toolex", "true", "-o", "x.a", "-pack"])).unwrap();
        let code = run_compile(&inv, &Unchanged, &Options::default()).unwrap();
        assert_eq!(code, 0);
    }
}
