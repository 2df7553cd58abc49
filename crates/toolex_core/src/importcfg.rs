//! Patching of the compiler's dependency manifest (`importcfg`).
//!
//! The manifest maps import paths to compiled-artifact paths, one
//! `packagefile <name>=<path>` line each. The real compiler refuses to
//! import anything that is missing from it, so every import introduced by a
//! rewrite must be appended before dispatch. The manifest is append-only:
//! existing mappings are never overwritten, and each import path is written
//! at most once per invocation.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::InterceptError;
use crate::process::Options;

/// Flag whose value names the dependency manifest.
const IMPORTCFG_FLAG: &str = "-importcfg";

/// The raw-memory pseudo-package; it never has a manifest entry.
const RAW_MEMORY_PACKAGE: &str = "unsafe";

/// Extracts the manifest path from the compile arguments.
pub fn importcfg_path(args: &[String]) -> Result<PathBuf, InterceptError> {
    let idx = args
        .iter()
        .position(|a| a == IMPORTCFG_FLAG)
        .ok_or_else(|| InterceptError::protocol(format!("{IMPORTCFG_FLAG} flag is not found")))?;
    let value = args
        .get(idx + 1)
        .ok_or_else(|| InterceptError::protocol(format!("{IMPORTCFG_FLAG} flag has no value")))?;
    Ok(PathBuf::from(value))
}

/// Returns `true` if the manifest already maps `name`.
///
/// Fail-safe: an unreadable manifest reads as "not present", and the
/// subsequent append will surface the real I/O problem.
pub fn contains_package(manifest: &Path, name: &str) -> bool {
    let Ok(content) = std::fs::read_to_string(manifest) else {
        return false;
    };
    let pattern = format!("packagefile {name}=");
    content.lines().any(|line| line.contains(&pattern))
}

/// Appends one newline-terminated `packagefile` mapping to the manifest.
fn append_package(manifest: &Path, name: &str, artifact: &str) -> Result<(), InterceptError> {
    let mut file = OpenOptions::new()
        .append(true)
        .open(manifest)
        .map_err(|e| InterceptError::io(manifest, e))?;
    writeln!(file, "packagefile {name}={artifact}").map_err(|e| InterceptError::io(manifest, e))?;
    Ok(())
}

/// Patches the manifest with every import the batch needs.
///
/// Runs strictly after the rewrite join barrier, sequentially, over the
/// deduplicated union of the batch's import sets. Imports already present
/// are skipped; missing ones are resolved through `resolve` (production:
/// the package-listing query) and appended. An import absent from its own
/// resolution is fatal unless [`Options::skip_unresolved`] is set.
pub fn patch<I, R>(
    manifest: &Path,
    import_paths: I,
    resolve: R,
    options: &Options,
) -> Result<(), InterceptError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
    R: Fn(&str) -> Result<HashMap<String, String>, InterceptError>,
{
    for name in import_paths {
        let name = name.as_ref();
        if name == RAW_MEMORY_PACKAGE {
            continue;
        }
        if contains_package(manifest, name) {
            continue;
        }

        let resolved = resolve(name)?;
        let Some(artifact) = resolved.get(name) else {
            if options.skip_unresolved {
                warn!(import = name, "no export artifact, leaving manifest untouched");
                continue;
            }
            return Err(InterceptError::UnresolvedImport {
                import_path: name.to_string(),
            });
        };

        debug!(import = name, artifact = %artifact, manifest = %manifest.display(), "appending packagefile entry");
        append_package(manifest, name, artifact)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    fn fake_resolver(
        entries: &[(&str, &str)],
    ) -> impl Fn(&str) -> Result<HashMap<String, String>, InterceptError> {
        let map: HashMap<String, String> = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |_| Ok(map.clone())
    }

    fn manifest_with(lines: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("importcfg");
        std::fs::write(&path, lines).unwrap();
        (dir, path)
    }

    #[test]
    fn importcfg_path_extracts_value() {
        let args = strings(&["-o", "x.a", "-importcfg", "/work/b012/importcfg", "-pack"]);
        assert_eq!(
            importcfg_path(&args).unwrap(),
            PathBuf::from("/work/b012/importcfg")
        );
    }

    #[test]
    fn importcfg_path_missing_flag_errors() {
        let err = importcfg_path(&strings(&["-o", "x.a", "-pack"])).unwrap_err();
        assert!(matches!(err, InterceptError::ProtocolMismatch { .. }));
    }

    #[test]
    fn importcfg_path_flag_without_value_errors() {
        let err = importcfg_path(&strings(&["-importcfg"])).unwrap_err();
        assert!(matches!(err, InterceptError::ProtocolMismatch { .. }));
    }

    #[test]
    fn contains_package_matches_exact_mapping_prefix() {
        let (_dir, path) = manifest_with("# import config\npackagefile fmt=/cache/b002/_pkg_.a\n");
        assert!(contains_package(&path, "fmt"));
        assert!(!contains_package(&path, "fm"));
        assert!(!contains_package(&path, "os"));
    }

    #[test]
    fn contains_package_on_missing_file_is_false() {
        assert!(!contains_package(Path::new("/no/such/importcfg"), "fmt"));
    }

    #[test]
    fn patch_appends_missing_import() {
        let (_dir, path) = manifest_with("packagefile fmt=/cache/b002/_pkg_.a\n");
        let resolve = fake_resolver(&[("example.com/pkgx", "/cache/b031/_pkg_.a")]);
        patch(&path, ["example.com/pkgx"], resolve, &Options::default()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("packagefile example.com/pkgx=/cache/b031/_pkg_.a\n"));
        // The pre-existing mapping survives untouched.
        assert!(content.starts_with("packagefile fmt=/cache/b002/_pkg_.a\n"));
    }

    #[test]
    fn patch_is_idempotent() {
        let (_dir, path) = manifest_with("");
        let resolve = fake_resolver(&[("example.com/pkgx", "/cache/b031/_pkg_.a")]);
        patch(&path, ["example.com/pkgx"], &resolve, &Options::default()).unwrap();
        patch(&path, ["example.com/pkgx"], &resolve, &Options::default()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let count = content
            .lines()
            .filter(|l| l.contains("packagefile example.com/pkgx="))
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn patch_skips_present_import_without_resolving() {
        let (_dir, path) = manifest_with("packagefile fmt=/cache/b002/_pkg_.a\n");
        let resolve = |name: &str| -> Result<HashMap<String, String>, InterceptError> {
            panic!("resolver must not run for present import {name}");
        };
        patch(&path, ["fmt"], resolve, &Options::default()).unwrap();
    }

    #[test]
    fn patch_skips_raw_memory_package() {
        let (_dir, path) = manifest_with("");
        let resolve = |name: &str| -> Result<HashMap<String, String>, InterceptError> {
            panic!("resolver must not run for {name}");
        };
        patch(&path, ["unsafe"], resolve, &Options::default()).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().is_empty());
    }

    #[test]
    fn unresolved_import_is_fatal_by_default() {
        let (_dir, path) = manifest_with("");
        let resolve = fake_resolver(&[]);
        let err = patch(&path, ["example.com/ghost"], resolve, &Options::default()).unwrap_err();
        assert!(matches!(err, InterceptError::UnresolvedImport { .. }));
    }

    #[test]
    fn unresolved_import_skipped_under_lenient_policy() {
        let (_dir, path) = manifest_with("");
        let resolve = fake_resolver(&[]);
        let options = Options {
            skip_unresolved: true,
        };
        patch(&path, ["example.com/ghost"], resolve, &options).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().is_empty());
    }

    #[test]
    fn appended_entries_are_newline_terminated() {
        let (_dir, path) = manifest_with("");
        let resolve = fake_resolver(&[("a", "/p/a.a"), ("b", "/p/b.a")]);
        patch(&path, ["a", "b"], resolve, &Options::default()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "packagefile a=/p/a.a\npackagefile b=/p/b.a\n");
    }
}
