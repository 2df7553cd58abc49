//! External black-box queries against the Go toolchain.
//!
//! Three commands are consumed: `go tool buildid <path>` (content identity
//! of a binary), `go env GOMOD` (module root resolution), and
//! `go list -json -deps -export -- <pkg>` (transitive packages with their
//! compiled-artifact paths, as a streamed sequence of JSON records). Any
//! non-zero exit or launch failure is fatal to the invocation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use tracing::debug;

use crate::error::InterceptError;

/// Runs a command, capturing stdout, and returns it trimmed.
pub fn output_line(program: &str, args: &[String]) -> Result<String, InterceptError> {
    let rendered = || format!("{} {}", program, args.join(" "));
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| InterceptError::ExternalQuery {
            command: rendered(),
            reason: e.to_string(),
        })?;
    if !output.status.success() {
        return Err(InterceptError::ExternalQuery {
            command: rendered(),
            reason: format!(
                "{}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Queries the content identity of the binary at `path`.
pub fn buildid(path: &Path) -> Result<String, InterceptError> {
    let args: Vec<String> = vec![
        "tool".to_string(),
        "buildid".to_string(),
        path.display().to_string(),
    ];
    output_line("go", &args)
}

/// Resolves the project's module root directory.
///
/// `go env GOMOD` reports the path of the active `go.mod`; the module root
/// is its parent directory. A blank result or the `/dev/null` sentinel means
/// no module is active, which is fatal: without a root the project-file
/// guard cannot be evaluated.
pub fn module_root() -> Result<PathBuf, InterceptError> {
    let args: Vec<String> = vec!["env".to_string(), "GOMOD".to_string()];
    let gomod = output_line("go", &args)?;
    root_from_gomod(&gomod)
}

/// Derives the module root from the `go.mod` path `go env GOMOD` reported.
fn root_from_gomod(gomod: &str) -> Result<PathBuf, InterceptError> {
    if gomod.is_empty() || gomod == "/dev/null" || gomod == "NUL" {
        return Err(InterceptError::ExternalQuery {
            command: "go env GOMOD".to_string(),
            reason: format!("no module root (got {gomod:?})"),
        });
    }
    let root = Path::new(gomod)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| InterceptError::ExternalQuery {
            command: "go env GOMOD".to_string(),
            reason: format!("{gomod} has no parent directory"),
        })?;
    Ok(root.to_path_buf())
}

/// One record of the package-listing stream.
#[derive(Debug, Deserialize)]
struct ListRecord {
    /// The import path of the package.
    #[serde(rename = "ImportPath")]
    import_path: String,
    /// Path to its compiled export artifact, if any.
    #[serde(rename = "Export", default)]
    export: Option<String>,
    /// Whether the package comes from the standard library.
    #[serde(rename = "Standard", default)]
    standard: bool,
}

/// Lists `pkg` and everything it transitively depends on, mapping each
/// import path to its compiled-artifact path.
///
/// Uses `go list -json -deps -export`; the `-export` flag is what makes the
/// artifact paths available, and the output is a concatenated stream of JSON
/// objects decoded until end-of-input. Records with no export artifact are
/// skipped (notably `unsafe`, which has nothing to link against).
pub fn list_export_artifacts(pkg: &str) -> Result<HashMap<String, String>, InterceptError> {
    let rendered = format!("go list -json -deps -export -- {pkg}");
    let output = Command::new("go")
        .args(["list", "-json", "-deps", "-export", "--", pkg])
        .output()
        .map_err(|e| InterceptError::ExternalQuery {
            command: rendered.clone(),
            reason: e.to_string(),
        })?;
    if !output.status.success() {
        return Err(InterceptError::ExternalQuery {
            command: rendered,
            reason: format!(
                "{}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    let map = decode_list_stream(&output.stdout).map_err(|e| InterceptError::ExternalQuery {
        command: rendered,
        reason: format!("parsing output: {e}"),
    })?;
    debug!(pkg, resolved = map.len(), "resolved export artifacts");
    Ok(map)
}

/// Decodes the streamed record sequence into an import-path → artifact map.
fn decode_list_stream(stdout: &[u8]) -> Result<HashMap<String, String>, serde_json::Error> {
    let mut map = HashMap::new();
    for record in serde_json::Deserializer::from_slice(stdout).into_iter::<ListRecord>() {
        let record = record?;
        let export = match record.export {
            Some(e) if !e.is_empty() => e,
            // The raw-memory pseudo-package and anything else without an
            // export artifact cannot appear in the manifest.
            _ => {
                if record.standard {
                    debug!(pkg = %record.import_path, "standard package without export, skipped");
                }
                continue;
            }
        };
        map.insert(record.import_path, export);
    }
    Ok(map)
}
