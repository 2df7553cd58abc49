//! Cache-identity forging for version probes.
//!
//! The orchestrator keys its build cache off the last whitespace-delimited
//! token of the tool's version line. Answering the probe with the real
//! tool's line unchanged would let a cached build skip this interceptor
//! entirely, so the reported identity is re-derived from both the real
//! tool's identity and the interceptor binary's own content identity: same
//! inputs always forge the same token, and rebuilding the interceptor
//! changes it, keeping intercepted and plain builds apart in the cache.

use std::path::Path;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::InterceptError;
use crate::queries;

/// Prefix of the trailing identity field on a version line.
const IDENTITY_FIELD_PREFIX: &str = "identity=";

/// Number of digest bytes kept in the forged token.
const IDENTITY_HASH_LEN: usize = 15;

/// Runs the version probe against the real tool and returns the line to
/// print on stdout.
///
/// Lines that do not match the `<toolName> version ...` shape with a
/// trailing identity field are not ours to forge and are returned verbatim.
pub fn forged_version_line(tool: &Path, args: &[String]) -> Result<String, InterceptError> {
    let line = queries::output_line(&tool.display().to_string(), args)?;
    let tool_name = tool.file_name().and_then(|n| n.to_str()).unwrap_or("");

    if !is_identity_line(&line, tool_name) {
        debug!(line = %line, "version line has no identity field, passing through");
        return Ok(line);
    }

    let own_exe = std::env::current_exe()
        .map_err(|source| InterceptError::io("<current executable>", source))?;
    let own_id = queries::buildid(&own_exe)?;
    Ok(forge_line(&line, tool_name, &own_id))
}

/// Returns `true` if `line` is a version line this interceptor must forge.
fn is_identity_line(line: &str, tool_name: &str) -> bool {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 3 || fields[0] != tool_name {
        return false;
    }
    fields[1] == "version"
        || fields
            .last()
            .is_some_and(|f| f.starts_with(IDENTITY_FIELD_PREFIX))
}

/// Forges the identity line from the probe output and the interceptor's own
/// content identity. Pure and deterministic.
///
/// The digest is truncated and base64-url-encoded; the `_/_/_/` prefix
/// imitates a structured identity without fabricating the upper-level
/// components the orchestrator never reads.
pub(crate) fn forge_line(line: &str, tool_name: &str, own_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(line.as_bytes());
    hasher.update(own_id.as_bytes());
    let digest = hasher.finalize();
    let encoded = URL_SAFE_NO_PAD.encode(&digest[..IDENTITY_HASH_LEN]);
    format!("{line} +{tool_name} {IDENTITY_FIELD_PREFIX}_/_/_/{encoded}")
}
