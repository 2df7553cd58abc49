//! Error taxonomy for the interception core.

use std::path::PathBuf;

use toolex_ast::AstError;

/// Errors that abort an interception invocation.
///
/// Every variant is fatal for the whole batch: a half-applied rewrite would
/// leave the real compiler operating on an inconsistent temporary file set,
/// so there is no local recovery or retry. The only recoverable conditions
/// (classification ambiguity and batch ineligibility) are not errors; they
/// fall back to unmodified pass-through before any of these can occur.
#[derive(Debug, thiserror::Error)]
pub enum InterceptError {
    /// The observed argument shape does not match the toolchain convention.
    #[error("argument shape not understood: {reason}")]
    ProtocolMismatch {
        /// What was expected and not found.
        reason: String,
    },

    /// A subprocess invoked for identity, listing, or root resolution failed.
    #[error("external query `{command}` failed: {reason}")]
    ExternalQuery {
        /// The command that was run.
        command: String,
        /// Exit status or launch failure description.
        reason: String,
    },

    /// A file could not be parsed, modified, or reserialized.
    #[error("rewrite of {path} failed: {source}")]
    Rewrite {
        /// The source file being rewritten.
        path: PathBuf,
        /// The underlying parse or restore error.
        #[source]
        source: AstError,
    },

    /// An import introduced by the rewrite cannot be mapped to an artifact.
    #[error("import `{import_path}` not found after resolving")]
    UnresolvedImport {
        /// The import path that could not be satisfied.
        import_path: String,
    },

    /// An I/O error on a file this system owns or patches.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

impl InterceptError {
    /// Convenience constructor for [`InterceptError::ProtocolMismatch`].
    pub fn protocol(reason: impl Into<String>) -> Self {
        Self::ProtocolMismatch {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for [`InterceptError::Io`].
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
