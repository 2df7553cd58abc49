//! Error types for source parsing.

use std::path::PathBuf;

/// Errors that can occur while parsing or reading a source file.
///
/// Parsing is deliberately shallow (package clause and import run only), so
/// the only structural failures are a missing package clause and a malformed
/// import declaration. Anything past the import run is opaque and cannot
/// fail.
#[derive(Debug, thiserror::Error)]
pub enum AstError {
    /// The file does not start with a `package <ident>` clause.
    #[error("{name}: missing package clause")]
    MissingPackageClause {
        /// Display name of the offending file.
        name: String,
    },

    /// An import declaration could not be parsed.
    #[error("{name}: malformed import declaration: {reason}")]
    MalformedImport {
        /// Display name of the offending file.
        name: String,
        /// Description of the parse failure.
        reason: String,
    },

    /// An I/O error occurred while reading the source file.
    #[error("failed reading {path}: {source}")]
    Io {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_package_clause_display() {
        let err = AstError::MissingPackageClause {
            name: "main.go".to_string(),
        };
        assert_eq!(err.to_string(), "main.go: missing package clause");
    }

    #[test]
    fn malformed_import_display() {
        let err = AstError::MalformedImport {
            name: "main.go".to_string(),
            reason: "unterminated import group".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("main.go"));
        assert!(msg.contains("unterminated import group"));
    }

    #[test]
    fn io_display() {
        let err = AstError::Io {
            path: PathBuf::from("/no/such/file.go"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("/no/such/file.go"));
    }
}
