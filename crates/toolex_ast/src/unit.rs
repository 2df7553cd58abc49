//! The parsed source unit and the rewrite context handed to modifiers.

use std::collections::BTreeSet;

/// A single import declaration entry.
///
/// Uniqueness is by `path`; the optional alias covers named (`f "fmt"`),
/// dot (`. "fmt"`), and blank (`_ "embed"`) import forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// Local alias, if the import is named. `None` for plain imports.
    pub alias: Option<String>,
    /// The import path, without surrounding quotes.
    pub path: String,
}

impl ImportSpec {
    /// Creates a plain (unaliased) import of `path`.
    pub fn plain(path: impl Into<String>) -> Self {
        Self {
            alias: None,
            path: path.into(),
        }
    }
}

/// A parsed source file: structured package clause and imports, opaque body.
///
/// `head` holds everything before the import run (leading comments and the
/// package clause), `body` everything after it, both byte-for-byte. The raw
/// text of the original import block is retained so an unmodified unit
/// restores to the exact input.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    pub(crate) name: String,
    pub(crate) package_name: String,
    pub(crate) head: String,
    pub(crate) raw_imports: Option<String>,
    pub(crate) imports: Vec<ImportSpec>,
    pub(crate) body: String,
    pub(crate) imports_dirty: bool,
}

impl SourceUnit {
    /// Display name of the file this unit was parsed from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The package name from the package clause.
    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    /// The import declarations, in source order.
    pub fn imports(&self) -> &[ImportSpec] {
        &self.imports
    }

    /// Returns `true` if an import with the given path is present.
    pub fn has_import(&self, path: &str) -> bool {
        self.imports.iter().any(|i| i.path == path)
    }

    /// Adds an import declaration unless the path is already imported.
    ///
    /// Marks the import block dirty, forcing it to be regenerated on
    /// restore.
    pub fn add_import(&mut self, alias: Option<&str>, path: &str) {
        if self.has_import(path) {
            return;
        }
        self.imports.push(ImportSpec {
            alias: alias.map(str::to_string),
            path: path.to_string(),
        });
        self.imports_dirty = true;
    }

    /// The opaque body text following the import declarations.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Mutable access to the body text for structural modification.
    pub fn body_mut(&mut self) -> &mut String {
        &mut self.body
    }
}

/// Decoration/restoration context threaded through a modifier invocation.
///
/// A modifier that injects code referencing a package it did not import
/// registers the package here; [`restore`](crate::restore) auto-inserts an
/// import declaration for every required path missing from the unit.
#[derive(Debug, Default)]
pub struct RewriteContext {
    required: BTreeSet<String>,
}

impl RewriteContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `path` as required by injected code and returns the
    /// identifier the injected code should use to reference the package
    /// (the last path segment).
    pub fn require_import(&mut self, path: &str) -> String {
        self.required.insert(path.to_string());
        path.rsplit('/').next().unwrap_or(path).to_string()
    }

    /// The required import paths, in sorted order.
    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.required.iter().map(String::as_str)
    }
}
