//! Shallow parsing of Go source files.
//!
//! The scanner understands just enough lexical structure (line and block
//! comments, interpreted and raw string literals) to locate the package
//! clause and the contiguous run of import declarations that follows it.
//! Everything after the last import declaration is kept as an opaque body.

use std::path::Path;

use crate::error::AstError;
use crate::unit::{ImportSpec, SourceUnit};

/// Parses the Go source file at `path`.
pub fn parse_file(path: &Path) -> Result<SourceUnit, AstError> {
    let text = std::fs::read_to_string(path).map_err(|source| AstError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_str(&text, &path.display().to_string())
}

/// Parses Go source text. `name` is used in error messages only.
pub fn parse_str(text: &str, name: &str) -> Result<SourceUnit, AstError> {
    let src = text.as_bytes();

    // Package clause: first token after leading comments.
    let mut i = skip_trivia(src, 0);
    if !keyword_at(src, i, "package") {
        return Err(AstError::MissingPackageClause {
            name: name.to_string(),
        });
    }
    i = skip_trivia(src, i + "package".len());
    let (package_name, after_name) = scan_ident(src, i).ok_or(AstError::MissingPackageClause {
        name: name.to_string(),
    })?;
    let mut cursor = after_name;

    // Import run: zero or more import declarations immediately after the
    // package clause (interleaved comments belong to the head).
    let mut imports = Vec::new();
    let mut first_import: Option<usize> = None;
    loop {
        let mut probe = skip_trivia(src, cursor);
        while probe < src.len() && src[probe] == b';' {
            probe = skip_trivia(src, probe + 1);
        }
        if !keyword_at(src, probe, "import") {
            break;
        }
        let end = parse_import_decl(src, probe, name, &mut imports)?;
        first_import.get_or_insert(probe);
        cursor = end;
    }

    let (head_end, raw_imports) = match first_import {
        Some(start) => (start, Some(text[start..cursor].to_string())),
        None => (cursor, None),
    };

    Ok(SourceUnit {
        name: name.to_string(),
        package_name,
        head: text[..head_end].to_string(),
        raw_imports,
        imports,
        body: text[cursor..].to_string(),
        imports_dirty: false,
    })
}

/// Parses one import declaration starting at the `import` keyword.
/// Returns the index just past the declaration.
fn parse_import_decl(
    src: &[u8],
    start: usize,
    name: &str,
    imports: &mut Vec<ImportSpec>,
) -> Result<usize, AstError> {
    let malformed = |reason: &str| AstError::MalformedImport {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let mut i = skip_trivia(src, start + "import".len());
    if i < src.len() && src[i] == b'(' {
        i = skip_trivia(src, i + 1);
        loop {
            while i < src.len() && src[i] == b';' {
                i = skip_trivia(src, i + 1);
            }
            if i >= src.len() {
                return Err(malformed("unterminated import group"));
            }
            if src[i] == b')' {
                return Ok(i + 1);
            }
            let (spec, next) = parse_import_spec(src, i, name)?;
            imports.push(spec);
            i = skip_trivia(src, next);
        }
    } else {
        let (spec, next) = parse_import_spec(src, i, name)?;
        imports.push(spec);
        Ok(next)
    }
}

/// Parses a single `[alias] "path"` entry.
fn parse_import_spec(src: &[u8], mut i: usize, name: &str) -> Result<(ImportSpec, usize), AstError> {
    let malformed = |reason: String| AstError::MalformedImport {
        name: name.to_string(),
        reason,
    };

    let alias = if i < src.len() && src[i] == b'.' {
        i += 1;
        Some(".".to_string())
    } else if i < src.len() && src[i] != b'"' && src[i] != b'`' {
        let (ident, next) =
            scan_ident(src, i).ok_or_else(|| malformed("expected alias or path".to_string()))?;
        i = next;
        Some(ident)
    } else {
        None
    };

    i = skip_trivia(src, i);
    let (path, next) = scan_string(src, i)
        .ok_or_else(|| malformed("expected quoted import path".to_string()))?;
    Ok((ImportSpec { alias, path }, next))
}

/// Skips whitespace and comments from `i`, returning the next token index.
fn skip_trivia(src: &[u8], mut i: usize) -> usize {
    loop {
        while i < src.len() && src[i].is_ascii_whitespace() {
            i += 1;
        }
        if i + 1 < src.len() && src[i] == b'/' && src[i + 1] == b'/' {
            while i < src.len() && src[i] != b'\n' {
                i += 1;
            }
        } else if i + 1 < src.len() && src[i] == b'/' && src[i + 1] == b'*' {
            i += 2;
            while i + 1 < src.len() && !(src[i] == b'*' && src[i + 1] == b'/') {
                i += 1;
            }
            i = (i + 2).min(src.len());
        } else {
            return i;
        }
    }
}

/// Returns `true` if `kw` occurs at `i` as a complete word.
fn keyword_at(src: &[u8], i: usize, kw: &str) -> bool {
    if !src[i.min(src.len())..].starts_with(kw.as_bytes()) {
        return false;
    }
    match src.get(i + kw.len()) {
        Some(&b) => !is_ident_byte(b),
        None => true,
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Scans an identifier at `i`. Returns the identifier and the index past it.
fn scan_ident(src: &[u8], i: usize) -> Option<(String, usize)> {
    let first = *src.get(i)?;
    if !(first.is_ascii_alphabetic() || first == b'_') {
        return None;
    }
    let mut end = i + 1;
    while end < src.len() && is_ident_byte(src[end]) {
        end += 1;
    }
    Some((String::from_utf8_lossy(&src[i..end]).into_owned(), end))
}

/// Scans an interpreted (`"..."`) or raw (`` `...` ``) string literal at `i`.
/// Returns the unquoted contents and the index past the closing quote.
fn scan_string(src: &[u8], i: usize) -> Option<(String, usize)> {
    match *src.get(i)? {
        b'"' => {
            let mut j = i + 1;
            while j < src.len() {
                match src[j] {
                    b'\\' => j += 2,
                    b'"' => {
                        let value = String::from_utf8_lossy(&src[i + 1..j]).into_owned();
                        return Some((value, j + 1));
                    }
                    _ => j += 1,
                }
            }
            None
        }
        b'`' => {
            let end = src[i + 1..].iter().position(|&b| b == b'`')? + i + 1;
            let value = String::from_utf8_lossy(&src[i + 1..end]).into_owned();
            Some((value, end + 1))
        }
        _ => None,
    }
}
