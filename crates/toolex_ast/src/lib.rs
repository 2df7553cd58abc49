//! Surface parsing and restoration for Go source files.
//!
//! This crate is the parse-modify-reserialize substrate used by the
//! interception core. It structures exactly what rewriting needs — the
//! package clause and the import declarations — and keeps every other byte
//! of the file verbatim, so comments and formatting survive the round trip
//! without a full-fidelity printer.
//!
//! A [`SourceUnit`] that is parsed and restored without modification
//! reproduces the original file byte-for-byte. When a modifier adds imports
//! (directly via [`SourceUnit::add_import`] or indirectly via
//! [`RewriteContext::require_import`]), the import block is regenerated as a
//! single grouped declaration.

#![warn(missing_docs)]

mod error;
mod parse;
mod restore;
mod unit;

pub use error::AstError;
pub use parse::{parse_file, parse_str};
pub use restore::restore;
pub use unit::{ImportSpec, RewriteContext, SourceUnit};
