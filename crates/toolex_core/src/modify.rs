//! The pluggable modification capability.

use toolex_ast::{RewriteContext, SourceUnit};

/// A syntax-tree modification supplied by the caller.
///
/// The rewrite pipeline hands each parsed file to the modifier together with
/// the decoration/restoration context, so injected code can register the
/// packages it references via [`RewriteContext::require_import`] and have
/// the missing import declarations inserted on restore.
///
/// This is a capability, not a hierarchy: there is exactly one method and no
/// default behavior. Callers wanting several transformations compose them
/// externally and present the composition as one `Modifier`.
pub trait Modifier {
    /// Transforms one parsed source unit.
    fn modify(&self, unit: SourceUnit, ctx: &mut RewriteContext) -> SourceUnit;
}

/// A modifier that returns every file unchanged.
///
/// Useful for validating the interception wiring end to end (classification,
/// identity forging, splicing, dispatch) without altering any code.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unchanged;

impl Modifier for Unchanged {
    fn modify(&self, unit: SourceUnit, _ctx: &mut RewriteContext) -> SourceUnit {
        unit
    }
}
