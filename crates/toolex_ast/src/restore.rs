//! Restoration of a (possibly modified) source unit back to text.

use crate::unit::{ImportSpec, RewriteContext, SourceUnit};

/// Serializes `unit` back to source text.
///
/// Import paths registered on `ctx` but absent from the unit are
/// auto-inserted as plain imports. If nothing touched the import set, the
/// original import block (and therefore the whole file) is reproduced
/// byte-for-byte.
pub fn restore(unit: &SourceUnit, ctx: &RewriteContext) -> String {
    let inserted: Vec<ImportSpec> = ctx
        .required()
        .filter(|path| !unit.has_import(path))
        .map(ImportSpec::plain)
        .collect();

    if inserted.is_empty() && !unit.imports_dirty {
        let raw = unit.raw_imports.as_deref().unwrap_or("");
        return format!("{}{}{}", unit.head, raw, unit.body);
    }

    let mut all = unit.imports.clone();
    all.extend(inserted);
    let block = render_import_block(&all);

    if unit.raw_imports.is_some() {
        // The head ends where the original import block began.
        format!("{}{}{}", unit.head, block, unit.body)
    } else {
        // No import block existed; open one right after the package clause.
        format!("{}\n\n{}{}", unit.head, block, unit.body)
    }
}

/// Renders a canonical grouped import declaration.
fn render_import_block(imports: &[ImportSpec]) -> String {
    let mut out = String::from("import (\n");
    for spec in imports {
        match &spec.alias {
            Some(alias) => out.push_str(&format!("\t{} \"{}\"\n", alias, spec.path)),
            None => out.push_str(&format!("\t\"{}\"\n", spec.path)),
        }
    }
    out.push(')');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_str;

    #[test]
    fn untouched_unit_restores_byte_identically() {
        let text = concat!(
            "// Package doc.\n",
            "package main\n\n",
            "import (\n",
            "\t\"fmt\" // printing\n",
            "\to \"os\"\n",
            ")\n\n",
            "func main() {\n\tfmt.Println(os.Args)\n}\n",
        );
        let unit = parse_str(text, "t.go").unwrap();
        let ctx = RewriteContext::new();
        assert_eq!(restore(&unit, &ctx), text);
    }

    #[test]
    fn untouched_unit_without_imports_restores_byte_identically() {
        let text = "package main\n\nfunc main() {}\n";
        let unit = parse_str(text, "t.go").unwrap();
        assert_eq!(restore(&unit, &RewriteContext::new()), text);
    }

    #[test]
    fn required_import_is_inserted() {
        let text = "package main\n\nimport \"os\"\n\nfunc main() {}\n";
        let unit = parse_str(text, "t.go").unwrap();
        let mut ctx = RewriteContext::new();
        ctx.require_import("fmt");

        let out = restore(&unit, &ctx);
        let reparsed = parse_str(&out, "t.go").unwrap();
        assert!(reparsed.has_import("os"));
        assert!(reparsed.has_import("fmt"));
        assert!(out.contains("func main() {}"));
    }

    #[test]
    fn required_import_already_present_is_not_duplicated() {
        let text = "package main\n\nimport \"fmt\"\n";
        let unit = parse_str(text, "t.go").unwrap();
        let mut ctx = RewriteContext::new();
        ctx.require_import("fmt");

        // Nothing to insert, so the original block survives untouched.
        assert_eq!(restore(&unit, &ctx), text);
    }

    #[test]
    fn insertion_without_existing_block_opens_one_after_package_clause() {
        let text = "package main\n\nfunc main() {}\n";
        let unit = parse_str(text, "t.go").unwrap();
        let mut ctx = RewriteContext::new();
        ctx.require_import("net/http");

        let out = restore(&unit, &ctx);
        assert!(out.starts_with("package main\n\nimport (\n\t\"net/http\"\n)"));
        let reparsed = parse_str(&out, "t.go").unwrap();
        assert!(reparsed.has_import("net/http"));
    }

    #[test]
    fn add_import_regenerates_block_with_alias() {
        let text = "package main\n\nimport \"fmt\"\n\nvar x = 1\n";
        let mut unit = parse_str(text, "t.go").unwrap();
        unit.add_import(Some("o"), "os");

        let out = restore(&unit, &RewriteContext::new());
        assert!(out.contains("o \"os\""));
        let reparsed = parse_str(&out, "t.go").unwrap();
        assert_eq!(reparsed.imports().len(), 2);
        assert!(out.ends_with("var x = 1\n"));
    }

    #[test]
    fn reparse_after_restore_preserves_import_set() {
        let text = "package lib\n\nimport (\n\t\"fmt\"\n\t\"strings\"\n)\n\nfunc f() {}\n";
        let unit = parse_str(text, "t.go").unwrap();
        let out = restore(&unit, &RewriteContext::new());
        let reparsed = parse_str(&out, "t.go").unwrap();
        assert_eq!(reparsed.imports(), unit.imports());
    }
}
