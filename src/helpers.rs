//! Collection of helper functions.
use swc_ecma_ast::*;

/// Declarators of a variable declaration that bind a single identifier,
/// paired with the bound name.
///
/// Destructuring patterns are skipped as they cannot be resolved to
/// a single initializer.
pub fn ident_declarators(var: &VarDecl) -> Vec<(&str, &VarDeclarator)> {
    var.decls
        .iter()
        .filter_map(|decl| match &decl.name {
            Pat::Ident(binding) => Some((binding.id.sym.as_ref(), decl)),
            _ => None,
        })
        .collect()
}

/// Determine if a specifier looks like a local path.
///
/// A local path is one that uses either a relative or absolute
/// file system path.
pub fn is_local_specifier(s: &str) -> bool {
    s.starts_with("./") || s.starts_with("../") || s.starts_with('/')
}

/// Normalize a path for use in a module specifier or URL.
pub fn to_forward_slashes(s: &str) -> String {
    s.replace('\\', "/")
}
