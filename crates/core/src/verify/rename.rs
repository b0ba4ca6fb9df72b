use std::sync::OnceLock;

use regex::{NoExpand, Regex};
use serde::Deserialize;

/// Which `void` definitions a rename touches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenameScope {
    /// Only the first `void <name>(` match.
    First,
    /// Every `void <name>(` match.
    #[default]
    All,
}

fn void_signature() -> &'static Regex {
    static SIGNATURE: OnceLock<Regex> = OnceLock::new();
    SIGNATURE.get_or_init(|| Regex::new(r"void\s+(\w+)\s*\(").expect("signature pattern is valid"))
}

/// Rename `void` functions in `code` to `new_name`.
///
/// This is a textual rewrite: matches inside comments and string literals
/// are rewritten as well. Parameter lists and bodies are left untouched.
pub fn rename_void_functions(code: &str, new_name: &str, scope: RenameScope) -> String {
    let replacement = format!("void {new_name}(");
    let limit = match scope {
        RenameScope::First => 1,
        RenameScope::All => 0,
    };

    void_signature()
        .replacen(code, limit, NoExpand(&replacement))
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_single_function() {
        assert_eq!(
            rename_void_functions("void foo(int x) { return; }", "kernel_a_original", RenameScope::All),
            "void kernel_a_original(int x) { return; }"
        );
    }

    #[test]
    fn test_rename_normalizes_spacing() {
        assert_eq!(
            rename_void_functions("void\n  kernel_atax (int m)", "kernel_atax_transformed", RenameScope::All),
            "void kernel_atax_transformed(int m)"
        );
    }

    #[test]
    fn test_rename_all_matches() {
        let code = "void helper(int i) {}\nvoid kernel(int n) { helper(n); }";
        assert_eq!(
            rename_void_functions(code, "k", RenameScope::All),
            "void k(int i) {}\nvoid k(int n) { helper(n); }"
        );
    }

    #[test]
    fn test_rename_first_only() {
        let code = "void helper(int i) {}\nvoid kernel(int n) { helper(n); }";
        assert_eq!(
            rename_void_functions(code, "k", RenameScope::First),
            "void k(int i) {}\nvoid kernel(int n) { helper(n); }"
        );
    }

    #[test]
    fn test_rename_rewrites_comments_too() {
        let code = "// calls void old(x)\nvoid old(int x) {}";
        assert_eq!(
            rename_void_functions(code, "new_name", RenameScope::All),
            "// calls void new_name(x)\nvoid new_name(int x) {}"
        );
    }

    #[test]
    fn test_non_void_functions_are_kept() {
        let code = "int f(int x) { return x; }\ndouble g(void) { return 0.0; }";
        assert_eq!(rename_void_functions(code, "k", RenameScope::All), code);
    }

    #[test]
    fn test_dollar_in_name_is_literal() {
        assert_eq!(
            rename_void_functions("void f()", "k$1", RenameScope::All),
            "void k$1()"
        );
    }
}
