use std::sync::OnceLock;

use regex::Regex;

use super::rename::{rename_void_functions, RenameScope};

const INCLUDES: &str = "\
#include <stdio.h>
#include <stdlib.h>
#include <math.h>
#include <time.h>
#include <string.h>";

/// Fills an array with uniform random values in [-1, 1].
pub const INIT_ARRAY: &str = "
void init_array(double *array, int size)
{
    for (int i = 0; i < size; i++)
    {
        array[i] = (double)rand() / RAND_MAX * 2.0 - 1.0;
    }
}
";

/// Returns 1 when both arrays agree element-wise within 1e-6.
pub const COMPARE_ARRAYS: &str = "
int compare_arrays(double *arr1, double *arr2, int size)
{
    for (int i = 0; i < size; i++)
    {
        if (fabs(arr1[i] - arr2[i]) > 1e-6)
        {
            return 0;
        }
    }
    return 1;
}
";

/// Sources for one verification translation unit.
#[derive(Debug, Clone, Copy)]
pub struct TestSources<'a> {
    /// Base kernel function name, e.g. `kernel_atax`.
    pub kernel_name: &'a str,
    pub original: &'a str,
    pub transformed: &'a str,
    /// Per-kernel test file holding the `main` function.
    pub test_harness: &'a str,
}

fn main_function() -> &'static Regex {
    static MAIN: OnceLock<Regex> = OnceLock::new();
    MAIN.get_or_init(|| {
        Regex::new(r"(?s)int\s+main\s*\(.*?\)\s*\{.*\}").expect("main pattern is valid")
    })
}

/// The `main` function of a test harness, up to the last closing brace.
///
/// Returns an empty string when the harness has no `main`.
pub fn extract_main(test_code: &str) -> &str {
    main_function()
        .find(test_code)
        .map(|m| m.as_str())
        .unwrap_or_default()
}

/// Derive the kernel function name from a test file name.
///
/// `test_heat-3d.c` becomes `kernel_heat_3d`.
pub fn kernel_name_for_test(test_file: &str) -> String {
    let stem = test_file.strip_suffix(".c").unwrap_or(test_file);
    let stem = stem.strip_prefix("test").unwrap_or(stem);
    format!("kernel{}", stem.replace('-', "_"))
}

/// Concatenate both kernels, the fixed helpers and the harness `main` into
/// one C translation unit.
///
/// No validation is performed; malformed inputs simply fail to compile.
pub fn assemble_test_unit(sources: &TestSources<'_>, scope: RenameScope) -> String {
    let original = rename_void_functions(
        sources.original,
        &format!("{}_original", sources.kernel_name),
        scope,
    );
    let transformed = rename_void_functions(
        sources.transformed,
        &format!("{}_transformed", sources.kernel_name),
        scope,
    );
    let main = extract_main(sources.test_harness);

    format!("\n{INCLUDES}\n{original}\n{transformed}\n{INIT_ARRAY}\n{COMPARE_ARRAYS}\n{main}\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const HARNESS: &str = r#"#include <stdio.h>
void kernel_atax_original(int n, double y[4]);

int main()
{
    double y_original[4], y_transformed[4];
    init_array(y_original, 4);
    memcpy(y_transformed, y_original, sizeof(y_original));
    kernel_atax_original(4, y_original);
    kernel_atax_transformed(4, y_transformed);
    if (compare_arrays(y_original, y_transformed, 4)) {
        printf("Output Match\n");
    }
    return 0;
}
"#;

    #[test]
    fn test_kernel_name_for_test() {
        assert_eq!(kernel_name_for_test("test_atax.c"), "kernel_atax");
        assert_eq!(kernel_name_for_test("test_heat-3d.c"), "kernel_heat_3d");
        assert_eq!(
            kernel_name_for_test("test_stencil_stencil2d.c"),
            "kernel_stencil_stencil2d"
        );
    }

    #[test]
    fn test_extract_main_spans_to_last_brace() {
        let main = extract_main(HARNESS);
        assert!(main.starts_with("int main()\n{"));
        assert!(main.ends_with("return 0;\n}"));
        assert!(main.contains("printf(\"Output Match\\n\");\n    }"));
    }

    #[test]
    fn test_extract_main_missing() {
        assert_eq!(extract_main("void f() {}"), "");
    }

    #[test]
    fn test_assemble_order_and_renames() {
        let unit = assemble_test_unit(
            &TestSources {
                kernel_name: "kernel_atax",
                original: "#pragma ACCEL kernel\nvoid kernel_atax(int n, double y[4]) { y[0] = 1; }",
                transformed: "void kernel_atax(int n, double y[4]) {\n  y[0] = 1;\n}",
                test_harness: HARNESS,
            },
            RenameScope::All,
        );

        assert!(unit.starts_with("\n#include <stdio.h>\n#include <stdlib.h>\n#include <math.h>"));

        let positions: Vec<usize> = [
            "#include <string.h>",
            "void kernel_atax_original(int n, double y[4]) { y[0] = 1; }",
            "void kernel_atax_transformed(int n, double y[4]) {\n  y[0] = 1;\n}",
            "void init_array(double *array, int size)",
            "int compare_arrays(double *arr1, double *arr2, int size)",
            "int main()",
        ]
        .iter()
        .map(|needle| unit.find(needle).unwrap())
        .collect();

        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(unit.contains("fabs(arr1[i] - arr2[i]) > 1e-6"));
        assert!(unit.ends_with("return 0;\n}\n"));
        // The harness prototype is not part of main and must not leak in.
        assert_eq!(unit.matches("void kernel_atax_original").count(), 1);
    }

    #[test]
    fn test_assemble_without_main() {
        let unit = assemble_test_unit(
            &TestSources {
                kernel_name: "kernel_md",
                original: "void md_kernel() {}",
                transformed: "void md_kernel() {}",
                test_harness: "/* empty */",
            },
            RenameScope::All,
        );
        assert!(unit.contains("void kernel_md_original() {}"));
        assert!(unit.contains("void kernel_md_transformed() {}"));
        assert!(!unit.contains("main"));
    }
}
