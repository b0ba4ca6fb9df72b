//! Performance estimate tables from Merlin `merlin.rpt` files.

const BANNER: &str = "Performance Estimate";

fn is_rule(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && line.chars().all(|c| c == '=')
}

fn is_table_line(line: &str) -> bool {
    let line = line.trim_start();
    line.starts_with('+') || line.starts_with('|')
}

/// Cut the performance estimate section out of a Merlin report.
///
/// The section starts at the `Performance Estimate` banner (with the `====`
/// rule above it) and ends with the last line of the table that follows.
/// Reports without a banner are returned trimmed when they hold a table.
/// Returns `None` when no table can be found.
pub fn extract_performance_table(report: &str) -> Option<String> {
    let lines: Vec<&str> = report.lines().collect();

    let Some(banner) = lines.iter().position(|line| line.trim_start().starts_with(BANNER)) else {
        return lines
            .iter()
            .any(|line| is_table_line(line))
            .then(|| report.trim().to_string());
    };

    let start = if banner > 0 && is_rule(lines[banner - 1]) {
        banner - 1
    } else {
        banner
    };

    let table_start = banner + lines[banner..].iter().position(|line| is_table_line(line))?;
    let table_len = lines[table_start..]
        .iter()
        .take_while(|line| is_table_line(line))
        .count();

    Some(lines[start..table_start + table_len].join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECTION: &str = "\
====================================================================================
Performance Estimate (TC: Trip Count, AC: Accumulated Cycles, CPC: Cycles Per Call)
====================================================================================

+------------------------------------+---+--------------+-----+------------------+
|             Hierarchy              |TC |      AC      | CPC |      Detail      |
+------------------------------------+---+--------------+-----+------------------+
|kernel_bicg (cnn-krnl.cpp:4)        |   |81467 (100.0%)|81467|-                 |
|    loop i (cnn-krnl.cpp:11)        |116|  116 (  0.1%)|  116|pipeline II=1     |
+------------------------------------+---+--------------+-----+------------------+";

    #[test]
    fn test_section_inside_full_report() {
        let report = format!(
            "Merlin Compiler report\n\nSummary: ok\n\n{SECTION}\n\nResource Estimate\n+--+\n|x|\n"
        );
        assert_eq!(extract_performance_table(&report).as_deref(), Some(SECTION));
    }

    #[test]
    fn test_section_only() {
        assert_eq!(
            extract_performance_table(&format!("\n{SECTION}\n")).as_deref(),
            Some(SECTION)
        );
    }

    #[test]
    fn test_bare_table_is_trimmed() {
        let table = "+--+---+\n|k |TC |\n+--+---+";
        assert_eq!(
            extract_performance_table(&format!("\n\n{table}\n  \n")).as_deref(),
            Some(table)
        );
    }

    #[test]
    fn test_no_table() {
        assert_eq!(extract_performance_table("nothing useful"), None);
        assert_eq!(
            extract_performance_table("Performance Estimate\n(no data)"),
            None
        );
    }
}
