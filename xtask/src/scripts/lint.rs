use crate::cli::LintArgs;
use color_eyre::eyre::{eyre, Result};
use duct::cmd;

/// A cargo invocation in the lint pipeline.
struct Check {
    name: &'static str,
    args: &'static [&'static str],
    /// Arguments used instead of `args` with `--fix`.
    fix_args: Option<&'static [&'static str]>,
}

const FMT: Check = Check {
    name: "fmt",
    args: &["fmt", "--all", "--check"],
    fix_args: Some(&["fmt", "--all"]),
};

const CLIPPY: Check = Check {
    name: "clippy",
    args: &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
    fix_args: Some(&[
        "clippy",
        "--workspace",
        "--all-targets",
        "--fix",
        "--allow-dirty",
        "--",
        "-D",
        "warnings",
    ]),
};

const TEST: Check = Check {
    name: "test",
    args: &["test", "--workspace"],
    fix_args: None,
};

fn selected_checks(args: &LintArgs) -> Vec<&'static Check> {
    [
        (&FMT, args.no_fmt),
        (&CLIPPY, args.no_clippy),
        (&TEST, args.no_test),
    ]
    .into_iter()
    .filter(|(_, skip)| !skip)
    .map(|(check, _)| check)
    .collect()
}

/// Run the checks in order and stop at the first failure.
pub fn run(args: &LintArgs) -> Result<()> {
    for check in selected_checks(args) {
        let cargo_args = match (args.fix, check.fix_args) {
            (true, Some(fix_args)) => fix_args,
            _ => check.args,
        };

        println!("==> cargo {}", cargo_args.join(" "));

        let output = cmd("cargo", cargo_args)
            .stderr_to_stdout()
            .stdout_capture()
            .unchecked()
            .run()?;
        let text = String::from_utf8_lossy(&output.stdout);

        if !output.status.success() {
            print!("{text}");
            return Err(eyre!("lint failed at: {}", check.name));
        }
        if args.verbose {
            print!("{text}");
        }
    }

    println!("lint passed");
    Ok(())
}
