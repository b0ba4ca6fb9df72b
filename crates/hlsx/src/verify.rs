use crate::compiler::{CcRunner, CompilerRunner};
use crate::prelude::{eprintln, *};
use crate::summary::{progress_bar, ItemStatus, RunSummary};
use hlsx_core::config::FileConfig;
use hlsx_core::verify::{
    assemble_test_unit, format_result_line, KernelCase, Manifest, RenameScope, RunOutcome,
    TestSources,
};
use indicatif::ProgressBar;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

const DEFAULT_MANIFEST: &str = "verify.toml";
const DEFAULT_ORIGINAL: &str = "data/selected_sources";
const DEFAULT_TRANSFORMED: &str = "transformed_sources";
const DEFAULT_TESTS: &str = "verification";
const DEFAULT_RESULTS: &str = "results.txt";
const DEFAULT_COMPILER: &str = "gcc";

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum RenameArg {
    /// Rename only the first `void` function
    First,
    /// Rename every `void` function
    All,
}

impl From<RenameArg> for RenameScope {
    fn from(r: RenameArg) -> Self {
        match r {
            RenameArg::First => RenameScope::First,
            RenameArg::All => RenameScope::All,
        }
    }
}

#[derive(Debug, clap::Parser)]
#[command(name = "verify")]
#[command(about = "Compile original and transformed kernels against their test harness")]
pub struct App {
    /// Manifest listing kernel/test pairs
    #[clap(long, env = "HLSX_MANIFEST")]
    manifest: Option<PathBuf>,

    /// Directory of the original kernels
    #[clap(long)]
    original: Option<PathBuf>,

    /// Directories of transformed kernels; each one is checked in turn
    #[clap(long, value_delimiter = ',')]
    transformed: Vec<PathBuf>,

    /// Directory of the per-kernel test harnesses
    #[clap(long)]
    tests: Option<PathBuf>,

    /// File the results are appended to
    #[clap(long, env = "HLSX_RESULTS")]
    results: Option<PathBuf>,

    /// C compiler
    #[clap(long, env = "HLSX_CC")]
    compiler: Option<String>,

    /// Which `void` functions are renamed in each kernel [default: all]
    #[clap(long, value_enum, env = "HLSX_RENAME")]
    rename: Option<RenameArg>,

    /// Keep the generated test programs in this directory
    #[clap(long)]
    keep_sources: Option<PathBuf>,
}

/// Verify settings after merging flags, environment and settings file.
#[derive(Debug, Clone)]
pub struct Settings {
    pub manifest: Manifest,
    pub original: PathBuf,
    pub transformed: Vec<PathBuf>,
    pub tests: PathBuf,
    pub results: PathBuf,
    pub compiler: String,
    pub rename: RenameScope,
    pub keep_sources: Option<PathBuf>,
}

impl Settings {
    pub fn resolve(app: App, file: FileConfig) -> Result<Self> {
        let manifest_path = app
            .manifest
            .or(file.verify.manifest)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST));
        let text = std::fs::read_to_string(&manifest_path)
            .with_context(|| format!("Failed to read manifest '{}'", manifest_path.display()))?;
        let manifest = Manifest::from_toml_str(&text)
            .with_context(|| format!("Failed to load manifest '{}'", manifest_path.display()))?;

        let transformed = if app.transformed.is_empty() {
            file.verify
                .transformed
                .unwrap_or_else(|| vec![PathBuf::from(DEFAULT_TRANSFORMED)])
        } else {
            app.transformed
        };

        Ok(Self {
            manifest,
            original: app
                .original
                .or(file.verify.original)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ORIGINAL)),
            transformed,
            tests: app
                .tests
                .or(file.verify.tests)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TESTS)),
            results: app
                .results
                .or(file.verify.results)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_RESULTS)),
            compiler: app
                .compiler
                .or(file.verify.compiler)
                .unwrap_or_else(|| DEFAULT_COMPILER.to_string()),
            rename: app
                .rename
                .map(RenameScope::from)
                .or(file.verify.rename)
                .unwrap_or_default(),
            keep_sources: app.keep_sources,
        })
    }
}

pub fn run(app: App, global: crate::Global) -> Result<()> {
    let file = crate::config::load(&global.config)?;
    let settings = Settings::resolve(app, file)?;
    let runner = CcRunner::locate(&settings.compiler)?;

    if global.verbose {
        eprintln!("Compiler: {}", settings.compiler);
        eprintln!("Kernels: {}", settings.manifest.kernels.len());
        eprintln!("Results: {}", settings.results.display());
    }

    let summary = verify_kernels(&runner, &settings)?;

    summary.print();
    summary.into_result()
}

fn read(path: &Path, what: &str) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} '{}'", what, path.display()))
}

/// Check every manifest kernel in every transformed directory, one at a time.
///
/// Each finished item appends its line to the results file straight away.
pub fn verify_kernels<R: CompilerRunner>(runner: &R, settings: &Settings) -> Result<RunSummary> {
    let total = settings.transformed.len() * settings.manifest.kernels.len();
    let pb = progress_bar(total, "Verify");
    let mut summary = RunSummary::default();
    let labels = keep_labels(&settings.transformed);

    for (transformed_dir, label) in settings.transformed.iter().zip(&labels) {
        for case in &settings.manifest.kernels {
            let transformed_path = transformed_dir.join(&case.source);
            let item = transformed_path.display().to_string();
            pb.set_message(item.clone());

            let (status, detail) = verify_one(runner, settings, case, transformed_dir, label, &pb)?;
            summary.record(item, status, detail);
            pb.inc(1);
        }
    }

    pb.finish_and_clear();
    Ok(summary)
}

fn verify_one<R: CompilerRunner>(
    runner: &R,
    settings: &Settings,
    case: &KernelCase,
    transformed_dir: &Path,
    label: &Path,
    pb: &ProgressBar,
) -> Result<(ItemStatus, String)> {
    let transformed_path = transformed_dir.join(&case.source);

    // A missing transformed kernel usually means the model gave no code
    // block for it; that is an item failure, not a broken setup.
    if !transformed_path.is_file() {
        pb.suspend(|| log::warn!("Transformed kernel {} not found", transformed_path.display()));
        return Ok((ItemStatus::Failed, "transformed kernel missing".to_string()));
    }

    let original = read(&settings.original.join(&case.source), "original kernel")?;
    let transformed = read(&transformed_path, "transformed kernel")?;
    let test_harness = read(&settings.tests.join(&case.test), "test harness")?;

    let kernel_name = case.kernel_name();
    let unit = assemble_test_unit(
        &TestSources {
            kernel_name: &kernel_name,
            original: &original,
            transformed: &transformed,
            test_harness: &test_harness,
        },
        settings.rename,
    );

    // The combined source only lives for this iteration.
    let work_dir = tempfile::Builder::new()
        .prefix("hlsx-verify")
        .tempdir()
        .context("Failed to create a temporary directory for the test program")?;
    let unit_path = work_dir.path().join(&case.test);
    std::fs::write(&unit_path, &unit)
        .with_context(|| format!("Failed to write test program '{}'", unit_path.display()))?;

    if let Some(keep) = &settings.keep_sources {
        keep_source(&keep.join(label), &case.test, &unit)?;
    }

    log::debug!("Compiling {} for {}", case.test, transformed_path.display());
    let outcome = runner.compile_and_run(&unit_path)?;

    append_result(&settings.results, &transformed_path, &outcome)?;

    match outcome {
        RunOutcome::Success { .. } => {
            pb.suspend(|| log::info!("{}: ran", transformed_path.display()));
            Ok((ItemStatus::Ok, "ran".to_string()))
        }
        RunOutcome::Exited { output } => {
            pb.suspend(|| {
                log::warn!("{}: test program exited non-zero\n{}", transformed_path.display(), output)
            });
            let last_line = output.lines().last().unwrap_or("exited non-zero").to_string();
            Ok((ItemStatus::Failed, last_line))
        }
        RunOutcome::Failure { stderr } => {
            pb.suspend(|| {
                log::warn!("{}: compile or run failed\n{}", transformed_path.display(), stderr)
            });
            let first_line = stderr.lines().next().unwrap_or("failed").to_string();
            Ok((ItemStatus::Failed, first_line))
        }
    }
}

/// Name each transformed directory by its path below the common root of all
/// of them, so `out/m1/prompt_1_res_1` and `out/m2/prompt_1_res_1` stay apart.
///
/// A single directory is named by its last component.
fn keep_labels(dirs: &[PathBuf]) -> Vec<PathBuf> {
    let components: Vec<Vec<Component<'_>>> =
        dirs.iter().map(|dir| dir.components().collect()).collect();

    let Some(first) = components.first() else {
        return Vec::new();
    };

    let mut common = components
        .iter()
        .map(|c| c.len().saturating_sub(1))
        .min()
        .unwrap_or(0);
    for other in &components[1..] {
        common = common.min(
            first
                .iter()
                .zip(other)
                .take_while(|(a, b)| a == b)
                .count(),
        );
    }

    components
        .iter()
        .map(|c| {
            let label: PathBuf = c[common..]
                .iter()
                .filter(|part| matches!(part, Component::Normal(_)))
                .collect();
            if label.as_os_str().is_empty() {
                PathBuf::from("transformed")
            } else {
                label
            }
        })
        .collect()
}

fn keep_source(dir: &Path, test: &str, unit: &str) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory '{}'", dir.display()))?;

    let path = dir.join(test);
    std::fs::write(&path, unit)
        .with_context(|| format!("Failed to write test program '{}'", path.display()))
}

fn append_result(results: &Path, transformed_path: &Path, outcome: &RunOutcome) -> Result<()> {
    let line = format_result_line(&transformed_path.display().to_string(), outcome);

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(results)
        .with_context(|| format!("Failed to open results file '{}'", results.display()))?;
    file.write_all(line.as_bytes())
        .with_context(|| format!("Failed to append to results file '{}'", results.display()))
}
