use crate::model::{Backend, ModelInvoker};
use crate::prelude::{eprintln, println, *};
use crate::summary::{progress_bar, ItemStatus, RunSummary};
use colored::Colorize;
use hlsx_core::config::{FileConfig, MissingBlockPolicy, Provider};
use hlsx_core::model::{ModelRequest, DEFAULT_TEMPERATURE};
use hlsx_core::transform::{
    build_prompt, extract_performance_table, parse_response, prompt, PromptTemplate, SourceFile,
    BUILTIN_PROMPTS,
};
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};

const DEFAULT_INPUT: &str = "data/sources";
const DEFAULT_OUTPUT: &str = "transformed_sources";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_PROMPT: &str = "prompt_1";

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ProviderArg {
    /// OpenAI-compatible chat completions API
    #[value(name = "openai")]
    OpenAi,
    /// Local Ollama server
    Ollama,
}

impl From<ProviderArg> for Provider {
    fn from(p: ProviderArg) -> Self {
        match p {
            ProviderArg::OpenAi => Provider::OpenAi,
            ProviderArg::Ollama => Provider::Ollama,
        }
    }
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum MissingBlockArg {
    /// Log the response and move on to the next file
    Skip,
    /// Stop the run
    Fail,
}

impl From<MissingBlockArg> for MissingBlockPolicy {
    fn from(p: MissingBlockArg) -> Self {
        match p {
            MissingBlockArg::Skip => MissingBlockPolicy::Skip,
            MissingBlockArg::Fail => MissingBlockPolicy::Fail,
        }
    }
}

#[derive(Debug, clap::Parser)]
#[command(name = "transform")]
#[command(about = "Send kernels to the model and save the transformed code")]
pub struct App {
    /// Directory of C kernels to transform
    #[clap(long, env = "HLSX_INPUT")]
    input: Option<PathBuf>,

    /// Directory the transformed kernels are written to
    #[clap(long, env = "HLSX_OUTPUT")]
    output: Option<PathBuf>,

    /// Model provider
    #[clap(long, value_enum, env = "HLSX_PROVIDER")]
    provider: Option<ProviderArg>,

    /// Model identifiers; each model gets its own output tree
    #[clap(long = "model", env = "HLSX_MODEL", value_delimiter = ',')]
    models: Vec<String>,

    /// Built-in prompt templates to use (see `hlsx prompts`)
    #[clap(long = "prompt", value_delimiter = ',')]
    prompts: Vec<String>,

    /// Custom prompt template file; must contain a {code} slot
    #[clap(long, conflicts_with = "prompts")]
    template: Option<PathBuf>,

    /// Directory of Merlin reports, one `<kernel-stem>.rpt` per kernel
    #[clap(long)]
    reports: Option<PathBuf>,

    /// How many times each kernel is sent per model and prompt
    #[clap(long)]
    runs: Option<u32>,

    /// Sampling temperature
    #[clap(long)]
    temperature: Option<f64>,

    /// API base URL (defaults depend on the provider)
    #[clap(long, env = "HLSX_BASE_URL")]
    base_url: Option<String>,

    /// Write outputs directly into the output directory
    #[clap(long)]
    flat: bool,

    /// What to do when a response has no ```c block
    #[clap(long, value_enum)]
    on_missing_block: Option<MissingBlockArg>,
}

/// Transform settings after merging flags, environment and settings file.
#[derive(Debug, Clone)]
pub struct Settings {
    pub input: PathBuf,
    pub output: PathBuf,
    pub provider: Provider,
    pub base_url: Option<String>,
    pub models: Vec<String>,
    pub templates: Vec<PromptTemplate>,
    pub reports: Option<PathBuf>,
    pub runs: u32,
    pub temperature: f64,
    pub flat: bool,
    pub on_missing_block: MissingBlockPolicy,
}

fn non_empty(values: Vec<String>) -> Option<Vec<String>> {
    (!values.is_empty()).then_some(values)
}

fn custom_template(path: &Path) -> Result<Vec<PromptTemplate>> {
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read prompt template '{}'", path.display()))?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("custom");
    Ok(vec![prompt::custom(name, body)?])
}

fn builtin_templates(names: &[String]) -> Result<Vec<PromptTemplate>> {
    Ok(names
        .iter()
        .map(|name| prompt::builtin(name))
        .collect::<std::result::Result<Vec<_>, _>>()?)
}

impl Settings {
    pub fn resolve(app: App, file: FileConfig) -> Result<Self> {
        // `--template` and `--prompt` form one setting; a file entry for
        // either only applies when neither flag is given.
        let templates = if let Some(path) = &app.template {
            custom_template(path)?
        } else if let Some(names) = non_empty(app.prompts) {
            builtin_templates(&names)?
        } else if let Some(path) = &file.transform.template {
            custom_template(path)?
        } else {
            builtin_templates(
                &file
                    .transform
                    .prompts
                    .unwrap_or_else(|| vec![DEFAULT_PROMPT.to_string()]),
            )?
        };

        let settings = Self {
            input: app
                .input
                .or(file.transform.input)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INPUT)),
            output: app
                .output
                .or(file.transform.output)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT)),
            provider: app
                .provider
                .map(Provider::from)
                .or(file.model.provider)
                .unwrap_or_default(),
            base_url: app.base_url.or(file.model.base_url),
            models: non_empty(app.models)
                .or(file.model.models)
                .unwrap_or_else(|| vec![DEFAULT_MODEL.to_string()]),
            templates,
            reports: app.reports.or(file.transform.reports),
            runs: app.runs.or(file.transform.runs).unwrap_or(1),
            temperature: app
                .temperature
                .or(file.model.temperature)
                .unwrap_or(DEFAULT_TEMPERATURE),
            flat: app.flat,
            on_missing_block: app
                .on_missing_block
                .map(MissingBlockPolicy::from)
                .or(file.transform.on_missing_block)
                .unwrap_or_default(),
        };

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.runs == 0 {
            return Err(eyre!("--runs must be at least 1"));
        }
        if self.models.is_empty() {
            return Err(eyre!("At least one model is required"));
        }
        if self.flat && (self.models.len() > 1 || self.templates.len() > 1 || self.runs > 1) {
            return Err(eyre!("--flat needs a single model, a single prompt and a single run"));
        }
        if self.reports.is_none() {
            if let Some(template) = self.templates.iter().find(|t| t.needs_report()) {
                return Err(eyre!(
                    "Prompt template {} needs --reports with Merlin performance reports",
                    template.name
                ));
            }
        }
        Ok(())
    }

    /// Directory the outputs of one model/prompt/run combination go to.
    pub fn target_dir(&self, model: &str, template: &PromptTemplate, run: u32) -> PathBuf {
        if self.flat {
            return self.output.clone();
        }
        self.output
            .join(model)
            .join(format!("{}_res_{}", template.name, run))
    }
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let file = crate::config::load(&global.config)?;
    let settings = Settings::resolve(app, file)?;

    if global.verbose {
        eprintln!("Provider: {:?}", settings.provider);
        eprintln!("Models: {}", settings.models.join(", "));
        eprintln!(
            "Prompts: {}",
            settings
                .templates
                .iter()
                .map(|t| t.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        eprintln!("Input: {}", settings.input.display());
        eprintln!("Output: {}", settings.output.display());
    }

    let backend = Backend::connect(settings.provider, settings.base_url.as_deref())?;
    let summary = transform_sources(&backend, &settings).await?;

    summary.print();
    summary.into_result()
}

/// Read every regular file in `dir`, sorted by name.
pub fn read_sources(dir: &Path) -> Result<Vec<SourceFile>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read source directory '{}'", dir.display()))?;

    let mut sources = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to read source directory '{}'", dir.display()))?
            .path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            log::warn!("Skipping {} (file name is not UTF-8)", path.display());
            continue;
        };
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read source file '{}'", path.display()))?;
        sources.push(SourceFile {
            name: name.to_string(),
            content,
        });
    }

    sources.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(sources)
}

/// Load the performance table for `source` from the reports directory.
///
/// Returns `Ok(None)` when the kernel has no report.
fn load_report(reports: &Path, source: &SourceFile) -> Result<Option<String>> {
    let stem = Path::new(&source.name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(&source.name);
    let path = reports.join(format!("{}.rpt", stem));

    if !path.exists() {
        return Ok(None);
    }

    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read Merlin report '{}'", path.display()))?;
    Ok(extract_performance_table(&text))
}

/// Run every source through every model, prompt and run, one at a time.
///
/// Item failures are recorded in the summary and the loop moves on; only
/// I/O errors and the `fail` missing-block policy end the run early.
pub async fn transform_sources<M: ModelInvoker>(model: &M, settings: &Settings) -> Result<RunSummary> {
    let sources = read_sources(&settings.input)?;
    log::info!(
        "Found {} kernels in {}",
        sources.len(),
        settings.input.display()
    );

    let total = sources.len() * settings.models.len() * settings.templates.len() * settings.runs as usize;
    let pb = progress_bar(total, "Transform");
    let mut summary = RunSummary::default();

    for model_name in &settings.models {
        for template in &settings.templates {
            for run in 1..=settings.runs {
                let target = settings.target_dir(model_name, template, run);
                std::fs::create_dir_all(&target).with_context(|| {
                    format!("Failed to create output directory '{}'", target.display())
                })?;

                for source in &sources {
                    let item = target.join(&source.name).display().to_string();
                    pb.set_message(item.clone());

                    let (status, detail) = transform_one(
                        model, settings, model_name, template, source, &target, &pb,
                    )
                    .await?;
                    summary.record(item, status, detail);
                    pb.inc(1);
                }
            }
        }
    }

    pb.finish_and_clear();
    Ok(summary)
}

async fn transform_one<M: ModelInvoker>(
    model: &M,
    settings: &Settings,
    model_name: &str,
    template: &PromptTemplate,
    source: &SourceFile,
    target: &Path,
    pb: &ProgressBar,
) -> Result<(ItemStatus, String)> {
    let report = match (&settings.reports, template.needs_report()) {
        (Some(reports), true) => match load_report(reports, source)? {
            Some(report) => Some(report),
            None => {
                pb.suspend(|| log::warn!("No performance report for {}", source.name));
                return Ok((ItemStatus::Failed, "no performance report".to_string()));
            }
        },
        _ => None,
    };

    let prompt = build_prompt(template, &source.content, report.as_deref())?;
    let request = ModelRequest {
        model: model_name.to_string(),
        prompt,
        temperature: settings.temperature,
    };

    log::debug!("Sending {} to {}", source.name, model_name);
    let response = match model.complete(&request).await {
        Ok(response) => response,
        Err(e) => {
            pb.suspend(|| log::warn!("Model call failed for {}: {:#}", source.name, e));
            return Ok((ItemStatus::Failed, e.to_string()));
        }
    };

    let output = match parse_response(&source.name, &response) {
        Ok(output) => output,
        Err(failure) => {
            pb.suspend(|| {
                log::warn!("{}", failure);
                log::warn!("Full response for {}:\n{}", failure.file_name, failure.response);
            });
            if settings.on_missing_block == MissingBlockPolicy::Fail {
                return Err(failure.into());
            }
            return Ok((ItemStatus::Skipped, "no ```c block in response".to_string()));
        }
    };

    let path = target.join(&source.name);
    std::fs::write(&path, output.as_str())
        .with_context(|| format!("Failed to write transformed kernel '{}'", path.display()))?;

    pb.suspend(|| log::info!("Transformed code with comments saved to {}", path.display()));
    Ok((ItemStatus::Ok, "written".to_string()))
}

/// Print the built-in prompt templates.
pub fn list_prompts() -> Result<()> {
    let mut table = new_table();
    table.add_row(prettytable::row!["Name", "Needs report", "Instruction"]);

    for name in BUILTIN_PROMPTS {
        let template = prompt::builtin(name)?;
        let instruction = template
            .body
            .lines()
            .find(|line| line.starts_with("Apply") || line.starts_with("Using"))
            .unwrap_or_default();
        let summary: String = instruction.chars().take(72).collect();
        table.add_row(prettytable::row![
            name.bold(),
            if template.needs_report() { "yes" } else { "no" },
            format!("{}...", summary)
        ]);
    }

    println!("{}", table);
    Ok(())
}
