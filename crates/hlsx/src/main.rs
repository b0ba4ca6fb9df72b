use crate::prelude::{eprintln, *};
use clap::Parser;
use std::path::PathBuf;

mod compiler;
mod config;
mod error;
mod model;
mod prelude;
mod summary;
mod transform;
mod verify;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Ask an LLM to apply HLS loop transformations to C kernels, then compile and compare the results"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Settings file
    #[clap(long, env = "HLSX_CONFIG", global = true, default_value = "hlsx.toml")]
    config: PathBuf,

    /// Whether to display additional information.
    #[clap(long, env = "HLSX_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Send kernels to the model and save the transformed code
    Transform(crate::transform::App),

    /// Compile original and transformed kernels against their test harness
    Verify(crate::verify::App),

    /// List the built-in prompt templates
    Prompts,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let app = App::parse();
    init_logging(app.global.verbose);

    let result = match app.command {
        SubCommands::Transform(sub_app) => crate::transform::run(sub_app, app.global).await,
        SubCommands::Verify(sub_app) => crate::verify::run(sub_app, app.global),
        SubCommands::Prompts => crate::transform::list_prompts(),
    };

    // Item-level failures do not abort a run; they only change the exit status.
    if let Err(err) = &result {
        if let Some(Error::ItemsFailed { failed, total }) = err.downcast_ref::<Error>() {
            eprintln!("{} of {} items failed", failed, total);
            std::process::exit(2);
        }
    }

    result
}
