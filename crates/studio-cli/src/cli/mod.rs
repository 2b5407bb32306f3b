mod commands;

use clap::Parser;
use std::path::PathBuf;
use studio_core::domain::StudioError;
use studio_core::session::StudioPaths;
use tracing_subscriber::EnvFilter;

pub fn run_from_env() -> i32 {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    match run(std::env::args().skip(1)) {
        Ok(code) => code,
        Err(error) => {
            let core_error = error.as_studio_error();
            eprintln!("{}", core_error.diagnostic_line());
            eprintln!("{}", core_error.fatal_exit_line());
            core_error.exit_code()
        }
    }
}

pub fn run<I, S>(args: I) -> Result<i32, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let full_args = std::iter::once("simss-studio".to_string())
        .chain(args.into_iter().map(Into::into))
        .collect::<Vec<_>>();

    match Cli::try_parse_from(&full_args) {
        Ok(cli) => dispatch_parsed(cli),
        Err(err) => match err.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                print!("{}", err);
                Ok(0)
            }
            _ => Err(CliError::Usage(err.to_string())),
        },
    }
}

#[derive(Parser)]
#[command(
    name = "simss-studio",
    about = "Session-scoped front end for the SimSS drift-diffusion simulator"
)]
struct Cli {
    /// Installation folder of the simss executable
    #[arg(long, value_name = "DIR", default_value = "SIMsalabim/SimSS", global = true)]
    simss_dir: PathBuf,
    /// Folder holding per-session parameters, outputs, and archives
    #[arg(long, value_name = "DIR", default_value = "Simulations", global = true)]
    simulations_dir: PathBuf,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(clap::Subcommand)]
enum CliCommand {
    /// Mint a new session identifier
    Init,
    /// Show session state and the resolved device parameters
    Show(commands::SessionArgs),
    /// Save device parameters for a session, optionally applying edits
    Save(commands::SaveArgs),
    /// Run the simulation for a session and collect its results
    Run(commands::RunArgs),
    /// Validate and stage an experimental current-voltage file
    UploadJv(commands::UploadArgs),
    /// Restore a session's parameters from the default template
    Reset(commands::SessionArgs),
}

fn dispatch_parsed(cli: Cli) -> Result<i32, CliError> {
    let paths = StudioPaths::new(cli.simss_dir, cli.simulations_dir);
    match cli.command {
        CliCommand::Init => commands::run_init(),
        CliCommand::Show(args) => commands::run_show(&paths, &args),
        CliCommand::Save(args) => commands::run_save(&paths, &args),
        CliCommand::Run(args) => commands::run_run(&paths, &args),
        CliCommand::UploadJv(args) => commands::run_upload(&paths, &args),
        CliCommand::Reset(args) => commands::run_reset(&paths, &args),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Core(StudioError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StudioError> for CliError {
    fn from(error: StudioError) -> Self {
        Self::Core(error)
    }
}

impl CliError {
    fn as_studio_error(&self) -> StudioError {
        match self {
            Self::Usage(message) => StudioError::parse("CLI.USAGE", message.clone()),
            Self::Core(error) => error.clone(),
            Self::Internal(error) => StudioError::filesystem("IO.CLI", format!("{error:#}")),
        }
    }
}
