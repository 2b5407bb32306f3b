use super::CliError;
use anyhow::Context;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use studio_core::collect::SolarCellMetrics;
use studio_core::diagram::build_band_diagram;
use studio_core::runner::SimulationRunner;
use studio_core::session::{Session, SessionId, SessionState, StudioPaths};
use studio_core::upload::store_experimental_jv;

#[derive(clap::Args)]
pub(super) struct SessionArgs {
    /// Session identifier minted by `init`
    #[arg(long, value_name = "ID")]
    pub(super) session: u64,
}

#[derive(clap::Args)]
pub(super) struct SaveArgs {
    #[command(flatten)]
    pub(super) session: SessionArgs,
    /// Parameter edit, repeatable
    #[arg(long = "set", value_name = "NAME=VALUE")]
    pub(super) edits: Vec<String>,
}

#[derive(clap::Args)]
pub(super) struct RunArgs {
    #[command(flatten)]
    pub(super) session: SessionArgs,
    /// Print the run report as JSON
    #[arg(long)]
    pub(super) json: bool,
}

#[derive(clap::Args)]
pub(super) struct UploadArgs {
    /// Two-column voltage/current text file
    #[arg(value_name = "FILE")]
    pub(super) file: PathBuf,
}

pub(super) fn run_init() -> Result<i32, CliError> {
    let id = SessionId::mint()?;
    println!("{}", id);
    Ok(0)
}

pub(super) fn run_show(paths: &StudioPaths, args: &SessionArgs) -> Result<i32, CliError> {
    let session = session_for(paths, args);
    let document = session.load_document()?;

    println!("session:        {}", session.id());
    println!("state:          {}", state_label(session.state()));
    println!(
        "parameter file: {}",
        session.resolve_parameter_file().display()
    );
    for section in document.sections().iter().skip(1) {
        println!("\n[{}]", section.kind.name());
        for entry in &section.entries {
            if let studio_core::document::Entry::Parameter { name, value, .. } = entry {
                println!("  {} = {}", name, value);
            }
        }
    }
    Ok(0)
}

pub(super) fn run_save(paths: &StudioPaths, args: &SaveArgs) -> Result<i32, CliError> {
    let session = session_for(paths, &args.session);
    let mut document = session.load_document()?;

    for edit in &args.edits {
        let (name, value) = parse_assignment(edit)?;
        document.set_value(name, value)?;
    }

    let saved = session.save_parameters(&mut document)?;
    tracing::info!(path = %saved.display(), "device parameters saved");
    println!("Saved device parameters to {}", saved.display());

    // The band diagram is a courtesy rendering; geometry or lookup problems
    // are reported inline and never fail the save.
    match build_band_diagram(&document) {
        Ok(diagram) => {
            println!(
                "Band diagram: {} layer(s) across {:.1} nm",
                1 + diagram.left_transport.is_some() as usize
                    + diagram.right_transport.is_some() as usize,
                diagram.device_width * 1.0e9
            );
        }
        Err(error) => eprintln!("{}", error.diagnostic_line()),
    }
    Ok(0)
}

pub(super) fn run_run(paths: &StudioPaths, args: &RunArgs) -> Result<i32, CliError> {
    let session = session_for(paths, &args.session);
    let runner = SimulationRunner::for_paths(paths);

    tracing::info!(session = %session.id(), "starting simulation run");
    let report = session.run_simulation(&runner)?;
    tracing::info!(archive = %report.archive.display(), "simulation run collected");

    if args.json {
        let rendered = serde_json::to_string_pretty(&report)
            .context("failed to render the run report as JSON")?;
        println!("{}", rendered);
        return Ok(0);
    }

    println!("Simulation complete for session {}", report.session);
    match &report.metrics {
        Some(metrics) => print_metrics(metrics),
        None => println!("Not a solar-cell device; no figures of merit reported."),
    }
    if let Some(experimental) = &report.experimental_jv {
        println!("Experimental JV reference: {}", experimental);
    }
    println!("Results archive: {}", report.archive.display());
    Ok(0)
}

pub(super) fn run_upload(paths: &StudioPaths, args: &UploadArgs) -> Result<i32, CliError> {
    let data = fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read upload '{}'", args.file.display()))?;
    let filename = args
        .file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let stored = store_experimental_jv(paths, &filename, &data)?;
    println!("Stored experimental JV file at {}", stored.display());
    Ok(0)
}

pub(super) fn run_reset(paths: &StudioPaths, args: &SessionArgs) -> Result<i32, CliError> {
    let session = session_for(paths, args);
    session.reset_to_defaults()?;
    println!(
        "Restored default device parameters for session {}",
        session.id()
    );
    Ok(0)
}

fn session_for(paths: &StudioPaths, args: &SessionArgs) -> Session {
    Session::new(SessionId::from_raw(args.session), paths.clone())
}

fn parse_assignment(edit: &str) -> Result<(&str, &str), CliError> {
    edit.split_once('=')
        .map(|(name, value)| (name.trim(), value.trim()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| {
            CliError::Usage(format!(
                "--set expects NAME=VALUE, got '{}'",
                edit
            ))
        })
}

fn state_label(state: SessionState) -> &'static str {
    match state {
        SessionState::NotStarted => "not started",
        SessionState::ParametersSaved => "parameters saved",
        SessionState::SimulationRun => "simulation run",
    }
}

fn print_metrics(metrics: &SolarCellMetrics) {
    println!("Solar cell parameters:");
    print_metric_row("Simulated", &metrics.simulated);
    print_metric_row("Experimental", &metrics.experimental);
    print_metric_row("Deviation", &metrics.deviation);
}

fn print_metric_row(label: &str, row: &BTreeMap<String, String>) {
    if row.is_empty() {
        return;
    }
    println!("  {}:", label);
    for (column, value) in row {
        println!("    {:<12} {}", column, value);
    }
}
