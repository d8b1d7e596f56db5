use super::export::export_history;
use super::sampling::PointSource;
use crate::cli::RunArgs;
use crate::config::builder::build_config;
use crate::config::models::AppConfig;
use crate::error::{CliError, Result};
use crate::ui::{CliProgressHandler, UiEvent};
use std::fs;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use xbit::core::io::input::TemplateInputWriter;
use xbit::core::tools::{ExternalCommand, HepTool, SecondaryTool, ToolRunner};
use xbit::engine::pipeline::Collaborators;
use xbit::engine::progress::{Progress, ProgressReporter};
use xbit::engine::scan_type::ScanType;
use xbit::workflows::scan::Runner;

pub async fn run(args: RunArgs, ui_sender: mpsc::Sender<UiEvent>) -> Result<()> {
    info!("Merging configuration from scan file and CLI arguments...");
    let app = build_config(&args)?;

    if app.clean && app.scan.temp_dir.exists() {
        info!("Removing temporary directory {:?}", &app.scan.temp_dir);
        fs::remove_dir_all(&app.scan.temp_dir)?;
    }

    let collaborators = build_collaborators(&app)?;
    let mut source = point_source(&app)?;

    let progress_handler = CliProgressHandler::new(ui_sender);
    let reporter = ProgressReporter::new(progress_handler.callback());

    println!(
        "Starting {} scan '{}' on {} core(s)...",
        app.scan.scan_type, app.scan.name, app.scan.cores
    );
    let output_dir = app.scan.output_dir.clone();
    let observables: Vec<String> = app
        .scan
        .observables
        .names()
        .into_iter()
        .map(str::to_string)
        .collect();
    let variables = app.variable_names();

    let history = tokio::task::block_in_place(|| -> Result<_> {
        let mut runner = Runner::new(app.scan, collaborators)?;
        run_batches(
            &mut runner,
            &mut source,
            app.points_per_iteration,
            app.iterations,
            &reporter,
        )?;
        Ok(runner.into_history())
    })?;

    let observable_names: Vec<&str> = observables.iter().map(String::as_str).collect();
    let files = export_history(&history, &variables, &observable_names, &output_dir)?;

    println!(
        "Scan complete: {} valid, {} invalid, {} dropped point(s).",
        history.valid.len(),
        history.invalid.len(),
        history.dropped
    );
    for file in files {
        println!("  Results written to: {}", file.display());
    }

    Ok(())
}

/// Feeds the source to the runner batch by batch. A finite source (grid or point file) is
/// always run to the end in batches of `batch_size`; `iterations` bounds only sampled
/// sources. Returns the number of batches run.
fn run_batches(
    runner: &mut Runner,
    source: &mut PointSource,
    batch_size: usize,
    iterations: usize,
    reporter: &ProgressReporter,
) -> Result<usize> {
    let mut batches = 0;
    loop {
        let finite = source.remaining().is_some();
        if !finite && batches == iterations {
            break;
        }
        let points = source.next_batch(batch_size);
        if points.is_empty() {
            break;
        }
        batches += 1;

        let label = match source.remaining() {
            Some(left) => format!("Batch {}: {} point(s), {} left", batches, points.len(), left),
            None => format!(
                "Iteration {}/{}: {} point(s)",
                batches,
                iterations,
                points.len()
            ),
        };
        reporter.report(Progress::Message(label));

        let summary = runner.run_batch(points, reporter)?;
        if !summary.is_complete() {
            warn!(
                "{} point(s) of batch {} were not processed.",
                summary.unprocessed, batches
            );
        }
    }
    info!(batches, "Point source finished.");
    Ok(batches)
}

pub fn list_scan_types() -> Result<()> {
    for scan_type in ScanType::ALL {
        let note = if scan_type.requires_structured_results() {
            " (structured results)"
        } else {
            ""
        };
        println!("{}{}", scan_type, note);
    }
    Ok(())
}

fn build_collaborators(app: &AppConfig) -> Result<Collaborators> {
    let writer = TemplateInputWriter::from_path(&app.input_template, &app.variable_names())
        .map_err(|e| CliError::Parse {
            path: app.input_template.clone(),
            source: e.into(),
        })?;
    for index in writer.unused_variables() {
        warn!(
            "Variable '{}' does not appear in the input template.",
            app.variables[index].name
        );
    }

    let runner: Arc<dyn ToolRunner> = Arc::new(ExternalCommand);
    let mut collaborators = Collaborators::new(Arc::new(writer), Arc::clone(&runner));
    for settings in &app.secondary_tools {
        let tool: Arc<dyn SecondaryTool> =
            Arc::new(HepTool::new(settings.clone(), Arc::clone(&runner)));
        collaborators = collaborators.with_secondary(tool);
    }
    Ok(collaborators)
}

fn point_source(app: &AppConfig) -> Result<PointSource> {
    if let Some(path) = &app.points_file {
        return PointSource::from_file(path, app.variables.len());
    }
    Ok(match app.scan.scan_type {
        ScanType::Grid => PointSource::grid(&app.variables),
        _ => PointSource::uniform(app.variables.clone(), app.seed),
    })
}
