use super::config::{RecordMode, ScanConfig};
use super::gate::{EarlyStopGate, GateDecision};
use super::worker::WorkerContext;
use crate::core::io::input::InputWriter;
use crate::core::io::slha::{LookupError, SlhaParser, SpectrumError, SpectrumParser};
use crate::core::likelihood::{GaussianLikelihood, Likelihood};
use crate::core::point::{ParameterPoint, join_values};
use crate::core::tools::{SecondaryTool, ToolInvocation, ToolRunner};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

/// Terminator appended after every record in full-record mode.
pub const END_OF_POINT: &str = "ENDOFPARAMETERPOINT";

/// The terminal classification of one point.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The primary tool produced output. `observables` is present when the scan type consumes
    /// structured results.
    Valid {
        point: ParameterPoint,
        observables: Option<Vec<f64>>,
    },
    /// The point was not run to a usable output.
    Invalid(ParameterPoint),
    /// The early-stop gate rejected the point; it is excluded from every result collection.
    Dropped(ParameterPoint),
}

/// States a point moves through. Each state names the work already done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Start,
    InputWritten,
    PrimaryRun,
    EarlyStopped,
    OutputCheck,
    SecondaryRun,
    Persisted,
    Classified,
    Done,
}

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("spectrum could not be read: {0}")]
    Unreadable(#[from] SpectrumError),
    #[error("observable missing from spectrum: {0}")]
    Missing(#[from] LookupError),
}

/// The pluggable pieces a pipeline delegates to.
#[derive(Clone)]
pub struct Collaborators {
    pub input_writer: Arc<dyn InputWriter>,
    pub primary: Arc<dyn ToolRunner>,
    pub secondary: Vec<Arc<dyn SecondaryTool>>,
    pub parser: Arc<dyn SpectrumParser>,
    /// Likelihood for the early-stop gate; a Gaussian over the scan observables when unset.
    pub likelihood: Option<Arc<dyn Likelihood>>,
}

impl Collaborators {
    pub fn new(input_writer: Arc<dyn InputWriter>, primary: Arc<dyn ToolRunner>) -> Self {
        Self {
            input_writer,
            primary,
            secondary: Vec::new(),
            parser: Arc::new(SlhaParser),
            likelihood: None,
        }
    }

    pub fn with_secondary(mut self, tool: Arc<dyn SecondaryTool>) -> Self {
        self.secondary.push(tool);
        self
    }

    pub fn with_parser(mut self, parser: Arc<dyn SpectrumParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_likelihood(mut self, likelihood: Arc<dyn Likelihood>) -> Self {
        self.likelihood = Some(likelihood);
        self
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field(
                "secondary",
                &self.secondary.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .field("custom_likelihood", &self.likelihood.is_some())
            .finish_non_exhaustive()
    }
}

/// Runs single points from input to classification. Shared by every worker of a batch; all
/// per-point state lives in the worker's [`WorkerContext`].
pub struct PointPipeline<'a> {
    config: &'a ScanConfig,
    collaborators: &'a Collaborators,
    likelihood: Arc<dyn Likelihood>,
}

impl<'a> PointPipeline<'a> {
    pub fn new(config: &'a ScanConfig, collaborators: &'a Collaborators) -> Self {
        let likelihood = collaborators.likelihood.clone().unwrap_or_else(|| {
            Arc::new(GaussianLikelihood::from_observables(&config.observables))
                as Arc<dyn Likelihood>
        });
        Self {
            config,
            collaborators,
            likelihood,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        self.config
    }

    /// Processes one point to completion. Never fails: every error concerning the point is
    /// logged and reflected in the returned outcome.
    pub fn process(&self, point: ParameterPoint, worker: &WorkerContext) -> Outcome {
        self.process_traced(point, worker).0
    }

    /// Like [`process`](Self::process), additionally returning the stages visited.
    #[instrument(skip_all, fields(worker = worker.index(), point = %point))]
    pub fn process_traced(
        &self,
        point: ParameterPoint,
        worker: &WorkerContext,
    ) -> (Outcome, Vec<PipelineStage>) {
        let mut run = PointRun::new(self, point, worker);
        let mut stage = PipelineStage::Start;
        let mut trace = vec![stage];
        while stage != PipelineStage::Done {
            stage = run.advance(stage);
            debug!(?stage, "Pipeline stage reached.");
            trace.push(stage);
        }
        (run.finish(), trace)
    }
}

/// The mutable state of one point travelling through a pipeline.
struct PointRun<'p, 'a> {
    pipeline: &'p PointPipeline<'a>,
    worker: &'p WorkerContext,
    point: ParameterPoint,
    input_path: PathBuf,
    spectrum_path: PathBuf,
    has_output: bool,
    projection: Option<Result<Vec<f64>, ProjectionError>>,
    outcome: Option<Outcome>,
}

impl<'p, 'a> PointRun<'p, 'a> {
    fn new(
        pipeline: &'p PointPipeline<'a>,
        point: ParameterPoint,
        worker: &'p WorkerContext,
    ) -> Self {
        let primary = &pipeline.config.primary;
        Self {
            pipeline,
            worker,
            point,
            input_path: primary.input_path(worker.workdir()),
            spectrum_path: primary.output_path(worker.workdir()),
            has_output: false,
            projection: None,
            outcome: None,
        }
    }

    fn advance(&mut self, stage: PipelineStage) -> PipelineStage {
        use PipelineStage::*;
        match stage {
            Start => self.write_input(),
            InputWritten => {
                self.run_primary();
                PrimaryRun
            }
            PrimaryRun => self.early_stop(),
            EarlyStopped => {
                self.outcome = Some(Outcome::Dropped(self.point.clone()));
                Done
            }
            OutputCheck => {
                self.has_output = self.spectrum_path.is_file();
                if self.has_output {
                    self.run_secondary();
                    SecondaryRun
                } else {
                    info!("Primary tool produced no output.");
                    self.persist_missing();
                    Persisted
                }
            }
            SecondaryRun => {
                self.persist_output();
                Persisted
            }
            Persisted => {
                self.classify();
                Classified
            }
            Classified | Done => Done,
        }
    }

    fn finish(self) -> Outcome {
        self.outcome.unwrap_or(Outcome::Invalid(self.point))
    }

    fn write_input(&mut self) -> PipelineStage {
        let _ = self
            .worker
            .log()
            .line(&format!("Running point with input parameters: {}", self.point));

        // The worker directory is reused for every point; a spectrum left by the previous one
        // must not be mistaken for output of this one.
        match fs::remove_file(&self.spectrum_path) {
            Ok(()) => debug!(
                path = %self.spectrum_path.display(),
                "Removed stale primary output."
            ),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(error = %e, "Could not remove stale primary output."),
        }

        match self
            .pipeline
            .collaborators
            .input_writer
            .write(&self.point, &self.input_path)
        {
            Ok(()) => PipelineStage::InputWritten,
            Err(e) => {
                error!(error = %e, "Failed to write tool input; point is invalid.");
                self.outcome = Some(Outcome::Invalid(self.point.clone()));
                PipelineStage::Classified
            }
        }
    }

    fn run_primary(&self) {
        let invocation = ToolInvocation {
            settings: &self.pipeline.config.primary,
            spectrum: &self.spectrum_path,
            context: self.worker.tool_context(&self.point),
        };
        if let Err(e) = self.pipeline.collaborators.primary.run(&invocation) {
            error!(
                tool = %self.pipeline.config.primary.name,
                error = %e,
                "Primary tool could not be run."
            );
            let _ = self.worker.log().line(&e.to_string());
        }
    }

    fn early_stop(&self) -> PipelineStage {
        let Some(early_stop) = self.pipeline.config.early_stop else {
            return PipelineStage::OutputCheck;
        };
        let gate = EarlyStopGate::new(
            early_stop,
            &self.pipeline.config.observables,
            self.pipeline.collaborators.parser.as_ref(),
            self.pipeline.likelihood.as_ref(),
        );
        match gate.check(&self.spectrum_path) {
            GateDecision::Pass => PipelineStage::OutputCheck,
            GateDecision::Drop { likelihood } => {
                info!(
                    likelihood,
                    "Stopping further calculations for this point because of bad likelihood."
                );
                let _ = self.worker.log().line(&format!(
                    "Likelihood {} below threshold {}; point dropped.",
                    likelihood, early_stop.threshold
                ));
                PipelineStage::EarlyStopped
            }
        }
    }

    fn run_secondary(&self) {
        let context = self.worker.tool_context(&self.point);
        for tool in &self.pipeline.collaborators.secondary {
            if let Err(e) = tool.run(&self.spectrum_path, context) {
                warn!(
                    tool = tool.name(),
                    error = %e,
                    "Secondary tool failed; continuing with the remaining tools."
                );
                let _ = self.worker.log().line(&e.to_string());
            }
        }
    }

    /// Parses the spectrum at most once per point.
    fn projection<'r>(
        cache: &'r mut Option<Result<Vec<f64>, ProjectionError>>,
        pipeline: &PointPipeline<'_>,
        spectrum: &Path,
    ) -> &'r Result<Vec<f64>, ProjectionError> {
        cache.get_or_insert_with(|| {
            let parsed = pipeline.collaborators.parser.read(spectrum)?;
            Ok(pipeline.config.observables.project(&parsed)?)
        })
    }

    fn persist_missing(&self) {
        if self.pipeline.config.record_mode != RecordMode::Full {
            return;
        }
        match fs::read(&self.input_path) {
            Ok(mut record) => {
                record.extend_from_slice(END_OF_POINT.as_bytes());
                record.push(b'\n');
                self.append(&record);
            }
            Err(e) => warn!(
                error = %e,
                "Input file unavailable; nothing recorded for invalid point."
            ),
        }
    }

    fn persist_output(&mut self) {
        match self.pipeline.config.record_mode {
            RecordMode::Compact => {
                let line = match Self::projection(
                    &mut self.projection,
                    self.pipeline,
                    &self.spectrum_path,
                ) {
                    Ok(observables) => compact_line(&self.point, observables),
                    Err(e) => {
                        warn!(
                            error = %e,
                            "Observable(s) missing in spectrum file; no record written."
                        );
                        return;
                    }
                };
                self.append(line.as_bytes());
            }
            RecordMode::Full => match fs::read(&self.spectrum_path) {
                Ok(mut record) => {
                    record.extend_from_slice(END_OF_POINT.as_bytes());
                    record.push(b'\n');
                    self.append(&record);
                }
                Err(e) => error!(error = %e, "Spectrum vanished before it could be recorded."),
            },
        }
    }

    fn append(&self, record: &[u8]) {
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.worker.output_path())
            .and_then(|mut file| file.write_all(record));
        if let Err(e) = result {
            error!(
                path = %self.worker.output_path().display(),
                error = %e,
                "Failed to append point record."
            );
        }
    }

    /// A point whose compact record or structured result cannot be built is invalid, so
    /// every valid point has its observables somewhere.
    fn classify(&mut self) {
        let config = &self.pipeline.config;
        let outcome = if !self.has_output {
            Outcome::Invalid(self.point.clone())
        } else if config.needs_projection() {
            match Self::projection(&mut self.projection, self.pipeline, &self.spectrum_path) {
                Ok(observables) => Outcome::Valid {
                    point: self.point.clone(),
                    observables: config
                        .scan_type
                        .requires_structured_results()
                        .then(|| observables.clone()),
                },
                Err(e) => {
                    warn!(error = %e, "Observable(s) missing in spectrum file; point is invalid.");
                    Outcome::Invalid(self.point.clone())
                }
            }
        } else {
            Outcome::Valid {
                point: self.point.clone(),
                observables: None,
            }
        };
        self.outcome = Some(outcome);
    }
}

fn compact_line(point: &ParameterPoint, observables: &[f64]) -> String {
    let mut values = point.values().to_vec();
    values.extend_from_slice(observables);
    format!("{}\n", join_values(&values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::input::InputError;
    use crate::core::observables::{Observable, ObservableSet};
    use crate::core::tools::{ToolContext, ToolError, ToolSettings};
    use crate::engine::config::{EarlyStopConfig, ScanConfigBuilder};
    use crate::engine::scan_type::ScanType;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::{TempDir, tempdir};

    struct StubWriter {
        fail: bool,
    }

    impl InputWriter for StubWriter {
        fn write(&self, point: &ParameterPoint, destination: &Path) -> Result<(), InputError> {
            if self.fail {
                return Err(InputError::DimensionMismatch {
                    expected: 3,
                    got: point.len(),
                });
            }
            fs::write(destination, format!("input {}\n", point)).unwrap();
            Ok(())
        }
    }

    /// Writes `output` as spectrum, or nothing when `None`.
    struct StubPrimary {
        output: Option<String>,
        calls: AtomicUsize,
    }

    impl StubPrimary {
        fn producing(output: Option<&str>) -> Arc<Self> {
            Arc::new(Self {
                output: output.map(str::to_string),
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl ToolRunner for StubPrimary {
        fn run(&self, invocation: &ToolInvocation<'_>) -> Result<(), ToolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(output) = &self.output {
                fs::write(invocation.spectrum, output).unwrap();
            }
            Ok(())
        }
    }

    struct CountingTool {
        name: String,
        fail: bool,
        calls: AtomicUsize,
    }

    impl CountingTool {
        fn new(name: &str, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                fail,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl SecondaryTool for CountingTool {
        fn name(&self) -> &str {
            &self.name
        }

        fn run(&self, _spectrum: &Path, _context: ToolContext<'_>) -> Result<(), ToolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ToolError::Failed {
                    tool: self.name.clone(),
                    message: "crashed".to_string(),
                });
            }
            Ok(())
        }
    }

    const SPECTRUM: &str = "Block MASS\n   25   3.0\n   35   4.0\n";

    struct Fixture {
        _dir: TempDir,
        config: ScanConfig,
        worker: WorkerContext,
    }

    fn fixture(scan_type: ScanType, mode: RecordMode, early_stop: Option<f64>) -> Fixture {
        let dir = tempdir().unwrap();
        let config = ScanConfigBuilder::new()
            .scan_type(scan_type)
            .record_mode(mode)
            .early_stop(early_stop.map(|threshold| EarlyStopConfig { threshold }))
            .temp_dir(dir.path().join("Temp"))
            .output_dir(dir.path().join("Output"))
            .primary(
                ToolSettings::new("SPheno", "/opt", "SPheno")
                    .with_input("LesHouches.in")
                    .with_output("SPheno.spc"),
            )
            .observables(ObservableSet::new(vec![
                Observable::new("mh", "MASS", 25i64, 3.0).with_variance(1.0),
                Observable::new("mH", "MASS", 35i64, 4.0),
            ]))
            .build()
            .unwrap();
        fs::create_dir_all(config.output_dir()).unwrap();
        let worker = WorkerContext::prepare(0, &config).unwrap();
        Fixture {
            _dir: dir,
            config,
            worker,
        }
    }

    fn collaborators(primary: Arc<StubPrimary>) -> Collaborators {
        Collaborators::new(Arc::new(StubWriter { fail: false }), primary)
    }

    fn recorded(fixture: &Fixture) -> String {
        fs::read_to_string(fixture.worker.output_path()).unwrap_or_default()
    }

    fn point() -> ParameterPoint {
        ParameterPoint::new(vec![1.0, 2.0])
    }

    #[test]
    fn compact_mode_writes_point_and_observables_on_one_line() {
        let fx = fixture(ScanType::Grid, RecordMode::Compact, None);
        let collab = collaborators(StubPrimary::producing(Some(SPECTRUM)));
        let pipeline = PointPipeline::new(&fx.config, &collab);

        let (outcome, stages) = pipeline.process_traced(point(), &fx.worker);

        assert_eq!(
            outcome,
            Outcome::Valid {
                point: point(),
                observables: None
            }
        );
        assert_eq!(recorded(&fx), "1.0 2.0 3.0 4.0\n");
        assert_eq!(
            stages,
            vec![
                PipelineStage::Start,
                PipelineStage::InputWritten,
                PipelineStage::PrimaryRun,
                PipelineStage::OutputCheck,
                PipelineStage::SecondaryRun,
                PipelineStage::Persisted,
                PipelineStage::Classified,
                PipelineStage::Done,
            ]
        );
    }

    #[test]
    fn full_mode_appends_raw_output_and_terminator() {
        let fx = fixture(ScanType::Random, RecordMode::Full, None);
        let collab = collaborators(StubPrimary::producing(Some("X")));
        let pipeline = PointPipeline::new(&fx.config, &collab);

        pipeline.process(point(), &fx.worker);
        pipeline.process(point(), &fx.worker);

        assert_eq!(
            recorded(&fx),
            "XENDOFPARAMETERPOINT\nXENDOFPARAMETERPOINT\n"
        );
    }

    #[test]
    fn missing_output_in_full_mode_records_input_and_is_invalid() {
        let fx = fixture(ScanType::Grid, RecordMode::Full, None);
        let secondary = CountingTool::new("HiggsBounds", false);
        let collab = collaborators(StubPrimary::producing(None)).with_secondary(secondary.clone());
        let pipeline = PointPipeline::new(&fx.config, &collab);

        let outcome = pipeline.process(point(), &fx.worker);

        assert_eq!(outcome, Outcome::Invalid(point()));
        assert_eq!(recorded(&fx), "input 1.0 2.0\nENDOFPARAMETERPOINT\n");
        assert_eq!(secondary.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn missing_output_in_compact_mode_writes_nothing() {
        let fx = fixture(ScanType::Grid, RecordMode::Compact, None);
        let collab = collaborators(StubPrimary::producing(None));
        let pipeline = PointPipeline::new(&fx.config, &collab);

        assert_eq!(pipeline.process(point(), &fx.worker), Outcome::Invalid(point()));
        assert_eq!(recorded(&fx), "");
    }

    #[test]
    fn early_stop_drops_point_without_running_secondary_tools() {
        let fx = fixture(ScanType::Grid, RecordMode::Full, Some(0.5));
        let secondary = CountingTool::new("HiggsBounds", false);
        let collab = collaborators(StubPrimary::producing(Some(
            "Block MASS\n   25   30.0\n   35   4.0\n",
        )))
        .with_secondary(secondary.clone());
        let pipeline = PointPipeline::new(&fx.config, &collab);

        let (outcome, stages) = pipeline.process_traced(point(), &fx.worker);

        assert_eq!(outcome, Outcome::Dropped(point()));
        assert_eq!(secondary.calls.load(Ordering::SeqCst), 0);
        assert_eq!(recorded(&fx), "");
        assert!(stages.contains(&PipelineStage::EarlyStopped));
        assert!(!stages.contains(&PipelineStage::Persisted));
    }

    #[test]
    fn early_stop_with_custom_likelihood_passes_good_points() {
        let fx = fixture(ScanType::Grid, RecordMode::Full, Some(0.5));
        let secondary = CountingTool::new("HiggsBounds", false);
        let collab = collaborators(StubPrimary::producing(Some(SPECTRUM)))
            .with_secondary(secondary.clone())
            .with_likelihood(Arc::new(|values: &[f64]| if values[0] == 3.0 { 1.0 } else { 0.0 }));
        let pipeline = PointPipeline::new(&fx.config, &collab);

        assert!(matches!(
            pipeline.process(point(), &fx.worker),
            Outcome::Valid { .. }
        ));
        assert_eq!(secondary.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failing_secondary_tool_does_not_stop_the_chain() {
        let fx = fixture(ScanType::Grid, RecordMode::Full, None);
        let broken = CountingTool::new("Vevacious", true);
        let healthy = CountingTool::new("micrOMEGAs", false);
        let collab = collaborators(StubPrimary::producing(Some(SPECTRUM)))
            .with_secondary(broken.clone())
            .with_secondary(healthy.clone());
        let pipeline = PointPipeline::new(&fx.config, &collab);

        assert!(matches!(
            pipeline.process(point(), &fx.worker),
            Outcome::Valid { .. }
        ));
        assert_eq!(broken.calls.load(Ordering::SeqCst), 1);
        assert_eq!(healthy.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn structured_scans_report_observables_or_invalid() {
        let fx = fixture(ScanType::Mcmc, RecordMode::Full, None);
        let complete = collaborators(StubPrimary::producing(Some(SPECTRUM)));
        assert_eq!(
            PointPipeline::new(&fx.config, &complete).process(point(), &fx.worker),
            Outcome::Valid {
                point: point(),
                observables: Some(vec![3.0, 4.0])
            }
        );

        let partial = collaborators(StubPrimary::producing(Some("Block MASS\n   25   3.0\n")));
        assert_eq!(
            PointPipeline::new(&fx.config, &partial).process(point(), &fx.worker),
            Outcome::Invalid(point())
        );
    }

    #[test]
    fn compact_mode_without_observables_is_invalid_for_every_scan_type() {
        for scan_type in [ScanType::Grid, ScanType::Random, ScanType::Mls] {
            let fx = fixture(scan_type, RecordMode::Compact, None);
            let collab =
                collaborators(StubPrimary::producing(Some("Block MASS\n   24   80.0\n")));
            let pipeline = PointPipeline::new(&fx.config, &collab);

            assert_eq!(
                pipeline.process(point(), &fx.worker),
                Outcome::Invalid(point()),
                "{}",
                scan_type
            );
            assert_eq!(recorded(&fx), "");
        }
    }

    #[test]
    fn compact_grid_point_is_valid_and_recorded() {
        let fx = fixture(ScanType::Grid, RecordMode::Compact, None);
        let collab = collaborators(StubPrimary::producing(Some(SPECTRUM)));
        let pipeline = PointPipeline::new(&fx.config, &collab);

        assert_eq!(
            pipeline.process(point(), &fx.worker),
            Outcome::Valid {
                point: point(),
                observables: None
            }
        );
        assert_eq!(recorded(&fx), "1.0 2.0 3.0 4.0\n");
    }

    #[test]
    fn input_write_failure_is_invalid_and_skips_primary() {
        let fx = fixture(ScanType::Grid, RecordMode::Full, None);
        let primary = StubPrimary::producing(Some(SPECTRUM));
        let collab = Collaborators::new(Arc::new(StubWriter { fail: true }), primary.clone());
        let pipeline = PointPipeline::new(&fx.config, &collab);

        let (outcome, stages) = pipeline.process_traced(point(), &fx.worker);

        assert_eq!(outcome, Outcome::Invalid(point()));
        assert_eq!(primary.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            stages,
            vec![
                PipelineStage::Start,
                PipelineStage::Classified,
                PipelineStage::Done
            ]
        );
    }

    #[test]
    fn stale_spectrum_from_previous_point_is_not_reused() {
        let fx = fixture(ScanType::Grid, RecordMode::Compact, None);
        let good = collaborators(StubPrimary::producing(Some(SPECTRUM)));
        PointPipeline::new(&fx.config, &good).process(point(), &fx.worker);

        let silent = collaborators(StubPrimary::producing(None));
        let outcome = PointPipeline::new(&fx.config, &silent)
            .process(ParameterPoint::new(vec![5.0, 6.0]), &fx.worker);

        assert_eq!(outcome, Outcome::Invalid(ParameterPoint::new(vec![5.0, 6.0])));
        assert_eq!(recorded(&fx), "1.0 2.0 3.0 4.0\n");
    }
}
