use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::warn;
use xbit::core::point::ParameterPoint;
use xbit::engine::progress::{Progress, ProgressCallback};

const EVENT_BUFFER: usize = 1024;

#[derive(Debug)]
pub enum UiEvent {
    Progress(Progress),
    Log(String),
}

/// Bars of the batch currently running: one overall bar and one status line per core.
struct BatchDisplay {
    overall: ProgressBar,
    cores: Vec<ProgressBar>,
}

impl BatchDisplay {
    fn clear(self) {
        for core in self.cores {
            core.finish_and_clear();
        }
        self.overall.finish_and_clear();
    }
}

/// Owns the terminal while a scan runs. Log lines and progress events arrive on one
/// channel so they never tear each other apart on screen.
pub struct UiManager {
    mp: MultiProgress,
    display: Option<BatchDisplay>,
    events: mpsc::Receiver<UiEvent>,
    shutdown: watch::Receiver<bool>,
    _anchor: ProgressBar,
}

impl UiManager {
    pub fn new() -> (Self, mpsc::Sender<UiEvent>, watch::Sender<bool>) {
        let (event_sender, events) = mpsc::channel(EVENT_BUFFER);
        let (shutdown_sender, shutdown) = watch::channel(false);
        let mp = MultiProgress::with_draw_target(ProgressDrawTarget::stderr_with_hz(12));
        let _anchor = mp.add(ProgressBar::hidden());

        let manager = Self {
            mp,
            display: None,
            events,
            shutdown,
            _anchor,
        };
        (manager, event_sender, shutdown_sender)
    }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                Some(event) = self.events.recv() => self.handle_event(event),
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        // Log lines emitted right before shutdown are still queued.
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event);
        }
        if let Some(display) = self.display.take() {
            display.clear();
        }
        self._anchor.finish_and_clear();
    }

    fn handle_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Log(line) => self.println(line),
            UiEvent::Progress(progress) => self.handle_progress(progress),
        }
    }

    fn handle_progress(&mut self, progress: Progress) {
        match progress {
            Progress::BatchStarted {
                batch,
                points,
                workers,
            } => self.start_batch(batch, points, workers),
            Progress::QueueSize { remaining, total } => {
                if let Some(display) = &self.display {
                    display.overall.set_length(total as u64);
                    display
                        .overall
                        .set_position(total.saturating_sub(remaining) as u64);
                }
            }
            Progress::PointStarted { worker, point } => self.show_point(worker, &point),
            Progress::BatchFinished {
                batch,
                valid,
                invalid,
                dropped,
                unprocessed,
            } => {
                if let Some(display) = self.display.take() {
                    display.clear();
                }
                let mut line = format!(
                    "✓ Batch {}: {} valid, {} invalid, {} dropped",
                    batch, valid, invalid, dropped
                );
                if unprocessed > 0 {
                    line.push_str(&format!(", {} not run", unprocessed));
                }
                self.println(line);
            }
            Progress::Message(msg) => self.println(format!("  {}", msg)),
        }
    }

    fn start_batch(&mut self, batch: usize, points: usize, workers: usize) {
        if let Some(previous) = self.display.take() {
            previous.clear();
        }

        let overall = self.mp.add(ProgressBar::new(points as u64));
        overall.set_style(bar_style());
        overall.set_message(format!("Batch {}", batch));

        let cores = (0..workers)
            .map(|index| {
                let core = self.mp.add(ProgressBar::new_spinner());
                core.set_style(core_style());
                core.enable_steady_tick(Duration::from_millis(120));
                core.set_message(format!("core {}: waiting", index));
                core
            })
            .collect();

        self.display = Some(BatchDisplay { overall, cores });
    }

    fn show_point(&self, worker: usize, point: &ParameterPoint) {
        if let Some(core) = self.display.as_ref().and_then(|d| d.cores.get(worker)) {
            core.set_message(format!("core {}: {}", worker, point));
        }
    }

    fn println(&self, line: String) {
        self.mp.println(line).ok();
    }
}

fn core_style() -> ProgressStyle {
    ProgressStyle::with_template("  {spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg:<12} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .with_key(
            "eta",
            |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                let _ = write!(w, "{:.0}s", state.eta().as_secs_f64());
            },
        )
        .progress_chars("━╸ ")
}

/// Turns engine progress events into [`UiEvent`]s on the UI channel.
#[derive(Clone)]
pub struct CliProgressHandler {
    sender: mpsc::Sender<UiEvent>,
}

impl CliProgressHandler {
    pub fn new(sender: mpsc::Sender<UiEvent>) -> Self {
        Self { sender }
    }

    pub fn callback(&self) -> ProgressCallback<'static> {
        let sender = self.sender.clone();
        Box::new(move |progress: Progress| {
            // Per-point and queue events are cosmetic; losing some under load is fine.
            let cosmetic = matches!(
                progress,
                Progress::PointStarted { .. } | Progress::QueueSize { .. }
            );
            if let Err(e) = sender.try_send(UiEvent::Progress(progress)) {
                if !cosmetic {
                    warn!("Progress update could not reach the display: {}", e);
                }
            }
        })
    }
}
