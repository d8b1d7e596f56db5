use crate::error::{CliError, Result};
use crate::ui::UiEvent;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing_subscriber::{
    EnvFilter,
    filter::LevelFilter,
    fmt::{
        self, MakeWriter,
        format::{Compact, DefaultFields, Format, Full},
    },
    prelude::*,
};

/// Console writer that hands each formatted event to the UI task, so log lines are printed
/// above the progress bars instead of through them. Falls back to stderr when the UI is gone.
#[derive(Clone)]
pub struct UiLogWriter {
    sender: mpsc::Sender<UiEvent>,
}

impl UiLogWriter {
    pub fn new(sender: mpsc::Sender<UiEvent>) -> Self {
        Self { sender }
    }
}

impl Write for UiLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let line = String::from_utf8_lossy(buf).trim_end().to_string();
        if !line.is_empty() && self.sender.try_send(UiEvent::Log(line)).is_err() {
            io::stderr().write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for UiLogWriter {
    type Writer = UiLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn level_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbosity) {
        (true, _) => LevelFilter::OFF,
        (false, 0) => LevelFilter::WARN,
        (false, 1) => LevelFilter::INFO,
        (false, 2) => LevelFilter::DEBUG,
        (false, _) => LevelFilter::TRACE,
    }
}

fn console_layer<S>(
    sender: mpsc::Sender<UiEvent>,
) -> fmt::Layer<S, DefaultFields, Format<Compact>, UiLogWriter> {
    fmt::layer()
        .with_writer(UiLogWriter::new(sender))
        .with_ansi(true)
        .with_target(false)
        .compact()
}

/// Workers run on named threads (`xbit-worker-N`), so the file log records thread names to
/// tell their interleaved lines apart.
fn file_layer<S>(file: File) -> fmt::Layer<S, DefaultFields, Format<Full>, File> {
    fmt::layer()
        .with_writer(file)
        .with_ansi(false)
        .with_thread_names(true)
        .with_target(true)
}

pub fn setup_logging(
    verbosity: u8,
    quiet: bool,
    log_file: Option<PathBuf>,
    ui_sender: mpsc::Sender<UiEvent>,
) -> Result<()> {
    // RUST_LOG refines the command-line level, e.g. `xbit::engine=trace`.
    let filter = EnvFilter::builder()
        .with_default_directive(level_filter(verbosity, quiet).into())
        .from_env_lossy();

    let file = log_file
        .map(|path| File::create(&path))
        .transpose()
        .map_err(CliError::Io)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer(ui_sender))
        .with(file.map(file_layer))
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::sync::Once;
    use std::thread;
    use tracing::{debug, info, warn};

    static GLOBAL: Once = Once::new();

    #[test]
    #[serial]
    fn global_subscriber_accepts_events_at_every_level() {
        GLOBAL.call_once(|| {
            let (sender, _receiver) = mpsc::channel(16);
            setup_logging(3, false, None, sender).unwrap();
        });

        warn!(worker = 0, "queue pop failed");
        info!(points = 3, "batch started");
        debug!(stage = "PrimaryRun", "stage reached");
    }

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_filter(0, false), LevelFilter::WARN);
        assert_eq!(level_filter(1, false), LevelFilter::INFO);
        assert_eq!(level_filter(2, false), LevelFilter::DEBUG);
        assert_eq!(level_filter(9, false), LevelFilter::TRACE);
        assert_eq!(level_filter(2, true), LevelFilter::OFF);
    }

    #[test]
    #[serial]
    fn console_events_are_forwarded_to_the_ui() {
        let (sender, mut receiver) = mpsc::channel(16);
        let subscriber = tracing_subscriber::registry().with(console_layer(sender));

        tracing::subscriber::with_default(subscriber, || {
            warn!("Secondary tool failed.");
        });

        match receiver.try_recv() {
            Ok(UiEvent::Log(line)) => {
                assert!(line.contains("WARN"));
                assert!(line.contains("Secondary tool failed."));
                assert!(!line.ends_with('\n'));
            }
            other => panic!("Expected a log event, got {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn file_log_names_the_worker_thread() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.log");
        let subscriber =
            tracing_subscriber::registry().with(file_layer(File::create(&path).unwrap()));

        tracing::subscriber::with_default(subscriber, || {
            let dispatch = tracing::dispatcher::get_default(|d| d.clone());
            thread::Builder::new()
                .name("xbit-worker-3".to_string())
                .spawn(move || {
                    tracing::dispatcher::with_default(&dispatch, || {
                        info!("point classified");
                    })
                })
                .unwrap()
                .join()
                .unwrap();
        });

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("xbit-worker-3"));
        assert!(content.contains("point classified"));
        assert!(!content.contains("\u{1b}["));
    }

    #[test]
    #[serial]
    fn unwritable_log_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let (sender, _receiver) = mpsc::channel(1);

        let result = setup_logging(0, false, Some(dir.path().to_path_buf()), sender);
        assert!(matches!(result, Err(CliError::Io(_))));
    }
}
