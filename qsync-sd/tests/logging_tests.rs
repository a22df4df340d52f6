//! Config loading before the global subscriber exists
//!
//! Tests cover:
//! - Records emitted while loading the config file reach a subscriber
//! - Invalid timings surface as a configuration error

use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use qsync_sd::logging::load_config_with_writer;
use qsync_sd::Error;
use tempfile::TempDir;
use tracing_subscriber::fmt::MakeWriter;

/// In-memory log sink
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Captured {
    type Writer = Captured;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn test_missing_config_file_is_logged() {
    let captured = Captured::default();
    let path = Path::new("/nonexistent/qsync/config.toml");

    let config = load_config_with_writer(Some(path), captured.clone()).unwrap();

    assert_eq!(config.server.port, 8080, "falls back to compiled defaults");
    let output = captured.text();
    assert!(output.contains("not found"), "missing file warning was dropped: {output:?}");
    assert!(output.contains("/nonexistent/qsync/config.toml"));
}

#[test]
fn test_invalid_timings_are_config_errors() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[timings]\nstatus_interval_secs = 0\n").unwrap();

    let result = load_config_with_writer(Some(&path), Captured::default());

    assert!(matches!(result, Err(Error::Config(_))));
}
