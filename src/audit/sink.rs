//! Append-only JSON-lines audit log.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::runtime::{Handle, RuntimeFlavor};

use crate::audit::event::AuditEvent;
use crate::config::AuditConfig;
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit log IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("audit event serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Read direction for [`AuditSink::read_page`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    Asc,
    /// Most recently appended first.
    #[default]
    Desc,
}

/// A window over the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    pub limit: usize,
    pub offset: usize,
    pub order: Order,
}

/// Single-writer audit log. One lock per sink serializes appends so lines
/// never interleave; the file is opened (and its directory created) on
/// first append.
pub struct AuditSink {
    path: PathBuf,
    enabled: bool,
    file: Mutex<Option<File>>,
}

impl AuditSink {
    pub fn new(path: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            path: path.into(),
            enabled,
            file: Mutex::new(None),
        }
    }

    pub fn from_config(config: &AuditConfig) -> Self {
        Self::new(&config.log_path, config.enabled)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event. A disabled sink accepts and drops everything.
    ///
    /// The event's timestamp is replaced with the current time while the
    /// lock is held, so timestamps follow append order.
    pub fn append(&self, mut event: AuditEvent) -> Result<(), AuditError> {
        if !self.enabled {
            return Ok(());
        }

        let mut guard = self.file.lock().unwrap_or_else(|e| e.into_inner());

        event.timestamp = Utc::now();
        let mut line = serde_json::to_vec(&event)?;
        line.push(b'\n');

        let file = match guard.take() {
            Some(file) => file,
            None => open_append(&self.path)?,
        };
        let file = guard.insert(file);

        if let Err(e) = file.write_all(&line).and_then(|_| file.flush()) {
            // Reopen on the next append; the file may have been rotated away.
            *guard = None;
            return Err(e.into());
        }
        Ok(())
    }

    /// Append, logging instead of failing. Auditing never aborts a request.
    ///
    /// Called from handlers; on a multi-threaded runtime the blocking write
    /// runs through `block_in_place` so other tasks move off this worker.
    pub fn record(&self, event: AuditEvent) {
        if !self.enabled {
            return;
        }
        let action = event.action.clone();
        if let Err(e) = run_blocking(|| self.append(event)) {
            tracing::warn!(error = %e, action = %action, path = %self.path.display(), "Failed to write audit event");
            metrics::record_audit_failure();
        }
    }

    /// Read a window of events. Lines that do not parse (for example a
    /// truncated trailing write) are skipped. A missing file reads as empty.
    pub fn read_page(&self, query: PageQuery) -> Result<Vec<AuditEvent>, AuditError> {
        read_page(&self.path, query)
    }
}

fn run_blocking<R>(f: impl FnOnce() -> R) -> R {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

fn open_append(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// See [`AuditSink::read_page`].
pub fn read_page(path: &Path, query: PageQuery) -> Result<Vec<AuditEvent>, AuditError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    if query.limit == 0 {
        return Ok(Vec::new());
    }

    let window = query.offset.saturating_add(query.limit);
    let mut events = parsed_lines(BufReader::new(file));

    match query.order {
        Order::Asc => events
            .by_ref()
            .skip(query.offset)
            .take(query.limit)
            .collect(),
        Order::Desc => {
            // Keep only the newest `offset + limit` events while scanning.
            let mut newest: VecDeque<AuditEvent> = VecDeque::new();
            for event in events {
                let event = event?;
                if newest.len() == window {
                    newest.pop_front();
                }
                newest.push_back(event);
            }
            Ok(newest
                .into_iter()
                .rev()
                .skip(query.offset)
                .take(query.limit)
                .collect())
        }
    }
}

fn parsed_lines<R: BufRead>(reader: R) -> impl Iterator<Item = Result<AuditEvent, AuditError>> {
    reader.split(b'\n').filter_map(|line| match line {
        Ok(bytes) => serde_json::from_slice::<AuditEvent>(&bytes).ok().map(Ok),
        Err(e) => Some(Err(AuditError::Io(e))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::event::Outcome;
    use std::sync::Arc;
    use std::thread;

    fn event(target: &str) -> AuditEvent {
        AuditEvent::new("report", target, Outcome::Success)
    }

    fn page(limit: usize, offset: usize, order: Order) -> PageQuery {
        PageQuery { limit, offset, order }
    }

    fn targets(events: &[AuditEvent]) -> Vec<&str> {
        events.iter().map(|e| e.target.as_str()).collect()
    }

    #[test]
    fn test_disabled_sink_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.log");
        let sink = AuditSink::new(&path, false);

        sink.append(event("SN001")).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_creates_parent_dirs_and_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/nested/audit.log");
        let sink = AuditSink::new(&path, true);

        sink.append(event("SN001")).unwrap();
        sink.append(event("SN002")).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn test_timestamp_is_assigned_by_sink() {
        let dir = tempfile::tempdir().unwrap();
        let sink = AuditSink::new(dir.path().join("audit.log"), true);

        let mut stale = event("SN001");
        stale.timestamp = chrono::DateTime::from_timestamp(0, 0).unwrap();
        let before = Utc::now();
        sink.append(stale).unwrap();

        let read = sink.read_page(page(1, 0, Order::Desc)).unwrap();
        assert!(read[0].timestamp >= before);
    }

    #[test]
    fn test_round_trip_desc_limit_one() {
        let dir = tempfile::tempdir().unwrap();
        let sink = AuditSink::new(dir.path().join("audit.log"), true);
        sink.append(event("SN001")).unwrap();

        let expected = AuditEvent::new("apply_config", "SN002", Outcome::Failure)
            .with_error("boom")
            .with_metadata("templateId", 7);
        sink.append(expected.clone()).unwrap();

        let read = sink.read_page(page(1, 0, Order::Desc)).unwrap();
        assert_eq!(read.len(), 1);
        let mut got = read[0].clone();
        got.timestamp = expected.timestamp;
        assert_eq!(got, expected);
    }

    #[test]
    fn test_paging_windows() {
        let dir = tempfile::tempdir().unwrap();
        let sink = AuditSink::new(dir.path().join("audit.log"), true);
        for i in 0..5 {
            sink.append(event(&format!("e{}", i))).unwrap();
        }

        let asc = sink.read_page(page(2, 1, Order::Asc)).unwrap();
        assert_eq!(targets(&asc), vec!["e1", "e2"]);

        let desc = sink.read_page(page(2, 1, Order::Desc)).unwrap();
        assert_eq!(targets(&desc), vec!["e3", "e2"]);

        let tail = sink.read_page(page(10, 3, Order::Desc)).unwrap();
        assert_eq!(targets(&tail), vec!["e1", "e0"]);

        assert!(sink.read_page(page(10, 5, Order::Asc)).unwrap().is_empty());
        assert!(sink.read_page(page(10, 99, Order::Desc)).unwrap().is_empty());
        assert!(sink.read_page(page(0, 0, Order::Desc)).unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.log");
        let sink = AuditSink::new(&path, true);
        sink.append(event("good-1")).unwrap();
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(b"not json\n\xff\xfe\n").unwrap();
        }
        sink.append(event("good-2")).unwrap();
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            file.write_all(br#"{"timestamp":"2024-01-01T00:00:00Z","clientIp":"#).unwrap();
        }

        let all = sink.read_page(page(100, 0, Order::Asc)).unwrap();
        assert_eq!(targets(&all), vec!["good-1", "good-2"]);
    }

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let sink = AuditSink::new(dir.path().join("never-written.log"), true);
        assert!(sink.read_page(page(10, 0, Order::Desc)).unwrap().is_empty());
    }

    #[test]
    fn test_concurrent_appends_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(AuditSink::new(dir.path().join("audit.log"), true));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let sink = Arc::clone(&sink);
                thread::spawn(move || {
                    for i in 0..50 {
                        let e = event(&format!("t{}-{}", t, i)).with_metadata("padding", "x".repeat(512));
                        sink.append(e).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let all = sink.read_page(page(1000, 0, Order::Asc)).unwrap();
        assert_eq!(all.len(), 400);
        let content = fs::read_to_string(sink.path()).unwrap();
        assert_eq!(content.lines().count(), 400);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_record_from_tasks_on_multi_thread_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(AuditSink::new(dir.path().join("audit.log"), true));

        let tasks: Vec<_> = (0..4)
            .map(|t| {
                let sink = Arc::clone(&sink);
                tokio::spawn(async move {
                    for i in 0..10 {
                        sink.record(event(&format!("t{}-{}", t, i)));
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(sink.read_page(page(100, 0, Order::Asc)).unwrap().len(), 40);
    }

    #[tokio::test]
    async fn test_record_on_current_thread_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let sink = AuditSink::new(dir.path().join("audit.log"), true);

        sink.record(event("SN001"));

        let read = sink.read_page(page(1, 0, Order::Desc)).unwrap();
        assert_eq!(targets(&read), vec!["SN001"]);
    }
}
