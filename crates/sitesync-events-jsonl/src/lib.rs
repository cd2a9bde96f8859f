// # JSONL Event Source
//
// This crate provides a file-based site lifecycle event feed.
//
// ## Purpose
//
// The host platform appends one JSON-encoded `SiteEvent` per line to a
// feed file; this source tails the file and yields each event. It suits
// hosts that can emit a webhook-to-file bridge or a simple audit log:
//
// ```json
// {"kind":"created","site":{"id":7,"host":"foo.example.com"}}
// {"kind":"renamed","new_site":{"id":7,"host":"bar.example.com"},"old_site":{"id":7,"host":"foo.example.com"}}
// {"kind":"deleted","old_site":{"id":7,"host":"bar.example.com"}}
// ```
//
// ## Behavior
//
// - Malformed lines are logged and skipped; one bad line never poisons
//   the feed
// - In follow mode the source waits for appended lines at EOF, like
//   `tail -f`; otherwise the stream ends at EOF
// - The source is an observer only: it parses and forwards, and makes no
//   decisions about DNS

use sitesync_core::traits::{SiteEvent, SiteEventSource};
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::Stream;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, error, info, warn};

/// How long to wait for new lines at EOF in follow mode
const FOLLOW_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// File-based site event feed (one JSON event per line)
pub struct JsonlEventSource {
    path: PathBuf,
    follow: bool,
}

impl JsonlEventSource {
    /// Create a source that follows the feed file for appended events
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            follow: true,
        }
    }

    /// Create a source that ends the stream at EOF
    ///
    /// Useful for replaying a finite backlog of events.
    pub fn once(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            follow: false,
        }
    }
}

impl SiteEventSource for JsonlEventSource {
    fn watch(&self) -> Pin<Box<dyn Stream<Item = SiteEvent> + Send + 'static>> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let path = self.path.clone();
        let follow = self.follow;

        tokio::spawn(async move {
            info!(path = %path.display(), follow, "starting JSONL event feed");

            let file = match tokio::fs::File::open(&path).await {
                Ok(file) => file,
                Err(e) => {
                    error!(path = %path.display(), error = %e, "failed to open event feed");
                    return;
                }
            };

            let mut reader = BufReader::new(file);
            let mut line = String::new();

            loop {
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        // EOF: wait for appended data (the buffer may hold
                        // a partial line the writer has not finished), or
                        // flush the remainder and stop
                        if !follow {
                            dispatch_line(&line, &tx);
                            debug!("event feed exhausted");
                            break;
                        }
                        tokio::time::sleep(FOLLOW_POLL_INTERVAL).await;
                    }
                    Ok(_) => {
                        // A write can land split across flushes; keep
                        // accumulating until the newline arrives
                        if follow && !line.ends_with('\n') {
                            continue;
                        }
                        if !dispatch_line(&line, &tx) {
                            debug!("receiver dropped, stopping feed");
                            break;
                        }
                        line.clear();
                    }
                    Err(e) => {
                        error!(error = %e, "failed to read event feed");
                        break;
                    }
                }
            }
        });

        Box::pin(UnboundedReceiverStream::new(rx))
    }
}

/// Parse one feed line and forward the event
///
/// Returns `false` when the receiver is gone. Blank and malformed lines
/// are skipped.
fn dispatch_line(line: &str, tx: &tokio::sync::mpsc::UnboundedSender<SiteEvent>) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return true;
    }
    match serde_json::from_str::<SiteEvent>(trimmed) {
        Ok(event) => {
            debug!(site = event.subject_host(), "feed event");
            tx.send(event).is_ok()
        }
        Err(e) => {
            warn!(error = %e, "skipping malformed feed line");
            true
        }
    }
}
