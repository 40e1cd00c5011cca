//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use sevlog::reporter::AmbientReporter;
use sevlog::{Delivery, ErrorReporter, Report, ReportError, User};

/// Reporter that records every capture and whether it was blocking
#[derive(Default)]
pub struct RecordingReporter {
    captures: Mutex<Vec<(Report, bool)>>,
    ack_delay: Option<Duration>,
}

impl RecordingReporter {
    /// Blocking captures acknowledge only after `delay`
    pub fn with_ack_delay(delay: Duration) -> Self {
        Self {
            captures: Mutex::new(Vec::new()),
            ack_delay: Some(delay),
        }
    }

    pub fn captures(&self) -> Vec<(Report, bool)> {
        self.captures.lock().unwrap().clone()
    }
}

impl ErrorReporter for RecordingReporter {
    fn capture(&self, report: Report) {
        self.captures.lock().unwrap().push((report, false));
    }

    fn capture_and_wait(&self, report: Report) -> Delivery {
        if let Some(delay) = self.ack_delay {
            thread::sleep(delay);
        }
        self.captures.lock().unwrap().push((report, true));
        Delivery::Sent
    }
}

/// What an ambient client saw at capture time
#[derive(Debug, Clone)]
pub struct SeenCapture {
    pub message: String,
    pub user: Option<User>,
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
pub struct AmbientState {
    pub user: Option<User>,
    pub tags: BTreeMap<String, String>,
    pub seen: Vec<SeenCapture>,
}

/// Ambient-context client whose state stays readable by the test after the
/// client itself has been moved into a `Bracketed` reporter.
#[derive(Clone, Default)]
pub struct AmbientRecorder {
    state: Arc<Mutex<AmbientState>>,
    fail: bool,
}

impl AmbientRecorder {
    /// Every capture returns an error
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, AmbientState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn context_is_empty(&self) -> bool {
        let state = self.state();
        state.user.is_none() && state.tags.is_empty()
    }

    pub fn seen(&self) -> Vec<SeenCapture> {
        self.state().seen.clone()
    }
}

impl AmbientReporter for AmbientRecorder {
    fn set_user_context(&mut self, user: &User) {
        self.state().user = Some(user.clone());
        // Give other threads a chance to interleave
        thread::yield_now();
    }

    fn set_tags_context(&mut self, tags: &BTreeMap<String, String>) {
        self.state().tags.extend(tags.clone());
        thread::yield_now();
    }

    fn clear_context(&mut self) {
        let mut state = self.state();
        state.user = None;
        state.tags.clear();
    }

    fn capture_error(&mut self, report: &Report) -> Result<(), ReportError> {
        {
            let mut state = self.state();
            let seen = SeenCapture {
                message: report.message.clone(),
                user: state.user.clone(),
                tags: state.tags.clone(),
            };
            state.seen.push(seen);
        }
        if self.fail {
            return Err(ReportError::Unavailable("503".to_string()));
        }
        Ok(())
    }

    fn capture_error_and_wait(&mut self, report: &Report) -> Result<Delivery, ReportError> {
        self.capture_error(report).map(|_| Delivery::Sent)
    }
}

/// One event seen by the mock store
#[derive(Debug, Clone)]
pub struct StoreRequest {
    pub path: String,
    pub auth: Option<String>,
    /// The event item of the posted envelope
    pub body: serde_json::Value,
}

pub type StoreRequests = Arc<Mutex<Vec<StoreRequest>>>;

/// Start an ingest endpoint answering 200 to every POST.
pub fn start_mock_store() -> (SocketAddr, StoreRequests) {
    start_mock_store_with_status("200 OK")
}

/// Start an ingest endpoint answering every POST with `status`.
pub fn start_mock_store_with_status(status: &'static str) -> (SocketAddr, StoreRequests) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let requests = seen.clone();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { break };
            if let Some(request) = read_request(&mut stream) {
                requests.lock().unwrap().push(request);
            }
            let response = format!("HTTP/1.1 {}\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{{}}", status);
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
        }
    });

    (addr, seen)
}

fn read_request(stream: &mut std::net::TcpStream) -> Option<StoreRequest> {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let path = request_line.split_whitespace().nth(1)?.to_string();

    let mut content_length = 0usize;
    let mut auth = None;
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).ok()?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            match name.trim().to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.trim().parse().ok()?,
                "x-sentry-auth" => auth = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).ok()?;

    Some(StoreRequest {
        path,
        auth,
        body: event_from_envelope(&body)?,
    })
}

/// Envelopes are newline-delimited: a header, then header/payload pairs
fn event_from_envelope(body: &[u8]) -> Option<serde_json::Value> {
    let text = std::str::from_utf8(body).ok()?;
    let mut lines = text.lines();
    lines.next()?;

    while let Some(header) = lines.next() {
        let header: serde_json::Value = serde_json::from_str(header).ok()?;
        let payload = lines.next()?;
        if header["type"] == "event" {
            return serde_json::from_str(payload).ok();
        }
    }
    None
}
