use crate::probe::{GeometryProbe, ProbeError};
use crate::style::ColorGenerator;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::io;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Probe answering every request with the same body, recording requested URLs.
pub struct StubProbe {
    response: Option<String>,
    requests: Mutex<Vec<String>>,
}

impl StubProbe {
    pub fn with_schema(schema: &str) -> Self {
        StubProbe {
            response: Some(schema.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        StubProbe {
            response: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GeometryProbe for StubProbe {
    async fn describe_feature_type(&self, url: &str) -> Result<String, ProbeError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.response
            .clone()
            .ok_or(ProbeError::UnexpectedStatus(StatusCode::SERVICE_UNAVAILABLE))
    }
}

/// Probe that answers with a polygon schema after `delay`.
pub struct SlowProbe {
    delay: Duration,
    started: AtomicUsize,
    completed: AtomicUsize,
}

impl SlowProbe {
    pub fn new(delay: Duration) -> Self {
        SlowProbe {
            delay,
            started: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        }
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeometryProbe for SlowProbe {
    async fn describe_feature_type(&self, _url: &str) -> Result<String, ProbeError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(POLYGON_SCHEMA.to_string())
    }
}

/// Color generator always returning the same color.
pub struct FixedColor {
    color: String,
    calls: AtomicUsize,
}

impl FixedColor {
    pub fn new(color: &str) -> Self {
        FixedColor {
            color: color.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ColorGenerator for FixedColor {
    fn next_color(&self) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.color.clone()
    }
}

pub const POLYGON_SCHEMA: &str =
    r#"<element name="geometry" type="gml:PolygonPropertyType" substitutionGroup="gml:_Feature"/>"#;
pub const LINE_SCHEMA: &str = r#"<element name="geometry" type="gml:LineStringPropertyType"/>"#;

/// Collects plain-text log lines of the current thread while alive.
pub struct LogCapture {
    buffer: LogBuffer,
    _guard: tracing::subscriber::DefaultGuard,
}

impl LogCapture {
    pub fn start() -> Self {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();

        LogCapture {
            buffer,
            _guard: tracing::subscriber::set_default(subscriber),
        }
    }

    pub fn logs(&self) -> String {
        String::from_utf8_lossy(&self.buffer.0.lock().unwrap()).into_owned()
    }
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
