//! Write-once response sink shared across matching handlers.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, ACCEPT_RANGES, CONTENT_DISPOSITION, CONTENT_TYPE};
use http::{HeaderMap, StatusCode};
use serde::Serialize;

/// The finalized response collected by the transport after dispatch.
#[derive(Debug)]
pub struct ResponseParts {
    /// Response status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Bytes,
}

#[derive(Debug)]
struct SinkState {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<Bytes>,
}

/// A write-once capability for producing the response to one request.
///
/// The transport creates one sink per inbound request; under fan-out
/// dispatch every matching handler receives a clone of the same sink.
/// Status code and headers can be staged freely until a `send_*` call
/// finalizes the response. The first finalization wins: any later write
/// attempt is logged as a warning and dropped, which makes the
/// multiple-matching-routes hazard deterministic rather than a transport
/// race.
///
/// # Example
///
/// ```rust
/// use talaria_http::ResponseSink;
/// use http::StatusCode;
///
/// let sink = ResponseSink::new();
/// sink.set_status(StatusCode::CREATED).send_text("created");
///
/// let parts = sink.take().unwrap();
/// assert_eq!(parts.status, StatusCode::CREATED);
/// assert_eq!(&parts.body[..], b"created");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResponseSink {
    inner: Arc<Mutex<SinkState>>,
}

impl Default for SinkState {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

impl ResponseSink {
    /// Creates a fresh, unwritten sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SinkState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stages the response status code. Defaults to 200 OK.
    ///
    /// Returns `&self` for chaining into a `send_*` call. Ignored with a
    /// warning once the response has been written.
    pub fn set_status(&self, status: StatusCode) -> &Self {
        let mut state = self.lock();
        if state.body.is_some() {
            tracing::warn!("response already written; ignoring status change");
        } else {
            state.status = status;
        }
        self
    }

    /// Stages a response header.
    pub fn insert_header(&self, name: HeaderName, value: HeaderValue) -> &Self {
        let mut state = self.lock();
        if state.body.is_some() {
            tracing::warn!("response already written; ignoring header");
        } else {
            state.headers.insert(name, value);
        }
        self
    }

    /// Returns `true` once a handler has written the response.
    #[must_use]
    pub fn is_written(&self) -> bool {
        self.lock().body.is_some()
    }

    /// Sends a plain-text body.
    pub fn send_text(&self, text: impl Into<String>) {
        self.send_bytes("text/plain", Bytes::from(text.into()));
    }

    /// Sends an HTML body.
    pub fn send_html(&self, html: impl Into<String>) {
        self.send_bytes("text/html", Bytes::from(html.into()));
    }

    /// Serializes `value` as JSON and sends it.
    ///
    /// If serialization fails the response is left unwritten and the
    /// failure is logged; the transport then reports a bare server error.
    pub fn send_json<T: Serialize>(&self, value: &T) {
        match serde_json::to_vec(value) {
            Ok(body) => self.send_bytes("application/json", Bytes::from(body)),
            Err(e) => tracing::error!("failed to serialize JSON response: {e}"),
        }
    }

    /// Sends an empty 204 No Content response.
    pub fn send_empty(&self) {
        let mut state = self.lock();
        if state.body.is_some() {
            tracing::warn!("response already written; ignoring write");
            return;
        }
        state.status = StatusCode::NO_CONTENT;
        state.body = Some(Bytes::new());
    }

    /// Sends a body with the given content type.
    ///
    /// This is the finalizing write: the first call wins, later calls are
    /// logged and dropped.
    pub fn send_bytes(&self, content_type: &str, body: impl Into<Bytes>) {
        let mut state = self.lock();
        if state.body.is_some() {
            tracing::warn!("response already written; ignoring write");
            return;
        }
        if let Ok(value) = HeaderValue::from_str(content_type) {
            state.headers.insert(CONTENT_TYPE, value);
        }
        state.body = Some(body.into());
    }

    /// Reads a file from disk and sends it.
    ///
    /// The content type is guessed from the file extension. A missing
    /// file produces a 404, any other read failure a 500. With
    /// `attachment` set, browsers are told to download instead of
    /// display.
    pub async fn send_file(&self, path: impl AsRef<Path>, attachment: bool) {
        let path = path.as_ref();

        let data = match tokio::fs::read(path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.set_status(StatusCode::NOT_FOUND).send_text("File not found.");
                return;
            }
            Err(e) => {
                tracing::error!("failed to read {}: {e}", path.display());
                self.set_status(StatusCode::INTERNAL_SERVER_ERROR)
                    .send_text("An internal error occurred while processing this request.");
                return;
            }
        };

        let mime = mime_guess::from_path(path).first_or_octet_stream();
        let disposition = format!(
            "{}; filename=\"{}\"",
            if attachment { "attachment" } else { "inline" },
            path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default()
        );

        self.insert_header(ACCEPT_RANGES, HeaderValue::from_static("bytes"));
        if let Ok(value) = HeaderValue::from_str(&disposition) {
            self.insert_header(CONTENT_DISPOSITION, value);
        }
        self.send_bytes(mime.as_ref(), Bytes::from(data));
    }

    /// Takes the finalized response, leaving the sink empty.
    ///
    /// Returns `None` when no handler wrote a response; the transport
    /// treats that as a failed request.
    #[must_use]
    pub fn take(&self) -> Option<ResponseParts> {
        let mut state = self.lock();
        state.body.take().map(|body| ResponseParts {
            status: state.status,
            headers: std::mem::take(&mut state.headers),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_text_defaults_to_ok() {
        let sink = ResponseSink::new();
        sink.send_text("hello");

        let parts = sink.take().unwrap();
        assert_eq!(parts.status, StatusCode::OK);
        assert_eq!(&parts.body[..], b"hello");
        assert_eq!(parts.headers.get(CONTENT_TYPE).unwrap(), "text/plain");
    }

    #[test]
    fn test_set_status_chains_into_send() {
        let sink = ResponseSink::new();
        sink.set_status(StatusCode::NOT_FOUND).send_text("nope");

        let parts = sink.take().unwrap();
        assert_eq!(parts.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_first_writer_wins() {
        let sink = ResponseSink::new();
        let clone = sink.clone();

        clone.send_text("first");
        sink.set_status(StatusCode::IM_A_TEAPOT);
        sink.send_text("second");

        let parts = sink.take().unwrap();
        assert_eq!(parts.status, StatusCode::OK);
        assert_eq!(&parts.body[..], b"first");
    }

    #[test]
    fn test_send_html_content_type() {
        let sink = ResponseSink::new();
        sink.send_html("<h1>hi</h1>");

        let parts = sink.take().unwrap();
        assert_eq!(parts.headers.get(CONTENT_TYPE).unwrap(), "text/html");
    }

    #[test]
    fn test_send_json() {
        let sink = ResponseSink::new();
        sink.send_json(&serde_json::json!({"ok": true}));

        let parts = sink.take().unwrap();
        assert_eq!(parts.headers.get(CONTENT_TYPE).unwrap(), "application/json");
        let value: serde_json::Value = serde_json::from_slice(&parts.body).unwrap();
        assert_eq!(value["ok"], true);
    }

    #[test]
    fn test_send_empty_is_204() {
        let sink = ResponseSink::new();
        sink.send_empty();

        let parts = sink.take().unwrap();
        assert_eq!(parts.status, StatusCode::NO_CONTENT);
        assert!(parts.body.is_empty());
        assert!(parts.headers.get(CONTENT_TYPE).is_none());
    }

    #[test]
    fn test_unwritten_sink_takes_none() {
        let sink = ResponseSink::new();
        assert!(!sink.is_written());
        assert!(sink.take().is_none());
    }

    #[test]
    fn test_take_drains_the_sink() {
        let sink = ResponseSink::new();
        sink.send_text("once");

        assert!(sink.take().is_some());
        assert!(sink.take().is_none());
    }

    #[test]
    fn test_insert_header() {
        let sink = ResponseSink::new();
        sink.insert_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("abc"),
        );
        sink.send_text("ok");

        let parts = sink.take().unwrap();
        assert_eq!(parts.headers.get("x-request-id").unwrap(), "abc");
    }

    #[tokio::test]
    async fn test_send_file_missing_is_404() {
        let sink = ResponseSink::new();
        sink.send_file("/definitely/not/a/real/file.txt", false).await;

        let parts = sink.take().unwrap();
        assert_eq!(parts.status, StatusCode::NOT_FOUND);
        assert_eq!(&parts.body[..], b"File not found.");
    }

    #[tokio::test]
    async fn test_send_file_serves_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        std::fs::write(&path, "file body").unwrap();

        let sink = ResponseSink::new();
        sink.send_file(&path, true).await;

        let parts = sink.take().unwrap();
        assert_eq!(parts.status, StatusCode::OK);
        assert_eq!(&parts.body[..], b"file body");
        let disposition = parts.headers.get(CONTENT_DISPOSITION).unwrap();
        assert!(disposition.to_str().unwrap().starts_with("attachment"));
        assert!(disposition.to_str().unwrap().contains("hello.txt"));
    }
}
