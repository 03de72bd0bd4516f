use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use reqwest::{multipart, StatusCode};
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::ErrorKind;
use crate::models::{ImageRef, RawPayload};

// ── Constants ────────────────────────────────────────────────────────────────

const USER_AGENT: &str = concat!("snapdict-client/", env!("CARGO_PKG_VERSION"));
const CHUNK_SIZE: usize = 64 * 1024;

pub const IMAGE_FIELD: &str = "image";
pub const UPLOAD_FILE_NAME: &str = "photo.jpg";
pub const UPLOAD_MIME: &str = "image/jpeg";

// ── Outcome ──────────────────────────────────────────────────────────────────

/// Result of a single upload attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    Success(RawPayload),
    Failure(ErrorKind, String),
}

impl UploadOutcome {
    pub fn failure(kind: ErrorKind, detail: impl Into<String>) -> Self {
        UploadOutcome::Failure(kind, detail.into())
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            UploadOutcome::Success(_) => None,
            UploadOutcome::Failure(kind, _) => Some(*kind),
        }
    }

    pub fn into_result(self) -> Result<RawPayload, ErrorKind> {
        match self {
            UploadOutcome::Success(payload) => Ok(payload),
            UploadOutcome::Failure(kind, _) => Err(kind),
        }
    }
}

// ── Progress ─────────────────────────────────────────────────────────────────

type ProgressFn = dyn Fn(u8) + Send + Sync;

/// Percent-complete reporter. Updates that would go backwards are dropped.
#[derive(Clone)]
pub struct Progress {
    sink: Option<Arc<ProgressFn>>,
    last: Arc<Mutex<Option<u8>>>,
}

impl Progress {
    pub fn new(sink: impl Fn(u8) + Send + Sync + 'static) -> Self {
        Self {
            sink: Some(Arc::new(sink)),
            last: Arc::new(Mutex::new(None)),
        }
    }

    pub fn silent() -> Self {
        Self {
            sink: None,
            last: Arc::new(Mutex::new(None)),
        }
    }

    pub fn report(&self, percent: u8) {
        let percent = percent.min(100);
        let mut last = self.last.lock().unwrap_or_else(|p| p.into_inner());
        if last.is_some_and(|prev| percent <= prev) {
            return;
        }
        *last = Some(percent);
        debug!(percent, "upload progress");
        if let Some(sink) = &self.sink {
            sink(percent);
        }
    }

    fn report_bytes(&self, sent: u64, total: u64) {
        if total == 0 {
            return;
        }
        self.report((sent.min(total) * 100 / total) as u8);
    }

    fn restart(&self) {
        *self.last.lock().unwrap_or_else(|p| p.into_inner()) = None;
    }
}

impl fmt::Debug for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Progress")
            .field("last", &*self.last.lock().unwrap_or_else(|p| p.into_inner()))
            .finish()
    }
}

// ── Uploader ─────────────────────────────────────────────────────────────────

/// Sends images to the `process-image` endpoint, one POST per call.
#[derive(Debug, Clone)]
pub struct Uploader {
    client: reqwest::Client,
    endpoint: Url,
}

impl Uploader {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::ClientBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Uploads `image` and classifies what came back.
    ///
    /// A missing image fails with `NoImage` before anything touches the
    /// network. There is no retry; the client timeout is the only
    /// cancellation.
    pub async fn upload(&self, image: Option<ImageRef>, progress: &Progress) -> UploadOutcome {
        let Some(image) = image else {
            warn!("upload requested without an image");
            return UploadOutcome::failure(ErrorKind::NoImage, "no image selected");
        };

        let bytes = match tokio::fs::read(image.path()).await {
            Ok(bytes) => Bytes::from(bytes),
            Err(e) => {
                warn!(path = %image.path().display(), error = %e, "could not read image");
                return UploadOutcome::failure(
                    ErrorKind::NoImage,
                    format!("{}: {}", image.path().display(), e),
                );
            }
        };
        let total = bytes.len() as u64;

        progress.restart();
        let form = match build_form(bytes, progress.clone()) {
            Ok(form) => form,
            Err(e) => return UploadOutcome::failure(ErrorKind::NoImage, e.to_string()),
        };
        progress.report(0);

        info!(endpoint = %self.endpoint, bytes = total, file = image.file_name(), "uploading image");
        let started = Instant::now();
        let outcome = self.send(form, progress).await;
        let elapsed = started.elapsed();

        match &outcome {
            UploadOutcome::Success(payload) => {
                let words = payload.complex_words.as_ref().map_or(0, |w| w.len());
                info!(?elapsed, words, "upload processed");
            }
            UploadOutcome::Failure(kind, detail) => {
                warn!(?elapsed, kind = %kind, detail = %detail, "upload failed");
            }
        }
        outcome
    }

    async fn send(&self, form: multipart::Form, progress: &Progress) -> UploadOutcome {
        let response = match self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return UploadOutcome::failure(classify_transport(&e), e.to_string()),
        };
        progress.report(100);

        let status = response.status();
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            return UploadOutcome::failure(ErrorKind::PayloadTooLarge, status.to_string());
        }
        if !status.is_success() {
            return UploadOutcome::failure(ErrorKind::ServerError(status.as_u16()), status.to_string());
        }

        match response.bytes().await {
            Ok(body) => classify_body(&body),
            Err(e) => UploadOutcome::failure(classify_transport(&e), e.to_string()),
        }
    }
}

// ── Request body ─────────────────────────────────────────────────────────────

fn build_form(bytes: Bytes, progress: Progress) -> Result<multipart::Form, reqwest::Error> {
    let total = bytes.len() as u64;
    let chunks: Vec<Bytes> = (0..bytes.len())
        .step_by(CHUNK_SIZE)
        .map(|start| bytes.slice(start..(start + CHUNK_SIZE).min(bytes.len())))
        .collect();

    let mut sent = 0u64;
    let body = stream::iter(chunks).map(move |chunk| {
        sent += chunk.len() as u64;
        progress.report_bytes(sent, total);
        Ok::<_, std::io::Error>(chunk)
    });

    let part = multipart::Part::stream_with_length(reqwest::Body::wrap_stream(body), total)
        .file_name(UPLOAD_FILE_NAME)
        .mime_str(UPLOAD_MIME)?;
    Ok(multipart::Form::new().part(IMAGE_FIELD, part))
}

// ── Classification ───────────────────────────────────────────────────────────

fn classify_transport(e: &reqwest::Error) -> ErrorKind {
    if e.is_timeout() {
        ErrorKind::Timeout
    } else {
        ErrorKind::NetworkUnreachable
    }
}

/// Classifies the body of a 2xx response.
///
/// Valid JSON without a non-empty `complex_words` or `definitions` object is
/// a successful exchange that found nothing: `NoTextFound`.
pub fn classify_body(body: &[u8]) -> UploadOutcome {
    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => return UploadOutcome::failure(ErrorKind::MalformedResponse, e.to_string()),
    };

    if !has_word_map(&value, "complex_words") && !has_word_map(&value, "definitions") {
        return UploadOutcome::failure(ErrorKind::NoTextFound, "response contained no words");
    }

    match serde_json::from_value::<RawPayload>(value) {
        Ok(payload) => UploadOutcome::Success(payload),
        Err(e) => UploadOutcome::failure(ErrorKind::MalformedResponse, e.to_string()),
    }
}

fn has_word_map(value: &Value, field: &str) -> bool {
    value
        .get(field)
        .and_then(Value::as_object)
        .is_some_and(|words| !words.is_empty())
}
