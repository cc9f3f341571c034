//! Content delivery over a [`ResponseSink`].
//!
//! Every delivery emits the same ordered header block, streams the body and then
//! finishes the sink. A returned [`Delivered`] means the response is fully
//! handled and the caller must stop dispatching further handlers.

use std::fmt;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio::fs;
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

use crate::cancellable::{self, Cancellable};
use crate::config::DeliveryConfig;
use crate::detector::{ContentDetector, SniffingDetector};
use crate::error::{ErrorKind, MimedropError, MimedropResult};
use crate::resolver::fix_extension;
use crate::response::ResponseSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disposition {
    /// Render in place.
    Inline,
    /// Force a download.
    Attachment,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Inline => "inline",
            Disposition::Attachment => "attachment",
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the body comes from.
#[derive(Debug, Clone)]
pub enum ByteSource {
    /// Streamed from disk in chunks.
    File(PathBuf),
    /// Written as-is.
    Buffer(Bytes),
}

impl ByteSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        ByteSource::File(path.into())
    }

    pub fn buffer(bytes: impl Into<Bytes>) -> Self {
        ByteSource::Buffer(bytes.into())
    }
}

/// One delivery, consumed by [`ContentDeliveryService::deliver_request`].
#[derive(Debug, Clone)]
pub struct DeliveryRequest {
    pub name: String,
    pub mime_type: String,
    pub source: ByteSource,
    pub disposition: Disposition,
}

/// Marker that the response was fully handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "the response is finished; stop handling the request"]
pub struct Delivered {
    pub bytes_written: u64,
    pub disposition: Disposition,
}

/// Quotes the last path component of `name` for a `filename="..."` parameter.
/// Backslashes and double quotes are escaped; line breaks are dropped.
pub fn quote_filename(name: &str) -> String {
    let trimmed = name.trim_end_matches('/');
    let base = match trimmed.rsplit('/').next() {
        Some(base) => base,
        None => trimmed,
    };

    let mut quoted = String::with_capacity(base.len() + 2);
    quoted.push('"');
    for c in base.chars() {
        match c {
            '"' | '\\' => {
                quoted.push('\\');
                quoted.push(c);
            }
            '\r' | '\n' => {}
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

/// The fixed header block, in emission order.
pub fn delivery_headers(
    name: &str,
    mime_type: &str,
    disposition: Disposition,
    content_length: Option<u64>,
) -> Vec<(&'static str, String)> {
    let mut headers = vec![
        ("Content-Description", "File Transfer".to_string()),
        ("Content-Type", mime_type.to_string()),
        (
            "Content-Disposition",
            format!("{}; filename={}", disposition, quote_filename(name)),
        ),
        ("Content-Transfer-Encoding", "binary".to_string()),
        ("Connection", "Keep-Alive".to_string()),
        ("Expires", "0".to_string()),
        (
            "Cache-Control",
            "must-revalidate, post-check=0, pre-check=0".to_string(),
        ),
        ("Pragma", "public".to_string()),
    ];
    if let Some(len) = content_length {
        headers.push(("Content-Length", len.to_string()));
    }
    headers
}

// An opened source; opening happens before any header goes out.
enum OpenSource {
    File { file: fs::File, len: u64 },
    Buffer(Bytes),
}

async fn open_source(source: ByteSource) -> MimedropResult<OpenSource> {
    match source {
        ByteSource::Buffer(bytes) => Ok(OpenSource::Buffer(bytes)),
        ByteSource::File(path) => {
            let file = fs::File::open(&path)
                .await
                .map_err(|e| MimedropError::unreadable(e, path.display()))?;
            let metadata = file
                .metadata()
                .await
                .map_err(|e| MimedropError::unreadable(e, path.display()))?;
            if !metadata.is_file() {
                return Err(MimedropError::new(
                    ErrorKind::SourceUnreadable,
                    format!("{} is not a regular file", path.display()),
                ));
            }
            Ok(OpenSource::File {
                file,
                len: metadata.len(),
            })
        }
    }
}

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Default)]
pub struct ContentDeliveryService<D = SniffingDetector> {
    config: DeliveryConfig,
    detector: D,
}

impl ContentDeliveryService<SniffingDetector> {
    pub fn new() -> Self {
        Self::with_config(DeliveryConfig::default())
    }

    pub fn with_config(config: DeliveryConfig) -> Self {
        let detector = SniffingDetector::with_config(config.detector.clone());
        Self { config, detector }
    }
}

impl<D> ContentDeliveryService<D>
where
    D: ContentDetector,
{
    pub fn with_detector(config: DeliveryConfig, detector: D) -> Self {
        Self { config, detector }
    }

    pub fn config(&self) -> &DeliveryConfig {
        &self.config
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub async fn deliver<S>(
        &self,
        sink: &mut S,
        name: &str,
        mime_type: &str,
        source: ByteSource,
        disposition: Disposition,
    ) -> MimedropResult<Delivered>
    where
        S: ResponseSink + ?Sized,
    {
        self.deliver_with_cancel(sink, name, mime_type, source, disposition, None)
            .await
    }

    pub async fn deliver_request<S>(
        &self,
        sink: &mut S,
        request: DeliveryRequest,
    ) -> MimedropResult<Delivered>
    where
        S: ResponseSink + ?Sized,
    {
        let DeliveryRequest {
            name,
            mime_type,
            source,
            disposition,
        } = request;
        self.deliver(sink, &name, &mime_type, source, disposition)
            .await
    }

    /// Emits headers and body for `source`, then finishes `sink`.
    ///
    /// Fails with `HeadersAlreadySent` if the sink has already sent headers, and
    /// with `SourceUnreadable` before any header is emitted if the source cannot
    /// be opened. A cancelled body loop abandons the pending read, drops the
    /// file and leaves the partial body as written.
    pub async fn deliver_with_cancel<S>(
        &self,
        sink: &mut S,
        name: &str,
        mime_type: &str,
        source: ByteSource,
        disposition: Disposition,
        cancellable: Option<&Cancellable>,
    ) -> MimedropResult<Delivered>
    where
        S: ResponseSink + ?Sized,
    {
        if sink.headers_sent() {
            warn!(name, "delivery refused, headers already sent");
            return Err(MimedropError::headers_already_sent());
        }
        cancellable::check(cancellable)?;

        let opened = open_source(source).await?;
        let content_length = match &opened {
            OpenSource::File { len, .. } => Some(*len),
            OpenSource::Buffer(bytes) if self.config.buffer_content_length => {
                Some(bytes.len() as u64)
            }
            OpenSource::Buffer(_) => None,
        };

        for (header, value) in delivery_headers(name, mime_type, disposition, content_length) {
            if let Err(err) = sink.set_header(header, &value) {
                // Leave nothing half-staged so the sink can be reused.
                sink.clear_headers();
                warn!(name, header, error = %err, "header rejected by sink");
                return Err(err);
            }
        }
        sink.send_headers().await?;

        let bytes_written = match opened {
            OpenSource::Buffer(bytes) => {
                cancellable::check(cancellable)?;
                sink.write_body(&bytes).await?;
                bytes.len() as u64
            }
            OpenSource::File { mut file, .. } => {
                let mut buffer = vec![0u8; self.config.chunk_size.max(1)];
                let mut total = 0u64;
                // An empty file still moves the sink into `BodyWritten`.
                sink.write_body(&[]).await?;
                loop {
                    let read = file.read(&mut buffer);
                    let n = match cancellable {
                        Some(c) => tokio::select! {
                            biased;
                            _ = c.cancelled() => return Err(MimedropError::cancelled()),
                            res = read => res,
                        },
                        None => read.await,
                    }
                    .map_err(|e| MimedropError::unreadable(e, name))?;
                    if n == 0 {
                        break;
                    }
                    sink.write_body(&buffer[..n]).await?;
                    total += n as u64;
                }
                total
            }
        };

        sink.finish().await?;
        debug!(
            name,
            mime = mime_type,
            %disposition,
            bytes = bytes_written,
            "content delivered"
        );

        Ok(Delivered {
            bytes_written,
            disposition,
        })
    }

    /// Sniffs `source`, corrects `name` to the sniffed type and delivers it.
    pub async fn send<S>(
        &self,
        sink: &mut S,
        name: &str,
        source: ByteSource,
        disposition: Disposition,
    ) -> MimedropResult<Delivered>
    where
        S: ResponseSink + ?Sized,
    {
        if sink.headers_sent() {
            return Err(MimedropError::headers_already_sent());
        }
        let mime_type = self.sniff(&source).await?;
        let resolved = fix_extension(name, &mime_type);
        self.deliver(sink, &resolved, &mime_type, source, disposition)
            .await
    }

    /// Forces a download of the file at `path`, named `filename` or the
    /// path's own basename.
    pub async fn force_download_file<S>(
        &self,
        sink: &mut S,
        path: &Path,
        filename: Option<&str>,
    ) -> MimedropResult<Delivered>
    where
        S: ResponseSink + ?Sized,
    {
        self.file_with(sink, path, filename, Disposition::Attachment)
            .await
    }

    /// Like [`force_download_file`](Self::force_download_file) but inline.
    pub async fn force_stream_file<S>(
        &self,
        sink: &mut S,
        path: &Path,
        filename: Option<&str>,
    ) -> MimedropResult<Delivered>
    where
        S: ResponseSink + ?Sized,
    {
        self.file_with(sink, path, filename, Disposition::Inline)
            .await
    }

    pub async fn force_download_stream<S>(
        &self,
        sink: &mut S,
        name: &str,
        bytes: impl Into<Bytes>,
    ) -> MimedropResult<Delivered>
    where
        S: ResponseSink + ?Sized,
    {
        self.buffer_with(sink, name, bytes.into(), Disposition::Attachment)
            .await
    }

    pub async fn force_stream_stream<S>(
        &self,
        sink: &mut S,
        name: &str,
        bytes: impl Into<Bytes>,
    ) -> MimedropResult<Delivered>
    where
        S: ResponseSink + ?Sized,
    {
        self.buffer_with(sink, name, bytes.into(), Disposition::Inline)
            .await
    }

    async fn file_with<S>(
        &self,
        sink: &mut S,
        path: &Path,
        filename: Option<&str>,
        disposition: Disposition,
    ) -> MimedropResult<Delivered>
    where
        S: ResponseSink + ?Sized,
    {
        if sink.headers_sent() {
            warn!(path = %path.display(), "delivery refused, headers already sent");
            return Err(MimedropError::headers_already_sent());
        }
        let name = match filename {
            Some(name) => name.to_string(),
            None => basename(path),
        };
        let mime_type = self.detector.detect_path(path, None).await?;
        self.deliver(sink, &name, &mime_type, ByteSource::file(path), disposition)
            .await
    }

    async fn buffer_with<S>(
        &self,
        sink: &mut S,
        name: &str,
        bytes: Bytes,
        disposition: Disposition,
    ) -> MimedropResult<Delivered>
    where
        S: ResponseSink + ?Sized,
    {
        if sink.headers_sent() {
            warn!(name, "delivery refused, headers already sent");
            return Err(MimedropError::headers_already_sent());
        }
        let mime_type = self.detector.detect_bytes(&bytes);
        self.deliver(sink, name, &mime_type, ByteSource::Buffer(bytes), disposition)
            .await
    }

    async fn sniff(&self, source: &ByteSource) -> MimedropResult<String> {
        match source {
            ByteSource::File(path) => self.detector.detect_path(path, None).await,
            ByteSource::Buffer(bytes) => Ok(self.detector.detect_bytes(bytes)),
        }
    }
}

/// Delivers with the default service.
pub async fn deliver<S>(
    sink: &mut S,
    name: &str,
    mime_type: &str,
    source: ByteSource,
    disposition: Disposition,
) -> MimedropResult<Delivered>
where
    S: ResponseSink + ?Sized,
{
    ContentDeliveryService::new()
        .deliver(sink, name, mime_type, source, disposition)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::{BufferedResponse, ResponseState};

    #[test]
    fn quotes_basename_only() {
        assert_eq!(quote_filename("/srv/files/report.pdf"), "\"report.pdf\"");
        assert_eq!(quote_filename("dir/"), "\"dir\"");
        assert_eq!(quote_filename("plain"), "\"plain\"");
    }

    #[test]
    fn escapes_quote_and_backslash() {
        assert_eq!(quote_filename("say \"hi\".txt"), r#""say \"hi\".txt""#);
        assert_eq!(quote_filename("a\\b"), r#""a\\b""#);
        assert_eq!(quote_filename("evil\r\nX: y"), "\"evilX: y\"");
    }

    #[test]
    fn header_block_order() {
        let names: Vec<_> = delivery_headers("a.bin", "application/octet-stream", Disposition::Inline, Some(3))
            .into_iter()
            .map(|(n, _)| n)
            .collect();
        assert_eq!(
            names,
            [
                "Content-Description",
                "Content-Type",
                "Content-Disposition",
                "Content-Transfer-Encoding",
                "Connection",
                "Expires",
                "Cache-Control",
                "Pragma",
                "Content-Length",
            ]
        );
        assert_eq!(
            delivery_headers("a", "x/y", Disposition::Attachment, None).len(),
            8
        );
    }

    #[tokio::test]
    async fn buffer_delivery_without_length() {
        let config = DeliveryConfig {
            buffer_content_length: false,
            ..DeliveryConfig::default()
        };
        let service = ContentDeliveryService::with_config(config);
        let mut response = BufferedResponse::new();
        let delivered = service
            .deliver(
                &mut response,
                "note.txt",
                "text/plain",
                ByteSource::buffer(&b"hello"[..]),
                Disposition::Inline,
            )
            .await
            .unwrap();
        assert_eq!(delivered.bytes_written, 5);
        assert_eq!(response.header("Content-Length"), None);
        assert_eq!(
            response.header("Content-Disposition"),
            Some("inline; filename=\"note.txt\"")
        );
        assert_eq!(response.state(), ResponseState::Terminated);
    }

    #[tokio::test]
    async fn cancelled_before_start_sends_nothing() {
        let token = Cancellable::new();
        token.cancel();
        let mut response = BufferedResponse::new();
        let err = ContentDeliveryService::new()
            .deliver_with_cancel(
                &mut response,
                "x",
                "text/plain",
                ByteSource::buffer(&b"x"[..]),
                Disposition::Inline,
                Some(&token),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert!(!response.headers_sent());
    }
}
