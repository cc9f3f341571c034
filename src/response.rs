//! Response sink abstraction.
//!
//! A sink moves through `NotSent -> HeadersEmitted -> BodyWritten -> Terminated`
//! and never back. Headers may only be staged while the sink is `NotSent`.

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{ErrorKind, MimedropError, MimedropResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ResponseState {
    NotSent,
    HeadersEmitted,
    BodyWritten,
    Terminated,
}

/// What delivery needs from the request-handling layer.
#[async_trait]
pub trait ResponseSink: Send {
    fn state(&self) -> ResponseState;

    fn headers_sent(&self) -> bool {
        self.state() != ResponseState::NotSent
    }

    /// Stages a header. Fails once headers have been sent.
    fn set_header(&mut self, name: &str, value: &str) -> MimedropResult<()>;

    /// Drops every staged header. No effect once headers have been sent.
    fn clear_headers(&mut self);

    /// Commits the staged headers.
    async fn send_headers(&mut self) -> MimedropResult<()>;

    async fn write_body(&mut self, chunk: &[u8]) -> MimedropResult<()>;

    /// Marks the response fully handled; nothing may follow.
    async fn finish(&mut self) -> MimedropResult<()>;

    fn is_finished(&self) -> bool {
        self.state() == ResponseState::Terminated
    }
}

fn advance(state: &mut ResponseState, to: ResponseState) -> MimedropResult<()> {
    let allowed = match to {
        ResponseState::NotSent => false,
        ResponseState::HeadersEmitted => *state == ResponseState::NotSent,
        ResponseState::BodyWritten => matches!(
            *state,
            ResponseState::HeadersEmitted | ResponseState::BodyWritten
        ),
        ResponseState::Terminated => matches!(
            *state,
            ResponseState::HeadersEmitted | ResponseState::BodyWritten
        ),
    };
    if !allowed {
        return Err(match *state {
            ResponseState::NotSent => MimedropError::new(
                ErrorKind::InvalidArg,
                "headers have not been sent",
            ),
            _ => MimedropError::headers_already_sent(),
        });
    }
    *state = to;
    Ok(())
}

/// In-memory sink. Keeps headers in emission order.
#[derive(Debug)]
pub struct BufferedResponse {
    state: ResponseState,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl BufferedResponse {
    pub fn new() -> Self {
        Self {
            state: ResponseState::NotSent,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First value of `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_parts(self) -> (Vec<(String, String)>, Vec<u8>) {
        (self.headers, self.body)
    }
}

impl Default for BufferedResponse {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResponseSink for BufferedResponse {
    fn state(&self) -> ResponseState {
        self.state
    }

    fn set_header(&mut self, name: &str, value: &str) -> MimedropResult<()> {
        if self.headers_sent() {
            return Err(MimedropError::headers_already_sent());
        }
        self.headers.push((name.to_string(), value.to_string()));
        Ok(())
    }

    fn clear_headers(&mut self) {
        if !self.headers_sent() {
            self.headers.clear();
        }
    }

    async fn send_headers(&mut self) -> MimedropResult<()> {
        advance(&mut self.state, ResponseState::HeadersEmitted)
    }

    async fn write_body(&mut self, chunk: &[u8]) -> MimedropResult<()> {
        advance(&mut self.state, ResponseState::BodyWritten)?;
        self.body.extend_from_slice(chunk);
        Ok(())
    }

    async fn finish(&mut self) -> MimedropResult<()> {
        advance(&mut self.state, ResponseState::Terminated)
    }
}

/// Sink writing a raw HTTP/1.1 `200 OK` response to any async writer.
pub struct HttpWriterSink<W> {
    writer: W,
    state: ResponseState,
    headers: Vec<(String, String)>,
}

impl<W> HttpWriterSink<W>
where
    W: AsyncWrite + Send + Unpin,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            state: ResponseState::NotSent,
            headers: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<W> ResponseSink for HttpWriterSink<W>
where
    W: AsyncWrite + Send + Unpin,
{
    fn state(&self) -> ResponseState {
        self.state
    }

    fn set_header(&mut self, name: &str, value: &str) -> MimedropResult<()> {
        if self.headers_sent() {
            return Err(MimedropError::headers_already_sent());
        }
        if name.contains(['\r', '\n', ':']) || value.contains(['\r', '\n']) {
            return Err(MimedropError::new(
                ErrorKind::InvalidArg,
                format!("header {:?} contains a line break", name),
            ));
        }
        self.headers.push((name.to_string(), value.to_string()));
        Ok(())
    }

    fn clear_headers(&mut self) {
        if !self.headers_sent() {
            self.headers.clear();
        }
    }

    async fn send_headers(&mut self) -> MimedropResult<()> {
        advance(&mut self.state, ResponseState::HeadersEmitted)?;
        let mut head = String::from("HTTP/1.1 200 OK\r\n");
        for (name, value) in &self.headers {
            head.push_str(name);
            head.push_str(": ");
            head.push_str(value);
            head.push_str("\r\n");
        }
        head.push_str("\r\n");
        self.writer.write_all(head.as_bytes()).await?;
        Ok(())
    }

    async fn write_body(&mut self, chunk: &[u8]) -> MimedropResult<()> {
        advance(&mut self.state, ResponseState::BodyWritten)?;
        self.writer.write_all(chunk).await?;
        Ok(())
    }

    async fn finish(&mut self) -> MimedropResult<()> {
        advance(&mut self.state, ResponseState::Terminated)?;
        self.writer.flush().await?;
        Ok(())
    }
}
