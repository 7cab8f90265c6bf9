//! HTTP seam between the engine and the transport.
//!
//! The engine only talks to [`HttpClient`]; [`CurlClient`] is the libcurl
//! implementation used by the CLI. Tests substitute an in-memory client.

mod curl_client;
#[cfg(test)]
pub(crate) mod fake;
mod parse;

pub use curl_client::CurlClient;
pub use parse::ResponseHead;

use std::io;
use std::time::Duration;

/// A GET request.
#[derive(Debug, Clone, Copy)]
pub struct Request<'a> {
    pub url: &'a str,
    /// Sent as `Authorization: Bearer <token>` when present.
    pub bearer_token: Option<&'a str>,
    /// Connect timeout, and the longest the transfer may stall without receiving data.
    pub timeout: Duration,
}

impl<'a> Request<'a> {
    pub fn get(url: &'a str, timeout: Duration) -> Self {
        Self {
            url,
            bearer_token: None,
            timeout,
        }
    }

    pub fn bearer(mut self, token: &'a str) -> Self {
        self.bearer_token = Some(token);
        self
    }
}

/// Receives a streamed response body.
pub trait BodySink {
    /// Called once before the first chunk (also for empty bodies) with the declared length.
    fn on_start(&mut self, content_length: Option<u64>);

    /// Called for every chunk in order. An error aborts the transfer.
    fn on_chunk(&mut self, chunk: &[u8]) -> io::Result<()>;
}

/// Transport failures. None of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("invalid request for {url}: {reason}")]
    InvalidRequest { url: String, reason: String },
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("transport error for {url}: {reason}")]
    Transport { url: String, reason: String },
    #[error("GET {url} returned HTTP {code}")]
    Status { url: String, code: u32 },
    #[error("writing response body failed: {0}")]
    Sink(#[source] io::Error),
}

/// Blocking HTTP GET operations used by the engine.
pub trait HttpClient {
    /// GET and buffer the whole body.
    fn get(&self, request: &Request<'_>) -> Result<Vec<u8>, HttpError>;

    /// GET and hand the body to `sink` chunk by chunk. Returns the number of body bytes.
    fn get_streaming(&self, request: &Request<'_>, sink: &mut dyn BodySink)
        -> Result<u64, HttpError>;
}

impl<T: HttpClient + ?Sized> HttpClient for &T {
    fn get(&self, request: &Request<'_>) -> Result<Vec<u8>, HttpError> {
        (**self).get(request)
    }

    fn get_streaming(
        &self,
        request: &Request<'_>,
        sink: &mut dyn BodySink,
    ) -> Result<u64, HttpError> {
        (**self).get_streaming(request, sink)
    }
}

/// True for 2xx.
pub fn is_success(code: u32) -> bool {
    (200..300).contains(&code)
}
