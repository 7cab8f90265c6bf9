//! libcurl-backed [`HttpClient`].
//!
//! One easy handle per request, run on the calling thread.

use std::cell::{Cell, RefCell};
use std::io;
use std::str;
use std::time::Duration;

use super::{is_success, BodySink, HttpClient, HttpError, Request, ResponseHead};

const USER_AGENT: &str = concat!("dsync/", env!("CARGO_PKG_VERSION"));
const MAX_REDIRECTIONS: u32 = 10;

/// Blocking client built on `curl::easy::Easy`.
#[derive(Debug, Clone, Default)]
pub struct CurlClient {
    buffer_size: Option<usize>,
}

impl CurlClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive buffer size handed to libcurl (it clamps values below 1024).
    pub fn with_buffer_size(mut self, bytes: usize) -> Self {
        self.buffer_size = Some(bytes);
        self
    }

    /// Runs one GET. `deadline` caps the whole request; without it only the
    /// connect and stall timeouts from `request` apply.
    fn perform(
        &self,
        request: &Request<'_>,
        sink: &mut dyn BodySink,
        deadline: Option<Duration>,
    ) -> Result<u64, HttpError> {
        let url = request.url;
        let err = |e: curl::Error| map_curl_error(url, e);

        let mut easy = curl::easy::Easy::new();
        easy.url(url).map_err(err)?;
        easy.useragent(USER_AGENT).map_err(err)?;
        easy.follow_location(true).map_err(err)?;
        easy.max_redirections(MAX_REDIRECTIONS).map_err(err)?;
        easy.fail_on_error(true).map_err(err)?;
        easy.connect_timeout(request.timeout).map_err(err)?;
        // Abort if fewer than 1 byte/s arrives for a whole timeout window.
        easy.low_speed_limit(1).map_err(err)?;
        easy.low_speed_time(request.timeout).map_err(err)?;
        if let Some(total) = deadline {
            easy.timeout(total).map_err(err)?;
        }
        if let Some(size) = self.buffer_size {
            easy.buffer_size(size).map_err(err)?;
        }
        if let Some(token) = request.bearer_token {
            let mut list = curl::easy::List::new();
            list.append(&format!("Authorization: Bearer {}", token.trim()))
                .map_err(err)?;
            easy.http_headers(list).map_err(err)?;
        }

        let head = RefCell::new(ResponseHead::default());
        let started = Cell::new(false);
        let received = Cell::new(0u64);
        let sink_error: Cell<Option<io::Error>> = Cell::new(None);

        let result = {
            let mut transfer = easy.transfer();
            transfer
                .header_function(|data| {
                    if let Ok(line) = str::from_utf8(data) {
                        head.borrow_mut().push_line(line);
                    }
                    true
                })
                .map_err(err)?;
            transfer
                .write_function(|data| {
                    if !started.get() {
                        started.set(true);
                        sink.on_start(head.borrow().content_length);
                    }
                    match sink.on_chunk(data) {
                        Ok(()) => {
                            received.set(received.get() + data.len() as u64);
                            Ok(data.len())
                        }
                        Err(e) => {
                            sink_error.set(Some(e));
                            Ok(0) // abort transfer
                        }
                    }
                })
                .map_err(err)?;
            transfer.perform()
        };

        if let Some(e) = sink_error.take() {
            return Err(HttpError::Sink(e));
        }
        let code = easy.response_code().map_err(err)?;
        if let Err(e) = result {
            if e.is_http_returned_error() {
                return Err(HttpError::Status {
                    url: url.to_string(),
                    code,
                });
            }
            return Err(err(e));
        }
        if !is_success(code) {
            return Err(HttpError::Status {
                url: url.to_string(),
                code,
            });
        }
        if !started.get() {
            sink.on_start(head.into_inner().content_length);
        }
        Ok(received.get())
    }
}

impl HttpClient for CurlClient {
    fn get(&self, request: &Request<'_>) -> Result<Vec<u8>, HttpError> {
        let mut body = BufferSink::default();
        self.perform(request, &mut body, Some(request.timeout))?;
        Ok(body.0)
    }

    fn get_streaming(
        &self,
        request: &Request<'_>,
        sink: &mut dyn BodySink,
    ) -> Result<u64, HttpError> {
        self.perform(request, sink, None)
    }
}

#[derive(Default)]
struct BufferSink(Vec<u8>);

impl BodySink for BufferSink {
    fn on_start(&mut self, content_length: Option<u64>) {
        if let Some(n) = content_length {
            self.0.reserve(n.min(16 * 1024 * 1024) as usize);
        }
    }

    fn on_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        self.0.extend_from_slice(chunk);
        Ok(())
    }
}

fn map_curl_error(url: &str, e: curl::Error) -> HttpError {
    if e.is_operation_timedout() {
        return HttpError::Timeout {
            url: url.to_string(),
        };
    }
    if e.is_url_malformed() || e.is_unsupported_protocol() {
        return HttpError::InvalidRequest {
            url: url.to_string(),
            reason: e.to_string(),
        };
    }
    HttpError::Transport {
        url: url.to_string(),
        reason: e.to_string(),
    }
}
