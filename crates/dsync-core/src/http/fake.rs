//! In-memory [`HttpClient`] for unit tests.

use std::cell::RefCell;
use std::collections::HashMap;

use super::{BodySink, HttpClient, HttpError, Request};

#[derive(Debug, Clone)]
pub(crate) enum FakeResponse {
    Body {
        body: Vec<u8>,
        content_length: Option<u64>,
    },
    Status(u32),
    /// Delivers `body` then fails as if the connection dropped.
    Truncated(Vec<u8>),
    Unreachable,
}

impl FakeResponse {
    pub(crate) fn ok(body: impl Into<Vec<u8>>) -> Self {
        let body = body.into();
        let len = body.len() as u64;
        FakeResponse::Body {
            body,
            content_length: Some(len).filter(|n| *n > 0),
        }
    }
}

/// Recorded request: URL and bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Seen {
    pub url: String,
    pub bearer: Option<String>,
}

#[derive(Default)]
pub(crate) struct FakeClient {
    routes: HashMap<String, FakeResponse>,
    seen: RefCell<Vec<Seen>>,
    chunk: usize,
}

impl FakeClient {
    pub(crate) fn new() -> Self {
        Self {
            chunk: 7,
            ..Self::default()
        }
    }

    pub(crate) fn route(mut self, url: &str, response: FakeResponse) -> Self {
        self.routes.insert(url.to_string(), response);
        self
    }

    pub(crate) fn seen(&self) -> Vec<Seen> {
        self.seen.borrow().clone()
    }

    fn lookup(&self, request: &Request<'_>) -> Result<FakeResponse, HttpError> {
        self.seen.borrow_mut().push(Seen {
            url: request.url.to_string(),
            bearer: request.bearer_token.map(str::to_string),
        });
        match self.routes.get(request.url) {
            Some(FakeResponse::Unreachable) | None => Err(HttpError::Transport {
                url: request.url.to_string(),
                reason: "connection refused".into(),
            }),
            Some(FakeResponse::Status(code)) => Err(HttpError::Status {
                url: request.url.to_string(),
                code: *code,
            }),
            Some(other) => Ok(other.clone()),
        }
    }
}

impl HttpClient for FakeClient {
    fn get(&self, request: &Request<'_>) -> Result<Vec<u8>, HttpError> {
        match self.lookup(request)? {
            FakeResponse::Body { body, .. } => Ok(body),
            FakeResponse::Truncated(_) => Err(HttpError::Transport {
                url: request.url.to_string(),
                reason: "connection reset".into(),
            }),
            FakeResponse::Status(_) | FakeResponse::Unreachable => unreachable!(),
        }
    }

    fn get_streaming(
        &self,
        request: &Request<'_>,
        sink: &mut dyn BodySink,
    ) -> Result<u64, HttpError> {
        let (body, content_length, truncated) = match self.lookup(request)? {
            FakeResponse::Body {
                body,
                content_length,
            } => (body, content_length, false),
            FakeResponse::Truncated(body) => {
                let declared = body.len() as u64 * 2 + 1;
                (body, Some(declared), true)
            }
            FakeResponse::Status(_) | FakeResponse::Unreachable => unreachable!(),
        };
        sink.on_start(content_length);
        let mut sent = 0u64;
        for piece in body.chunks(self.chunk.max(1)) {
            sink.on_chunk(piece).map_err(HttpError::Sink)?;
            sent += piece.len() as u64;
        }
        if truncated {
            return Err(HttpError::Transport {
                url: request.url.to_string(),
                reason: "transfer closed with outstanding read data remaining".into(),
            });
        }
        Ok(sent)
    }
}
