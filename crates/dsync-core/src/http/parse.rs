//! Incremental parsing of response header lines delivered by libcurl.

/// Status and declared length of the final response.
///
/// libcurl reports the headers of every response it sees, including
/// redirects and `100 Continue`; each new status line resets the state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: Option<u32>,
    pub content_length: Option<u64>,
}

impl ResponseHead {
    /// Feed one raw header line (CRLF included or not).
    pub fn push_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        if let Some(code) = parse_status_line(line) {
            *self = ResponseHead {
                status: Some(code),
                content_length: None,
            };
            return;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                // Zero is treated like a missing length: the total is unknown.
                self.content_length = value.trim().parse::<u64>().ok().filter(|n| *n > 0);
            }
        }
    }
}

/// `HTTP/1.1 200 OK` → `Some(200)`.
fn parse_status_line(line: &str) -> Option<u32> {
    let mut parts = line.split_whitespace();
    let proto = parts.next()?;
    if !proto.starts_with("HTTP/") {
        return None;
    }
    parts.next()?.parse().ok()
}
