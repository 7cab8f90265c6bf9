//! Remote catalog: types, body parsing and the authenticated fetch.
//!
//! The API answers with `{ "download_status": [ { "file_name", "download_url" }, ... ] }`.
//! Every failure to obtain or understand that body degrades to an empty
//! catalog; the caller treats that as "nothing to do this cycle".

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::http::{HttpClient, HttpError, Request};
use crate::names;

/// One file offered by the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFileDescriptor {
    pub file_name: String,
    pub download_url: String,
}

impl RemoteFileDescriptor {
    pub fn new(file_name: impl Into<String>, download_url: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            download_url: download_url.into(),
        }
    }
}

/// Ordered list of remote files for one sync cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<RemoteFileDescriptor>,
}

impl Catalog {
    pub fn entries(&self) -> &[RemoteFileDescriptor] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RemoteFileDescriptor> {
        self.entries.iter()
    }
}

impl From<Vec<RemoteFileDescriptor>> for Catalog {
    fn from(entries: Vec<RemoteFileDescriptor>) -> Self {
        Self { entries }
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a RemoteFileDescriptor;
    type IntoIter = std::slice::Iter<'a, RemoteFileDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Why a manifest body could not be used.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("manifest request failed: {0}")]
    Http(#[from] HttpError),
    #[error("manifest body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("manifest body is not a JSON object")]
    NotAnObject,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    download_status: Option<serde_json::Value>,
}

/// Parse a manifest body.
///
/// A body that is not a JSON object is an error. A missing, null or
/// non-array `download_status` is an empty catalog. Entries that do not
/// describe a usable file are skipped with a warning.
pub fn parse_catalog(body: &[u8]) -> Result<Catalog, ManifestError> {
    let value: serde_json::Value = serde_json::from_slice(body)?;
    if !value.is_object() {
        return Err(ManifestError::NotAnObject);
    }
    let envelope: Envelope = serde_json::from_value(value)?;
    let items = match envelope.download_status {
        Some(serde_json::Value::Array(items)) => items,
        Some(serde_json::Value::Null) | None => {
            tracing::debug!("manifest has no download_status");
            return Ok(Catalog::default());
        }
        Some(other) => {
            tracing::warn!(kind = json_kind(&other), "download_status is not an array");
            return Ok(Catalog::default());
        }
    };

    let mut entries = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let descriptor: RemoteFileDescriptor = match serde_json::from_value(item) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(index, error = %e, "skipping malformed catalog entry");
                continue;
            }
        };
        if let Err(reason) = validate(&descriptor) {
            tracing::warn!(index, file = %descriptor.file_name, reason, "skipping catalog entry");
            continue;
        }
        entries.push(descriptor);
    }
    Ok(Catalog::from(entries))
}

fn validate(descriptor: &RemoteFileDescriptor) -> Result<(), &'static str> {
    if !names::is_plain_file_name(&descriptor.file_name) {
        return Err("file_name is empty or not a plain file name");
    }
    if url::Url::parse(&descriptor.download_url).is_err() {
        return Err("download_url is not a valid URL");
    }
    Ok(())
}

fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// GET the manifest with `Authorization: Bearer <api_key>` and parse it.
pub fn try_fetch_catalog<C: HttpClient + ?Sized>(
    client: &C,
    api_url: &str,
    api_key: &str,
    timeout: Duration,
) -> Result<Catalog, ManifestError> {
    let request = Request::get(api_url, timeout).bearer(api_key);
    let body = client.get(&request)?;
    parse_catalog(&body)
}

/// Like [`try_fetch_catalog`], but logs any failure and returns an empty catalog.
pub fn fetch_catalog<C: HttpClient + ?Sized>(
    client: &C,
    api_url: &str,
    api_key: &str,
    timeout: Duration,
) -> Catalog {
    tracing::info!(url = api_url, "fetching file list");
    match try_fetch_catalog(client, api_url, api_key, timeout) {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::error!(error = %e, "error fetching files");
            Catalog::default()
        }
    }
}
