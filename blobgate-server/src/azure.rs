//! Azure Blob Storage backend adapter.
//!
//! Talks to the Blob service REST API directly with reqwest and a
//! caller-supplied SAS token, so no SDK dependency is needed. Listing
//! consumes `NextMarker` continuation tokens internally; callers always see
//! the complete key set for a prefix.

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::header;
use reqwest::Client;
use tracing::{debug, warn};

use blobgate_common::backend::{ObjectMeta, ObjectStore};
use blobgate_common::error::StoreError;

const API_VERSION: &str = "2021-12-02";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
const RETRY_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY_MS: u64 = 250;

pub struct AzureBlobStore {
    client: Client,
    container_url: String,
    sas_token: String,
}

impl AzureBlobStore {
    pub fn new(account: &str, container: &str, sas_token: &str) -> Result<Self, StoreError> {
        let account = account.trim();
        let container = container.trim();
        if account.is_empty() {
            return Err(StoreError::InvalidPath(
                "account name must not be empty".to_string(),
            ));
        }
        if container.is_empty() {
            return Err(StoreError::InvalidPath(
                "container name must not be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?;

        Ok(Self {
            client,
            container_url: format!("https://{account}.blob.core.windows.net/{container}"),
            sas_token: sas_token.trim().trim_start_matches('?').to_string(),
        })
    }

    /// URL for one blob. Each key segment is percent-encoded; separators are
    /// preserved so the blob name keeps its virtual hierarchy.
    fn blob_url(&self, key: &str) -> String {
        let encoded: Vec<String> = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!(
            "{}/{}?{}",
            self.container_url,
            encoded.join("/"),
            self.sas_token
        )
    }

    async fn list_once(
        &self,
        prefix: &str,
        max_results: Option<u32>,
    ) -> Result<Vec<ObjectMeta>, StoreError> {
        let mut objects = Vec::new();
        let mut marker = String::new();

        loop {
            let mut url = format!(
                "{}?restype=container&comp=list&prefix={}",
                self.container_url,
                urlencoding::encode(prefix),
            );
            if !marker.is_empty() {
                url.push_str(&format!("&marker={}", urlencoding::encode(&marker)));
            }
            if let Some(max) = max_results {
                url.push_str(&format!("&maxresults={max}"));
            }
            url.push('&');
            url.push_str(&self.sas_token);

            let resp = self
                .client
                .get(&url)
                .header("x-ms-version", API_VERSION)
                .send()
                .await?;

            if !resp.status().is_success() {
                return Err(error_from_response("list", prefix, resp).await);
            }

            let body = resp.text().await?;
            objects.extend(parse_blob_entries(&body));

            match next_marker(&body) {
                // A bounded probe never follows continuations.
                Some(next) if max_results.is_none() => marker = next,
                _ => break,
            }
        }

        debug!(prefix = %prefix, count = objects.len(), "Azure list complete");
        Ok(objects)
    }

    async fn get_once(&self, key: &str) -> Result<(Bytes, String), StoreError> {
        let resp = self
            .client
            .get(self.blob_url(key))
            .header("x-ms-version", API_VERSION)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(error_from_response("get", key, resp).await);
        }

        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();
        let data = resp.bytes().await?;
        Ok((data, content_type))
    }

    async fn put_once(
        &self,
        key: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<(), StoreError> {
        let resp = self
            .client
            .put(self.blob_url(key))
            .header("x-ms-version", API_VERSION)
            .header("x-ms-blob-type", "BlockBlob")
            .header(header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(error_from_response("put", key, resp).await);
        }
        debug!(key = %key, "Azure upload complete");
        Ok(())
    }

    async fn delete_once(&self, key: &str) -> Result<(), StoreError> {
        let resp = self
            .client
            .delete(self.blob_url(key))
            .header("x-ms-version", API_VERSION)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(error_from_response("delete", key, resp).await);
        }
        debug!(key = %key, "Azure delete complete");
        Ok(())
    }
}

#[async_trait::async_trait]
impl ObjectStore for AzureBlobStore {
    async fn list(
        &self,
        prefix: &str,
        max_results: Option<u32>,
    ) -> Result<Vec<ObjectMeta>, StoreError> {
        with_retry("list", || self.list_once(prefix, max_results)).await
    }

    async fn get(&self, key: &str) -> Result<(Bytes, String), StoreError> {
        with_retry("get", || self.get_once(key)).await
    }

    async fn put(&self, key: &str, content_type: &str, data: Bytes) -> Result<(), StoreError> {
        with_retry("put", || self.put_once(key, content_type, data.clone())).await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        with_retry("delete", || self.delete_once(key)).await
    }
}

/// Run `op`, retrying transient failures only. Non-transient errors
/// (NotFound, AccessDenied, ...) surface immediately.
async fn with_retry<T, F, Fut>(op_name: &str, op: F) -> Result<T, StoreError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Err(e) if e.is_transient() && attempt < RETRY_ATTEMPTS => {
                warn!(op = op_name, attempt, error = %e, "Transient backend failure, retrying");
                tokio::time::sleep(Duration::from_millis(RETRY_BASE_DELAY_MS * attempt as u64))
                    .await;
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// Classify a non-success response into a tagged error, carrying the
/// backend's own message text.
async fn error_from_response(op: &str, what: &str, resp: reqwest::Response) -> StoreError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    let message = format!("{op} {what}: HTTP {status} {}", body.trim());
    StoreError::from_status(status, what, message)
}

/// Extract the text of the first `<tag>...</tag>` in `xml`, if present.
fn extract_tag<'a>(xml: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = xml.find(&open)? + open.len();
    let end = xml[start..].find(&close)? + start;
    Some(&xml[start..end])
}

/// Decode the five predefined XML entities. Blob names are entity-escaped in
/// List Blobs responses; the key handed to clients must match the real key
/// or later download/delete calls miss. Single pass, so `&amp;lt;` decodes
/// to the literal `&lt;`.
fn decode_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let (ch, len) = if rest.starts_with("&amp;") {
            ('&', 5)
        } else if rest.starts_with("&lt;") {
            ('<', 4)
        } else if rest.starts_with("&gt;") {
            ('>', 4)
        } else if rest.starts_with("&quot;") {
            ('"', 6)
        } else if rest.starts_with("&apos;") {
            ('\'', 6)
        } else {
            ('&', 1)
        };
        out.push(ch);
        rest = &rest[len..];
    }
    out.push_str(rest);
    out
}

/// Parse `<Blob>` elements from a List Blobs response into object metadata.
fn parse_blob_entries(xml: &str) -> Vec<ObjectMeta> {
    let mut objects = Vec::new();
    let mut remaining = xml;
    while let Some(start) = remaining.find("<Blob>") {
        remaining = &remaining[start + 6..];
        let Some(end) = remaining.find("</Blob>") else {
            break;
        };
        let block = &remaining[..end];
        remaining = &remaining[end + 7..];

        let Some(name) = extract_tag(block, "Name") else {
            continue;
        };
        let size = extract_tag(block, "Content-Length")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let last_modified = extract_tag(block, "Last-Modified").and_then(parse_http_date);

        objects.push(ObjectMeta {
            key: decode_xml(name),
            size,
            last_modified,
        });
    }
    objects
}

/// Non-empty `<NextMarker>` means the listing continues.
fn next_marker(xml: &str) -> Option<String> {
    extract_tag(xml, "NextMarker")
        .filter(|m| !m.is_empty())
        .map(decode_xml)
}

/// Azure timestamps are RFC 1123 ("Tue, 04 Mar 2025 10:00:00 GMT"), which
/// the RFC 2822 parser accepts.
fn parse_http_date(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
